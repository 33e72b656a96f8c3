//! Fixed-decimal formatting for report values.

/// Format `value` with `decimals` places.
///
/// Values that round to zero print without a sign, so an empty sum
/// (`-0.0`) renders as `0.00` rather than `-0.00`.
#[must_use]
pub fn fixed(value: f64, decimals: usize) -> String {
    let text = format!("{value:.decimals$}");
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}
