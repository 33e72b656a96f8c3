//! Escaping shared by the HTML and SVG writers.

/// Escape text for HTML/XML content and attribute values.
pub(crate) fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(escape("Roble & <Pino> \"A\" 'B'"), "Roble &amp; &lt;Pino&gt; &quot;A&quot; &#39;B&#39;");
        assert_eq!(escape("Pérez"), "Pérez");
    }
}
