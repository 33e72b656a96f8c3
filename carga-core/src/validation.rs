//! Input validation for evidence files and export input.
//!
//! Validation runs before any expensive work. File checks reject; export
//! checks only produce warnings, since an empty or inconsistent platform
//! still yields a usable report.

use thiserror::Error;

use crate::config::{
    ACCEPTED_EVIDENCE_MIME_TYPES, MAX_EVIDENCE_BATCH_BYTES, MAX_EVIDENCE_FILE_BYTES,
    TOTALS_TOLERANCE,
};
use crate::model::Platform;

/// File validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// MIME type is not in the accepted list.
    #[error("unsupported file type {mime} for {filename}")]
    UnsupportedFileType {
        /// Offending file.
        filename: String,
        /// Its MIME type.
        mime: String,
    },
    /// File exceeds the per-file limit.
    #[error("{filename} is too large ({size} bytes, max {limit})")]
    FileTooLarge {
        /// Offending file.
        filename: String,
        /// Its size.
        size: u64,
        /// Applicable limit.
        limit: u64,
    },
    /// File has no content.
    #[error("{0} is empty")]
    EmptyFile(String),
    /// Combined batch exceeds the batch limit.
    #[error("upload batch too large ({total} bytes, max {limit})")]
    BatchTooLarge {
        /// Combined size.
        total: u64,
        /// Applicable limit.
        limit: u64,
    },
}

/// Non-fatal findings about a platform about to be exported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportWarning {
    /// The platform has no pieces; reports will show placeholders.
    #[error("platform has no pieces")]
    NoPieces,
    /// The precomputed linear metres disagree with the piece list.
    #[error("declared linear meters {declared:.3} differ from piece sum {computed:.3}")]
    TotalsMismatch {
        /// Value carried by the platform.
        declared: f64,
        /// Sum over the pieces.
        computed: f64,
    },
}

/// Validate a single evidence file before upload.
///
/// # Errors
///
/// Returns the first failed check: empty file, unsupported type, or size over `max_bytes`.
pub fn validate_evidence_file(
    filename: &str,
    mime: &str,
    size: u64,
    max_bytes: u64,
) -> Result<(), ValidationError> {
    if size == 0 {
        return Err(ValidationError::EmptyFile(filename.to_string()));
    }
    let mime_lower = mime.trim().to_ascii_lowercase();
    if !ACCEPTED_EVIDENCE_MIME_TYPES.contains(&mime_lower.as_str()) {
        return Err(ValidationError::UnsupportedFileType {
            filename: filename.to_string(),
            mime: mime.to_string(),
        });
    }
    if size > max_bytes {
        return Err(ValidationError::FileTooLarge {
            filename: filename.to_string(),
            size,
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Validate a batch of `(filename, mime, size)` entries with the default limits.
///
/// # Errors
///
/// Returns the first per-file failure, or [`ValidationError::BatchTooLarge`].
pub fn validate_evidence_batch<'a, I>(files: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = (&'a str, &'a str, u64)>,
{
    let mut total: u64 = 0;
    for (filename, mime, size) in files {
        validate_evidence_file(filename, mime, size, MAX_EVIDENCE_FILE_BYTES)?;
        total = total.saturating_add(size);
    }
    if total > MAX_EVIDENCE_BATCH_BYTES {
        return Err(ValidationError::BatchTooLarge {
            total,
            limit: MAX_EVIDENCE_BATCH_BYTES,
        });
    }
    Ok(())
}

/// Inspect a platform before export and report anything worth logging.
#[must_use]
pub fn validate_for_export(platform: &Platform) -> Vec<ExportWarning> {
    let mut warnings = Vec::new();
    if platform.pieces.is_empty() {
        warnings.push(ExportWarning::NoPieces);
        return warnings;
    }
    let computed: f64 = platform.pieces.iter().map(|p| p.linear_meters).sum();
    if (computed - platform.total_linear_meters).abs() > TOTALS_TOLERANCE {
        warnings.push(ExportWarning::TotalsMismatch {
            declared: platform.total_linear_meters,
            computed,
        });
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Piece;
    use chrono::NaiveDate;

    #[test]
    fn test_accepts_supported_image() {
        assert!(validate_evidence_file("a.png", "image/png", 1024, MAX_EVIDENCE_FILE_BYTES).is_ok());
        assert!(validate_evidence_file("a.pdf", "Application/PDF", 1, MAX_EVIDENCE_FILE_BYTES).is_ok());
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let err = validate_evidence_file("a.exe", "application/x-msdownload", 10, 100)
            .expect_err("unsupported");
        assert!(matches!(err, ValidationError::UnsupportedFileType { .. }));
    }

    #[test]
    fn test_rejects_oversize_and_empty() {
        let err = validate_evidence_file("big.jpg", "image/jpeg", MAX_EVIDENCE_FILE_BYTES + 1, MAX_EVIDENCE_FILE_BYTES)
            .expect_err("too large");
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
        assert_eq!(
            validate_evidence_file("e.jpg", "image/jpeg", 0, 100),
            Err(ValidationError::EmptyFile("e.jpg".to_string()))
        );
    }

    #[test]
    fn test_batch_limit() {
        let nine_mb = 9 * 1024 * 1024;
        let files: Vec<(&str, &str, u64)> = (0..12).map(|_| ("p.jpg", "image/jpeg", nine_mb)).collect();
        let err = validate_evidence_batch(files).expect_err("batch too large");
        assert!(matches!(err, ValidationError::BatchTooLarge { .. }));
        assert!(validate_evidence_batch([("p.jpg", "image/jpeg", nine_mb)]).is_ok());
    }

    #[test]
    fn test_export_warnings() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let empty = Platform::new("P-1", date);
        assert_eq!(validate_for_export(&empty), vec![ExportWarning::NoPieces]);

        let mut platform = Platform::new("P-2", date).with_pieces(vec![Piece::new(1, 2.0, 1.0)]);
        assert!(validate_for_export(&platform).is_empty());
        platform.total_linear_meters = 10.0;
        assert!(matches!(
            validate_for_export(&platform).as_slice(),
            [ExportWarning::TotalsMismatch { .. }]
        ));
    }
}
