//! Platform records - the snapshot consumed by every exporter.
//!
//! These types are fully defaulted: boundary parsing in [`crate::raw`] fills
//! every field, so renderers never re-check optionality.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformStatus {
    /// Pieces are still being measured.
    #[default]
    InProgress,
    /// Measuring finished.
    Completed,
    /// A report has already been produced.
    Exported,
}

impl PlatformStatus {
    /// Human-readable label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InProgress => "En progreso",
            Self::Completed => "Completada",
            Self::Exported => "Exportada",
        }
    }

    /// Parse the wire value (`in_progress`, `completed`, `exported`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "exported" => Some(Self::Exported),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One measured unit of material within a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    /// Unique identifier.
    pub id: String,
    /// Sequential number, 1-based within the platform.
    pub number: u32,
    /// Length in metres.
    pub length: f64,
    /// Standard width in metres.
    pub standard_width: f64,
    /// Computed linear metres.
    pub linear_meters: f64,
    /// Optional material label.
    pub material: Option<String>,
}

impl Piece {
    /// Create a piece, computing linear metres from length and width.
    #[must_use]
    pub fn new(number: u32, length: f64, standard_width: f64) -> Self {
        Self {
            id: format!("piece-{number}"),
            number,
            length,
            standard_width,
            linear_meters: length * standard_width,
            material: None,
        }
    }

    /// Set the material label.
    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }
}

/// One load of material pieces being reported on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    /// Unique identifier.
    pub id: String,
    /// Display key, also used in export filenames.
    pub platform_number: String,
    /// Kind of load (e.g. "Plataforma").
    pub platform_type: String,
    /// Date the load was received.
    pub reception_date: NaiveDate,
    /// Material types declared for the load.
    pub material_types: Vec<String>,
    /// Provider or client name.
    pub provider: String,
    /// Driver name.
    pub driver: String,
    /// Weighing ticket number.
    pub ticket_number: String,
    /// Standard width in metres.
    pub standard_width: f64,
    /// Lifecycle state.
    pub status: PlatformStatus,
    /// Free-text notes.
    pub notes: String,
    /// Who created the record.
    pub created_by: String,
    /// Measured pieces, in order.
    pub pieces: Vec<Piece>,
    /// Precomputed total length.
    pub total_length: f64,
    /// Precomputed total linear metres.
    pub total_linear_meters: f64,
}

impl Platform {
    /// Create an empty platform with the given number and reception date.
    #[must_use]
    pub fn new(platform_number: impl Into<String>, reception_date: NaiveDate) -> Self {
        let platform_number = platform_number.into();
        Self {
            id: platform_number.clone(),
            platform_number,
            platform_type: "Plataforma".to_string(),
            reception_date,
            material_types: Vec::new(),
            provider: String::new(),
            driver: String::new(),
            ticket_number: String::new(),
            standard_width: 0.0,
            status: PlatformStatus::InProgress,
            notes: String::new(),
            created_by: String::new(),
            pieces: Vec::new(),
            total_length: 0.0,
            total_linear_meters: 0.0,
        }
    }

    /// Replace the piece list and recompute the aggregate fields.
    ///
    /// Aggregates belong to whoever creates the platform; exporters read
    /// them as given.
    #[must_use]
    pub fn with_pieces(mut self, pieces: Vec<Piece>) -> Self {
        self.pieces = pieces;
        self.recompute_totals();
        self
    }

    /// Sum piece lengths and linear metres into the aggregate fields.
    pub fn recompute_totals(&mut self) {
        self.total_length = self.pieces.iter().map(|p| p.length).fold(0.0, |a, b| a + b);
        self.total_linear_meters = self
            .pieces
            .iter()
            .map(|p| p.linear_meters)
            .fold(0.0, |a, b| a + b);
    }

    /// Number of pieces.
    #[must_use]
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }
}

/// An attached supporting file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// Unique identifier.
    pub id: String,
    /// Original file name.
    pub filename: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
    /// Who uploaded it.
    pub uploaded_by: String,
    /// Optional description.
    pub description: Option<String>,
    /// Retrievable URL.
    pub url: String,
}

impl Evidence {
    /// Whether the evidence is an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Signature attached at export time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Signer name.
    pub name: String,
    /// Signature date.
    pub date: NaiveDate,
    /// Optional embedded signature image (PNG bytes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
}

impl Signature {
    /// Create a signature without an image.
    #[must_use]
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
            image: None,
        }
    }

    /// Whether a digital signature image is embedded.
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image.as_ref().is_some_and(|bytes| !bytes.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")
    }

    #[test]
    fn test_piece_linear_meters() {
        let piece = Piece::new(1, 2.5, 1.2);
        assert!((piece.linear_meters - 3.0).abs() < f64::EPSILON);
        assert_eq!(piece.material, None);
    }

    #[test]
    fn test_with_pieces_sums_totals() {
        let platform = Platform::new("P-001", date())
            .with_pieces(vec![Piece::new(1, 2.0, 1.0), Piece::new(2, 3.0, 1.0)]);
        assert_eq!(platform.piece_count(), 2);
        assert!((platform.total_length - 5.0).abs() < f64::EPSILON);
        assert!((platform.total_linear_meters - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_piece_list_totals_are_positive_zero() {
        let platform = Platform::new("P-002", date()).with_pieces(Vec::new());
        assert!(platform.total_length.is_sign_positive());
        assert!(platform.total_linear_meters.is_sign_positive());
    }

    #[test]
    fn test_status_parse_and_label() {
        assert_eq!(PlatformStatus::parse("in_progress"), Some(PlatformStatus::InProgress));
        assert_eq!(PlatformStatus::parse("Completed"), Some(PlatformStatus::Completed));
        assert_eq!(PlatformStatus::parse("in-progress"), Some(PlatformStatus::InProgress));
        assert_eq!(PlatformStatus::parse("archived"), None);
        assert_eq!(PlatformStatus::Exported.label(), "Exportada");
    }

    #[test]
    fn test_signature_image_presence() {
        let mut signature = Signature::new("Juan Pérez", date());
        assert!(!signature.has_image());
        signature.image = Some(Vec::new());
        assert!(!signature.has_image());
        signature.image = Some(vec![1, 2, 3]);
        assert!(signature.has_image());
    }
}
