//! Document model adapter.
//!
//! Maps a [`Platform`] into the layout-ready [`ReportModel`] shared by every
//! renderer: material visibility, column split, totals and summary figures.

use crate::config::{MATERIAL_FALLBACK_LABEL, MATERIAL_PLACEHOLDERS};
use crate::layout::{split_columns, ColumnSplit, TotalsRow};
use crate::model::{Piece, Platform};

/// Whether a material string is empty or one of the "not specified" placeholders.
#[must_use]
pub fn is_placeholder_material(material: &str) -> bool {
    let normalized = material.trim().to_lowercase();
    normalized.is_empty() || MATERIAL_PLACEHOLDERS.contains(&normalized.as_str())
}

/// Whether any piece carries a real material label.
#[must_use]
pub fn has_materials(pieces: &[Piece]) -> bool {
    pieces
        .iter()
        .filter_map(|p| p.material.as_deref())
        .any(|m| !is_placeholder_material(m))
}

/// Display label for a piece's material.
#[must_use]
pub fn piece_material_label(piece: &Piece) -> &str {
    match piece.material.as_deref() {
        Some(m) if !is_placeholder_material(m) => m.trim(),
        _ => MATERIAL_FALLBACK_LABEL,
    }
}

/// Aggregate figures for the summary block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    /// Number of pieces.
    pub piece_count: usize,
    /// Total linear metres (precomputed aggregate).
    pub total_linear_meters: f64,
    /// Total length (precomputed aggregate).
    pub total_length: f64,
    /// Average piece length, zero when there are no pieces.
    pub average_length: f64,
    /// Longest piece length, zero when there are no pieces.
    pub longest: f64,
    /// Shortest piece length, zero when there are no pieces.
    pub shortest: f64,
    /// Number of declared material types.
    pub material_count: usize,
}

impl SummaryStats {
    /// Compute summary figures for a platform.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_platform(platform: &Platform) -> Self {
        let piece_count = platform.pieces.len();
        let (longest, shortest) = if piece_count == 0 {
            (0.0, 0.0)
        } else {
            platform
                .pieces
                .iter()
                .fold((f64::MIN, f64::MAX), |(max, min), p| {
                    (max.max(p.length), min.min(p.length))
                })
        };
        let average_length = if piece_count == 0 {
            0.0
        } else {
            platform.total_length / piece_count as f64
        };
        Self {
            piece_count,
            total_linear_meters: platform.total_linear_meters,
            total_length: platform.total_length,
            average_length,
            longest,
            shortest,
            material_count: platform.material_types.len(),
        }
    }
}

/// Layout-ready view of a platform.
#[derive(Debug, Clone, Copy)]
pub struct ReportModel<'a> {
    /// The platform snapshot.
    pub platform: &'a Platform,
    /// Whether the per-piece material column is shown.
    pub has_materials: bool,
    /// Pieces split into three columns.
    pub columns: ColumnSplit<'a>,
    /// Totals row.
    pub totals: TotalsRow,
    /// Summary figures.
    pub summary: SummaryStats,
}

impl<'a> ReportModel<'a> {
    /// Build the report model. Pure and deterministic.
    #[must_use]
    pub fn from_platform(platform: &'a Platform) -> Self {
        Self {
            platform,
            has_materials: has_materials(&platform.pieces),
            columns: split_columns(&platform.pieces),
            totals: TotalsRow::from_platform(platform),
            summary: SummaryStats::from_platform(platform),
        }
    }

    /// Declared material types joined for display, or the fallback label.
    #[must_use]
    pub fn material_types_label(&self) -> String {
        if self.platform.material_types.is_empty() {
            MATERIAL_FALLBACK_LABEL.to_string()
        } else {
            self.platform.material_types.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).expect("date")
    }

    #[test]
    fn test_placeholders_are_not_materials() {
        let pieces = vec![
            Piece::new(1, 1.0, 1.0).with_material("Sin Especificar"),
            Piece::new(2, 1.0, 1.0).with_material(" N/A "),
            Piece::new(3, 1.0, 1.0).with_material("na"),
            Piece::new(4, 1.0, 1.0).with_material("no especificado"),
            Piece::new(5, 1.0, 1.0).with_material(""),
            Piece::new(6, 1.0, 1.0),
        ];
        assert!(!has_materials(&pieces));
    }

    #[test]
    fn test_single_real_material_enables_column() {
        let pieces = vec![
            Piece::new(1, 1.0, 1.0),
            Piece::new(2, 1.0, 1.0).with_material("Pino"),
        ];
        assert!(has_materials(&pieces));
        assert_eq!(piece_material_label(&pieces[0]), "Sin especificar");
        assert_eq!(piece_material_label(&pieces[1]), "Pino");
    }

    #[test]
    fn test_report_model_for_empty_platform() {
        let platform = Platform::new("P-0", date());
        let model = ReportModel::from_platform(&platform);
        assert!(!model.has_materials);
        assert!(model.columns.is_empty());
        assert_eq!(model.summary.piece_count, 0);
        assert!(model.summary.average_length.abs() < f64::EPSILON);
        assert_eq!(model.material_types_label(), "Sin especificar");
    }

    #[test]
    fn test_summary_stats() {
        let platform = Platform::new("P-1", date()).with_pieces(vec![
            Piece::new(1, 2.0, 1.0),
            Piece::new(2, 4.0, 1.0),
            Piece::new(3, 3.0, 1.0),
        ]);
        let stats = SummaryStats::from_platform(&platform);
        assert_eq!(stats.piece_count, 3);
        assert!((stats.average_length - 3.0).abs() < 1e-9);
        assert!((stats.longest - 4.0).abs() < f64::EPSILON);
        assert!((stats.shortest - 2.0).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_has_materials_matches_definition(
            materials in proptest::collection::vec(
                proptest::option::of(prop_oneof![
                    Just(String::new()),
                    Just("  ".to_string()),
                    Just("SIN ESPECIFICAR".to_string()),
                    Just("n/a".to_string()),
                    Just("NA".to_string()),
                    Just("No especificado ".to_string()),
                    "[a-zA-Z]{3,8}",
                ]),
                0..20,
            )
        ) {
            let pieces: Vec<Piece> = materials
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    let piece = Piece::new(u32::try_from(i + 1).unwrap_or(u32::MAX), 1.0, 1.0);
                    match m {
                        Some(m) => piece.with_material(m.clone()),
                        None => piece,
                    }
                })
                .collect();
            let expected = materials.iter().flatten().any(|m| {
                let n = m.trim().to_lowercase();
                !n.is_empty() && !["sin especificar", "no especificado", "n/a", "na"].contains(&n.as_str())
            });
            prop_assert_eq!(has_materials(&pieces), expected);
        }
    }
}
