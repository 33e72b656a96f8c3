//! CSV export.
//!
//! Layout (material column only when the platform has materials):
//!
//! ```text
//! No.,Material,Longitud (m),Ancho (m),Metros Lineales
//! 1,"Pino",2.50,1.20,3.000
//!
//! TOTAL,—,2.50,1.20,3.000
//! ```

use carga_core::config::TOTAL_MATERIAL_PLACEHOLDER;
use carga_core::{fixed, piece_material_label, ReportModel};
use csv::{QuoteStyle, Writer, WriterBuilder};

use crate::error::{RenderError, RenderResult};

const HEADER_NUMBER: &str = "No.";
const HEADER_MATERIAL: &str = "Material";
const HEADER_LENGTH: &str = "Longitud (m)";
const HEADER_WIDTH: &str = "Ancho (m)";
const HEADER_LINEAR: &str = "Metros Lineales";

/// Quote a field, doubling embedded quotes.
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Run `f` against a writer that emits fields verbatim, returning the text.
fn write_block<F>(f: F) -> RenderResult<String>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> csv::Result<()>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .flexible(true)
        .from_writer(vec![]);
    f(&mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| RenderError::Encoding(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RenderError::Encoding(e.to_string()))
}

/// Export the platform's pieces as CSV text.
///
/// # Errors
///
/// Returns an error if the CSV writer fails.
pub fn export_csv(model: &ReportModel<'_>) -> RenderResult<String> {
    let show_material = model.has_materials;

    let mut csv_data = write_block(|writer| {
        if show_material {
            writer.write_record([
                HEADER_NUMBER,
                HEADER_MATERIAL,
                HEADER_LENGTH,
                HEADER_WIDTH,
                HEADER_LINEAR,
            ])?;
        } else {
            writer.write_record([HEADER_NUMBER, HEADER_LENGTH, HEADER_WIDTH, HEADER_LINEAR])?;
        }

        for piece in &model.platform.pieces {
            let number = piece.number.to_string();
            let length = fixed(piece.length, 2);
            let width = fixed(piece.standard_width, 2);
            let linear = fixed(piece.linear_meters, 3);
            if show_material {
                let material = quoted(piece_material_label(piece));
                writer.write_record([&number, &material, &length, &width, &linear])?;
            } else {
                writer.write_record([&number, &length, &width, &linear])?;
            }
        }
        writer.flush()?;
        Ok(())
    })?;

    csv_data.push('\n');

    let totals = model.totals;
    let total_block = write_block(|writer| {
        let length = fixed(totals.total_length, 2);
        let width = fixed(totals.standard_width, 2);
        let linear = fixed(totals.total_linear_meters, 3);
        if show_material {
            writer.write_record([
                "TOTAL",
                TOTAL_MATERIAL_PLACEHOLDER,
                length.as_str(),
                width.as_str(),
                linear.as_str(),
            ])?;
        } else {
            writer.write_record(["TOTAL", length.as_str(), width.as_str(), linear.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    })?;
    csv_data.push_str(&total_block);

    tracing::debug!(
        platform = %model.platform.platform_number,
        rows = model.platform.pieces.len(),
        with_material = show_material,
        "CSV export built"
    );

    Ok(csv_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carga_core::{Piece, Platform};
    use chrono::NaiveDate;

    fn platform(pieces: Vec<Piece>) -> Platform {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).expect("date");
        let mut platform = Platform::new("P-100", date).with_pieces(pieces);
        platform.standard_width = 1.2;
        platform
    }

    #[test]
    fn test_csv_with_materials() {
        let platform = platform(vec![
            Piece::new(1, 2.5, 1.2).with_material("Pino"),
            Piece::new(2, 3.0, 1.2),
        ]);
        let model = ReportModel::from_platform(&platform);
        let csv = export_csv(&model).expect("csv");
        let expected = "No.,Material,Longitud (m),Ancho (m),Metros Lineales\n\
                        1,\"Pino\",2.50,1.20,3.000\n\
                        2,\"Sin especificar\",3.00,1.20,3.600\n\
                        \n\
                        TOTAL,—,5.50,1.20,6.600\n";
        assert_eq!(csv, expected);
    }

    #[test]
    fn test_csv_without_materials_drops_column() {
        let pieces: Vec<Piece> = (1..=7).map(|i| Piece::new(i, 1.0, 1.2)).collect();
        let platform = platform(pieces);
        let model = ReportModel::from_platform(&platform);
        let csv = export_csv(&model).expect("csv");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "No.,Longitud (m),Ancho (m),Metros Lineales");
        assert_eq!(lines.len(), 1 + 7 + 1 + 1);
        assert!(lines.iter().all(|l| !l.contains("Sin especificar")));
        for row in &lines[1..8] {
            assert_eq!(row.split(',').count(), 4);
        }
        assert_eq!(lines[8], "");
        assert_eq!(lines[9], "TOTAL,7.00,1.20,8.400");
    }

    #[test]
    fn test_csv_empty_platform() {
        let platform = platform(Vec::new());
        let model = ReportModel::from_platform(&platform);
        let csv = export_csv(&model).expect("csv");
        assert_eq!(
            csv,
            "No.,Longitud (m),Ancho (m),Metros Lineales\n\nTOTAL,0.00,1.20,0.000\n"
        );
    }

    #[test]
    fn test_csv_negative_zero_totals_from_input() {
        let platform = Platform::from_json(
            r#"{"platformNumber": "P-9", "receptionDate": "2024-03-15",
                "totalLength": -0.0, "totalLinearMeters": -0.0}"#,
        )
        .expect("parse");
        let model = ReportModel::from_platform(&platform);
        let csv = export_csv(&model).expect("csv");
        assert!(csv.ends_with("TOTAL,0.00,0.00,0.000\n"), "{csv}");
        assert!(!csv.contains("-0.0"));
    }

    #[test]
    fn test_csv_escapes_quotes_in_material() {
        let platform = platform(vec![Piece::new(1, 1.0, 1.0).with_material("Roble \"A\", seco")]);
        let model = ReportModel::from_platform(&platform);
        let csv = export_csv(&model).expect("csv");
        assert!(csv.contains("1,\"Roble \"\"A\"\", seco\",1.00,1.00,1.000"));
    }
}
