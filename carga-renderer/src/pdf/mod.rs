//! Structured PDF load report.
//!
//! ```text
//! sections ──guarded_section──▶ PdfPlan ──footers──▶ paint ──▶ bytes
//!                                   │                  │
//!                                   └── all failed ────┴── error ──▶ minimal_fallback_pdf
//! ```
//!
//! Each section runs in isolation: an error or panic is logged, whatever it
//! drew is rolled back and the next section continues from the last good
//! cursor. A document is always produced.

mod paint;
pub mod plan;
pub mod sections;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use carga_core::{load_report_filename, Evidence, Platform, ReportModel, Signature};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{RenderError, RenderResult};
use plan::{FontKind, PageBuilder, PdfPlan, MARGIN_MM, PAGE_WIDTH_MM};
pub use plan::{DrawOp, PlannedPage};
pub use sections::{default_sections, PdfSection, SectionContext};

const DOCUMENT_TITLE: &str = "Reporte de Carga";
const FOOTER_SIZE: f32 = 8.0;
const FOOTER_Y_MM: f32 = 10.0;

/// Notice printed on the minimal fallback document.
pub const FALLBACK_NOTICE: &str = "Error al generar el reporte completo";

/// PDF generation options.
#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// Render the evidence section.
    pub include_evidence: bool,
    /// Date printed in the header.
    pub report_date: NaiveDate,
    /// Timestamp printed in every footer.
    pub generated_at: NaiveDateTime,
}

impl Default for PdfOptions {
    fn default() -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            include_evidence: false,
            report_date: now.date(),
            generated_at: now,
        }
    }
}

/// Inputs supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct PdfReportInput<'a> {
    /// Platform snapshot.
    pub platform: &'a Platform,
    /// Attached evidence.
    pub evidence: &'a [Evidence],
    /// Signature captured at export time.
    pub signature: Option<&'a Signature>,
}

impl<'a> PdfReportInput<'a> {
    /// Input with no evidence and no signature.
    #[must_use]
    pub fn new(platform: &'a Platform) -> Self {
        Self {
            platform,
            evidence: &[],
            signature: None,
        }
    }
}

/// How complete the produced document is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfOutcome {
    /// Every section rendered.
    Complete,
    /// Some sections were skipped after failing.
    Partial {
        /// Names of the skipped sections.
        skipped: Vec<&'static str>,
    },
    /// The minimal fallback document was produced.
    Fallback {
        /// Why the full report could not be produced.
        reason: String,
    },
}

/// A generated PDF.
#[derive(Debug, Clone)]
pub struct PdfArtifact {
    /// `Reporte_Carga_<platformNumber>_<receptionDate>.pdf`
    pub filename: String,
    /// Serialized document, never empty.
    pub bytes: Vec<u8>,
    /// Completeness.
    pub outcome: PdfOutcome,
}

impl PdfArtifact {
    /// Whether sections were skipped or the fallback was used.
    #[must_use]
    pub fn degraded(&self) -> bool {
        self.outcome != PdfOutcome::Complete
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one section, recovering from errors and panics.
///
/// On success returns the cursor after the section. On failure everything
/// the section drew is discarded and the cursor is back where it started.
///
/// # Errors
///
/// Returns [`RenderError::Section`] describing the failure.
pub fn guarded_section(
    section: &dyn PdfSection,
    ctx: &SectionContext<'_>,
    page: &mut PageBuilder,
) -> RenderResult<f32> {
    let checkpoint = page.checkpoint();
    let result = panic::catch_unwind(AssertUnwindSafe(|| section.build(ctx, page)));
    let reason = match result {
        Ok(Ok(())) => return Ok(page.y()),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };
    page.rollback(checkpoint);
    tracing::error!(
        section = section.name(),
        error = %reason,
        y = page.y(),
        "PDF section failed, continuing with next section"
    );
    Err(RenderError::Section {
        section: section.name(),
        reason,
    })
}

fn add_footers(plan: &mut PdfPlan, generated_at: NaiveDateTime, platform_number: &str) {
    let total = plan.page_count();
    let stamp = generated_at.format("%d/%m/%Y %H:%M");
    for (index, page) in plan.pages.iter_mut().enumerate() {
        page.ops.push(DrawOp::Rule {
            x1: MARGIN_MM,
            y1: FOOTER_Y_MM + 4.0,
            x2: PAGE_WIDTH_MM - MARGIN_MM,
            y2: FOOTER_Y_MM + 4.0,
            thickness: 0.3,
            color: [0.6, 0.6, 0.6],
        });
        page.ops.push(DrawOp::Text {
            text: format!("Página {} de {total} — Generado: {stamp}", index + 1),
            x: MARGIN_MM,
            y: FOOTER_Y_MM,
            size: FOOTER_SIZE,
            font: FontKind::Regular,
            color: [0.4, 0.4, 0.4],
        });
        page.ops.push(DrawOp::Text {
            text: format!("Plataforma {platform_number}"),
            x: PAGE_WIDTH_MM - MARGIN_MM - 40.0,
            y: FOOTER_Y_MM,
            size: FOOTER_SIZE,
            font: FontKind::Regular,
            color: [0.4, 0.4, 0.4],
        });
    }
}

/// Lay out the report, skipping failed sections.
///
/// Returns the plan and the names of the sections that failed.
#[must_use]
pub fn build_plan(
    ctx: &SectionContext<'_>,
    sections: &[Box<dyn PdfSection>],
) -> (PdfPlan, Vec<&'static str>) {
    let mut page = PageBuilder::new();
    let mut skipped = Vec::new();
    for section in sections {
        match guarded_section(section.as_ref(), ctx, &mut page) {
            Ok(y) => tracing::debug!(section = section.name(), y, "PDF section rendered"),
            Err(_) => skipped.push(section.name()),
        }
    }
    let mut plan = page.finish();
    add_footers(
        &mut plan,
        ctx.options.generated_at,
        &ctx.model.platform.platform_number,
    );
    (plan, skipped)
}

/// Title, platform number, piece count and an error notice.
///
/// # Errors
///
/// Returns [`RenderError::Pdf`] only if even this document cannot be serialized.
pub fn minimal_fallback_pdf(platform: &Platform) -> RenderResult<Vec<u8>> {
    let mut page = PageBuilder::new();
    page.line(18.0, FontKind::Bold, "REPORTE DE CARGA");
    page.advance(4.0);
    page.line(
        12.0,
        FontKind::Regular,
        format!("Plataforma: {}", platform.platform_number),
    );
    page.line(
        12.0,
        FontKind::Regular,
        format!("Total de piezas: {}", platform.pieces.len()),
    );
    page.advance(4.0);
    page.line(11.0, FontKind::Bold, FALLBACK_NOTICE);
    paint::paint(&page.finish(), DOCUMENT_TITLE)
}

fn fallback_artifact(platform: &Platform, filename: String, reason: String) -> RenderResult<PdfArtifact> {
    tracing::warn!(
        platform = %platform.platform_number,
        reason = %reason,
        "Full PDF generation failed, producing minimal document"
    );
    Ok(PdfArtifact {
        filename,
        bytes: minimal_fallback_pdf(platform)?,
        outcome: PdfOutcome::Fallback { reason },
    })
}

/// Generate the load report with the standard sections.
///
/// # Errors
///
/// Fails only when the minimal fallback document cannot be serialized.
pub fn generate_platform_pdf(
    input: &PdfReportInput<'_>,
    options: &PdfOptions,
) -> RenderResult<PdfArtifact> {
    generate_with_sections(input, options, &default_sections(options))
}

/// Generate the load report with a custom section list.
///
/// # Errors
///
/// Fails only when the minimal fallback document cannot be serialized.
pub fn generate_with_sections(
    input: &PdfReportInput<'_>,
    options: &PdfOptions,
    sections: &[Box<dyn PdfSection>],
) -> RenderResult<PdfArtifact> {
    let platform = input.platform;
    let filename = load_report_filename(&platform.platform_number, platform.reception_date);

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        let ctx = SectionContext {
            model: ReportModel::from_platform(platform),
            evidence: input.evidence,
            signature: input.signature,
            options,
        };
        build_plan(&ctx, sections)
    }));
    let (plan, skipped) = match attempt {
        Ok(result) => result,
        Err(payload) => {
            return fallback_artifact(platform, filename, panic_message(payload.as_ref()))
        }
    };

    if !sections.is_empty() && skipped.len() == sections.len() {
        return fallback_artifact(platform, filename, "every section failed".to_string());
    }

    let bytes = match paint::paint(&plan, DOCUMENT_TITLE) {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => return fallback_artifact(platform, filename, "empty document".to_string()),
        Err(e) => return fallback_artifact(platform, filename, e.to_string()),
    };

    let outcome = if skipped.is_empty() {
        PdfOutcome::Complete
    } else {
        tracing::warn!(
            platform = %platform.platform_number,
            skipped = ?skipped,
            "PDF generated without some sections"
        );
        PdfOutcome::Partial { skipped }
    };

    tracing::debug!(
        platform = %platform.platform_number,
        pages = plan.page_count(),
        bytes = bytes.len(),
        "PDF report generated"
    );

    Ok(PdfArtifact {
        filename,
        bytes,
        outcome,
    })
}

/// Plan the standard report without painting it.
#[must_use]
pub fn plan_platform_pdf(input: &PdfReportInput<'_>, options: &PdfOptions) -> (PdfPlan, Vec<&'static str>) {
    let ctx = SectionContext {
        model: ReportModel::from_platform(input.platform),
        evidence: input.evidence,
        signature: input.signature,
        options,
    };
    build_plan(&ctx, &default_sections(options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use carga_core::Piece;
    use chrono::{TimeZone, Utc};

    fn options() -> PdfOptions {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).expect("date");
        PdfOptions {
            include_evidence: true,
            report_date: date,
            generated_at: date.and_hms_opt(10, 0, 0).expect("time"),
        }
    }

    fn platform(count: u32) -> Platform {
        let date = NaiveDate::from_ymd_opt(2024, 3, 14).expect("date");
        let pieces = (1..=count).map(|i| Piece::new(i, 2.5, 1.2)).collect();
        Platform::new("P-42", date).with_pieces(pieces)
    }

    struct Failing;

    impl PdfSection for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn build(&self, _ctx: &SectionContext<'_>, page: &mut PageBuilder) -> RenderResult<()> {
            page.line(10.0, FontKind::Regular, "partial output");
            Err(RenderError::Pdf("broken".to_string()))
        }
    }

    struct Panicking;

    impl PdfSection for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn build(&self, _ctx: &SectionContext<'_>, page: &mut PageBuilder) -> RenderResult<()> {
            page.new_page();
            panic!("malformed section data");
        }
    }

    #[test]
    fn test_seven_pieces_without_materials_omit_material_column() {
        let platform = platform(7);
        let (plan, skipped) = plan_platform_pdf(&PdfReportInput::new(&platform), &options());
        assert!(skipped.is_empty());
        assert!(plan
            .texts_in(FontKind::Mono)
            .chain(plan.texts_in(FontKind::MonoBold))
            .all(|t| !t.contains("Sin especificar") && !t.contains("Material")));
        assert!(plan.contains_text("DETALLE DE PIEZAS (7)"));
    }

    #[test]
    fn test_signature_without_image_shows_pending_box() {
        let platform = platform(2);
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).expect("date");
        let signature = Signature::new("Juan Pérez", date);
        let input = PdfReportInput {
            signature: Some(&signature),
            ..PdfReportInput::new(&platform)
        };
        let (plan, skipped) = plan_platform_pdf(&input, &options());
        assert!(skipped.is_empty());
        assert!(plan.contains_text("Juan Pérez"));
        assert!(plan.contains_text("Firma digital pendiente"));
        assert!(!plan.contains_text("Firma digital incluida"));

        let artifact = generate_platform_pdf(&input, &options()).expect("pdf");
        assert_eq!(artifact.outcome, PdfOutcome::Complete);
        assert!(artifact.bytes.starts_with(b"%PDF-"));
        assert_eq!(artifact.filename, "Reporte_Carga_P-42_2024-03-14.pdf");
    }

    #[test]
    fn test_empty_platform_shows_no_records_per_column() {
        let platform = platform(0);
        let (plan, _) = plan_platform_pdf(&PdfReportInput::new(&platform), &options());
        let placeholders = plan
            .texts_in(FontKind::Mono)
            .filter(|t| *t == "Sin registros")
            .count();
        assert_eq!(placeholders, 3);
        assert!(plan.contains_text("Longitud: 0.00 m"));
    }

    #[test]
    fn test_negative_zero_totals_print_unsigned() {
        let mut platform = platform(0);
        platform.total_length = -0.0;
        platform.total_linear_meters = -0.0;
        let (plan, _) = plan_platform_pdf(&PdfReportInput::new(&platform), &options());
        assert!(plan.contains_text("Longitud: 0.00 m"));
        assert!(plan.contains_text("Metros lineales: 0.000"));
        assert!(plan.pages.iter().flat_map(|p| p.texts()).all(|t| !t.contains("-0.0")));
    }

    #[test]
    fn test_every_section_failing_yields_fallback() {
        let platform = platform(5);
        let sections: Vec<Box<dyn PdfSection>> = vec![Box::new(Failing), Box::new(Panicking)];
        let artifact = generate_with_sections(&PdfReportInput::new(&platform), &options(), &sections)
            .expect("fallback");
        assert!(matches!(artifact.outcome, PdfOutcome::Fallback { .. }));
        assert!(artifact.degraded());
        assert!(artifact.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_failed_section_is_skipped_and_rolled_back() {
        let platform = platform(3);
        let opts = options();
        let ctx = SectionContext {
            model: ReportModel::from_platform(&platform),
            evidence: &[],
            signature: None,
            options: &opts,
        };
        let sections: Vec<Box<dyn PdfSection>> = vec![
            Box::new(sections::HeaderSection),
            Box::new(Panicking),
            Box::new(Failing),
            Box::new(sections::TotalsSection),
        ];
        let (plan, skipped) = build_plan(&ctx, &sections);
        assert_eq!(skipped, vec!["panicking", "failing"]);
        assert_eq!(plan.page_count(), 1);
        assert!(!plan.contains_text("partial output"));
        assert!(plan.contains_text("REPORTE DE CARGA"));
        assert!(plan.contains_text("Metros lineales: 9.000"));
    }

    #[test]
    fn test_malformed_evidence_does_not_abort() {
        let platform = platform(1);
        let evidence = vec![Evidence {
            id: "ev-1".to_string(),
            filename: " ".to_string(),
            mime_type: "image/png".to_string(),
            size_bytes: 10,
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 14, 8, 0, 0).single().expect("ts"),
            uploaded_by: "ana".to_string(),
            description: None,
            url: "https://files.example.com/ev-1.png".to_string(),
        }];
        let input = PdfReportInput {
            evidence: &evidence,
            ..PdfReportInput::new(&platform)
        };
        let artifact = generate_platform_pdf(&input, &options()).expect("pdf");
        assert_eq!(
            artifact.outcome,
            PdfOutcome::Partial {
                skipped: vec!["evidence"]
            }
        );
        assert!(artifact.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_image_evidence_gets_inline_note() {
        let platform = platform(1);
        let evidence = vec![Evidence {
            id: "ev-2".to_string(),
            filename: "descarga.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            size_bytes: 2048,
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 14, 8, 0, 0).single().expect("ts"),
            uploaded_by: "ana".to_string(),
            description: Some("Vista lateral".to_string()),
            url: "https://files.example.com/ev-2.jpg".to_string(),
        }];
        let input = PdfReportInput {
            evidence: &evidence,
            ..PdfReportInput::new(&platform)
        };
        let (plan, skipped) = plan_platform_pdf(&input, &options());
        assert!(skipped.is_empty());
        assert!(plan.contains_text("1. descarga.jpg (image/jpeg, 2.0 KB)"));
        assert!(plan.contains_text("[Imagen adjunta"));
        assert!(plan.contains_text("Vista lateral"));
    }

    #[test]
    fn test_long_table_paginates_with_repeated_header() {
        let platform = platform(600);
        let (plan, skipped) = plan_platform_pdf(&PdfReportInput::new(&platform), &options());
        assert!(skipped.is_empty());
        assert!(plan.page_count() >= 2);
        let header_pages = plan
            .pages
            .iter()
            .filter(|p| p.texts().any(|t| t.trim_start().starts_with("No.")))
            .count();
        assert!(header_pages >= 2);
        let total = plan.page_count();
        assert!(plan.contains_text(&format!("Página {total} de {total}")));
    }

    #[test]
    fn test_signature_image_is_embedded() {
        let platform = platform(1);
        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbImage::from_pixel(4, 2, image::Rgb([0, 0, 0]))
            .write_to(&mut png, image::ImageFormat::Png)
            .expect("encode");
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).expect("date");
        let mut signature = Signature::new("Ana Ruiz", date);
        signature.image = Some(png.into_inner());
        let input = PdfReportInput {
            signature: Some(&signature),
            ..PdfReportInput::new(&platform)
        };
        let (plan, _) = plan_platform_pdf(&input, &options());
        assert!(plan.contains_text("Firma digital incluida"));
        assert!(plan
            .pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .any(|op| matches!(op, DrawOp::Image { width_px: 4, height_px: 2, .. })));
    }

    #[test]
    fn test_minimal_fallback_is_a_pdf() {
        let bytes = minimal_fallback_pdf(&platform(3)).expect("fallback");
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
