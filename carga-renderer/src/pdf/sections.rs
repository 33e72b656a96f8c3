//! Report sections, drawn in fixed order onto a [`PageBuilder`].

use carga_core::config::{MATERIAL_FALLBACK_LABEL, NO_RECORDS_LABEL};
use carga_core::{fixed, piece_material_label, Evidence, Piece, ReportModel, Signature};

use super::plan::{
    line_height, mono_char_width, wrap_text, Color, DrawOp, FontKind, PageBuilder, TableHeader,
    BLACK, CONTENT_WIDTH_MM, MARGIN_MM, PAGE_WIDTH_MM, TOP_Y_MM, WHITE,
};
use super::PdfOptions;
use crate::error::{RenderError, RenderResult};

const BRAND: Color = [0.118, 0.227, 0.541];
const SUMMARY_FILL: Color = [0.937, 0.965, 1.0];
const SUMMARY_STROKE: Color = [0.231, 0.510, 0.965];
const MUTED: Color = [0.42, 0.45, 0.50];

const SECTION_TITLE_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 7.0;
const NUMBER_CHARS: usize = 4;
const MATERIAL_CHARS: usize = 9;
const LENGTH_CHARS: usize = 7;
const WIDTH_CHARS: usize = 5;
const LINEAR_CHARS: usize = 8;
const NOTES_WRAP: usize = 90;

/// Everything a section may read.
#[derive(Debug, Clone, Copy)]
pub struct SectionContext<'a> {
    /// Layout-ready platform view.
    pub model: ReportModel<'a>,
    /// Attached evidence records.
    pub evidence: &'a [Evidence],
    /// Optional signature captured at export time.
    pub signature: Option<&'a Signature>,
    /// Generation options.
    pub options: &'a PdfOptions,
}

/// One independently guarded block of the report.
pub trait PdfSection {
    /// Stable name used in logs and outcomes.
    fn name(&self) -> &'static str;

    /// Draw the section at the builder's cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the section's data cannot be laid out.
    fn build(&self, ctx: &SectionContext<'_>, page: &mut PageBuilder) -> RenderResult<()>;
}

fn section_title(page: &mut PageBuilder, title: &str) {
    page.ensure_space(line_height(SECTION_TITLE_SIZE) * 3.0);
    page.advance(3.0);
    page.text_at(MARGIN_MM, SECTION_TITLE_SIZE, FontKind::Bold, BRAND, title);
    page.advance(2.0);
    page.rule(0.8, BRAND);
    page.advance(line_height(BODY_SIZE));
}

/// Title band with the report date.
pub struct HeaderSection;

impl PdfSection for HeaderSection {
    fn name(&self) -> &'static str {
        "header"
    }

    fn build(&self, ctx: &SectionContext<'_>, page: &mut PageBuilder) -> RenderResult<()> {
        let band_height = 24.0;
        page.push(DrawOp::FilledRect {
            x: 0.0,
            y: TOP_Y_MM - band_height + 12.0,
            w: PAGE_WIDTH_MM,
            h: band_height,
            color: BRAND,
        });
        page.text_at(MARGIN_MM, 18.0, FontKind::Bold, WHITE, "REPORTE DE CARGA");
        page.advance(line_height(18.0));
        page.text_at(
            MARGIN_MM,
            11.0,
            FontKind::Regular,
            WHITE,
            format!("Plataforma {}", ctx.model.platform.platform_number),
        );
        page.text_at(
            PAGE_WIDTH_MM - MARGIN_MM - 55.0,
            10.0,
            FontKind::Regular,
            WHITE,
            format!(
                "Fecha del reporte: {}",
                ctx.options.report_date.format("%d/%m/%Y")
            ),
        );
        page.advance(line_height(11.0) + 8.0);
        Ok(())
    }
}

/// Label/value block with the platform metadata.
pub struct PlatformInfoSection;

impl PdfSection for PlatformInfoSection {
    fn name(&self) -> &'static str {
        "platform_info"
    }

    fn build(&self, ctx: &SectionContext<'_>, page: &mut PageBuilder) -> RenderResult<()> {
        let platform = ctx.model.platform;
        section_title(page, "INFORMACIÓN DE LA PLATAFORMA");
        page.label_value("Número", &platform.platform_number);
        page.label_value("Tipo", &platform.platform_type);
        page.label_value(
            "Fecha de recepción",
            &platform.reception_date.format("%d/%m/%Y").to_string(),
        );
        page.label_value("Estado", platform.status.label());
        page.label_value("Proveedor", &platform.provider);
        page.label_value("Conductor", &platform.driver);
        page.label_value("Ticket", &platform.ticket_number);
        page.label_value("Materiales", &ctx.model.material_types_label());
        page.label_value(
            "Ancho estándar",
            &format!("{} m", fixed(platform.standard_width, 2)),
        );
        page.label_value("Creado por", &platform.created_by);
        if !platform.notes.trim().is_empty() {
            page.label_value("Notas", "");
            for line in wrap_text(&platform.notes, NOTES_WRAP) {
                page.line(BODY_SIZE, FontKind::Regular, line);
            }
        }
        Ok(())
    }
}

/// Fixed-width rows for the three column groups, side by side.
pub struct PiecesTableSection;

impl PiecesTableSection {
    fn header_text(show_material: bool) -> String {
        if show_material {
            format!(
                "{:>n$} {:<m$} {:>l$} {:>w$} {:>t$}",
                "No.",
                "Material",
                "Long.",
                "Ancho",
                "M.Lin.",
                n = NUMBER_CHARS,
                m = MATERIAL_CHARS,
                l = LENGTH_CHARS,
                w = WIDTH_CHARS,
                t = LINEAR_CHARS,
            )
        } else {
            format!(
                "{:>n$} {:>l$} {:>w$} {:>t$}",
                "No.",
                "Long.",
                "Ancho",
                "M.Lin.",
                n = NUMBER_CHARS,
                l = LENGTH_CHARS + 2,
                w = WIDTH_CHARS + 2,
                t = LINEAR_CHARS + 2,
            )
        }
    }

    /// Every field is cut or padded to its header width, so a row is never
    /// wider than the header.
    fn row_text(piece: &Piece, show_material: bool) -> String {
        let number = piece.number.to_string();
        let number = if number.len() > NUMBER_CHARS {
            "#".repeat(NUMBER_CHARS)
        } else {
            number
        };
        if show_material {
            let material: String = piece_material_label(piece)
                .chars()
                .take(MATERIAL_CHARS)
                .collect();
            format!(
                "{number:>n$} {material:<m$} {} {} {}",
                fit(piece.length, 2, LENGTH_CHARS),
                fit(piece.standard_width, 2, WIDTH_CHARS),
                fit(piece.linear_meters, 3, LINEAR_CHARS),
                n = NUMBER_CHARS,
                m = MATERIAL_CHARS,
            )
        } else {
            format!(
                "{number:>n$} {} {} {}",
                fit(piece.length, 2, LENGTH_CHARS + 2),
                fit(piece.standard_width, 2, WIDTH_CHARS + 2),
                fit(piece.linear_meters, 3, LINEAR_CHARS + 2),
                n = NUMBER_CHARS,
            )
        }
    }
}

/// Right-align a fixed-decimal value in exactly `width` characters.
///
/// Decimals are dropped one at a time until the value fits; a value whose
/// integer part alone is too wide prints as `#` marks.
fn fit(value: f64, decimals: usize, width: usize) -> String {
    for places in (0..=decimals).rev() {
        let text = fixed(value, places);
        if text.chars().count() <= width {
            return format!("{text:>width$}");
        }
    }
    "#".repeat(width)
}

impl PdfSection for PiecesTableSection {
    fn name(&self) -> &'static str {
        "pieces_table"
    }

    fn build(&self, ctx: &SectionContext<'_>, page: &mut PageBuilder) -> RenderResult<()> {
        let model = &ctx.model;
        let show_material = model.has_materials;
        section_title(
            page,
            &format!("DETALLE DE PIEZAS ({})", model.platform.pieces.len()),
        );

        let group_width = CONTENT_WIDTH_MM / 3.0;
        let header = Self::header_text(show_material);
        #[allow(clippy::cast_precision_loss)]
        let needed = mono_char_width(TABLE_SIZE) * header.chars().count() as f32;
        if needed > group_width {
            return Err(RenderError::Section {
                section: self.name(),
                reason: format!("column group needs {needed:.1} mm, only {group_width:.1} mm available"),
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let group_x = |g: usize| MARGIN_MM + group_width * g as f32;
        page.begin_table(TableHeader {
            cells: (0..3).map(|g| (group_x(g), header.clone())).collect(),
            size: TABLE_SIZE,
        });

        let columns = model.columns.columns();
        let rows = model.columns.sizes().into_iter().max().unwrap_or(0);
        let row_height = line_height(TABLE_SIZE);

        if rows == 0 {
            page.ensure_space(row_height);
            for g in 0..3 {
                page.text_at(group_x(g), TABLE_SIZE, FontKind::Mono, MUTED, NO_RECORDS_LABEL);
            }
            page.advance(row_height);
        }

        for row in 0..rows {
            page.ensure_space(row_height);
            for (g, column) in columns.iter().enumerate() {
                match column.get(row) {
                    Some(piece) => page.text_at(
                        group_x(g),
                        TABLE_SIZE,
                        FontKind::Mono,
                        BLACK,
                        Self::row_text(piece, show_material),
                    ),
                    None if row == 0 => page.text_at(
                        group_x(g),
                        TABLE_SIZE,
                        FontKind::Mono,
                        MUTED,
                        NO_RECORDS_LABEL,
                    ),
                    None => {}
                }
            }
            page.advance(row_height);
        }
        page.end_table();
        Ok(())
    }
}

/// Single bold totals line taken from the precomputed aggregates.
pub struct TotalsSection;

impl PdfSection for TotalsSection {
    fn name(&self) -> &'static str {
        "totals"
    }

    fn build(&self, ctx: &SectionContext<'_>, page: &mut PageBuilder) -> RenderResult<()> {
        let totals = ctx.model.totals;
        page.ensure_space(line_height(BODY_SIZE) + 4.0);
        page.advance(1.0);
        page.rule(0.5, BLACK);
        page.advance(line_height(BODY_SIZE));
        page.line(
            BODY_SIZE,
            FontKind::MonoBold,
            format!(
                "TOTAL  Longitud: {} m  Ancho: {} m  Metros lineales: {}",
                fixed(totals.total_length, 2),
                fixed(totals.standard_width, 2),
                fixed(totals.total_linear_meters, 3),
            ),
        );
        Ok(())
    }
}

/// Highlighted box with aggregate figures.
pub struct SummarySection;

impl PdfSection for SummarySection {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn build(&self, ctx: &SectionContext<'_>, page: &mut PageBuilder) -> RenderResult<()> {
        let summary = ctx.model.summary;
        let lines = [
            format!("Total de piezas: {}", summary.piece_count),
            format!(
                "Metros lineales totales: {}",
                fixed(summary.total_linear_meters, 3)
            ),
            format!("Longitud total: {} m", fixed(summary.total_length, 2)),
            format!("Longitud promedio: {} m", fixed(summary.average_length, 2)),
            format!(
                "Pieza más larga: {} m   Pieza más corta: {} m",
                fixed(summary.longest, 2),
                fixed(summary.shortest, 2)
            ),
            if summary.material_count == 0 {
                format!("Tipos de material: {MATERIAL_FALLBACK_LABEL}")
            } else {
                format!("Tipos de material: {}", summary.material_count)
            },
        ];

        let body_height = line_height(BODY_SIZE);
        #[allow(clippy::cast_precision_loss)]
        let box_height = body_height * (lines.len() as f32 + 1.0) + 6.0;
        page.ensure_space(box_height + 6.0);
        page.advance(4.0);

        let top = page.y();
        let bottom = top - box_height;
        page.push(DrawOp::FilledRect {
            x: MARGIN_MM,
            y: bottom,
            w: CONTENT_WIDTH_MM,
            h: box_height,
            color: SUMMARY_FILL,
        });
        page.push(DrawOp::StrokedRect {
            x: MARGIN_MM,
            y: bottom,
            w: CONTENT_WIDTH_MM,
            h: box_height,
            thickness: 1.0,
            color: SUMMARY_STROKE,
        });

        page.advance(body_height);
        page.text_at(MARGIN_MM + 4.0, SECTION_TITLE_SIZE, FontKind::Bold, BRAND, "RESUMEN");
        page.advance(body_height);
        for line in lines {
            page.text_at(MARGIN_MM + 4.0, BODY_SIZE, FontKind::Regular, BLACK, line);
            page.advance(body_height);
        }
        page.advance((page.y() - bottom).max(0.0) + 2.0);
        Ok(())
    }
}

/// One entry per attached file.
pub struct EvidenceSection;

impl PdfSection for EvidenceSection {
    fn name(&self) -> &'static str {
        "evidence"
    }

    fn build(&self, ctx: &SectionContext<'_>, page: &mut PageBuilder) -> RenderResult<()> {
        section_title(page, &format!("EVIDENCIAS ({})", ctx.evidence.len()));
        if ctx.evidence.is_empty() {
            page.line(BODY_SIZE, FontKind::Regular, "Sin evidencias adjuntas");
            return Ok(());
        }

        for (index, evidence) in ctx.evidence.iter().enumerate() {
            if evidence.filename.trim().is_empty() {
                return Err(RenderError::Section {
                    section: self.name(),
                    reason: format!("evidence #{} has no file name", index + 1),
                });
            }
            page.ensure_space(line_height(BODY_SIZE) * 3.0);
            #[allow(clippy::cast_precision_loss)]
            let kilobytes = evidence.size_bytes as f64 / 1024.0;
            page.line(
                BODY_SIZE,
                FontKind::Bold,
                format!(
                    "{}. {} ({}, {} KB)",
                    index + 1,
                    evidence.filename,
                    evidence.mime_type,
                    fixed(kilobytes, 1)
                ),
            );
            let uploader = if evidence.uploaded_by.trim().is_empty() {
                "-"
            } else {
                evidence.uploaded_by.as_str()
            };
            page.line(
                9.0,
                FontKind::Regular,
                format!(
                    "    Subido: {} por {uploader}",
                    evidence.uploaded_at.format("%d/%m/%Y %H:%M")
                ),
            );
            if let Some(description) = evidence.description.as_deref().filter(|d| !d.trim().is_empty()) {
                for line in wrap_text(description, NOTES_WRAP - 4) {
                    page.line(9.0, FontKind::Regular, format!("    {line}"));
                }
            }
            if evidence.is_image() {
                page.line(
                    9.0,
                    FontKind::Regular,
                    "    [Imagen adjunta - disponible en el sistema]",
                );
            }
        }
        Ok(())
    }
}

/// Signer, date and a box saying whether a signature image is present.
pub struct SignatureSection;

const SIGNATURE_BOX_HEIGHT: f32 = 32.0;
const SIGNATURE_BOX_WIDTH: f32 = 80.0;

impl PdfSection for SignatureSection {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn build(&self, ctx: &SectionContext<'_>, page: &mut PageBuilder) -> RenderResult<()> {
        section_title(page, "FIRMA");
        let Some(signature) = ctx.signature else {
            page.line(BODY_SIZE, FontKind::Regular, "Sin firma registrada");
            return signature_box(page, None, "Firma digital pendiente");
        };

        page.label_value("Firmado por", &signature.name);
        page.label_value("Fecha", &signature.date.format("%d/%m/%Y").to_string());

        if signature.has_image() {
            let bytes = signature.image.as_deref().unwrap_or_default();
            let decoded = image::load_from_memory(bytes).map_err(|e| RenderError::Section {
                section: self.name(),
                reason: format!("signature image could not be decoded: {e}"),
            })?;
            let rgb = decoded.to_rgb8();
            let (width_px, height_px) = rgb.dimensions();
            signature_box(
                page,
                Some((rgb.into_raw(), width_px, height_px)),
                "Firma digital incluida",
            )
        } else {
            signature_box(page, None, "Firma digital pendiente")
        }
    }
}

fn signature_box(
    page: &mut PageBuilder,
    image: Option<(Vec<u8>, u32, u32)>,
    caption: &str,
) -> RenderResult<()> {
    page.ensure_space(SIGNATURE_BOX_HEIGHT + line_height(BODY_SIZE) * 2.0);
    page.advance(2.0);
    let top = page.y();
    let bottom = top - SIGNATURE_BOX_HEIGHT;
    page.push(DrawOp::StrokedRect {
        x: MARGIN_MM,
        y: bottom,
        w: SIGNATURE_BOX_WIDTH,
        h: SIGNATURE_BOX_HEIGHT,
        thickness: 0.8,
        color: MUTED,
    });

    if let Some((rgb, width_px, height_px)) = image {
        if width_px > 0 && height_px > 0 {
            let max_w = SIGNATURE_BOX_WIDTH - 8.0;
            let max_h = SIGNATURE_BOX_HEIGHT - 8.0;
            #[allow(clippy::cast_precision_loss)]
            let aspect = width_px as f32 / height_px as f32;
            let width_mm = if max_w / max_h > aspect { max_h * aspect } else { max_w };
            page.push(DrawOp::Image {
                rgb,
                width_px,
                height_px,
                x: MARGIN_MM + 4.0,
                y: bottom + 4.0,
                width_mm,
            });
        }
    }

    page.advance(SIGNATURE_BOX_HEIGHT + line_height(BODY_SIZE));
    page.text_at(MARGIN_MM, BODY_SIZE, FontKind::Bold, BRAND, caption);
    page.advance(line_height(BODY_SIZE));
    Ok(())
}

/// Sections in report order for the given options.
#[must_use]
pub fn default_sections(options: &PdfOptions) -> Vec<Box<dyn PdfSection>> {
    let mut sections: Vec<Box<dyn PdfSection>> = vec![
        Box::new(HeaderSection),
        Box::new(PlatformInfoSection),
        Box::new(PiecesTableSection),
        Box::new(TotalsSection),
        Box::new(SummarySection),
    ];
    if options.include_evidence {
        sections.push(Box::new(EvidenceSection));
    }
    sections.push(Box::new(SignatureSection));
    sections
}
