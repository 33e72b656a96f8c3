//! Self-contained HTML report for preview, print and offline copies.
//!
//! A single template serves every caller; the variant only changes the
//! banner and the material-column policy. Output is deterministic for a
//! given input except for the footer timestamp, which is injected.

use std::fmt::Write;

use carga_core::config::{MATERIAL_FALLBACK_LABEL, NO_RECORDS_LABEL};
use base64::Engine;
use carga_core::{fixed, piece_material_label, Piece, ReportModel, Signature};
use chrono::NaiveDateTime;

use crate::markup::escape;

/// Which caller the document is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HtmlVariant {
    /// Print window or PDF-via-print-dialog.
    #[default]
    Print,
    /// Downloadable copy for offline viewing.
    Offline,
    /// Embedded on-screen preview.
    Preview,
}

impl HtmlVariant {
    fn banner(self) -> Option<&'static str> {
        match self {
            Self::Print => None,
            Self::Offline => Some("Copia sin conexión - generada localmente"),
            Self::Preview => Some("Vista previa - no válida como documento final"),
        }
    }
}

/// Material column policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialColumn {
    /// Show the column only when some piece has a real material.
    #[default]
    Auto,
    /// Always show the column.
    Always,
    /// Never show the column.
    Never,
}

/// Options for [`render_html`].
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Output variant.
    pub variant: HtmlVariant,
    /// Material column policy.
    pub material_column: MaterialColumn,
    /// Timestamp printed in the footer.
    pub generated_at: NaiveDateTime,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            variant: HtmlVariant::default(),
            material_column: MaterialColumn::default(),
            generated_at: chrono::Local::now().naive_local(),
        }
    }
}

const STYLE: &str = r"
* { box-sizing: border-box; }
body { margin: 0; font-family: 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; color: #1f2937; background: #f3f4f6; }
.report { max-width: 1100px; margin: 0 auto; padding: 24px; background: #ffffff; }
.banner { background: #fef3c7; color: #92400e; border: 1px solid #fcd34d; border-radius: 6px; padding: 8px 12px; margin-bottom: 16px; font-size: 13px; }
.report-header { background: #1e3a8a; color: #ffffff; border-radius: 8px; padding: 18px 24px; margin-bottom: 20px; }
.report-header h1 { margin: 0; font-size: 24px; letter-spacing: 1px; }
.report-header .subtitle { margin-top: 4px; font-size: 15px; opacity: 0.9; }
.meta-grid { display: grid; grid-template-columns: repeat(3, 1fr); gap: 10px 18px; margin-bottom: 20px; }
.meta-item { border-left: 3px solid #3b82f6; padding: 4px 10px; background: #f9fafb; }
.meta-item .label { display: block; font-size: 11px; text-transform: uppercase; color: #6b7280; }
.meta-item .value { display: block; font-size: 14px; font-weight: 600; }
.meta-item.wide { grid-column: 1 / -1; }
.columns { display: grid; grid-template-columns: repeat(3, 1fr); gap: 12px; margin-bottom: 20px; }
.pieces-table { width: 100%; border-collapse: collapse; font-size: 12px; }
.pieces-table th { background: #1e40af; color: #ffffff; padding: 6px 4px; font-weight: 600; }
.pieces-table td { border-bottom: 1px solid #e5e7eb; padding: 4px; text-align: right; }
.pieces-table td.num, .pieces-table td.material { text-align: left; }
.pieces-table tr:nth-child(even) td { background: #f3f4f6; }
.empty-column { border: 1px dashed #9ca3af; border-radius: 6px; padding: 24px 8px; text-align: center; color: #6b7280; font-style: italic; }
.totals { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
.totals th, .totals td { border: 1px solid #1e40af; padding: 8px; text-align: center; }
.totals th { background: #dbeafe; }
.totals td { font-weight: 700; font-size: 15px; }
.summary { display: grid; grid-template-columns: repeat(4, 1fr); gap: 12px; margin-bottom: 20px; }
.stat { background: #eff6ff; border: 1px solid #bfdbfe; border-radius: 8px; padding: 12px; text-align: center; }
.stat .stat-value { display: block; font-size: 20px; font-weight: 700; color: #1e3a8a; }
.stat .stat-label { display: block; font-size: 11px; color: #4b5563; text-transform: uppercase; }
.signature { border: 1px solid #d1d5db; border-radius: 8px; padding: 12px 16px; margin-bottom: 20px; max-width: 360px; }
.signature h2 { margin: 0 0 8px; font-size: 14px; text-transform: uppercase; color: #1e3a8a; }
.signature img { display: block; max-width: 100%; max-height: 90px; margin-bottom: 6px; }
.signature .pending { border: 1px dashed #9ca3af; padding: 24px 8px; text-align: center; color: #6b7280; font-style: italic; margin-bottom: 6px; }
.report-footer { border-top: 1px solid #d1d5db; padding-top: 8px; font-size: 11px; color: #6b7280; text-align: center; }
@media print {
  * { -webkit-print-color-adjust: exact !important; print-color-adjust: exact !important; }
  body { background: #ffffff; }
  .report { padding: 0; max-width: none; }
  .banner { display: none; }
  .report-header { padding: 8px 12px; margin-bottom: 10px; }
  .meta-grid { gap: 4px 10px; margin-bottom: 10px; }
  .pieces-table th, .pieces-table td { padding: 2px 3px; font-size: 10px; }
  table, .column, .summary, .signature { page-break-inside: avoid; break-inside: avoid; }
  .stat { padding: 6px; }
  @page { size: A4 landscape; margin: 10mm; }
}
";

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

fn meta_item(html: &mut String, label: &str, value: &str, wide: bool) {
    let class = if wide { "meta-item wide" } else { "meta-item" };
    let _ = write!(
        html,
        "<div class=\"{class}\"><span class=\"label\">{}</span><span class=\"value\">{}</span></div>",
        escape(label),
        escape(or_dash(value)),
    );
}

fn column_html(html: &mut String, pieces: &[Piece], show_material: bool) {
    html.push_str("<div class=\"column\">");
    if pieces.is_empty() {
        let _ = write!(html, "<div class=\"empty-column\">{NO_RECORDS_LABEL}</div>");
        html.push_str("</div>");
        return;
    }

    html.push_str("<table class=\"pieces-table\"><thead><tr><th>No.</th>");
    if show_material {
        html.push_str("<th>Material</th>");
    }
    html.push_str("<th>Long. (m)</th><th>Ancho (m)</th><th>M. Lin.</th></tr></thead><tbody>");
    for piece in pieces {
        let _ = write!(html, "<tr><td class=\"num\">{}</td>", piece.number);
        if show_material {
            let _ = write!(
                html,
                "<td class=\"material\">{}</td>",
                escape(piece_material_label(piece))
            );
        }
        let _ = write!(
            html,
            "<td>{}</td><td>{}</td><td>{}</td></tr>",
            fixed(piece.length, 2),
            fixed(piece.standard_width, 2),
            fixed(piece.linear_meters, 3),
        );
    }
    html.push_str("</tbody></table></div>");
}

fn stat(html: &mut String, value: &str, label: &str) {
    let _ = write!(
        html,
        "<div class=\"stat\"><span class=\"stat-value\">{}</span><span class=\"stat-label\">{}</span></div>",
        escape(value),
        escape(label),
    );
}

/// Render the report as a self-contained HTML document.
#[must_use]
pub fn render_html(model: &ReportModel<'_>, options: &HtmlOptions) -> String {
    let platform = model.platform;
    let show_material = match options.material_column {
        MaterialColumn::Auto => model.has_materials,
        MaterialColumn::Always => true,
        MaterialColumn::Never => false,
    };

    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html><html lang=\"es\"><head><meta charset=\"utf-8\">");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    let _ = write!(
        html,
        "<title>Plataforma {}</title><style>{STYLE}</style></head><body><div class=\"report\">",
        escape(&platform.platform_number),
    );

    if let Some(banner) = options.variant.banner() {
        let _ = write!(html, "<div class=\"banner\">{banner}</div>");
    }

    // Header
    let _ = write!(
        html,
        "<header class=\"report-header\"><h1>REPORTE DE CARGA</h1><div class=\"subtitle\">Plataforma {}</div></header>",
        escape(&platform.platform_number),
    );

    // Metadata grid
    html.push_str("<section class=\"meta-grid\">");
    meta_item(&mut html, "Número de plataforma", &platform.platform_number, false);
    meta_item(&mut html, "Tipo", &platform.platform_type, false);
    meta_item(&mut html, "Estado", platform.status.label(), false);
    meta_item(
        &mut html,
        "Fecha de recepción",
        &platform.reception_date.format("%d/%m/%Y").to_string(),
        false,
    );
    meta_item(&mut html, "Proveedor", &platform.provider, false);
    meta_item(&mut html, "Conductor", &platform.driver, false);
    meta_item(&mut html, "Ticket", &platform.ticket_number, false);
    meta_item(&mut html, "Materiales", &model.material_types_label(), false);
    meta_item(&mut html, "Creado por", &platform.created_by, false);
    if !platform.notes.trim().is_empty() {
        meta_item(&mut html, "Notas", &platform.notes, true);
    }
    html.push_str("</section>");

    // Pieces
    html.push_str("<section class=\"pieces\"><div class=\"columns\">");
    for column in model.columns.iter() {
        column_html(&mut html, column, show_material);
    }
    html.push_str("</div></section>");

    // Totals
    let totals = model.totals;
    let _ = write!(
        html,
        "<table class=\"totals\"><thead><tr><th>Longitud total (m)</th><th>Ancho estándar (m)</th><th>Metros lineales totales</th></tr></thead>\
         <tbody><tr><td>{}</td><td>{}</td><td>{}</td></tr></tbody></table>",
        fixed(totals.total_length, 2),
        fixed(totals.standard_width, 2),
        fixed(totals.total_linear_meters, 3),
    );

    // Summary
    let summary = model.summary;
    html.push_str("<section class=\"summary\">");
    stat(&mut html, &summary.piece_count.to_string(), "Total de piezas");
    stat(
        &mut html,
        &fixed(summary.total_linear_meters, 3),
        "Metros lineales",
    );
    stat(
        &mut html,
        &fixed(summary.average_length, 2),
        "Longitud promedio (m)",
    );
    let material_stat = if summary.material_count == 0 {
        MATERIAL_FALLBACK_LABEL.to_string()
    } else {
        summary.material_count.to_string()
    };
    stat(&mut html, &material_stat, "Tipos de material");
    html.push_str("</section>");

    let _ = write!(
        html,
        "<footer class=\"report-footer\">Generado: {} - Plataforma {}</footer>",
        options.generated_at.format("%d/%m/%Y %H:%M"),
        escape(&platform.platform_number),
    );

    html.push_str("</div></body></html>");
    html
}

const MOBILE_STYLE: &str = "<style>\
.app-bar{position:sticky;top:0;z-index:10;display:flex;align-items:center;justify-content:space-between;\
background:#1e3a8a;color:#fff;padding:10px 14px;font-family:sans-serif;}\
.app-bar button{background:#fff;color:#1e3a8a;border:0;border-radius:4px;padding:8px 14px;font-size:15px;}\
@media print{.app-bar{display:none;}}</style>";

const MOBILE_APP_BAR: &str = "<div class=\"app-bar\">\
<button type=\"button\" onclick=\"if(window.history.length>1){window.history.back();}else{window.close();}\">Volver</button>\
<span>Reporte de carga</span>\
<button type=\"button\" onclick=\"window.print()\">Imprimir</button></div>";

const AUTO_PRINT_SCRIPT: &str = "<script>window.addEventListener('load',function(){\
setTimeout(function(){window.focus();window.print();},250);});</script>";

/// Add a navigation bar with Back/Print buttons; the user starts printing.
#[must_use]
pub fn wrap_for_mobile(html: &str) -> String {
    let with_style = html.replacen("</head>", &format!("{MOBILE_STYLE}</head>"), 1);
    with_style.replacen("<body>", &format!("<body>{MOBILE_APP_BAR}"), 1)
}

/// Open the print dialog as soon as the document loads.
#[must_use]
pub fn with_auto_print(html: &str) -> String {
    html.replacen("</body>", &format!("{AUTO_PRINT_SCRIPT}</body>"), 1)
}

/// Append the signature block: the image as a `data:` URL, or a pending box.
#[must_use]
pub fn with_signature(html: &str, signature: &Signature) -> String {
    let mut block = String::from("<section class=\"signature\"><h2>Firma</h2>");
    match signature.image.as_deref().filter(|bytes| !bytes.is_empty()) {
        Some(bytes) => {
            let mime = image::guess_format(bytes).map_or("image/png", |f| f.to_mime_type());
            let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
            let _ = write!(
                block,
                "<img src=\"data:{mime};base64,{encoded}\" alt=\"Firma de {}\">",
                escape(&signature.name),
            );
        }
        None => block.push_str("<div class=\"pending\">Firma digital pendiente</div>"),
    }
    let _ = write!(
        block,
        "<div>{} - {}</div></section>",
        escape(&signature.name),
        signature.date.format("%d/%m/%Y"),
    );

    match html.rfind("<footer class=\"report-footer\">") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + block.len());
            out.push_str(&html[..at]);
            out.push_str(&block);
            out.push_str(&html[at..]);
            out
        }
        None => html.replacen("</body>", &format!("{block}</body>"), 1),
    }
}
