//! Single-page raster summary.
//!
//! The summary is laid out as an SVG scene on a fixed-size surface and
//! rasterized with resvg/tiny-skia. Only the first [`RASTER_MAX_PIECES`]
//! pieces are drawn; a note reports how many were left out.

use std::fmt::Write;

use carga_core::config::{RASTER_LANDSCAPE, RASTER_MAX_PIECES, RASTER_PORTRAIT};
use carga_core::{fixed, piece_material_label, ReportModel};
use image::ImageEncoder;

use crate::error::{RenderError, RenderResult};
use crate::markup::escape;

/// Surface orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// 1000×800 pixels.
    #[default]
    Landscape,
    /// 800×1000 pixels.
    Portrait,
}

impl Orientation {
    /// Surface size in pixels.
    #[must_use]
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Landscape => RASTER_LANDSCAPE,
            Self::Portrait => RASTER_PORTRAIT,
        }
    }
}

/// Raster output configuration.
#[derive(Debug, Clone)]
pub struct RasterConfig {
    /// Surface orientation.
    pub orientation: Orientation,
    /// Background color as RGBA bytes.
    pub background: [u8; 4],
    /// JPEG quality 1-100.
    pub jpeg_quality: u8,
    /// Maximum number of piece rows drawn.
    pub max_pieces: usize,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            background: [255, 255, 255, 255],
            jpeg_quality: 90,
            max_pieces: RASTER_MAX_PIECES,
        }
    }
}

const HEADER_FILL: &str = "#1e3a8a";
const TABLE_HEADER_FILL: &str = "#1e40af";
const STRIPE_FILL: &str = "#f3f4f6";
const SUMMARY_FILL: &str = "#eff6ff";
const SUMMARY_STROKE: &str = "#3b82f6";
const TEXT_COLOR: &str = "#1f2937";
const MUTED_COLOR: &str = "#6b7280";

const MARGIN: u32 = 30;
const ROW_HEIGHT: u32 = 20;

fn rect(svg: &mut String, x: u32, y: u32, w: u32, h: u32, fill: &str) {
    let _ = write!(
        svg,
        "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" fill=\"{fill}\"/>"
    );
}

fn text(svg: &mut String, x: u32, y: u32, size: u32, fill: &str, bold: bool, content: &str) {
    let weight = if bold { "bold" } else { "normal" };
    let _ = write!(
        svg,
        "<text x=\"{x}\" y=\"{y}\" font-size=\"{size}\" font-weight=\"{weight}\" fill=\"{fill}\" font-family=\"sans-serif\">{}</text>",
        escape(content),
    );
}

/// Build the SVG scene for the summary image.
#[must_use]
pub fn render_svg(model: &ReportModel<'_>, config: &RasterConfig) -> String {
    let platform = model.platform;
    let (width, height) = config.orientation.dimensions();
    let inner = width - 2 * MARGIN;

    let mut svg = String::with_capacity(8192);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    );
    let bg = &config.background;
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"rgba({},{},{},{})\"/>",
        bg[0],
        bg[1],
        bg[2],
        f32::from(bg[3]) / 255.0,
    );

    // Header band
    rect(&mut svg, 0, 0, width, 70, HEADER_FILL);
    text(&mut svg, MARGIN, 34, 26, "#ffffff", true, "REPORTE DE CARGA");
    text(
        &mut svg,
        MARGIN,
        58,
        15,
        "#ffffff",
        false,
        &format!("Plataforma {}", platform.platform_number),
    );

    // Info lines, two columns
    let info = [
        ("Fecha", platform.reception_date.format("%d/%m/%Y").to_string()),
        ("Estado", platform.status.label().to_string()),
        ("Proveedor", platform.provider.clone()),
        ("Conductor", platform.driver.clone()),
        ("Ticket", platform.ticket_number.clone()),
        ("Materiales", model.material_types_label()),
    ];
    let half = inner / 2;
    let mut y = 100;
    for pair in info.chunks(2) {
        for (i, (label, value)) in pair.iter().enumerate() {
            let x = MARGIN + u32::try_from(i).unwrap_or(0) * half;
            let value = if value.trim().is_empty() { "-" } else { value };
            text(&mut svg, x, y, 14, TEXT_COLOR, false, &format!("{label}: {value}"));
        }
        y += 24;
    }

    // Pieces table
    let show_material = model.has_materials;
    let headers: &[&str] = if show_material {
        &["No.", "Material", "Longitud (m)", "Ancho (m)", "Metros lineales"]
    } else {
        &["No.", "Longitud (m)", "Ancho (m)", "Metros lineales"]
    };
    let column_width = inner / u32::try_from(headers.len()).unwrap_or(1);
    let column_x = |i: usize| MARGIN + 8 + u32::try_from(i).unwrap_or(0) * column_width;

    y += 6;
    rect(&mut svg, MARGIN, y, inner, ROW_HEIGHT + 4, TABLE_HEADER_FILL);
    for (i, header) in headers.iter().enumerate() {
        text(&mut svg, column_x(i), y + 17, 13, "#ffffff", true, header);
    }
    y += ROW_HEIGHT + 4;

    let pieces = &platform.pieces;
    let drawn = pieces.len().min(config.max_pieces);
    for (row, piece) in pieces.iter().take(drawn).enumerate() {
        if row % 2 == 1 {
            rect(&mut svg, MARGIN, y, inner, ROW_HEIGHT, STRIPE_FILL);
        }
        let mut cells = vec![piece.number.to_string()];
        if show_material {
            cells.push(piece_material_label(piece).to_string());
        }
        cells.push(fixed(piece.length, 2));
        cells.push(fixed(piece.standard_width, 2));
        cells.push(fixed(piece.linear_meters, 3));
        for (i, cell) in cells.iter().enumerate() {
            text(&mut svg, column_x(i), y + 15, 12, TEXT_COLOR, false, cell);
        }
        y += ROW_HEIGHT;
    }

    if pieces.is_empty() {
        text(&mut svg, MARGIN + 8, y + 15, 12, MUTED_COLOR, false, "Sin registros");
        y += ROW_HEIGHT;
    } else if pieces.len() > drawn {
        let note = format!("… y {} piezas más", pieces.len() - drawn);
        text(&mut svg, MARGIN + 8, y + 15, 12, MUTED_COLOR, false, &note);
        y += ROW_HEIGHT;
    }

    // Totals
    y += 10;
    let totals = model.totals;
    text(
        &mut svg,
        MARGIN,
        y + 16,
        15,
        TEXT_COLOR,
        true,
        &format!(
            "TOTAL: {} m × {} m = {} m lineales",
            fixed(totals.total_length, 2),
            fixed(totals.standard_width, 2),
            fixed(totals.total_linear_meters, 3),
        ),
    );
    y += 32;

    // Summary box
    let summary = model.summary;
    let _ = write!(
        svg,
        "<rect x=\"{MARGIN}\" y=\"{y}\" width=\"{inner}\" height=\"70\" rx=\"6\" fill=\"{SUMMARY_FILL}\" stroke=\"{SUMMARY_STROKE}\" stroke-width=\"2\"/>",
    );
    let stats = [
        ("Piezas", summary.piece_count.to_string()),
        ("Metros lineales", fixed(summary.total_linear_meters, 3)),
        ("Longitud promedio", format!("{} m", fixed(summary.average_length, 2))),
    ];
    let stat_width = inner / 3;
    for (i, (label, value)) in stats.iter().enumerate() {
        let x = MARGIN + 16 + u32::try_from(i).unwrap_or(0) * stat_width;
        text(&mut svg, x, y + 30, 20, HEADER_FILL, true, value);
        text(&mut svg, x, y + 54, 12, MUTED_COLOR, false, label);
    }

    svg.push_str("</svg>");
    svg
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rasterize_svg(svg: &str) -> RenderResult<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| RenderError::Raster(format!("SVG parsing failed: {e}")))?;

    let px_w = tree.size().width() as u32;
    let px_h = tree.size().height() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
        .ok_or_else(|| RenderError::Raster("Failed to create drawing surface".to_string()))?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Render the summary as PNG bytes.
///
/// # Errors
///
/// Returns [`RenderError::Raster`] if the surface cannot be created or encoded.
pub fn render_png(model: &ReportModel<'_>, config: &RasterConfig) -> RenderResult<Vec<u8>> {
    let svg = render_svg(model, config);
    let pixmap = rasterize_svg(&svg)?;
    log_truncation(model, config);
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Raster(format!("PNG encoding failed: {e}")))
}

/// Composite premultiplied RGBA pixels over an opaque matte, dropping alpha.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn flatten_premultiplied(rgba: &[u8], matte: [u8; 3]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for pixel in rgba.chunks_exact(4) {
        let inv = 1.0 - f32::from(pixel[3]) / 255.0;
        for channel in 0..3 {
            let value = f32::from(matte[channel]).mul_add(inv, f32::from(pixel[channel]));
            rgb.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }
    rgb
}

/// Render the summary as JPEG bytes, flattening alpha onto the background.
///
/// # Errors
///
/// Returns [`RenderError::Raster`] if the surface cannot be created or encoded.
pub fn render_jpeg(model: &ReportModel<'_>, config: &RasterConfig) -> RenderResult<Vec<u8>> {
    let svg = render_svg(model, config);
    let pixmap = rasterize_svg(&svg)?;
    log_truncation(model, config);

    let (width, height) = (pixmap.width(), pixmap.height());
    let [r, g, b, _] = config.background;
    let rgb_data = flatten_premultiplied(pixmap.data(), [r, g, b]);

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, config.jpeg_quality);
    encoder
        .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
        .map_err(|e| RenderError::Raster(format!("JPEG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

fn log_truncation(model: &ReportModel<'_>, config: &RasterConfig) {
    let total = model.platform.pieces.len();
    if total > config.max_pieces {
        tracing::debug!(
            platform = %model.platform.platform_number,
            drawn = config.max_pieces,
            omitted = total - config.max_pieces,
            "Raster summary truncated"
        );
    }
}
