//! Paint a [`PdfPlan`] with printpdf builtin fonts.

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef,
    Line, Mm, PdfDocument, PdfLayerReference, Point, Polygon, Px, Rgb,
};

use super::plan::{Color, DrawOp, FontKind, PdfPlan, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::error::{RenderError, RenderResult};

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
    mono_bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, kind: FontKind) -> &IndirectFontRef {
        match kind {
            FontKind::Regular => &self.regular,
            FontKind::Bold => &self.bold,
            FontKind::Mono => &self.mono,
            FontKind::MonoBold => &self.mono_bold,
        }
    }
}

fn pdf_color(color: Color) -> printpdf::Color {
    printpdf::Color::Rgb(Rgb::new(color[0], color[1], color[2], None))
}

fn rect_points(x: f32, y: f32, w: f32, h: f32) -> Vec<(Point, bool)> {
    vec![
        (Point::new(Mm(x), Mm(y)), false),
        (Point::new(Mm(x + w), Mm(y)), false),
        (Point::new(Mm(x + w), Mm(y + h)), false),
        (Point::new(Mm(x), Mm(y + h)), false),
    ]
}

fn draw(layer: &PdfLayerReference, op: &DrawOp, fonts: &Fonts) {
    match op {
        DrawOp::Text {
            text,
            x,
            y,
            size,
            font,
            color,
        } => {
            layer.set_fill_color(pdf_color(*color));
            layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), fonts.get(*font));
        }
        DrawOp::Rule {
            x1,
            y1,
            x2,
            y2,
            thickness,
            color,
        } => {
            layer.set_outline_color(pdf_color(*color));
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), Mm(*y1)), false),
                    (Point::new(Mm(*x2), Mm(*y2)), false),
                ],
                is_closed: false,
            });
        }
        DrawOp::FilledRect { x, y, w, h, color } => {
            layer.set_fill_color(pdf_color(*color));
            layer.add_polygon(Polygon {
                rings: vec![rect_points(*x, *y, *w, *h)],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            });
        }
        DrawOp::StrokedRect {
            x,
            y,
            w,
            h,
            thickness,
            color,
        } => {
            layer.set_outline_color(pdf_color(*color));
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: rect_points(*x, *y, *w, *h),
                is_closed: true,
            });
        }
        DrawOp::Image {
            rgb,
            width_px,
            height_px,
            x,
            y,
            width_mm,
        } => {
            let image = Image::from(ImageXObject {
                width: Px(*width_px as usize),
                height: Px(*height_px as usize),
                color_space: ColorSpace::Rgb,
                bits_per_component: ColorBits::Bit8,
                interpolate: true,
                image_data: rgb.clone(),
                image_filter: None,
                clipping_bbox: None,
                smask: None,
            });
            #[allow(clippy::cast_precision_loss)]
            let dpi = *width_px as f32 / (width_mm / 25.4);
            image.add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x)),
                    translate_y: Some(Mm(*y)),
                    dpi: Some(dpi),
                    ..Default::default()
                },
            );
        }
    }
}

/// Paint every planned page and serialize the document.
///
/// # Errors
///
/// Returns [`RenderError::Pdf`] if fonts cannot be registered or the
/// document cannot be saved.
pub fn paint(plan: &PdfPlan, title: &str) -> RenderResult<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");

    let builtin = |font: BuiltinFont| {
        doc.add_builtin_font(font)
            .map_err(|e| RenderError::Pdf(format!("font registration failed: {e}")))
    };
    let fonts = Fonts {
        regular: builtin(BuiltinFont::Helvetica)?,
        bold: builtin(BuiltinFont::HelveticaBold)?,
        mono: builtin(BuiltinFont::Courier)?,
        mono_bold: builtin(BuiltinFont::CourierBold)?,
    };

    for (index, page) in plan.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(page_index).get_layer(layer_index)
        };
        for op in &page.ops {
            draw(&layer, op, &fonts);
        }
    }

    doc.save_to_bytes()
        .map_err(|e| RenderError::Pdf(format!("PDF save failed: {e}")))
}
