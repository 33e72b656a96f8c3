//! Page plan: positioned drawing operations on A4 pages, in millimetres.
//!
//! Coordinates follow PDF conventions (origin bottom-left). The builder
//! threads a vertical cursor downwards and opens a new page whenever the
//! next line would cross the bottom margin.

/// A4 width.
pub const PAGE_WIDTH_MM: f32 = 210.0;
/// A4 height.
pub const PAGE_HEIGHT_MM: f32 = 297.0;
/// Left/right margin.
pub const MARGIN_MM: f32 = 15.0;
/// First baseline on a fresh page.
pub const TOP_Y_MM: f32 = 280.0;
/// Content never goes below this line; the footer lives underneath.
pub const BOTTOM_Y_MM: f32 = 20.0;
/// Usable width between margins.
pub const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

const PT_TO_MM: f32 = 0.352_78;

/// RGB color with components in `0.0..=1.0`.
pub type Color = [f32; 3];

/// Black.
pub const BLACK: Color = [0.0, 0.0, 0.0];
/// White.
pub const WHITE: Color = [1.0, 1.0, 1.0];

/// Builtin fonts used by the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// Helvetica.
    Regular,
    /// Helvetica-Bold.
    Bold,
    /// Courier.
    Mono,
    /// Courier-Bold.
    MonoBold,
}

/// One drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Text with its baseline at `(x, y)`.
    Text {
        /// Content.
        text: String,
        /// Left edge.
        x: f32,
        /// Baseline.
        y: f32,
        /// Size in points.
        size: f32,
        /// Font.
        font: FontKind,
        /// Fill color.
        color: Color,
    },
    /// Straight line.
    Rule {
        /// Start x.
        x1: f32,
        /// Start y.
        y1: f32,
        /// End x.
        x2: f32,
        /// End y.
        y2: f32,
        /// Stroke width in points.
        thickness: f32,
        /// Stroke color.
        color: Color,
    },
    /// Filled rectangle, `(x, y)` is the bottom-left corner.
    FilledRect {
        /// Left edge.
        x: f32,
        /// Bottom edge.
        y: f32,
        /// Width.
        w: f32,
        /// Height.
        h: f32,
        /// Fill color.
        color: Color,
    },
    /// Outlined rectangle, `(x, y)` is the bottom-left corner.
    StrokedRect {
        /// Left edge.
        x: f32,
        /// Bottom edge.
        y: f32,
        /// Width.
        w: f32,
        /// Height.
        h: f32,
        /// Stroke width in points.
        thickness: f32,
        /// Stroke color.
        color: Color,
    },
    /// Decoded RGB8 image placed with its bottom-left corner at `(x, y)`.
    Image {
        /// Raw RGB8 pixels, row-major.
        rgb: Vec<u8>,
        /// Width in pixels.
        width_px: u32,
        /// Height in pixels.
        height_px: u32,
        /// Left edge.
        x: f32,
        /// Bottom edge.
        y: f32,
        /// Rendered width; height follows the aspect ratio.
        width_mm: f32,
    },
}

/// Operations for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannedPage {
    /// Operations in paint order.
    pub ops: Vec<DrawOp>,
}

impl PlannedPage {
    /// Text content of the page in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A laid-out document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfPlan {
    /// Pages in order.
    pub pages: Vec<PlannedPage>,
}

impl PdfPlan {
    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether any text op contains `needle`.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages
            .iter()
            .flat_map(PlannedPage::texts)
            .any(|t| t.contains(needle))
    }

    /// Text ops drawn with the given font.
    pub fn texts_in(&self, font: FontKind) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(move |p| {
            p.ops.iter().filter_map(move |op| match op {
                DrawOp::Text { text, font: f, .. } if *f == font => Some(text.as_str()),
                _ => None,
            })
        })
    }
}

/// Line height for a font size, in millimetres.
#[must_use]
pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.45
}

/// Advance width of one Courier glyph, in millimetres.
#[must_use]
pub fn mono_char_width(size: f32) -> f32 {
    size * PT_TO_MM * 0.6
}

/// Column header repeated at the top of continuation pages.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    /// `(x, text)` cells.
    pub cells: Vec<(f32, String)>,
    /// Font size.
    pub size: f32,
}

/// Saved builder state for rolling back a failed section.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pages: usize,
    ops: usize,
    y: f32,
    table_header: Option<TableHeader>,
}

/// Builds a [`PdfPlan`] with a threaded vertical cursor.
#[derive(Debug)]
pub struct PageBuilder {
    pages: Vec<PlannedPage>,
    y: f32,
    table_header: Option<TableHeader>,
}

impl Default for PageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PageBuilder {
    /// Start with one empty page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: vec![PlannedPage::default()],
            y: TOP_Y_MM,
            table_header: None,
        }
    }

    /// Current baseline.
    #[must_use]
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Number of pages opened so far.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Move the cursor down.
    pub fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }

    /// Open a new page if `needed` millimetres do not fit above the bottom margin.
    pub fn ensure_space(&mut self, needed: f32) {
        if self.y - needed < BOTTOM_Y_MM {
            self.new_page();
        }
    }

    /// Open a new page, repeating the active table header.
    pub fn new_page(&mut self) {
        self.pages.push(PlannedPage::default());
        self.y = TOP_Y_MM;
        tracing::debug!(page = self.pages.len(), "PDF page break");
        if let Some(header) = self.table_header.clone() {
            self.draw_table_header(&header);
        }
    }

    /// Append an operation to the current page.
    pub fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Place text on the current baseline without moving the cursor.
    pub fn text_at(&mut self, x: f32, size: f32, font: FontKind, color: Color, text: impl Into<String>) {
        let y = self.y;
        self.push(DrawOp::Text {
            text: text.into(),
            x,
            y,
            size,
            font,
            color,
        });
    }

    /// Write one line at the left margin and move below it.
    pub fn line(&mut self, size: f32, font: FontKind, text: impl Into<String>) {
        let height = line_height(size);
        self.ensure_space(height);
        self.text_at(MARGIN_MM, size, font, BLACK, text);
        self.advance(height);
    }

    /// `Label: value` line with a bold label.
    pub fn label_value(&mut self, label: &str, value: &str) {
        const SIZE: f32 = 10.0;
        const VALUE_X: f32 = MARGIN_MM + 48.0;
        let height = line_height(SIZE);
        self.ensure_space(height);
        self.text_at(MARGIN_MM, SIZE, FontKind::Bold, BLACK, format!("{label}:"));
        let value = if value.trim().is_empty() { "-" } else { value };
        self.text_at(VALUE_X, SIZE, FontKind::Regular, BLACK, value);
        self.advance(height);
    }

    /// Horizontal rule across the content width at the cursor.
    pub fn rule(&mut self, thickness: f32, color: Color) {
        let y = self.y;
        self.push(DrawOp::Rule {
            x1: MARGIN_MM,
            y1: y,
            x2: PAGE_WIDTH_MM - MARGIN_MM,
            y2: y,
            thickness,
            color,
        });
    }

    /// Draw `header` and make it repeat on every page break until [`Self::end_table`].
    pub fn begin_table(&mut self, header: TableHeader) {
        self.ensure_space(2.0 * line_height(header.size) + 2.0);
        self.draw_table_header(&header);
        self.table_header = Some(header);
    }

    /// Stop repeating the table header.
    pub fn end_table(&mut self) {
        self.table_header = None;
    }

    fn draw_table_header(&mut self, header: &TableHeader) {
        for (x, text) in &header.cells {
            self.text_at(*x, header.size, FontKind::MonoBold, BLACK, text.clone());
        }
        self.advance(1.5);
        self.rule(0.5, BLACK);
        self.advance(line_height(header.size));
    }

    /// Snapshot the builder.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pages: self.pages.len(),
            ops: self.pages.last().map_or(0, |p| p.ops.len()),
            y: self.y,
            table_header: self.table_header.clone(),
        }
    }

    /// Discard everything drawn since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.pages.truncate(checkpoint.pages.max(1));
        if let Some(page) = self.pages.last_mut() {
            page.ops.truncate(checkpoint.ops);
        }
        self.y = checkpoint.y;
        self.table_header = checkpoint.table_header;
    }

    /// Finish building.
    #[must_use]
    pub fn finish(self) -> PdfPlan {
        PdfPlan { pages: self.pages }
    }
}

/// Greedy word wrap by character count.
#[must_use]
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let len = current.chars().count();
            if len > 0 && len + 1 + word.chars().count() > max_chars {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_space_breaks_page() {
        let mut builder = PageBuilder::new();
        let height = line_height(10.0);
        let lines_per_page = ((TOP_Y_MM - BOTTOM_Y_MM) / height) as usize;
        for i in 0..=lines_per_page {
            builder.line(10.0, FontKind::Regular, format!("línea {i}"));
        }
        assert_eq!(builder.page_count(), 2);
    }

    #[test]
    fn test_table_header_repeats_after_break() {
        let mut builder = PageBuilder::new();
        builder.begin_table(TableHeader {
            cells: vec![(MARGIN_MM, "No.".to_string())],
            size: 8.0,
        });
        builder.new_page();
        builder.end_table();
        builder.new_page();
        let plan = builder.finish();
        assert_eq!(plan.pages[0].texts().filter(|t| *t == "No.").count(), 1);
        assert_eq!(plan.pages[1].texts().filter(|t| *t == "No.").count(), 1);
        assert_eq!(plan.pages[2].texts().count(), 0);
    }

    #[test]
    fn test_rollback_restores_cursor_and_pages() {
        let mut builder = PageBuilder::new();
        builder.line(10.0, FontKind::Bold, "kept");
        let checkpoint = builder.checkpoint();
        let y = builder.y();
        builder.new_page();
        builder.line(10.0, FontKind::Regular, "dropped");
        builder.rollback(checkpoint);
        assert_eq!(builder.page_count(), 1);
        assert!((builder.y() - y).abs() < f32::EPSILON);
        let plan = builder.finish();
        assert!(plan.contains_text("kept"));
        assert!(!plan.contains_text("dropped"));
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("uno dos tres cuatro", 8);
        assert_eq!(lines, vec!["uno dos", "tres", "cuatro"]);
    }
}
