//! # Carga Renderer
//!
//! Turns a platform snapshot into exportable artifacts.
//!
//! ## Renderers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              PlatformExporter               │
//! ├──────────┬──────────┬───────────┬───────────┤
//! │ CSV      │ HTML     │ PDF       │ Raster    │
//! │ (csv)    │ (print / │ (printpdf │ (resvg →  │
//! │          │ preview) │ sections) │ PNG/JPEG) │
//! └──────────┴──────────┴───────────┴───────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod csv_export;
pub mod error;
pub mod export;
pub mod html;
mod markup;
pub mod pdf;
pub mod raster;

pub use csv_export::export_csv;
pub use error::{RenderError, RenderResult};
pub use export::{Artifact, Attachments, ExportFormat, ExportOptions, PlatformExporter};
pub use html::{
    render_html, with_auto_print, with_signature, wrap_for_mobile, HtmlOptions, HtmlVariant,
    MaterialColumn,
};
pub use pdf::{
    generate_platform_pdf, minimal_fallback_pdf, PdfArtifact, PdfOptions, PdfOutcome,
    PdfReportInput,
};
pub use raster::{render_jpeg, render_png, render_svg, Orientation, RasterConfig};
