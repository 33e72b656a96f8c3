//! Export facade: one entry point for every artifact format.

use carga_core::{
    export_filename, validate_for_export, Evidence, ExportExtension, Platform, ReportModel,
    Signature,
};

use crate::csv_export::export_csv;
use crate::error::RenderResult;
use crate::html::{render_html, with_signature, HtmlOptions};
use crate::pdf::{generate_platform_pdf, PdfOptions, PdfOutcome, PdfReportInput};
use crate::raster::{render_jpeg, render_png, RasterConfig};

/// Artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// CSV piece list.
    Csv,
    /// Self-contained HTML report.
    Html,
    /// Structured PDF report.
    Pdf,
    /// PNG summary image.
    Png,
    /// JPEG summary image.
    Jpeg,
}

impl ExportFormat {
    /// File extension for the format.
    #[must_use]
    pub const fn extension(self) -> ExportExtension {
        match self {
            Self::Csv => ExportExtension::Csv,
            Self::Html => ExportExtension::Html,
            Self::Pdf => ExportExtension::Pdf,
            Self::Png => ExportExtension::Png,
            Self::Jpeg => ExportExtension::Jpeg,
        }
    }

    /// Parse a format name (`csv`, `html`, `pdf`, `png`, `jpeg`/`jpg`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "html" | "htm" => Some(Self::Html),
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

/// Optional material attached at export time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Attachments<'a> {
    /// Evidence records for the PDF evidence section.
    pub evidence: &'a [Evidence],
    /// Signature for the PDF signature section and the HTML signature block.
    pub signature: Option<&'a Signature>,
}

/// Per-format options.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// HTML options.
    pub html: HtmlOptions,
    /// PDF options.
    pub pdf: PdfOptions,
    /// Raster options.
    pub raster: RasterConfig,
}

/// A produced file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Suggested file name.
    pub filename: String,
    /// MIME type.
    pub mime_type: &'static str,
    /// File content.
    pub bytes: Vec<u8>,
    /// Whether a degraded document was produced.
    pub degraded: bool,
}

impl Artifact {
    /// Build an artifact from text content.
    #[must_use]
    pub fn text(filename: impl Into<String>, mime_type: &'static str, text: String) -> Self {
        Self {
            filename: filename.into(),
            mime_type,
            bytes: text.into_bytes(),
            degraded: false,
        }
    }

    /// Content size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the artifact has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Renders platforms into downloadable artifacts.
#[derive(Debug, Clone, Default)]
pub struct PlatformExporter {
    options: ExportOptions,
}

impl PlatformExporter {
    /// Create an exporter with the given options.
    #[must_use]
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Exporter options.
    #[must_use]
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export a platform to the requested format.
    ///
    /// # Errors
    ///
    /// CSV and raster failures are returned as-is; PDF generation only fails
    /// if even the minimal fallback document cannot be serialized.
    pub fn export(
        &self,
        platform: &Platform,
        format: ExportFormat,
        attachments: Attachments<'_>,
    ) -> RenderResult<Artifact> {
        tracing::info!(
            platform = %platform.platform_number,
            format = ?format,
            pieces = platform.pieces.len(),
            "Export started"
        );
        for warning in validate_for_export(platform) {
            tracing::warn!(platform = %platform.platform_number, %warning, "Export warning");
        }

        let model = ReportModel::from_platform(platform);
        let extension = format.extension();
        let filename = export_filename(&platform.platform_number, platform.reception_date, extension);

        let artifact = match format {
            ExportFormat::Csv => Artifact::text(filename, extension.mime_type(), export_csv(&model)?),
            ExportFormat::Html => {
                let html = render_html(&model, &self.options.html);
                let html = match attachments.signature {
                    Some(signature) => with_signature(&html, signature),
                    None => html,
                };
                Artifact::text(filename, extension.mime_type(), html)
            }
            ExportFormat::Png => Artifact {
                filename,
                mime_type: extension.mime_type(),
                bytes: render_png(&model, &self.options.raster)?,
                degraded: false,
            },
            ExportFormat::Jpeg => Artifact {
                filename,
                mime_type: extension.mime_type(),
                bytes: render_jpeg(&model, &self.options.raster)?,
                degraded: false,
            },
            ExportFormat::Pdf => {
                let input = PdfReportInput {
                    platform,
                    evidence: attachments.evidence,
                    signature: attachments.signature,
                };
                let pdf = generate_platform_pdf(&input, &self.options.pdf)?;
                Artifact {
                    filename: pdf.filename,
                    mime_type: extension.mime_type(),
                    degraded: pdf.outcome != PdfOutcome::Complete,
                    bytes: pdf.bytes,
                }
            }
        };

        tracing::info!(
            platform = %platform.platform_number,
            filename = %artifact.filename,
            bytes = artifact.len(),
            degraded = artifact.degraded,
            "Export finished"
        );
        Ok(artifact)
    }
}
