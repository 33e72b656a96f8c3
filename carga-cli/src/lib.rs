//! # Carga CLI
//!
//! Drives the export pipeline from the command line, standing in for the
//! inventory screen's export buttons.
//!
//! ## Usage
//!
//! ```bash
//! carga --out ./exports export --input platform.json --format pdf --signature-name "Juan Pérez"
//! carga print --input platform.json
//! CARGA_MOBILE=true carga print --input platform.json
//! carga share --input platform.json
//! ```
//!
//! Downloads, print documents and previews are written to the output
//! directory (`--out` or `CARGA_OUTPUT_DIR`).

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use carga_core::{export_filename, Evidence, ExportExtension, Platform, ReportModel, Signature};
use carga_delivery::{share_text, Delivery, DeliveryConfig, DeliveryOutcome, FsHost, ShareOutcome};
use carga_renderer::{
    render_html, Attachments, ExportFormat, ExportOptions, HtmlOptions, HtmlVariant, Orientation,
    PlatformExporter,
};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `carga`.
#[derive(Debug, Clone, Parser)]
#[command(name = "carga")]
#[command(about = "Export load-platform reports as CSV, HTML, PDF or images")]
#[command(version)]
pub struct CliArgs {
    /// Directory receiving downloads, print documents and previews
    #[arg(long, short, env = "CARGA_OUTPUT_DIR", default_value = ".", global = true)]
    pub out: PathBuf,

    /// Behave like a mobile browser (print wrapper instead of auto-print)
    #[arg(long, env = "CARGA_MOBILE", global = true)]
    pub mobile: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Operations.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Export a platform and download the file
    Export(ExportArgs),
    /// Open the HTML report in a print window
    Print(InputArgs),
    /// Render a platform for inline preview
    Preview(ExportArgs),
    /// Share a short text summary
    Share(InputArgs),
}

/// Platform snapshot input.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Platform JSON as returned by the inventory API
    #[arg(long, short)]
    pub input: PathBuf,
}

/// Export options.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Platform input
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = FormatArg::Pdf)]
    pub format: FormatArg,

    /// Evidence list JSON as returned by the evidence service
    #[arg(long)]
    pub evidence: Option<PathBuf>,

    /// Include the evidence section in the PDF
    #[arg(long)]
    pub include_evidence: bool,

    /// Signer name for the PDF signature section
    #[arg(long)]
    pub signature_name: Option<String>,

    /// Signature image (PNG or JPEG)
    #[arg(long, requires = "signature_name")]
    pub signature_image: Option<PathBuf>,

    /// Image orientation for PNG/JPEG
    #[arg(long, value_enum, default_value_t = OrientationArg::Landscape)]
    pub orientation: OrientationArg,
}

/// Output format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// CSV piece list
    Csv,
    /// HTML report
    Html,
    /// PDF report
    Pdf,
    /// PNG summary
    Png,
    /// JPEG summary
    Jpeg,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => Self::Csv,
            FormatArg::Html => Self::Html,
            FormatArg::Pdf => Self::Pdf,
            FormatArg::Png => Self::Png,
            FormatArg::Jpeg => Self::Jpeg,
        }
    }
}

/// Orientation argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrientationArg {
    /// 1000×800
    Landscape,
    /// 800×1000
    Portrait,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Landscape => Self::Landscape,
            OrientationArg::Portrait => Self::Portrait,
        }
    }
}

/// Read and validate a platform snapshot.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the record is invalid.
pub fn load_platform(path: &Path) -> anyhow::Result<Platform> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read platform file {}", path.display()))?;
    Platform::from_json(&json)
        .with_context(|| format!("Invalid platform record in {}", path.display()))
}

/// Read and validate an evidence list.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a record is invalid, or the
/// files break the type/size limits.
pub fn load_evidence(path: &Path) -> anyhow::Result<Vec<Evidence>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read evidence file {}", path.display()))?;
    Evidence::validated_list_from_json(&json)
        .with_context(|| format!("Evidence rejected from {}", path.display()))
}

/// Build the signature from the CLI options, dated `date`.
///
/// # Errors
///
/// Returns an error if the signature image cannot be read.
pub fn build_signature(args: &ExportArgs, date: chrono::NaiveDate) -> anyhow::Result<Option<Signature>> {
    let Some(name) = args.signature_name.as_deref() else {
        return Ok(None);
    };
    let mut signature = Signature::new(name, date);
    if let Some(path) = &args.signature_image {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read signature image {}", path.display()))?;
        signature.image = Some(bytes);
    }
    Ok(Some(signature))
}

fn exporter_for(args: &ExportArgs, variant: HtmlVariant) -> PlatformExporter {
    let mut options = ExportOptions::default();
    options.html.variant = variant;
    options.pdf.include_evidence = args.include_evidence;
    options.raster.orientation = args.orientation.into();
    PlatformExporter::new(options)
}

fn render_artifact(args: &ExportArgs, variant: HtmlVariant) -> anyhow::Result<carga_renderer::Artifact> {
    let platform = load_platform(&args.input.input)?;
    let evidence = match &args.evidence {
        Some(path) => load_evidence(path)?,
        None => Vec::new(),
    };
    let exporter = exporter_for(args, variant);
    let signature = build_signature(args, exporter.options().pdf.report_date)?;
    let attachments = Attachments {
        evidence: &evidence,
        signature: signature.as_ref(),
    };
    exporter
        .export(&platform, args.format.into(), attachments)
        .context("Export failed")
}

fn report(outcome: &DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Downloaded { filename } => {
            tracing::info!(%filename, "Downloaded");
        }
        DeliveryOutcome::PrintWindowOpened { window, mobile } => {
            tracing::info!(window = %window.0, mobile, "Print window ready");
        }
        DeliveryOutcome::FellBackToDownload { filename, reason } => {
            tracing::warn!(%filename, %reason, "Print window unavailable, HTML downloaded instead");
        }
        DeliveryOutcome::PreviewReady { url, expires_in } => {
            tracing::info!(%url, expires_in_secs = expires_in.as_secs(), "Preview ready");
        }
    }
}

/// Run a parsed command line.
///
/// # Errors
///
/// Returns an error if input cannot be loaded, rendering fails, or delivery
/// fails without a fallback.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let delivery = Delivery::new(FsHost::new(&args.out, args.mobile), DeliveryConfig::default());

    match &args.command {
        Command::Export(export) => {
            let artifact = render_artifact(export, HtmlVariant::Offline)?;
            if artifact.degraded {
                tracing::warn!(filename = %artifact.filename, "Report generated in degraded form");
            }
            let outcome = delivery.download(artifact).await?;
            report(&outcome);
        }
        Command::Print(input) => {
            let platform = load_platform(&input.input)?;
            let html = render_html(
                &ReportModel::from_platform(&platform),
                &HtmlOptions {
                    variant: HtmlVariant::Print,
                    ..HtmlOptions::default()
                },
            );
            let filename = export_filename(
                &platform.platform_number,
                platform.reception_date,
                ExportExtension::Html,
            );
            let outcome = delivery.print_html(&html, &filename).await?;
            report(&outcome);
        }
        Command::Preview(export) => {
            let artifact = render_artifact(export, HtmlVariant::Preview)?;
            let outcome = delivery.preview(artifact).await?;
            report(&outcome);
        }
        Command::Share(input) => {
            let platform = load_platform(&input.input)?;
            let text = share_text(&platform);
            let title = format!("Plataforma {}", platform.platform_number);
            match delivery.share(&title, &text).await? {
                ShareOutcome::Shared => tracing::info!("Shared"),
                ShareOutcome::CopiedToClipboard => tracing::info!("Copied to clipboard"),
                ShareOutcome::ManualCopy { text, instructions } => {
                    println!("{instructions}\n\n{text}");
                }
            }
        }
    }

    tracing::debug!(live_urls = delivery.registry().live_count(), "Command finished");
    Ok(())
}
