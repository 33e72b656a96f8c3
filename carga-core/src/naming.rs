//! Export file naming.

use chrono::NaiveDate;

/// File extensions produced by the exporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportExtension {
    /// Comma-separated values.
    Csv,
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// PDF document.
    Pdf,
    /// HTML document.
    Html,
}

impl ExportExtension {
    /// Extension without the dot.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
            Self::Html => "html",
        }
    }

    /// MIME type of the artifact.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv;charset=utf-8",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Pdf => "application/pdf",
            Self::Html => "text/html;charset=utf-8",
        }
    }
}

/// Keep the platform number readable while making it safe as a file name component.
fn file_component(platform_number: &str) -> String {
    platform_number
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `Plataforma_<platformNumber>_<YYYY-MM-DD>.<ext>`
#[must_use]
pub fn export_filename(platform_number: &str, date: NaiveDate, ext: ExportExtension) -> String {
    format!(
        "Plataforma_{}_{}.{}",
        file_component(platform_number),
        date.format("%Y-%m-%d"),
        ext.as_str()
    )
}

/// `Reporte_Carga_<platformNumber>_<YYYY-MM-DD>.pdf`
#[must_use]
pub fn load_report_filename(platform_number: &str, date: NaiveDate) -> String {
    format!(
        "Reporte_Carga_{}_{}.pdf",
        file_component(platform_number),
        date.format("%Y-%m-%d")
    )
}
