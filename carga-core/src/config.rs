//! Fixed configuration for the export pipeline.

use std::time::Duration;

/// Number of piece columns in every printable layout.
pub const COLUMN_COUNT: usize = 3;

/// Material values that count as "not specified" (compared trimmed, lower-cased).
pub const MATERIAL_PLACEHOLDERS: &[&str] = &["sin especificar", "no especificado", "n/a", "na"];

/// Label shown for a piece whose material is missing or a placeholder.
pub const MATERIAL_FALLBACK_LABEL: &str = "Sin especificar";

/// Text shown in a column that has no pieces.
pub const NO_RECORDS_LABEL: &str = "Sin registros";

/// Material placeholder used in totals rows.
pub const TOTAL_MATERIAL_PLACEHOLDER: &str = "—";

// ====== Raster ======

/// Pieces drawn by the compact raster summary; the rest are summarised in a note.
pub const RASTER_MAX_PIECES: usize = 20;

/// Landscape raster surface (width, height) in pixels.
pub const RASTER_LANDSCAPE: (u32, u32) = (1000, 800);

/// Portrait raster surface (width, height) in pixels.
pub const RASTER_PORTRAIT: (u32, u32) = (800, 1000);

// ====== Delivery ======

/// A print window is closed after this long even if the dialog was abandoned.
pub const PRINT_WINDOW_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifetime of a preview object URL.
pub const PREVIEW_URL_TTL: Duration = Duration::from_secs(60);

// ====== Evidence files ======

/// Maximum size of a single evidence file (10 MB).
pub const MAX_EVIDENCE_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum combined size of one evidence upload batch (100 MB).
pub const MAX_EVIDENCE_BATCH_BYTES: u64 = 100 * 1024 * 1024;

/// MIME types accepted as platform evidence.
pub const ACCEPTED_EVIDENCE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "application/pdf",
];

/// Tolerance when comparing precomputed totals against the piece list.
pub const TOTALS_TOLERANCE: f64 = 0.01;
