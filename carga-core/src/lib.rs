//! # Carga Core
//!
//! Core report logic for load-platform exports.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 carga-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Boundary         │  Document Model         │
//! │  - Raw API shapes │  - Material detection   │
//! │  - Validation     │  - Summary statistics   │
//! ├─────────────────────────────────────────────┤
//! │  Layout Engine    │  Naming                 │
//! │  - 3-column split │  - Export filenames     │
//! │  - Totals row     │                         │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod naming;
pub mod number;
pub mod raw;
pub mod validation;

pub use adapter::{
    has_materials, is_placeholder_material, piece_material_label, ReportModel, SummaryStats,
};
pub use error::{CoreError, CoreResult};
pub use layout::{column_sizes, split_columns, ColumnSplit, TotalsRow};
pub use model::{Evidence, Piece, Platform, PlatformStatus, Signature};
pub use naming::{export_filename, load_report_filename, ExportExtension};
pub use number::fixed;
pub use raw::{EvidenceUploadResponse, RawEvidence, RawPiece, RawPlatform};
pub use validation::{
    validate_evidence_batch, validate_evidence_file, validate_for_export, ExportWarning,
    ValidationError,
};

/// Carga core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
