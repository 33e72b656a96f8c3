//! # Carga Delivery
//!
//! Presents rendered artifacts to the user: downloads, print windows,
//! inline previews and sharing, each with a fallback path.
//!
//! ```text
//! Artifact ──▶ ObjectUrlRegistry ──▶ DeliveryHost
//!                 │  create / revoke       │ download / window / clipboard / share
//!                 └── revoke_after(ttl) ◀──┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod delivery;
pub mod error;
pub mod host;
pub mod registry;

pub use delivery::{
    share_text, Delivery, DeliveryConfig, DeliveryOutcome, ShareOutcome, MANUAL_COPY_INSTRUCTIONS,
};
pub use error::{DeliveryError, DeliveryResult};
pub use host::{DeliveryHost, FsHost, WindowHandle};
pub use registry::{ObjectUrl, ObjectUrlRegistry};
