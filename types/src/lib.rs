//! Error value types for settle.
//!
//! This crate contains pure error types with no IO, no async, and minimal dependencies.
//! Identity checks go through string markers rather than Rust type identity, so an
//! error built by one copy of this crate (or rebuilt from a serialized report) is
//! still recognized by another.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod error;
mod marker;
mod tool;

pub use error::{ErrorCause, ErrorReport, RemoteCause, SdkError, error_message};
pub use marker::{ErrorMarker, MARKER_NAMESPACE, SDK_ERROR_MARKER};
pub use tool::{InvalidToolInputError, NoSuchToolError, OriginalToolError, ToolCallRepairError};
