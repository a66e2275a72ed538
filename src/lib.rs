//! # nnurbs
//!
//! NURBS geometry interchange: capture host geometry into a standalone
//! model, write it as XML or JSON, read it back and rebuild it in a host
//! document.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! plugin       → Host entry points (write_file, read_file, inspect)
//!   ↓
//! interchange  → Model, capture, XML/JSON codecs, reconstruct
//!   ↓
//! document     → HostDocument trait, in-memory document
//!   ↓
//! kernel       → Host-native NURBS curves, surfaces, breps
//! ```

// ============================================================================
// MODULES (dependency order: kernel → document → interchange → plugin)
// ============================================================================

/// Host geometry kernel: order-based NURBS, reduced knot vectors
pub mod kernel;

/// Host document seam: object lookup and insertion
pub mod document;

/// Interchange model, capture, codecs and reconstruction
pub mod interchange;

/// Plug-in entry points called by the host
pub mod plugin;

// Re-export the types most callers need
pub use document::{HostDocument, HostGeometry, MemoryDocument, ObjectId};
pub use interchange::{
    Decoded, Format, ImportReport, InterchangeError, Model, ModelFormat, Selection, capture,
    decode, encode, reconstruct,
};
pub use plugin::{ExportOptions, FileType, WriteFileResult, read_file, write_file};
