//! Geometry interchange: capture, encode, decode, reconstruct.
//!
//! Export and import are two straight pipelines around a standalone
//! [`Model`]:
//!
//! ```text
//! ┌───────────────┐  capture   ┌─────────┐  ModelFormat::write  ┌───────────┐
//! │ HostDocument  │ ─────────► │  Model  │ ───────────────────► │ .nnxml    │
//! │               │            │         │                      │ .nncrv    │
//! │               │ ◄───────── │         │ ◄─────────────────── │ .json     │
//! └───────────────┘ reconstruct└─────────┘  ModelFormat::decode └───────────┘
//! ```
//!
//! - [`capture`] classifies host objects and converts the supported ones.
//! - [`Xml`], [`CurveXml`] and [`Json`] implement [`ModelFormat`].
//! - [`reconstruct`] validates each entry and adds it to the host.
//!
//! ## Usage
//!
//! ```ignore
//! use nnurbs::interchange::{Format, Selection, capture, decode, encode, reconstruct};
//!
//! let captured = capture(&doc, &Selection::All)?;
//! let text = encode(&captured.model, Format::Xml)?;
//!
//! let decoded = decode(&text, Format::Xml)?;
//! let report = reconstruct(&decoded.model, &mut other_doc);
//! ```

pub mod capture;
mod curve_file;
mod error;
mod format;
mod json;
pub mod model;
pub mod reconstruct;
mod xml;

pub use capture::{Captured, Selection, capture, capture_cancellable, capture_curve};
pub use curve_file::CurveXml;
pub use error::{EntryFailure, InterchangeError};
pub use format::{Decoded, Format, FormatCapability, ModelFormat, decode, encode};
pub use json::Json;
pub use model::{
    ControlPoint, Curve, EntryId, Geometry, GeometryEntry, MODEL_FORMAT_VERSION, Model, Point,
    Surface, UnitSystem,
};
pub use reconstruct::{ImportReport, reconstruct, reconstruct_cancellable};
pub use xml::{Xml, XmlOptions};

/// Supported file extensions for interchange formats.
pub fn supported_extensions() -> &'static [&'static str] {
    &["nnxml", "nncrv", "xml", "json"]
}

/// Detect format from file extension.
pub fn detect_format(path: &std::path::Path) -> Option<Box<dyn ModelFormat>> {
    let ext = path.extension()?.to_str()?;
    match ext.to_lowercase().as_str() {
        "nnxml" | "xml" => Some(Box::new(Xml::default())),
        "nncrv" => Some(Box::new(CurveXml::default())),
        "json" => Some(Box::new(Json)),
        _ => None,
    }
}
