//! Common trait for model interchange formats.

use super::InterchangeError;
use super::error::EntryFailure;
use super::json::Json;
use super::model::Model;
use super::xml::Xml;

/// Capabilities supported by a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatCapability {
    /// Can read/import models.
    pub read: bool,
    /// Can write/export models.
    pub write: bool,
    /// Holds every entry of a model, not just one.
    pub multi_entry: bool,
    /// Preserves all geometric information.
    pub lossless: bool,
}

impl FormatCapability {
    /// Full capability (read, write, any number of entries, lossless).
    pub const FULL: Self = Self {
        read: true,
        write: true,
        multi_entry: true,
        lossless: true,
    };

    /// Read and write a single curve.
    pub const SINGLE_CURVE: Self = Self {
        read: true,
        write: true,
        multi_entry: false,
        lossless: true,
    };
}

/// Result of decoding: the model plus every entry that was dropped.
#[derive(Debug)]
pub struct Decoded {
    pub model: Model,
    pub diagnostics: Vec<EntryFailure>,
}

impl Decoded {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            diagnostics: Vec::new(),
        }
    }

    /// True when no entry was dropped.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Trait for model interchange formats.
///
/// Implementations convert between the standalone `Model` representation
/// and external text formats. A format never sees a host document: capture
/// and reconstruction happen on either side of it.
///
/// ## Failure granularity
///
/// `decode` fails as a whole only when the document itself cannot be
/// interpreted. Problems confined to one entry drop that entry and are
/// reported in [`Decoded::diagnostics`].
pub trait ModelFormat: Send + Sync {
    /// Human-readable name of the format.
    fn name(&self) -> &'static str;

    /// File extension(s) for this format.
    fn extensions(&self) -> &'static [&'static str];

    /// MIME type for this format.
    fn mime_type(&self) -> &'static str;

    /// Capabilities of this format implementation.
    fn capabilities(&self) -> FormatCapability;

    /// Decode a model from bytes, collecting per-entry diagnostics.
    fn decode(&self, input: &[u8]) -> Result<Decoded, InterchangeError>;

    /// Decode a model from bytes, discarding diagnostics.
    fn read(&self, input: &[u8]) -> Result<Model, InterchangeError> {
        self.decode(input).map(|decoded| decoded.model)
    }

    /// Write a model to bytes.
    fn write(&self, model: &Model) -> Result<Vec<u8>, InterchangeError>;

    /// Validate that the input is well-formed for this format.
    ///
    /// This is a quick check that doesn't fully parse the content.
    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let _ = input;
        Ok(())
    }
}

/// Text encodings of a full model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    Xml,
    Json,
}

impl Format {
    /// The codec for this encoding.
    pub fn codec(self) -> Box<dyn ModelFormat> {
        match self {
            Format::Xml => Box::new(Xml::default()),
            Format::Json => Box::new(Json),
        }
    }
}

/// Encode `model` as text.
pub fn encode(model: &Model, format: Format) -> Result<String, InterchangeError> {
    let bytes = format.codec().write(model)?;
    String::from_utf8(bytes)
        .map_err(|e| InterchangeError::Unsupported(format!("encoder produced invalid UTF-8: {e}")))
}

/// Decode text produced by [`encode`] (or any conforming writer).
pub fn decode(text: &str, format: Format) -> Result<Decoded, InterchangeError> {
    format.codec().decode(text.as_bytes())
}
