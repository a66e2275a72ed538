//! File types registered with the host.

use std::path::Path;

use crate::document::HostDocument;
use crate::interchange::{
    Captured, CurveXml, InterchangeError, ModelFormat, Selection, Xml, XmlOptions, capture,
    capture_curve,
};

/// A registered file type. The discriminant is the host's file-type index,
/// shared by import and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Every supported object (`.nnxml`).
    Model = 0,
    /// A single curve (`.nncrv`).
    Curve = 1,
}

impl FileType {
    /// Registration order.
    pub const ALL: [FileType; 2] = [FileType::Model, FileType::Curve];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Match a path's extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::ALL.into_iter().find(|t| t.extension() == ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileType::Model => "nnxml",
            FileType::Curve => "nncrv",
        }
    }

    /// Description shown in the host's file dialog.
    pub fn description(self) -> &'static str {
        match self {
            FileType::Model => "Net Nurbs XML (*.nnxml)",
            FileType::Curve => "Net Nurbs Curve (*.nncrv)",
        }
    }

    pub fn codec(self, options: XmlOptions) -> Box<dyn ModelFormat> {
        match self {
            FileType::Model => Box::new(Xml::with_options(options)),
            FileType::Curve => Box::new(CurveXml::with_options(options)),
        }
    }

    /// Capture what this file type can hold.
    pub fn capture(
        self,
        doc: &dyn HostDocument,
        selection: &Selection,
    ) -> Result<Captured, InterchangeError> {
        match self {
            FileType::Model => capture(doc, selection),
            FileType::Curve => capture_curve(doc, selection),
        }
    }
}
