//! Single-curve XML format (`.nncrv`).
//!
//! ```text
//! <FileCurve version="1.0" id=".." name="..">
//!   <NurbsCurve>..</NurbsCurve>
//! </FileCurve>
//! ```
//!
//! A document holds at most one curve. Decoding yields a model with zero
//! or one curve entry; encoding writes the model's first curve entry.
//! Curve elements after the first are dropped with a diagnostic.

use tracing::{debug, warn};

use super::error::{EntryFailure, InterchangeError};
use super::format::{Decoded, FormatCapability, ModelFormat};
use super::model::{EntryId, Geometry, GeometryEntry, Model, tags};
use super::xml::{XmlOptions, reader, tree, writer};

const CURVE_ROOT: &str = "FileCurve";

/// Single-curve XML format handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveXml {
    options: XmlOptions,
}

impl CurveXml {
    pub fn with_options(options: XmlOptions) -> Self {
        Self { options }
    }
}

impl ModelFormat for CurveXml {
    fn name(&self) -> &'static str {
        "Curve XML"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["nncrv"]
    }

    fn mime_type(&self) -> &'static str {
        "application/xml"
    }

    fn capabilities(&self) -> FormatCapability {
        FormatCapability::SINGLE_CURVE
    }

    fn decode(&self, input: &[u8]) -> Result<Decoded, InterchangeError> {
        let root = tree::parse(input)?;
        if root.name != CURVE_ROOT {
            return Err(InterchangeError::xml(format!(
                "expected <{CURVE_ROOT}> root element, found <{}>",
                root.name
            )));
        }

        let mut model = Model::new();
        model.format_version = reader::read_version(&root);
        let mut decoded = Decoded::new(model);

        let id = root.attribute("id").map(EntryId::from);
        let mut seen_curve = false;
        for (index, node) in root.children.iter().enumerate() {
            if node.name != tags::CURVE {
                warn!(tag = %node.name, "Ignoring unexpected element in curve file");
                decoded.diagnostics.push(EntryFailure {
                    index,
                    id: None,
                    error: InterchangeError::UnknownEntry {
                        tag: node.name.clone(),
                    },
                });
                continue;
            }
            // Only the first curve element is read, whether or not it decodes.
            if seen_curve {
                warn!(index, "Ignoring extra curve in curve file");
                decoded.diagnostics.push(EntryFailure {
                    index,
                    id: None,
                    error: InterchangeError::xml("curve file holds more than one curve"),
                });
                continue;
            }
            seen_curve = true;
            let curve = reader::read_curve(node).and_then(|curve| {
                let geometry = Geometry::Curve(curve);
                match geometry.knot_count_mismatch() {
                    Some(problem) => Err(InterchangeError::xml(problem)),
                    None => Ok(geometry),
                }
            });
            match curve {
                Ok(geometry) => decoded.model.entries.push(GeometryEntry {
                    id: id.clone().unwrap_or_else(EntryId::generate),
                    name: root.attribute("name").map(str::to_string),
                    geometry,
                }),
                Err(error) => {
                    warn!(%error, "Dropping curve");
                    decoded.diagnostics.push(EntryFailure {
                        index,
                        id: id.clone(),
                        error,
                    });
                }
            }
        }

        debug!(curves = decoded.model.len(), "Decoded curve file");
        Ok(decoded)
    }

    fn write(&self, model: &Model) -> Result<Vec<u8>, InterchangeError> {
        let (entry, curve) = model
            .curves()
            .next()
            .ok_or_else(|| InterchangeError::Unsupported("model holds no curve to write".into()))?;
        if model.len() > 1 {
            debug!(
                skipped = model.len() - 1,
                "Curve file keeps only the first curve"
            );
        }

        let mut sink = writer::XmlSink::new(&self.options)?;
        let mut attributes = vec![
            ("version", model.format_version.as_str()),
            ("id", entry.id.as_str()),
        ];
        if let Some(name) = &entry.name {
            attributes.push(("name", name.as_str()));
        }
        sink.open(CURVE_ROOT, &attributes)?;
        writer::write_curve(&mut sink, curve)?;
        sink.close(CURVE_ROOT)?;
        Ok(sink.finish())
    }

    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let content = std::str::from_utf8(input)
            .map_err(|e| InterchangeError::xml(format!("Invalid UTF-8: {e}")))?;
        if !content.contains(CURVE_ROOT) {
            return Err(InterchangeError::xml(format!(
                "Missing <{CURVE_ROOT}> root element"
            )));
        }
        Ok(())
    }
}
