//! JSON interchange format.
//!
//! Pretty-printed, with zero-defaults omitted: a weight of exactly 1.0 and
//! `false` flags are left out and restored by the reader.
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "application": "nnurbs",
//!   "units": "millimeters",
//!   "tolerance": 0.001,
//!   "objects": [
//!     {
//!       "id": "550e8400-e29b-41d4-a716-446655440000",
//!       "name": "rail",
//!       "type": "NurbsCurve",
//!       "degree": 1,
//!       "points": [{ "x": 0.0, "y": 0.0, "z": 0.0 }, { "x": 1.0, "y": 0.0, "z": 0.0 }],
//!       "knots": [0.0, 0.0, 1.0, 1.0]
//!     }
//!   ]
//! }
//! ```
//!
//! Entry payload fields sit next to `id`, `name` and `type` in the same
//! object.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::{EntryFailure, InterchangeError};
use super::format::{Decoded, FormatCapability, ModelFormat};
use super::model::{
    EntryId, Geometry, GeometryEntry, MODEL_FORMAT_VERSION, Model, UnitSystem, tags,
    version_is_supported,
};

/// JSON format handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl ModelFormat for Json {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn capabilities(&self) -> FormatCapability {
        FormatCapability::FULL
    }

    fn decode(&self, input: &[u8]) -> Result<Decoded, InterchangeError> {
        let value: Value = serde_json::from_slice(input)
            .map_err(|e| InterchangeError::json(format!("Parse error: {e}")))?;
        read_model(value)
    }

    fn write(&self, model: &Model) -> Result<Vec<u8>, InterchangeError> {
        let value = model_to_value(model)?;
        let mut output = serde_json::to_vec_pretty(&value)
            .map_err(|e| InterchangeError::json(format!("Write error: {e}")))?;
        output.push(b'\n');
        Ok(output)
    }

    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let content = std::str::from_utf8(input)
            .map_err(|e| InterchangeError::json(format!("Invalid UTF-8: {e}")))?;
        if !content.trim_start().starts_with('{') {
            return Err(InterchangeError::json("Root is not a JSON object"));
        }
        Ok(())
    }
}

// ============================================================================
// WRITER
// ============================================================================

fn model_to_value(model: &Model) -> Result<Value, InterchangeError> {
    let mut root = Map::new();
    root.insert("version".into(), Value::String(model.format_version.clone()));
    if let Some(application) = &model.application {
        root.insert("application".into(), Value::String(application.clone()));
    }
    if let Some(units) = model.units {
        root.insert("units".into(), Value::String(units.as_str().into()));
    }
    if let Some(tolerance) = model.tolerance {
        root.insert("tolerance".into(), to_value(&tolerance)?);
    }
    let objects = model
        .entries
        .iter()
        .map(entry_to_value)
        .collect::<Result<Vec<_>, _>>()?;
    root.insert("objects".into(), Value::Array(objects));
    Ok(Value::Object(root))
}

fn entry_to_value(entry: &GeometryEntry) -> Result<Value, InterchangeError> {
    let mut obj = Map::new();
    obj.insert("id".into(), Value::String(entry.id.as_str().into()));
    if let Some(name) = &entry.name {
        obj.insert("name".into(), Value::String(name.clone()));
    }
    obj.insert("type".into(), Value::String(entry.geometry.tag().into()));

    let payload = match &entry.geometry {
        Geometry::Point(point) => to_value(point)?,
        Geometry::Curve(curve) => to_value(curve)?,
        Geometry::Surface(surface) => to_value(surface)?,
        Geometry::Brep(brep) => to_value(brep)?,
    };
    if let Value::Object(fields) = payload {
        obj.extend(fields);
    }
    Ok(Value::Object(obj))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, InterchangeError> {
    serde_json::to_value(value).map_err(|e| InterchangeError::json(format!("Write error: {e}")))
}

// ============================================================================
// READER
// ============================================================================

fn read_model(value: Value) -> Result<Decoded, InterchangeError> {
    let Value::Object(mut root) = value else {
        return Err(InterchangeError::json("root is not an object"));
    };

    let mut model = Model::new();
    match root.get("version") {
        Some(Value::String(version)) => {
            if !version_is_supported(version) {
                warn!(
                    version = %version,
                    supported = MODEL_FORMAT_VERSION,
                    "Unknown format version, reading recognized entries only"
                );
            }
            model.format_version = version.clone();
        }
        Some(other) => {
            return Err(InterchangeError::json(format!(
                "`version` must be a string, found {other}"
            )));
        }
        None => debug!("No format version, assuming {MODEL_FORMAT_VERSION}"),
    }

    model.application = optional_string(&root, "application")?;
    model.units = match optional_string(&root, "units")? {
        Some(name) => {
            let units = UnitSystem::parse(&name);
            if units.is_none() {
                warn!(units = %name, "Ignoring unknown unit system");
            }
            units
        }
        None => None,
    };
    model.tolerance = match root.get("tolerance") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_f64().ok_or_else(|| {
            InterchangeError::json(format!("`tolerance` must be a number, found {value}"))
        })?),
    };

    let objects = match root.remove("objects") {
        Some(Value::Array(objects)) => objects,
        Some(_) => return Err(InterchangeError::json("`objects` is not an array")),
        None => return Err(InterchangeError::json("missing `objects`")),
    };

    let mut decoded = Decoded::new(model);
    for (index, value) in objects.into_iter().enumerate() {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .map(EntryId::from);
        match read_entry(value) {
            Ok(entry) => decoded.model.entries.push(entry),
            Err(error) => {
                warn!(index, %error, "Dropping JSON entry");
                decoded.diagnostics.push(EntryFailure { index, id, error });
            }
        }
    }

    debug!(
        entries = decoded.model.len(),
        dropped = decoded.diagnostics.len(),
        "Decoded JSON model"
    );
    Ok(decoded)
}

fn optional_string(root: &Map<String, Value>, key: &str) -> Result<Option<String>, InterchangeError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(InterchangeError::json(format!(
            "`{key}` must be a string, found {other}"
        ))),
    }
}

fn read_entry(value: Value) -> Result<GeometryEntry, InterchangeError> {
    let Value::Object(obj) = value else {
        return Err(InterchangeError::json("entry is not an object"));
    };
    let tag = match obj.get("type") {
        Some(Value::String(tag)) => tag.clone(),
        _ => return Err(InterchangeError::json("entry has no `type`")),
    };
    let id = match obj.get("id") {
        Some(Value::String(id)) => EntryId::from(id.as_str()),
        Some(_) => return Err(InterchangeError::json("entry `id` must be a string")),
        None => EntryId::generate(),
    };
    let name = optional_string(&obj, "name")?;

    let payload = Value::Object(obj);
    let geometry = match tag.as_str() {
        tags::POINT => Geometry::Point(from_value(payload)?),
        tags::CURVE => Geometry::Curve(from_value(payload)?),
        tags::SURFACE => Geometry::Surface(from_value(payload)?),
        tags::BREP => Geometry::Brep(from_value(payload)?),
        _ => return Err(InterchangeError::UnknownEntry { tag }),
    };
    if let Some(problem) = geometry.knot_count_mismatch() {
        return Err(InterchangeError::json(problem));
    }

    Ok(GeometryEntry { id, name, geometry })
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, InterchangeError> {
    serde_json::from_value(value).map_err(|e| InterchangeError::json(e.to_string()))
}
