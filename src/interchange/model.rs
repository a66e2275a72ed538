//! Standalone model representation for interchange.
//!
//! The `Model` is a plain value tree: it owns every coordinate, weight and
//! knot it describes and never refers back to the host document it was
//! captured from. Both codecs read and write this type, and the
//! reconstructor consumes it.
//!
//! ```text
//! Model
//! ├── format_version, application, units, tolerance
//! └── entries: Vec<GeometryEntry>
//!     └── GeometryEntry { id, name, geometry: Point | Curve | Surface | Brep }
//! ```
//!
//! Brep topology is expressed with positional indices (face → surface,
//! loop → face, trim → loop and 2D curve), which survive any encoding.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{EntryFailure, InterchangeError};
use crate::kernel::MAX_DEGREE;

/// Version written into every encoded model.
pub const MODEL_FORMAT_VERSION: &str = "1.0";

/// Entry tags shared by every encoding.
pub mod tags {
    pub const POINT: &str = "Point";
    pub const CURVE: &str = "NurbsCurve";
    pub const SURFACE: &str = "NurbsSurface";
    pub const BREP: &str = "Brep";

    /// Every tag a decoder understands.
    pub const RECOGNIZED: &[&str] = &[POINT, CURVE, SURFACE, BREP];
}

/// Whether a format version can be read without degrading.
pub fn version_is_supported(version: &str) -> bool {
    let current_major = MODEL_FORMAT_VERSION.split('.').next();
    version.trim().split('.').next() == current_major
}

// ============================================================================
// IDs
// ============================================================================

/// Opaque identifier of an entry, kept only for round-trip traceability.
///
/// This is not the host object's identity: host ids are not portable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(pub Arc<str>);

impl EntryId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Generate a new UUID-based ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// UNITS
// ============================================================================

/// Model unit system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitSystem {
    None,
    Microns,
    Millimeters,
    Centimeters,
    Meters,
    Kilometers,
    Inches,
    Feet,
    Miles,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::None => "none",
            UnitSystem::Microns => "microns",
            UnitSystem::Millimeters => "millimeters",
            UnitSystem::Centimeters => "centimeters",
            UnitSystem::Meters => "meters",
            UnitSystem::Kilometers => "kilometers",
            UnitSystem::Inches => "inches",
            UnitSystem::Feet => "feet",
            UnitSystem::Miles => "miles",
        }
    }

    /// Parse a unit name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.trim().to_ascii_lowercase().as_str() {
            "none" => UnitSystem::None,
            "microns" => UnitSystem::Microns,
            "millimeters" => UnitSystem::Millimeters,
            "centimeters" => UnitSystem::Centimeters,
            "meters" => UnitSystem::Meters,
            "kilometers" => UnitSystem::Kilometers,
            "inches" => UnitSystem::Inches,
            "feet" => UnitSystem::Feet,
            "miles" => UnitSystem::Miles,
            _ => return None,
        })
    }
}

// ============================================================================
// GEOMETRY PAYLOADS
// ============================================================================

fn unit_weight() -> f64 {
    1.0
}

fn is_unit_weight(weight: &f64) -> bool {
    *weight == 1.0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A location.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A NURBS control point: Euclidean coordinates plus weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// 1.0 means non-rational.
    #[serde(default = "unit_weight", skip_serializing_if = "is_unit_weight")]
    pub weight: f64,
}

impl ControlPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::weighted(x, y, z, 1.0)
    }

    pub fn weighted(x: f64, y: f64, z: f64, weight: f64) -> Self {
        Self { x, y, z, weight }
    }
}

/// NURBS curve.
///
/// `knots` is the full knot vector: `control_points.len() + degree + 1`
/// values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub degree: u32,
    #[serde(rename = "points")]
    pub control_points: Vec<ControlPoint>,
    pub knots: Vec<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub closed: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub periodic: bool,
}

impl Curve {
    pub fn new(degree: u32, control_points: Vec<ControlPoint>, knots: Vec<f64>) -> Self {
        Self {
            degree,
            control_points,
            knots,
            closed: false,
            periodic: false,
        }
    }

    pub fn with_closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    pub fn with_periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    /// Knot count implied by degree and control-point count.
    pub fn expected_knot_count(&self) -> usize {
        self.control_points.len() + self.degree as usize + 1
    }

    /// Rational iff some weight differs from exactly 1.0.
    pub fn is_rational(&self) -> bool {
        self.control_points.iter().any(|cp| cp.weight != 1.0)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), InterchangeError> {
        check_degree(self.degree, "degree")?;
        check_count(self.control_points.len(), self.degree, "control_points")?;
        check_knot_vector(&self.knots, self.expected_knot_count(), "knots")?;
        check_control_points(&self.control_points)
    }
}

/// NURBS surface.
///
/// Control points are u-major: point `(u, v)` is at `u * count_v + v`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Surface {
    pub degree_u: u32,
    pub degree_v: u32,
    pub count_u: usize,
    pub count_v: usize,
    #[serde(rename = "points")]
    pub control_points: Vec<ControlPoint>,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub closed_u: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub closed_v: bool,
}

impl Surface {
    /// Knot counts implied by degree and point count in each direction.
    /// `None` when a declared count is too large to size a knot vector.
    pub fn expected_knot_counts(&self) -> Option<(usize, usize)> {
        Some((
            self.count_u.checked_add(self.degree_u as usize + 1)?,
            self.count_v.checked_add(self.degree_v as usize + 1)?,
        ))
    }

    /// `count_u * count_v`, or `None` on overflow.
    pub fn point_count(&self) -> Option<usize> {
        self.count_u.checked_mul(self.count_v)
    }

    pub fn is_rational(&self) -> bool {
        self.control_points.iter().any(|cp| cp.weight != 1.0)
    }

    pub fn validate(&self) -> Result<(), InterchangeError> {
        check_degree(self.degree_u, "degree_u")?;
        check_degree(self.degree_v, "degree_v")?;
        check_count(self.count_u, self.degree_u, "count_u")?;
        check_count(self.count_v, self.degree_v, "count_v")?;
        let (Some(points), Some((expected_u, expected_v))) =
            (self.point_count(), self.expected_knot_counts())
        else {
            return Err(InterchangeError::invalid_geometry(
                "count_u",
                format!("{} x {} control points is too large", self.count_u, self.count_v),
            ));
        };
        if self.control_points.len() != points {
            return Err(InterchangeError::invalid_geometry(
                "control_points",
                format!(
                    "expected {} x {} = {points} control points, found {}",
                    self.count_u,
                    self.count_v,
                    self.control_points.len()
                ),
            ));
        }
        check_knot_vector(&self.knots_u, expected_u, "knots_u")?;
        check_knot_vector(&self.knots_v, expected_v, "knots_v")?;
        check_control_points(&self.control_points)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoopKind {
    #[default]
    Unknown,
    Outer,
    Inner,
    Slit,
    CurveOnSurface,
    PointOnSurface,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrimKind {
    #[default]
    Unknown,
    Boundary,
    Mated,
    Seam,
    Singular,
    CurveOnSurface,
    PointOnSurface,
    Slit,
}

impl LoopKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopKind::Unknown => "unknown",
            LoopKind::Outer => "outer",
            LoopKind::Inner => "inner",
            LoopKind::Slit => "slit",
            LoopKind::CurveOnSurface => "curveOnSurface",
            LoopKind::PointOnSurface => "pointOnSurface",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        [
            LoopKind::Unknown,
            LoopKind::Outer,
            LoopKind::Inner,
            LoopKind::Slit,
            LoopKind::CurveOnSurface,
            LoopKind::PointOnSurface,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == name)
    }

    fn is_unknown(&self) -> bool {
        *self == LoopKind::Unknown
    }
}

impl TrimKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrimKind::Unknown => "unknown",
            TrimKind::Boundary => "boundary",
            TrimKind::Mated => "mated",
            TrimKind::Seam => "seam",
            TrimKind::Singular => "singular",
            TrimKind::CurveOnSurface => "curveOnSurface",
            TrimKind::PointOnSurface => "pointOnSurface",
            TrimKind::Slit => "slit",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        [
            TrimKind::Unknown,
            TrimKind::Boundary,
            TrimKind::Mated,
            TrimKind::Seam,
            TrimKind::Singular,
            TrimKind::CurveOnSurface,
            TrimKind::PointOnSurface,
            TrimKind::Slit,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == name)
    }

    fn is_unknown(&self) -> bool {
        *self == TrimKind::Unknown
    }
}

/// A trimmed face on `surfaces[surface]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BrepFace {
    pub surface: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loops: Vec<usize>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub reversed: bool,
}

/// A boundary loop of `faces[face]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BrepLoop {
    pub face: usize,
    #[serde(default, skip_serializing_if = "LoopKind::is_unknown")]
    pub kind: LoopKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trims: Vec<usize>,
}

/// A parameter-space trim: `curves_2d[curve]` inside `loops[loop_index]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BrepTrim {
    pub curve: usize,
    #[serde(rename = "loop")]
    pub loop_index: usize,
    #[serde(default, skip_serializing_if = "TrimKind::is_unknown")]
    pub kind: TrimKind,
    #[serde(default, skip_serializing_if = "is_false")]
    pub reversed: bool,
}

/// Boundary representation: surfaces plus index-based trim topology.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Brep {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub surfaces: Vec<Surface>,
    #[serde(default, rename = "curves2d", skip_serializing_if = "Vec::is_empty")]
    pub curves_2d: Vec<Curve>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faces: Vec<BrepFace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loops: Vec<BrepLoop>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trims: Vec<BrepTrim>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub solid: bool,
}

impl Brep {
    pub fn validate(&self) -> Result<(), InterchangeError> {
        for (i, surface) in self.surfaces.iter().enumerate() {
            surface.validate().map_err(|e| in_context(e, "surface", i))?;
        }
        for (i, curve) in self.curves_2d.iter().enumerate() {
            curve.validate().map_err(|e| in_context(e, "2d curve", i))?;
        }
        for (i, face) in self.faces.iter().enumerate() {
            check_index(face.surface, self.surfaces.len(), "faces", "surface", i)?;
            for &lp in &face.loops {
                check_index(lp, self.loops.len(), "faces", "loop", i)?;
            }
        }
        for (i, lp) in self.loops.iter().enumerate() {
            check_index(lp.face, self.faces.len(), "loops", "face", i)?;
            for &trim in &lp.trims {
                check_index(trim, self.trims.len(), "loops", "trim", i)?;
            }
        }
        for (i, trim) in self.trims.iter().enumerate() {
            check_index(trim.curve, self.curves_2d.len(), "trims", "2d curve", i)?;
            check_index(trim.loop_index, self.loops.len(), "trims", "loop", i)?;
        }
        Ok(())
    }
}

// ============================================================================
// ENTRIES
// ============================================================================

/// The payload of one entry. Exactly one variant per entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Point),
    Curve(Curve),
    Surface(Surface),
    Brep(Brep),
}

impl Geometry {
    /// Tag used for this kind in every encoding.
    pub fn tag(&self) -> &'static str {
        match self {
            Geometry::Point(_) => tags::POINT,
            Geometry::Curve(_) => tags::CURVE,
            Geometry::Surface(_) => tags::SURFACE,
            Geometry::Brep(_) => tags::BREP,
        }
    }

    pub fn as_curve(&self) -> Option<&Curve> {
        match self {
            Geometry::Curve(curve) => Some(curve),
            _ => None,
        }
    }

    /// Full structural validation, as done before reconstruction.
    pub fn validate(&self) -> Result<(), InterchangeError> {
        match self {
            Geometry::Point(p) => {
                if p.x.is_finite() && p.y.is_finite() && p.z.is_finite() {
                    Ok(())
                } else {
                    Err(InterchangeError::invalid_geometry(
                        "location",
                        "coordinates must be finite",
                    ))
                }
            }
            Geometry::Curve(curve) => curve.validate(),
            Geometry::Surface(surface) => surface.validate(),
            Geometry::Brep(brep) => brep.validate(),
        }
    }

    /// Knot-count relation checked while decoding. Returns the problem as
    /// text so each codec can wrap it in its own error.
    pub(crate) fn knot_count_mismatch(&self) -> Option<String> {
        match self {
            Geometry::Curve(curve) if curve.knots.len() != curve.expected_knot_count() => {
                Some(format!(
                    "curve has {} knots, expected {} for {} control points of degree {}",
                    curve.knots.len(),
                    curve.expected_knot_count(),
                    curve.control_points.len(),
                    curve.degree
                ))
            }
            Geometry::Surface(surface) => {
                let Some((expected_u, expected_v)) = surface.expected_knot_counts() else {
                    return Some(format!(
                        "surface point counts {} x {} are too large",
                        surface.count_u, surface.count_v
                    ));
                };
                if surface.knots_u.len() != expected_u || surface.knots_v.len() != expected_v {
                    Some(format!(
                        "surface has {}x{} knots, expected {}x{}",
                        surface.knots_u.len(),
                        surface.knots_v.len(),
                        expected_u,
                        expected_v
                    ))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// One geometric object's record.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryEntry {
    pub id: EntryId,
    /// Object name carried over from the host, if any.
    pub name: Option<String>,
    pub geometry: Geometry,
}

impl GeometryEntry {
    /// New entry with a freshly generated id.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: EntryId::generate(),
            name: None,
            geometry,
        }
    }

    pub fn with_id(mut self, id: impl Into<EntryId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// Root of the interchange tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub format_version: String,
    /// Application that wrote the file.
    pub application: Option<String>,
    pub units: Option<UnitSystem>,
    /// Model absolute tolerance.
    pub tolerance: Option<f64>,
    pub entries: Vec<GeometryEntry>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Create an empty model at the current format version.
    pub fn new() -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION.to_string(),
            application: None,
            units: None,
            tolerance: None,
            entries: Vec::new(),
        }
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = Some(units);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Append an entry and return its id.
    pub fn push(&mut self, entry: GeometryEntry) -> &EntryId {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1].id
    }

    /// Append a geometry with a generated id.
    pub fn add(&mut self, geometry: Geometry) -> &EntryId {
        self.push(GeometryEntry::new(geometry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeometryEntry> {
        self.entries.iter()
    }

    /// Iterate over curve entries only.
    pub fn curves(&self) -> impl Iterator<Item = (&GeometryEntry, &Curve)> {
        self.entries
            .iter()
            .filter_map(|e| e.geometry.as_curve().map(|c| (e, c)))
    }

    /// Run reconstruction-time validation on every entry without touching a
    /// document.
    pub fn validate(&self) -> Vec<EntryFailure> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                entry.geometry.validate().err().map(|error| EntryFailure {
                    index,
                    id: Some(entry.id.clone()),
                    error,
                })
            })
            .collect()
    }
}

// ============================================================================
// VALIDATION HELPERS
// ============================================================================

fn check_degree(degree: u32, field: &'static str) -> Result<(), InterchangeError> {
    if (1..=MAX_DEGREE as u32).contains(&degree) {
        Ok(())
    } else {
        Err(InterchangeError::invalid_geometry(
            field,
            format!("degree {degree} outside supported range 1..={MAX_DEGREE}"),
        ))
    }
}

fn check_count(count: usize, degree: u32, field: &'static str) -> Result<(), InterchangeError> {
    if count > degree as usize {
        Ok(())
    } else {
        Err(InterchangeError::invalid_geometry(
            field,
            format!("{count} control points is too few for degree {degree}"),
        ))
    }
}

fn check_knot_vector(
    knots: &[f64],
    expected: usize,
    field: &'static str,
) -> Result<(), InterchangeError> {
    if knots.len() != expected {
        return Err(InterchangeError::invalid_geometry(
            field,
            format!("expected {expected} knots, found {}", knots.len()),
        ));
    }
    if let Some(i) = knots.iter().position(|k| !k.is_finite()) {
        return Err(InterchangeError::invalid_geometry(
            field,
            format!("knot {i} is not finite"),
        ));
    }
    if let Some(i) = knots.windows(2).position(|pair| pair[0] > pair[1]) {
        return Err(InterchangeError::invalid_geometry(
            field,
            format!("knot {} decreases ({} > {})", i + 1, knots[i], knots[i + 1]),
        ));
    }
    Ok(())
}

fn check_control_points(points: &[ControlPoint]) -> Result<(), InterchangeError> {
    for (i, cp) in points.iter().enumerate() {
        if !(cp.x.is_finite() && cp.y.is_finite() && cp.z.is_finite()) {
            return Err(InterchangeError::invalid_geometry(
                "control_points",
                format!("control point {i} is not finite"),
            ));
        }
        if !(cp.weight.is_finite() && cp.weight > 0.0) {
            return Err(InterchangeError::invalid_geometry(
                "weight",
                format!("control point {i} has weight {}", cp.weight),
            ));
        }
    }
    Ok(())
}

fn check_index(
    index: usize,
    count: usize,
    field: &'static str,
    target: &str,
    owner: usize,
) -> Result<(), InterchangeError> {
    if index < count {
        Ok(())
    } else {
        Err(InterchangeError::invalid_geometry(
            field,
            format!("{field} {owner} references {target} {index} (count: {count})"),
        ))
    }
}

fn in_context(error: InterchangeError, what: &str, index: usize) -> InterchangeError {
    match error {
        InterchangeError::InvalidGeometry { field, message } => InterchangeError::InvalidGeometry {
            field,
            message: format!("{what} {index}: {message}"),
        },
        other => other,
    }
}
