//! Minimal host geometry kernel.
//!
//! These are the host-native geometry types that capture reads from and
//! reconstruction builds. They follow the host's conventions, which differ
//! from the interchange model:
//!
//! - NURBS objects are described by *order* (degree + 1), not degree.
//! - Knot vectors are stored without the two superfluous end knots, so a
//!   curve has `cv_count + order - 2` knots.
//! - Control vertices carry Euclidean coordinates plus a weight; the weight
//!   is only meaningful when the object is rational.
//!
//! No evaluation, fitting or intersection lives here.

mod brep;
mod curve;
mod surface;

pub use brep::{Brep, BrepFace, BrepLoop, BrepTrim, LoopType, TrimType};
pub use curve::{ArcCurve, Curve, LineCurve, NurbsCurve, PolylineCurve};
pub use surface::NurbsSurface;

use thiserror::Error;

/// Highest degree the kernel can construct.
pub const MAX_DEGREE: usize = 11;

/// Highest order the kernel can construct.
pub const MAX_ORDER: usize = MAX_DEGREE + 1;

/// Errors raised by kernel constructors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error("order {0} outside supported range 2..={MAX_ORDER}")]
    InvalidOrder(usize),

    #[error("{count} control vertices is too few for order {order}")]
    TooFewPoints { count: usize, order: usize },

    #[error("index {index} out of range (count: {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("weight {0} must be finite and positive")]
    InvalidWeight(f64),

    #[error("knot vector is not non-decreasing at index {0}")]
    DecreasingKnots(usize),

    #[error("invalid topology: {0}")]
    Topology(String),
}

// ============================================================================
// POINTS
// ============================================================================

/// A location in 3D space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3d {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Point3d) -> f64 {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A NURBS control vertex: Euclidean location plus weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlVertex {
    pub location: Point3d,
    pub weight: f64,
}

impl ControlVertex {
    pub const fn new(location: Point3d, weight: f64) -> Self {
        Self { location, weight }
    }

    pub const fn unweighted(location: Point3d) -> Self {
        Self::new(location, 1.0)
    }
}

impl Default for ControlVertex {
    fn default() -> Self {
        Self::unweighted(Point3d::ORIGIN)
    }
}

// ============================================================================
// UNSUPPORTED KINDS
// ============================================================================

/// Triangle/quad mesh. Not representable in the interchange format.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3d>,
    pub faces: Vec<[usize; 4]>,
}

/// Text annotation pinned to a location. Not representable in the
/// interchange format.
#[derive(Clone, Debug, PartialEq)]
pub struct TextDot {
    pub text: String,
    pub location: Point3d,
}

/// Check that `knots` never decreases.
pub(crate) fn check_knots(knots: &[f64]) -> Result<(), KernelError> {
    for (i, pair) in knots.windows(2).enumerate() {
        if !(pair[0] <= pair[1]) {
            return Err(KernelError::DecreasingKnots(i + 1));
        }
    }
    Ok(())
}
