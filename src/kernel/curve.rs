//! Host curve types.

use std::f64::consts::{FRAC_PI_2, TAU};

use super::{ControlVertex, KernelError, MAX_ORDER, Point3d, check_knots};

/// Any curve the host document can hold.
#[derive(Clone, Debug, PartialEq)]
pub enum Curve {
    Line(LineCurve),
    Polyline(PolylineCurve),
    Arc(ArcCurve),
    Nurbs(NurbsCurve),
}

impl Curve {
    /// Exact NURBS form of this curve.
    ///
    /// Lines and polylines are degree-1 NURBS curves whose knots are the
    /// curve parameters at each vertex. Arcs are rational quadratics. No
    /// approximation happens here.
    pub fn to_nurbs(&self) -> NurbsCurve {
        match self {
            Curve::Nurbs(nurbs) => nurbs.clone(),
            Curve::Line(line) => line.to_nurbs(),
            Curve::Polyline(polyline) => polyline.to_nurbs(),
            Curve::Arc(arc) => arc.to_nurbs(),
        }
    }
}

impl From<NurbsCurve> for Curve {
    fn from(curve: NurbsCurve) -> Self {
        Curve::Nurbs(curve)
    }
}

// ============================================================================
// LINE / POLYLINE
// ============================================================================

/// Straight segment parameterized over `domain`.
#[derive(Clone, Debug, PartialEq)]
pub struct LineCurve {
    pub from: Point3d,
    pub to: Point3d,
    pub domain: (f64, f64),
}

impl LineCurve {
    /// Line parameterized by arc length.
    pub fn new(from: Point3d, to: Point3d) -> Self {
        Self {
            from,
            to,
            domain: (0.0, from.distance_to(&to)),
        }
    }

    pub fn to_nurbs(&self) -> NurbsCurve {
        NurbsCurve {
            order: 2,
            rational: false,
            cvs: vec![
                ControlVertex::unweighted(self.from),
                ControlVertex::unweighted(self.to),
            ],
            knots: vec![self.domain.0, self.domain.1],
            closed: false,
            periodic: false,
        }
    }
}

/// Connected straight segments. Vertex `i` sits at parameter `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct PolylineCurve {
    pub points: Vec<Point3d>,
}

impl PolylineCurve {
    pub fn new(points: Vec<Point3d>) -> Self {
        Self { points }
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points.first() == self.points.last()
    }

    pub fn to_nurbs(&self) -> NurbsCurve {
        NurbsCurve {
            order: 2,
            rational: false,
            cvs: self
                .points
                .iter()
                .copied()
                .map(ControlVertex::unweighted)
                .collect(),
            knots: (0..self.points.len()).map(|i| i as f64).collect(),
            closed: self.is_closed(),
            periodic: false,
        }
    }
}

// ============================================================================
// ARC
// ============================================================================

/// Circular arc in the plane `z = center.z`, parameterized by angle.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcCurve {
    pub center: Point3d,
    pub radius: f64,
    /// Start and end angle in radians from +X. The sweep lies in `(0, 2π]`.
    pub angle: (f64, f64),
}

impl ArcCurve {
    pub fn new(center: Point3d, radius: f64, angle: (f64, f64)) -> Self {
        Self {
            center,
            radius,
            angle,
        }
    }

    pub fn circle(center: Point3d, radius: f64) -> Self {
        Self::new(center, radius, (0.0, TAU))
    }

    pub fn is_circle(&self) -> bool {
        self.angle.1 - self.angle.0 >= TAU
    }

    pub fn point_at(&self, angle: f64) -> Point3d {
        self.point_at_distance(angle, self.radius)
    }

    fn point_at_distance(&self, angle: f64, distance: f64) -> Point3d {
        Point3d::new(
            self.center.x + distance * angle.cos(),
            self.center.y + distance * angle.sin(),
            self.center.z,
        )
    }

    /// Rational quadratic with one span per quarter turn or less.
    ///
    /// Each span's middle vertex sits where the end tangents meet, weighted
    /// by the cosine of half the span angle.
    pub fn to_nurbs(&self) -> NurbsCurve {
        let (start, end) = self.angle;
        let spans = ((end - start) / FRAC_PI_2).ceil().clamp(1.0, 4.0) as usize;
        let step = (end - start) / spans as f64;
        let weight = (step / 2.0).cos();
        let at = |i: usize| if i == spans { end } else { start + i as f64 * step };

        let mut cvs = Vec::with_capacity(2 * spans + 1);
        let mut knots = Vec::with_capacity(2 * spans + 2);
        for i in 0..spans {
            cvs.push(ControlVertex::unweighted(self.point_at(at(i))));
            cvs.push(ControlVertex::new(
                self.point_at_distance(at(i) + step / 2.0, self.radius / weight),
                weight,
            ));
            knots.extend([at(i), at(i)]);
        }
        cvs.push(ControlVertex::unweighted(self.point_at(end)));
        knots.extend([end, end]);

        NurbsCurve {
            order: 3,
            rational: true,
            cvs,
            knots,
            closed: self.is_circle(),
            periodic: false,
        }
    }
}

// ============================================================================
// NURBS
// ============================================================================

/// Host NURBS curve.
///
/// Holds `cv_count + order - 2` knots (no superfluous end knots).
#[derive(Clone, Debug, PartialEq)]
pub struct NurbsCurve {
    order: usize,
    rational: bool,
    cvs: Vec<ControlVertex>,
    knots: Vec<f64>,
    closed: bool,
    periodic: bool,
}

impl NurbsCurve {
    /// Allocate a curve with all vertices at the origin and zero knots.
    pub fn create(rational: bool, order: usize, cv_count: usize) -> Result<Self, KernelError> {
        if !(2..=MAX_ORDER).contains(&order) {
            return Err(KernelError::InvalidOrder(order));
        }
        if cv_count < order {
            return Err(KernelError::TooFewPoints {
                count: cv_count,
                order,
            });
        }
        Ok(Self {
            order,
            rational,
            cvs: vec![ControlVertex::default(); cv_count],
            knots: vec![0.0; cv_count + order - 2],
            closed: false,
            periodic: false,
        })
    }

    pub fn degree(&self) -> usize {
        self.order - 1
    }

    pub fn is_rational(&self) -> bool {
        self.rational
    }

    pub fn cv_count(&self) -> usize {
        self.cvs.len()
    }

    pub fn points(&self) -> &[ControlVertex] {
        &self.cvs
    }

    /// Set a control vertex. The weight is dropped for non-rational curves.
    pub fn set_point(
        &mut self,
        index: usize,
        location: Point3d,
        weight: f64,
    ) -> Result<(), KernelError> {
        let count = self.cvs.len();
        let slot = self
            .cvs
            .get_mut(index)
            .ok_or(KernelError::IndexOutOfRange { index, count })?;
        if !(weight.is_finite() && weight > 0.0) {
            return Err(KernelError::InvalidWeight(weight));
        }
        *slot = if self.rational {
            ControlVertex::new(location, weight)
        } else {
            ControlVertex::unweighted(location)
        };
        Ok(())
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn set_knot(&mut self, index: usize, value: f64) -> Result<(), KernelError> {
        let count = self.knots.len();
        let slot = self
            .knots
            .get_mut(index)
            .ok_or(KernelError::IndexOutOfRange { index, count })?;
        *slot = value;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    pub fn set_periodic(&mut self, periodic: bool) {
        self.periodic = periodic;
    }

    /// Check the kernel invariants.
    pub fn is_valid(&self) -> Result<(), KernelError> {
        if !(2..=MAX_ORDER).contains(&self.order) {
            return Err(KernelError::InvalidOrder(self.order));
        }
        if self.cvs.len() < self.order {
            return Err(KernelError::TooFewPoints {
                count: self.cvs.len(),
                order: self.order,
            });
        }
        for cv in &self.cvs {
            if !(cv.weight.is_finite() && cv.weight > 0.0) {
                return Err(KernelError::InvalidWeight(cv.weight));
            }
        }
        check_knots(&self.knots)
    }
}
