//! Host NURBS surface.

use super::{ControlVertex, KernelError, MAX_ORDER, Point3d, check_knots};

/// Host NURBS surface.
///
/// Control vertices are stored u-major: vertex `(u, v)` lives at
/// `u * count_v + v`. Each knot vector holds `count + order - 2` knots.
#[derive(Clone, Debug, PartialEq)]
pub struct NurbsSurface {
    order_u: usize,
    order_v: usize,
    count_u: usize,
    count_v: usize,
    rational: bool,
    cvs: Vec<ControlVertex>,
    knots_u: Vec<f64>,
    knots_v: Vec<f64>,
    closed_u: bool,
    closed_v: bool,
}

impl NurbsSurface {
    pub fn create(
        rational: bool,
        order_u: usize,
        order_v: usize,
        count_u: usize,
        count_v: usize,
    ) -> Result<Self, KernelError> {
        for (order, count) in [(order_u, count_u), (order_v, count_v)] {
            if !(2..=MAX_ORDER).contains(&order) {
                return Err(KernelError::InvalidOrder(order));
            }
            if count < order {
                return Err(KernelError::TooFewPoints { count, order });
            }
        }
        Ok(Self {
            order_u,
            order_v,
            count_u,
            count_v,
            rational,
            cvs: vec![ControlVertex::default(); count_u * count_v],
            knots_u: vec![0.0; count_u + order_u - 2],
            knots_v: vec![0.0; count_v + order_v - 2],
            closed_u: false,
            closed_v: false,
        })
    }

    pub fn order_u(&self) -> usize {
        self.order_u
    }

    pub fn order_v(&self) -> usize {
        self.order_v
    }

    pub fn count_u(&self) -> usize {
        self.count_u
    }

    pub fn count_v(&self) -> usize {
        self.count_v
    }

    pub fn is_rational(&self) -> bool {
        self.rational
    }

    pub fn points(&self) -> &[ControlVertex] {
        &self.cvs
    }

    pub fn knots_u(&self) -> &[f64] {
        &self.knots_u
    }

    pub fn knots_v(&self) -> &[f64] {
        &self.knots_v
    }

    pub fn is_closed_u(&self) -> bool {
        self.closed_u
    }

    pub fn is_closed_v(&self) -> bool {
        self.closed_v
    }

    pub fn set_closed(&mut self, closed_u: bool, closed_v: bool) {
        self.closed_u = closed_u;
        self.closed_v = closed_v;
    }

    pub fn set_point(
        &mut self,
        u: usize,
        v: usize,
        location: Point3d,
        weight: f64,
    ) -> Result<(), KernelError> {
        if u >= self.count_u {
            return Err(KernelError::IndexOutOfRange {
                index: u,
                count: self.count_u,
            });
        }
        if v >= self.count_v {
            return Err(KernelError::IndexOutOfRange {
                index: v,
                count: self.count_v,
            });
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(KernelError::InvalidWeight(weight));
        }
        self.cvs[u * self.count_v + v] = if self.rational {
            ControlVertex::new(location, weight)
        } else {
            ControlVertex::unweighted(location)
        };
        Ok(())
    }

    pub fn set_knot_u(&mut self, index: usize, value: f64) -> Result<(), KernelError> {
        set_knot(&mut self.knots_u, index, value)
    }

    pub fn set_knot_v(&mut self, index: usize, value: f64) -> Result<(), KernelError> {
        set_knot(&mut self.knots_v, index, value)
    }

    pub fn is_valid(&self) -> Result<(), KernelError> {
        for cv in &self.cvs {
            if !(cv.weight.is_finite() && cv.weight > 0.0) {
                return Err(KernelError::InvalidWeight(cv.weight));
            }
        }
        check_knots(&self.knots_u)?;
        check_knots(&self.knots_v)
    }
}

fn set_knot(knots: &mut [f64], index: usize, value: f64) -> Result<(), KernelError> {
    let count = knots.len();
    let slot = knots
        .get_mut(index)
        .ok_or(KernelError::IndexOutOfRange { index, count })?;
    *slot = value;
    Ok(())
}
