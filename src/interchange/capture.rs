//! Host document → `Model`.
//!
//! Capture is the only place that looks at host geometry kinds. Each
//! selected object is classified once: supported kinds become entries,
//! everything else is counted as skipped. The document is never modified.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::InterchangeError;
use super::model::{
    Brep, BrepFace, BrepLoop, BrepTrim, ControlPoint, Curve, Geometry, GeometryEntry, LoopKind,
    Model, Point, Surface, TrimKind,
};
use crate::document::{HostDocument, HostGeometry, HostObject, ObjectId};
use crate::kernel::{self, ControlVertex, LoopType, NurbsCurve, NurbsSurface, TrimType};

/// Which objects to capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every object in document order.
    All,
    /// These objects, in this order.
    Objects(Vec<ObjectId>),
}

/// Outcome of a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct Captured {
    pub model: Model,
    /// Selected objects that have no interchange representation.
    pub skipped: usize,
}

/// Capture the selected objects into a new model.
pub fn capture(doc: &dyn HostDocument, selection: &Selection) -> Result<Captured, InterchangeError> {
    capture_cancellable(doc, selection, &CancellationToken::new())
}

/// Capture with cancellation support.
/// Returns `Cancelled` if the token is signalled between objects.
pub fn capture_cancellable(
    doc: &dyn HostDocument,
    selection: &Selection,
    cancel: &CancellationToken,
) -> Result<Captured, InterchangeError> {
    let objects = resolve(doc, selection)?;
    let mut captured = Captured {
        model: Model::new(),
        skipped: 0,
    };

    for object in objects {
        if cancel.is_cancelled() {
            return Err(InterchangeError::Cancelled);
        }
        match classify(&object.geometry) {
            Some(geometry) => {
                captured.model.push(entry_for(object, geometry));
            }
            None => {
                debug!(id = %object.id, kind = object.geometry.kind_name(), "Skipping unsupported object");
                captured.skipped += 1;
            }
        }
    }

    info!(
        captured = captured.model.len(),
        skipped = captured.skipped,
        "Captured geometry"
    );
    Ok(captured)
}

/// Capture the first curve of the selection as a single-entry model.
///
/// Every other selected object counts as skipped.
pub fn capture_curve(
    doc: &dyn HostDocument,
    selection: &Selection,
) -> Result<Captured, InterchangeError> {
    let objects = resolve(doc, selection)?;
    let total = objects.len();
    let mut model = Model::new();

    if let Some((object, curve)) = objects.iter().find_map(|object| match &object.geometry {
        HostGeometry::Curve(curve) => Some((*object, curve)),
        _ => None,
    }) {
        let geometry = Geometry::Curve(curve_from_host(&curve.to_nurbs()));
        model.push(entry_for(object, geometry));
    }

    let captured = Captured {
        skipped: total - model.len(),
        model,
    };
    info!(
        captured = captured.model.len(),
        skipped = captured.skipped,
        "Captured curve"
    );
    Ok(captured)
}

fn resolve<'a>(
    doc: &'a dyn HostDocument,
    selection: &Selection,
) -> Result<Vec<&'a HostObject>, InterchangeError> {
    let ids = match selection {
        Selection::All => doc.object_ids(),
        Selection::Objects(ids) => ids.clone(),
    };
    ids.iter()
        .map(|id| {
            doc.find(id)
                .ok_or_else(|| InterchangeError::InvalidSelection(format!("no object with id {id}")))
        })
        .collect()
}

fn entry_for(object: &HostObject, geometry: Geometry) -> GeometryEntry {
    let entry = GeometryEntry::new(geometry);
    match &object.name {
        Some(name) => entry.with_name(name.clone()),
        None => entry,
    }
}

fn classify(geometry: &HostGeometry) -> Option<Geometry> {
    match geometry {
        HostGeometry::Point(p) => Some(Geometry::Point(Point::new(p.x, p.y, p.z))),
        HostGeometry::Curve(curve) => Some(Geometry::Curve(curve_from_host(&curve.to_nurbs()))),
        HostGeometry::Surface(surface) => Some(Geometry::Surface(surface_from_host(surface))),
        HostGeometry::Brep(brep) => Some(Geometry::Brep(brep_from_host(brep))),
        HostGeometry::Mesh(_) | HostGeometry::TextDot(_) => None,
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

fn control_point(cv: &ControlVertex) -> ControlPoint {
    ControlPoint::weighted(cv.location.x, cv.location.y, cv.location.z, cv.weight)
}

/// Host knots lack the two end knots; repeat the first and last.
fn full_knots(host: &[f64]) -> Vec<f64> {
    match (host.first(), host.last()) {
        (Some(&first), Some(&last)) => {
            let mut knots = Vec::with_capacity(host.len() + 2);
            knots.push(first);
            knots.extend_from_slice(host);
            knots.push(last);
            knots
        }
        _ => Vec::new(),
    }
}

fn curve_from_host(curve: &NurbsCurve) -> Curve {
    Curve {
        degree: curve.degree() as u32,
        control_points: curve.points().iter().map(control_point).collect(),
        knots: full_knots(curve.knots()),
        closed: curve.is_closed(),
        periodic: curve.is_periodic(),
    }
}

fn surface_from_host(surface: &NurbsSurface) -> Surface {
    Surface {
        degree_u: (surface.order_u() - 1) as u32,
        degree_v: (surface.order_v() - 1) as u32,
        count_u: surface.count_u(),
        count_v: surface.count_v(),
        control_points: surface.points().iter().map(control_point).collect(),
        knots_u: full_knots(surface.knots_u()),
        knots_v: full_knots(surface.knots_v()),
        closed_u: surface.is_closed_u(),
        closed_v: surface.is_closed_v(),
    }
}

fn brep_from_host(brep: &kernel::Brep) -> Brep {
    Brep {
        surfaces: brep.surfaces.iter().map(surface_from_host).collect(),
        curves_2d: brep.curves_2d.iter().map(curve_from_host).collect(),
        faces: brep
            .faces
            .iter()
            .map(|f| BrepFace {
                surface: f.surface_index,
                loops: f.loop_indices.clone(),
                reversed: f.orientation_reversed,
            })
            .collect(),
        loops: brep
            .loops
            .iter()
            .map(|l| BrepLoop {
                face: l.face_index,
                kind: loop_kind(l.loop_type),
                trims: l.trim_indices.clone(),
            })
            .collect(),
        trims: brep
            .trims
            .iter()
            .map(|t| BrepTrim {
                curve: t.curve_index,
                loop_index: t.loop_index,
                kind: trim_kind(t.trim_type),
                reversed: t.reversed,
            })
            .collect(),
        solid: brep.is_solid,
    }
}

fn loop_kind(loop_type: LoopType) -> LoopKind {
    match loop_type {
        LoopType::Unknown => LoopKind::Unknown,
        LoopType::Outer => LoopKind::Outer,
        LoopType::Inner => LoopKind::Inner,
        LoopType::Slit => LoopKind::Slit,
        LoopType::CurveOnSurface => LoopKind::CurveOnSurface,
        LoopType::PointOnSurface => LoopKind::PointOnSurface,
    }
}

fn trim_kind(trim_type: TrimType) -> TrimKind {
    match trim_type {
        TrimType::Unknown => TrimKind::Unknown,
        TrimType::Boundary => TrimKind::Boundary,
        TrimType::Mated => TrimKind::Mated,
        TrimType::Seam => TrimKind::Seam,
        TrimType::Singular => TrimKind::Singular,
        TrimType::CurveOnSurface => TrimKind::CurveOnSurface,
        TrimType::PointOnSurface => TrimKind::PointOnSurface,
        TrimType::Slit => TrimKind::Slit,
    }
}
