//! `Model` → host document.
//!
//! Every entry is validated and converted on its own. A failing entry is
//! recorded in the report and never stops its siblings.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{EntryFailure, InterchangeError};
use super::model::{
    Brep, ControlPoint, Curve, Geometry, GeometryEntry, LoopKind, Model, Surface, TrimKind,
};
use crate::document::{HostDocument, HostError, HostGeometry, ObjectId};
use crate::kernel::{self, KernelError, LoopType, NurbsCurve, NurbsSurface, Point3d, TrimType};

/// What an import did to the document.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Host ids of the objects added, in entry order.
    pub added: Vec<ObjectId>,
    pub failures: Vec<EntryFailure>,
}

impl ImportReport {
    /// True iff at least one entry was added.
    pub fn success(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Add every entry of `model` to `doc`.
pub fn reconstruct(model: &Model, doc: &mut dyn HostDocument) -> ImportReport {
    reconstruct_cancellable(model, doc, &CancellationToken::new())
}

/// Reconstruct with cancellation support.
/// Stops between entries when the token is signalled; entries not reached
/// are neither added nor reported.
pub fn reconstruct_cancellable(
    model: &Model,
    doc: &mut dyn HostDocument,
    cancel: &CancellationToken,
) -> ImportReport {
    let mut report = ImportReport::default();

    for (index, entry) in model.entries.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(reached = index, total = model.len(), "Reconstruction cancelled");
            break;
        }
        match add_entry(entry, doc) {
            Ok(id) => report.added.push(id),
            Err(error) => {
                warn!(index, id = %entry.id, %error, "Failed to reconstruct entry");
                report.failures.push(EntryFailure {
                    index,
                    id: Some(entry.id.clone()),
                    error,
                });
            }
        }
    }

    info!(
        added = report.added.len(),
        failed = report.failures.len(),
        "Reconstructed geometry"
    );
    report
}

fn add_entry(entry: &GeometryEntry, doc: &mut dyn HostDocument) -> Result<ObjectId, InterchangeError> {
    let geometry = to_host(&entry.geometry)?;
    Ok(doc.add(geometry, entry.name.as_deref())?)
}

/// Validate and convert one geometry to its host form.
pub fn to_host(geometry: &Geometry) -> Result<HostGeometry, InterchangeError> {
    geometry.validate()?;
    Ok(match geometry {
        Geometry::Point(p) => HostGeometry::Point(Point3d::new(p.x, p.y, p.z)),
        Geometry::Curve(curve) => HostGeometry::Curve(curve_to_host(curve)?.into()),
        Geometry::Surface(surface) => HostGeometry::Surface(surface_to_host(surface)?),
        Geometry::Brep(brep) => HostGeometry::Brep(brep_to_host(brep)?),
    })
}

// ============================================================================
// CONVERSIONS
// ============================================================================

// Conversions run after validation, so a kernel refusal here is the host's
// own limit rather than bad input.
fn rejected(error: KernelError) -> InterchangeError {
    InterchangeError::Host(HostError::Rejected(error))
}

fn location(cp: &ControlPoint) -> Point3d {
    Point3d::new(cp.x, cp.y, cp.z)
}

/// Host knot vector: the full vector minus its first and last knot.
///
/// The host has no slot for the end knots, so their values are lost. A
/// clamped vector is unaffected; an unclamped one keeps its shape on the
/// valid domain but reads back from the host with the ends repeated
/// (`[0, 1, 2, 3]` returns as `[1, 1, 2, 2]`).
fn host_knots(full: &[f64]) -> &[f64] {
    let [first, inner @ .., last] = full else {
        return &[];
    };
    if let ([second, ..], [.., penultimate]) = (inner, inner) {
        if first != second || last != penultimate {
            debug!(
                first = *first,
                last = *last,
                "Dropping end knots of an unclamped knot vector"
            );
        }
    }
    inner
}

fn curve_to_host(curve: &Curve) -> Result<NurbsCurve, InterchangeError> {
    let order = curve.degree as usize + 1;
    let mut host = NurbsCurve::create(curve.is_rational(), order, curve.control_points.len())
        .map_err(rejected)?;
    for (i, cp) in curve.control_points.iter().enumerate() {
        host.set_point(i, location(cp), cp.weight).map_err(rejected)?;
    }
    for (i, &knot) in host_knots(&curve.knots).iter().enumerate() {
        host.set_knot(i, knot).map_err(rejected)?;
    }
    host.set_closed(curve.closed);
    host.set_periodic(curve.periodic);
    Ok(host)
}

fn surface_to_host(surface: &Surface) -> Result<NurbsSurface, InterchangeError> {
    let mut host = NurbsSurface::create(
        surface.is_rational(),
        surface.degree_u as usize + 1,
        surface.degree_v as usize + 1,
        surface.count_u,
        surface.count_v,
    )
    .map_err(rejected)?;
    for u in 0..surface.count_u {
        for v in 0..surface.count_v {
            let cp = &surface.control_points[u * surface.count_v + v];
            host.set_point(u, v, location(cp), cp.weight)
                .map_err(rejected)?;
        }
    }
    for (i, &knot) in host_knots(&surface.knots_u).iter().enumerate() {
        host.set_knot_u(i, knot).map_err(rejected)?;
    }
    for (i, &knot) in host_knots(&surface.knots_v).iter().enumerate() {
        host.set_knot_v(i, knot).map_err(rejected)?;
    }
    host.set_closed(surface.closed_u, surface.closed_v);
    Ok(host)
}

fn brep_to_host(brep: &Brep) -> Result<kernel::Brep, InterchangeError> {
    Ok(kernel::Brep {
        surfaces: brep
            .surfaces
            .iter()
            .map(surface_to_host)
            .collect::<Result<_, _>>()?,
        curves_2d: brep
            .curves_2d
            .iter()
            .map(curve_to_host)
            .collect::<Result<_, _>>()?,
        faces: brep
            .faces
            .iter()
            .map(|f| kernel::BrepFace {
                surface_index: f.surface,
                loop_indices: f.loops.clone(),
                orientation_reversed: f.reversed,
            })
            .collect(),
        loops: brep
            .loops
            .iter()
            .map(|l| kernel::BrepLoop {
                face_index: l.face,
                loop_type: loop_type(l.kind),
                trim_indices: l.trims.clone(),
            })
            .collect(),
        trims: brep
            .trims
            .iter()
            .map(|t| kernel::BrepTrim {
                curve_index: t.curve,
                loop_index: t.loop_index,
                trim_type: trim_type(t.kind),
                reversed: t.reversed,
            })
            .collect(),
        is_solid: brep.solid,
    })
}

fn loop_type(kind: LoopKind) -> LoopType {
    match kind {
        LoopKind::Unknown => LoopType::Unknown,
        LoopKind::Outer => LoopType::Outer,
        LoopKind::Inner => LoopType::Inner,
        LoopKind::Slit => LoopType::Slit,
        LoopKind::CurveOnSurface => LoopType::CurveOnSurface,
        LoopKind::PointOnSurface => LoopType::PointOnSurface,
    }
}

fn trim_type(kind: TrimKind) -> TrimType {
    match kind {
        TrimKind::Unknown => TrimType::Unknown,
        TrimKind::Boundary => TrimType::Boundary,
        TrimKind::Mated => TrimType::Mated,
        TrimKind::Seam => TrimType::Seam,
        TrimKind::Singular => TrimType::Singular,
        TrimKind::CurveOnSurface => TrimType::CurveOnSurface,
        TrimKind::PointOnSurface => TrimType::PointOnSurface,
        TrimKind::Slit => TrimType::Slit,
    }
}
