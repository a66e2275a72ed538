//! Property-Based Tests
//!
//! Randomized models must survive encode → decode unchanged in both
//! encodings, and both encodings must agree.

use nnurbs::interchange::model::{
    Brep, BrepFace, BrepLoop, BrepTrim, ControlPoint, Curve, Geometry, GeometryEntry, LoopKind,
    Model, Point, Surface, TrimKind, UnitSystem,
};
use nnurbs::interchange::{Format, decode, encode};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_coord() -> impl Strategy<Value = f64> {
    -1.0e6f64..1.0e6
}

fn arb_control_point() -> impl Strategy<Value = ControlPoint> {
    (
        arb_coord(),
        arb_coord(),
        arb_coord(),
        prop_oneof![Just(1.0), 0.01f64..100.0],
    )
        .prop_map(|(x, y, z, w)| ControlPoint::weighted(x, y, z, w))
}

fn arb_curve() -> impl Strategy<Value = Curve> {
    (1u32..=5, 0usize..6)
        .prop_flat_map(|(degree, extra)| {
            let count = degree as usize + 1 + extra;
            (
                Just(degree),
                prop::collection::vec(arb_control_point(), count),
                arb_knots(count + degree as usize + 1),
                any::<bool>(),
                any::<bool>(),
            )
        })
        .prop_map(|(degree, control_points, knots, closed, periodic)| Curve {
            degree,
            control_points,
            knots,
            closed,
            periodic,
        })
}

fn arb_knots(count: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e3f64..1.0e3, count).prop_map(|mut knots| {
        knots.sort_by(f64::total_cmp);
        knots
    })
}

fn arb_surface() -> impl Strategy<Value = Surface> {
    (1u32..=3, 1u32..=3, 0usize..3, 0usize..3)
        .prop_flat_map(|(degree_u, degree_v, extra_u, extra_v)| {
            let count_u = degree_u as usize + 1 + extra_u;
            let count_v = degree_v as usize + 1 + extra_v;
            (
                Just((degree_u, degree_v, count_u, count_v)),
                prop::collection::vec(arb_control_point(), count_u * count_v),
                arb_knots(count_u + degree_u as usize + 1),
                arb_knots(count_v + degree_v as usize + 1),
                any::<(bool, bool)>(),
            )
        })
        .prop_map(
            |((degree_u, degree_v, count_u, count_v), control_points, knots_u, knots_v, closed)| {
                Surface {
                    degree_u,
                    degree_v,
                    count_u,
                    count_v,
                    control_points,
                    knots_u,
                    knots_v,
                    closed_u: closed.0,
                    closed_v: closed.1,
                }
            },
        )
}

fn arb_loop_kind() -> impl Strategy<Value = LoopKind> {
    prop_oneof![
        Just(LoopKind::Unknown),
        Just(LoopKind::Outer),
        Just(LoopKind::Inner),
        Just(LoopKind::Slit),
        Just(LoopKind::CurveOnSurface),
        Just(LoopKind::PointOnSurface),
    ]
}

fn arb_trim_kind() -> impl Strategy<Value = TrimKind> {
    prop_oneof![
        Just(TrimKind::Unknown),
        Just(TrimKind::Boundary),
        Just(TrimKind::Mated),
        Just(TrimKind::Seam),
        Just(TrimKind::Singular),
        Just(TrimKind::CurveOnSurface),
        Just(TrimKind::PointOnSurface),
        Just(TrimKind::Slit),
    ]
}

/// Breps whose topology indices are all in range.
fn arb_brep() -> impl Strategy<Value = Brep> {
    (
        prop::collection::vec(arb_surface(), 1..3),
        prop::collection::vec(arb_curve(), 1..4),
        1usize..3,
        1usize..3,
        1usize..5,
        any::<bool>(),
    )
        .prop_flat_map(|(surfaces, curves_2d, n_faces, n_loops, n_trims, solid)| {
            let faces = prop::collection::vec(
                (0..surfaces.len(), prop::collection::vec(0..n_loops, 0..3), any::<bool>())
                    .prop_map(|(surface, loops, reversed)| BrepFace {
                        surface,
                        loops,
                        reversed,
                    }),
                n_faces,
            );
            let loops = prop::collection::vec(
                (0..n_faces, arb_loop_kind(), prop::collection::vec(0..n_trims, 0..4))
                    .prop_map(|(face, kind, trims)| BrepLoop { face, kind, trims }),
                n_loops,
            );
            let trims = prop::collection::vec(
                (0..curves_2d.len(), 0..n_loops, arb_trim_kind(), any::<bool>()).prop_map(
                    |(curve, loop_index, kind, reversed)| BrepTrim {
                        curve,
                        loop_index,
                        kind,
                        reversed,
                    },
                ),
                n_trims,
            );
            (Just(surfaces), Just(curves_2d), faces, loops, trims, Just(solid))
        })
        .prop_map(|(surfaces, curves_2d, faces, loops, trims, solid)| Brep {
            surfaces,
            curves_2d,
            faces,
            loops,
            trims,
            solid,
        })
}

fn arb_geometry() -> impl Strategy<Value = Geometry> {
    prop_oneof![
        3 => arb_curve().prop_map(Geometry::Curve),
        1 => (arb_coord(), arb_coord(), arb_coord()).prop_map(|(x, y, z)| Geometry::Point(Point::new(x, y, z))),
        2 => arb_surface().prop_map(Geometry::Surface),
        1 => arb_brep().prop_map(Geometry::Brep),
    ]
}

fn arb_entry() -> impl Strategy<Value = GeometryEntry> {
    (arb_geometry(), proptest::option::of("[a-zA-Z0-9 _&<>'-]{0,12}")).prop_map(|(geometry, name)| {
        let entry = GeometryEntry::new(geometry);
        match name {
            Some(name) => entry.with_name(name),
            None => entry,
        }
    })
}

fn arb_model() -> impl Strategy<Value = Model> {
    (
        prop::collection::vec(arb_entry(), 0..6),
        proptest::option::of(prop_oneof![
            Just(UnitSystem::Millimeters),
            Just(UnitSystem::Meters),
            Just(UnitSystem::Inches),
        ]),
        proptest::option::of(1.0e-9f64..1.0),
        proptest::option::of("[ -~]{0,16}"),
    )
        .prop_map(|(entries, units, tolerance, application)| {
            let mut model = Model::new();
            model.application = application;
            model.entries = entries;
            model.units = units;
            model.tolerance = tolerance;
            model
        })
}

// ============================================================================
// Round-trip Properties
// ============================================================================

/// Property: XML round trip is exact
#[test]
fn proptest_xml_roundtrip() {
    proptest!(|(model in arb_model())| {
        let text = encode(&model, Format::Xml).unwrap();
        let decoded = decode(&text, Format::Xml).unwrap();
        prop_assert!(decoded.diagnostics.is_empty());
        prop_assert_eq!(decoded.model, model);
    });
}

/// Property: JSON round trip is exact
#[test]
fn proptest_json_roundtrip() {
    proptest!(|(model in arb_model())| {
        let text = encode(&model, Format::Json).unwrap();
        let decoded = decode(&text, Format::Json).unwrap();
        prop_assert!(decoded.diagnostics.is_empty());
        prop_assert_eq!(decoded.model, model);
    });
}

/// Property: both encodings decode to the same model
#[test]
fn proptest_cross_format_equivalence() {
    proptest!(|(model in arb_model())| {
        let from_xml = decode(&encode(&model, Format::Xml).unwrap(), Format::Xml).unwrap();
        let from_json = decode(&encode(&model, Format::Json).unwrap(), Format::Json).unwrap();
        prop_assert_eq!(from_xml.model, from_json.model);
    });
}

/// Property: generated curves are valid, so a round trip never adds
/// validation failures
#[test]
fn proptest_roundtrip_keeps_validity() {
    proptest!(ProptestConfig::with_cases(64), |(model in arb_model())| {
        prop_assert!(model.validate().is_empty());
        let decoded = decode(&encode(&model, Format::Xml).unwrap(), Format::Xml).unwrap();
        prop_assert!(decoded.model.validate().is_empty());
    });
}
