//! Decoder behaviour: defaults, forward compatibility and malformed input.

use nnurbs::document::MemoryDocument;
use nnurbs::interchange::model::{Geometry, GeometryEntry, Model, Point, UnitSystem};
use nnurbs::interchange::{
    CurveXml, Format, InterchangeError, Json, ModelFormat, Xml, decode, encode, reconstruct,
};
use rstest::rstest;

use crate::helpers::geometry_fixtures::{
    bilinear_surface, cubic_curve, rational_arc, square_brep,
};

const XML_CURVE_THEN_UNKNOWN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<File3dm version="1.0">
  <Objects>
    <Object id="c1">
      <NurbsCurve>
        <Degree>1</Degree>
        <Closed>false</Closed>
        <Periodic>false</Periodic>
        <Points>
          <ControlPoint><X>0</X><Y>0</Y><Z>0</Z><Weight>1</Weight></ControlPoint>
          <ControlPoint><X>2</X><Y>0</Y><Z>0</Z><Weight>1</Weight></ControlPoint>
        </Points>
        <Knots><Knot>0</Knot><Knot>0</Knot><Knot>2</Knot><Knot>2</Knot></Knots>
      </NurbsCurve>
    </Object>
    <Object id="x1">
      <SubDSurface><Level>3</Level></SubDSurface>
    </Object>
  </Objects>
</File3dm>
"#;

const JSON_CURVE_THEN_UNKNOWN: &str = r#"{
  "version": "1.0",
  "objects": [
    {"id": "c1", "type": "NurbsCurve", "degree": 1,
     "points": [{"x": 0, "y": 0, "z": 0}, {"x": 2, "y": 0, "z": 0}],
     "knots": [0, 0, 2, 2]},
    {"id": "x1", "type": "SubDSurface", "level": 3}
  ]
}"#;

// ============================================================================
// Forward compatibility
// ============================================================================

#[rstest]
#[case::xml(XML_CURVE_THEN_UNKNOWN, Format::Xml)]
#[case::json(JSON_CURVE_THEN_UNKNOWN, Format::Json)]
fn test_unknown_entry_after_curve_is_dropped(#[case] text: &str, #[case] format: Format) {
    let decoded = decode(text, format).unwrap();

    assert_eq!(decoded.model.len(), 1);
    assert_eq!(decoded.model.entries[0].id.as_str(), "c1");
    assert!(matches!(decoded.model.entries[0].geometry, Geometry::Curve(_)));

    assert_eq!(decoded.diagnostics.len(), 1);
    assert!(matches!(
        &decoded.diagnostics[0].error,
        InterchangeError::UnknownEntry { tag } if tag == "SubDSurface"
    ));
}

#[rstest]
#[case::xml(XML_CURVE_THEN_UNKNOWN.replace("version=\"1.0\">", "version=\"3.1\">"), Format::Xml)]
#[case::json(JSON_CURVE_THEN_UNKNOWN.replace("\"1.0\"", "\"3.1\""), Format::Json)]
fn test_unknown_version_is_best_effort(#[case] text: String, #[case] format: Format) {
    let decoded = decode(&text, format).unwrap();
    assert_eq!(decoded.model.format_version, "3.1");
    assert_eq!(decoded.model.len(), 1);
}

// ============================================================================
// Defaulting
// ============================================================================

#[test]
fn test_json_defaults_weight_and_flags() {
    let decoded = decode(JSON_CURVE_THEN_UNKNOWN, Format::Json).unwrap();
    let curve = decoded.model.entries[0].geometry.as_curve().unwrap();
    assert!(curve.control_points.iter().all(|cp| cp.weight == 1.0));
    assert!(!curve.closed);
    assert!(!curve.periodic);
    assert!(!curve.is_rational());
}

#[test]
fn test_json_omits_defaults_but_xml_writes_them() {
    let mut model = Model::new();
    model.add(Geometry::Curve(cubic_curve()));

    let json = encode(&model, Format::Json).unwrap();
    assert!(!json.contains("weight"));
    assert!(!json.contains("closed"));
    assert!(!json.contains("periodic"));

    let xml = encode(&model, Format::Xml).unwrap();
    assert_eq!(xml.matches("<Weight>1</Weight>").count(), 6);
    assert!(xml.contains("<Closed>false</Closed>"));
}

// ============================================================================
// Malformed documents
// ============================================================================

#[rstest]
#[case::not_xml("this is not xml", Format::Xml)]
#[case::empty("", Format::Xml)]
#[case::wrong_root(r#"<Model version="1.0"><Objects/></Model>"#, Format::Xml)]
#[case::no_objects(r#"<File3dm version="1.0"/>"#, Format::Xml)]
#[case::unclosed(r#"<File3dm version="1.0"><Objects>"#, Format::Xml)]
#[case::bad_tolerance(
    r#"<File3dm version="1.0"><Settings><Tolerance>tiny</Tolerance></Settings><Objects/></File3dm>"#,
    Format::Xml
)]
#[case::not_json("{\"version\": ", Format::Json)]
#[case::json_array("[]", Format::Json)]
#[case::json_no_objects(r#"{"version": "1.0"}"#, Format::Json)]
#[case::json_objects_not_array(r#"{"version": "1.0", "objects": {}}"#, Format::Json)]
#[case::json_version_number(r#"{"version": 1, "objects": []}"#, Format::Json)]
fn test_malformed_document(#[case] text: &str, #[case] format: Format) {
    let err = decode(text, format).unwrap_err();
    assert!(err.is_malformed(), "expected malformed, got {err}");
}

#[rstest]
#[case::missing_knots(
    r#"{"id":"a","type":"NurbsCurve","degree":1,"points":[{"x":0,"y":0,"z":0},{"x":1,"y":0,"z":0}]}"#
)]
#[case::bad_number(
    r#"{"id":"a","type":"Point","x":"one","y":0,"z":0}"#
)]
#[case::knot_count(
    r#"{"id":"a","type":"NurbsCurve","degree":2,"points":[{"x":0,"y":0,"z":0},{"x":1,"y":0,"z":0},{"x":2,"y":0,"z":0}],"knots":[0,0,1,1]}"#
)]
#[case::no_type(r#"{"id":"a","x":0,"y":0,"z":0}"#)]
fn test_bad_json_entry_is_isolated(#[case] bad: &str) {
    let text = format!(
        r#"{{"version":"1.0","objects":[{bad},{{"id":"ok","type":"Point","x":1,"y":2,"z":3}}]}}"#
    );
    let decoded = decode(&text, Format::Json).unwrap();
    assert_eq!(decoded.model.len(), 1);
    assert_eq!(decoded.model.entries[0].id.as_str(), "ok");
    assert_eq!(decoded.diagnostics.len(), 1);
    assert_eq!(decoded.diagnostics[0].index, 0);
    assert!(decoded.diagnostics[0].error.is_malformed());
}

#[rstest]
#[case::xml(Format::Xml)]
#[case::json(Format::Json)]
fn test_huge_surface_counts_are_entry_errors(#[case] format: Format) {
    let mut surface = bilinear_surface();
    surface.count_u = usize::MAX;
    let mut model = Model::new();
    model.add(Geometry::Surface(surface));
    model.add(Geometry::Point(Point::new(1.0, 2.0, 3.0)));

    let decoded = decode(&encode(&model, format).unwrap(), format).unwrap();
    assert_eq!(decoded.model.len(), 1);
    assert_eq!(decoded.diagnostics.len(), 1);
    assert_eq!(decoded.diagnostics[0].index, 0);
    assert!(decoded.diagnostics[0].error.is_malformed());
}

#[test]
fn test_huge_surface_count_in_xml_text() {
    let text = r#"<File3dm version="1.0"><Objects>
<Object id="s"><NurbsSurface>
<DegreeU>1</DegreeU><DegreeV>1</DegreeV>
<CountU>18446744073709551615</CountU><CountV>2</CountV>
<Points/><KnotsU/><KnotsV/>
</NurbsSurface></Object>
</Objects></File3dm>"#;
    let decoded = decode(text, Format::Xml).unwrap();
    assert!(decoded.model.is_empty());
    assert!(decoded.diagnostics[0].error.is_malformed());
}

#[rstest]
#[case::xml(Format::Xml)]
#[case::json(Format::Json)]
fn test_huge_count_inside_brep_fails_reconstruct(#[case] format: Format) {
    let mut brep = square_brep();
    brep.surfaces[0].count_u = usize::MAX / 2;
    let mut model = Model::new();
    model.add(Geometry::Brep(brep));

    let decoded = decode(&encode(&model, format).unwrap(), format).unwrap();
    let report = reconstruct(&decoded.model, &mut MemoryDocument::new());
    assert!(!report.success());
    assert_eq!(report.failures[0].error.invalid_field(), Some("count_u"));
}

// ============================================================================
// Round trips of fixed fixtures
// ============================================================================

#[rstest]
#[case::cubic(Geometry::Curve(cubic_curve()))]
#[case::rational(Geometry::Curve(rational_arc()))]
#[case::surface(Geometry::Surface(bilinear_surface()))]
#[case::brep(Geometry::Brep(square_brep()))]
fn test_fixture_roundtrip(
    #[case] geometry: Geometry,
    #[values(Format::Xml, Format::Json)] format: Format,
) {
    let mut model = Model::new()
        .with_application("fixtures")
        .with_units(UnitSystem::Meters)
        .with_tolerance(0.0001);
    model.push(GeometryEntry::new(geometry).with_name("fixture"));

    let decoded = decode(&encode(&model, format).unwrap(), format).unwrap();
    assert!(decoded.is_clean());
    assert_eq!(decoded.model, model);
}

#[test]
fn test_padded_text_survives_both_codecs() {
    let mut model = Model::new().with_application("  padded app \t");
    model.push(GeometryEntry::new(Geometry::Curve(cubic_curve())).with_name(" spaced "));

    let from_xml = decode(&encode(&model, Format::Xml).unwrap(), Format::Xml).unwrap();
    let from_json = decode(&encode(&model, Format::Json).unwrap(), Format::Json).unwrap();
    assert_eq!(from_xml.model, model);
    assert_eq!(from_json.model, from_xml.model);
}

#[test]
fn test_codecs_read_their_own_output() {
    let mut model = Model::new();
    model.add(Geometry::Curve(rational_arc()));

    let codecs: [Box<dyn ModelFormat>; 3] =
        [Box::new(Xml::default()), Box::new(Json), Box::new(CurveXml::default())];
    for codec in codecs {
        let bytes = codec.write(&model).unwrap();
        assert!(codec.validate(&bytes).is_ok(), "{}", codec.name());
        assert_eq!(codec.read(&bytes).unwrap(), model, "{}", codec.name());
    }
}
