//! File-level flows against temporary directories.

use nnurbs::document::{HostDocument, HostGeometry, MemoryDocument};
use nnurbs::interchange::{Format, InterchangeError, UnitSystem};
use nnurbs::kernel::{self, Mesh, NurbsCurve, Point3d};
use nnurbs::plugin::{
    ExportOptions, FileType, SelectionMode, WriteFileResult, export_selection, import_file,
    inspect, read_file, write_file,
};
use rstest::rstest;

use crate::helpers::geometry_fixtures::host_cubic;
use crate::helpers::pickers::ScriptedPicker;

fn mixed_document() -> MemoryDocument {
    let mut doc = MemoryDocument::new();
    doc.insert_named(HostGeometry::Point(Point3d::new(1.0, 2.0, 3.0)), Some("datum"));
    doc.insert(HostGeometry::Curve(host_cubic().into()));
    doc.insert(HostGeometry::Mesh(Mesh::default()));
    doc
}

fn rational_quarter_circle() -> NurbsCurve {
    let mut curve = NurbsCurve::create(true, 3, 3).unwrap();
    curve.set_point(0, Point3d::new(1.0, 0.0, 0.0), 1.0).unwrap();
    curve
        .set_point(1, Point3d::new(1.0, 1.0, 0.0), std::f64::consts::FRAC_1_SQRT_2)
        .unwrap();
    curve.set_point(2, Point3d::new(0.0, 1.0, 0.0), 1.0).unwrap();
    for (i, k) in [0.0, 0.0, 1.0, 1.0].into_iter().enumerate() {
        curve.set_knot(i, k).unwrap();
    }
    curve
}

// ============================================================================
// File export / import
// ============================================================================

#[test]
fn test_model_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.nnxml");
    let source = mixed_document();

    let result = write_file(&path, FileType::Model.index(), &source, &ExportOptions::default());
    assert!(result.is_success());

    let mut target = MemoryDocument::new();
    let report = import_file(&path, FileType::Model.index(), &mut target).unwrap();
    assert_eq!(report.added.len(), 2);
    assert!(report.failures.is_empty());

    let geometries: Vec<_> = target.objects().map(|o| o.geometry.clone()).collect();
    assert_eq!(
        geometries,
        vec![
            HostGeometry::Point(Point3d::new(1.0, 2.0, 3.0)),
            HostGeometry::Curve(host_cubic().into()),
        ]
    );
    assert_eq!(target.objects().next().unwrap().name.as_deref(), Some("datum"));
}

#[test]
fn test_curve_file_keeps_weights() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arc.nncrv");
    let mut source = MemoryDocument::new();
    source.insert(HostGeometry::Point(Point3d::ORIGIN));
    source.insert(HostGeometry::Curve(rational_quarter_circle().into()));

    assert!(write_file(&path, FileType::Curve.index(), &source, &ExportOptions::default()).is_success());
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("<FileCurve"));
    assert_eq!(text.matches("<NurbsCurve>").count(), 1);

    let mut target = MemoryDocument::new();
    assert!(read_file(&path, FileType::Curve.index(), &mut target));
    let rebuilt = target.objects().next().unwrap();
    let HostGeometry::Curve(kernel::Curve::Nurbs(curve)) = &rebuilt.geometry else {
        panic!("expected a NURBS curve, got {}", rebuilt.geometry.kind_name());
    };
    assert!(curve.is_rational());
    assert_eq!(curve, &rational_quarter_circle());
}

#[test]
fn test_curve_file_without_curves_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nothing.nncrv");
    let mut source = MemoryDocument::new();
    source.insert(HostGeometry::Point(Point3d::ORIGIN));

    let result = write_file(&path, FileType::Curve.index(), &source, &ExportOptions::default());
    assert!(matches!(result, WriteFileResult::Failure(_)));
    assert!(!path.exists());
}

#[test]
fn test_write_into_missing_directory_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("scene.nnxml");

    let result = write_file(&path, 0, &mixed_document(), &ExportOptions::default());
    assert!(matches!(result, WriteFileResult::Failure(_)));
    assert!(!path.exists());
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[rstest]
#[case::model(0)]
#[case::curve(1)]
fn test_read_missing_file_is_false(#[case] index: usize) {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = MemoryDocument::new();
    assert!(!read_file(&dir.path().join("absent"), index, &mut doc));
    assert!(doc.is_empty());
}

#[test]
fn test_unknown_file_type_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.nnxml");
    assert!(matches!(
        write_file(&path, 7, &mixed_document(), &ExportOptions::default()),
        WriteFileResult::Failure(_)
    ));
    assert!(matches!(
        import_file(&path, 7, &mut MemoryDocument::new()),
        Err(InterchangeError::Unsupported(_))
    ));
}

#[test]
fn test_import_reports_dropped_entries_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.nnxml");
    std::fs::write(
        &path,
        r#"<?xml version="1.0" encoding="utf-8"?>
<File3dm version="1.0">
  <Objects>
    <Object id="p"><Point><X>1</X><Y>1</Y><Z>1</Z></Point></Object>
    <Object id="m"><Mesh/></Object>
    <Object id="bad">
      <NurbsCurve>
        <Degree>1</Degree>
        <Closed>false</Closed>
        <Periodic>false</Periodic>
        <Points>
          <ControlPoint><X>0</X><Y>0</Y><Z>0</Z><Weight>0</Weight></ControlPoint>
          <ControlPoint><X>1</X><Y>0</Y><Z>0</Z><Weight>1</Weight></ControlPoint>
        </Points>
        <Knots><Knot>0</Knot><Knot>0</Knot><Knot>1</Knot><Knot>1</Knot></Knots>
      </NurbsCurve>
    </Object>
  </Objects>
</File3dm>
"#,
    )
    .unwrap();

    let mut doc = MemoryDocument::new();
    let report = import_file(&path, 0, &mut doc).unwrap();
    assert!(report.success());
    assert_eq!(report.added.len(), 1);
    assert_eq!(report.failures.len(), 2);
    assert!(matches!(report.failures[0].error, InterchangeError::UnknownEntry { .. }));
    assert_eq!(report.failures[1].error.invalid_field(), Some("weight"));
}

#[test]
fn test_settings_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.nnxml");
    let options = ExportOptions::default()
        .with_application(Some("modeller 7".into()))
        .with_units(UnitSystem::Millimeters)
        .with_tolerance(0.001);

    assert!(write_file(&path, 0, &mixed_document(), &options).is_success());
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("<Application>modeller 7</Application>"));
    assert!(text.contains("<Units>millimeters</Units>"));
    assert!(text.contains("<Tolerance>0.001</Tolerance>"));
}

// ============================================================================
// Interactive flows
// ============================================================================

#[test]
fn test_export_selection_cancel_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picked.nnxml");
    let mut picker = ScriptedPicker::cancelling();
    let options = ExportOptions::default().with_selection(SelectionMode::Interactive);

    let result = export_selection(&path, &mixed_document(), &mut picker, &options);
    assert_eq!(result, WriteFileResult::Cancel);
    assert!(!path.exists());
    assert_eq!(picker.seen.len(), 1);
}

#[test]
fn test_export_selection_writes_only_picked_objects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picked.nnxml");
    let doc = mixed_document();
    let curve_id = doc.object_ids()[1];
    let mut picker = ScriptedPicker::picking(vec![curve_id], Format::Xml);
    let options = ExportOptions::default().with_selection(SelectionMode::Interactive);

    assert!(export_selection(&path, &doc, &mut picker, &options).is_success());

    let mut target = MemoryDocument::new();
    let report = import_file(&path, 0, &mut target).unwrap();
    assert_eq!(report.added.len(), 1);
    assert_eq!(
        target.objects().next().unwrap().geometry,
        HostGeometry::Curve(host_cubic().into())
    );
}

#[test]
fn test_export_selection_without_picker_takes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("all.nnxml");
    let mut picker = ScriptedPicker::cancelling();

    let result = export_selection(&path, &mixed_document(), &mut picker, &ExportOptions::default());
    assert!(result.is_success());
    assert!(picker.seen.is_empty());
}

#[test]
fn test_export_selection_empty_pick_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picked.nnxml");
    let mut picker = ScriptedPicker::picking(vec![], Format::Xml);
    let options = ExportOptions::default().with_selection(SelectionMode::Interactive);

    let result = export_selection(&path, &mixed_document(), &mut picker, &options);
    assert!(matches!(result, WriteFileResult::Failure(_)));
    assert!(!path.exists());
}

#[rstest]
#[case::xml(Format::Xml, "<File3dm")]
#[case::json(Format::Json, "\"objects\"")]
fn test_inspect_follows_picker_format(#[case] format: Format, #[case] marker: &str) {
    let doc = mixed_document();
    let mut picker = ScriptedPicker::picking(doc.object_ids(), format);

    let text = inspect(&doc, &mut picker, &ExportOptions::default()).unwrap();
    assert!(text.contains(marker));
    assert!(text.contains("datum"));
    assert_eq!(picker.seen[0].format, Format::Xml);
}

#[test]
fn test_inspect_cancelled() {
    let mut picker = ScriptedPicker::cancelling();
    assert!(matches!(
        inspect(&mixed_document(), &mut picker, &ExportOptions::default()),
        Err(InterchangeError::SelectionCancelled)
    ));
}
