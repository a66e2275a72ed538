//! XML interchange format (`.nnxml`).
//!
//! Every declared field is written as a child element named after it, with
//! default values spelled out. Floats use the shortest representation that
//! parses back to the same `f64`.
//!
//! ```text
//! <File3dm version="1.0">
//!   <Settings>                      (only when a setting is present)
//!     <Application>..</Application>
//!     <Units>millimeters</Units>
//!     <Tolerance>0.001</Tolerance>
//!   </Settings>
//!   <Objects>
//!     <Object id=".." name="..">
//!       <NurbsCurve> | <NurbsSurface> | <Point> | <Brep>
//!     </Object>
//!   </Objects>
//! </File3dm>
//! ```
//!
//! Reading goes through a small element tree rather than a streaming state
//! machine: the documents are modest and the tree keeps entry-level error
//! isolation simple.

use tracing::{debug, warn};

use super::error::{EntryFailure, InterchangeError};
use super::format::{Decoded, FormatCapability, ModelFormat};
use super::model::{Model, version_is_supported};

/// Root element of a full model document.
pub(crate) const MODEL_ROOT: &str = "File3dm";

/// XML writer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlOptions {
    /// Spaces per nesting level; 0 writes everything on one line.
    pub indent: usize,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl XmlOptions {
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

/// XML format handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xml {
    options: XmlOptions,
}

impl Xml {
    pub fn with_options(options: XmlOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &XmlOptions {
        &self.options
    }
}

impl ModelFormat for Xml {
    fn name(&self) -> &'static str {
        "XML"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["nnxml", "xml"]
    }

    fn mime_type(&self) -> &'static str {
        "application/xml"
    }

    fn capabilities(&self) -> FormatCapability {
        FormatCapability::FULL
    }

    fn decode(&self, input: &[u8]) -> Result<Decoded, InterchangeError> {
        let root = tree::parse(input)?;
        reader::read_model(&root)
    }

    fn write(&self, model: &Model) -> Result<Vec<u8>, InterchangeError> {
        let mut sink = writer::XmlSink::new(&self.options)?;
        writer::write_model(&mut sink, model)?;
        Ok(sink.finish())
    }

    fn validate(&self, input: &[u8]) -> Result<(), InterchangeError> {
        let content = std::str::from_utf8(input)
            .map_err(|e| InterchangeError::xml(format!("Invalid UTF-8: {e}")))?;
        if !content.contains(MODEL_ROOT) {
            return Err(InterchangeError::xml(format!(
                "Missing <{MODEL_ROOT}> root element"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// ELEMENT TREE
// ============================================================================

pub(crate) mod tree {
    use std::str::FromStr;

    use quick_xml::Reader;
    use quick_xml::events::{BytesStart, Event};

    use super::InterchangeError;

    /// One parsed XML element.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub(crate) struct XmlNode {
        pub name: String,
        pub attributes: Vec<(String, String)>,
        pub text: String,
        pub children: Vec<XmlNode>,
    }

    impl XmlNode {
        pub fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }

        pub fn child(&self, name: &str) -> Option<&XmlNode> {
            self.children.iter().find(|c| c.name == name)
        }

        pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
            self.children.iter().filter(move |c| c.name == name)
        }

        pub fn required(&self, name: &str) -> Result<&XmlNode, InterchangeError> {
            self.child(name).ok_or_else(|| {
                InterchangeError::xml(format!("<{}> is missing <{name}>", self.name))
            })
        }

        /// Parse this element's text.
        pub fn value<T>(&self) -> Result<T, InterchangeError>
        where
            T: FromStr,
            T::Err: std::fmt::Display,
        {
            self.text.trim().parse().map_err(|e| {
                InterchangeError::xml(format!("<{}>: invalid value `{}`: {e}", self.name, self.text))
            })
        }

        /// Parse a required child's text.
        pub fn parse_child<T>(&self, name: &str) -> Result<T, InterchangeError>
        where
            T: FromStr,
            T::Err: std::fmt::Display,
        {
            self.required(name)?.value()
        }

        /// Parse an optional boolean child; absent means `false`.
        pub fn flag(&self, name: &str) -> Result<bool, InterchangeError> {
            match self.child(name) {
                None => Ok(false),
                Some(node) => match node.text.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Ok(true),
                    "false" | "0" | "" => Ok(false),
                    other => Err(InterchangeError::xml(format!(
                        "<{name}>: expected true or false, found `{other}`"
                    ))),
                },
            }
        }
    }

    /// Parse a whole document into its root element.
    pub(crate) fn parse(input: &[u8]) -> Result<XmlNode, InterchangeError> {
        // Text is kept verbatim; numeric and flag readers trim their own.
        let mut reader = Reader::from_reader(input);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    if root.is_some() {
                        return Err(InterchangeError::xml("content after the root element"));
                    }
                    stack.push(open_node(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let node = open_node(e)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Ok(Event::End(_)) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| InterchangeError::xml("unbalanced end tag"))?;
                    attach(&mut stack, &mut root, node)?;
                }
                Ok(Event::Text(ref t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| InterchangeError::xml(format!("bad text: {e}")))?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(ref t)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(t.as_ref()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(InterchangeError::xml(format!(
                        "XML parse error at position {}: {e}",
                        reader.error_position()
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(InterchangeError::xml("unexpected end of document"));
        }
        root.ok_or_else(|| InterchangeError::xml("document has no root element"))
    }

    fn open_node(e: &BytesStart<'_>) -> Result<XmlNode, InterchangeError> {
        let mut node = XmlNode {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            ..Default::default()
        };
        for attr in e.attributes() {
            let attr = attr.map_err(|e| InterchangeError::xml(format!("bad attribute: {e}")))?;
            let value = attr
                .unescape_value()
                .map_err(|e| InterchangeError::xml(format!("bad attribute value: {e}")))?;
            node.attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(node)
    }

    fn attach(
        stack: &mut [XmlNode],
        root: &mut Option<XmlNode>,
        node: XmlNode,
    ) -> Result<(), InterchangeError> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None if root.is_none() => *root = Some(node),
            None => return Err(InterchangeError::xml("content after the root element")),
        }
        Ok(())
    }

}

// ============================================================================
// WRITER
// ============================================================================

pub(crate) mod writer {
    use std::io::Cursor;

    use quick_xml::Writer;
    use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

    use super::super::model::{
        Brep, ControlPoint, Curve, Geometry, GeometryEntry, Model, Point, Surface,
    };
    use super::{InterchangeError, MODEL_ROOT, XmlOptions};

    /// Event writer over an in-memory buffer.
    pub(crate) struct XmlSink {
        writer: Writer<Cursor<Vec<u8>>>,
    }

    fn write_error(e: impl std::fmt::Display) -> InterchangeError {
        InterchangeError::xml(format!("Write error: {e}"))
    }

    impl XmlSink {
        /// Start a document with its XML declaration.
        pub fn new(options: &XmlOptions) -> Result<Self, InterchangeError> {
            let buffer = Cursor::new(Vec::new());
            let writer = if options.indent == 0 {
                Writer::new(buffer)
            } else {
                Writer::new_with_indent(buffer, b' ', options.indent)
            };
            let mut sink = Self { writer };
            sink.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
                .map_err(write_error)?;
            Ok(sink)
        }

        pub fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), InterchangeError> {
            let mut start = BytesStart::new(name);
            for &attr in attributes {
                start.push_attribute(attr);
            }
            self.writer
                .write_event(Event::Start(start))
                .map_err(write_error)
        }

        pub fn close(&mut self, name: &str) -> Result<(), InterchangeError> {
            self.writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(write_error)
        }

        /// Write `<name>text</name>`.
        pub fn leaf(&mut self, name: &str, text: &str) -> Result<(), InterchangeError> {
            self.open(name, &[])?;
            self.writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
            self.close(name)
        }

        pub fn number(&mut self, name: &str, value: f64) -> Result<(), InterchangeError> {
            self.leaf(name, &value.to_string())
        }

        pub fn count(&mut self, name: &str, value: usize) -> Result<(), InterchangeError> {
            self.leaf(name, &value.to_string())
        }

        pub fn flag(&mut self, name: &str, value: bool) -> Result<(), InterchangeError> {
            self.leaf(name, if value { "true" } else { "false" })
        }

        /// Finish the document with a trailing newline.
        pub fn finish(self) -> Vec<u8> {
            let mut output = self.writer.into_inner().into_inner();
            output.push(b'\n');
            output
        }
    }

    pub(crate) fn write_model(sink: &mut XmlSink, model: &Model) -> Result<(), InterchangeError> {
        sink.open(MODEL_ROOT, &[("version", model.format_version.as_str())])?;

        if model.application.is_some() || model.units.is_some() || model.tolerance.is_some() {
            sink.open("Settings", &[])?;
            if let Some(application) = &model.application {
                sink.leaf("Application", application)?;
            }
            if let Some(units) = model.units {
                sink.leaf("Units", units.as_str())?;
            }
            if let Some(tolerance) = model.tolerance {
                sink.number("Tolerance", tolerance)?;
            }
            sink.close("Settings")?;
        }

        sink.open("Objects", &[])?;
        for entry in &model.entries {
            write_entry(sink, entry)?;
        }
        sink.close("Objects")?;

        sink.close(MODEL_ROOT)
    }

    fn write_entry(sink: &mut XmlSink, entry: &GeometryEntry) -> Result<(), InterchangeError> {
        let mut attributes = vec![("id", entry.id.as_str())];
        if let Some(name) = &entry.name {
            attributes.push(("name", name.as_str()));
        }
        sink.open("Object", &attributes)?;
        write_geometry(sink, &entry.geometry)?;
        sink.close("Object")
    }

    pub(crate) fn write_geometry(sink: &mut XmlSink, geometry: &Geometry) -> Result<(), InterchangeError> {
        match geometry {
            Geometry::Point(point) => write_point(sink, point),
            Geometry::Curve(curve) => write_curve(sink, curve),
            Geometry::Surface(surface) => write_surface(sink, surface),
            Geometry::Brep(brep) => write_brep(sink, brep),
        }
    }

    fn write_point(sink: &mut XmlSink, point: &Point) -> Result<(), InterchangeError> {
        sink.open("Point", &[])?;
        sink.number("X", point.x)?;
        sink.number("Y", point.y)?;
        sink.number("Z", point.z)?;
        sink.close("Point")
    }

    fn write_control_points(sink: &mut XmlSink, points: &[ControlPoint]) -> Result<(), InterchangeError> {
        sink.open("Points", &[])?;
        for cp in points {
            sink.open("ControlPoint", &[])?;
            sink.number("X", cp.x)?;
            sink.number("Y", cp.y)?;
            sink.number("Z", cp.z)?;
            sink.number("Weight", cp.weight)?;
            sink.close("ControlPoint")?;
        }
        sink.close("Points")
    }

    fn write_knots(sink: &mut XmlSink, tag: &str, knots: &[f64]) -> Result<(), InterchangeError> {
        sink.open(tag, &[])?;
        for &knot in knots {
            sink.number("Knot", knot)?;
        }
        sink.close(tag)
    }

    fn write_indices(sink: &mut XmlSink, tag: &str, indices: &[usize]) -> Result<(), InterchangeError> {
        sink.open(tag, &[])?;
        for &index in indices {
            sink.count("Index", index)?;
        }
        sink.close(tag)
    }

    pub(crate) fn write_curve(sink: &mut XmlSink, curve: &Curve) -> Result<(), InterchangeError> {
        sink.open("NurbsCurve", &[])?;
        sink.leaf("Degree", &curve.degree.to_string())?;
        sink.flag("Closed", curve.closed)?;
        sink.flag("Periodic", curve.periodic)?;
        write_control_points(sink, &curve.control_points)?;
        write_knots(sink, "Knots", &curve.knots)?;
        sink.close("NurbsCurve")
    }

    fn write_surface(sink: &mut XmlSink, surface: &Surface) -> Result<(), InterchangeError> {
        sink.open("NurbsSurface", &[])?;
        sink.leaf("DegreeU", &surface.degree_u.to_string())?;
        sink.leaf("DegreeV", &surface.degree_v.to_string())?;
        sink.count("CountU", surface.count_u)?;
        sink.count("CountV", surface.count_v)?;
        sink.flag("ClosedU", surface.closed_u)?;
        sink.flag("ClosedV", surface.closed_v)?;
        write_control_points(sink, &surface.control_points)?;
        write_knots(sink, "KnotsU", &surface.knots_u)?;
        write_knots(sink, "KnotsV", &surface.knots_v)?;
        sink.close("NurbsSurface")
    }

    fn write_brep(sink: &mut XmlSink, brep: &Brep) -> Result<(), InterchangeError> {
        sink.open("Brep", &[])?;
        sink.flag("Solid", brep.solid)?;

        sink.open("Surfaces", &[])?;
        for surface in &brep.surfaces {
            write_surface(sink, surface)?;
        }
        sink.close("Surfaces")?;

        sink.open("Curves2D", &[])?;
        for curve in &brep.curves_2d {
            write_curve(sink, curve)?;
        }
        sink.close("Curves2D")?;

        sink.open("Faces", &[])?;
        for face in &brep.faces {
            sink.open("Face", &[])?;
            sink.count("Surface", face.surface)?;
            sink.flag("Reversed", face.reversed)?;
            write_indices(sink, "Loops", &face.loops)?;
            sink.close("Face")?;
        }
        sink.close("Faces")?;

        sink.open("Loops", &[])?;
        for lp in &brep.loops {
            sink.open("Loop", &[])?;
            sink.count("Face", lp.face)?;
            sink.leaf("Kind", lp.kind.as_str())?;
            write_indices(sink, "Trims", &lp.trims)?;
            sink.close("Loop")?;
        }
        sink.close("Loops")?;

        sink.open("Trims", &[])?;
        for trim in &brep.trims {
            sink.open("Trim", &[])?;
            sink.count("Curve", trim.curve)?;
            sink.count("Loop", trim.loop_index)?;
            sink.leaf("Kind", trim.kind.as_str())?;
            sink.flag("Reversed", trim.reversed)?;
            sink.close("Trim")?;
        }
        sink.close("Trims")?;

        sink.close("Brep")
    }
}

// ============================================================================
// READER
// ============================================================================

pub(crate) mod reader {
    use super::super::model::{
        Brep, BrepFace, BrepLoop, BrepTrim, ControlPoint, Curve, EntryId, Geometry,
        GeometryEntry, LoopKind, MODEL_FORMAT_VERSION, Point, Surface, TrimKind, UnitSystem,
        tags,
    };
    use super::tree::XmlNode;
    use super::*;

    pub(crate) fn read_model(root: &XmlNode) -> Result<Decoded, InterchangeError> {
        if root.name != MODEL_ROOT {
            return Err(InterchangeError::xml(format!(
                "expected <{MODEL_ROOT}> root element, found <{}>",
                root.name
            )));
        }

        let mut model = Model::new();
        model.format_version = read_version(root);

        if let Some(settings) = root.child("Settings") {
            model.application = settings.child("Application").map(|n| n.text.clone());
            model.units = match settings.child("Units") {
                Some(node) => {
                    let units = UnitSystem::parse(node.text.trim());
                    if units.is_none() {
                        warn!(units = %node.text, "Ignoring unknown unit system");
                    }
                    units
                }
                None => None,
            };
            model.tolerance = settings
                .child("Tolerance")
                .map(|node| node.value::<f64>())
                .transpose()?;
        }

        let objects = root.required("Objects")?;
        let mut decoded = Decoded::new(model);
        for (index, node) in objects.children.iter().enumerate() {
            match read_entry(node) {
                Ok(entry) => decoded.model.entries.push(entry),
                Err(error) => {
                    warn!(index, %error, "Dropping XML entry");
                    decoded.diagnostics.push(EntryFailure {
                        index,
                        id: node.attribute("id").map(EntryId::from),
                        error,
                    });
                }
            }
        }

        debug!(
            entries = decoded.model.len(),
            dropped = decoded.diagnostics.len(),
            "Decoded XML model"
        );
        Ok(decoded)
    }

    /// Read and check the `version` attribute of a root element.
    pub(crate) fn read_version(root: &XmlNode) -> String {
        match root.attribute("version") {
            Some(version) => {
                if !version_is_supported(version) {
                    warn!(
                        version,
                        supported = MODEL_FORMAT_VERSION,
                        "Unknown format version, reading recognized entries only"
                    );
                }
                version.to_string()
            }
            None => {
                debug!("No format version, assuming {MODEL_FORMAT_VERSION}");
                MODEL_FORMAT_VERSION.to_string()
            }
        }
    }

    fn read_entry(node: &XmlNode) -> Result<GeometryEntry, InterchangeError> {
        if node.name != "Object" {
            return Err(InterchangeError::UnknownEntry {
                tag: node.name.clone(),
            });
        }
        let payload = match node.children.as_slice() {
            [payload] => payload,
            [] => return Err(InterchangeError::xml("<Object> has no geometry")),
            _ => return Err(InterchangeError::xml("<Object> holds more than one geometry")),
        };
        let geometry = read_geometry(payload)?;
        if let Some(problem) = geometry.knot_count_mismatch() {
            return Err(InterchangeError::xml(problem));
        }
        Ok(GeometryEntry {
            id: node
                .attribute("id")
                .map(EntryId::from)
                .unwrap_or_else(EntryId::generate),
            name: node.attribute("name").map(str::to_string),
            geometry,
        })
    }

    pub(crate) fn read_geometry(node: &XmlNode) -> Result<Geometry, InterchangeError> {
        match node.name.as_str() {
            tags::POINT => read_point(node).map(Geometry::Point),
            tags::CURVE => read_curve(node).map(Geometry::Curve),
            tags::SURFACE => read_surface(node).map(Geometry::Surface),
            tags::BREP => read_brep(node).map(Geometry::Brep),
            other => Err(InterchangeError::UnknownEntry {
                tag: other.to_string(),
            }),
        }
    }

    fn read_point(node: &XmlNode) -> Result<Point, InterchangeError> {
        Ok(Point::new(
            node.parse_child("X")?,
            node.parse_child("Y")?,
            node.parse_child("Z")?,
        ))
    }

    fn read_control_points(node: &XmlNode) -> Result<Vec<ControlPoint>, InterchangeError> {
        node.required("Points")?
            .children_named("ControlPoint")
            .map(|cp| {
                let weight = match cp.child("Weight") {
                    Some(w) => w.value()?,
                    None => 1.0,
                };
                Ok(ControlPoint::weighted(
                    cp.parse_child("X")?,
                    cp.parse_child("Y")?,
                    cp.parse_child("Z")?,
                    weight,
                ))
            })
            .collect()
    }

    fn read_knots(node: &XmlNode, tag: &str) -> Result<Vec<f64>, InterchangeError> {
        node.required(tag)?
            .children_named("Knot")
            .map(XmlNode::value)
            .collect()
    }

    fn read_indices(node: &XmlNode, tag: &str) -> Result<Vec<usize>, InterchangeError> {
        match node.child(tag) {
            Some(list) => list.children_named("Index").map(XmlNode::value).collect(),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn read_curve(node: &XmlNode) -> Result<Curve, InterchangeError> {
        Ok(Curve {
            degree: node.parse_child("Degree")?,
            control_points: read_control_points(node)?,
            knots: read_knots(node, "Knots")?,
            closed: node.flag("Closed")?,
            periodic: node.flag("Periodic")?,
        })
    }

    fn read_surface(node: &XmlNode) -> Result<Surface, InterchangeError> {
        Ok(Surface {
            degree_u: node.parse_child("DegreeU")?,
            degree_v: node.parse_child("DegreeV")?,
            count_u: node.parse_child("CountU")?,
            count_v: node.parse_child("CountV")?,
            control_points: read_control_points(node)?,
            knots_u: read_knots(node, "KnotsU")?,
            knots_v: read_knots(node, "KnotsV")?,
            closed_u: node.flag("ClosedU")?,
            closed_v: node.flag("ClosedV")?,
        })
    }

    fn read_kind<K>(node: &XmlNode, parse: fn(&str) -> Option<K>) -> Result<K, InterchangeError>
    where
        K: Default,
    {
        match node.child("Kind") {
            None => Ok(K::default()),
            Some(kind) => parse(kind.text.trim()).ok_or_else(|| {
                InterchangeError::xml(format!("<{}>: unknown kind `{}`", node.name, kind.text))
            }),
        }
    }

    fn read_brep(node: &XmlNode) -> Result<Brep, InterchangeError> {
        let list = |tag: &str| node.child(tag).map(|n| n.children.as_slice()).unwrap_or(&[]);

        let surfaces = list("Surfaces")
            .iter()
            .map(read_surface)
            .collect::<Result<Vec<_>, _>>()?;
        let curves_2d = list("Curves2D")
            .iter()
            .map(read_curve)
            .collect::<Result<Vec<_>, _>>()?;
        let faces = list("Faces")
            .iter()
            .map(|face| {
                Ok(BrepFace {
                    surface: face.parse_child("Surface")?,
                    loops: read_indices(face, "Loops")?,
                    reversed: face.flag("Reversed")?,
                })
            })
            .collect::<Result<Vec<_>, InterchangeError>>()?;
        let loops = list("Loops")
            .iter()
            .map(|lp| {
                Ok(BrepLoop {
                    face: lp.parse_child("Face")?,
                    kind: read_kind(lp, LoopKind::parse)?,
                    trims: read_indices(lp, "Trims")?,
                })
            })
            .collect::<Result<Vec<_>, InterchangeError>>()?;
        let trims = list("Trims")
            .iter()
            .map(|trim| {
                Ok(BrepTrim {
                    curve: trim.parse_child("Curve")?,
                    loop_index: trim.parse_child("Loop")?,
                    kind: read_kind(trim, TrimKind::parse)?,
                    reversed: trim.flag("Reversed")?,
                })
            })
            .collect::<Result<Vec<_>, InterchangeError>>()?;

        Ok(Brep {
            surfaces,
            curves_2d,
            faces,
            loops,
            trims,
            solid: node.flag("Solid")?,
        })
    }
}
