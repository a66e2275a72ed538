//! Host document interface.
//!
//! The interchange core only needs two things from the host: a read-only
//! view of the objects it holds (for capture) and a way to add new objects
//! (for reconstruction). [`HostDocument`] is that seam. [`MemoryDocument`]
//! is an in-memory implementation used by tests and by callers that do not
//! have a real host.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

use crate::kernel::{Brep, Curve, KernelError, Mesh, NurbsSurface, Point3d, TextDot};

/// Identity of an object inside one host document.
///
/// Not portable between documents; never written to interchange files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geometry as the host stores it.
#[derive(Clone, Debug, PartialEq)]
pub enum HostGeometry {
    Point(Point3d),
    Curve(Curve),
    Surface(NurbsSurface),
    Brep(Brep),
    Mesh(Mesh),
    TextDot(TextDot),
}

impl HostGeometry {
    /// Short kind name for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            HostGeometry::Point(_) => "point",
            HostGeometry::Curve(_) => "curve",
            HostGeometry::Surface(_) => "surface",
            HostGeometry::Brep(_) => "brep",
            HostGeometry::Mesh(_) => "mesh",
            HostGeometry::TextDot(_) => "text dot",
        }
    }

    fn check(&self) -> Result<(), KernelError> {
        match self {
            HostGeometry::Curve(Curve::Nurbs(curve)) => curve.is_valid(),
            HostGeometry::Surface(surface) => surface.is_valid(),
            HostGeometry::Brep(brep) => brep.is_valid(),
            _ => Ok(()),
        }
    }
}

/// One object in a host document.
#[derive(Clone, Debug, PartialEq)]
pub struct HostObject {
    pub id: ObjectId,
    pub name: Option<String>,
    pub geometry: HostGeometry,
}

/// Errors reported by a host when adding objects.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("document is read-only")]
    ReadOnly,

    #[error("host rejected geometry: {0}")]
    Rejected(#[from] KernelError),
}

/// The operations the interchange core needs from a host document.
pub trait HostDocument {
    /// Ids of every object, in document order.
    fn object_ids(&self) -> Vec<ObjectId>;

    fn find(&self, id: &ObjectId) -> Option<&HostObject>;

    /// Add geometry to the document and return its new id.
    fn add(&mut self, geometry: HostGeometry, name: Option<&str>) -> Result<ObjectId, HostError>;
}

// ============================================================================
// IN-MEMORY DOCUMENT
// ============================================================================

/// A host document held entirely in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryDocument {
    objects: IndexMap<ObjectId, HostObject>,
    read_only: bool,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document that refuses every insertion.
    pub fn read_only() -> Self {
        Self {
            objects: IndexMap::new(),
            read_only: true,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> impl Iterator<Item = &HostObject> {
        self.objects.values()
    }

    /// Add an object without going through host validation. Useful for
    /// seeding documents with fixtures.
    pub fn insert(&mut self, geometry: HostGeometry) -> ObjectId {
        self.insert_named(geometry, None)
    }

    pub fn insert_named(&mut self, geometry: HostGeometry, name: Option<&str>) -> ObjectId {
        let id = ObjectId::new();
        self.objects.insert(
            id,
            HostObject {
                id,
                name: name.map(str::to_string),
                geometry,
            },
        );
        id
    }
}

impl HostDocument for MemoryDocument {
    fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    fn find(&self, id: &ObjectId) -> Option<&HostObject> {
        self.objects.get(id)
    }

    fn add(&mut self, geometry: HostGeometry, name: Option<&str>) -> Result<ObjectId, HostError> {
        if self.read_only {
            return Err(HostError::ReadOnly);
        }
        geometry.check()?;
        Ok(self.insert_named(geometry, name))
    }
}
