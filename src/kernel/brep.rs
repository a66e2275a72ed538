//! Host boundary representation.
//!
//! Topology is index based: faces point at surfaces, loops at faces, trims
//! at loops and 2D curves. Nothing holds a reference to anything else.

use super::{KernelError, NurbsCurve, NurbsSurface};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopType {
    #[default]
    Unknown,
    Outer,
    Inner,
    Slit,
    CurveOnSurface,
    PointOnSurface,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrimType {
    #[default]
    Unknown,
    Boundary,
    Mated,
    Seam,
    Singular,
    CurveOnSurface,
    PointOnSurface,
    Slit,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BrepFace {
    pub surface_index: usize,
    pub loop_indices: Vec<usize>,
    pub orientation_reversed: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BrepLoop {
    pub face_index: usize,
    pub loop_type: LoopType,
    pub trim_indices: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BrepTrim {
    pub curve_index: usize,
    pub loop_index: usize,
    pub trim_type: TrimType,
    pub reversed: bool,
}

/// Host B-rep.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Brep {
    pub surfaces: Vec<NurbsSurface>,
    pub curves_2d: Vec<NurbsCurve>,
    pub faces: Vec<BrepFace>,
    pub loops: Vec<BrepLoop>,
    pub trims: Vec<BrepTrim>,
    pub is_solid: bool,
}

impl Brep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check geometry and every topological index.
    pub fn is_valid(&self) -> Result<(), KernelError> {
        for surface in &self.surfaces {
            surface.is_valid()?;
        }
        for curve in &self.curves_2d {
            curve.is_valid()?;
        }
        for (i, face) in self.faces.iter().enumerate() {
            in_range(face.surface_index, self.surfaces.len(), "face", i)?;
            for &li in &face.loop_indices {
                in_range(li, self.loops.len(), "face", i)?;
            }
        }
        for (i, lp) in self.loops.iter().enumerate() {
            in_range(lp.face_index, self.faces.len(), "loop", i)?;
            for &ti in &lp.trim_indices {
                in_range(ti, self.trims.len(), "loop", i)?;
            }
        }
        for (i, trim) in self.trims.iter().enumerate() {
            in_range(trim.curve_index, self.curves_2d.len(), "trim", i)?;
            in_range(trim.loop_index, self.loops.len(), "trim", i)?;
        }
        Ok(())
    }
}

fn in_range(index: usize, count: usize, what: &str, owner: usize) -> Result<(), KernelError> {
    if index < count {
        Ok(())
    } else {
        Err(KernelError::Topology(format!(
            "{what} {owner} references index {index} (count: {count})"
        )))
    }
}
