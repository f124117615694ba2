//! Geometry probing for camera framing
//!
//! OpenSCAD does not report the extent of a model, so the prober exports a
//! throwaway STL and measures the vertices itself.

use std::fs::File;
use std::path::Path;

use glam::Vec3;
use crate::export::Diagnostics;
use crate::runner::{Interpreter, output_args};
use crate::{Error, Result};

/// Axis-aligned bounds and centroid of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    /// Mean of the mesh's vertex positions
    pub centroid: Vec3,
    pub triangle_count: usize,
}

impl Bounds {
    /// Compute bounds from a set of points
    ///
    /// Returns `None` for an empty set or if any coordinate is not finite.
    pub fn from_points(points: &[Vec3], triangle_count: usize) -> Option<Self> {
        let first = *points.first()?;
        let mut min = first;
        let mut max = first;
        let mut sum = Vec3::ZERO;

        for p in points {
            if !p.is_finite() {
                return None;
            }
            min = min.min(*p);
            max = max.max(*p);
            sum += *p;
        }

        Some(Self {
            min,
            max,
            centroid: sum / points.len() as f32,
            triangle_count,
        })
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f32 {
        self.size().length()
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bounds: [{:.2}, {:.2}, {:.2}] to [{:.2}, {:.2}, {:.2}], centroid [{:.2}, {:.2}, {:.2}], {} triangles",
            self.min.x, self.min.y, self.min.z,
            self.max.x, self.max.y, self.max.z,
            self.centroid.x, self.centroid.y, self.centroid.z,
            self.triangle_count
        )
    }
}

/// Read an STL file (ASCII or binary) and measure it
pub fn read_stl_bounds(path: &Path) -> Result<Bounds> {
    let mut file = File::open(path).map_err(|e| {
        Error::Geometry(format!("no mesh was exported ({}): {e}", path.display()))
    })?;

    let mesh = stl_io::read_stl(&mut file)
        .map_err(|e| Error::Geometry(format!("unreadable STL {}: {e}", path.display())))?;

    if mesh.faces.is_empty() {
        return Err(Error::Geometry("exported mesh has no triangles".to_string()));
    }

    let points: Vec<Vec3> = mesh
        .vertices
        .iter()
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();

    let bounds = Bounds::from_points(&points, mesh.faces.len())
        .ok_or_else(|| Error::Geometry("exported mesh has no usable vertices".to_string()))?;

    if bounds.diagonal() <= f32::EPSILON {
        return Err(Error::Geometry(
            "exported mesh is degenerate (zero extent)".to_string(),
        ));
    }

    Ok(bounds)
}

/// Export `script` to a temporary STL and compute its bounds
///
/// A 2D model fails with [`Error::Flat`], since it has no mesh to measure.
pub fn probe(interpreter: &dyn Interpreter, script: &Path) -> Result<Bounds> {
    let scratch = tempfile::Builder::new().prefix("scadkit-probe").tempdir()?;
    let stl = scratch.path().join("probe.stl");

    let output = interpreter.run(&output_args(&stl, &[], script))?;
    if Diagnostics::parse(&output.stderr).not_3d {
        return Err(Error::Flat {
            stderr: output.stderr,
        });
    }
    if !output.success() {
        return Err(Error::Interpreter {
            code: output.code,
            stderr: output.stderr,
        });
    }

    let bounds = read_stl_bounds(&stl)?;
    tracing::debug!(script = %script.display(), %bounds, "probed geometry");
    Ok(bounds)
}
