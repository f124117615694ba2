//! The 14-view matrix
//!
//! The model is probed once and every view reuses those bounds, so all
//! cells share the same target and zoom. A 2D model has no bounds and every
//! cell is framed by OpenSCAD instead. Views render one after another;
//! the first failure aborts the whole matrix and nothing is written to the
//! output path.

use std::path::{Path, PathBuf};

use scadkit_core::{Bounds, Error, Result, ensure_distinct};

use crate::camera::{Camera, ViewAngle};
use crate::grid::{GridLayout, compose};
use crate::preview::{Projection, RenderSettings, Renderer, framing_bounds};

/// Result of a matrix render
#[derive(Debug, Clone)]
pub struct ViewsMatrix {
    pub path: PathBuf,
    /// `None` for a 2D model
    pub bounds: Option<Bounds>,
    pub views: Vec<ViewAngle>,
}

impl std::fmt::Display for ViewsMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.views.iter().map(|v| v.label()).collect();
        write!(f, "Rendered {} views: {}", self.views.len(), labels.join(", "))?;
        match &self.bounds {
            Some(bounds) => write!(f, "\n{bounds}"),
            None => write!(f, "\n2D model; views framed with --viewall"),
        }
    }
}

/// Render every [`ViewAngle`] of `script` and composite them into `output`
///
/// Cells are rendered orthographically at the renderer's image size.
pub fn render_views_matrix(
    renderer: &Renderer<'_>,
    script: &Path,
    output: &Path,
) -> Result<ViewsMatrix> {
    if !script.is_file() {
        return Err(Error::ScriptNotFound(script.to_path_buf()));
    }
    ensure_distinct(script, output)?;

    let bounds = framing_bounds(renderer.interpreter(), script)?;

    let cell_settings = RenderSettings {
        projection: Projection::Orthographic,
        ..renderer.settings().clone()
    };
    let cell_renderer = Renderer::new(renderer.interpreter(), cell_settings);
    let layout = GridLayout::matrix(cell_renderer.settings().size);

    let scratch = tempfile::Builder::new().prefix("scadkit-matrix").tempdir()?;
    let mut cells = Vec::with_capacity(ViewAngle::ALL.len());

    for (index, view) in ViewAngle::ALL.into_iter().enumerate() {
        let cell_path = scratch.path().join(format!("{index:02}.png"));
        let camera = match &bounds {
            Some(bounds) => Camera::framing(bounds, view.rotation()),
            None => Camera::fit_model(view.rotation()),
        };

        cell_renderer
            .render_view(script, &cell_path, &camera)
            .map_err(|e| match e {
                Error::Render { stderr } => Error::Render {
                    stderr: format!("view {} failed:\n{}", view.label(), stderr),
                },
                other => other,
            })?;

        let image = image::open(&cell_path)?.to_rgba8();
        tracing::debug!(view = view.label(), "rendered matrix cell");
        cells.push((view.label(), image));
    }

    let composite = compose(&cells, &layout);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    composite.save(output)?;

    tracing::info!(
        script = %script.display(),
        output = %output.display(),
        "rendered views matrix"
    );

    Ok(ViewsMatrix {
        path: output.to_path_buf(),
        bounds,
        views: ViewAngle::ALL.to_vec(),
    })
}
