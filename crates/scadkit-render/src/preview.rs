//! Single-view previews rasterized by OpenSCAD

use std::path::{Path, PathBuf};

use scadkit_core::runner::output_args;
use scadkit_core::{Bounds, Error, ImageSize, Interpreter, Result, ensure_distinct, probe};

use crate::camera::{Camera, CameraOverrides};

/// OpenSCAD projection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

impl Projection {
    pub fn to_arg(self) -> &'static str {
        match self {
            Self::Perspective => "--projection=p",
            Self::Orthographic => "--projection=o",
        }
    }
}

/// Image options shared by every render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub size: ImageSize,
    pub colorscheme: String,
    pub projection: Projection,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            size: ImageSize::default(),
            colorscheme: scadkit_core::config::DEFAULT_COLORSCHEME.to_string(),
            projection: Projection::Perspective,
        }
    }
}

/// Result of a single preview
#[derive(Debug, Clone)]
pub struct Preview {
    pub path: PathBuf,
    pub camera: Camera,
    /// Probed bounds, when the camera had to be derived from a 3D model
    pub bounds: Option<Bounds>,
}

/// Bounds of `script` for framing; `None` when the model is 2D
///
/// A 2D model exports no STL, so the camera falls back to OpenSCAD's own
/// `--viewall --autocenter` framing.
pub fn framing_bounds(interpreter: &dyn Interpreter, script: &Path) -> Result<Option<Bounds>> {
    match probe(interpreter, script) {
        Ok(bounds) => Ok(Some(bounds)),
        Err(Error::Flat { .. }) => {
            tracing::info!(script = %script.display(), "2D model; framing with --viewall");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Drives OpenSCAD to produce images
pub struct Renderer<'a> {
    interpreter: &'a dyn Interpreter,
    settings: RenderSettings,
}

impl<'a> Renderer<'a> {
    pub fn new(interpreter: &'a dyn Interpreter, settings: RenderSettings) -> Self {
        Self {
            interpreter,
            settings,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub(crate) fn interpreter(&self) -> &'a dyn Interpreter {
        self.interpreter
    }

    /// Arguments for one image render
    pub fn render_args(&self, script: &Path, output: &Path, camera: &Camera) -> Vec<String> {
        let mut extra = camera.to_args();
        extra.push(self.settings.size.to_arg());
        extra.push(self.settings.projection.to_arg().to_string());
        extra.push(format!("--colorscheme={}", self.settings.colorscheme));
        output_args(output, &extra, script)
    }

    /// Render `script` to `output` with a fully resolved camera
    pub fn render_view(&self, script: &Path, output: &Path, camera: &Camera) -> Result<()> {
        if !script.is_file() {
            return Err(Error::ScriptNotFound(script.to_path_buf()));
        }
        ensure_distinct(script, output)?;
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if output.exists() {
            std::fs::remove_file(output)?;
        }

        let run = self
            .interpreter
            .run(&self.render_args(script, output, camera))?;

        if !run.success() {
            return Err(Error::Render { stderr: run.stderr });
        }
        if !output.is_file() {
            return Err(Error::Render {
                stderr: format!("no image was written to {}\n{}", output.display(), run.stderr),
            });
        }
        Ok(())
    }

    /// Render a preview, probing the model when camera parameters are missing
    pub fn preview(&self, script: &Path, output: &Path, overrides: &CameraOverrides) -> Result<Preview> {
        if !script.is_file() {
            return Err(Error::ScriptNotFound(script.to_path_buf()));
        }

        let bounds = if overrides.is_complete() {
            None
        } else {
            framing_bounds(self.interpreter, script)?
        };
        let camera = overrides.resolve(bounds.as_ref());

        self.render_view(script, output, &camera)?;
        tracing::info!(
            script = %script.display(),
            output = %output.display(),
            camera = %camera.to_arg(),
            "rendered preview"
        );

        Ok(Preview {
            path: output.to_path_buf(),
            camera,
            bounds,
        })
    }
}
