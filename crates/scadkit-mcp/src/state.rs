//! Shared server state
//!
//! Every operation here blocks on the filesystem or on an OpenSCAD
//! subprocess. The MCP service moves each call onto tokio's blocking pool;
//! nothing in this module is async.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scadkit_core::{
    Config, ExportReport, Interpreter, Library, LibraryEntry, OpenScad, Result, Workspace,
    export_mesh, library,
};
use scadkit_render::{CameraOverrides, Preview, RenderSettings, Renderer, ViewsMatrix, render_views_matrix};

struct Inner {
    interpreter: Arc<dyn Interpreter>,
    workspace: Workspace,
    library: Library,
    preview: RenderSettings,
    cell: RenderSettings,
}

/// Handle to the workspace, library roots and interpreter
///
/// Cheap to clone and shareable between tasks.
#[derive(Clone)]
pub struct ScadState {
    inner: Arc<Inner>,
}

/// A rendered image and its encoded bytes
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub path: PathBuf,
    pub png: Vec<u8>,
    pub summary: String,
}

/// One library root and its immediate entries
#[derive(Debug)]
pub struct RootListing {
    pub root: PathBuf,
    pub entries: Result<Vec<LibraryEntry>>,
}

impl ScadState {
    /// State backed by the real OpenSCAD executable from `config`
    pub fn new(config: &Config) -> Result<Self> {
        let workspace = Workspace::open(&config.workdir)?;
        let openscad = OpenScad::new(config.executable.clone(), workspace.root());
        Self::with_workspace(config, workspace, Arc::new(openscad))
    }

    /// State backed by any interpreter, e.g. a scripted fake
    pub fn with_interpreter(config: &Config, interpreter: Arc<dyn Interpreter>) -> Result<Self> {
        let workspace = Workspace::open(&config.workdir)?;
        Self::with_workspace(config, workspace, interpreter)
    }

    fn with_workspace(
        config: &Config,
        workspace: Workspace,
        interpreter: Arc<dyn Interpreter>,
    ) -> Result<Self> {
        let preview = RenderSettings {
            size: config.image_size,
            colorscheme: config.colorscheme.clone(),
            ..Default::default()
        };
        let cell = RenderSettings {
            size: config.cell_size,
            ..preview.clone()
        };

        Ok(Self {
            inner: Arc::new(Inner {
                interpreter,
                workspace,
                library: Library::new(&config.library_roots),
                preview,
                cell,
            }),
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.inner.workspace
    }

    pub fn library(&self) -> &Library {
        &self.inner.library
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        self.inner.workspace.display_path(path)
    }

    /// Create or overwrite a script
    pub fn write_script(&self, filename: &str, content: &str) -> Result<PathBuf> {
        self.inner.workspace.write_script(filename, content)
    }

    /// Read a script back
    pub fn read_script(&self, filename: &str) -> Result<String> {
        self.inner.workspace.read_script(filename)
    }

    /// Render one view; camera values left as `None` are derived from the model
    pub fn render_preview(
        &self,
        filename: &str,
        output_filename: &str,
        overrides: &CameraOverrides,
    ) -> Result<RenderedImage> {
        let script = self.inner.workspace.existing_script(filename)?;
        let output = self.inner.workspace.output_path(output_filename, "png")?;

        let renderer = Renderer::new(self.inner.interpreter.as_ref(), self.inner.preview.clone());
        let Preview { path, camera, bounds } = renderer.preview(&script, &output, overrides)?;

        let mut summary = format!(
            "Rendered {} ({}, rotation [{}, {}, {}], distance {})",
            self.relative(&path).display(),
            self.inner.preview.size,
            camera.rotation.x,
            camera.rotation.y,
            camera.rotation.z,
            camera.distance
        );
        if let Some(bounds) = bounds {
            summary.push('\n');
            summary.push_str(&bounds.to_string());
        } else if camera.viewall {
            summary.push_str("\n2D model; framed with --viewall");
        }

        let png = std::fs::read(&path)?;
        Ok(RenderedImage { path, png, summary })
    }

    /// Render the 14-view matrix
    pub fn render_views_matrix(&self, filename: &str, output_filename: &str) -> Result<RenderedImage> {
        let script = self.inner.workspace.existing_script(filename)?;
        let output = self.inner.workspace.output_path(output_filename, "png")?;

        let renderer = Renderer::new(self.inner.interpreter.as_ref(), self.inner.cell.clone());
        let matrix: ViewsMatrix = render_views_matrix(&renderer, &script, &output)?;

        let summary = format!("Saved {}\n{}", self.relative(&matrix.path).display(), matrix);
        let png = std::fs::read(&matrix.path)?;
        Ok(RenderedImage {
            path: matrix.path,
            png,
            summary,
        })
    }

    /// Export a mesh and relay OpenSCAD's diagnostics
    pub fn export_stl(&self, filename: &str, output_filename: &str) -> Result<ExportReport> {
        let script = self.inner.workspace.existing_script(filename)?;
        let output = self.inner.workspace.output_path(output_filename, "stl")?;
        export_mesh(self.inner.interpreter.as_ref(), &script, &output)
    }

    /// Configured library roots with their top-level entries
    pub fn list_libraries(&self) -> Vec<RootListing> {
        self.inner
            .library
            .roots()
            .iter()
            .map(|root| RootListing {
                root: root.clone(),
                entries: library::list_entries(root),
            })
            .collect()
    }

    /// Entries of one library directory
    pub fn list_library_directory(&self, path: &str) -> Result<(PathBuf, Vec<LibraryEntry>)> {
        self.inner.library.list_dir(path)
    }

    /// Contents of one library file
    pub fn read_library_file(&self, path: &str) -> Result<String> {
        self.inner.library.read_file(path)
    }
}
