//! Process configuration
//!
//! A [`Config`] is built once at startup (usually from CLI flags and
//! environment variables) and handed to every component. Nothing in scadkit
//! reads configuration from ambient global state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming the OpenSCAD executable
pub const OPENSCAD_PATH_ENV: &str = "OPENSCAD_PATH";

/// Environment variable listing extra library roots (OS path-list separator)
pub const LIBRARIES_PATH_ENV: &str = "OPENSCAD_LIBRARIES_PATH";

/// OpenSCAD's default GUI color scheme
pub const DEFAULT_COLORSCHEME: &str = "Cornfield";

/// Pixel dimensions of a rendered image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Value for OpenSCAD's `--imgsize` flag
    pub fn to_arg(self) -> String {
        format!("--imgsize={},{}", self.width, self.height)
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ImageSize {
    type Err = String;

    /// Accepts `800x600` or `800,600`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X', ','])
            .ok_or_else(|| format!("Invalid image size '{s}'. Expected WIDTHxHEIGHT"))?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("Invalid image width '{w}'"))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("Invalid image height '{h}'"))?;
        if width == 0 || height == 0 {
            return Err(format!("Image size must be non-zero, got '{s}'"));
        }
        Ok(Self { width, height })
    }
}

/// Runtime configuration shared by all components
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the OpenSCAD executable, if one was found
    pub executable: Option<PathBuf>,
    /// Canonicalized library roots the browser may expose
    pub library_roots: Vec<PathBuf>,
    /// Directory holding scripts and rendered artifacts
    pub workdir: PathBuf,
    /// Size of single previews
    pub image_size: ImageSize,
    /// Size of each cell in the views matrix
    pub cell_size: ImageSize,
    /// OpenSCAD color scheme used for renders
    pub colorscheme: String,
}

impl Config {
    /// Create a configuration rooted at `workdir` with no executable and no libraries
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            executable: None,
            library_roots: Vec::new(),
            workdir: workdir.into(),
            image_size: ImageSize::default(),
            cell_size: ImageSize::new(400, 300),
            colorscheme: DEFAULT_COLORSCHEME.to_string(),
        }
    }

    pub fn with_executable(mut self, executable: Option<PathBuf>) -> Self {
        self.executable = executable;
        self
    }

    /// Set library roots; missing directories are dropped and the rest canonicalized
    pub fn with_library_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.library_roots = normalize_roots(roots);
        self
    }

    pub fn with_image_size(mut self, size: ImageSize) -> Self {
        self.image_size = size;
        self
    }

    pub fn with_cell_size(mut self, size: ImageSize) -> Self {
        self.cell_size = size;
        self
    }

    pub fn with_colorscheme(mut self, scheme: impl Into<String>) -> Self {
        self.colorscheme = scheme.into();
        self
    }
}

/// Locate the OpenSCAD executable
///
/// Checks the explicit path first, then `PATH`, then common install
/// locations for the current platform.
pub fn find_executable(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "configured OpenSCAD path does not exist");
    }

    if let Some(found) = search_path(executable_name()) {
        return Some(found);
    }

    platform_executable_paths()
        .into_iter()
        .find(|candidate| candidate.is_file())
}

fn executable_name() -> &'static str {
    if cfg!(windows) { "openscad.exe" } else { "openscad" }
}

fn search_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn platform_executable_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if cfg!(windows) {
        paths.push(PathBuf::from(r"C:\Program Files\OpenSCAD\openscad.exe"));
        paths.push(PathBuf::from(r"C:\Program Files (x86)\OpenSCAD\openscad.exe"));
        if let Some(local) = dirs::data_local_dir() {
            paths.push(local.join(r"Programs\OpenSCAD\openscad.exe"));
        }
    } else if cfg!(target_os = "macos") {
        paths.push(PathBuf::from(
            "/Applications/OpenSCAD.app/Contents/MacOS/OpenSCAD",
        ));
    } else {
        paths.push(PathBuf::from("/usr/bin/openscad"));
        paths.push(PathBuf::from("/usr/local/bin/openscad"));
        paths.push(PathBuf::from("/snap/bin/openscad"));
    }
    paths
}

/// Standard OpenSCAD library directories for the current platform
///
/// The returned paths may not exist; [`normalize_roots`] filters them.
pub fn default_library_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if cfg!(windows) || cfg!(target_os = "macos") {
        if let Some(docs) = dirs::document_dir() {
            paths.push(docs.join("OpenSCAD").join("libraries"));
        }
    } else {
        if let Some(data) = dirs::data_dir() {
            paths.push(data.join("OpenSCAD").join("libraries"));
        }
        paths.push(PathBuf::from("/usr/share/openscad/libraries"));
    }
    paths
}

/// Split an `OPENSCAD_LIBRARIES_PATH`-style value into directories
pub fn split_library_var(value: &std::ffi::OsStr) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

/// Keep existing directories, canonicalize them and drop duplicates
///
/// Order is preserved so explicitly configured roots win over defaults
/// during resolution.
pub fn normalize_roots<I, P>(roots: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut out: Vec<PathBuf> = Vec::new();
    for root in roots {
        let root = root.as_ref();
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "skipping missing library root");
            continue;
        }
        match root.canonicalize() {
            Ok(canonical) => {
                if !out.contains(&canonical) {
                    out.push(canonical);
                }
            }
            Err(e) => tracing::warn!(root = %root.display(), error = %e, "cannot canonicalize library root"),
        }
    }
    out
}
