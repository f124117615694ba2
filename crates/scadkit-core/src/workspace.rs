//! Working directory for scripts and rendered artifacts
//!
//! All script names and output filenames supplied by the agent are resolved
//! here. A name may be relative or absolute, and may even contain `..`, as
//! long as the final location stays inside the workspace root after symlinks
//! are followed.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// File extension of OpenSCAD scripts
pub const SCRIPT_EXTENSION: &str = "scad";

/// The single directory holding scripts and outputs
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open (creating if needed) the workspace at `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    /// Canonical workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve any name to a location inside the workspace
    ///
    /// The target does not need to exist.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidPath("empty filename".to_string()));
        }

        let requested = Path::new(name);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };

        let normalized = normalize_lexically(&joined)
            .ok_or_else(|| outside(name))?;
        let resolved = canonicalize_existing_prefix(&normalized)?;

        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(outside(name))
        }
    }

    /// Resolve an output filename, appending `default_ext` when it has none
    ///
    /// The extension is added before the containment check. Outputs that
    /// land on a `.scad` file are rejected so a render or export can never
    /// replace a script.
    pub fn output_path(&self, name: &str, default_ext: &str) -> Result<PathBuf> {
        let name = trim_name(name)?;
        let path = if Path::new(name).extension().is_none() {
            self.resolve(&format!("{name}.{default_ext}"))?
        } else {
            self.resolve(name)?
        };
        if is_script(&path) {
            return Err(Error::InvalidPath(format!(
                "output '{name}' would overwrite a script; use a .{default_ext} filename"
            )));
        }
        Ok(path)
    }

    /// Resolve a script name, appending `.scad` when missing
    ///
    /// The suffix is part of the name that gets checked for containment.
    pub fn script_path(&self, name: &str) -> Result<PathBuf> {
        let name = trim_name(name)?;
        if is_script(Path::new(name)) {
            self.resolve(name)
        } else {
            self.resolve(&format!("{name}.{SCRIPT_EXTENSION}"))
        }
    }

    /// Resolve a script name that must already exist
    pub fn existing_script(&self, name: &str) -> Result<PathBuf> {
        let path = self.script_path(name)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::ScriptNotFound(path))
        }
    }

    /// Write (or overwrite) a script, creating parent directories
    pub fn write_script(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.script_path(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        tracing::info!(path = %path.display(), bytes = content.len(), "wrote script");
        Ok(path)
    }

    /// Read a script back
    pub fn read_script(&self, name: &str) -> Result<String> {
        let path = self.existing_script(name)?;
        Ok(fs::read_to_string(path)?)
    }

    /// Path relative to the workspace root, for user-facing messages
    pub fn display_path<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Fail when `output` is the same file as `script`
///
/// Callers remove stale output before running the interpreter; this keeps
/// that cleanup away from the input.
pub fn ensure_distinct(script: &Path, output: &Path) -> Result<()> {
    let same = match (script.canonicalize(), output.canonicalize()) {
        (Ok(script), Ok(output)) => script == output,
        _ => script == output,
    };
    if same {
        return Err(Error::InvalidPath(format!(
            "output {} is the input script",
            output.display()
        )));
    }
    Ok(())
}

fn trim_name(name: &str) -> Result<&str> {
    let name = name.trim().trim_end_matches(['/', '\\']);
    if name.is_empty() {
        return Err(Error::InvalidPath("empty filename".to_string()));
    }
    Ok(name)
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SCRIPT_EXTENSION))
}

fn outside(name: &str) -> Error {
    Error::InvalidPath(format!(
        "'{name}' is outside the working directory"
    ))
}

/// Collapse `.` and `..` without touching the filesystem
///
/// Returns `None` if `..` would climb above the filesystem root.
pub(crate) fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    Some(out)
}

/// Canonicalize the longest existing ancestor of `path` and re-append the rest
///
/// This follows any symlink on the way to the target even when the target
/// itself has not been created yet. A dangling symlink is an error, since
/// writing through it would create whatever it points at.
fn canonicalize_existing_prefix(path: &Path) -> Result<PathBuf> {
    let mut existing = path;
    let mut tail: Vec<&std::ffi::OsStr> = Vec::new();

    loop {
        if existing.symlink_metadata().is_ok() {
            break;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name);
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing.canonicalize().map_err(|e| {
        Error::InvalidPath(format!("cannot resolve {}: {e}", existing.display()))
    })?;
    for part in tail.iter().rev() {
        resolved.push(part);
    }
    Ok(resolved)
}
