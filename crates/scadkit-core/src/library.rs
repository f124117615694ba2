//! Read-only browsing of OpenSCAD library directories
//!
//! Only files under the configured roots are ever exposed. Every lookup is
//! checked after canonicalization, so neither `..` segments nor symlinks can
//! reach outside an allowed root.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::normalize_roots;
use crate::{Error, Result};

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Dir,
    /// `.scad` or `.inc` source
    Source,
    Other,
}

impl EntryKind {
    fn of(path: &Path) -> Self {
        if path.is_dir() {
            return Self::Dir;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("scad") || ext.eq_ignore_ascii_case("inc") => {
                Self::Source
            }
            _ => Self::Other,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Self::Dir => "[DIR]  ",
            Self::Source => "[FILE] ",
            Self::Other => "[OTHER]",
        }
    }
}

/// One immediate child of a library directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl fmt::Display for LibraryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.tag(), self.name)
    }
}

/// Allow-listed library roots
#[derive(Debug, Clone, Default)]
pub struct Library {
    roots: Vec<PathBuf>,
}

impl Library {
    /// Build a browser over `roots`; missing directories are dropped
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            roots: normalize_roots(roots),
        }
    }

    /// Canonical roots, in resolution order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn contains(&self, canonical: &Path) -> bool {
        self.roots.iter().any(|root| canonical.starts_with(root))
    }

    /// Resolve a short or absolute library path to a canonical location
    ///
    /// The raw path is tried first (absolute, or relative to the process
    /// directory), then each root joined with it, in order. The first
    /// existing candidate inside a root wins.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(Error::NotFound("empty library path".to_string()));
        }

        let requested = Path::new(trimmed);
        if requested.components().any(|c| c == Component::ParentDir) {
            return Err(Error::AccessDenied(format!(
                "'{trimmed}' contains '..' segments"
            )));
        }

        if self.roots.is_empty() {
            return Err(Error::NotFound(format!(
                "'{trimmed}': no library directories are configured"
            )));
        }

        let mut candidates = vec![requested.to_path_buf()];
        if requested.is_relative() {
            candidates.extend(self.roots.iter().map(|root| root.join(requested)));
        }

        let mut denied = false;
        for candidate in candidates {
            let Ok(canonical) = candidate.canonicalize() else {
                continue;
            };
            if self.contains(&canonical) {
                return Ok(canonical);
            }
            tracing::warn!(
                requested = trimmed,
                resolved = %canonical.display(),
                "library path resolves outside allowed roots"
            );
            denied = true;
        }

        if denied {
            Err(Error::AccessDenied(format!(
                "'{trimmed}' is outside the allowed library directories"
            )))
        } else {
            Err(Error::NotFound(format!(
                "'{trimmed}' not found in any library directory"
            )))
        }
    }

    /// List the immediate entries of a library directory
    pub fn list_dir(&self, path: &str) -> Result<(PathBuf, Vec<LibraryEntry>)> {
        let dir = self.resolve(path)?;
        if !dir.is_dir() {
            return Err(Error::NotFound(format!("'{path}' is not a directory")));
        }
        let entries = list_entries(&dir)?;
        Ok((dir, entries))
    }

    /// Read a library file as UTF-8 text
    pub fn read_file(&self, path: &str) -> Result<String> {
        let file = self.resolve(path)?;
        if !file.is_file() {
            return Err(Error::NotFound(format!("'{path}' is not a file")));
        }
        Ok(fs::read_to_string(file)?)
    }
}

/// Sorted immediate entries of `dir`
pub fn list_entries(dir: &Path) -> Result<Vec<LibraryEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        entries.push(LibraryEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind: EntryKind::of(&entry.path()),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
