//! Mesh export with interpreter diagnostics
//!
//! OpenSCAD performs the manifold checks itself during a full render; this
//! module relays its stderr verbatim and classifies the lines that matter so
//! an empty or broken model is never reported as a clean export.

use std::path::{Path, PathBuf};

use crate::runner::{Interpreter, output_args};
use crate::workspace::ensure_distinct;
use crate::{Error, Result};

/// Messages OpenSCAD prints when there is nothing to export
const EMPTY_MARKERS: &[&str] = &[
    "current top level object is empty",
    "no top-level geometry to render",
];

/// Message OpenSCAD prints when the top level is 2D geometry
const NOT_3D_MARKER: &str = "current top level object is not a 3d object";

/// Fragments of warnings about unsound meshes
const GEOMETRY_MARKERS: &[&str] = &["manifold", "degenerate", "self-intersect"];

/// Outcome of a successful export
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    /// Interpreter stderr, unmodified
    pub diagnostics: String,
    /// `WARNING:` lines that flag unsound geometry
    pub geometry_warnings: Vec<String>,
    pub bytes: u64,
}

impl ExportReport {
    /// True when OpenSCAD raised no manifold/degeneracy warnings
    pub fn is_clean(&self) -> bool {
        self.geometry_warnings.is_empty()
    }
}

impl std::fmt::Display for ExportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let file = self
            .path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned());
        if self.is_clean() {
            write!(f, "Successfully exported {} ({} bytes).", file, self.bytes)?;
        } else {
            write!(
                f,
                "Exported {} ({} bytes) with geometry warnings; the mesh is likely not manifold:",
                file, self.bytes
            )?;
            for warning in &self.geometry_warnings {
                write!(f, "\n  {warning}")?;
            }
        }
        write!(f, "\nLogs:\n{}", self.diagnostics)
    }
}

/// Lines of interest pulled out of OpenSCAD's stderr
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub geometry_warnings: Vec<String>,
    pub empty: bool,
    /// The model is 2D and cannot become a mesh
    pub not_3d: bool,
}

impl Diagnostics {
    pub fn parse(stderr: &str) -> Self {
        let mut diag = Self::default();
        for line in stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let lower = line.to_ascii_lowercase();
            if EMPTY_MARKERS.iter().any(|m| lower.contains(m)) {
                diag.empty = true;
            }
            if lower.contains(NOT_3D_MARKER) {
                diag.not_3d = true;
            }
            if lower.starts_with("error:") {
                diag.errors.push(line.to_string());
            } else if lower.starts_with("warning:") {
                if GEOMETRY_MARKERS.iter().any(|m| lower.contains(m)) {
                    diag.geometry_warnings.push(line.to_string());
                }
                diag.warnings.push(line.to_string());
            }
        }
        diag
    }
}

/// Export `script` to `output`, format chosen by the output extension
pub fn export_mesh(interpreter: &dyn Interpreter, script: &Path, output: &Path) -> Result<ExportReport> {
    ensure_distinct(script, output)?;
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // A stale file from an earlier export must not pass for fresh output
    if output.exists() {
        std::fs::remove_file(output)?;
    }

    let run = interpreter.run(&output_args(output, &[], script))?;
    let diag = Diagnostics::parse(&run.stderr);

    if diag.not_3d {
        return Err(Error::Export {
            stderr: format!(
                "model is 2D; mesh export needs a 3D top-level object (try linear_extrude)\n{}",
                run.stderr
            ),
        });
    }
    if !run.success() {
        return Err(Error::Export { stderr: run.stderr });
    }
    if diag.empty {
        return Err(Error::Export {
            stderr: format!("model is empty; nothing was exported\n{}", run.stderr),
        });
    }

    let bytes = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    if bytes == 0 {
        return Err(Error::Export {
            stderr: format!("interpreter produced no output file\n{}", run.stderr),
        });
    }

    let report = ExportReport {
        path: output.to_path_buf(),
        diagnostics: run.stderr,
        geometry_warnings: diag.geometry_warnings,
        bytes,
    };

    if report.is_clean() {
        tracing::info!(path = %report.path.display(), bytes, "exported mesh");
    } else {
        tracing::warn!(
            path = %report.path.display(),
            warnings = report.geometry_warnings.len(),
            "exported mesh with geometry warnings"
        );
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::runner::RunOutput;

    struct Scripted {
        code: i32,
        stderr: &'static str,
        write: bool,
    }

    impl Interpreter for Scripted {
        fn run(&self, args: &[String]) -> Result<RunOutput> {
            if self.write {
                std::fs::write(&args[1], b"solid x\nendsolid x\n")?;
            }
            Ok(RunOutput {
                code: Some(self.code),
                stdout: String::new(),
                stderr: self.stderr.to_string(),
            })
        }
    }

    #[test]
    fn parse_classifies_lines() {
        let diag = Diagnostics::parse(
            "Geometries in cache: 3\n\
             WARNING: Object may not be a valid 2-manifold and may need repair!\n\
             WARNING: Ignoring unknown variable 'x'\n\
             ERROR: CGAL error in CGAL_Nef_polyhedron3()\n",
        );
        assert_eq!(diag.errors.len(), 1);
        assert_eq!(diag.warnings.len(), 2);
        assert_eq!(diag.geometry_warnings.len(), 1);
        assert!(!diag.empty);
    }

    #[test]
    fn clean_export_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("model.stl");
        let fake = Scripted { code: 0, stderr: "Total rendering time: 0:00:00.1\n", write: true };
        let report = export_mesh(&fake, Path::new("model.scad"), &out).unwrap();
        assert!(report.is_clean());
        assert!(report.to_string().starts_with("Successfully exported model.stl"));
        assert!(report.diagnostics.contains("Total rendering time"));
    }

    #[test]
    fn manifold_warnings_are_not_reported_as_success() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("model.stl");
        let fake = Scripted {
            code: 0,
            stderr: "WARNING: Object may not be a valid 2-manifold and may need repair!\n",
            write: true,
        };
        let report = export_mesh(&fake, Path::new("model.scad"), &out).unwrap();
        assert!(!report.is_clean());
        let text = report.to_string();
        assert!(!text.contains("Successfully"));
        assert!(text.contains("2-manifold"));
    }

    #[test]
    fn empty_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.stl");
        let fake = Scripted {
            code: 0,
            stderr: "WARNING: No top-level geometry to render\n",
            write: false,
        };
        let err = export_mesh(&fake, Path::new("empty.scad"), &out).unwrap_err();
        match err {
            Error::Export { stderr } => assert!(stderr.contains("No top-level geometry")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nonzero_exit_fails_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bad.stl");
        let fake = Scripted {
            code: 1,
            stderr: "ERROR: Parser error in file bad.scad, line 2: syntax error\n",
            write: false,
        };
        let err = export_mesh(&fake, Path::new("bad.scad"), &out).unwrap_err();
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn flat_model_gets_its_own_message() {
        let diag = Diagnostics::parse("WARNING: Current top level object is not a 3D object.\n");
        assert!(diag.not_3d);
        assert!(!diag.empty);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("flat.stl");
        let fake = Scripted {
            code: 0,
            stderr: "WARNING: Current top level object is not a 3D object.\n",
            write: false,
        };
        let err = export_mesh(&fake, Path::new("flat.scad"), &out).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("model is 2D"));
        assert!(!text.contains("empty"));
    }

    #[test]
    fn output_equal_to_script_is_refused_before_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("part.scad");
        std::fs::write(&script, "cube(1);").unwrap();
        let fake = Scripted { code: 0, stderr: "", write: true };

        let err = export_mesh(&fake, &script, &script).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
        assert_eq!(std::fs::read_to_string(&script).unwrap(), "cube(1);");
    }

    #[test]
    fn stale_output_is_not_mistaken_for_success() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("model.stl");
        std::fs::write(&out, b"old mesh").unwrap();
        let fake = Scripted { code: 0, stderr: "", write: false };
        let err = export_mesh(&fake, Path::new("model.scad"), &out).unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
    }
}
