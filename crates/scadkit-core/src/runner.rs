//! Subprocess invocation of the OpenSCAD interpreter
//!
//! Every component that needs OpenSCAD (probing, previews, the views matrix,
//! mesh export) goes through the [`Interpreter`] trait, so argument handling
//! and stderr capture live in exactly one place and tests can substitute a
//! scripted fake.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{Error, Result};

/// Captured result of one interpreter invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that can run OpenSCAD with a list of arguments
///
/// Implementations block until the process exits.
pub trait Interpreter: Send + Sync {
    /// Run the interpreter with `args` and capture its output
    ///
    /// Only launch failures are errors; a non-zero exit is reported through
    /// [`RunOutput::code`] for the caller to classify.
    fn run(&self, args: &[String]) -> Result<RunOutput>;
}

/// The real OpenSCAD executable
#[derive(Debug, Clone)]
pub struct OpenScad {
    executable: Option<PathBuf>,
    workdir: PathBuf,
}

impl OpenScad {
    /// Create a runner that launches `executable` inside `workdir`
    ///
    /// A missing executable is tolerated here and reported on first use, so
    /// library browsing keeps working on machines without OpenSCAD.
    pub fn new(executable: Option<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            executable,
            workdir: workdir.into(),
        }
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    /// Query `openscad --version`
    ///
    /// OpenSCAD prints its version on stderr.
    pub fn version(&self) -> Result<String> {
        let output = self.run(&["--version".to_string()])?;
        let text = if output.stderr.trim().is_empty() {
            output.stdout
        } else {
            output.stderr
        };
        Ok(text.trim().to_string())
    }
}

impl Interpreter for OpenScad {
    fn run(&self, args: &[String]) -> Result<RunOutput> {
        let program = self.executable.as_ref().ok_or(Error::InterpreterNotFound)?;

        tracing::debug!(program = %program.display(), ?args, "running interpreter");

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;

        let result = RunOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            tracing::debug!(code = ?result.code, "interpreter exited unsuccessfully");
        }

        Ok(result)
    }
}

/// Build `-o <output> <extra...> <script>` in the order OpenSCAD expects
pub fn output_args(output: &Path, extra: &[String], script: &Path) -> Vec<String> {
    let mut args = Vec::with_capacity(extra.len() + 3);
    args.push("-o".to_string());
    args.push(output.to_string_lossy().into_owned());
    args.extend(extra.iter().cloned());
    args.push(script.to_string_lossy().into_owned());
    args
}
