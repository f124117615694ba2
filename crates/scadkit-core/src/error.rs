//! Error types for scadkit

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using scadkit's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the OpenSCAD interpreter
///
/// Interpreter-facing variants carry the captured stderr verbatim so the
/// calling agent has enough context to fix its script.
#[derive(Error, Debug)]
pub enum Error {
    /// A path was malformed or escapes its allowed directory
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The referenced script does not exist in the working directory
    #[error("Script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    /// No OpenSCAD executable is configured or discoverable
    #[error("OpenSCAD executable not found. Install it, put it on PATH or set OPENSCAD_PATH.")]
    InterpreterNotFound,

    /// The interpreter process could not be started
    #[error("Failed to launch {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The interpreter exited unsuccessfully while probing geometry
    #[error("Interpreter error (exit {}):\n{stderr}", display_code(*.code))]
    Interpreter { code: Option<i32>, stderr: String },

    /// The model is 2D, so there is no mesh to measure
    #[error("Model is 2D:\n{stderr}")]
    Flat { stderr: String },

    /// The probed mesh was empty or degenerate
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// The interpreter failed to rasterize an image
    #[error("Render error:\n{stderr}")]
    Render { stderr: String },

    /// The interpreter failed to export a mesh, or exported nothing usable
    #[error("Export error:\n{stderr}")]
    Export { stderr: String },

    /// A library path resolved outside every configured root
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// A library path did not resolve under any configured root
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding/decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

fn display_code(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}
