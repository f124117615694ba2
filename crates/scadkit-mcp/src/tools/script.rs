//! Script file tools for the MCP server

use schemars::JsonSchema;
use serde::Deserialize;

/// Request for creating or overwriting a script
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteScriptRequest {
    /// Name of the file to save, relative to the working directory.
    /// `.scad` is appended when missing.
    #[serde(alias = "scad_filename")]
    pub filename: String,

    /// Complete OpenSCAD source. Replaces the entire file.
    pub content: String,
}

/// Request for reading a script back
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadScriptRequest {
    /// Name of the script in the working directory
    #[serde(alias = "scad_filename")]
    pub filename: String,
}
