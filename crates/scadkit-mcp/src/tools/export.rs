//! Export tools for the MCP server

use schemars::JsonSchema;
use serde::Deserialize;

fn default_output() -> String {
    "model.stl".to_string()
}

/// Request for exporting a script as a mesh
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExportStlRequest {
    /// The .scad file to export
    #[serde(alias = "scad_filename")]
    pub filename: String,

    /// Output mesh filename (default: "model.stl").
    /// The extension selects the format; `.stl` is appended when missing.
    #[serde(default = "default_output")]
    pub output_filename: String,
}
