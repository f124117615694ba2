//! Rendering tools for the MCP server

use schemars::JsonSchema;
use serde::Deserialize;
use scadkit_render::CameraOverrides;

fn default_preview_output() -> String {
    "preview.png".to_string()
}

fn default_matrix_output() -> String {
    "views_matrix.png".to_string()
}

/// Request for rendering a single preview image
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenderPreviewRequest {
    /// The .scad file to render
    #[serde(alias = "scad_filename")]
    pub filename: String,

    /// Output image filename (default: "preview.png")
    #[serde(default = "default_preview_output")]
    pub output_filename: String,

    /// Camera rotation about X in degrees (default: 55)
    #[serde(default)]
    pub rotation_x: Option<f32>,

    /// Camera rotation about Y in degrees (default: 0)
    #[serde(default)]
    pub rotation_y: Option<f32>,

    /// Camera rotation about Z in degrees (default: 25)
    #[serde(default)]
    pub rotation_z: Option<f32>,

    /// Camera distance. Omit to frame the whole model automatically.
    #[serde(default)]
    pub distance: Option<f32>,
}

impl RenderPreviewRequest {
    pub fn camera(&self) -> CameraOverrides {
        CameraOverrides {
            rotation_x: self.rotation_x,
            rotation_y: self.rotation_y,
            rotation_z: self.rotation_z,
            distance: self.distance,
        }
    }
}

/// Request for rendering the 14-view matrix
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenderViewsMatrixRequest {
    /// The .scad file to render
    #[serde(alias = "scad_filename")]
    pub filename: String,

    /// Output image filename (default: "views_matrix.png")
    #[serde(default = "default_matrix_output")]
    pub output_filename: String,
}
