//! scadkit MCP Server - Model Context Protocol server for OpenSCAD
//!
//! This crate exposes the external OpenSCAD interpreter to AI agents as a
//! small set of tools. Agents can:
//!
//! - Write and read back `.scad` scripts in a working directory
//! - Render a preview from any camera, or a labeled 14-view matrix
//! - Export a mesh and read OpenSCAD's manifold diagnostics
//! - Browse installed libraries such as BOSL2
//!
//! ## Workflow
//!
//! 1. `write_scad_script` - Save the model
//! 2. `render_preview` / `render_views_matrix` - Look at it
//! 3. Iterate on the script based on visual feedback and errors
//! 4. `export_stl` - Validate and export the final mesh

pub mod state;
pub mod tools;

use base64::Engine as _;
use rmcp::{
    ErrorData as McpError,
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::state::{RenderedImage, ScadState};
use crate::tools::{
    export::ExportStlRequest,
    library::{self as library_tools, LibraryPathRequest},
    render::{RenderPreviewRequest, RenderViewsMatrixRequest},
    script::{ReadScriptRequest, WriteScriptRequest},
};

// Re-export for binary
pub use rmcp;
pub use state::ScadState as State;

/// The scadkit MCP service
///
/// Implements the MCP ServerHandler to expose OpenSCAD tooling as MCP tools.
/// Each call runs on tokio's blocking pool because it waits on the
/// filesystem or an OpenSCAD subprocess.
#[derive(Clone)]
pub struct ScadMcpService {
    state: ScadState,
    tool_router: ToolRouter<Self>,
}

fn failure(error: &scadkit_core::Error) -> CallToolResult {
    CallToolResult::error(vec![Content::text(error.to_string())])
}

fn image_result(rendered: &RenderedImage) -> CallToolResult {
    let b64 = base64::engine::general_purpose::STANDARD.encode(&rendered.png);
    CallToolResult::success(vec![
        Content::text(rendered.summary.clone()),
        Content::image(b64, "image/png"),
    ])
}

impl ScadMcpService {
    /// Run a blocking state operation off the async runtime
    async fn blocking<T, F>(&self, op: F) -> Result<scadkit_core::Result<T>, McpError>
    where
        T: Send + 'static,
        F: FnOnce(&ScadState) -> scadkit_core::Result<T> + Send + 'static,
    {
        let state = self.state.clone();
        tokio::task::spawn_blocking(move || op(&state))
            .await
            .map_err(|e| McpError::internal_error(format!("worker task failed: {e}"), None))
    }
}

#[tool_router]
impl ScadMcpService {
    /// Create a new MCP service with the given state
    pub fn new(state: ScadState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    // ========================================================================
    // Script Tools
    // ========================================================================

    #[tool(description = "EXCLUSIVE tool for creating or overwriting OpenSCAD scripts. Always use this to save your code. Replaces the entire file; `.scad` is appended to the name when missing.")]
    async fn write_scad_script(
        &self,
        params: Parameters<WriteScriptRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        let result = self
            .blocking(move |s| {
                let path = s.write_script(&request.filename, &request.content)?;
                Ok(s.workspace().display_path(&path).display().to_string())
            })
            .await?;

        Ok(match result {
            Ok(name) => CallToolResult::success(vec![Content::text(format!(
                "Successfully saved {name}. NOW call `render_preview` to check your work."
            ))]),
            Err(e) => failure(&e),
        })
    }

    #[tool(description = "Read an OpenSCAD script from the working directory. Use this to read the code back before making edits.")]
    async fn read_scad_script(
        &self,
        params: Parameters<ReadScriptRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        let result = self.blocking(move |s| s.read_script(&request.filename)).await?;

        Ok(match result {
            Ok(content) => CallToolResult::success(vec![Content::text(content)]),
            Err(e) => failure(&e),
        })
    }

    // ========================================================================
    // Rendering Tools
    // ========================================================================

    #[tool(description = "Render a PNG preview of an OpenSCAD script and return it visually. Camera rotation is in degrees (OpenSCAD gimbal: rotation_x, rotation_y, rotation_z). Omit any camera value to have it derived so the whole model is framed.")]
    async fn render_preview(
        &self,
        params: Parameters<RenderPreviewRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        let result = self
            .blocking(move |s| {
                s.render_preview(&request.filename, &request.output_filename, &request.camera())
            })
            .await?;

        Ok(match result {
            Ok(rendered) => image_result(&rendered),
            Err(e) => failure(&e),
        })
    }

    #[tool(description = "Render the model from 14 fixed angles (Top, Bottom, Front, Back, Left, Right and 8 isometric corners) into a single labeled 4x4 grid image. Use this to check every side of a part at once.")]
    async fn render_views_matrix(
        &self,
        params: Parameters<RenderViewsMatrixRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        let result = self
            .blocking(move |s| s.render_views_matrix(&request.filename, &request.output_filename))
            .await?;

        Ok(match result {
            Ok(rendered) => image_result(&rendered),
            Err(e) => failure(&e),
        })
    }

    // ========================================================================
    // Export Tools
    // ========================================================================

    #[tool(description = "Export the model to an STL file. Use this to VALIDATE geometry: OpenSCAD's diagnostics are returned verbatim, and empty, 2D or non-manifold models are reported as problems.")]
    async fn export_stl(
        &self,
        params: Parameters<ExportStlRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        let result = self
            .blocking(move |s| {
                let report = s.export_stl(&request.filename, &request.output_filename)?;
                let path = s.workspace().display_path(&report.path).display().to_string();
                Ok((report, path))
            })
            .await?;

        Ok(match result {
            Ok((report, path)) => {
                CallToolResult::success(vec![Content::text(format!("{report}\nMesh: {path}"))])
            }
            Err(e) => failure(&e),
        })
    }

    // ========================================================================
    // Library Tools
    // ========================================================================

    #[tool(description = "List the OpenSCAD library directories available to this server and the libraries they contain.")]
    async fn list_libraries(&self) -> Result<CallToolResult, McpError> {
        let listings = self.blocking(|s| Ok(s.list_libraries())).await?;

        Ok(match listings {
            Ok(listings) => CallToolResult::success(vec![Content::text(
                library_tools::format_roots(&listings),
            )]),
            Err(e) => failure(&e),
        })
    }

    #[tool(description = "List the contents of a directory inside the OpenSCAD library paths, e.g. 'BOSL2'. Use this to explore external libraries.")]
    async fn list_scad_library_directory(
        &self,
        params: Parameters<LibraryPathRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        let requested = request.path.clone();
        let result = self
            .blocking(move |s| s.list_library_directory(&request.path))
            .await?;

        Ok(match result {
            Ok((resolved, entries)) => CallToolResult::success(vec![Content::text(
                library_tools::format_directory(&requested, &resolved, &entries),
            )]),
            Err(e) => failure(&e),
        })
    }

    #[tool(description = "Read a file from the OpenSCAD library directories, e.g. 'BOSL2/std.scad'. Use this ONLY for inspecting external libraries.")]
    async fn read_scad_library_file(
        &self,
        params: Parameters<LibraryPathRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        let result = self
            .blocking(move |s| s.read_library_file(&request.path))
            .await?;

        Ok(match result {
            Ok(content) => CallToolResult::success(vec![Content::text(content)]),
            Err(e) => failure(&e),
        })
    }
}

#[tool_handler]
impl ServerHandler for ScadMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "scadkit-mcp".to_string(),
                title: Some("OpenSCAD Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "OpenSCAD MCP server. All geometry is evaluated by the OpenSCAD executable. \
                 \n\nWorkflow:\n\
                 1. write_scad_script() - Save the model (always use this, never a generic file tool)\n\
                 2. render_preview() - Look at it; render_views_matrix() shows every side at once\n\
                 3. Fix the script based on the image and any error output, then render again\n\
                 4. export_stl() - Validate the mesh; warnings mean the model is likely not manifold\n\n\
                 Use list_libraries(), list_scad_library_directory() and read_scad_library_file() \
                 to learn the API of installed libraries such as BOSL2 before using them."
                    .to_string(),
            ),
        }
    }
}
