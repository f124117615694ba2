//! scadkit MCP Server Binary
//!
//! Runs the scadkit MCP server on stdio transport, letting AI agents write,
//! render and export OpenSCAD models.
//!
//! ## Usage
//!
//! Run directly:
//! ```bash
//! scadkit-mcp --workdir ./models --library ~/BOSL2-parent
//! ```
//!
//! Or add to Claude Desktop's MCP configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "openscad": {
//!       "command": "scadkit-mcp",
//!       "env": { "SCADKIT_WORKDIR": "/home/me/models" }
//!     }
//!   }
//! }
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use scadkit_core::config::{
    self, DEFAULT_COLORSCHEME, LIBRARIES_PATH_ENV, OPENSCAD_PATH_ENV,
};
use scadkit_core::{Config, ImageSize};
use scadkit_mcp::ScadMcpService;
use scadkit_mcp::state::ScadState;

#[derive(Parser)]
#[command(name = "scadkit-mcp")]
#[command(about = "MCP server for OpenSCAD scripting, rendering and export", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the OpenSCAD executable
    #[arg(long, env = OPENSCAD_PATH_ENV)]
    openscad: Option<PathBuf>,

    /// Extra library directory (repeatable); OPENSCAD_LIBRARIES_PATH is also read
    #[arg(short, long)]
    library: Vec<PathBuf>,

    /// Directory for scripts and rendered files
    #[arg(short, long, env = "SCADKIT_WORKDIR", default_value = ".")]
    workdir: PathBuf,

    /// Preview image size
    #[arg(long, default_value = "800x600")]
    image_size: ImageSize,

    /// OpenSCAD color scheme
    #[arg(long, default_value = DEFAULT_COLORSCHEME)]
    colorscheme: String,
}

impl Args {
    fn into_config(self) -> Config {
        let executable = config::find_executable(self.openscad.as_deref());
        if executable.is_none() {
            tracing::warn!("OpenSCAD executable not found; renders and exports will fail");
        }

        let mut roots = self.library;
        if let Some(var) = std::env::var_os(LIBRARIES_PATH_ENV) {
            roots.extend(config::split_library_var(&var));
        }
        roots.extend(config::default_library_paths());

        Config::new(self.workdir)
            .with_executable(executable)
            .with_library_roots(roots)
            .with_image_size(self.image_size)
            .with_colorscheme(self.colorscheme)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // CRITICAL: Log to stderr only - stdout is reserved for MCP JSON-RPC
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    eprintln!("scadkit MCP server v{}", env!("CARGO_PKG_VERSION"));

    let config = Args::parse().into_config();
    match &config.executable {
        Some(path) => eprintln!("Using OpenSCAD at {}", path.display()),
        None => eprintln!("OpenSCAD not found. Set {OPENSCAD_PATH_ENV} or pass --openscad."),
    }
    for root in &config.library_roots {
        eprintln!("Library root: {}", root.display());
    }

    let state = ScadState::new(&config)
        .with_context(|| format!("cannot open working directory {}", config.workdir.display()))?;
    eprintln!("Working directory: {}", state.workspace().root().display());
    eprintln!("Ready. Listening on stdio...");

    // Create service and serve on stdio transport
    let service = ScadMcpService::new(state);
    let server = service.serve(stdio()).await?;

    // Wait for client to disconnect or error
    server.waiting().await?;

    eprintln!("Client disconnected. Shutting down.");
    Ok(())
}
