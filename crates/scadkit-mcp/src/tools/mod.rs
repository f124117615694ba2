//! MCP tool request types
//!
//! - Scripts (write_scad_script, read_scad_script)
//! - Rendering (render_preview, render_views_matrix)
//! - Export (export_stl)
//! - Libraries (list_libraries, list_scad_library_directory, read_scad_library_file)

pub mod export;
pub mod library;
pub mod render;
pub mod script;
