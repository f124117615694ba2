//! Library browsing tools for the MCP server

use std::fmt::Write as _;
use std::path::Path;

use scadkit_core::{EntryKind, LibraryEntry};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::state::RootListing;

/// Request naming a path inside the library directories
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LibraryPathRequest {
    /// Library path, either short (e.g. "BOSL2" or "BOSL2/std.scad")
    /// or absolute within a configured library directory
    #[serde(alias = "filepath", alias = "dirpath")]
    pub path: String,
}

/// Text for `list_libraries`: each root followed by its entries
///
/// Only directories and OpenSCAD sources are shown at root level.
pub fn format_roots(listings: &[RootListing]) -> String {
    if listings.is_empty() {
        return "No OpenSCAD library directories found. Set OPENSCAD_LIBRARIES_PATH or pass --library."
            .to_string();
    }

    let mut out = String::from("Found libraries in:\n");
    for listing in listings {
        let _ = writeln!(out, "\nPath: {}", listing.root.display());
        match &listing.entries {
            Ok(entries) => {
                for entry in entries.iter().filter(|e| e.kind != EntryKind::Other) {
                    let _ = writeln!(out, "  {entry}");
                }
            }
            Err(e) => {
                let _ = writeln!(out, "  Error reading directory: {e}");
            }
        }
    }
    out
}

/// Text for `list_scad_library_directory`
pub fn format_directory(requested: &str, resolved: &Path, entries: &[LibraryEntry]) -> String {
    let mut out = format!("Contents of {} ({}):\n", requested, resolved.display());
    if entries.is_empty() {
        out.push_str("  (empty)\n");
    }
    for entry in entries {
        let _ = writeln!(out, "  {entry}");
    }
    out
}
