//! # scadkit core
//!
//! Plumbing between an agent-facing tool surface and the external OpenSCAD
//! interpreter. OpenSCAD does all geometry work; this crate only:
//!
//! - locates the interpreter and library directories ([`config`])
//! - runs it and captures stdout/stderr/exit code ([`runner`])
//! - keeps scripts and outputs inside one working directory ([`workspace`])
//! - measures exported meshes for camera framing ([`geometry`])
//! - classifies export diagnostics ([`export`])
//! - exposes library files behind an allow-list ([`library`])
//!
//! ## Units and Conventions
//!
//! - **Coordinates**: OpenSCAD model units, right-handed, Z-up
//! - **Angles**: degrees, as OpenSCAD's `--camera` flag expects

pub mod config;
pub mod export;
pub mod geometry;
pub mod library;
pub mod runner;
pub mod workspace;

mod error;

pub use config::{Config, ImageSize};
pub use error::{Error, Result};
pub use export::{ExportReport, export_mesh};
pub use geometry::{Bounds, probe};
pub use library::{EntryKind, Library, LibraryEntry};
pub use runner::{Interpreter, OpenScad, RunOutput};
pub use workspace::{Workspace, ensure_distinct};

/// Re-exported so downstream crates share one vector type
pub use glam::Vec3;
