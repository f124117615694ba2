//! # scadkit render
//!
//! Image output through OpenSCAD: camera framing from probed bounds,
//! single previews, and the labeled 14-view matrix.
//!
//! ```rust,ignore
//! use scadkit_core::OpenScad;
//! use scadkit_render::{CameraOverrides, RenderSettings, Renderer};
//!
//! let openscad = OpenScad::new(Some("/usr/bin/openscad".into()), ".");
//! let renderer = Renderer::new(&openscad, RenderSettings::default());
//! renderer.preview("gear.scad".as_ref(), "gear.png".as_ref(), &CameraOverrides::default())?;
//! ```

pub mod camera;
pub mod font;
pub mod grid;
pub mod matrix;
pub mod preview;

pub use camera::{Camera, CameraOverrides, ViewAngle};
pub use grid::{GridLayout, compose};
pub use matrix::{ViewsMatrix, render_views_matrix};
pub use preview::{Preview, Projection, RenderSettings, Renderer};
