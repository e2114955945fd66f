//! Archilume drives the Radiance lighting renderer and its GPU fork Accelerad.
//!
//! The crate prepares render inputs and runs the external tools as subprocesses:
//!
//! - Resolve a [`QualityPreset`] by name
//! - Batch-render every view of an octree with [`render_batch`], warming the ambient cache with
//!   a cheap overture pass and skipping views that already have an image
//! - Add direct sunlight per sunny sky with [`render_sunlight`] and merge it with the overcast
//!   images
//! - Write sky files, plan views and material libraries, and compile octrees with `oconv`
//!
//! All tool invocations go through [`CommandRunner`]; [`RecordingRunner`] stands in for real
//! binaries in dry runs and tests.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Configuration sources and project layout.
pub mod config;
/// Errors and timing helpers.
pub mod foundation;
/// External process invocation.
pub mod process;
/// Presets, the batch driver and post-processing.
pub mod render;
/// Sky, view, material and octree preparation.
pub mod scene;

pub use crate::config::{ArchilumeConfig, ProjectLayout, ToolPaths};
pub use crate::foundation::error::{ArchilumeError, ArchilumeResult};
pub use crate::process::{CommandRunner, CommandSpec, RecordingRunner, SystemRunner};
pub use crate::render::{
    BatchRenderOpts, BatchReport, PostFilter, QualityPreset, RenderBackend, SunlightOpts,
    SunlightReport, ViewOutcome, render_batch, render_sunlight,
};
