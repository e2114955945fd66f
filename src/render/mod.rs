//! Radiance/Accelerad rendering: presets, command lines, the batch and sunlight drivers and
//! post-processing.

/// Batch render driver.
pub mod batch;
/// CUDA cache environment.
pub mod gpu;
/// Scene-name parsing and output paths.
pub mod naming;
/// Half-resolution filtering and previews.
pub mod post;
/// Quality presets.
pub mod preset;
/// Renderer argument building.
pub mod rpict;
/// Overcast plus direct-sun driver.
pub mod sunlight;

pub use batch::{
    BatchRenderOpts, BatchReport, HIGH_RES_THRESHOLD, RenderBackend, ViewOutcome, ViewReport,
    render_batch,
};
pub use naming::{SceneName, ViewOutputs};
pub use post::PostFilter;
pub use preset::{PRESETS, QualityPreset};
pub use sunlight::{SunPassReport, SunlightOpts, SunlightReport, render_sunlight};
