//! Render inputs: skies, camera views, materials and octrees.

/// MTL conversion and missing-modifier defaults.
pub mod materials;
/// `obj2rad`/`oconv` orchestration.
pub mod octree;
/// Sunny and overcast sky files.
pub mod sky;
/// AOI and plan view files from room boundaries.
pub mod view;

pub use octree::{SceneOctree, compile_scene_octree, compile_sky_octree, compile_sky_octrees};
pub use sky::{SunnySkySeries, write_overcast_sky};
pub use view::{GeneratedViews, generate_views};
