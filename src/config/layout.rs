use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::ArchilumeResult;

/// Extension of compiled scene files.
pub const OCTREE_EXT: &str = "oct";
/// Extension of view parameter files.
pub const VIEW_EXT: &str = "vp";

/// Directory conventions under a project root.
///
/// ```text
/// <root>/outputs/octree/<name>.oct
/// <root>/outputs/view/<name>.vp
/// <root>/outputs/image/<name>.hdr | .amb
/// <root>/outputs/sky, rad, aoi
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/outputs`.
    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    /// Compiled scenes.
    pub fn octree_dir(&self) -> PathBuf {
        self.outputs_dir().join("octree")
    }

    /// Camera definitions.
    pub fn view_dir(&self) -> PathBuf {
        self.outputs_dir().join("view")
    }

    /// Rendered images and ambient caches.
    pub fn image_dir(&self) -> PathBuf {
        self.outputs_dir().join("image")
    }

    /// Sky definitions.
    pub fn sky_dir(&self) -> PathBuf {
        self.outputs_dir().join("sky")
    }

    /// Converted geometry and the material library.
    pub fn rad_dir(&self) -> PathBuf {
        self.outputs_dir().join("rad")
    }

    /// Area-of-interest point files.
    pub fn aoi_dir(&self) -> PathBuf {
        self.outputs_dir().join("aoi")
    }

    /// `<octree_dir>/<name>.oct`.
    pub fn octree_path(&self, name: &str) -> PathBuf {
        self.octree_dir().join(format!("{name}.{OCTREE_EXT}"))
    }

    /// `<view_dir>/<name>.vp`.
    pub fn view_path(&self, name: &str) -> PathBuf {
        self.view_dir().join(format!("{name}.{VIEW_EXT}"))
    }

    /// Create every output directory.
    pub fn ensure_output_dirs(&self) -> ArchilumeResult<()> {
        for dir in [
            self.octree_dir(),
            self.view_dir(),
            self.image_dir(),
            self.sky_dir(),
            self.rad_dir(),
            self.aoi_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create '{}'", dir.display()))?;
        }
        Ok(())
    }
}
