use std::path::{Path, PathBuf};

/// Separator between building and site/sky parts of an octree name.
pub const SITE_DELIMITER: &str = "_with_site_";

/// Suffix added to the stem of a post-filtered image.
pub const FILTERED_SUFFIX: &str = "_filtered";
/// Suffix of a direct-sun image merged with its overcast image.
pub const COMBINED_SUFFIX: &str = "_combined";
/// Suffix of the unfiltered sum written before the final merge filter.
pub const SUM_SUFFIX: &str = "_sum";

/// Octree name, split into building and sky parts when it follows the `_with_site_` convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneName {
    /// `<building>_with_site_<sky>`, both sides non-empty. Split at the last delimiter.
    Split {
        /// Part before the delimiter.
        building: String,
        /// Part after the delimiter.
        sky: String,
    },
    /// Anything else; the whole name is used as is.
    Plain(String),
}

impl SceneName {
    /// Parse an octree base name.
    pub fn parse(scene: &str) -> Self {
        match scene.rsplit_once(SITE_DELIMITER) {
            Some((building, sky)) if !building.is_empty() && !sky.is_empty() => Self::Split {
                building: building.to_string(),
                sky: sky.to_string(),
            },
            _ => Self::Plain(scene.to_string()),
        }
    }

    /// `true` for [`SceneName::Split`].
    pub fn is_split(&self) -> bool {
        matches!(self, Self::Split { .. })
    }

    /// Ambient cache file name for `view`.
    pub fn ambient_file_name(&self, view: &str) -> String {
        match self {
            Self::Split { building, sky } => {
                format!("{building}{SITE_DELIMITER}{view}__{sky}.amb")
            }
            Self::Plain(scene) => format!("{scene}_{view}.amb"),
        }
    }

    /// Image file name for `view`.
    pub fn image_file_name(&self, view: &str) -> String {
        match self {
            Self::Split { building, sky } => format!("{building}_{view}__{sky}.hdr"),
            Self::Plain(scene) => format!("{scene}_{view}.hdr"),
        }
    }

    /// All output paths for `view` under `image_dir`.
    pub fn outputs(&self, image_dir: &Path, view: &str) -> ViewOutputs {
        let image = image_dir.join(self.image_file_name(view));
        ViewOutputs {
            ambient: image_dir.join(self.ambient_file_name(view)),
            filtered: filtered_path(&image),
            image,
        }
    }
}

/// Paths one view of a batch reads or writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewOutputs {
    /// Ambient cache, shared by the overture and main pass.
    pub ambient: PathBuf,
    /// Main pass image.
    pub image: PathBuf,
    /// Half-resolution copy written for high-resolution renders.
    pub filtered: PathBuf,
}

/// `<stem>_filtered.hdr` next to `image`.
pub fn filtered_path(image: &Path) -> PathBuf {
    suffixed_hdr(image, FILTERED_SUFFIX)
}

/// `<stem>_combined.hdr` next to `image`.
pub fn combined_path(image: &Path) -> PathBuf {
    suffixed_hdr(image, COMBINED_SUFFIX)
}

/// `<stem>_sum.hdr` next to `image`.
pub fn sum_path(image: &Path) -> PathBuf {
    suffixed_hdr(image, SUM_SUFFIX)
}

/// Direct-sun image name: `<base>_<view>_<sky>.hdr`, with `base` the skyless octree stem
/// minus `_skyless`.
pub fn sun_image_file_name(base: &str, view: &str, sky: &str) -> String {
    format!("{base}_{view}_{sky}.hdr")
}

fn suffixed_hdr(image: &Path, suffix: &str) -> PathBuf {
    image.with_file_name(format!("{}{suffix}.hdr", stem_of(image)))
}

/// File stem as a `String`; empty when the path has none.
pub fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/render/naming.rs"]
mod tests;
