//! Project paths, tool locations and their sources.
//!
//! Resolution order: built-in defaults, then an optional JSON file, then environment variables.
//! CLI flags are applied by the binary on top of the result.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{ArchilumeError, ArchilumeResult};

/// Directory conventions under the project root.
pub mod layout;
/// Renderer binary locations.
pub mod tools;

pub use layout::ProjectLayout;
pub use tools::ToolPaths;

/// File looked up in the project root when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "archilume.json";

/// On-disk configuration. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Project root holding `outputs/`.
    pub project_root: Option<PathBuf>,
    /// Accelerad installation root (contains `bin/` and `lib/`).
    pub accelerad_root: Option<PathBuf>,
    /// Radiance installation root (contains `bin/` and `lib/`).
    pub radiance_root: Option<PathBuf>,
    /// Explicit `RAYPATH`; derived from the roots when absent.
    pub raypath: Option<String>,
}

impl ConfigFile {
    /// Parse a JSON config file.
    pub fn from_path(path: &Path) -> ArchilumeResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        serde_json::from_str(&text).map_err(|e| {
            ArchilumeError::parse(format!("invalid config '{}': {e}", path.display()))
        })
    }
}

/// Resolved configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchilumeConfig {
    /// Project root holding `outputs/`.
    pub project_root: PathBuf,
    /// Accelerad installation root.
    pub accelerad_root: PathBuf,
    /// Radiance installation root.
    pub radiance_root: PathBuf,
    /// Explicit `RAYPATH` override.
    pub raypath: Option<String>,
}

impl ArchilumeConfig {
    /// Platform defaults for a project rooted at `project_root`.
    pub fn defaults_for(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let (accelerad_root, radiance_root) = if cfg!(windows) {
            (
                project_root
                    .join(".devcontainer")
                    .join("accelerad_07_beta_Windows"),
                PathBuf::from("C:/Radiance"),
            )
        } else {
            (
                PathBuf::from("/usr/local/accelerad"),
                PathBuf::from("/usr/local/radiance"),
            )
        };
        Self {
            project_root,
            accelerad_root,
            radiance_root,
            raypath: None,
        }
    }

    /// Load defaults, the config file and the process environment.
    ///
    /// `config_path` must exist when given; otherwise `<root>/archilume.json` is used if present.
    pub fn load(project_root: Option<&Path>, config_path: Option<&Path>) -> ArchilumeResult<Self> {
        let root = match project_root {
            Some(root) => root.to_path_buf(),
            None => std::env::current_dir().context("failed to read current directory")?,
        };
        let mut cfg = Self::defaults_for(&root);

        let file_path = match config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ArchilumeError::not_found("config file", path));
                }
                Some(path.to_path_buf())
            }
            None => Some(root.join(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };
        if let Some(path) = file_path {
            tracing::debug!(path = %path.display(), "loading config file");
            let file = ConfigFile::from_path(&path)?;
            cfg.apply_file(file, project_root.is_some());
        }

        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Overlay a config file. A pinned project root (from the CLI) is not replaced.
    pub fn apply_file(&mut self, file: ConfigFile, root_pinned: bool) {
        if let Some(root) = file.project_root
            && !root_pinned
        {
            self.project_root = root;
        }
        if let Some(root) = file.accelerad_root {
            self.accelerad_root = root;
        }
        if let Some(root) = file.radiance_root {
            self.radiance_root = root;
        }
        if file.raypath.is_some() {
            self.raypath = file.raypath;
        }
    }

    /// Overlay `ACCELERAD_ROOT`, `RADIANCE_ROOT` and `RAYPATH` from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("ACCELERAD_ROOT").filter(|v| !v.is_empty()) {
            self.accelerad_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("RADIANCE_ROOT").filter(|v| !v.is_empty()) {
            self.radiance_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("RAYPATH").filter(|v| !v.is_empty()) {
            self.raypath = Some(v);
        }
    }

    /// Effective `RAYPATH`: the override, or Accelerad's `lib` then Radiance's `lib`.
    pub fn raypath(&self) -> String {
        if let Some(raypath) = &self.raypath {
            return raypath.clone();
        }
        let sep = if cfg!(windows) { ";" } else { ":" };
        format!(
            "{}{sep}{}",
            self.accelerad_root.join("lib").display(),
            self.radiance_root.join("lib").display()
        )
    }

    /// Output directory layout.
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(&self.project_root)
    }

    /// Renderer locations.
    pub fn tools(&self) -> ToolPaths {
        ToolPaths::new(&self.accelerad_root, &self.radiance_root, self.raypath())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/mod.rs"]
mod tests;
