use std::path::{Path, PathBuf};

/// Accelerad's GPU build of `rpict`.
pub const ACCELERAD_RPICT: &str = "accelerad_rpict";

/// Where the renderer binaries live and the `RAYPATH` they need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPaths {
    accelerad_bin: PathBuf,
    radiance_bin: PathBuf,
    raypath: String,
}

impl ToolPaths {
    /// Build from the two installation roots.
    pub fn new(accelerad_root: &Path, radiance_root: &Path, raypath: impl Into<String>) -> Self {
        Self {
            accelerad_bin: accelerad_root.join("bin"),
            radiance_bin: radiance_root.join("bin"),
            raypath: raypath.into(),
        }
    }

    /// Library search path handed to every renderer process.
    pub fn raypath(&self) -> &str {
        &self.raypath
    }

    /// Full path of the Accelerad renderer.
    pub fn accelerad_rpict(&self) -> PathBuf {
        self.accelerad_bin.join(exe_name(ACCELERAD_RPICT))
    }

    /// Radiance tool from the installation if present, otherwise a bare name for `PATH` lookup.
    pub fn radiance_tool(&self, name: &str) -> PathBuf {
        let installed = self.radiance_bin.join(exe_name(name));
        if installed.is_file() {
            installed
        } else {
            PathBuf::from(name)
        }
    }

    /// Environment every Radiance/Accelerad child receives.
    pub fn renderer_env(&self) -> Vec<(String, String)> {
        vec![("RAYPATH".to_string(), self.raypath.clone())]
    }
}

fn exe_name(name: &str) -> String {
    format!("{name}{}", std::env::consts::EXE_SUFFIX)
}
