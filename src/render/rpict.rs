use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::process::CommandSpec;
use crate::render::preset::QualityPreset;

/// Square resolution of the ambient-only overture pass.
pub const OVERTURE_RESOLUTION: u32 = 64;

/// Direct-sun settings: no ambient bounces, so only sun and sky patches reach the image.
pub const DIRECT_SUN_FLAGS: [&str; 12] = [
    "-ab", "0", "-ad", "128", "-ar", "64", "-as", "64", "-ps", "2", "-lw", "0.005",
];

/// Everything needed to build the renderer command lines for one view.
#[derive(Clone, Debug)]
pub struct RpictCall {
    /// `rpict` or `accelerad_rpict`.
    pub program: PathBuf,
    /// Quality settings for the main pass.
    pub preset: QualityPreset,
    /// Camera file (`-vf`).
    pub view: PathBuf,
    /// Main-pass square resolution.
    pub resolution: u32,
    /// Worker threads (`-t`).
    pub threads: u32,
    /// Ambient cache (`-af`).
    pub ambient: PathBuf,
    /// Scene octree.
    pub octree: PathBuf,
    /// Environment for the child.
    pub envs: Vec<(String, String)>,
}

impl RpictCall {
    /// Ambient-only pass at 64×64 with halved `-ad`/`-as`. The image goes nowhere.
    pub fn overture_spec(&self) -> CommandSpec {
        self.spec(&self.preset.overture(), OVERTURE_RESOLUTION)
            .discard_stdout()
            .produces(&self.ambient)
    }

    /// Full-resolution pass writing the picture to `image`.
    pub fn main_spec(&self, image: &Path) -> CommandSpec {
        self.spec(&self.preset, self.resolution).stdout_to(image)
    }

    fn spec(&self, preset: &QualityPreset, resolution: u32) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(render_args(
                preset,
                &self.view,
                resolution,
                self.threads,
                &self.ambient,
                &self.octree,
            ))
            .envs(self.envs.iter().cloned())
    }
}

/// Renderer arguments:
/// `-w -t N -vf view -x r -y r <preset flags> -i -af ambient octree`.
pub fn render_args(
    preset: &QualityPreset,
    view: &Path,
    resolution: u32,
    threads: u32,
    ambient: &Path,
    octree: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-w".into(),
        "-t".into(),
        threads.to_string().into(),
        "-vf".into(),
        view.into(),
        "-x".into(),
        resolution.to_string().into(),
        "-y".into(),
        resolution.to_string().into(),
    ];
    args.extend(preset.to_args().into_iter().map(OsString::from));
    args.push("-i".into());
    args.push("-af".into());
    args.push(ambient.into());
    args.push(octree.into());
    args
}

/// `<program> -w -t N -vf view -x r -y r <direct-sun flags> octree > image`.
///
/// No ambient cache is read or written.
pub fn direct_sun_spec(
    program: &Path,
    view: &Path,
    resolution: u32,
    threads: u32,
    octree: &Path,
    image: &Path,
    envs: &[(String, String)],
) -> CommandSpec {
    let resolution = resolution.to_string();
    CommandSpec::new(program)
        .args(["-w", "-t"])
        .arg(threads.to_string())
        .arg("-vf")
        .arg(view)
        .args(["-x", resolution.as_str(), "-y", resolution.as_str()])
        .args(DIRECT_SUN_FLAGS)
        .arg(octree)
        .envs(envs.iter().cloned())
        .stdout_to(image)
}

#[cfg(test)]
#[path = "../../tests/unit/render/rpict.rs"]
mod tests;
