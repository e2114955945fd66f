use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::{ProjectLayout, ToolPaths, layout::OCTREE_EXT};
use crate::foundation::error::{ArchilumeError, ArchilumeResult};
use crate::process::{CommandRunner, CommandSpec};
use crate::render::naming::{SITE_DELIMITER, stem_of};
use crate::scene::materials::{MATERIAL_LIBRARY_FILE, MaterialLibrary, write_material_library};

/// Suffix marking an octree compiled without a sky.
pub const SKYLESS_SUFFIX: &str = "_skyless";

/// `<building>_with_site_skyless`, the octree name that sky octrees and the batch driver split.
pub fn skyless_octree_name(building: &str) -> String {
    format!("{building}{SITE_DELIMITER}skyless")
}

/// Octree stem with a trailing `_skyless` removed.
pub fn skyless_base(skyless: &Path) -> String {
    let stem = stem_of(skyless);
    match stem.strip_suffix(SKYLESS_SUFFIX) {
        Some(base) => base.to_string(),
        None => stem,
    }
}

/// `obj2rad <obj> > <rad>`
pub fn obj2rad_spec(
    program: &Path,
    obj: &Path,
    rad: &Path,
    envs: &[(String, String)],
) -> CommandSpec {
    CommandSpec::new(program)
        .arg(obj)
        .envs(envs.iter().cloned())
        .stdout_to(rad)
}

/// `oconv -f <materials> <rads...> > <octree>`
pub fn oconv_scene_spec(
    program: &Path,
    materials: &Path,
    rads: &[PathBuf],
    octree: &Path,
    envs: &[(String, String)],
) -> CommandSpec {
    CommandSpec::new(program)
        .arg("-f")
        .arg(materials)
        .args(rads)
        .envs(envs.iter().cloned())
        .stdout_to(octree)
}

/// `oconv -i <skyless> <sky> > <octree>`
pub fn oconv_sky_spec(
    program: &Path,
    skyless: &Path,
    sky: &Path,
    octree: &Path,
    envs: &[(String, String)],
) -> CommandSpec {
    CommandSpec::new(program)
        .arg("-i")
        .arg(skyless)
        .arg(sky)
        .envs(envs.iter().cloned())
        .stdout_to(octree)
}

/// `<base>_<sky-stem>.oct` beside `skyless`, where base drops a trailing `_skyless`.
pub fn sky_octree_path(skyless: &Path, sky: &Path) -> PathBuf {
    skyless.with_file_name(format!(
        "{}_{}.{OCTREE_EXT}",
        skyless_base(skyless),
        stem_of(sky)
    ))
}

fn require_files(what: &'static str, paths: &[PathBuf]) -> ArchilumeResult<()> {
    match paths.iter().find(|p| !p.is_file()) {
        Some(missing) => Err(ArchilumeError::not_found(what, missing)),
        None => Ok(()),
    }
}

fn run_to_file(runner: &dyn CommandRunner, spec: &CommandSpec, out: &Path) -> ArchilumeResult<()> {
    if let Err(e) = runner.run_checked(spec) {
        if out.exists() {
            let _ = std::fs::remove_file(out);
        }
        return Err(e);
    }
    Ok(())
}

/// Convert OBJ files to RAD in `rad_dir`, in parallel. Output order follows `objs`.
pub fn convert_objs(
    runner: &dyn CommandRunner,
    tools: &ToolPaths,
    objs: &[PathBuf],
    rad_dir: &Path,
) -> ArchilumeResult<Vec<PathBuf>> {
    require_files("OBJ file", objs)?;
    let program = tools.radiance_tool("obj2rad");
    let envs = tools.renderer_env();
    objs.par_iter()
        .map(|obj| {
            let rad = rad_dir.join(format!("{}.rad", stem_of(obj)));
            run_to_file(runner, &obj2rad_spec(&program, obj, &rad, &envs), &rad)?;
            tracing::info!(obj = %obj.display(), rad = %rad.display(), "converted");
            Ok(rad)
        })
        .collect()
}

/// Result of [`compile_scene_octree`].
#[derive(Clone, Debug)]
pub struct SceneOctree {
    /// Converted geometry. Empty when the octree was reused.
    pub rad_files: Vec<PathBuf>,
    /// Material library path.
    pub materials_path: PathBuf,
    /// Material library content. Empty when the octree was reused.
    pub materials: MaterialLibrary,
    /// Skyless octree, `<first-obj-stem>_with_site_skyless.oct`.
    pub octree: PathBuf,
    /// The octree already existed and nothing ran.
    pub reused: bool,
}

/// OBJ/MTL → RAD → material library → skyless octree named after the first OBJ.
///
/// An existing octree of that name is kept as is.
#[tracing::instrument(skip_all, fields(objs = objs.len()))]
pub fn compile_scene_octree(
    runner: &dyn CommandRunner,
    layout: &ProjectLayout,
    tools: &ToolPaths,
    objs: &[PathBuf],
    mtls: &[PathBuf],
) -> ArchilumeResult<SceneOctree> {
    let Some(first) = objs.first() else {
        return Err(ArchilumeError::validation("at least one OBJ file is required"));
    };
    let rad_dir = layout.rad_dir();
    let materials_path = rad_dir.join(MATERIAL_LIBRARY_FILE);
    let octree = layout.octree_path(&skyless_octree_name(&stem_of(first)));

    if octree.is_file() {
        tracing::info!(octree = %octree.display(), "skyless octree exists; skipping");
        return Ok(SceneOctree {
            rad_files: Vec::new(),
            materials_path,
            materials: MaterialLibrary::default(),
            octree,
            reused: true,
        });
    }
    require_files("MTL file", mtls)?;

    let rad_files = convert_objs(runner, tools, objs, &rad_dir)?;
    let materials = write_material_library(mtls, &rad_files, &materials_path)?;

    let spec = oconv_scene_spec(
        &tools.radiance_tool("oconv"),
        &materials_path,
        &rad_files,
        &octree,
        &tools.renderer_env(),
    );
    run_to_file(runner, &spec, &octree)?;
    tracing::info!(octree = %octree.display(), "scene octree compiled");

    Ok(SceneOctree {
        rad_files,
        materials_path,
        materials,
        octree,
        reused: false,
    })
}

/// Add one sky to a skyless octree, writing [`sky_octree_path`].
pub fn compile_sky_octree(
    runner: &dyn CommandRunner,
    tools: &ToolPaths,
    skyless: &Path,
    sky: &Path,
) -> ArchilumeResult<PathBuf> {
    if !skyless.is_file() {
        return Err(ArchilumeError::not_found("skyless octree", skyless));
    }
    if !sky.is_file() {
        return Err(ArchilumeError::not_found("sky file", sky));
    }
    let octree = sky_octree_path(skyless, sky);
    let spec = oconv_sky_spec(
        &tools.radiance_tool("oconv"),
        skyless,
        sky,
        &octree,
        &tools.renderer_env(),
    );
    run_to_file(runner, &spec, &octree)?;
    tracing::info!(octree = %octree.display(), "sky octree compiled");
    Ok(octree)
}

/// Add each sky to a skyless octree. Returns the new octrees in input order.
pub fn compile_sky_octrees(
    runner: &dyn CommandRunner,
    tools: &ToolPaths,
    skyless: &Path,
    skies: &[PathBuf],
) -> ArchilumeResult<Vec<PathBuf>> {
    if !skyless.is_file() {
        return Err(ArchilumeError::not_found("skyless octree", skyless));
    }
    require_files("sky file", skies)?;
    skies
        .iter()
        .map(|sky| compile_sky_octree(runner, tools, skyless, sky))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/scene/octree.rs"]
mod tests;
