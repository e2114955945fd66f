//! Wavefront MTL to Radiance material library.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ArchilumeError, ArchilumeResult};
use crate::process::ensure_parent_dir;

/// File name of the combined library under `outputs/rad`.
pub const MATERIAL_LIBRARY_FILE: &str = "materials.mtl";

const LIBRARY_HEADER: &str = "# Radiance Material Library";
const PLASTIC_ROUGHNESS: f64 = 0.05;
const DEFAULT_GREY: [f64; 3] = [0.5, 0.5, 0.5];

/// The parts of an MTL `newmtl` block this converter reads.
#[derive(Clone, Debug, PartialEq)]
pub struct MtlMaterial {
    /// `newmtl` name; becomes the Radiance identifier.
    pub name: String,
    /// Diffuse colour (`Kd`).
    pub diffuse: [f64; 3],
    /// Opacity (`d`, or `1 - Tr`). 1 is opaque.
    pub dissolve: f64,
}

/// Parse every `newmtl` block. Unknown statements are ignored.
pub fn parse_mtl(text: &str) -> Vec<MtlMaterial> {
    let mut materials: Vec<MtlMaterial> = Vec::new();
    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        if keyword == "newmtl" {
            if let Some(name) = tokens.next() {
                materials.push(MtlMaterial {
                    name: name.to_string(),
                    diffuse: DEFAULT_GREY,
                    dissolve: 1.0,
                });
            }
            continue;
        }
        let Some(current) = materials.last_mut() else {
            continue;
        };
        let values: Vec<f64> = tokens.filter_map(|t| t.parse().ok()).collect();
        match (keyword, values.as_slice()) {
            ("Kd", [r, g, b, ..]) => current.diffuse = [*r, *g, *b],
            ("d", [d, ..]) => current.dissolve = *d,
            ("Tr", [tr, ..]) => current.dissolve = 1.0 - *tr,
            _ => {}
        }
    }
    materials
}

/// Radiance material primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum RadianceMaterial {
    /// `void plastic <name>` with `5 r g b specularity roughness`.
    Plastic {
        /// Identifier.
        name: String,
        /// Reflectance.
        rgb: [f64; 3],
        /// Specular fraction.
        specularity: f64,
        /// Surface roughness.
        roughness: f64,
    },
    /// `void glass <name>` with `3 r g b` transmissivity.
    Glass {
        /// Identifier.
        name: String,
        /// Transmissivity.
        rgb: [f64; 3],
    },
}

impl RadianceMaterial {
    /// Glass when partly transparent, plastic otherwise.
    pub fn from_mtl(m: &MtlMaterial) -> Self {
        if m.dissolve < 1.0 {
            Self::Glass {
                name: m.name.clone(),
                rgb: m.diffuse,
            }
        } else {
            Self::Plastic {
                name: m.name.clone(),
                rgb: m.diffuse,
                specularity: 0.0,
                roughness: PLASTIC_ROUGHNESS,
            }
        }
    }

    /// Grey plastic for modifiers that have no definition.
    pub fn default_for(name: &str) -> Self {
        Self::Plastic {
            name: name.to_string(),
            rgb: DEFAULT_GREY,
            specularity: 0.0,
            roughness: 0.0,
        }
    }

    /// Identifier.
    pub fn name(&self) -> &str {
        match self {
            Self::Plastic { name, .. } | Self::Glass { name, .. } => name,
        }
    }

    /// Radiance scene text, preceded by a `# <name>` comment.
    pub fn to_rad(&self) -> String {
        match self {
            Self::Plastic {
                name,
                rgb: [r, g, b],
                specularity,
                roughness,
            } => format!(
                "# {name}\nvoid plastic {name}\n0\n0\n5 {r:.3} {g:.3} {b:.3} {specularity:.3} {roughness:.3}\n"
            ),
            Self::Glass {
                name,
                rgb: [r, g, b],
            } => format!("# {name}\nvoid glass {name}\n0\n0\n3 {r:.3} {g:.3} {b:.3}\n"),
        }
    }
}

/// Modifiers referenced by a Radiance scene and identifiers it defines itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RadSymbols {
    /// Modifier names other than `void`.
    pub referenced: BTreeSet<String>,
    /// Primitive identifiers.
    pub defined: BTreeSet<String>,
}

/// Walk primitives `modifier type id  n str...  n int...  n real...`.
///
/// Comment lines and `!command` lines are skipped.
pub fn scan_rad(text: &str) -> ArchilumeResult<RadSymbols> {
    let mut tokens = text
        .lines()
        .map(str::trim_start)
        .filter(|l| !l.starts_with('#') && !l.starts_with('!'))
        .flat_map(str::split_whitespace);

    let mut symbols = RadSymbols::default();
    while let Some(modifier) = tokens.next() {
        let (Some(_kind), Some(id)) = (tokens.next(), tokens.next()) else {
            return Err(ArchilumeError::parse(format!(
                "truncated primitive after modifier '{modifier}'"
            )));
        };
        if modifier != "void" {
            symbols.referenced.insert(modifier.to_string());
        }
        symbols.defined.insert(id.to_string());
        for section in ["string", "integer", "real"] {
            let count: usize = tokens
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| {
                    ArchilumeError::parse(format!("missing {section} argument count for '{id}'"))
                })?;
            for _ in 0..count {
                if tokens.next().is_none() {
                    return Err(ArchilumeError::parse(format!(
                        "'{id}' ends before its {section} arguments"
                    )));
                }
            }
        }
    }
    Ok(symbols)
}

/// Combined material library.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialLibrary {
    /// Definitions converted from MTL, first occurrence of a name wins.
    pub materials: Vec<RadianceMaterial>,
    /// Modifiers that received the default grey plastic.
    pub defaults: Vec<String>,
}

impl MaterialLibrary {
    /// Convert the MTL materials the scene references and fill in modifiers nothing defines.
    pub fn build(mtl: &[MtlMaterial], scene: &RadSymbols) -> Self {
        Self::assemble(mtl, scene, true)
    }

    /// Like [`MaterialLibrary::build`] but keeps MTL materials no scanned primitive uses.
    ///
    /// For scenes where some RAD files could not be scanned.
    pub fn build_keeping_unreferenced(mtl: &[MtlMaterial], scene: &RadSymbols) -> Self {
        Self::assemble(mtl, scene, false)
    }

    fn assemble(mtl: &[MtlMaterial], scene: &RadSymbols, referenced_only: bool) -> Self {
        let mut seen = BTreeSet::new();
        let materials: Vec<_> = mtl
            .iter()
            .filter(|m| !referenced_only || scene.referenced.contains(&m.name))
            .filter(|m| seen.insert(m.name.clone()))
            .map(RadianceMaterial::from_mtl)
            .collect();
        let defaults = scene
            .referenced
            .iter()
            .filter(|name| !seen.contains(*name) && !scene.defined.contains(*name))
            .cloned()
            .collect();
        Self {
            materials,
            defaults,
        }
    }

    /// Library file text.
    pub fn to_rad(&self) -> String {
        let mut out = format!("{LIBRARY_HEADER}\n");
        for m in &self.materials {
            let _ = write!(out, "\n{}", m.to_rad());
        }
        if !self.defaults.is_empty() {
            out.push_str("\n# Default materials added for missing modifiers\n");
            for name in &self.defaults {
                let _ = write!(out, "\n{}", RadianceMaterial::default_for(name).to_rad());
            }
        }
        out
    }
}

/// Read MTL and RAD files, write the combined library to `out`.
///
/// Only materials the RAD files use are written. When a RAD file cannot be scanned its modifiers
/// are unknown, so every MTL material is kept and that file gets no default fill-in.
pub fn write_material_library(
    mtl_paths: &[impl AsRef<Path>],
    rad_paths: &[impl AsRef<Path>],
    out: &Path,
) -> ArchilumeResult<MaterialLibrary> {
    let mut mtl = Vec::new();
    for path in mtl_paths {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read MTL '{}'", path.display()))?;
        mtl.extend(parse_mtl(&text));
    }

    let mut scene = RadSymbols::default();
    let mut unscanned = 0usize;
    for path in rad_paths {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read RAD '{}'", path.display()))?;
        match scan_rad(&text) {
            Ok(symbols) => {
                scene.referenced.extend(symbols.referenced);
                scene.defined.extend(symbols.defined);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "skipping modifier scan: {e}");
                unscanned += 1;
            }
        }
    }

    let library = if unscanned == 0 {
        MaterialLibrary::build(&mtl, &scene)
    } else {
        MaterialLibrary::build_keeping_unreferenced(&mtl, &scene)
    };
    ensure_parent_dir(out)?;
    std::fs::write(out, library.to_rad())
        .with_context(|| format!("failed to write '{}'", out.display()))?;
    if !library.defaults.is_empty() {
        tracing::warn!(
            missing = ?library.defaults,
            "modifiers without a material definition got default grey plastic"
        );
    }
    tracing::info!(
        materials = library.materials.len(),
        defaults = library.defaults.len(),
        path = %out.display(),
        "material library written"
    );
    Ok(library)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/materials.rs"]
mod tests;
