use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{ArchilumeError, ArchilumeResult};

/// Monte-Carlo direct-lighting sampling parameters (`-dj -ds -dt -dc -dr -dp`).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct DirectSampling {
    /// Source jitter (`-dj`).
    pub jitter: f64,
    /// Source substructuring (`-ds`).
    pub substructure: f64,
    /// Direct threshold (`-dt`).
    pub threshold: f64,
    /// Direct certainty (`-dc`).
    pub certainty: f64,
    /// Relays (`-dr`).
    pub relays: u32,
    /// Pretest density (`-dp`).
    pub pretest_density: u32,
}

/// Named renderer accuracy/performance settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct QualityPreset {
    /// Lower-case preset name.
    pub name: &'static str,
    /// `-aa`
    pub ambient_accuracy: f64,
    /// `-ab`
    pub ambient_bounces: u32,
    /// `-ad`
    pub ambient_divisions: u32,
    /// `-as`
    pub ambient_super_samples: u32,
    /// `-ar`
    pub ambient_resolution: u32,
    /// `-ps`
    pub pixel_sample: u32,
    /// `-pt`
    pub pixel_threshold: f64,
    /// `-lr`
    pub limit_reflection: i32,
    /// `-lw`
    pub limit_weight: f64,
    /// Optional direct sampling block.
    pub direct: Option<DirectSampling>,
}

const fn direct(
    jitter: f64,
    substructure: f64,
    threshold: f64,
    certainty: f64,
    relays: u32,
    pretest_density: u32,
) -> Option<DirectSampling> {
    Some(DirectSampling {
        jitter,
        substructure,
        threshold,
        certainty,
        relays,
        pretest_density,
    })
}

#[allow(clippy::too_many_arguments)]
const fn preset(
    name: &'static str,
    aa: f64,
    ab: u32,
    ad: u32,
    as_: u32,
    ar: u32,
    ps: u32,
    pt: f64,
    lr: i32,
    lw: f64,
    direct: Option<DirectSampling>,
) -> QualityPreset {
    QualityPreset {
        name,
        ambient_accuracy: aa,
        ambient_bounces: ab,
        ambient_divisions: ad,
        ambient_super_samples: as_,
        ambient_resolution: ar,
        pixel_sample: ps,
        pixel_threshold: pt,
        limit_reflection: lr,
        limit_weight: lw,
        direct,
    }
}

/// The closed preset table, in display order.
#[rustfmt::skip]
pub const PRESETS: [QualityPreset; 10] = [
    //      name        aa    ab  ad    as    ar    ps  pt    lr  lw
    preset("draft",    0.01, 3, 2048, 1024, 1024, 4, 0.15, 5,  0.001,  direct(0.0, 0.25, 0.50, 0.25, 0, 512)),
    preset("stand",    0.01, 3, 1792, 896,  1024, 2, 0.12, 5,  0.001,  direct(0.5, 0.35, 0.35, 0.40, 1, 256)),
    preset("prod",     0.01, 3, 1536, 768,  1024, 2, 0.10, 5,  0.001,  direct(0.7, 0.50, 0.25, 0.50, 1, 256)),
    preset("final",    0.01, 3, 1280, 640,  1024, 1, 0.07, 5,  0.001,  direct(0.9, 0.70, 0.15, 0.75, 2, 128)),
    preset("4k",       0.02, 3, 1024, 512,  1024, 1, 0.05, 5,  0.001,  direct(1.0, 0.90, 0.05, 0.90, 3, 64)),
    preset("custom",   0.01, 8, 2048, 1024, 1024, 1, 0.05, 12, 0.0001, direct(0.7, 0.50, 0.25, 0.50, 1, 256)),
    preset("fast",     0.06, 3, 512,  256,  128,  2, 0.10, 12, 0.001,  None),
    preset("med",      0.03, 3, 1024, 512,  256,  2, 0.08, 12, 0.001,  None),
    preset("high",     0.01, 3, 1536, 512,  512,  1, 0.05, 12, 0.001,  None),
    preset("detailed", 0.0,  2, 2048, 1024, 1024, 1, 0.02, 12, 0.0001, None),
];

impl QualityPreset {
    /// Case-insensitive lookup in [`PRESETS`].
    pub fn lookup(name: &str) -> ArchilumeResult<Self> {
        let wanted = name.trim();
        PRESETS
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| ArchilumeError::UnknownPreset {
                name: name.to_string(),
                valid: preset_names().join(", "),
            })
    }

    /// Same settings with ambient divisions and super-samples halved, for the overture pass.
    pub fn overture(&self) -> Self {
        Self {
            ambient_divisions: self.ambient_divisions / 2,
            ambient_super_samples: self.ambient_super_samples / 2,
            ..*self
        }
    }

    /// Renderer flags in the order the renderer documents them.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-aa".to_string(),
            self.ambient_accuracy.to_string(),
            "-ab".to_string(),
            self.ambient_bounces.to_string(),
            "-ad".to_string(),
            self.ambient_divisions.to_string(),
            "-as".to_string(),
            self.ambient_super_samples.to_string(),
            "-ar".to_string(),
            self.ambient_resolution.to_string(),
            "-ps".to_string(),
            self.pixel_sample.to_string(),
            "-pt".to_string(),
            self.pixel_threshold.to_string(),
            "-lr".to_string(),
            self.limit_reflection.to_string(),
            "-lw".to_string(),
            self.limit_weight.to_string(),
        ];
        if let Some(d) = self.direct {
            for (flag, value) in [
                ("-dj", d.jitter.to_string()),
                ("-ds", d.substructure.to_string()),
                ("-dt", d.threshold.to_string()),
                ("-dc", d.certainty.to_string()),
                ("-dr", d.relays.to_string()),
                ("-dp", d.pretest_density.to_string()),
            ] {
                args.push(flag.to_string());
                args.push(value);
            }
        }
        args
    }
}

impl FromStr for QualityPreset {
    type Err = ArchilumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Accepted preset names in table order.
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/preset.rs"]
mod tests;
