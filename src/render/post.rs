//! Image post-processing: half-resolution filtering and PNG previews.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

use image::codecs::hdr::HdrEncoder;
use image::{Rgb, Rgb32FImage, RgbImage};

use crate::foundation::error::{ArchilumeError, ArchilumeResult};
use crate::process::{CommandRunner, CommandSpec, ensure_parent_dir};

/// Gamma applied by [`hdr_to_png`].
pub const DISPLAY_GAMMA: f32 = 2.2;

/// How high-resolution images are reduced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PostFilter {
    /// Radiance `pfilt -1 -x /2 -y /2`.
    #[default]
    Pfilt,
    /// In-process 2×2 box average.
    Native,
}

impl FromStr for PostFilter {
    type Err = ArchilumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pfilt" => Ok(Self::Pfilt),
            "native" => Ok(Self::Native),
            other => Err(ArchilumeError::validation(format!(
                "unknown post filter '{other}' (valid: pfilt, native)"
            ))),
        }
    }
}

impl fmt::Display for PostFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pfilt => "pfilt",
            Self::Native => "native",
        })
    }
}

/// `pfilt -1 -x /2 -y /2 <image> > <filtered>`.
pub fn pfilt_spec(
    program: &Path,
    image: &Path,
    filtered: &Path,
    envs: &[(String, String)],
) -> CommandSpec {
    CommandSpec::new(program)
        .args(["-1", "-x", "/2", "-y", "/2"])
        .arg(image)
        .envs(envs.iter().cloned())
        .stdout_to(filtered)
}

/// Per-channel sum of two pictures, as a `pcomb` expression.
pub const PCOMB_SUM_EXPR: &str = "ro=ri(1)+ri(2);go=gi(1)+gi(2);bo=bi(1)+bi(2)";

/// `pcomb -e <sum> <first> <second> > <out>`.
pub fn pcomb_sum_spec(
    program: &Path,
    first: &Path,
    second: &Path,
    out: &Path,
    envs: &[(String, String)],
) -> CommandSpec {
    CommandSpec::new(program)
        .args(["-e", PCOMB_SUM_EXPR])
        .arg(first)
        .arg(second)
        .envs(envs.iter().cloned())
        .stdout_to(out)
}

/// `pfilt -1 <image> > <out>`: one-pass exposure normalisation at full size.
pub fn pfilt_exposure_spec(
    program: &Path,
    image: &Path,
    out: &Path,
    envs: &[(String, String)],
) -> CommandSpec {
    CommandSpec::new(program)
        .arg("-1")
        .arg(image)
        .envs(envs.iter().cloned())
        .stdout_to(out)
}

/// Run `filter` on `image`, writing `filtered`. The caller owns cleanup on failure.
pub fn apply_post_filter(
    filter: PostFilter,
    runner: &dyn CommandRunner,
    pfilt: &Path,
    envs: &[(String, String)],
    image: &Path,
    filtered: &Path,
) -> ArchilumeResult<()> {
    match filter {
        PostFilter::Pfilt => {
            runner.run_checked(&pfilt_spec(pfilt, image, filtered, envs))?;
        }
        PostFilter::Native => {
            let (w, h) = downsample_hdr(image, filtered)?;
            tracing::debug!(width = w, height = h, "native half-resolution filter");
        }
    }
    Ok(())
}

/// Average 2×2 pixel blocks. Odd trailing rows/columns are dropped, as `pfilt` does.
pub fn box_downsample(src: &Rgb32FImage) -> Rgb32FImage {
    let w = (src.width() / 2).max(1);
    let h = (src.height() / 2).max(1);
    Rgb32FImage::from_fn(w, h, |x, y| {
        let mut sum = [0.0f32; 3];
        let mut n = 0.0f32;
        for dy in 0..2 {
            for dx in 0..2 {
                let sx = x * 2 + dx;
                let sy = y * 2 + dy;
                if sx < src.width() && sy < src.height() {
                    for (s, v) in sum.iter_mut().zip(src.get_pixel(sx, sy).0) {
                        *s += v;
                    }
                    n += 1.0;
                }
            }
        }
        Rgb([sum[0] / n, sum[1] / n, sum[2] / n])
    })
}

/// Read a Radiance HDR file as linear RGB.
pub fn read_hdr(path: &Path) -> ArchilumeResult<Rgb32FImage> {
    if !path.is_file() {
        return Err(ArchilumeError::not_found("image", path));
    }
    let img = image::open(path)
        .map_err(|e| ArchilumeError::image(format!("failed to decode '{}': {e}", path.display())))?;
    Ok(img.into_rgb32f())
}

/// Write linear RGB as a Radiance HDR file.
pub fn write_hdr(path: &Path, img: &Rgb32FImage) -> ArchilumeResult<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path)?;
    let pixels: Vec<Rgb<f32>> = img.pixels().copied().collect();
    HdrEncoder::new(BufWriter::new(file))
        .encode(&pixels, img.width() as usize, img.height() as usize)
        .map_err(|e| ArchilumeError::image(format!("failed to encode '{}': {e}", path.display())))
}

/// Half-resolution copy of an HDR file. Returns the new dimensions.
pub fn downsample_hdr(src: &Path, dst: &Path) -> ArchilumeResult<(u32, u32)> {
    let out = box_downsample(&read_hdr(src)?);
    write_hdr(dst, &out)?;
    Ok(out.dimensions())
}

/// Map a linear value to 8 bits with exposure scaling and display gamma.
pub fn tone_map(value: f32, scale: f32) -> u8 {
    let v = (value * scale).clamp(0.0, 1.0);
    (v.powf(1.0 / DISPLAY_GAMMA) * 255.0).round() as u8
}

/// Tone-map an HDR image to PNG. `exposure` is in stops (+1 doubles brightness).
pub fn hdr_to_png(src: &Path, dst: &Path, exposure: f32) -> ArchilumeResult<()> {
    let hdr = read_hdr(src)?;
    let scale = exposure.exp2();
    let png = RgbImage::from_fn(hdr.width(), hdr.height(), |x, y| {
        let p = hdr.get_pixel(x, y);
        Rgb([
            tone_map(p[0], scale),
            tone_map(p[1], scale),
            tone_map(p[2], scale),
        ])
    });
    ensure_parent_dir(dst)?;
    png.save_with_format(dst, image::ImageFormat::Png)
        .map_err(|e| ArchilumeError::image(format!("failed to write '{}': {e}", dst.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/render/post.rs"]
mod tests;
