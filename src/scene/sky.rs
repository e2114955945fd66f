use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{ArchilumeError, ArchilumeResult};

/// File name of the CIE overcast sky.
pub const OVERCAST_SKY_FILE: &str = "TenK_cie_overcast.rad";

/// `gensky` line of the 10k lux CIE overcast sky.
pub const OVERCAST_GENSKY: &str = "!gensky -ang 45 0 -c -B 55.8659217877";

const SKY_HEADER: &str = "#Radiance sky file: archilume";

const GLOW_DEFINITIONS: &str = "\
skyfunc glow skyglow
0 0
4 0.7 0.8 1.0 0
skyglow source sky
0 0
4 0 0 1 180

skyfunc glow grndglow
0 0
4 0.20 0.20 0.20 0
grndglow source ground
0 0
4 0 0 -1 180
";

fn sky_file(gensky: &str) -> String {
    format!("{SKY_HEADER}\n\n{gensky}\n\n{GLOW_DEFINITIONS}")
}

/// Days in `month`; February allows the 29th because no year is involved.
fn days_in_month(month: u32) -> u32 {
    match month {
        2 => 29,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// A day of sunny skies at a fixed minute step, in solar time.
#[derive(Clone, Debug, PartialEq)]
pub struct SunnySkySeries {
    /// Decimal degrees, positive north.
    pub latitude: f64,
    /// 1..=12
    pub month: u32,
    /// Day of month.
    pub day: u32,
    /// First hour, inclusive.
    pub start_hour: u32,
    /// Last hour, inclusive (at minute 0).
    pub end_hour: u32,
    /// Minutes between skies.
    pub minute_step: u32,
}

impl SunnySkySeries {
    /// Check ranges before anything is written.
    pub fn validate(&self) -> ArchilumeResult<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ArchilumeError::validation(format!(
                "latitude {} outside -90..=90",
                self.latitude
            )));
        }
        if !(1..=12).contains(&self.month) {
            return Err(ArchilumeError::validation(format!(
                "month {} outside 1..=12",
                self.month
            )));
        }
        if self.day == 0 || self.day > days_in_month(self.month) {
            return Err(ArchilumeError::validation(format!(
                "day {} is not valid for month {}",
                self.day, self.month
            )));
        }
        if self.end_hour > 23 || self.start_hour > self.end_hour {
            return Err(ArchilumeError::validation(format!(
                "hours must satisfy start <= end <= 23 (got {}..{})",
                self.start_hour, self.end_hour
            )));
        }
        if self.minute_step == 0 {
            return Err(ArchilumeError::validation("minute step must be at least 1"));
        }
        Ok(())
    }

    /// `(hour, minute)` of every sky in the series.
    pub fn times(&self) -> Vec<(u32, u32)> {
        let first = self.start_hour * 60;
        let last = self.end_hour * 60;
        (first..=last)
            .step_by(self.minute_step.max(1) as usize)
            .map(|m| (m / 60, m % 60))
            .collect()
    }

    /// `SS_<MMDD>_<HHMM>.sky`
    pub fn file_name(&self, hour: u32, minute: u32) -> String {
        format!(
            "SS_{:02}{:02}_{hour:02}{minute:02}.sky",
            self.month, self.day
        )
    }

    /// Sky description for one time step.
    pub fn contents(&self, hour: u32, minute: u32) -> String {
        sky_file(&format!(
            "!gensky {} {} +{hour:02}:{minute:02} +s -a {}",
            self.month, self.day, self.latitude
        ))
    }

    /// Write the whole series into `dir`, returning the files in time order.
    pub fn write(&self, dir: &Path) -> ArchilumeResult<Vec<PathBuf>> {
        self.validate()?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create '{}'", dir.display()))?;

        let times = self.times();
        tracing::info!(
            count = times.len(),
            month = self.month,
            day = self.day,
            latitude = self.latitude,
            "writing sunny sky series"
        );
        let mut written = Vec::with_capacity(times.len());
        for (hour, minute) in times {
            let path = dir.join(self.file_name(hour, minute));
            std::fs::write(&path, self.contents(hour, minute))
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            tracing::debug!(path = %path.display(), "sky written");
            written.push(path);
        }
        Ok(written)
    }
}

/// Contents of the CIE overcast sky file.
pub fn overcast_sky_contents() -> String {
    sky_file(OVERCAST_GENSKY)
}

/// Write [`OVERCAST_SKY_FILE`] into `dir`.
pub fn write_overcast_sky(dir: &Path) -> ArchilumeResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create '{}'", dir.display()))?;
    let path = dir.join(OVERCAST_SKY_FILE);
    std::fs::write(&path, overcast_sky_contents())
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "overcast sky written");
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/sky.rs"]
mod tests;
