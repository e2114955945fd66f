//! Room-boundary CSV to area-of-interest files and top-down plan views.
//!
//! Input rows look like `apartment,room,"X_<mm> Y_<mm> Z_<mm>",...` with no header. Every
//! coordinate cell is one perimeter point; cells that do not match are ignored.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;

use crate::foundation::error::{ArchilumeError, ArchilumeResult};

static COORDINATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"X_(-?\d+\.?\d*)\s+Y_(-?\d+\.?\d*)\s+Z_(-?\d+\.?\d*)")
        .expect("coordinate pattern is valid")
});
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s-]").expect("room pattern is valid")
});
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-\s]+").expect("separator pattern is valid")
});

/// Default camera height above the finished floor level, in metres.
pub const DEFAULT_FFL_OFFSET: f64 = 1.0;

const MM_PER_M: f64 = 1000.0;

/// One perimeter point, in metres.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryPoint {
    /// Apartment identifier.
    pub apartment: String,
    /// Room name as written in the CSV.
    pub room: String,
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
    /// Finished floor level.
    pub z: f64,
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

fn parse_coordinate(cell: &str) -> Option<(f64, f64, f64)> {
    let caps = COORDINATE.captures(cell)?;
    let value = |i: usize| -> Option<f64> { caps.get(i)?.as_str().parse::<f64>().ok() };
    Some((
        value(1)? / MM_PER_M,
        value(2)? / MM_PER_M,
        value(3)? / MM_PER_M,
    ))
}

/// Parse room-boundary CSV text. Coordinates are converted from millimetres to metres.
///
/// A leading UTF-8 byte-order mark is ignored.
pub fn parse_room_boundaries(text: &str) -> ArchilumeResult<Vec<BoundaryPoint>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut points = Vec::new();
    for line in text.lines() {
        let cells = split_csv_line(line.trim_end_matches('\r'));
        let [apartment, room, coords @ ..] = cells.as_slice() else {
            continue;
        };
        for cell in coords {
            if let Some((x, y, z)) = parse_coordinate(cell) {
                points.push(BoundaryPoint {
                    apartment: apartment.trim().to_string(),
                    room: room.trim().to_string(),
                    x,
                    y,
                    z,
                });
            }
        }
    }
    if points.is_empty() {
        return Err(ArchilumeError::parse(
            "room boundary CSV contains no X_/Y_/Z_ coordinates",
        ));
    }
    points.sort_by(|a, b| {
        a.z.total_cmp(&b.z)
            .then_with(|| a.apartment.cmp(&b.apartment))
            .then_with(|| a.room.cmp(&b.room))
    });
    Ok(points)
}

/// Perimeter of one room.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomBoundary {
    /// Apartment identifier.
    pub apartment: String,
    /// Room name.
    pub room: String,
    /// Floor level of the first point.
    pub ffl: f64,
    /// `(x, y)` perimeter points in CSV order.
    pub perimeter: Vec<(f64, f64)>,
}

impl RoomBoundary {
    /// Mean of the perimeter points.
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.perimeter.len().max(1) as f64;
        let (sx, sy) = self
            .perimeter
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        (sx / n, sy / n)
    }

    /// `<apartment>_<room>.aoi` with punctuation dropped and separators collapsed.
    pub fn aoi_file_name(&self) -> String {
        format!("{}_{}.aoi", self.apartment, clean_room_name(&self.room))
    }

    /// AOI file text.
    pub fn aoi_contents(&self) -> String {
        let (cx, cy) = self.centroid();
        let mut out = String::new();
        let _ = writeln!(out, "AOI Points File: {} {}", self.apartment, self.room);
        let _ = writeln!(out, "FFL z height(m): {}", self.ffl);
        let _ = writeln!(out, "CENTRAL x,y: {cx:.4} {cy:.4}");
        let _ = write!(
            out,
            "NO. PERIMETER POINTS {}: x,y positions",
            self.perimeter.len()
        );
        for (x, y) in &self.perimeter {
            let _ = write!(out, "\n{x:.4} {y:.4}");
        }
        out
    }
}

/// Room name reduced to word characters joined by underscores.
pub fn clean_room_name(room: &str) -> String {
    let stripped = NON_WORD.replace_all(room, "");
    SEPARATORS.replace_all(stripped.trim(), "_").into_owned()
}

/// Group points by `(apartment, room)` in key order.
pub fn group_rooms(points: &[BoundaryPoint]) -> Vec<RoomBoundary> {
    let mut rooms: BTreeMap<(&str, &str), RoomBoundary> = BTreeMap::new();
    for p in points {
        rooms
            .entry((p.apartment.as_str(), p.room.as_str()))
            .or_insert_with(|| RoomBoundary {
                apartment: p.apartment.clone(),
                room: p.room.clone(),
                ffl: p.z,
                perimeter: Vec::new(),
            })
            .perimeter
            .push((p.x, p.y));
    }
    rooms.into_values().collect()
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Top-down parallel view of one floor level.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanView {
    /// Position in the sorted list of levels.
    pub level: usize,
    /// Camera position; `z` is the level plus the FFL offset.
    pub position: [f64; 3],
    /// View width (`-vh`), metres.
    pub width: f64,
    /// View depth (`-vv`), metres.
    pub depth: f64,
}

impl PlanView {
    /// `plan_L<NN>.vp`
    pub fn file_name(&self) -> String {
        format!("plan_L{:02}.vp", self.level)
    }

    /// Radiance view parameter line.
    pub fn contents(&self) -> String {
        let [x, y, z] = self.position;
        format!(
            "rvu -vtl -vp {x} {y} {z} -vd 0 0 -1 -vu 0 1 0 -vh {} -vv {} -vo 0 -va 0 -vs 0 -vl 0",
            self.width, self.depth
        )
    }
}

/// One plan view per distinct floor level, framed on the bounding box of every point.
pub fn plan_views(points: &[BoundaryPoint], ffl_offset: f64) -> Vec<PlanView> {
    if points.is_empty() {
        return Vec::new();
    }
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    let cx = round3((min_x + max_x) / 2.0);
    let cy = round3((min_y + max_y) / 2.0);
    let width = round3(max_x - min_x);
    let depth = round3(max_y - min_y);

    let mut levels: Vec<f64> = points.iter().map(|p| p.z).collect();
    levels.sort_by(f64::total_cmp);
    levels.dedup();

    levels
        .into_iter()
        .enumerate()
        .map(|(level, z)| PlanView {
            level,
            position: [cx, cy, round3(z + ffl_offset)],
            width,
            depth,
        })
        .collect()
}

/// Files written by [`generate_views`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratedViews {
    /// One per room.
    pub aoi_files: Vec<PathBuf>,
    /// One per floor level.
    pub view_files: Vec<PathBuf>,
}

/// Read `csv`, write AOI files into `aoi_dir` and plan views into `view_dir`.
pub fn generate_views(
    csv: &Path,
    aoi_dir: &Path,
    view_dir: &Path,
    ffl_offset: f64,
) -> ArchilumeResult<GeneratedViews> {
    if !csv.is_file() {
        return Err(ArchilumeError::not_found("room boundary CSV", csv));
    }
    let text = std::fs::read_to_string(csv)
        .with_context(|| format!("failed to read '{}'", csv.display()))?;
    let points = parse_room_boundaries(&text)?;

    for dir in [aoi_dir, view_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create '{}'", dir.display()))?;
    }

    let mut generated = GeneratedViews::default();
    for room in group_rooms(&points) {
        let path = aoi_dir.join(room.aoi_file_name());
        std::fs::write(&path, room.aoi_contents())
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        generated.aoi_files.push(path);
    }
    for view in plan_views(&points, ffl_offset) {
        let path = view_dir.join(view.file_name());
        std::fs::write(&path, view.contents())
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), "plan view written");
        generated.view_files.push(path);
    }

    tracing::info!(
        points = points.len(),
        rooms = generated.aoi_files.len(),
        levels = generated.view_files.len(),
        "views generated"
    );
    Ok(generated)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/view.rs"]
mod tests;
