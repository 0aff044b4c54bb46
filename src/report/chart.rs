//! Raster charts embedded into reports.
//!
//! Charts are drawn into an RGB buffer, written to a scratch PNG and read back
//! by the document builder. The scratch file lives exactly as long as its
//! [`ScratchImage`] handle; dropping the handle removes it.

use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::NamedTempFile;

use crate::error::{AppError, AppResult};

pub const CHART_WIDTH_PX: u32 = 480;
pub const CHART_HEIGHT_PX: u32 = 320;
/// Renders a chart at 4in x 2.67in.
pub const CHART_DPI: f32 = 120.0;
/// Categories beyond this are folded into [`OTHER_CATEGORY`].
pub const MAX_CATEGORIES: usize = 12;
pub const OTHER_CATEGORY: &str = "Other";

pub const PIE_PALETTE: [[u8; 3]; 4] = [
    [0xff, 0x99, 0x99],
    [0x66, 0xb3, 0xff],
    [0x99, 0xff, 0x99],
    [0xff, 0xcc, 0x99],
];

pub const BAR_PALETTE: [[u8; 3]; 4] = [
    [0xff, 0x6b, 0x6b],
    [0x4e, 0xcd, 0xc4],
    [0x45, 0xb7, 0xd1],
    [0x96, 0xce, 0xb4],
];

const BACKGROUND: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const AXIS: Rgb<u8> = Rgb([0x40, 0x40, 0x40]);

pub struct ScratchImage {
    file: NamedTempFile,
}

impl ScratchImage {
    /// Writes into `dir`, or the system temp directory when `None`.
    pub fn write(chart: &RgbImage, dir: Option<&Path>) -> AppResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("chart_").suffix(".png");
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        chart
            .save_with_format(file.path(), ImageFormat::Png)
            .map_err(|e| AppError::Render(format!("chart encode error: {e}")))?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn load(&self) -> AppResult<DynamicImage> {
        image::open(self.path()).map_err(|e| AppError::Render(format!("chart decode error: {e}")))
    }

    /// Deletes the scratch file. Failures are logged and otherwise ignored.
    pub fn release(self) {
        let path = self.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove chart scratch file");
        }
    }
}

pub fn palette_color(palette: &[[u8; 3]], index: usize) -> [u8; 3] {
    palette[index % palette.len()]
}

/// Keeps the `max - 1` largest categories and sums the rest under
/// [`OTHER_CATEGORY`]. Maps with at most `max` entries come back unchanged.
pub fn fold_categories(counts: &BTreeMap<String, usize>, max: usize) -> BTreeMap<String, usize> {
    if counts.len() <= max {
        return counts.clone();
    }

    let mut ranked: Vec<(&String, &usize)> = counts.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1));

    let keep = max.saturating_sub(1);
    let mut folded: BTreeMap<String, usize> = ranked[..keep]
        .iter()
        .map(|(label, count)| ((*label).clone(), **count))
        .collect();
    let rest: usize = ranked[keep..].iter().map(|(_, count)| **count).sum();
    *folded.entry(OTHER_CATEGORY.to_string()).or_insert(0) += rest;
    folded
}

/// Pie chart with slices laid out clockwise from twelve o'clock, in map order.
pub fn pie_chart(slices: &BTreeMap<String, usize>) -> RgbImage {
    let mut img = RgbImage::from_pixel(CHART_WIDTH_PX, CHART_HEIGHT_PX, BACKGROUND);
    let total: usize = slices.values().sum();
    if total == 0 {
        return img;
    }

    let mut bounds = Vec::with_capacity(slices.len());
    let mut cumulative = 0usize;
    for count in slices.values() {
        cumulative += count;
        bounds.push(cumulative as f32 / total as f32);
    }

    let cx = CHART_WIDTH_PX as f32 / 2.0;
    let cy = CHART_HEIGHT_PX as f32 / 2.0;
    let radius = CHART_HEIGHT_PX as f32 * 0.45;

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - cx;
        let dy = cy - (y as f32 + 0.5);
        if dx * dx + dy * dy > radius * radius {
            continue;
        }
        let fraction = dx.atan2(dy).rem_euclid(TAU) / TAU;
        let slice = bounds
            .iter()
            .position(|bound| fraction < *bound)
            .unwrap_or(bounds.len() - 1);
        *pixel = Rgb(palette_color(&PIE_PALETTE, slice));
    }

    img
}

/// Vertical bar chart, one bar per entry in map order, scaled to the largest
/// count. Every bar is at least one pixel wide; bars that no longer fit the
/// plot area are not drawn, so callers should fold long tails first.
pub fn bar_chart(bars: &BTreeMap<String, usize>) -> RgbImage {
    let mut img = RgbImage::from_pixel(CHART_WIDTH_PX, CHART_HEIGHT_PX, BACKGROUND);

    let margin = 24u32;
    let baseline = CHART_HEIGHT_PX - margin;
    let plot_height = baseline - margin;
    let plot_width = CHART_WIDTH_PX - 2 * margin;

    for x in margin..CHART_WIDTH_PX - margin {
        img.put_pixel(x, baseline, AXIS);
    }
    for y in margin..=baseline {
        img.put_pixel(margin, y, AXIS);
    }

    let max = bars.values().copied().max().unwrap_or(0);
    if max == 0 {
        return img;
    }

    let right = CHART_WIDTH_PX - margin;
    let slot = (plot_width / bars.len().max(1) as u32).max(1);
    let bar_width = (slot * 3 / 5).clamp(1, slot);
    for (i, count) in bars.values().enumerate() {
        let offset = u32::try_from(i).unwrap_or(u32::MAX).saturating_mul(slot);
        let left = (margin + 1)
            .saturating_add(offset)
            .saturating_add((slot - bar_width) / 2);
        if left >= right {
            break;
        }
        let height = (plot_height as u64 * *count as u64 / max as u64) as u32;
        let color = Rgb(palette_color(&BAR_PALETTE, i));
        for x in left..(left + bar_width).min(right) {
            for y in (baseline - height)..baseline {
                img.put_pixel(x, y, color);
            }
        }
    }

    img
}
