//! Chart rasterization with plotters' bitmap backend.
//!
//! The bitmap carries shapes only (bars, wedges, axis, legend swatches);
//! labels and values are written as text next to the image by the PDF
//! adapter, so no font support is needed here.

use std::f64::consts::{FRAC_PI_2, TAU};

use plotters_backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::ExportError;
use crate::chart::{ChartSeries, HslColor};
use crate::models::ChartKind;

/// Default bitmap width: 190mm at 8 px/mm.
pub const DEFAULT_WIDTH: u32 = 1520;
/// Default bitmap height: 100mm at 8 px/mm.
pub const DEFAULT_HEIGHT: u32 = 800;

const MIN_SIDE: u32 = 64;
const MARGIN_LEFT: i32 = 60;
const MARGIN_RIGHT: i32 = 30;
const MARGIN_TOP: i32 = 30;
const MARGIN_BOTTOM: i32 = 50;
const BAR_FILL_RATIO: f64 = 0.7;
const SWATCH: i32 = 24;
const SWATCH_ROW: i32 = 34;

/// An 8-bit RGB bitmap, row-major, three bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB bytes, `width * height * 3` long.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 3) as usize;
        Some((
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ))
    }
}

/// Draws `series` into a fresh `width` x `height` bitmap.
///
/// # Errors
///
/// Returns `ExportError::NothingToExport` for an empty series and
/// `ExportError::Render` if the bitmap is too small or drawing fails.
pub fn rasterize(series: &ChartSeries, width: u32, height: u32) -> Result<RasterImage, ExportError> {
    if series.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    if width < MIN_SIDE || height < MIN_SIDE {
        return Err(ExportError::Render(format!(
            "bitmap {width}x{height} is smaller than {MIN_SIDE}x{MIN_SIDE}"
        )));
    }

    let mut pixels = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        draw_chart(&root, series).map_err(|e| ExportError::Render(e.to_string()))?;
        root.present()
            .map_err(|e| ExportError::Render(e.to_string()))?;
    }

    Ok(RasterImage {
        width,
        height,
        pixels,
    })
}

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn draw_chart<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, series: &ChartSeries) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    let (width, height) = root.dim_in_pixel();

    match series.kind() {
        ChartKind::Bar => draw_bars(root, series, width, height),
        ChartKind::Pie => draw_pie(root, series, width, height),
    }
}

fn rgb(color: HslColor) -> RGBColor {
    let (r, g, b) = color.to_rgb();
    RGBColor(r, g, b)
}

/// Pixel rectangles of the bars, in series order.
pub(crate) fn bar_geometry(series: &ChartSeries, width: u32, height: u32) -> Vec<[(i32, i32); 2]> {
    let left = MARGIN_LEFT;
    let right = width as i32 - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = height as i32 - MARGIN_BOTTOM;
    let plot_height = f64::from(bottom - top);

    let (_, upper) = series.value_range().unwrap_or((0, series.max_value().max(1)));
    let slot = f64::from(right - left) / series.len().max(1) as f64;
    let bar_width = slot * BAR_FILL_RATIO;

    series
        .points()
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let x0 = f64::from(left) + slot * i as f64 + (slot - bar_width) / 2.0;
            let bar_height = plot_height * point.value as f64 / upper as f64;
            [
                (x0.round() as i32, (f64::from(bottom) - bar_height).round() as i32),
                ((x0 + bar_width).round() as i32, bottom),
            ]
        })
        .collect()
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    series: &ChartSeries,
    width: u32,
    height: u32,
) -> DrawResult<DB> {
    let left = MARGIN_LEFT;
    let right = width as i32 - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = height as i32 - MARGIN_BOTTOM;
    let grid = RGBColor(225, 225, 225);

    // One grid line per unit for small counts, five divisions otherwise
    let (_, upper) = series.value_range().unwrap_or((0, series.max_value().max(1)));
    let divisions = if upper <= 10 { upper } else { 5 };
    for step in 1..=divisions {
        let y = bottom - ((bottom - top) as usize * step / divisions) as i32;
        root.draw(&PathElement::new(vec![(left, y), (right, y)], grid.stroke_width(1)))?;
    }

    for (point, [upper_left, lower_right]) in series
        .points()
        .iter()
        .zip(bar_geometry(series, width, height))
    {
        if point.value == 0 {
            continue;
        }
        root.draw(&Rectangle::new([upper_left, lower_right], rgb(point.color).filled()))?;
        root.draw(&Rectangle::new(
            [upper_left, lower_right],
            BLACK.mix(0.1).stroke_width(1),
        ))?;
    }

    // Value axis starts at zero: the baseline is the x axis
    root.draw(&PathElement::new(
        vec![(left, top), (left, bottom), (right, bottom)],
        BLACK.stroke_width(2),
    ))?;

    Ok(())
}

/// Start and end angles (radians, clockwise from 12 o'clock) of each wedge.
pub(crate) fn wedge_angles(series: &ChartSeries) -> Vec<(f64, f64)> {
    let mut start = -FRAC_PI_2;
    (0..series.len())
        .map(|i| {
            let end = start + TAU * series.share(i);
            let span = (start, end);
            start = end;
            span
        })
        .collect()
}

/// Center and radius of the pie, leaving the right third for the legend.
pub(crate) fn pie_geometry(series: &ChartSeries, width: u32, height: u32) -> ((i32, i32), i32) {
    let pie_width = if series.options().show_legend {
        width as i32 * 2 / 3
    } else {
        width as i32
    };
    let center = (pie_width / 2, height as i32 / 2);
    let radius = (pie_width.min(height as i32) as f64 * 0.42) as i32;
    (center, radius)
}

fn draw_pie<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    series: &ChartSeries,
    width: u32,
    height: u32,
) -> DrawResult<DB> {
    let ((cx, cy), radius) = pie_geometry(series, width, height);

    for (point, (start, end)) in series.points().iter().zip(wedge_angles(series)) {
        if end <= start {
            continue;
        }
        // Roughly one vertex per degree of arc
        let steps = ((end - start).to_degrees().ceil() as usize).max(2);
        let mut outline = Vec::with_capacity(steps + 2);
        outline.push((cx, cy));
        for s in 0..=steps {
            let angle = start + (end - start) * s as f64 / steps as f64;
            outline.push((
                cx + (f64::from(radius) * angle.cos()).round() as i32,
                cy + (f64::from(radius) * angle.sin()).round() as i32,
            ));
        }
        root.draw(&Polygon::new(outline.clone(), rgb(point.color).filled()))?;
        outline.push((cx, cy));
        root.draw(&PathElement::new(outline, WHITE.stroke_width(2)))?;
    }

    if series.options().show_legend {
        draw_legend(root, series, width, height)?;
    }

    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    series: &ChartSeries,
    width: u32,
    height: u32,
) -> DrawResult<DB> {
    let rows = ((height as i32 - 2 * MARGIN_TOP) / SWATCH_ROW).max(1) as usize;
    let origin_x = width as i32 * 2 / 3 + MARGIN_TOP;

    for (i, point) in series.points().iter().enumerate() {
        let x = origin_x + (i / rows) as i32 * (SWATCH_ROW * 2);
        let y = MARGIN_TOP + (i % rows) as i32 * SWATCH_ROW;
        if x + SWATCH > width as i32 {
            break;
        }
        root.draw(&Rectangle::new(
            [(x, y), (x + SWATCH, y + SWATCH)],
            rgb(point.color).filled(),
        ))?;
    }

    Ok(())
}
