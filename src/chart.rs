//! Projection of the frequency table into chart-ready series.
//!
//! Colors are keyed off the index position in vocabulary order, so a given
//! vocabulary order always produces the same palette. The vocabulary is
//! derived from the full result set (never the filtered view), which keeps
//! colors stable while the user changes the tag filter.

use std::fmt;

use crate::aggregate::FrequencyTable;
use crate::models::{ChartKind, Record};

/// Dataset title shown on the chart and in exported documents.
pub const SERIES_TITLE: &str = "Tag Frequency";

/// Hue step between consecutive series points, in degrees.
pub const HUE_STEP: u16 = 47;
/// Fixed saturation of every series color, in percent.
pub const SATURATION: u8 = 70;
/// Fixed lightness of every series color, in percent.
pub const LIGHTNESS: u8 = 60;

/// A color in HSL space with percent saturation and lightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HslColor {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl HslColor {
    pub fn new(hue: u16, saturation: u8, lightness: u8) -> Self {
        Self {
            hue: hue % 360,
            saturation: saturation.min(100),
            lightness: lightness.min(100),
        }
    }

    /// Series color for the point at `index`: hue `(index * 47) mod 360`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagscope::chart::HslColor;
    ///
    /// let color = HslColor::for_index(2);
    /// assert_eq!(color.hue, 94);
    /// assert_eq!(color.to_string(), "hsl(94, 70%, 60%)");
    /// ```
    pub fn for_index(index: usize) -> Self {
        let hue = (index % 360) * usize::from(HUE_STEP) % 360;
        // hue < 360 always fits
        Self::new(hue as u16, SATURATION, LIGHTNESS)
    }

    /// Converts to 8-bit sRGB channels.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let s = f64::from(self.saturation) / 100.0;
        let l = f64::from(self.lightness) / 100.0;
        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let sector = f64::from(self.hue) / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());

        let (r, g, b) = match self.hue / 60 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;

        (channel(r), channel(g), channel(b))
    }
}

impl fmt::Display for HslColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// Renderer options implied by the chart kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Value axis is forced to start at zero (bar charts).
    pub begin_at_zero: bool,
    /// Legend is drawn (pie charts).
    pub show_legend: bool,
}

impl DisplayOptions {
    pub fn for_kind(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Bar => Self {
                begin_at_zero: true,
                show_legend: false,
            },
            ChartKind::Pie => Self {
                begin_at_zero: false,
                show_legend: true,
            },
        }
    }
}

/// One labeled, colored value of the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: usize,
    pub color: HslColor,
}

impl SeriesPoint {
    /// Tooltip text for this point: `"<label>: <value>"`.
    pub fn tooltip(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

/// Read-only chart projection of a frequency table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    kind: ChartKind,
    points: Vec<SeriesPoint>,
    options: DisplayOptions,
}

impl ChartSeries {
    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn title(&self) -> &'static str {
        SERIES_TITLE
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn options(&self) -> DisplayOptions {
        self.options
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Sum of all values; the denominator for pie shares.
    pub fn total(&self) -> usize {
        self.points.iter().map(|p| p.value).sum()
    }

    /// Largest value in the series, zero when empty.
    pub fn max_value(&self) -> usize {
        self.points.iter().map(|p| p.value).max().unwrap_or(0)
    }

    /// Value axis range for bar charts; `None` when the axis rule does not apply.
    pub fn value_range(&self) -> Option<(usize, usize)> {
        if !self.options.begin_at_zero {
            return None;
        }
        let upper = self.max_value().max(1);
        Some((0, upper))
    }

    /// Fraction of the total held by the point at `index` (pie wedges).
    pub fn share(&self, index: usize) -> f64 {
        let total = self.total();
        match self.points.get(index) {
            Some(point) if total > 0 => point.value as f64 / total as f64,
            _ => 0.0,
        }
    }
}

/// Projects `table` into a chart series following `vocabulary_order`.
///
/// Labels follow the given order; each value is the tag's count (zero if the
/// table has no entry for it); the color at index `i` is
/// [`HslColor::for_index`]`(i)`.
///
/// # Examples
///
/// ```
/// use tagscope::{ChartKind, Record, aggregate::{FrequencyTable, vocabulary}, chart::project};
///
/// let records = vec![Record::new("A", ["x"]), Record::new("B", ["x", "y"])];
/// let series = project(
///     &FrequencyTable::from_records(&records),
///     &vocabulary(&records),
///     ChartKind::Pie,
/// );
///
/// assert_eq!(series.points()[0].tooltip(), "x: 2");
/// assert!(series.options().show_legend);
/// ```
pub fn project(table: &FrequencyTable, vocabulary_order: &[String], kind: ChartKind) -> ChartSeries {
    let points = vocabulary_order
        .iter()
        .enumerate()
        .map(|(index, tag)| SeriesPoint {
            label: tag.clone(),
            value: table.get(tag).unwrap_or(0),
            color: HslColor::for_index(index),
        })
        .collect();

    ChartSeries {
        kind,
        points,
        options: DisplayOptions::for_kind(kind),
    }
}

/// Convenience: aggregate and project in one step.
pub fn project_records(records: &[Record], kind: ChartKind) -> ChartSeries {
    let table = FrequencyTable::from_records(records);
    let order: Vec<String> = table.tags().map(str::to_string).collect();
    project(&table, &order, kind)
}
