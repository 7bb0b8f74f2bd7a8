//! Chart rendering
//!
//! Views describe charts as [`ChartSpec`]s and hand them to a
//! [`ChartRenderer`], which owns the live chart instances. A key can hold
//! one live chart at a time; callers destroy the old instance before
//! creating a new one under the same key.

use crate::error::{QuizTrackError, Result};
use colored::Colorize;
use std::collections::BTreeMap;

/// Chart type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Bars per label
    Bar,
    /// One point per label
    Line,
}

/// Colour band of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Bad
    Red,
    /// Worrying
    Yellow,
    /// Fine
    Green,
    /// Neutral series colour
    Accent,
}

/// One data series
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend label
    pub name: String,
    /// One value per chart label
    pub values: Vec<f64>,
    /// Per-value colours; empty means [`Band::Accent`] throughout
    pub bands: Vec<Band>,
}

impl Series {
    /// Series drawn in the accent colour
    pub fn new(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            values,
            bands: Vec::new(),
        }
    }

    /// Colour each value
    pub fn with_bands(mut self, bands: Vec<Band>) -> Self {
        self.bands = bands;
        self
    }

    fn band(&self, index: usize) -> Band {
        self.bands.get(index).copied().unwrap_or(Band::Accent)
    }
}

/// Everything needed to draw one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    /// Chart type
    pub kind: ChartKind,
    /// Heading
    pub title: String,
    /// Axis labels
    pub labels: Vec<String>,
    /// Data series
    pub series: Vec<Series>,
    /// Fixed axis maximum, otherwise the largest value
    pub max: Option<f64>,
}

/// Owner of live chart instances
pub trait ChartRenderer: Send {
    /// Draw `spec` under `key`
    ///
    /// # Errors
    ///
    /// Returns error if a chart is already live under `key`
    fn create(&mut self, key: &str, spec: &ChartSpec) -> Result<String>;

    /// Drop the chart under `key`; false when there was none
    fn destroy(&mut self, key: &str) -> bool;

    /// Keys of the live charts
    fn live_charts(&self) -> Vec<String>;

    /// Destroy the chart under `key` if any, then create a new one
    ///
    /// # Errors
    ///
    /// Returns error if the new chart cannot be created
    fn replace(&mut self, key: &str, spec: &ChartSpec) -> Result<String> {
        self.destroy(key);
        self.create(key, spec)
    }
}

/// Draws charts as text
#[derive(Debug, Clone)]
pub struct TextChartRenderer {
    width: usize,
    label_width: usize,
    charts: BTreeMap<String, ChartSpec>,
}

impl Default for TextChartRenderer {
    fn default() -> Self {
        Self::new(40)
    }
}

impl TextChartRenderer {
    /// Renderer drawing bars up to `width` cells long
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            label_width: 23,
            charts: BTreeMap::new(),
        }
    }

    fn scale(&self, value: f64, max: f64) -> usize {
        if max <= 0.0 || value <= 0.0 {
            return 0;
        }
        ((value / max) * self.width as f64).round().min(self.width as f64) as usize
    }

    fn draw(&self, spec: &ChartSpec) -> String {
        let max = spec.max.unwrap_or_else(|| {
            spec.series
                .iter()
                .flat_map(|s| s.values.iter().copied())
                .fold(0.0, f64::max)
        });
        let series_width = spec.series.iter().map(|s| s.name.len()).max().unwrap_or(0);

        let mut out = format!("{}\n", spec.title.bold());
        for (index, label) in spec.labels.iter().enumerate() {
            for (n, series) in spec.series.iter().enumerate() {
                let value = series.values.get(index).copied().unwrap_or(0.0);
                let cells = self.scale(value, max);
                let mark = match spec.kind {
                    ChartKind::Bar => "█".repeat(cells),
                    ChartKind::Line => format!("{}●", " ".repeat(cells)),
                };
                let label = if n == 0 { label.as_str() } else { "" };
                out.push_str(&format!(
                    "{:<lw$} {:<sw$} {} {}\n",
                    label,
                    series.name,
                    paint(&mark, series.band(index)),
                    format_value(value),
                    lw = self.label_width,
                    sw = series_width,
                ));
            }
        }
        out
    }
}

fn paint(text: &str, band: Band) -> String {
    match band {
        Band::Red => text.red().to_string(),
        Band::Yellow => text.yellow().to_string(),
        Band::Green => text.green().to_string(),
        Band::Accent => text.blue().to_string(),
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

impl ChartRenderer for TextChartRenderer {
    fn create(&mut self, key: &str, spec: &ChartSpec) -> Result<String> {
        if self.charts.contains_key(key) {
            return Err(QuizTrackError::Chart(format!(
                "chart {:?} is already live; destroy it first",
                key
            ))
            .into());
        }
        let drawn = self.draw(spec);
        self.charts.insert(key.to_string(), spec.clone());
        Ok(drawn)
    }

    fn destroy(&mut self, key: &str) -> bool {
        self.charts.remove(key).is_some()
    }

    fn live_charts(&self) -> Vec<String> {
        self.charts.keys().cloned().collect()
    }
}
