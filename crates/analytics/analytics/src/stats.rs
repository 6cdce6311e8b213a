//! Response shapes for the analytics endpoints.

use crate::align::AlignedSeries;
use crate::compare::Comparison;
use crate::ranking::{RankedItem, palette_color};
use serde::{Deserialize, Serialize};

/// A dashboard card over a counted metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountStat {
    pub count: u64,
    pub previous_count: u64,
    pub percent_change: f64,
}

impl From<Comparison> for CountStat {
    fn from(c: Comparison) -> Self {
        Self {
            count: c.current.round() as u64,
            previous_count: c.previous.round() as u64,
            percent_change: c.percent_change,
        }
    }
}

/// A dashboard card over a summed amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountStat {
    pub amount: f64,
    pub previous_amount: f64,
    pub percent_change: f64,
}

impl From<Comparison> for AmountStat {
    fn from(c: Comparison) -> Self {
        Self {
            amount: c.current,
            previous_amount: c.previous,
            percent_change: c.percent_change,
        }
    }
}

/// The four dashboard cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub students: CountStat,
    pub tutors: CountStat,
    pub assets: CountStat,
    pub revenue: AmountStat,
}

/// One line of a chart, with display hints for the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub border_color: String,
    pub background_color: String,
    pub fill: bool,
}

impl Dataset {
    /// Creates a dataset coloured with palette entry `index`.
    pub fn new(label: impl Into<String>, data: Vec<f64>, index: usize) -> Self {
        let color = palette_color(index);
        Self {
            label: label.into(),
            data,
            border_color: color.to_string(),
            background_color: format!("{color}33"),
            fill: false,
        }
    }
}

/// Time series chart: one label per bucket, datasets of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    /// Creates chart data from aligned series, colouring them in order.
    pub fn from_series(labels: Vec<String>, series: Vec<AlignedSeries>) -> Self {
        let datasets = series
            .into_iter()
            .enumerate()
            .map(|(i, s)| Dataset::new(s.name, s.data, i))
            .collect();
        Self { labels, datasets }
    }

    /// Fills the area under every line.
    pub fn filled(mut self) -> Self {
        for dataset in &mut self.datasets {
            dataset.fill = true;
        }
        self
    }
}

/// Revenue chart plus the total over its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueData {
    #[serde(flatten)]
    pub chart: ChartData,
    pub total_revenue: f64,
}

/// Parallel label/value/colour arrays, for rankings and distributions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledValues {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<String>,
}

impl LabeledValues {
    /// Adds an entry, coloured by its position.
    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.colors.push(palette_color(self.labels.len()).to_string());
        self.labels.push(label.into());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl From<Vec<RankedItem>> for LabeledValues {
    fn from(items: Vec<RankedItem>) -> Self {
        let mut out = LabeledValues::default();
        for item in items {
            out.push(item.label, item.value);
        }
        out
    }
}
