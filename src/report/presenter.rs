//! Presentation of summary statistics.
//!
//! Aggregates carry full-precision `Option<f64>` means. This module is the
//! only place they get rounded, and it keeps "no data" visibly distinct
//! from a numeric zero.

use crate::models::{Dimension, SummaryAggregate, Survey};
use std::fmt;

/// Marker rendered in place of an absent mean.
pub const NO_DATA: &str = "no data";

/// A single aggregate value as seen by a reader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// No rows contributed to this value.
    Absent,
    /// Rows contributed and the mean is exactly zero.
    Zero,
    /// Rows contributed and the mean is non-zero.
    Value(f64),
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        match value {
            None => Metric::Absent,
            Some(v) if v == 0.0 => Metric::Zero,
            Some(v) => Metric::Value(v),
        }
    }
}

impl Metric {
    /// Render with a fixed number of decimals, or [`NO_DATA`].
    pub fn render(&self, decimal_places: u32) -> String {
        let places = decimal_places as usize;
        match self {
            Metric::Absent => NO_DATA.to_string(),
            Metric::Zero => format!("{:.*}", places, 0.0),
            Metric::Value(v) => format!("{:.*}", places, round_to(*v, decimal_places)),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(2))
    }
}

/// Round half away from zero to `decimal_places`.
pub fn round_to(value: f64, decimal_places: u32) -> f64 {
    let factor = 10f64.powi(decimal_places as i32);
    (value * factor).round() / factor
}

/// Renders aggregates for humans.
#[derive(Debug, Clone, Copy)]
pub struct SummaryPresenter {
    decimal_places: u32,
}

impl Default for SummaryPresenter {
    fn default() -> Self {
        Self { decimal_places: 2 }
    }
}

impl SummaryPresenter {
    pub fn new(decimal_places: u32) -> Self {
        Self { decimal_places }
    }

    pub fn round(&self, value: f64) -> f64 {
        round_to(value, self.decimal_places)
    }

    /// `(label, rendered value)` pairs: overall first, then each dimension.
    pub fn rows(&self, summary: &SummaryAggregate) -> Vec<(String, String)> {
        let mut rows = Vec::with_capacity(1 + Dimension::ALL.len());
        rows.push((
            "Overall score".to_string(),
            Metric::from(summary.average_overall_score).render(self.decimal_places),
        ));
        for dimension in Dimension::ALL {
            rows.push((
                dimension.label().to_string(),
                Metric::from(summary.dimension_average(dimension)).render(self.decimal_places),
            ));
        }
        rows
    }

    /// Markdown rendering of a survey summary.
    pub fn render_markdown(&self, survey: Option<&Survey>, summary: &SummaryAggregate) -> String {
        let mut output = String::new();

        match survey {
            Some(survey) => {
                output.push_str(&format!("# {}\n\n", survey.name));
                output.push_str(&format!("- **Survey:** `{}`\n", survey.id));
                output.push_str(&format!(
                    "- **Created:** {}\n",
                    survey.created_at.format("%Y-%m-%d %H:%M:%S UTC")
                ));
                output.push_str(&format!(
                    "- **Status:** {}\n",
                    if survey.active { "active" } else { "inactive" }
                ));
            }
            None => output.push_str("# Unregistered survey\n\n"),
        }
        output.push_str(&format!("- **Responses:** {}\n\n", summary.total_responses));

        output.push_str("| Dimension | Mean |\n");
        output.push_str("|:---|:---:|\n");
        for (label, value) in self.rows(summary) {
            output.push_str(&format!("| {} | {} |\n", label, value));
        }

        output
    }
}
