// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of HiBro.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! plotly.js figure model (`{data, layout}`)

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

const FONT_FAMILY: &str = "Roboto";
const FONT_COLOR: &str = "#333333";
const BACKGROUND: &str = "#ffffff";
const GRID_COLOR: &str = "#EBF0F8";
const HEIGHT: u32 = 300;

/// Wall-clock time in the viewer's zone, as plotly expects for date axes
#[must_use]
pub fn wall_clock(time: &DateTime<Tz>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter {
        name: String,
        x: Vec<String>,
        y: Vec<f64>,
        mode: &'static str,
        line: LineStyle,
    },
    Box {
        name: String,
        y: Vec<f64>,
    },
    Pie {
        labels: Vec<String>,
        values: Vec<f64>,
    },
}

impl Trace {
    /// Step-shaped line: each value holds until the next sample
    #[must_use]
    pub fn step_line(name: String, x: Vec<String>, y: Vec<f64>) -> Self {
        Self::Scatter {
            name,
            x,
            y,
            mode: "lines",
            line: LineStyle { shape: "hv" },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineStyle {
    pub shape: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub height: u32,
    pub font: Font,
    pub paper_bgcolor: &'static str,
    pub plot_bgcolor: &'static str,
    pub margin: Margin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
}

impl Layout {
    /// White layout with a horizontal legend below the plot, for series charts.
    #[must_use]
    pub fn series(unit: Option<String>) -> Self {
        Self {
            legend: Some(Legend::below()),
            xaxis: Some(Axis::default()),
            yaxis: Some(Axis {
                title: unit.map(|text| AxisTitle { text }),
                ..Axis::default()
            }),
            ..Self::base(Margin {
                t: Some(10),
                b: None,
            })
        }
    }

    #[must_use]
    pub fn pie() -> Self {
        Self::base(Margin {
            t: Some(30),
            b: Some(30),
        })
    }

    fn base(margin: Margin) -> Self {
        Self {
            height: HEIGHT,
            font: Font {
                family: FONT_FAMILY,
                color: FONT_COLOR,
            },
            paper_bgcolor: BACKGROUND,
            plot_bgcolor: BACKGROUND,
            margin,
            legend: None,
            xaxis: None,
            yaxis: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Font {
    pub family: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Margin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub orientation: &'static str,
    pub x: f64,
    pub y: f64,
}

impl Legend {
    fn below() -> Self {
        Self {
            orientation: "h",
            x: 0.0,
            y: -0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Axis {
    pub gridcolor: &'static str,
    pub zerolinecolor: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<AxisTitle>,
}

impl Default for Axis {
    fn default() -> Self {
        Self {
            gridcolor: GRID_COLOR,
            zerolinecolor: GRID_COLOR,
            title: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisTitle {
    pub text: String,
}
