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

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use hibro_history::{HistoryStore, fetch_series};
use serde::Serialize;
use tracing::{debug, warn};

use crate::chart::Chart;
use crate::config::DashboardConfig;
use crate::figure::{Figure, wall_clock};

/// One rendered page worth of charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub timezone: String,
    pub generated_at: String,
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Panel {
    Figure {
        id: String,
        chart: &'static str,
        figure: Figure,
    },
    /// A chart that failed; the rest of the page still renders
    Error {
        id: String,
        chart: &'static str,
        message: String,
    },
}

impl Panel {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Figure { id, .. } | Self::Error { id, .. } => id,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Run the pipeline for every configured chart and compose the page.
///
/// Charts are rendered in configuration order. A chart error becomes an
/// error panel.
pub fn build_dashboard<S: HistoryStore + ?Sized>(
    config: &DashboardConfig,
    store: &S,
    tz: &Tz,
    now: DateTime<Utc>,
) -> Dashboard {
    let panels = config
        .charts
        .iter()
        .enumerate()
        .map(|(index, chart)| render_panel(index, chart, store, tz, now))
        .collect::<Vec<_>>();

    debug!(
        "Built dashboard: {} panels, {} failed",
        panels.len(),
        panels.iter().filter(|panel| panel.is_error()).count()
    );

    Dashboard {
        title: config.title.clone(),
        timezone: tz.name().to_owned(),
        generated_at: wall_clock(&now.with_timezone(tz)),
        panels,
    }
}

fn render_panel<S: HistoryStore + ?Sized>(
    index: usize,
    chart: &Chart,
    store: &S,
    tz: &Tz,
    now: DateTime<Utc>,
) -> Panel {
    let id = format!("chart-{index}");
    let outcomes = chart
        .requests()
        .iter()
        .map(|request| fetch_series(store, request, tz, now))
        .collect();

    match chart.render(outcomes) {
        Ok(figure) => Panel::Figure {
            id,
            chart: chart.kind(),
            figure,
        },
        Err(e) => {
            warn!("Chart {index} ({}) failed: {e}", chart.kind());
            Panel::Error {
                id,
                chart: chart.kind(),
                message: e.to_string(),
            }
        }
    }
}
