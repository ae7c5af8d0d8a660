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

use hibro_history::{TransformRequest, TransformResult};
use tracing::debug;

use crate::config::EntitySpec;
use crate::error::ChartError;
use crate::figure::{Figure, Layout, Trace, wall_clock};

/// A configured dashboard element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chart {
    /// Step lines over time, one per entity
    Line(Vec<EntitySpec>),
    /// Value distribution, one box per entity
    Box(Vec<EntitySpec>),
    /// One slice per entity from its whole-window aggregate
    Pie(Vec<EntitySpec>),
}

impl Chart {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Line(_) => "line",
            Self::Box(_) => "box",
            Self::Pie(_) => "pie",
        }
    }

    #[must_use]
    pub fn entities(&self) -> &[EntitySpec] {
        match self {
            Self::Line(entities) | Self::Box(entities) | Self::Pie(entities) => entities,
        }
    }

    /// Series the pipeline must fetch, in entity order.
    #[must_use]
    pub fn requests(&self) -> Vec<TransformRequest> {
        self.entities().iter().map(EntitySpec::request).collect()
    }

    /// Compose the figure from one pipeline outcome per request.
    ///
    /// Entities without history render as placeholders; any other pipeline
    /// error fails the whole chart.
    pub fn render(
        &self,
        outcomes: Vec<hibro_history::Result<TransformResult>>,
    ) -> Result<Figure, ChartError> {
        let entities = self.entities();
        if outcomes.len() != entities.len() {
            return Err(ChartError::OutcomeMismatch {
                expected: entities.len(),
                actual: outcomes.len(),
            });
        }

        let mut loaded = Vec::with_capacity(entities.len());
        for (spec, outcome) in entities.iter().zip(outcomes) {
            match outcome {
                Ok(result) => loaded.push((spec, Some(result))),
                Err(e) if e.is_not_found() => {
                    debug!("{}: no history in window, rendering placeholder", spec.entity);
                    loaded.push((spec, None));
                }
                Err(source) => {
                    return Err(ChartError::Series {
                        entity: spec.entity.clone(),
                        source,
                    });
                }
            }
        }

        Ok(match self {
            Self::Line(_) => Figure {
                data: loaded
                    .iter()
                    .map(|(spec, result)| match result {
                        Some(result) => Trace::step_line(
                            result.label.clone(),
                            result.series.iter().map(|p| wall_clock(&p.time)).collect(),
                            result.values().collect(),
                        ),
                        None => Trace::step_line(spec.entity.clone(), Vec::new(), Vec::new()),
                    })
                    .collect(),
                layout: Layout::series(axis_unit(&loaded)),
            },
            Self::Box(_) => Figure {
                data: loaded
                    .iter()
                    .map(|(spec, result)| match result {
                        Some(result) => Trace::Box {
                            name: result.label.clone(),
                            y: result.values().collect(),
                        },
                        None => Trace::Box {
                            name: spec.entity.clone(),
                            y: Vec::new(),
                        },
                    })
                    .collect(),
                layout: Layout::series(axis_unit(&loaded)),
            },
            Self::Pie(_) => {
                let (labels, values): (Vec<String>, Vec<f64>) = loaded
                    .iter()
                    .filter_map(|(_, result)| {
                        let result = result.as_ref()?;
                        let point = result.series.first()?;
                        Some((result.label.clone(), point.value))
                    })
                    .unzip();
                Figure {
                    data: vec![Trace::Pie { labels, values }],
                    layout: Layout::pie(),
                }
            }
        })
    }
}

/// Y-axis title: the last unit reported by any loaded entity
fn axis_unit(loaded: &[(&EntitySpec, Option<TransformResult>)]) -> Option<String> {
    loaded
        .iter()
        .rev()
        .find_map(|(_, result)| result.as_ref()?.unit.clone())
}
