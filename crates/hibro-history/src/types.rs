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

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::timestamp::Timestamp;

/// Query window used when a request does not name one.
#[must_use]
pub fn default_duration() -> Duration {
    Duration::hours(24)
}

/// A single row of the Home Assistant `states` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub created: Timestamp,
    /// Raw state string; `NULL` in very old recorder schemas
    pub state: Option<String>,
    /// Serialized JSON object
    pub attributes: Option<String>,
}

/// What to fetch from a [`crate::HistoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub entity_id: String,
    /// Inclusive lower bound on `created`
    pub since: Option<DateTime<Utc>>,
}

impl SeriesQuery {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            since: None,
        }
    }

    #[must_use]
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }
}

/// Display metadata recovered from the first row's attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesMeta {
    pub friendly_name: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPoint {
    /// Position in the query result, used when reporting bad rows
    pub row: usize,
    pub time: Timestamp,
    /// The state string, or the selected attribute's JSON value
    pub value: Value,
}

/// Unprocessed history of one entity, in creation order
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub entity: String,
    pub meta: SeriesMeta,
    pub points: Vec<RawPoint>,
}

/// One chart element's worth of pipeline options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    pub entity: String,
    pub attribute: Option<String>,
    pub duration: Option<Duration>,
    /// Cadence alias such as `1H` or `15min`
    pub resample: Option<String>,
    /// Reducer name such as `mean` or `ptp`
    pub aggregate: Option<String>,
}

impl TransformRequest {
    /// A plain state request over the default 24 hour window.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            attribute: None,
            duration: Some(default_duration()),
            resample: None,
            aggregate: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub time: DateTime<Tz>,
    pub value: f64,
}

/// Output of the pipeline, ready for chart composition
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    pub entity: String,
    /// `friendly_name` of the first row, if any
    pub name: Option<String>,
    /// `unit_of_measurement` of the first row, if any
    pub unit: Option<String>,
    /// Display name with the resample/aggregate annotation
    pub label: String,
    pub series: Vec<SeriesPoint>,
}

impl TransformResult {
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.series.iter().map(|point| point.value)
    }
}
