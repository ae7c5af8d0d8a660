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

//! Series Reader: one bounded query per call, metadata from the first row.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{HistoryError, Result};
use crate::store::HistoryStore;
use crate::types::{RawPoint, RawSeries, SeriesMeta, SeriesQuery};

/// Read the history of `entity` for the window ending now.
pub fn read_series<S: HistoryStore + ?Sized>(
    store: &S,
    entity: &str,
    attribute: Option<&str>,
    duration: Option<Duration>,
) -> Result<RawSeries> {
    read_series_at(store, entity, attribute, duration, Utc::now())
}

/// Read the history of `entity` for the window ending at `now`.
///
/// Returns [`HistoryError::NotFound`] when the window holds no rows. When
/// `attribute` is given every row's payload is parsed and the value at that
/// key is taken (missing keys give `null`); otherwise the state string is used.
pub fn read_series_at<S: HistoryStore + ?Sized>(
    store: &S,
    entity: &str,
    attribute: Option<&str>,
    duration: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<RawSeries> {
    if entity.trim().is_empty() {
        return Err(HistoryError::InvalidRequest(
            "entity id must not be empty".to_owned(),
        ));
    }

    let mut query = SeriesQuery::new(entity);
    if let Some(duration) = duration {
        if duration <= Duration::zero() {
            return Err(HistoryError::InvalidRequest(format!(
                "duration for {entity} must be positive"
            )));
        }
        let since = now.checked_sub_signed(duration).ok_or_else(|| {
            HistoryError::InvalidRequest(format!("duration for {entity} is out of range"))
        })?;
        query = query.since(since);
    }

    let records = store.fetch_history(&query)?;
    let Some(first) = records.first() else {
        return Err(HistoryError::NotFound {
            entity: entity.to_owned(),
        });
    };

    let first_attributes = parse_attributes(entity, 0, first.attributes.as_deref())?;
    let meta = SeriesMeta {
        friendly_name: string_field(&first_attributes, "friendly_name"),
        unit: string_field(&first_attributes, "unit_of_measurement"),
    };

    let points = records
        .into_iter()
        .enumerate()
        .map(|(row, record)| {
            let value = match attribute {
                Some(key) => parse_attributes(entity, row, record.attributes.as_deref())?
                    .remove(key)
                    .unwrap_or(Value::Null),
                None => record.state.map_or(Value::Null, Value::String),
            };
            Ok(RawPoint {
                row,
                time: record.created,
                value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Read {} points for {entity} (attribute: {attribute:?})",
        points.len()
    );

    Ok(RawSeries {
        entity: entity.to_owned(),
        meta,
        points,
    })
}

/// `NULL` payloads read as an empty object; anything that is not a JSON object is malformed.
fn parse_attributes(entity: &str, row: usize, payload: Option<&str>) -> Result<Map<String, Value>> {
    let Some(payload) = payload else {
        return Ok(Map::new());
    };

    let malformed = |detail: String| HistoryError::MalformedMetadata {
        entity: entity.to_owned(),
        row,
        detail,
    };

    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(malformed(format!("expected a JSON object, found {other}"))),
        Err(e) => Err(malformed(e.to_string())),
    }
}

fn string_field(attributes: &Map<String, Value>, key: &str) -> Option<String> {
    attributes
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
}
