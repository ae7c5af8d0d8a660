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

//! Series Transformer
//!
//! Stages run in a fixed order: sentinel filtering, numeric coercion,
//! forward-fill + resample *or* forward-fill + whole-window aggregate, and
//! finally timezone normalization.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::debug;

use crate::cadence::Cadence;
use crate::error::{HistoryError, Result};
use crate::grid::FilledSeries;
use crate::reader::read_series_at;
use crate::reducer::Reducer;
use crate::store::HistoryStore;
use crate::timestamp::Timestamp;
use crate::types::{RawPoint, RawSeries, SeriesMeta, SeriesPoint, TransformRequest, TransformResult};

/// State strings Home Assistant records for unavailable readings
pub const SENTINELS: [&str; 2] = ["unknown", "Invalid"];

/// Parsed resample/aggregate options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub resample: Option<Cadence>,
    pub aggregate: Option<Reducer>,
}

impl TransformOptions {
    pub fn parse(resample: Option<&str>, aggregate: Option<&str>) -> Result<Self> {
        Ok(Self {
            resample: resample.map(str::parse).transpose()?,
            aggregate: aggregate.map(str::parse).transpose()?,
        })
    }
}

/// Drop rows holding a sentinel. Order of the remaining rows is kept.
#[must_use]
pub fn filter_sentinels(points: &[RawPoint]) -> Vec<&RawPoint> {
    points
        .iter()
        .filter(|point| !matches!(&point.value, Value::String(s) if SENTINELS.contains(&s.as_str())))
        .collect()
}

/// Convert values to `f64`. `null` (a missing attribute) is skipped; anything
/// else that is not numeric is a [`HistoryError::DataQuality`] failure.
pub fn coerce(entity: &str, points: &[&RawPoint]) -> Result<Vec<(Timestamp, f64)>> {
    let mut values = Vec::with_capacity(points.len());

    for point in points {
        let value = match &point.value {
            Value::Null => continue,
            Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            Value::Array(_) | Value::Object(_) => None,
        };

        let Some(value) = value else {
            return Err(HistoryError::DataQuality {
                entity: entity.to_owned(),
                row: point.row,
                value: point.value.to_string(),
            });
        };
        values.push((point.time, value));
    }

    Ok(values)
}

/// Snap onto the one-second grid, run `reduce`, and map the grid seconds back
/// to timestamps shaped like the input (naive stays naive).
fn regrid(
    values: &[(Timestamp, f64)],
    reduce: impl FnOnce(&FilledSeries) -> Vec<(i64, f64)>,
) -> Vec<(Timestamp, f64)> {
    let Some((template, _)) = values.first() else {
        return Vec::new();
    };

    let seconds: Vec<(i64, f64)> = values
        .iter()
        .map(|(time, value)| (time.to_utc().timestamp(), *value))
        .collect();
    let filled = FilledSeries::forward_fill(&seconds);

    reduce(&filled)
        .into_iter()
        .filter_map(|(second, value)| {
            DateTime::<Utc>::from_timestamp(second, 0)
                .map(|instant| (template.with_instant(instant), value))
        })
        .collect()
}

/// Attach UTC to naive timestamps and convert everything to `tz`.
#[must_use]
pub fn normalize_timezone(points: &[(Timestamp, f64)], tz: &Tz) -> Vec<SeriesPoint> {
    points
        .iter()
        .map(|(time, value)| SeriesPoint {
            time: time.localize(tz),
            value: *value,
        })
        .collect()
}

/// Run the full transformation pipeline over a raw series.
pub fn transform(raw: &RawSeries, options: &TransformOptions, tz: &Tz) -> Result<Vec<SeriesPoint>> {
    let kept = filter_sentinels(&raw.points);
    let mut values = coerce(&raw.entity, &kept)?;
    values.sort_by_key(|(time, _)| time.to_utc());

    let shaped = match (&options.resample, options.aggregate) {
        (Some(cadence), reducer) => regrid(&values, |filled| {
            filled.resample(cadence, reducer.unwrap_or_default())
        }),
        (None, Some(reducer)) => regrid(&values, |filled| {
            filled.aggregate(reducer).into_iter().collect()
        }),
        (None, None) => values,
    };

    debug!(
        "Transformed {}: {} raw rows, {} kept, {} output points",
        raw.entity,
        raw.points.len(),
        kept.len(),
        shaped.len()
    );

    Ok(normalize_timezone(&shaped, tz))
}

/// Display name: `friendly_name` or the entity id, annotated with the
/// cadence and reducer that shaped the series.
#[must_use]
pub fn compose_label(entity: &str, meta: &SeriesMeta, options: &TransformOptions) -> String {
    let name = meta.friendly_name.as_deref().unwrap_or(entity);
    match (&options.resample, options.aggregate) {
        (Some(cadence), reducer) => format!("{name} ({cadence}, {})", reducer.unwrap_or_default()),
        (None, Some(reducer)) => format!("{name} ({reducer})"),
        (None, None) => name.to_owned(),
    }
}

/// Read, transform and label one entity's history for the window ending at `now`.
pub fn fetch_series<S: HistoryStore + ?Sized>(
    store: &S,
    request: &TransformRequest,
    tz: &Tz,
    now: DateTime<Utc>,
) -> Result<TransformResult> {
    let options = TransformOptions::parse(request.resample.as_deref(), request.aggregate.as_deref())?;
    let raw = read_series_at(
        store,
        &request.entity,
        request.attribute.as_deref(),
        request.duration,
        now,
    )?;
    let series = transform(&raw, &options, tz)?;

    Ok(TransformResult {
        label: compose_label(&raw.entity, &raw.meta, &options),
        entity: raw.entity,
        name: raw.meta.friendly_name,
        unit: raw.meta.unit,
        series,
    })
}
