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

//! Dashboard configuration
//!
//! The TOML document is deserialized into a loose raw model first and then
//! validated element by element into typed [`Chart`] values:
//!
//! ```toml
//! title = "My history"
//! db_url = "sqlite:////config/home-assistant_v2.db"
//! timezone = "Europe/Vienna"
//!
//! [[elements]]
//! type = "line"
//! entities = [
//!   "sensor.outside_temperature",
//!   { entity = "sensor.power", resample = "1H", aggregate = "max", duration = { days = 2 } },
//! ]
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Duration;
use chrono_tz::Tz;
use hibro_history::{Cadence, Reducer, TransformRequest, default_duration};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::chart::Chart;
use crate::error::{ConfigError, Result};

pub const DEFAULT_TITLE: &str = "HiBro: Home Assistant History Browser";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_title")]
    title: String,
    db_url: String,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    elements: Vec<RawElement>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawElement {
    #[serde(rename = "type")]
    kind: String,
    entities: Vec<RawEntity>,
}

/// A bare string is shorthand for `{ entity = "<string>" }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawEntity {
    Id(String),
    Descriptor(RawDescriptor),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    entity: String,
    attribute: Option<String>,
    duration: Option<RawDuration>,
    resample: Option<String>,
    aggregate: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDuration {
    weeks: Option<f64>,
    days: Option<f64>,
    hours: Option<f64>,
    minutes: Option<f64>,
    seconds: Option<f64>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_owned()
}

impl RawDuration {
    fn to_duration(&self) -> std::result::Result<Duration, String> {
        let parts = [
            (self.weeks, 604_800.0),
            (self.days, 86_400.0),
            (self.hours, 3_600.0),
            (self.minutes, 60.0),
            (self.seconds, 1.0),
        ];
        let total: f64 = parts
            .iter()
            .filter_map(|&(amount, scale)| amount.map(|amount| amount * scale))
            .sum();

        if !total.is_finite() || total <= 0.0 {
            return Err(format!("duration must be positive, got {total} seconds"));
        }
        Duration::try_milliseconds(whole_millis(total))
            .filter(|duration| *duration > Duration::zero())
            .ok_or_else(|| format!("duration of {total} seconds is out of range"))
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float to int casts saturate; the range is checked by try_milliseconds"
)]
fn whole_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// One validated entity of a chart element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpec {
    pub entity: String,
    pub attribute: Option<String>,
    pub duration: Duration,
    /// Cadence alias as written; an unknown alias fails this chart at render
    pub resample: Option<String>,
    /// Reducer name as written; an unknown name fails this chart at render
    pub aggregate: Option<String>,
}

impl EntitySpec {
    /// Plain state series over the default window
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            attribute: None,
            duration: default_duration(),
            resample: None,
            aggregate: None,
        }
    }

    #[must_use]
    pub fn request(&self) -> TransformRequest {
        TransformRequest {
            entity: self.entity.clone(),
            attribute: self.attribute.clone(),
            duration: Some(self.duration),
            resample: self.resample.clone(),
            aggregate: self.aggregate.clone(),
        }
    }
}

/// Per chart type: accepted descriptor fields and how to build the chart
struct ElementSchema {
    allowed: &'static [&'static str],
    default_aggregate: Option<Reducer>,
    build: fn(Vec<EntitySpec>) -> Chart,
}

fn schema(kind: &str) -> Option<ElementSchema> {
    match kind {
        "line" => Some(ElementSchema {
            allowed: &["attribute", "duration", "resample", "aggregate"],
            default_aggregate: None,
            build: Chart::Line,
        }),
        "box" => Some(ElementSchema {
            allowed: &["attribute", "duration"],
            default_aggregate: None,
            build: Chart::Box,
        }),
        "pie" => Some(ElementSchema {
            allowed: &["attribute", "duration", "aggregate"],
            default_aggregate: Some(Reducer::Ptp),
            build: Chart::Pie,
        }),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub title: String,
    /// SQLite recorder database, resolved from `db_url`
    pub database: PathBuf,
    /// Explicitly configured zone; see [`DashboardConfig::timezone`]
    pub configured_timezone: Option<Tz>,
    pub charts: Vec<Chart>,
}

impl DashboardConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = content.parse()?;
        debug!(
            "Loaded {} with {} charts",
            path.display(),
            config.charts.len()
        );
        Ok(config)
    }

    /// Viewer timezone: the configured one, else `TZ` from the environment, else UTC.
    #[must_use]
    pub fn timezone(&self) -> Tz {
        resolve_timezone(self.configured_timezone, std::env::var("TZ").ok().as_deref())
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        let database = database_path(&raw.db_url)?;
        let configured_timezone = raw
            .timezone
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| ConfigError::InvalidTimezone(name))
            })
            .transpose()?;

        let charts = raw
            .elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| validate_element(index, element))
            .collect::<Result<Vec<_>>>()?;

        if charts.is_empty() {
            warn!("Dashboard configuration has no elements");
        }

        Ok(Self {
            title: raw.title,
            database,
            configured_timezone,
            charts,
        })
    }
}

impl FromStr for DashboardConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        Self::validate(raw)
    }
}

fn invalid(index: usize, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidElement {
        index,
        reason: reason.into(),
    }
}

fn validate_element(index: usize, element: RawElement) -> Result<Chart> {
    let Some(schema) = schema(&element.kind) else {
        return Err(invalid(
            index,
            format!("unknown chart type {:?}", element.kind),
        ));
    };
    if element.entities.is_empty() {
        return Err(invalid(index, "at least one entity is required"));
    }

    let entities = element
        .entities
        .into_iter()
        .map(|entity| validate_entity(index, &element.kind, &schema, entity))
        .collect::<Result<Vec<_>>>()?;

    Ok((schema.build)(entities))
}

fn validate_entity(
    index: usize,
    kind: &str,
    schema: &ElementSchema,
    entity: RawEntity,
) -> Result<EntitySpec> {
    let raw = match entity {
        RawEntity::Id(entity) => RawDescriptor {
            entity,
            ..RawDescriptor::default()
        },
        RawEntity::Descriptor(descriptor) => descriptor,
    };

    if raw.entity.trim().is_empty() {
        return Err(invalid(index, "entity id must not be empty"));
    }

    let present = [
        ("attribute", raw.attribute.is_some()),
        ("duration", raw.duration.is_some()),
        ("resample", raw.resample.is_some()),
        ("aggregate", raw.aggregate.is_some()),
    ];
    if let Some((field, _)) = present
        .iter()
        .find(|&&(field, set)| set && !schema.allowed.contains(&field))
    {
        return Err(invalid(
            index,
            format!("{field} is not allowed for {kind} charts ({})", raw.entity),
        ));
    }

    let duration = match &raw.duration {
        Some(duration) => duration
            .to_duration()
            .map_err(|reason| invalid(index, format!("{}: {reason}", raw.entity)))?,
        None => default_duration(),
    };
    // Unknown names only break their own chart, which renders as an error panel
    if let Some(Err(e)) = raw.resample.as_deref().map(str::parse::<Cadence>) {
        warn!("elements[{index}] {}: {e}; the chart will show an error", raw.entity);
    }
    if let Some(Err(e)) = raw.aggregate.as_deref().map(str::parse::<Reducer>) {
        warn!("elements[{index}] {}: {e}; the chart will show an error", raw.entity);
    }
    let aggregate = raw
        .aggregate
        .or_else(|| schema.default_aggregate.map(|reducer| reducer.name().to_owned()));

    Ok(EntitySpec {
        entity: raw.entity,
        attribute: raw.attribute,
        duration,
        resample: raw.resample,
        aggregate,
    })
}

/// Resolve a `db_url` to a SQLite file path.
///
/// Accepts `sqlite:///relative/path`, `sqlite:////absolute/path` and plain paths.
pub fn database_path(db_url: &str) -> Result<PathBuf> {
    let path = match db_url.strip_prefix("sqlite:///") {
        Some(rest) => rest,
        None if db_url.contains("://") => {
            return Err(ConfigError::UnsupportedDatabase(db_url.to_owned()));
        }
        None => db_url,
    };
    if path.trim().is_empty() {
        return Err(ConfigError::UnsupportedDatabase(db_url.to_owned()));
    }
    Ok(PathBuf::from(path))
}

/// `configured`, else the zone named by `env` (POSIX `:Area/City` accepted), else UTC.
#[must_use]
pub fn resolve_timezone(configured: Option<Tz>, env: Option<&str>) -> Tz {
    configured
        .or_else(|| {
            env.map(|name| name.trim_start_matches(':'))
                .and_then(|name| name.parse::<Tz>().ok())
        })
        .unwrap_or(Tz::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"db_url = "sqlite:////config/home-assistant_v2.db""#;

    fn load(elements: &str) -> Result<DashboardConfig> {
        format!("{BASE}\n{elements}").parse()
    }

    #[test]
    fn test_defaults() {
        let config: DashboardConfig = BASE.parse().unwrap();
        assert_eq!(config.title, DEFAULT_TITLE);
        assert_eq!(config.database, PathBuf::from("/config/home-assistant_v2.db"));
        assert!(config.configured_timezone.is_none());
        assert!(config.charts.is_empty());
    }

    #[test]
    fn test_bare_string_entity_coerces() {
        let config = load(
            r#"
            [[elements]]
            type = "line"
            entities = ["sensor.a", { entity = "sensor.b", resample = "1H", aggregate = "max" }]
            "#,
        )
        .unwrap();

        let Chart::Line(entities) = &config.charts[0] else {
            panic!("expected a line chart");
        };
        assert_eq!(entities[0], EntitySpec::new("sensor.a"));
        assert_eq!(entities[1].resample.as_deref(), Some("1H"));
        assert_eq!(entities[1].aggregate.as_deref(), Some("max"));
        assert_eq!(entities[1].duration, Duration::hours(24));
    }

    #[test]
    fn test_duration_table_sums_units() {
        let config = load(
            r#"
            [[elements]]
            type = "line"
            entities = [{ entity = "sensor.a", duration = { days = 1, hours = 1.5, seconds = 30 } }]
            "#,
        )
        .unwrap();
        let expected = Duration::hours(25) + Duration::minutes(30) + Duration::seconds(30);
        assert_eq!(config.charts[0].entities()[0].duration, expected);
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        let err = load(
            r#"
            [[elements]]
            type = "line"
            entities = [{ entity = "sensor.a", duration = { hours = 0 } }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidElement { index: 0, .. }));
    }

    #[test]
    fn test_box_rejects_resample() {
        let err = load(
            r#"
            [[elements]]
            type = "line"
            entities = ["sensor.a"]

            [[elements]]
            type = "box"
            entities = [{ entity = "sensor.b", resample = "1H" }]
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::InvalidElement { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("resample"), "{reason}");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_pie_defaults_to_ptp() {
        let config = load(
            r#"
            [[elements]]
            type = "pie"
            entities = ["sensor.a", { entity = "sensor.b", aggregate = "sum" }]
            "#,
        )
        .unwrap();
        let entities = config.charts[0].entities();
        assert_eq!(entities[0].aggregate.as_deref(), Some("ptp"));
        assert_eq!(entities[1].aggregate.as_deref(), Some("sum"));
    }

    #[test]
    fn test_unknown_chart_type_is_rejected() {
        let err = load(
            r#"
            [[elements]]
            type = "scatter"
            entities = ["sensor.a"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("scatter"));
    }

    #[test]
    fn test_unknown_names_still_load() {
        let config = load(
            r#"
            [[elements]]
            type = "line"
            entities = [{ entity = "sensor.a", aggregate = "average" }]

            [[elements]]
            type = "line"
            entities = [{ entity = "sensor.a", resample = "fortnight" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.charts.len(), 2);
        let bad_reducer = &config.charts[0].requests()[0];
        assert_eq!(bad_reducer.aggregate.as_deref(), Some("average"));
        let bad_cadence = &config.charts[1].requests()[0];
        assert_eq!(bad_cadence.resample.as_deref(), Some("fortnight"));
    }

    #[test]
    fn test_unknown_fields_fail_to_parse() {
        assert!(matches!(
            format!("{BASE}\nport = 1").parse::<DashboardConfig>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_database_urls() {
        assert_eq!(database_path("sqlite:///data/ha.db").unwrap(), PathBuf::from("data/ha.db"));
        assert_eq!(database_path("sqlite:////data/ha.db").unwrap(), PathBuf::from("/data/ha.db"));
        assert_eq!(database_path("/data/ha.db").unwrap(), PathBuf::from("/data/ha.db"));
        let err = database_path("postgresql://user@host/ha").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedDatabase(_)));
        let message = err.to_string();
        assert!(message.contains("sqlite:///relative/path"), "{message}");
        assert!(message.contains("sqlite:////absolute/path"), "{message}");
        assert!(database_path("sqlite:///").is_err());
    }

    #[test]
    fn test_timezone_resolution() {
        let vienna: Tz = "Europe/Vienna".parse().unwrap();
        let prague: Tz = "Europe/Prague".parse().unwrap();
        assert_eq!(resolve_timezone(Some(vienna), Some("Europe/Prague")), vienna);
        assert_eq!(resolve_timezone(None, Some(":Europe/Prague")), prague);
        assert_eq!(resolve_timezone(None, Some("Mars/Base")), Tz::UTC);
        assert_eq!(resolve_timezone(None, None), Tz::UTC);

        let err = format!("{BASE}\ntimezone = \"Mars/Base\"")
            .parse::<DashboardConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimezone(name) if name == "Mars/Base"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hibro-config.toml");
        std::fs::write(
            &path,
            format!("title = \"Home\"\n{BASE}\n[[elements]]\ntype = \"box\"\nentities = [\"sensor.a\"]\n"),
        )
        .unwrap();

        let config = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(config.title, "Home");
        assert!(matches!(config.charts[0], Chart::Box(_)));

        assert!(matches!(
            DashboardConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
