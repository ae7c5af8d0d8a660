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

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];

/// A `created` value as the store hands it out.
///
/// Home Assistant databases written by different versions disagree on whether
/// the column carries an offset, so both shapes are kept until the timezone
/// normalization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// No zone attached; interpreted as UTC.
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognised timestamp {0:?}")]
struct TimestampParseError(String);

impl Timestamp {
    /// Parse the textual forms SQLite stores: space or `T` separator, optional
    /// fraction, optional `Z` or `±HH:MM` suffix.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();

        if let Some(utc) = text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
            return parse_naive(utc).map(|naive| Self::Aware(naive.and_utc().fixed_offset()));
        }

        if let Some(aware) = OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::<FixedOffset>::parse_from_str(text, fmt).ok())
        {
            return Some(Self::Aware(aware));
        }

        parse_naive(text).map(Self::Naive)
    }

    #[must_use]
    pub fn is_naive(&self) -> bool {
        matches!(self, Self::Naive(_))
    }

    /// The instant this timestamp denotes, assuming UTC for naive values.
    #[must_use]
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::Naive(naive) => naive.and_utc(),
            Self::Aware(aware) => aware.with_timezone(&Utc),
        }
    }

    /// Build a timestamp for `instant` with the same shape as `self`
    /// (naive stays naive, aware keeps its offset).
    #[must_use]
    pub fn with_instant(&self, instant: DateTime<Utc>) -> Self {
        match self {
            Self::Naive(_) => Self::Naive(instant.naive_utc()),
            Self::Aware(aware) => Self::Aware(instant.with_timezone(aware.offset())),
        }
    }

    /// Attach UTC when no zone is present, then convert to `tz`.
    #[must_use]
    pub fn localize(&self, tz: &Tz) -> DateTime<Tz> {
        self.to_utc().with_timezone(tz)
    }
}

impl<T: TimeZone> From<DateTime<T>> for Timestamp {
    fn from(value: DateTime<T>) -> Self {
        Self::Aware(value.fixed_offset())
    }
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(_) => {
                let text = value.as_str()?;
                Self::parse(text)
                    .ok_or_else(|| FromSqlError::Other(Box::new(TimestampParseError(text.to_owned()))))
            }
            ValueRef::Integer(secs) => DateTime::<Utc>::from_timestamp(secs, 0)
                .map(Self::from)
                .ok_or(FromSqlError::OutOfRange(secs)),
            ValueRef::Real(secs) => {
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "unix seconds fit i64 and the fraction is within 0..1e9"
                )]
                let instant = DateTime::<Utc>::from_timestamp(
                    secs.floor() as i64,
                    ((secs - secs.floor()) * 1e9).round().min(999_999_999.0) as u32,
                );
                instant
                    .map(Self::from)
                    .ok_or_else(|| FromSqlError::Other(Box::new(TimestampParseError(secs.to_string()))))
            }
            ValueRef::Null | ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn naive(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_parse_naive_with_fraction() {
        let ts = Timestamp::parse("2024-03-01 12:30:05.250000").unwrap();
        assert!(ts.is_naive());
        assert_eq!(ts.to_utc().nanosecond(), 250_000_000);
        assert_eq!(ts.to_utc().naive_utc().with_nanosecond(0).unwrap(), naive(12, 30, 5));
    }

    #[test]
    fn test_parse_without_fraction_and_t_separator() {
        let ts = Timestamp::parse("2024-03-01T12:30:05").unwrap();
        assert_eq!(ts, Timestamp::Naive(naive(12, 30, 5)));
    }

    #[test]
    fn test_parse_offset_forms() {
        let plus = Timestamp::parse("2024-03-01 13:30:05+01:00").unwrap();
        assert!(!plus.is_naive());
        assert_eq!(plus.to_utc().naive_utc(), naive(12, 30, 5));

        let zulu = Timestamp::parse("2024-03-01T12:30:05Z").unwrap();
        assert_eq!(zulu.to_utc().naive_utc(), naive(12, 30, 5));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_none());
        assert!(Timestamp::parse("").is_none());
    }

    #[test]
    fn test_with_instant_keeps_shape() {
        let instant = naive(8, 0, 0).and_utc();

        let from_naive = Timestamp::Naive(naive(1, 0, 0)).with_instant(instant);
        assert_eq!(from_naive, Timestamp::Naive(naive(8, 0, 0)));

        let aware = Timestamp::parse("2024-03-01 02:00:00+02:00").unwrap();
        match aware.with_instant(instant) {
            Timestamp::Aware(dt) => {
                assert_eq!(dt.offset().local_minus_utc(), 7200);
                assert_eq!(dt.with_timezone(&Utc), instant);
            }
            Timestamp::Naive(_) => panic!("expected aware timestamp"),
        }
    }

    #[test]
    fn test_localize_assumes_utc_for_naive() {
        let tz: Tz = "Europe/Prague".parse().unwrap();
        let local = Timestamp::Naive(naive(12, 0, 0)).localize(&tz);
        assert_eq!(local.naive_local(), naive(13, 0, 0));
    }

    #[test]
    fn test_localize_is_idempotent() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let once = Timestamp::Naive(naive(12, 0, 0)).localize(&tz);
        let twice = Timestamp::from(once).localize(&tz);
        assert_eq!(once, twice);
        assert_eq!(once.naive_local(), twice.naive_local());
    }
}
