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

use std::fmt;
use std::str::FromStr;

use crate::error::HistoryError;

/// Resampling interval parsed from an offset alias like `1H`, `15min` or `30S`.
///
/// Resolution is one second, the width of the forward-fill grid. Every unit is
/// a fixed span: `W` is seven days binned like `D`, starting at midnight UTC of
/// the first sample's day. It is not the pandas `W-SUN` anchor, which closes
/// and labels weekly bins on the right at each Sunday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cadence {
    seconds: i64,
    alias: String,
}

impl Cadence {
    #[must_use]
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// The alias as written in the configuration
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }
}

fn unit_seconds(unit: &str) -> Option<i64> {
    match unit {
        "S" | "s" | "sec" => Some(1),
        "T" | "min" => Some(60),
        "H" | "h" => Some(3_600),
        "D" | "d" => Some(86_400),
        "W" | "w" => Some(604_800),
        _ => None,
    }
}

impl FromStr for Cadence {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let alias = s.trim();
        let invalid = || HistoryError::InvalidCadence(s.to_owned());

        let split = alias
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (count, unit) = alias.split_at(split);

        let count: i64 = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| invalid())?
        };
        if count == 0 {
            return Err(invalid());
        }

        let seconds = unit_seconds(unit)
            .and_then(|unit| unit.checked_mul(count))
            .ok_or_else(invalid)?;

        Ok(Self {
            seconds,
            alias: alias.to_owned(),
        })
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.alias)
    }
}
