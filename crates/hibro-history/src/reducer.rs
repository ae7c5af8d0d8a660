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

/// Named aggregation function applied to forward-filled samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reducer {
    #[default]
    Mean,
    Median,
    Sum,
    Min,
    Max,
    /// Peak-to-peak: max minus min
    Ptp,
    /// Sample standard deviation (one degree of freedom)
    Std,
    /// Sample variance (one degree of freedom)
    Var,
    Count,
    First,
    Last,
    Prod,
}

impl Reducer {
    pub const ALL: [Self; 12] = [
        Self::Mean,
        Self::Median,
        Self::Sum,
        Self::Min,
        Self::Max,
        Self::Ptp,
        Self::Std,
        Self::Var,
        Self::Count,
        Self::First,
        Self::Last,
        Self::Prod,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Ptp => "ptp",
            Self::Std => "std",
            Self::Var => "var",
            Self::Count => "count",
            Self::First => "first",
            Self::Last => "last",
            Self::Prod => "prod",
        }
    }

    /// Reduce `(value, weight)` samples, where the weight is the number of grid
    /// slots the value held for. NaN values are skipped.
    #[must_use]
    pub fn reduce(self, samples: &[(f64, u64)]) -> f64 {
        let valid: Vec<(f64, u64)> = samples
            .iter()
            .copied()
            .filter(|&(value, weight)| !value.is_nan() && weight > 0)
            .collect();
        let total: u64 = valid.iter().map(|&(_, weight)| weight).sum();

        if total == 0 {
            return match self {
                Self::Sum | Self::Count => 0.0,
                Self::Prod => 1.0,
                Self::Mean
                | Self::Median
                | Self::Min
                | Self::Max
                | Self::Ptp
                | Self::Std
                | Self::Var
                | Self::First
                | Self::Last => f64::NAN,
            };
        }

        match self {
            Self::Mean => weighted_sum(&valid) / as_f64(total),
            Self::Sum => weighted_sum(&valid),
            Self::Min => min(&valid),
            Self::Max => max(&valid),
            Self::Ptp => max(&valid) - min(&valid),
            Self::Median => median(valid, total),
            Self::Var => variance(&valid, total),
            Self::Std => variance(&valid, total).sqrt(),
            Self::Count => as_f64(total),
            Self::First => valid[0].0,
            Self::Last => valid[valid.len() - 1].0,
            Self::Prod => valid
                .iter()
                .map(|&(value, weight)| value.powf(as_f64(weight)))
                .product(),
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "grid slot counts stay far below 2^52"
)]
fn as_f64(weight: u64) -> f64 {
    weight as f64
}

fn weighted_sum(samples: &[(f64, u64)]) -> f64 {
    samples
        .iter()
        .map(|&(value, weight)| value * as_f64(weight))
        .sum()
}

fn min(samples: &[(f64, u64)]) -> f64 {
    samples
        .iter()
        .map(|&(value, _)| value)
        .fold(f64::INFINITY, f64::min)
}

fn max(samples: &[(f64, u64)]) -> f64 {
    samples
        .iter()
        .map(|&(value, _)| value)
        .fold(f64::NEG_INFINITY, f64::max)
}

fn variance(samples: &[(f64, u64)], total: u64) -> f64 {
    if total < 2 {
        return f64::NAN;
    }
    let mean = weighted_sum(samples) / as_f64(total);
    let squares: f64 = samples
        .iter()
        .map(|&(value, weight)| as_f64(weight) * (value - mean).powi(2))
        .sum();
    squares / as_f64(total - 1)
}

/// Median over the expanded samples; even counts average the two middle values.
#[expect(clippy::integer_division, reason = "index of the middle slot")]
fn median(mut samples: Vec<(f64, u64)>, total: u64) -> f64 {
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));

    let nth = |k: u64| {
        let mut seen = 0;
        for &(value, weight) in &samples {
            seen += weight;
            if seen > k {
                return value;
            }
        }
        f64::NAN
    };

    let mid = total / 2;
    if total % 2 == 1 {
        nth(mid)
    } else {
        (nth(mid - 1) + nth(mid)) / 2.0
    }
}

impl FromStr for Reducer {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|reducer| reducer.name() == s)
            .ok_or_else(|| HistoryError::UnsupportedAggregate(s.to_owned()))
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
