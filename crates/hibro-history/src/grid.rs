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

//! One-second forward-fill grid and the reductions over it.
//!
//! A recorded state holds until the next row, so every slot of the grid
//! carries the value in effect during that second. Runs are stored instead of
//! slots: one entry per row, not one per second.

use crate::cadence::Cadence;
use crate::reducer::Reducer;

const SECONDS_PER_DAY: i64 = 86_400;

/// `value` held over the one-second slots `start..end` (unix seconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Run {
    pub start: i64,
    pub end: i64,
    pub value: f64,
}

impl Run {
    fn slot(second: i64, value: f64) -> Self {
        Self {
            start: second,
            end: second + 1,
            value,
        }
    }

    fn weight(start: i64, end: i64) -> u64 {
        u64::try_from(end - start).unwrap_or(0)
    }
}

/// A series snapped onto a contiguous one-second grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilledSeries {
    runs: Vec<Run>,
}

impl FilledSeries {
    /// Snap `(second, value)` samples, sorted by time, onto the grid.
    ///
    /// Each sample lands in the second it falls in; when several share a
    /// second the last one wins. Empty slots take the most recent prior value.
    /// The grid ends at the last sample's second.
    #[must_use]
    pub fn forward_fill(samples: &[(i64, f64)]) -> Self {
        let mut runs: Vec<Run> = Vec::with_capacity(samples.len());

        for &(second, value) in samples {
            let next = match runs.last_mut() {
                None => Some(Run::slot(second, value)),
                // The newest run is always the single slot of the previous sample
                Some(last) if second < last.end => {
                    last.value = value;
                    None
                }
                Some(last) => {
                    last.end = second;
                    Some(Run::slot(second, value))
                }
            };
            if let Some(run) = next {
                runs.push(run);
            }
        }

        Self { runs }
    }

    #[must_use]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Every slot of the grid, one entry per second.
    pub fn slots(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.runs
            .iter()
            .flat_map(|run| (run.start..run.end).map(move |second| (second, run.value)))
    }

    /// Reduce the grid into left-labelled bins of `cadence`, aligned to
    /// midnight UTC of the first slot's day.
    #[must_use]
    pub fn resample(&self, cadence: &Cadence, reducer: Reducer) -> Vec<(i64, f64)> {
        let Some(first) = self.runs.first() else {
            return Vec::new();
        };

        let step = cadence.seconds();
        let origin = first.start - first.start.rem_euclid(SECONDS_PER_DAY);
        let mut bin_start = origin + (first.start - origin).div_euclid(step) * step;

        let mut bins = Vec::new();
        let mut samples: Vec<(f64, u64)> = Vec::new();

        for run in &self.runs {
            let mut start = run.start;
            while start < run.end {
                let bin_end = bin_start + step;
                if start >= bin_end {
                    if !samples.is_empty() {
                        bins.push((bin_start, reducer.reduce(&samples)));
                        samples.clear();
                    }
                    bin_start = bin_end;
                    continue;
                }
                let end = run.end.min(bin_end);
                samples.push((run.value, Run::weight(start, end)));
                start = end;
            }
        }

        if !samples.is_empty() {
            bins.push((bin_start, reducer.reduce(&samples)));
        }
        bins
    }

    /// Reduce the whole grid to one value, labelled with the first slot.
    #[must_use]
    pub fn aggregate(&self, reducer: Reducer) -> Option<(i64, f64)> {
        let first = self.runs.first()?;
        let samples: Vec<(f64, u64)> = self
            .runs
            .iter()
            .map(|run| (run.value, Run::weight(run.start, run.end)))
            .collect();
        Some((first.start, reducer.reduce(&samples)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_709_251_200; // 2024-03-01 00:00:00 UTC

    fn cadence(alias: &str) -> Cadence {
        alias.parse().unwrap()
    }

    #[test]
    fn test_forward_fill_holds_values() {
        let filled = FilledSeries::forward_fill(&[(T0, 1.0), (T0 + 3, 2.0), (T0 + 4, 5.0)]);
        let slots: Vec<_> = filled.slots().collect();
        assert_eq!(
            slots,
            vec![
                (T0, 1.0),
                (T0 + 1, 1.0),
                (T0 + 2, 1.0),
                (T0 + 3, 2.0),
                (T0 + 4, 5.0)
            ]
        );
    }

    #[test]
    fn test_forward_fill_last_sample_in_second_wins() {
        let filled = FilledSeries::forward_fill(&[(T0, 1.0), (T0, 7.0), (T0 + 2, 3.0), (T0 + 2, 4.0)]);
        let slots: Vec<_> = filled.slots().collect();
        assert_eq!(slots, vec![(T0, 7.0), (T0 + 1, 7.0), (T0 + 2, 4.0)]);
    }

    #[test]
    fn test_forward_fill_extends_then_overwrites() {
        // 1.0 is extended to T0+5 when 2.0 arrives, then 3.0 shares 2.0's second
        let filled = FilledSeries::forward_fill(&[(T0, 1.0), (T0 + 5, 2.0), (T0 + 5, 3.0)]);
        assert_eq!(filled.runs().len(), 2);
        assert_eq!(filled.slots().last(), Some((T0 + 5, 3.0)));
        assert_eq!(filled.slots().count(), 6);
    }

    #[test]
    fn test_resample_weights_by_hold_time() {
        // 10.0 holds for 50 minutes, 70.0 for the last 10 minutes of the hour
        let filled = FilledSeries::forward_fill(&[
            (T0, 10.0),
            (T0 + 3_000, 70.0),
            (T0 + 3_599, 70.0),
        ]);
        let bins = filled.resample(&cadence("1H"), Reducer::Mean);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].0, T0);
        assert!((bins[0].1 - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_resample_two_hours_of_rising_values() {
        let filled = FilledSeries::forward_fill(&[
            (T0 + 600, 1.0),
            (T0 + 1_800, 2.0),
            (T0 + 3_600, 3.0),
            (T0 + 5_400, 4.0),
            (T0 + 7_000, 5.0),
        ]);
        let bins = filled.resample(&cadence("1H"), Reducer::Max);
        assert_eq!(bins, vec![(T0, 2.0), (T0 + 3_600, 5.0)]);
    }

    #[test]
    fn test_resample_bins_align_to_day_start() {
        // Starts mid-bin: first label is the 15 minute boundary before it
        let filled = FilledSeries::forward_fill(&[(T0 + 1_000, 1.0), (T0 + 2_000, 2.0)]);
        let bins = filled.resample(&cadence("15min"), Reducer::First);
        assert_eq!(bins[0].0, T0 + 900);
        assert_eq!(bins[1].0, T0 + 1_800);
    }

    #[test]
    fn test_weekly_bins_start_on_first_sample_day() {
        // T0 is a Friday; weeks run Friday to Friday, labelled on the left
        let week = 7 * SECONDS_PER_DAY;
        let filled = FilledSeries::forward_fill(&[
            (T0 + 36_000, 1.0),
            (T0 + week + 3_600, 2.0),
            (T0 + week + 7_200, 3.0),
        ]);
        let bins = filled.resample(&cadence("1W"), Reducer::Max);
        assert_eq!(bins, vec![(T0, 1.0), (T0 + week, 3.0)]);
    }

    #[test]
    fn test_resample_at_grid_unit_reproduces_grid() {
        let filled = FilledSeries::forward_fill(&[(T0, 1.0), (T0 + 4, 2.5), (T0 + 9, -1.0)]);
        let resampled = filled.resample(&cadence("1S"), Reducer::Mean);
        let slots: Vec<_> = filled.slots().collect();
        assert_eq!(resampled, slots);
    }

    #[test]
    fn test_resample_is_idempotent_on_its_own_grid() {
        let filled = FilledSeries::forward_fill(&[
            (T0 + 120, 3.0),
            (T0 + 4_000, 9.0),
            (T0 + 9_000, 4.0),
        ]);
        let once = filled.resample(&cadence("1H"), Reducer::Mean);
        let again = FilledSeries::forward_fill(&once).resample(&cadence("1H"), Reducer::Mean);

        assert_eq!(once.len(), again.len());
        for ((t1, v1), (t2, v2)) in once.iter().zip(&again) {
            assert_eq!(t1, t2);
            assert!((v1 - v2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_aggregate_whole_window() {
        let filled = FilledSeries::forward_fill(&[(T0, 1.0), (T0 + 1, 5.0), (T0 + 2, 3.0)]);
        assert_eq!(filled.aggregate(Reducer::Ptp), Some((T0, 4.0)));
        let (_, mean) = filled.aggregate(Reducer::Mean).unwrap();
        assert!((mean - 3.0).abs() < 1e-12);
        assert_eq!(FilledSeries::default().aggregate(Reducer::Mean), None);
    }
}
