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

//! HiBro history pipeline
//!
//! Reads the recorded state history of one Home Assistant entity and turns it
//! into a clean series for charting.
//!
//! ## Stages
//!
//! - **Reader**: bounded query against a [`HistoryStore`], metadata from the
//!   first row, state or attribute values per row
//! - **Transformer**: sentinel filtering, numeric coercion, forward-filled
//!   resampling or whole-window aggregation, timezone normalization

pub mod cadence;
pub mod error;
pub mod grid;
pub mod reader;
pub mod reducer;
pub mod store;
pub mod timestamp;
pub mod transform;
pub mod types;

pub use cadence::Cadence;
pub use error::{HistoryError, Result};
pub use reader::{read_series, read_series_at};
pub use reducer::Reducer;
pub use store::{HistoryStore, SqliteHistoryStore};
pub use timestamp::Timestamp;
pub use transform::{TransformOptions, compose_label, fetch_series, transform};
pub use types::*;
