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

//! Error types for history retrieval and transformation

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// No rows for the entity inside the requested window.
    #[error("no history found for {entity}")]
    NotFound { entity: String },

    /// A value survived sentinel filtering but is not numeric.
    #[error("{entity}: row {row} holds non-numeric value {value}")]
    DataQuality {
        entity: String,
        row: usize,
        value: String,
    },

    #[error("unsupported aggregate: {0}")]
    UnsupportedAggregate(String),

    #[error("invalid resample cadence: {0}")]
    InvalidCadence(String),

    #[error("{entity}: malformed attributes payload in row {row}: {detail}")]
    MalformedMetadata {
        entity: String,
        row: usize,
        detail: String,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("history store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl HistoryError {
    /// `NotFound` is the only recoverable condition; callers render it as an empty result.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;
