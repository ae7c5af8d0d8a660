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

use std::path::PathBuf;

use hibro_history::HistoryError;
use thiserror::Error;

/// Errors loading or validating a dashboard configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("elements[{index}]: {reason}")]
    InvalidElement { index: usize, reason: String },

    #[error(
        "Unsupported database URL {0:?}: use sqlite:///relative/path, sqlite:////absolute/path or a plain file path"
    )]
    UnsupportedDatabase(String),

    #[error("Unknown timezone {0:?}")]
    InvalidTimezone(String),
}

/// A chart that could not be composed
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("{entity}: {source}")]
    Series {
        entity: String,
        #[source]
        source: HistoryError,
    },

    #[error("Chart expected {expected} series outcomes, got {actual}")]
    OutcomeMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
