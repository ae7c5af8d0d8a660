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

//! Dashboard configuration and chart composition on top of `hibro-history`.

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod figure;

pub use chart::Chart;
pub use config::{DEFAULT_TITLE, DashboardConfig, EntitySpec, database_path, resolve_timezone};
pub use dashboard::{Dashboard, Panel, build_dashboard};
pub use error::{ChartError, ConfigError};
pub use figure::Figure;
