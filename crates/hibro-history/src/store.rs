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

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, Row, params};
use tracing::debug;

use crate::error::Result;
use crate::types::{HistoryRecord, SeriesQuery};

/// Text rows dated before this bound cannot fall inside the window: every
/// textual `created` form starts with its local `YYYY-MM-DD`, and no UTC
/// offset moves a row by a whole day.
fn date_prefilter(since: DateTime<Utc>) -> Option<String> {
    since
        .checked_sub_signed(Duration::days(1))
        .map(|bound| bound.format("%Y-%m-%d").to_string())
}

/// Read access to recorded state history.
/// The pipeline depends only on this trait, not on how rows are queried.
pub trait HistoryStore: Send + Sync {
    /// Rows for `query.entity_id` with `created >= query.since`, oldest first.
    fn fetch_history(&self, query: &SeriesQuery) -> Result<Vec<HistoryRecord>>;
}

/// Home Assistant recorder database (`states` table) opened read-only.
#[derive(Debug)]
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )?;
        debug!("Opened history database {}", path.as_ref().display());
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already open connection (in-memory databases, tests).
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<HistoryRecord> {
    Ok(HistoryRecord {
        created: row.get(0)?,
        state: row.get(1)?,
        attributes: row.get(2)?,
    })
}

impl HistoryStore for SqliteHistoryStore {
    fn fetch_history(&self, query: &SeriesQuery) -> Result<Vec<HistoryRecord>> {
        let prefilter = query.since.and_then(date_prefilter);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT created, state, attributes
             FROM states
             WHERE entity_id = ?1
               AND (?2 IS NULL OR typeof(created) IN ('integer', 'real') OR created >= ?2)
             ORDER BY created ASC",
        )?;

        let mut records = stmt
            .query_map(params![query.entity_id, prefilter], map_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        drop(conn);

        // `created` mixes offsets, separators and unix seconds, so the exact
        // window and the order are decided on instants.
        if let Some(since) = query.since {
            records.retain(|record| record.created.to_utc() >= since);
        }
        records.sort_by_key(|record| record.created.to_utc());

        debug!(
            "Fetched {} rows for {} (since {:?})",
            records.len(),
            query.entity_id,
            query.since
        );
        Ok(records)
    }
}
