// =============================================================================
// Price Store — SQLite persistence for observations and computed metrics
// =============================================================================
//
// Two tables:
//   prices     — append-only price observations, one row per coin per poll
//   analytics  — computed metrics keyed (symbol, metric, period, ts);
//                INSERT OR REPLACE keeps re-runs idempotent
//
// Timestamps are stored as UNIX seconds. The series query upholds the
// provider contract: rows come back ascending by timestamp and never after
// `until`.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tracing::info;

use crate::report::Report;
use crate::types::Observation;

/// SQLite-backed store. One connection, serialised behind a mutex — this
/// process is the only writer.
pub struct PriceStore {
    conn: Mutex<Connection>,
}

impl PriceStore {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create data directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Self::init_schema(&conn)?;

        info!(path = %path.display(), "price store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prices (
                 id               INTEGER PRIMARY KEY AUTOINCREMENT,
                 symbol           TEXT NOT NULL,
                 name             TEXT NOT NULL,
                 price_usd        REAL NOT NULL,
                 ts               INTEGER NOT NULL,
                 market_cap       REAL,
                 volume_24h       REAL,
                 price_change_24h REAL
             );
             CREATE TABLE IF NOT EXISTS analytics (
                 id           INTEGER PRIMARY KEY AUTOINCREMENT,
                 symbol       TEXT NOT NULL,
                 metric_name  TEXT NOT NULL,
                 metric_value REAL NOT NULL,
                 time_period  TEXT NOT NULL,
                 ts           INTEGER NOT NULL,
                 UNIQUE(symbol, metric_name, time_period, ts)
             );
             CREATE INDEX IF NOT EXISTS idx_prices_symbol_ts
                 ON prices(symbol, ts);
             CREATE INDEX IF NOT EXISTS idx_analytics_symbol_metric
                 ON analytics(symbol, metric_name);",
        )
        .context("failed to create database schema")
    }

    // -------------------------------------------------------------------------
    // Prices (writer + Series provider)
    // -------------------------------------------------------------------------

    /// Append one observation. `name` is the upstream coin id (e.g.
    /// "bitcoin"), kept alongside the display symbol.
    pub fn insert_observation(&self, name: &str, obs: &Observation) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO prices
                     (symbol, name, price_usd, ts, market_cap, volume_24h, price_change_24h)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    obs.symbol,
                    name,
                    obs.price,
                    obs.timestamp.timestamp(),
                    obs.market_cap,
                    obs.volume_24h,
                    obs.change_24h_pct,
                ],
            )
            .with_context(|| format!("failed to insert observation for {}", obs.symbol))?;
        Ok(())
    }

    /// One symbol's observations in `[since, until]`, ascending by timestamp.
    ///
    /// The `until` bound guarantees the engine never sees a future-dated row
    /// relative to its injected `now`.
    pub fn series(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Observation>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT symbol, price_usd, ts, market_cap, volume_24h, price_change_24h
                 FROM prices
                 WHERE symbol = ?1 AND ts >= ?2 AND ts <= ?3
                 ORDER BY ts ASC, id ASC",
            )
            .context("failed to prepare series query")?;

        let rows = stmt
            .query_map(
                params![symbol, since.timestamp(), until.timestamp()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, Option<f64>>(5)?,
                    ))
                },
            )
            .context("series query failed")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to read series rows")?;

        let mut observations = Vec::with_capacity(rows.len());
        for (symbol, price, ts, market_cap, volume_24h, change_24h_pct) in rows {
            let timestamp = DateTime::<Utc>::from_timestamp(ts, 0)
                .with_context(|| format!("invalid stored timestamp {ts} for {symbol}"))?;
            observations.push(Observation {
                symbol,
                price,
                timestamp,
                market_cap,
                volume_24h,
                change_24h_pct,
            });
        }
        Ok(observations)
    }

    /// Distinct stored symbols, sorted.
    pub fn symbols(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM prices ORDER BY symbol")
            .context("failed to prepare symbols query")?;
        let symbols = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("symbols query failed")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to read symbols")?;
        Ok(symbols)
    }

    // -------------------------------------------------------------------------
    // Analytics (Report sink)
    // -------------------------------------------------------------------------

    /// Persist every present metric of `report` as one analytics row each.
    ///
    /// Absent metrics are simply not written. Re-running for the same
    /// (symbol, metric, period, ts) replaces rather than duplicates.
    /// Returns the number of rows written.
    pub fn store_report(&self, report: &Report) -> Result<usize> {
        let rows = report.metric_rows();
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .context("failed to begin analytics transaction")?;
        let ts = report.generated_at.timestamp();
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO analytics
                         (symbol, metric_name, metric_value, time_period, ts)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .context("failed to prepare analytics insert")?;
            for row in &rows {
                stmt.execute(params![
                    report.symbol,
                    row.metric_name,
                    row.metric_value,
                    row.time_period,
                    ts,
                ])
                .with_context(|| {
                    format!("failed to store {} for {}", row.metric_name, report.symbol)
                })?;
            }
        }
        tx.commit().context("failed to commit analytics rows")?;
        Ok(rows.len())
    }
}
