// Data fetching: the two store queries and the soft-fail `fetch_data`.
//
// Any failure here (bad period label, unreachable store, failed query) is
// logged and turned into an empty `FetchResult`; callers treat empty as
// "no data" and stop.
use crate::config::{ReportConfig, StoreBackend, StoreConfig};
use crate::error::{ReportError, ReportResult};
use crate::period::derive_previous_periods;
use crate::types::{YieldLookup, YieldRecord};
use crate::util::format_int;
use csv::ReaderBuilder;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, error, info};

/// Read-only access to yield estimates.
pub trait YieldStore {
    /// Distinct methods with data for `period`/`season`, excluding
    /// `baseline`, sorted ascending.
    fn dynamic_methods(&self, period: &str, season: &str, baseline: &str)
        -> ReportResult<Vec<String>>;

    /// Every row for any of `periods` in `season`, any method.
    fn yield_rows(&self, periods: &[String], season: &str) -> ReportResult<Vec<YieldRecord>>;
}

#[derive(Debug, Default)]
pub struct FetchResult {
    pub lookup: YieldLookup,
    pub methods: Vec<String>,
}

impl FetchResult {
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open an existing database read-only. A missing file is reported as
    /// `StoreUnavailable` rather than silently creating an empty database.
    pub fn open(path: &Path) -> ReportResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ReportError::StoreUnavailable {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Ok(SqliteStore { conn })
    }
}

impl YieldStore for SqliteStore {
    fn dynamic_methods(
        &self,
        period: &str,
        season: &str,
        baseline: &str,
    ) -> ReportResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT method
             FROM crop_yields
             WHERE year = ?1 AND method != ?2 AND season = ?3
             ORDER BY method",
        )?;
        let methods = stmt
            .query_map([period, baseline, season], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(methods)
    }

    fn yield_rows(&self, periods: &[String], season: &str) -> ReportResult<Vec<YieldRecord>> {
        if periods.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; periods.len()].join(", ");
        let sql = format!(
            "SELECT c.corp_name, s.state_name, cy.year, cy.method, cy.yield_value, cy.rmse_value
             FROM crop_yields cy
             JOIN crops c ON c.corp_id = cy.crop_id
             JOIN states s ON s.state_id = cy.state_id
             WHERE cy.year IN ({}) AND cy.season = ?
             ORDER BY c.corp_name, s.state_name, cy.year DESC, cy.method",
            placeholders
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let params = periods.iter().map(String::as_str).chain(std::iter::once(season));
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(YieldRecord {
                    crop: row.get(0)?,
                    state: row.get(1)?,
                    year: row.get(2)?,
                    method: row.get(3)?,
                    yield_value: row.get(4)?,
                    error_value: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// One line of a flat CSV export of the yields table.
#[derive(Debug, Deserialize)]
struct CsvRow {
    crop: String,
    state: String,
    year: String,
    season: String,
    method: String,
    yield_value: Option<f64>,
    rmse_value: Option<f64>,
}

/// In-memory store over a CSV export with header
/// `crop,state,year,season,method,yield_value,rmse_value`.
pub struct CsvStore {
    rows: Vec<CsvRow>,
}

impl CsvStore {
    pub fn open(path: &Path) -> ReportResult<Self> {
        let mut rdr = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| ReportError::StoreUnavailable {
                reason: format!("{}: {}", path.display(), e),
            })?;
        let mut rows = Vec::new();
        for result in rdr.deserialize::<CsvRow>() {
            rows.push(result?);
        }
        debug!(rows = rows.len(), path = %path.display(), "loaded csv store");
        Ok(CsvStore { rows })
    }
}

impl YieldStore for CsvStore {
    fn dynamic_methods(
        &self,
        period: &str,
        season: &str,
        baseline: &str,
    ) -> ReportResult<Vec<String>> {
        let methods: BTreeSet<&str> = self
            .rows
            .iter()
            .filter(|r| r.year == period && r.season == season && r.method != baseline)
            .map(|r| r.method.as_str())
            .collect();
        Ok(methods.into_iter().map(str::to_string).collect())
    }

    fn yield_rows(&self, periods: &[String], season: &str) -> ReportResult<Vec<YieldRecord>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.season == season && periods.contains(&r.year))
            .map(|r| YieldRecord {
                crop: r.crop.clone(),
                state: r.state.clone(),
                year: r.year.clone(),
                method: r.method.clone(),
                yield_value: r.yield_value,
                error_value: r.rmse_value,
            })
            .collect())
    }
}

/// Open the configured store. The returned box owns the connection; dropping
/// it closes the store.
pub fn open_store(config: &StoreConfig) -> ReportResult<Box<dyn YieldStore>> {
    match config.backend {
        StoreBackend::Sqlite => Ok(Box::new(SqliteStore::open(&config.path)?)),
        StoreBackend::Csv => Ok(Box::new(CsvStore::open(&config.path)?)),
    }
}

/// Run both queries for `period` and its two preceding periods.
pub fn query_store(
    store: &dyn YieldStore,
    period: &str,
    season: &str,
    baseline: &str,
) -> ReportResult<FetchResult> {
    let mut target_years = vec![period.to_string()];
    target_years.extend(derive_previous_periods(period, 2)?);
    info!(years = %target_years.join(", "), season, "querying store");

    let methods = store.dynamic_methods(period, season, baseline)?;
    let lookup = YieldLookup::from_records(store.yield_rows(&target_years, season)?);
    info!(
        "fetched {} entries, {} dynamic methods",
        format_int(lookup.len()),
        methods.len()
    );
    Ok(FetchResult { lookup, methods })
}

/// Soft-fail fetch: every error becomes an empty result plus a diagnostic.
pub fn fetch_data(config: &ReportConfig, period: &str, season: &str) -> FetchResult {
    // Validate the label before touching the store.
    if let Err(e) = derive_previous_periods(period, 2) {
        error!("year parsing error: {}", e);
        return FetchResult::default();
    }
    let result = open_store(&config.store)
        .and_then(|store| query_store(store.as_ref(), period, season, &config.baseline_method));
    match result {
        Ok(fetched) => fetched,
        Err(e @ ReportError::StoreUnavailable { .. }) => {
            error!("database connection error: {}", e);
            FetchResult::default()
        }
        Err(e) => {
            error!("database query error: {}", e);
            FetchResult::default()
        }
    }
}
