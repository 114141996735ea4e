use crate::config::ReportConfig;
use crate::error::{ReportError, ReportResult};
use crate::header::build_dynamic_headers;
use crate::loader::{fetch_data, FetchResult};
use crate::output::{self, ReportDocument};
use crate::types::{HeaderLayout, Orientation, YieldLookup};
use crate::util::{footer_text, format_value, title_case};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// A header cell positioned at `column` in one of the two header rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub text: String,
    pub column: usize,
    pub col_span: usize,
    pub row_span: usize,
}

/// One crop's table, independent of the document backend.
///
/// `header[0]` holds the "State" cell, every group's super-header, and the
/// two-row cells of non-spanning groups; `header[1]` holds only sub-column
/// labels.
#[derive(Debug, Clone, PartialEq)]
pub struct CropTable {
    pub crop: String,
    pub num_cols: usize,
    pub header: [Vec<HeaderCell>; 2],
    pub rows: Vec<Vec<String>>,
}

impl CropTable {
    pub const HEADER_ROWS: usize = 2;

    /// One label per column, for renderers without merged cells.
    pub fn flat_header(&self) -> Vec<String> {
        let mut labels = vec![String::new(); self.num_cols];
        for cell in &self.header[0] {
            let text = cell.text.replace('\n', " ");
            for col in cell.column..cell.column + cell.col_span {
                labels[col] = text.clone();
            }
        }
        for cell in &self.header[1] {
            labels[cell.column] = format!("{} {}", labels[cell.column], cell.text);
        }
        labels
    }
}

fn check_column(column: usize, num_cols: usize) -> ReportResult<()> {
    if column >= num_cols {
        return Err(ReportError::LayoutMismatch { column, num_cols });
    }
    Ok(())
}

fn build_header(layout: &HeaderLayout) -> ReportResult<[Vec<HeaderCell>; 2]> {
    let num_cols = layout.num_cols();
    let mut top = vec![HeaderCell {
        text: "State".to_string(),
        column: 0,
        col_span: 1,
        row_span: 2,
    }];
    let mut bottom = Vec::new();

    let mut col = 1;
    for group in &layout.groups {
        check_column(col + group.width() - 1, num_cols)?;
        if group.is_spanning() {
            top.push(HeaderCell {
                text: format!("{} {}", group.period, group.method),
                column: col,
                col_span: group.width(),
                row_span: 1,
            });
            for sub in &group.sub_columns {
                bottom.push(HeaderCell {
                    text: sub.clone(),
                    column: col,
                    col_span: 1,
                    row_span: 1,
                });
                col += 1;
            }
        } else {
            top.push(HeaderCell {
                text: format!("{}\n{}", group.period, group.method),
                column: col,
                col_span: 1,
                row_span: 2,
            });
            col += 1;
        }
    }
    Ok([top, bottom])
}

fn build_row(
    lookup: &YieldLookup,
    layout: &HeaderLayout,
    crop: &str,
    state: &str,
) -> ReportResult<Vec<String>> {
    let num_cols = layout.num_cols();
    let mut row = Vec::with_capacity(num_cols);
    row.push(state.to_string());
    for group in &layout.groups {
        let value = lookup.get(crop, state, &group.period, &group.method);
        if group.is_spanning() {
            for i in 0..group.sub_columns.len() {
                check_column(row.len(), num_cols)?;
                row.push(format_value(value.component(i)));
            }
        } else {
            check_column(row.len(), num_cols)?;
            row.push(format_value(value.yield_value));
        }
    }
    if row.len() != num_cols {
        return Err(ReportError::LayoutMismatch {
            column: row.len(),
            num_cols,
        });
    }
    Ok(row)
}

/// Reshape the lookup into one table per crop, crops and states sorted.
/// Crops without any state rows are skipped.
pub fn build_crop_tables(lookup: &YieldLookup, layout: &HeaderLayout) -> ReportResult<Vec<CropTable>> {
    let header = build_header(layout)?;
    let mut tables = Vec::new();
    for crop in lookup.crops() {
        let states = lookup.states(crop);
        if states.is_empty() {
            warn!("skipping crop '{}' (no state data found)", crop);
            continue;
        }
        info!("processing report for crop: {}", title_case(crop));
        let rows = states
            .iter()
            .map(|state| build_row(lookup, layout, crop, state))
            .collect::<ReportResult<Vec<_>>>()?;
        tables.push(CropTable {
            crop: crop.to_string(),
            num_cols: layout.num_cols(),
            header: header.clone(),
            rows,
        });
    }
    Ok(tables)
}

/// Everything the CLI collects for one report run.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub output: PathBuf,
    pub orientation: Orientation,
    pub logo: PathBuf,
    pub period: String,
    pub season: String,
    pub preview: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Written { path: PathBuf, crops: usize },
    Aborted { reason: String },
}

impl ReportOutcome {
    fn aborted(reason: String) -> Self {
        error!("report generation failed: {}", reason);
        ReportOutcome::Aborted { reason }
    }

    fn empty(reason: &str) -> Self {
        Self::aborted(
            ReportError::EmptyResult {
                reason: reason.to_string(),
            }
            .to_string(),
        )
    }
}

/// Fetch, lay out and write the report. Never panics or returns an error:
/// every failure ends as `ReportOutcome::Aborted` with a logged reason.
pub fn create_report(request: &ReportRequest, config: &ReportConfig) -> ReportOutcome {
    let fetched = fetch_data(config, &request.period, &request.season);
    render_report(request, config, &fetched)
}

pub fn render_report(
    request: &ReportRequest,
    config: &ReportConfig,
    fetched: &FetchResult,
) -> ReportOutcome {
    if fetched.is_empty() {
        return ReportOutcome::empty(&format!(
            "no data could be processed for {} ({})",
            request.period, request.season
        ));
    }

    let layout = build_dynamic_headers(
        &request.period,
        &fetched.methods,
        &config.baseline_method,
        &config.sub_columns,
    );
    if layout.is_empty() {
        return ReportOutcome::empty("could not build any table headers");
    }

    let tables = match build_crop_tables(&fetched.lookup, &layout) {
        Ok(t) if t.is_empty() => return ReportOutcome::empty("no crop has any state data"),
        Ok(t) => t,
        Err(e) => return ReportOutcome::aborted(e.to_string()),
    };

    if request.preview {
        output::preview_tables(&tables);
    }

    let logo = match output::load_logo(&request.logo) {
        Ok(logo) => Some(logo),
        Err(e) => {
            warn!("{}; continuing without logo", e);
            None
        }
    };

    let document = ReportDocument {
        orientation: request.orientation,
        logo,
        title: config.organisation.clone(),
        subtitle: config.contact_line.clone(),
        heading: format!(
            "Crop wise yield forecasts : {} Season {}",
            title_case(&request.season),
            request.period
        ),
        footer: footer_text(&config.attribution, chrono::Local::now().date_naive()),
        tables,
    };
    let crops = document.tables.len();
    match output::write_docx(&request.output, &document) {
        Ok(()) => {
            info!("report generated successfully -> {}", request.output.display());
            ReportOutcome::Written {
                path: request.output.clone(),
                crops,
            }
        }
        Err(e) => ReportOutcome::aborted(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnGroup, YieldRecord};

    fn subs() -> Vec<String> {
        vec!["Yield".to_string(), "Error".to_string()]
    }

    fn record(crop: &str, state: &str, year: &str, method: &str, y: f64, e: Option<f64>) -> YieldRecord {
        YieldRecord {
            crop: crop.into(),
            state: state.into(),
            year: year.into(),
            method: method.into(),
            yield_value: Some(y),
            error_value: e,
        }
    }

    fn request(dir: &std::path::Path) -> ReportRequest {
        ReportRequest {
            output: dir.join("report.docx"),
            orientation: Orientation::Portrait,
            logo: dir.join("missing-logo.png"),
            period: "2024-25".to_string(),
            season: "kharif".to_string(),
            preview: false,
        }
    }

    #[test]
    fn single_state_single_method_scenario() {
        let lookup = YieldLookup::from_records(vec![record("Rice", "Assam", "2024-25", "ARIMA", 3.2, Some(0.1))]);
        let layout = build_dynamic_headers("2024-25", &["ARIMA".to_string()], "MoA&FW", &subs());
        let tables = build_crop_tables(&lookup, &layout).unwrap();

        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.crop, "rice");
        assert_eq!(CropTable::HEADER_ROWS, 2);
        assert_eq!(t.header.len(), 2);
        assert_eq!(t.num_cols, 5);
        assert_eq!(t.rows, vec![vec!["Assam", "3.2", "0.1", "", ""]]);
    }

    #[test]
    fn header_cells_span_as_laid_out() {
        let layout = build_dynamic_headers("2024-25", &["ARIMA".to_string()], "MoA&FW", &subs());
        let [top, bottom] = build_header(&layout).unwrap();
        let spans: Vec<(&str, usize, usize, usize)> = top
            .iter()
            .map(|c| (c.text.as_str(), c.column, c.col_span, c.row_span))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("State", 0, 1, 2),
                ("2024-25 ARIMA", 1, 2, 1),
                ("2023-24\nMoA&FW", 3, 1, 2),
                ("2022-23\nMoA&FW", 4, 1, 2),
            ]
        );
        let labels: Vec<(&str, usize)> = bottom.iter().map(|c| (c.text.as_str(), c.column)).collect();
        assert_eq!(labels, vec![("Yield", 1), ("Error", 2)]);
    }

    #[test]
    fn lookup_miss_is_blank_pair() {
        let lookup = YieldLookup::from_records(vec![
            record("Rice", "Assam", "2024-25", "ARIMA", 2.0, None),
            record("Rice", "Bihar", "2023-24", "MoA&FW", 1.5, None),
        ]);
        let layout = build_dynamic_headers("2024-25", &["ARIMA".to_string()], "MoA&FW", &subs());
        let tables = build_crop_tables(&lookup, &layout).unwrap();
        let rows = &tables[0].rows;
        assert_eq!(rows[0], vec!["Assam", "2.0", "", "", ""]);
        assert_eq!(rows[1], vec!["Bihar", "", "", "1.5", ""]);
        assert!(rows.iter().flatten().all(|c| c != "None"));
    }

    #[test]
    fn crops_and_states_are_sorted() {
        let lookup = YieldLookup::from_records(vec![
            record("Wheat", "Punjab", "2024-25", "RF", 4.0, None),
            record("rice", "Bihar", "2024-25", "RF", 2.0, None),
            record("Rice", "Assam", "2024-25", "RF", 2.2, None),
        ]);
        let layout = build_dynamic_headers("2024-25", &["RF".to_string()], "MoA&FW", &subs());
        let tables = build_crop_tables(&lookup, &layout).unwrap();
        let crops: Vec<&str> = tables.iter().map(|t| t.crop.as_str()).collect();
        assert_eq!(crops, vec!["rice", "wheat"]);
        let states: Vec<&str> = tables[0].rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(states, vec!["Assam", "Bihar"]);
    }

    #[test]
    fn wide_groups_fill_extra_sub_columns_blank() {
        let lookup = YieldLookup::from_records(vec![record("Rice", "Assam", "2024-25", "RF", 2.0, Some(0.3))]);
        let three = vec!["Yield".to_string(), "Error".to_string(), "Note".to_string()];
        let layout = HeaderLayout {
            groups: vec![ColumnGroup::new("2024-25", "RF", &three)],
        };
        let tables = build_crop_tables(&lookup, &layout).unwrap();
        assert_eq!(tables[0].rows[0], vec!["Assam", "2.0", "0.3", ""]);
    }

    #[test]
    fn flat_header_joins_super_and_sub_labels() {
        let lookup = YieldLookup::from_records(vec![record("Rice", "Assam", "2024-25", "ARIMA", 3.2, None)]);
        let layout = build_dynamic_headers("2024-25", &["ARIMA".to_string()], "MoA&FW", &subs());
        let tables = build_crop_tables(&lookup, &layout).unwrap();
        assert_eq!(
            tables[0].flat_header(),
            vec![
                "State",
                "2024-25 ARIMA Yield",
                "2024-25 ARIMA Error",
                "2023-24 MoA&FW",
                "2022-23 MoA&FW"
            ]
        );
    }

    #[test]
    fn empty_fetch_aborts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        let outcome = render_report(&req, &ReportConfig::default(), &FetchResult::default());
        assert!(matches!(outcome, ReportOutcome::Aborted { .. }));
        assert!(!req.output.exists());
    }

    #[test]
    fn malformed_period_aborts_at_header_stage() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path());
        req.period = "2024/25".to_string();
        let fetched = FetchResult {
            lookup: YieldLookup::from_records(vec![record("Rice", "Assam", "2024/25", "RF", 1.0, None)]),
            methods: vec!["RF".to_string()],
        };
        match render_report(&req, &ReportConfig::default(), &fetched) {
            ReportOutcome::Aborted { reason } => assert!(reason.contains("headers")),
            other => panic!("expected abort, got {other:?}"),
        }
    }

    #[test]
    fn writes_document_without_logo() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        let fetched = FetchResult {
            lookup: YieldLookup::from_records(vec![
                record("Rice", "Assam", "2024-25", "ARIMA", 3.2, Some(0.1)),
                record("Maize", "Bihar", "2023-24", "MoA&FW", 2.7, None),
            ]),
            methods: vec!["ARIMA".to_string()],
        };
        let outcome = render_report(&req, &ReportConfig::default(), &fetched);
        assert_eq!(
            outcome,
            ReportOutcome::Written {
                path: req.output.clone(),
                crops: 2
            }
        );
        assert!(req.output.exists());
    }

    #[test]
    fn create_report_end_to_end_from_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("yields.db");
        crate::loader::tests::seed_sqlite(&db);
        let mut config = ReportConfig::default();
        config.store.path = db;
        let mut req = request(dir.path());
        req.season = "Kharif".to_string();

        let outcome = create_report(&req, &config);
        assert!(matches!(outcome, ReportOutcome::Written { crops: 1, .. }));
        assert!(req.output.exists());
    }
}
