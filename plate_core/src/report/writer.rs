//! Report writers.
//!
//! The output format follows the file extension:
//!
//! - `.xlsx`: a `Selection` sheet with [`REPORT_COLUMNS`] and a `Summary`
//!   sheet with the run metadata
//! - `.csv`: the selection rows only
//! - `.json`: the whole [`SelectionReport`], unrounded
//!
//! Weights are rounded to 2 decimals and lengths to 3 decimals for the
//! spreadsheet formats. All writes go through [`crate::file_io`] and are
//! atomic.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::{ReportRow, SelectionReport, REPORT_COLUMNS};
use crate::errors::{PlateError, PlateResult};
use crate::file_io::{write_atomic, write_atomic_with};

const SELECTION_SHEET: &str = "Selection";
const SUMMARY_SHEET: &str = "Summary";

const WEIGHT_DECIMALS: u32 = 2;
const LENGTH_DECIMALS: u32 = 3;

/// Output format of a report file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Xlsx,
    Csv,
    Json,
}

impl ReportFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> PlateResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "xlsx" => Ok(ReportFormat::Xlsx),
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(PlateError::file_error(
                "write report",
                path.display().to_string(),
                format!("unsupported report format '{}', expected .xlsx, .csv or .json", other),
            )),
        }
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// A typed cell of the selection sheet
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number { value: f64, decimals: Option<u32> },
    Empty,
}

impl Cell {
    fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    fn int(n: impl Into<f64>) -> Self {
        Cell::Number {
            value: n.into(),
            decimals: None,
        }
    }

    fn rounded(value: f64, decimals: u32) -> Self {
        Cell::Number {
            value: round_to(value, decimals),
            decimals: Some(decimals),
        }
    }

    fn plain(value: Option<f64>) -> Self {
        value.map_or(Cell::Empty, |value| Cell::Number { value, decimals: None })
    }

    fn to_csv_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number {
                value,
                decimals: Some(d),
            } => format!("{:.*}", *d as usize, value),
            Cell::Number { value, decimals: None } => value.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

/// Cells of a row in [`REPORT_COLUMNS`] order
fn row_cells(row: &ReportRow) -> Vec<Cell> {
    vec![
        Cell::text(&row.mark),
        Cell::text(&row.member_id),
        Cell::int(row.segment_index as u32),
        Cell::int(row.quantity),
        Cell::text(row.frame_type.tag()),
        Cell::text(row.design_code.map(|c| c.tag()).unwrap_or("")),
        Cell::rounded(row.start_m, LENGTH_DECIMALS),
        Cell::rounded(row.length_m, LENGTH_DECIMALS),
        Cell::plain(row.web.map(|p| p.thickness_mm)),
        Cell::plain(row.web.map(|p| p.width_mm)),
        Cell::plain(row.flange.map(|p| p.thickness_mm)),
        Cell::plain(row.flange.map(|p| p.width_mm)),
        row.weight_kg
            .map_or(Cell::Empty, |w| Cell::rounded(w, WEIGHT_DECIMALS)),
        Cell::text(if row.feasible { "Yes" } else { "No" }),
        Cell::text(&row.code_check),
        Cell::int(row.candidates_considered as u32),
        Cell::int(row.feasible_candidates as u32),
        Cell::text(&row.notes),
    ]
}

/// Write `report` to `path` in the format its extension names
pub fn write_report(report: &SelectionReport, path: &Path) -> PlateResult<()> {
    let format = ReportFormat::from_path(path)?;
    match format {
        ReportFormat::Xlsx => write_xlsx(report, path)?,
        ReportFormat::Csv => write_csv(report, path)?,
        ReportFormat::Json => write_json(report, path)?,
    }
    tracing::info!(path = %path.display(), ?format, rows = report.rows.len(), "wrote report");
    Ok(())
}

/// Selection rows as CSV text
pub fn to_csv_bytes(report: &SelectionReport) -> PlateResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| PlateError::serialization(format!("csv: {}", e));

    writer.write_record(REPORT_COLUMNS).map_err(csv_err)?;
    for row in &report.rows {
        writer
            .write_record(row_cells(row).iter().map(Cell::to_csv_field))
            .map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| PlateError::serialization(format!("csv: {}", e)))
}

fn write_csv(report: &SelectionReport, path: &Path) -> PlateResult<()> {
    write_atomic(path, &to_csv_bytes(report)?)
}

fn write_json(report: &SelectionReport, path: &Path) -> PlateResult<()> {
    let json = serde_json::to_vec_pretty(report).map_err(|e| PlateError::serialization(e.to_string()))?;
    write_atomic(path, &json)
}

fn write_xlsx(report: &SelectionReport, path: &Path) -> PlateResult<()> {
    let xlsx_err = |e: XlsxError| PlateError::file_error("write xlsx", path.display().to_string(), e.to_string());

    let mut workbook = Workbook::new();
    write_selection_sheet(workbook.add_worksheet(), report).map_err(xlsx_err)?;
    write_summary_sheet(workbook.add_worksheet(), report).map_err(xlsx_err)?;

    write_atomic_with(path, |tmp_path| workbook.save(tmp_path).map_err(xlsx_err))
}

fn write_selection_sheet(sheet: &mut Worksheet, report: &SelectionReport) -> Result<(), XlsxError> {
    let header = Format::new().set_bold();
    let two_dp = Format::new().set_num_format("0.00");
    let three_dp = Format::new().set_num_format("0.000");

    sheet.set_name(SELECTION_SHEET)?;
    for (col, title) in REPORT_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (i, row) in report.rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, cell) in row_cells(row).into_iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Cell::Number {
                    value,
                    decimals: Some(WEIGHT_DECIMALS),
                } => {
                    sheet.write_number_with_format(r, c, value, &two_dp)?;
                }
                Cell::Number {
                    value,
                    decimals: Some(_),
                } => {
                    sheet.write_number_with_format(r, c, value, &three_dp)?;
                }
                Cell::Number { value, decimals: None } => {
                    sheet.write_number(r, c, value)?;
                }
                Cell::Empty => {}
            }
        }
    }

    sheet.set_freeze_panes(1, 0)?;
    sheet.autofit();
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, report: &SelectionReport) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    let two_dp = Format::new().set_num_format("0.00");
    let meta = &report.meta;

    sheet.set_name(SUMMARY_SHEET)?;

    let text_rows = [
        ("Run ID", meta.run_id.to_string()),
        ("Generated At (UTC)", meta.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ("Tool Version", meta.tool_version.clone()),
        ("Depth Model", format!("{:?}", meta.depth_model)),
        ("Segment Rule", format!("{:?}", meta.segment_rule)),
    ];
    let count_rows = [
        ("Web Plates", meta.web_plates),
        ("Flange Plates", meta.flange_plates),
        ("Members", report.member_count()),
        ("Segments", report.segment_count()),
        ("Infeasible Segments", report.infeasible_count()),
    ];

    let mut r = 0u32;
    for (label, value) in text_rows {
        sheet.write_string_with_format(r, 0, label, &bold)?;
        sheet.write_string(r, 1, value)?;
        r += 1;
    }
    for (label, value) in count_rows {
        sheet.write_string_with_format(r, 0, label, &bold)?;
        sheet.write_number(r, 1, value as f64)?;
        r += 1;
    }
    sheet.write_string_with_format(r, 0, "Total Weight (kg)", &bold)?;
    sheet.write_number_with_format(r, 1, round_to(report.total_weight_kg(), WEIGHT_DECIMALS), &two_dp)?;

    sheet.autofit();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::tables;
    use crate::report::tests::sample_report;
    use tempfile::tempdir;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(146.0149, 2), 146.01);
        assert_eq!(round_to(146.016, 2), 146.02);
        assert_eq!(round_to(3.33333, 3), 3.333);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ReportFormat::from_path(Path::new("r.XLSX")).unwrap(), ReportFormat::Xlsx);
        assert_eq!(ReportFormat::from_path(Path::new("r.json")).unwrap(), ReportFormat::Json);
        assert!(ReportFormat::from_path(Path::new("r.pdf")).is_err());
    }

    #[test]
    fn test_csv_report() {
        let report = sample_report();
        let dir = tempdir().unwrap();
        let path = dir.path().join("selection.csv");
        write_report(&report, &path).unwrap();

        let table = tables::read_csv(&path).unwrap();
        assert_eq!(table.headers, REPORT_COLUMNS.to_vec());
        assert_eq!(table.rows.len(), 2);

        let feasible = &table.rows[0];
        assert_eq!(feasible.get(0), "M1-1");
        assert_eq!(feasible.get(7), "6.000");
        assert_eq!(feasible.get(12), "146.01");
        assert_eq!(feasible.get(13), "Yes");

        let infeasible = &table.rows[1];
        assert_eq!(infeasible.get(8), "");
        assert_eq!(infeasible.get(12), "");
        assert_eq!(infeasible.get(14), "No feasible combination");
    }

    #[test]
    fn test_json_report() {
        let report = sample_report();
        let dir = tempdir().unwrap();
        let path = dir.path().join("selection.json");
        write_report(&report, &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["rows"].as_array().unwrap().len(), 2);
        assert_eq!(value["rows"][1]["feasible"], false);
        assert_eq!(value["meta"]["run_id"], report.meta.run_id.to_string());
    }

    #[test]
    fn test_xlsx_report_reads_back() {
        let report = sample_report();
        let dir = tempdir().unwrap();
        let path = dir.path().join("selection.xlsx");
        write_report(&report, &path).unwrap();

        assert_eq!(tables::sheet_names(&path).unwrap(), vec![SELECTION_SHEET, SUMMARY_SHEET]);

        let selection = tables::read_sheet(&path, SELECTION_SHEET).unwrap();
        assert_eq!(selection.headers.len(), REPORT_COLUMNS.len());
        assert_eq!(selection.rows.len(), 2);
        assert_eq!(selection.rows[0].get(0), "M1-1");
        assert_eq!(selection.rows[0].get(12).parse::<f64>().unwrap(), 146.01);
        assert_eq!(selection.rows[1].get(14), "No feasible combination");
    }

    #[test]
    fn test_unsupported_extension_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selection.txt");
        assert!(write_report(&sample_report(), &path).is_err());
        assert!(!path.exists());
    }
}
