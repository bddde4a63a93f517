//! Tabular file reader shared by the input and library loaders.
//!
//! Reads one sheet of an `.xlsx`/`.xls`/`.ods` workbook (via `calamine`) or a
//! `.csv` file (via `csv`) into a [`Table`] of trimmed string cells. The first
//! row is the header. Fully blank rows are skipped but keep their place in
//! the row numbering, so error messages point at the row a user sees in the
//! file.

use std::fs::File;
use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;

use crate::errors::{PlateError, PlateResult};

/// Supported tabular file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Workbook,
}

impl TableFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> PlateResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(TableFormat::Workbook),
            other => Err(PlateError::file_error(
                "read table",
                path.display().to_string(),
                format!("unsupported file format '{}', expected .xlsx, .xls or .csv", other),
            )),
        }
    }
}

/// One data row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based row number in the source file (the header is row 1)
    pub number: usize,
    pub cells: Vec<String>,
}

impl Row {
    /// Cell text at `column`, empty when the row is short
    pub fn get(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }
}

/// Header plus data rows of one sheet
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Sheet name, or the file stem for CSV
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Build a table from a header row followed by data rows
    pub fn from_rows(name: impl Into<String>, mut rows: impl Iterator<Item = Vec<String>>) -> Self {
        let headers = rows.next().unwrap_or_default();
        let rows = rows
            .enumerate()
            .map(|(i, cells)| Row { number: i + 2, cells })
            .filter(|row| !row.is_blank())
            .collect();
        Table {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Index of the first column whose normalized header is in `names`
    /// (names are compared after [`normalize_header`])
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        let wanted: Vec<String> = names.iter().map(|n| normalize_header(n)).collect();
        self.headers
            .iter()
            .position(|h| wanted.contains(&normalize_header(h)))
    }

    /// Like [`Table::column`], failing with `MissingField` for `field`
    pub fn require_column(&self, field: &str, names: &[&str]) -> PlateResult<usize> {
        self.column(names)
            .ok_or_else(|| PlateError::missing_field(self.name.clone(), field))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Header key: lowercase ASCII letters and digits only
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Read a CSV file with a header row
pub fn read_csv(path: &Path) -> PlateResult<Table> {
    let file = File::open(path).map_err(|e| PlateError::file_error("open", path.display().to_string(), e.to_string()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PlateError::file_error("parse csv", path.display().to_string(), e.to_string()))?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("csv")
        .to_string();
    Ok(Table::from_rows(name, records.into_iter()))
}

/// Sheet names of a workbook, in workbook order
pub fn sheet_names(path: &Path) -> PlateResult<Vec<String>> {
    let workbook =
        open_workbook_auto(path).map_err(|e| PlateError::file_error("open workbook", path.display().to_string(), e.to_string()))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Read one named sheet of a workbook
pub fn read_sheet(path: &Path, sheet: &str) -> PlateResult<Table> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| PlateError::file_error("open workbook", path.display().to_string(), e.to_string()))?;
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| PlateError::file_error("read sheet", format!("{}#{}", path.display(), sheet), e.to_string()))?;

    // Header sits on the first used row, which is not always row 1
    let offset = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect::<Vec<_>>());

    let mut table = Table::from_rows(sheet, rows);
    for row in &mut table.rows {
        row.number += offset;
    }
    Ok(table)
}

/// Read `preferred` from a workbook if it exists, else its first sheet
pub fn read_preferred_sheet(path: &Path, preferred: &str) -> PlateResult<Table> {
    let names = sheet_names(path)?;
    let sheet = names
        .iter()
        .find(|n| n.eq_ignore_ascii_case(preferred))
        .or_else(|| names.first())
        .ok_or_else(|| PlateError::file_error("read workbook", path.display().to_string(), "workbook has no sheets"))?;
    read_sheet(path, sheet)
}
