//! Plate library reader.
//!
//! A library is either a workbook with a `web` and a `flange` sheet, or a CSV
//! file with a `kind` column naming the table of each row. Both need
//! `thickness_mm` and `width_mm` columns. Row order within a table becomes
//! each plate's `source_index`.

use std::path::Path;

use super::tables::{self, Table, TableFormat};
use crate::errors::{PlateError, PlateResult};
use crate::library::{PlateKind, PlateLibrary};

const THICKNESS_HEADERS: &[&str] = &["thickness_mm", "thickness", "t_mm", "t"];
const WIDTH_HEADERS: &[&str] = &["width_mm", "width", "depth_mm", "b_mm", "d_mm"];
const KIND_HEADERS: &[&str] = &["kind", "table", "plate", "type"];

/// Load and validate a plate library
pub fn load_library(path: &Path) -> PlateResult<PlateLibrary> {
    let library = match TableFormat::from_path(path)? {
        TableFormat::Workbook => from_workbook(path)?,
        TableFormat::Csv => from_kind_table(&tables::read_csv(path)?)?,
    };
    check_library(&library)?;

    tracing::info!(
        path = %path.display(),
        webs = library.webs().len(),
        flanges = library.flanges().len(),
        "loaded plate library"
    );
    Ok(library)
}

/// A library needs at least one plate; one empty table is allowed
pub fn check_library(library: &PlateLibrary) -> PlateResult<()> {
    if library.is_empty() {
        return Err(PlateError::library("library", None, "library contains no plates"));
    }
    for kind in [PlateKind::Web, PlateKind::Flange] {
        if library.plates(kind).is_empty() {
            tracing::warn!(
                table = kind.table_name(),
                "plate table is empty, no segment can have a feasible combination"
            );
        }
    }
    Ok(())
}

fn from_workbook(path: &Path) -> PlateResult<PlateLibrary> {
    let names = tables::sheet_names(path)?;
    let mut library = PlateLibrary::new();

    for kind in [PlateKind::Web, PlateKind::Flange] {
        let sheet = names
            .iter()
            .find(|n| PlateKind::from_name(n) == Some(kind))
            .ok_or_else(|| PlateError::library(kind.table_name(), None, "sheet not found in library workbook"))?;
        let table = tables::read_sheet(path, sheet)?;
        push_table(&mut library, &table, |_| Ok(kind))?;
    }
    Ok(library)
}

/// Single table whose `kind` column says web or flange per row
pub fn from_kind_table(table: &Table) -> PlateResult<PlateLibrary> {
    let kind_col = table.require_column("kind", KIND_HEADERS)?;
    let mut library = PlateLibrary::new();
    push_table(&mut library, table, |row| {
        let raw = row.get(kind_col);
        PlateKind::from_name(raw).ok_or_else(|| {
            PlateError::library(
                table.name.clone(),
                Some(row.number),
                format!("kind must be 'web' or 'flange', got '{}'", raw),
            )
        })
    })?;
    Ok(library)
}

fn push_table<F>(library: &mut PlateLibrary, table: &Table, kind_of: F) -> PlateResult<()>
where
    F: Fn(&tables::Row) -> PlateResult<PlateKind>,
{
    let thickness_col = table.require_column("thickness_mm", THICKNESS_HEADERS)?;
    let width_col = table.require_column("width_mm", WIDTH_HEADERS)?;

    for row in &table.rows {
        let kind = kind_of(row)?;
        let thickness = parse_dimension(table, row, thickness_col, "thickness_mm")?;
        let width = parse_dimension(table, row, width_col, "width_mm")?;
        library.push(kind, thickness, width).map_err(|e| match e {
            PlateError::Library { table, reason, .. } => PlateError::library(table, Some(row.number), reason),
            other => other,
        })?;
    }
    Ok(())
}

fn parse_dimension(table: &Table, row: &tables::Row, column: usize, field: &str) -> PlateResult<f64> {
    let raw = row.get(column);
    raw.parse::<f64>().map_err(|_| {
        PlateError::library(
            table.name.clone(),
            Some(row.number),
            format!("{} must be a number, got '{}'", field, raw),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_csv_library_keeps_row_order() {
        let file = csv("kind,thickness_mm,width_mm\nweb,8,200\nflange,12,150\nweb,10,250\nflange,10,150\n");
        let library = load_library(file.path()).unwrap();

        assert_eq!(library.webs().len(), 2);
        assert_eq!(library.flanges().len(), 2);
        assert_eq!(library.webs()[1].thickness_mm, 10.0);
        assert_eq!(library.webs()[1].source_index, 1);
        assert_eq!(library.flanges()[0].thickness_mm, 12.0);
    }

    #[test]
    fn test_non_positive_dimension_is_library_error() {
        let file = csv("kind,thickness_mm,width_mm\nweb,8,200\nflange,0,150\n");
        match load_library(file.path()).unwrap_err() {
            PlateError::Library { table, row, .. } => {
                assert_eq!(table, "flange");
                assert_eq!(row, Some(3));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_dimension() {
        let file = csv("kind,thickness_mm,width_mm\nweb,eight,200\n");
        let err = load_library(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "LIBRARY_ERROR");
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_unknown_kind() {
        let file = csv("kind,thickness_mm,width_mm\nstiffener,8,200\n");
        assert_eq!(load_library(file.path()).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn test_empty_library_rejected() {
        let file = csv("kind,thickness_mm,width_mm\n");
        assert_eq!(load_library(file.path()).unwrap_err().error_code(), "LIBRARY_ERROR");
    }

    #[test]
    fn test_one_empty_table_allowed() {
        let file = csv("kind,thickness_mm,width_mm\nweb,8,200\n");
        let library = load_library(file.path()).unwrap();
        assert!(library.flanges().is_empty());
        assert_eq!(library.combination_count(), 0);
    }

    #[test]
    fn test_missing_width_column() {
        let file = csv("kind,thickness_mm\nweb,8\n");
        assert_eq!(load_library(file.path()).unwrap_err().error_code(), "MISSING_FIELD");
    }

    fn workbook(sheets: &[(&str, &[(f64, f64)])]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        for (name, rows) in sheets {
            let sheet = workbook.add_worksheet();
            sheet.set_name(*name).unwrap();
            sheet.write_string(0, 0, "Thickness (mm)").unwrap();
            sheet.write_string(0, 1, "Width (mm)").unwrap();
            for (i, (t, w)) in rows.iter().enumerate() {
                sheet.write_number(i as u32 + 1, 0, *t).unwrap();
                sheet.write_number(i as u32 + 1, 1, *w).unwrap();
            }
        }
        workbook.save(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn test_workbook_library() {
        let (_dir, path) = workbook(&[
            ("Web", &[(8.0, 200.0), (10.0, 250.0)][..]),
            ("Flange", &[(10.0, 150.0)][..]),
        ]);
        let library = load_library(&path).unwrap();
        assert_eq!(library.webs().len(), 2);
        assert_eq!(library.flanges().len(), 1);
        assert_eq!(library.webs()[1].width_mm, 250.0);
    }

    #[test]
    fn test_workbook_missing_sheet() {
        let (_dir, path) = workbook(&[("web", &[(8.0, 200.0)][..])]);
        match load_library(&path).unwrap_err() {
            PlateError::Library { table, .. } => assert_eq!(table, "flange"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
