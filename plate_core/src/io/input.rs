//! Member input reader.
//!
//! Input rows come from the `Input` sheet of a workbook (or its first sheet)
//! or from a CSV file. Headers are matched case-insensitively and ignoring
//! punctuation, with the synonyms below. Unknown columns are ignored.
//!
//! | Field           | Accepted headers                                             |
//! |-----------------|--------------------------------------------------------------|
//! | `member_id`     | member_id, member, mark, id                                  |
//! | `frame_type`    | frame_type, frame, building type (required)                  |
//! | `length_m`      | length_m, length, span_m, span, width_m, Length in m (o/o of steel) (required) |
//! | `design_code`   | design_code, design code, desing code, code                  |
//! | `bay_spacing_m` | bay_spacing_m, bay spacing, bay_m                            |
//! | `bay_pattern`   | bay_pattern, side wall bay spacing, bays                     |
//! | `quantity`      | quantity, qty, members_count, count                          |
//!
//! A missing member id defaults to `M{n}` where `n` is the 1-based data row
//! position.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

use super::tables::{self, normalize_header, Row, Table, TableFormat};
use crate::errors::{PlateError, PlateResult};
use crate::member::{DesignCode, FrameType, Member};
use crate::segments::{BayPattern, LENGTH_TOLERANCE_M};

/// Preferred sheet name in input workbooks
pub const INPUT_SHEET: &str = "Input";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InputField {
    MemberId,
    FrameType,
    Length,
    DesignCode,
    BaySpacing,
    BayPattern,
    Quantity,
}

impl InputField {
    fn name(&self) -> &'static str {
        match self {
            InputField::MemberId => "member_id",
            InputField::FrameType => "frame_type",
            InputField::Length => "length_m",
            InputField::DesignCode => "design_code",
            InputField::BaySpacing => "bay_spacing_m",
            InputField::BayPattern => "bay_pattern",
            InputField::Quantity => "quantity",
        }
    }
}

static HEADER_SYNONYMS: Lazy<HashMap<String, InputField>> = Lazy::new(|| {
    [
        ("member_id", InputField::MemberId),
        ("member", InputField::MemberId),
        ("mark", InputField::MemberId),
        ("id", InputField::MemberId),
        ("frame_type", InputField::FrameType),
        ("frame", InputField::FrameType),
        ("building type", InputField::FrameType),
        ("length_m", InputField::Length),
        ("length", InputField::Length),
        ("span_m", InputField::Length),
        ("span", InputField::Length),
        ("width_m", InputField::Length),
        ("Length in m (o/o of steel)", InputField::Length),
        ("design_code", InputField::DesignCode),
        ("design code", InputField::DesignCode),
        ("desing code", InputField::DesignCode),
        ("code", InputField::DesignCode),
        ("bay_spacing_m", InputField::BaySpacing),
        ("bay spacing", InputField::BaySpacing),
        ("bay_m", InputField::BaySpacing),
        ("bay_pattern", InputField::BayPattern),
        ("side wall bay spacing", InputField::BayPattern),
        ("bays", InputField::BayPattern),
        ("quantity", InputField::Quantity),
        ("qty", InputField::Quantity),
        ("members_count", InputField::Quantity),
        ("count", InputField::Quantity),
    ]
    .into_iter()
    .map(|(header, field)| (normalize_header(header), field))
    .collect()
});

/// Read members from an input file
pub fn read_members(path: &Path) -> PlateResult<Vec<Member>> {
    let table = match TableFormat::from_path(path)? {
        TableFormat::Csv => tables::read_csv(path)?,
        TableFormat::Workbook => tables::read_preferred_sheet(path, INPUT_SHEET)?,
    };
    let members = members_from_table(&table)?;
    tracing::info!(path = %path.display(), members = members.len(), "read input members");
    Ok(members)
}

/// Map the rows of an input table to members
pub fn members_from_table(table: &Table) -> PlateResult<Vec<Member>> {
    let mut columns: HashMap<InputField, usize> = HashMap::new();
    for (i, header) in table.headers.iter().enumerate() {
        if let Some(field) = HEADER_SYNONYMS.get(&normalize_header(header)) {
            // First matching column wins
            columns.entry(*field).or_insert(i);
        }
    }

    for required in [InputField::FrameType, InputField::Length] {
        if !columns.contains_key(&required) {
            return Err(PlateError::missing_field(table.name.clone(), required.name()));
        }
    }

    if table.is_empty() {
        tracing::warn!(table = %table.name, "input table has no data rows");
    }

    table
        .rows
        .iter()
        .enumerate()
        .map(|(position, row)| member_from_row(&columns, row, position + 1))
        .collect()
}

fn member_from_row(columns: &HashMap<InputField, usize>, row: &Row, position: usize) -> PlateResult<Member> {
    let cell = |field: InputField| cell_value(columns, row, field);
    let invalid = |field: InputField, value: &str, reason: String| {
        PlateError::invalid_input(Some(row.number), field.name(), value, reason)
    };

    let member_id = cell(InputField::MemberId)
        .map(str::to_string)
        .unwrap_or_else(|| format!("M{}", position));

    let frame_raw = cell(InputField::FrameType)
        .ok_or_else(|| invalid(InputField::FrameType, "", "frame type is required".to_string()))?;
    let frame_type = parse_frame_type(frame_raw).map_err(|e| invalid(InputField::FrameType, frame_raw, e))?;

    let length_raw =
        cell(InputField::Length).ok_or_else(|| invalid(InputField::Length, "", "length is required".to_string()))?;
    let length_m = parse_number(length_raw).map_err(|e| invalid(InputField::Length, length_raw, e))?;

    let mut member = Member::new(member_id, length_m, frame_type);

    if let Some(raw) = cell(InputField::DesignCode) {
        let code: DesignCode = raw.parse().map_err(|e| invalid(InputField::DesignCode, raw, e))?;
        member = member.with_design_code(code);
    }

    if let Some(raw) = cell(InputField::BaySpacing) {
        let bay = parse_number(raw).map_err(|e| invalid(InputField::BaySpacing, raw, e))?;
        member = member.with_bay_spacing(bay);
    }

    if let Some(raw) = cell(InputField::BayPattern) {
        let pattern: BayPattern = raw.parse().map_err(|e| invalid(InputField::BayPattern, raw, e))?;
        tracing::debug!(
            row = row.number,
            expression = pattern.expression(),
            bays = pattern.total_bays(),
            frames = pattern.total_frames(),
            total_m = pattern.total_length_m(),
            "parsed bay pattern"
        );
        if (pattern.total_length_m() - length_m).abs() > LENGTH_TOLERANCE_M {
            tracing::warn!(
                row = row.number,
                expression = pattern.expression(),
                pattern_m = pattern.total_length_m(),
                length_m,
                "bay pattern does not match member length"
            );
        }
        member = member.with_bay_pattern(pattern);
    }

    if let Some(raw) = cell(InputField::Quantity) {
        let quantity = parse_quantity(raw).map_err(|e| invalid(InputField::Quantity, raw, e))?;
        member = member.with_quantity(quantity);
    }

    member.validate().map_err(|e| match e {
        PlateError::InvalidInput {
            row: None,
            field,
            value,
            reason,
        } => PlateError::invalid_input(Some(row.number), field, value, reason),
        other => other,
    })?;
    Ok(member)
}

fn cell_value<'r>(columns: &HashMap<InputField, usize>, row: &'r Row, field: InputField) -> Option<&'r str> {
    columns
        .get(&field)
        .map(|&col| row.get(col))
        .filter(|value| !value.is_empty())
}

/// Frame type with an optional trailing number ("Multi span 1")
fn parse_frame_type(raw: &str) -> Result<FrameType, String> {
    raw.parse().or_else(|err| {
        let stripped = raw.trim_end_matches(|c: char| c.is_ascii_digit() || c.is_whitespace());
        if stripped.len() < raw.len() && !stripped.is_empty() {
            stripped.parse()
        } else {
            Err(err)
        }
    })
}

fn parse_number(raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| "expected a number".to_string())
}

/// Whole positive count; spreadsheet cells may hold "5" or "5.0"
fn parse_quantity(raw: &str) -> Result<u32, String> {
    let value = parse_number(raw)?;
    if value.fract() != 0.0 || value < 1.0 || value > u32::MAX as f64 {
        return Err("expected a whole number of at least 1".to_string());
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        let all = std::iter::once(headers.iter().map(|h| h.to_string()).collect::<Vec<String>>())
            .chain(rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect::<Vec<String>>()));
        Table::from_rows("Input", all)
    }

    #[test]
    fn test_canonical_headers() {
        let t = table(
            &["member_id", "frame_type", "length_m", "design_code", "bay_spacing_m", "quantity"],
            &[&["RF-1", "ClearSpan", "30", "AISC", "6", "4"]],
        );
        let members = members_from_table(&t).unwrap();
        assert_eq!(members.len(), 1);
        let m = &members[0];
        assert_eq!(m.member_id, "RF-1");
        assert_eq!(m.frame_type, FrameType::ClearSpan);
        assert_eq!(m.length_m, 30.0);
        assert_eq!(m.design_code, Some(DesignCode::Aisc));
        assert_eq!(m.bay_spacing_m, Some(6.0));
        assert_eq!(m.quantity, 4);
    }

    #[test]
    fn test_synonym_headers() {
        let t = table(
            &["Design code", "Building type", "Length in m (o/o of steel)", "Members_count", "Side wall bay spacing"],
            &[&["IS 800", "Multi span 1", "55.92", "5", "1@7.985+5@7.99+1@7.985"]],
        );
        let m = &members_from_table(&t).unwrap()[0];
        assert_eq!(m.member_id, "M1");
        assert_eq!(m.frame_type, FrameType::MultiSpan);
        assert_eq!(m.design_code, Some(DesignCode::Is800));
        assert_eq!(m.quantity, 5);
        assert_eq!(m.bay_pattern.as_ref().unwrap().total_bays(), 7);
    }

    #[test]
    fn test_missing_required_column() {
        let t = table(&["member_id", "length_m"], &[&["M1", "12"]]);
        let err = members_from_table(&t).unwrap_err();
        assert_eq!(err, PlateError::missing_field("Input", "frame_type"));
    }

    #[test]
    fn test_invalid_length_reports_row() {
        let t = table(&["frame_type", "length_m"], &[&["ClearSpan", "12"], &["ClearSpan", "abc"]]);
        match members_from_table(&t).unwrap_err() {
            PlateError::InvalidInput { row, field, .. } => {
                assert_eq!(row, Some(3));
                assert_eq!(field, "length_m");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_length_reports_row() {
        let t = table(&["frame_type", "length_m"], &[&["ClearSpan", "0"]]);
        match members_from_table(&t).unwrap_err() {
            PlateError::InvalidInput { row, .. } => assert_eq!(row, Some(2)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_quantity_parsing() {
        assert_eq!(parse_quantity("5.0").unwrap(), 5);
        assert!(parse_quantity("2.5").is_err());
        assert!(parse_quantity("0").is_err());
    }

    #[test]
    fn test_read_members_from_csv() {
        use std::io::Write;
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "mark,frame,span_m,qty").unwrap();
        writeln!(file, "A1,mono slope,18,2").unwrap();
        writeln!(file, "A2,MultiGable,24,").unwrap();

        let members = read_members(file.path()).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].frame_type, FrameType::MonoSlope);
        assert_eq!(members[1].quantity, 1);
    }
}
