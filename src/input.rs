//! Input adapters: turn a spreadsheet or CSV into the ordered, unique list of
//! raw NPI strings the batch consumes.

use anyhow::{Context, Result, bail};
use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use csv::ReaderBuilder;
use std::{collections::HashSet, fs, io::Cursor, path::Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// Exactly this sheet; missing is an error.
    Named(String),
    /// This sheet if present, otherwise the last one.
    NamedOrLast(String),
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// Column A, whatever its header says.
    First,
    /// The column whose trimmed header equals this title (case-sensitive).
    Header(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Workbook,
    Csv,
}

fn input_format(path: &Path) -> Result<InputFormat> {
    let extension = path
        .extension()
        .and_then(|x| x.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(InputFormat::Workbook),
        "csv" => Ok(InputFormat::Csv),
        _ => bail!(
            "Unsupported input extension for {}. Use .xlsx, .xls, .ods or .csv",
            path.display()
        ),
    }
}

type Rows = Vec<Vec<Option<String>>>;

/// Reads `path` and returns its unique, non-empty NPI cells in sheet order.
pub fn load_identifiers(
    path: &Path,
    sheet: &SheetSelector,
    column: &ColumnSelector,
) -> Result<Vec<String>> {
    let format = input_format(path)?;
    let bytes = fs::read(path).with_context(|| format!("Failed reading {}", path.display()))?;
    let identifiers = match format {
        InputFormat::Workbook => identifiers_from_workbook(bytes, sheet, column),
        InputFormat::Csv => identifiers_from_csv(&bytes, column),
    };
    identifiers.with_context(|| format!("Failed extracting NPIs from {}", path.display()))
}

pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    match input_format(path)? {
        InputFormat::Csv => Ok(Vec::new()),
        InputFormat::Workbook => {
            let bytes =
                fs::read(path).with_context(|| format!("Failed reading {}", path.display()))?;
            sheet_names(bytes)
        }
    }
}

pub fn sheet_names(bytes: Vec<u8>) -> Result<Vec<String>> {
    let workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("Failed opening workbook")?;
    Ok(workbook.sheet_names())
}

pub fn identifiers_from_workbook(
    bytes: Vec<u8>,
    sheet: &SheetSelector,
    column: &ColumnSelector,
) -> Result<Vec<String>> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("Failed opening workbook")?;
    let names = workbook.sheet_names();
    let sheet_name = select_sheet(&names, sheet)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed reading sheet '{sheet_name}'"))?;
    let values = column_values(range_rows(&range), column)
        .with_context(|| format!("Failed reading NPI column from sheet '{sheet_name}'"))?;
    Ok(dedupe(values))
}

pub fn identifiers_from_csv(bytes: &[u8], column: &ColumnSelector) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Rows::new();
    for record in reader.records() {
        let record = record.context("Failed reading CSV row")?;
        rows.push(
            record
                .iter()
                .map(|cell| Some(cell.to_string()).filter(|s| !s.is_empty()))
                .collect(),
        );
    }
    Ok(dedupe(column_values(rows, column)?))
}

fn select_sheet(names: &[String], sheet: &SheetSelector) -> Result<String> {
    let last = || {
        names
            .last()
            .cloned()
            .context("Workbook contains no sheets")
    };
    match sheet {
        SheetSelector::Named(name) => {
            if names.iter().any(|n| n == name) {
                Ok(name.clone())
            } else {
                bail!(
                    "Sheet '{name}' not found. Available sheets: {}",
                    names.join(", ")
                )
            }
        }
        SheetSelector::NamedOrLast(name) => {
            if names.iter().any(|n| n == name) {
                tracing::info!(sheet = name.as_str(), "loaded sheet");
                Ok(name.clone())
            } else {
                let fallback = last()?;
                tracing::info!(
                    wanted = name.as_str(),
                    sheet = fallback.as_str(),
                    "target sheet not found, loaded the last sheet"
                );
                Ok(fallback)
            }
        }
        SheetSelector::Last => last(),
    }
}

/// Rows with absolute column positions, so index 0 is always column A.
fn range_rows(range: &Range<Data>) -> Rows {
    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        return Rows::new();
    };
    (start.0..=end.0)
        .map(|row| {
            (0..=end.1)
                .map(|col| range.get_value((row, col)).and_then(cell_text))
                .collect()
        })
        .collect()
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Picks the NPI column out of `rows`. The first row is the header.
fn column_values(rows: Rows, column: &ColumnSelector) -> Result<Vec<String>> {
    let mut rows = rows.into_iter();
    let header = rows.next().unwrap_or_default();

    let idx = match column {
        ColumnSelector::First => 0,
        ColumnSelector::Header(title) => header
            .iter()
            .position(|cell| cell.as_deref().map(str::trim) == Some(title.as_str()))
            .with_context(|| format!("No column titled '{title}' in the header row"))?,
    };

    Ok(rows
        .filter_map(|mut row| row.get_mut(idx).and_then(Option::take))
        .collect())
}

/// Drops repeated values, keeping the first occurrence.
pub fn dedupe(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
