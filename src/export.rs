use anyhow::{Context, Result, bail};
use csv::Writer;
use rust_xlsxwriter::{Format, Workbook};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::batch::ResultTable;
use crate::constants::{OUTPUT_COLUMNS, RESULTS_SHEET_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|x| x.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            _ => bail!(
                "Unsupported output extension for {}. Use .xlsx or .csv",
                path.display()
            ),
        }
    }
}

/// Single-sheet workbook. Every cell is a string cell so NPIs stay text.
pub fn to_xlsx(table: &ResultTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(RESULTS_SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col, title) in OUTPUT_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = idx as u32 + 1;
        for (col, value) in row.fields().into_iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(row_num, col as u16, value)?;
            }
        }
    }

    sheet.set_column_width(0, 14)?;
    sheet.set_column_width(2, 40)?;

    workbook
        .save_to_buffer()
        .context("Failed encoding results workbook")
}

pub fn to_csv(table: &ResultTable) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_record(OUTPUT_COLUMNS)
        .context("Failed writing results CSV header")?;
    for row in &table.rows {
        writer
            .write_record(row.fields())
            .context("Failed writing results CSV row")?;
    }
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("Failed flushing results CSV: {}", err.error()))
}

pub fn export(table: &ResultTable, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Xlsx => to_xlsx(table),
        OutputFormat::Csv => to_csv(table),
    }
}

/// Writes next to `output_path` first, then renames into place.
pub fn write_output(table: &ResultTable, output_path: &Path) -> Result<()> {
    let format = OutputFormat::from_path(output_path)?;
    let bytes = export(table, format)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating {}", parent.display()))?;
    }

    let tmp_path = tmp_path_for(output_path);
    fs::write(&tmp_path, bytes)
        .with_context(|| format!("Failed writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, output_path).with_context(|| {
        format!(
            "Failed moving {} to {}",
            tmp_path.display(),
            output_path.display()
        )
    })?;
    Ok(())
}

/// `results.xlsx` -> `results.partial.xlsx`, keeping the extension so the
/// format still follows the path.
pub fn partial_output_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .and_then(|x| x.to_str())
        .unwrap_or("npi_taxonomy_results");
    match output_path.extension().and_then(|x| x.to_str()) {
        Some(ext) => output_path.with_file_name(format!("{stem}.partial.{ext}")),
        None => output_path.with_file_name(format!("{stem}.partial")),
    }
}

fn tmp_path_for(output_path: &Path) -> PathBuf {
    let file_name = output_path
        .file_name()
        .and_then(|x| x.to_str())
        .unwrap_or("npi_taxonomy_results");
    output_path.with_file_name(format!("{file_name}.tmp"))
}
