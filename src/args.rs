use clap::Parser;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_DELAY_MS, DEFAULT_NPI_API_BASE_URL, DEFAULT_NPI_API_VERSION, DEFAULT_NPI_HEADER,
    DEFAULT_SHEET_NAME, DEFAULT_TIMEOUT_SECS,
};
use crate::input::{ColumnSelector, SheetSelector};

#[derive(Debug, Parser)]
#[command(name = "npi_taxonomy")]
#[command(about = "Look up NPPES taxonomy classifications for the NPIs in a spreadsheet")]
pub struct Args {
    /// Input spreadsheet (.xlsx, .xlsm, .xls, .ods) or .csv file.
    #[arg(long)]
    pub input: PathBuf,

    /// Output path (.xlsx or .csv). Defaults to npi_taxonomy_results.xlsx next to the input.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Sheet to read. If omitted, "Missing NPIs (kelvin)" is tried, then the last sheet.
    #[arg(long, conflicts_with = "last_sheet")]
    pub sheet: Option<String>,

    /// Always read the last sheet.
    #[arg(long, default_value_t = false)]
    pub last_sheet: bool,

    /// Read NPIs from the column with this header title instead of the first column.
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_NPI_HEADER)]
    pub npi_header: Option<String>,

    /// Print the sheet names of the input workbook and exit.
    #[arg(long, default_value_t = false)]
    pub list_sheets: bool,

    /// NPI API base URL.
    ///
    /// NPPES reference:
    /// https://npiregistry.cms.hhs.gov/api-page
    #[arg(long, default_value = DEFAULT_NPI_API_BASE_URL)]
    pub api_base_url: String,

    /// NPI API version query parameter.
    #[arg(long, default_value = DEFAULT_NPI_API_VERSION)]
    pub api_version: String,

    /// Per-request timeout in seconds. Timed out lookups are reported as "Not Found".
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Minimum delay between registry requests, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_DELAY_MS)]
    pub delay_ms: u64,
}

impl Args {
    pub fn sheet_selector(&self) -> SheetSelector {
        match &self.sheet {
            Some(name) => SheetSelector::Named(name.clone()),
            None if self.last_sheet => SheetSelector::Last,
            None => SheetSelector::NamedOrLast(DEFAULT_SHEET_NAME.to_string()),
        }
    }

    pub fn column_selector(&self) -> ColumnSelector {
        match &self.npi_header {
            Some(header) => ColumnSelector::Header(header.clone()),
            None => ColumnSelector::First,
        }
    }
}
