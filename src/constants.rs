pub const DEFAULT_NPI_API_BASE_URL: &str = "https://npiregistry.cms.hhs.gov/api/";
pub const DEFAULT_NPI_API_VERSION: &str = "2.1";
pub const NPPES_API_DOC_URL: &str = "https://npiregistry.cms.hhs.gov/api-page";

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_DELAY_MS: u64 = 50;

pub const DEFAULT_SHEET_NAME: &str = "Missing NPIs (kelvin)";
pub const DEFAULT_NPI_HEADER: &str = "NPI";
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "npi_taxonomy_results.xlsx";
pub const RESULTS_SHEET_NAME: &str = "Taxonomy Results";

pub const USER_AGENT: &str = concat!("npi-taxonomy-lookup/", env!("CARGO_PKG_VERSION"));

pub const INVALID_FORMAT: &str = "Invalid Format";
pub const NOT_FOUND: &str = "Not Found";

pub const OUTPUT_COLUMNS: [&str; 6] = [
    "NPI",
    "Taxonomy Code",
    "Taxonomy Description",
    "Primary Taxonomy",
    "State",
    "License",
];
