//! Cleanup and format checks for NPI cell values.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Valid,
    Malformed,
}

/// Trims the raw cell text and strips every literal ".0".
///
/// Spreadsheet readers often hand back `1234567893.0` for a numeric cell. The
/// replace is textual, so a token such as `12.034` also loses its ".0".
pub fn normalize(raw: &str) -> String {
    raw.trim().replace(".0", "")
}

/// An NPI is exactly ten ASCII digits. No Luhn check is applied.
pub fn classify(identifier: &str) -> Classification {
    if identifier.len() == 10 && identifier.bytes().all(|b| b.is_ascii_digit()) {
        Classification::Valid
    } else {
        Classification::Malformed
    }
}
