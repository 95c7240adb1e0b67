//! CSV serialization of validation findings.
//!
//! One row per finding, fixed column order. A clean run still produces a
//! report (just the header row) so a download is always available once
//! validation finishes.

use crate::rules::Finding;

pub const REPORT_COLUMNS: [&str; 10] = [
    "phase",
    "record_no",
    "lei",
    "field_name",
    "field_value",
    "severity",
    "rule_id",
    "rule_name",
    "description",
    "scope",
];

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("report buffer error: {0}")]
    Buffer(String),
}

pub fn to_csv(findings: &[Finding]) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_COLUMNS)?;

    for f in findings {
        let record_no = f.record_no.to_string();
        writer.write_record([
            f.phase.as_str(),
            record_no.as_str(),
            f.lei.as_str(),
            f.field_name.as_str(),
            f.field_value.as_str(),
            f.severity.as_str(),
            f.rule_id.as_str(),
            f.rule_name.as_str(),
            f.description.as_str(),
            f.scope.as_str(),
        ])?;
    }

    writer.flush().map_err(|e| ReportError::Buffer(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| ReportError::Buffer(e.to_string()))
}
