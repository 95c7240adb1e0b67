//! Multi-phase rule validation of a parsed register.
//!
//! Phases run in order: syntactical findings stop the run before any
//! logical rule fires, since a structurally broken register has no
//! meaningful logical reading. The built-in ruleset covers the uid column;
//! richer rulesets implement [`RuleValidator`] and plug into the
//! orchestrator unchanged.

use std::collections::HashSet;

use filing_core::{SubmissionState, ValidationSummary};
use serde::{Deserialize, Serialize};

use crate::table::DataTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationPhase {
    Syntactical,
    Logical,
}

impl ValidationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntactical => "Syntactical",
            Self::Logical => "Logical",
        }
    }
}

impl std::fmt::Display for ValidationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error outranks warning regardless of phase or count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One validation issue, one report row.
///
/// `record_no` is 1-based over data rows; register-scope findings that
/// point at no particular row carry 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub phase: ValidationPhase,
    pub record_no: u64,
    pub lei: String,
    pub field_name: String,
    pub field_value: String,
    pub severity: Severity,
    pub rule_id: String,
    pub rule_name: String,
    pub description: String,
    pub scope: String,
}

/// Context handed to the validator alongside the parsed table.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub lei: String,
}

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub all_passed: bool,
    pub findings: Vec<Finding>,
    /// The phase that produced findings; `Logical` when the run was clean.
    pub worst_phase: ValidationPhase,
}

#[derive(Debug, thiserror::Error)]
#[error("rule validator failure: {0}")]
pub struct RuleError(pub String);

/// The pluggable check set. Synchronous and potentially slow; the
/// orchestrator always invokes it from the blocking pool.
pub trait RuleValidator: Send + Sync {
    /// Version stamped onto the submission when validation starts.
    fn ruleset_version(&self) -> &str;

    fn validate(
        &self,
        table: &DataTable,
        ctx: &ValidationContext,
    ) -> Result<ValidationOutcome, RuleError>;
}

/// State a finished validation maps to.
pub fn classify(findings: &[Finding]) -> SubmissionState {
    if findings.is_empty() {
        SubmissionState::ValidationSuccessful
    } else if findings.iter().any(|f| f.severity == Severity::Error) {
        SubmissionState::ValidationWithErrors
    } else {
        SubmissionState::ValidationWithWarnings
    }
}

/// Compact counts persisted with the terminal state. Errors are bucketed by
/// phase; warnings all land in `logic_warnings`.
pub fn summarize(total_records: u64, findings: &[Finding]) -> ValidationSummary {
    let mut summary = ValidationSummary {
        total_records,
        ..Default::default()
    };
    for f in findings {
        match (f.severity, f.phase) {
            (Severity::Error, ValidationPhase::Syntactical) => summary.syntax_errors += 1,
            (Severity::Error, ValidationPhase::Logical) => summary.logic_errors += 1,
            (Severity::Warning, _) => summary.logic_warnings += 1,
        }
    }
    summary
}

/// Built-in ruleset over the register's uid column.
#[derive(Debug, Default)]
pub struct RegisterRuleValidator;

impl RegisterRuleValidator {
    pub fn new() -> Self {
        Self
    }

    fn syntactical(&self, table: &DataTable, ctx: &ValidationContext) -> Vec<Finding> {
        let mut findings = Vec::new();

        let Some(uid_col) = table.column_index("uid") else {
            findings.push(Finding {
                phase: ValidationPhase::Syntactical,
                record_no: 0,
                lei: ctx.lei.clone(),
                field_name: "uid".into(),
                field_value: String::new(),
                severity: Severity::Error,
                rule_id: "S100".into(),
                rule_name: "uid-column-missing".into(),
                description: "The register must contain a uid column.".into(),
                scope: "register".into(),
            });
            return findings;
        };

        for (row, _) in table.rows().iter().enumerate() {
            let uid = table.cell(row, uid_col);
            let well_formed = (21..=45).contains(&uid.len())
                && uid
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
            if !well_formed {
                findings.push(Finding {
                    phase: ValidationPhase::Syntactical,
                    record_no: row as u64 + 1,
                    lei: ctx.lei.clone(),
                    field_name: "uid".into(),
                    field_value: uid.to_string(),
                    severity: Severity::Error,
                    rule_id: "S101".into(),
                    rule_name: "uid-format".into(),
                    description: "uid must be 21-45 uppercase alphanumeric characters.".into(),
                    scope: "single-field".into(),
                });
            }
        }

        findings
    }

    fn logical(&self, table: &DataTable, ctx: &ValidationContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        // uid column presence was established by the syntactical phase
        let Some(uid_col) = table.column_index("uid") else {
            return findings;
        };

        let mut seen: HashSet<String> = HashSet::new();
        for (row, _) in table.rows().iter().enumerate() {
            let uid = table.cell(row, uid_col);
            let record_no = row as u64 + 1;

            if !uid.starts_with(ctx.lei.as_str()) {
                findings.push(Finding {
                    phase: ValidationPhase::Logical,
                    record_no,
                    lei: ctx.lei.clone(),
                    field_name: "uid".into(),
                    field_value: uid.to_string(),
                    severity: Severity::Error,
                    rule_id: "L200".into(),
                    rule_name: "uid-lei-prefix".into(),
                    description: "uid must begin with the filing LEI.".into(),
                    scope: "single-field".into(),
                });
            }

            if !seen.insert(uid.to_string()) {
                findings.push(Finding {
                    phase: ValidationPhase::Logical,
                    record_no,
                    lei: ctx.lei.clone(),
                    field_name: "uid".into(),
                    field_value: uid.to_string(),
                    severity: Severity::Error,
                    rule_id: "L201".into(),
                    rule_name: "uid-duplicate".into(),
                    description: "uid values must be unique within the register.".into(),
                    scope: "register".into(),
                });
            }
        }

        for (row, cells) in table.rows().iter().enumerate() {
            for (col, value) in cells.iter().enumerate() {
                if value != value.trim() {
                    findings.push(Finding {
                        phase: ValidationPhase::Logical,
                        record_no: row as u64 + 1,
                        lei: ctx.lei.clone(),
                        field_name: table.headers().get(col).cloned().unwrap_or_default(),
                        field_value: value.clone(),
                        severity: Severity::Warning,
                        rule_id: "L300".into(),
                        rule_name: "value-whitespace".into(),
                        description: "Value has leading or trailing whitespace.".into(),
                        scope: "single-field".into(),
                    });
                }
            }
        }

        findings
    }
}

impl RuleValidator for RegisterRuleValidator {
    fn ruleset_version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn validate(
        &self,
        table: &DataTable,
        ctx: &ValidationContext,
    ) -> Result<ValidationOutcome, RuleError> {
        let syntactical = self.syntactical(table, ctx);
        if !syntactical.is_empty() {
            return Ok(ValidationOutcome {
                all_passed: false,
                findings: syntactical,
                worst_phase: ValidationPhase::Syntactical,
            });
        }

        let logical = self.logical(table, ctx);
        Ok(ValidationOutcome {
            all_passed: logical.is_empty(),
            findings: logical,
            worst_phase: ValidationPhase::Logical,
        })
    }
}
