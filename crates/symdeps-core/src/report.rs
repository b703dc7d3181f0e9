//! Verification report generation
//!
//! Renders the diagnostic stream for humans and the whole run as JSON.

use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::reconcile::Reconciliation;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SUCCESS_LINE: &str = "OK: Specified and actual dependencies match.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    Failure = 1,
    WarningsOnly = 2,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub summary: VerificationSummary,
    pub reconciliation: Reconciliation,
    pub ignored_symbols: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub success: bool,
    pub libraries: usize,
    pub object_files: usize,
    pub items_resolved: usize,
    pub errors: usize,
    pub infos: usize,
    pub duration_ms: u128,
}

impl VerificationReport {
    pub fn new(diagnostics: Diagnostics) -> Self {
        let errors = diagnostics.count(Severity::Error);
        let infos = diagnostics.count(Severity::Info);

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: VerificationSummary {
                success: errors == 0,
                libraries: 0,
                object_files: 0,
                items_resolved: 0,
                errors,
                infos,
                duration_ms: 0,
            },
            reconciliation: Reconciliation::default(),
            ignored_symbols: Vec::new(),
            diagnostics: diagnostics.into_vec(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.summary.success
    }

    pub fn set_duration(&mut self, duration_ms: u128) {
        self.summary.duration_ms = duration_ms;
    }

    /// `0` on success and `1` on any error. With `warnings_exit_code`, a passing
    /// run that produced informational diagnostics yields `2`.
    pub fn exit_status(&self, warnings_exit_code: bool) -> ExitStatus {
        if !self.summary.success {
            ExitStatus::Failure
        } else if warnings_exit_code && self.summary.infos > 0 {
            ExitStatus::WarningsOnly
        } else {
            ExitStatus::Success
        }
    }

    pub fn infos(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Every diagnostic in run order, followed by the success line when the run passed
impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}: {}", diagnostic.severity(), diagnostic)?;
        }
        if self.summary.success {
            writeln!(f, "{}", SUCCESS_LINE)?;
        }
        Ok(())
    }
}
