//! Outcomes of a suite run.

use crate::error::{CaseError, Failure};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    /// Group names and the case name, `/` separated.
    pub name: String,
    pub status: CaseStatus,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<Failure>,
}

impl CaseReport {
    pub fn from_outcome(name: String, disabled: bool, outcome: Result<(), CaseError>) -> Self {
        match outcome {
            Ok(()) => Self {
                name,
                status: CaseStatus::Passed,
                disabled,
                failures: Vec::new(),
            },
            Err(e) => Self {
                name,
                status: CaseStatus::Failed,
                disabled,
                failures: e.into_failures(),
            },
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "Ran {} test cases: {} passed, {} failed",
            self.cases.len(),
            self.passed(),
            self.failed()
        );
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for case in self.cases.iter().filter(|c| !c.passed()) {
            writeln!(f, "FAILED {}", case.name)?;
            for failure in &case.failures {
                for line in failure.to_string().lines() {
                    writeln!(f, "    {}", line)?;
                }
            }
        }
        write!(f, "{} passed, {} failed", self.passed(), self.failed())
    }
}
