//! Structured error types for fixture discovery and test case execution.
//!
//! Configuration errors are mistakes in the test data itself and are reported
//! as hard failures of the affected case. Assertion failures are mismatches
//! between the host's behavior and the fixture, collected by
//! [`Assertions`](crate::assertions::Assertions).

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A mistake in the test data or harness configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The name {} was used for multiple carets. Caret names must be unique.", caret_label(.name.as_deref()))]
    DuplicateCaret { name: Option<String> },

    #[error("No caret found in any file.")]
    NoCaret,

    #[error("{executor} tests must only have one caret")]
    ExpectedSingleCaret { executor: String },

    #[error("Multiple carets in result projects are not supported. Only use one caret without a name.")]
    MultipleAfterCarets,

    #[error("No executor found for {name}")]
    NoExecutor { name: String },

    #[error("The host fixture does not provide the {capability} capability")]
    MissingCapability { capability: &'static str },

    #[error("Missing fixture file {}", .path.display())]
    MissingFixture { path: PathBuf },

    #[error("{0}")]
    InvalidFixture(String),

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidFixture(message.into())
    }
}

/// Human readable name of a caret slot.
pub fn caret_label(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("\"{}\"", name),
        None => "<unnamed>".to_string(),
    }
}

/// A single recorded assertion failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clues: Vec<String>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
            clues: Vec::new(),
        }
    }

    pub fn with_values(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            expected: Some(expected.into()),
            actual: Some(actual.into()),
            clues: Vec::new(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clue in &self.clues {
            writeln!(f, "{}", clue)?;
        }
        write!(f, "{}", self.message)?;
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, "\nexpected:<{}> but was:<{}>", expected, actual)?;
        }
        Ok(())
    }
}

/// Why a single test case did not pass.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}", render_failures(.0))]
    Failed(Vec<Failure>),

    #[error("Fixture setup failed: {0:#}")]
    Setup(anyhow::Error),

    #[error("Host operation failed: {0:#}")]
    Host(anyhow::Error),

    #[error("Executor panicked: {0}")]
    Panicked(String),
}

impl CaseError {
    pub fn host(error: anyhow::Error) -> Self {
        Self::Host(error)
    }

    /// One message per underlying problem, in the order they were recorded.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Failed(failures) => failures.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }

    /// The problems of this error as failures, without losing recorded values.
    pub fn into_failures(self) -> Vec<Failure> {
        match self {
            Self::Failed(failures) => failures,
            other => vec![Failure::new(other.to_string())],
        }
    }

    /// Append `later` after the problems already in `self`.
    pub fn merge(self, later: CaseError) -> CaseError {
        let mut failures = self.into_failures();
        failures.extend(later.into_failures());
        Self::Failed(failures)
    }

    pub fn log_debug(&self) {
        tracing::debug!("Case error: {}", self);
    }
}

fn render_failures(failures: &[Failure]) -> String {
    match failures {
        [single] => single.to_string(),
        many => {
            let mut out = format!("{} assertion failures:", many.len());
            for (index, failure) in many.iter().enumerate() {
                out.push_str(&format!("\n{}) {}", index + 1, failure));
            }
            out
        }
    }
}
