//! Soft assertion accumulator threaded through one test case.
//!
//! In soft mode every failure is recorded and execution continues; the
//! failures are flushed once by [`Assertions::finish`]. In hard mode the first
//! failure is returned as an error so executors can bail out with `?`.

use crate::error::{CaseError, Failure};

#[derive(Debug)]
pub struct Assertions {
    soft: bool,
    clues: Vec<String>,
    failures: Vec<Failure>,
}

impl Assertions {
    pub fn new(soft: bool) -> Self {
        Self {
            soft,
            clues: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_soft(&self) -> bool {
        self.soft
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), CaseError> {
        self.record(Failure::new(message))
    }

    pub fn fail_with_values(
        &mut self,
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Result<(), CaseError> {
        self.record(Failure::with_values(message, expected, actual))
    }

    pub fn assert_text_eq(
        &mut self,
        expected: &str,
        actual: &str,
        message: impl Into<String>,
    ) -> Result<(), CaseError> {
        if expected == actual {
            return Ok(());
        }
        self.fail_with_values(message, expected, actual)
    }

    /// Run `f` with `clue` attached to every failure it records.
    pub fn with_clue<T>(
        &mut self,
        clue: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T, CaseError>,
    ) -> Result<T, CaseError> {
        self.push_clue(clue);
        let result = f(self);
        self.pop_clue();
        result
    }

    /// Prefer [`Assertions::with_clue`]; every push needs a matching pop.
    pub fn push_clue(&mut self, clue: impl Into<String>) {
        self.clues.push(clue.into());
    }

    pub fn pop_clue(&mut self) {
        self.clues.pop();
    }

    fn record(&mut self, mut failure: Failure) -> Result<(), CaseError> {
        failure.clues = self.clues.clone();
        tracing::debug!("[ASSERTION_FAILED] soft={} {}", self.soft, failure.message);
        if self.soft {
            self.failures.push(failure);
            Ok(())
        } else {
            Err(CaseError::Failed(vec![failure]))
        }
    }

    /// Flush the recorded failures into a single error, or none.
    pub fn finish(self) -> Result<(), CaseError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(CaseError::Failed(self.failures))
        }
    }
}
