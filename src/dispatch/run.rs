//! Lifecycle of one leaf test case.

use crate::assertions::Assertions;
use crate::config::DirectoryTestConfig;
use crate::dispatch::context::ExecutorContext;
use crate::dispatch::discovery::TestCase;
use crate::error::{CaseError, ConfigError};
use crate::host::{Fixture, FixtureSetup};
use crate::project::new_store;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePhase {
    Pending,
    Setup,
    Running,
    Passed,
    Failed,
    TornDown,
}

impl fmt::Display for CasePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CasePhase::Pending => "pending",
            CasePhase::Setup => "setup",
            CasePhase::Running => "running",
            CasePhase::Passed => "passed",
            CasePhase::Failed => "failed",
            CasePhase::TornDown => "torn down",
        };
        f.write_str(name)
    }
}

struct Lifecycle<'a> {
    case: &'a TestCase,
    phase: CasePhase,
}

impl Lifecycle<'_> {
    fn enter(&mut self, phase: CasePhase) {
        tracing::debug!(
            "[CASE_PHASE] {}: {} -> {}",
            self.case.relative_path,
            self.phase,
            phase
        );
        self.phase = phase;
    }
}

/// Set up, execute and tear down `case`.
///
/// Teardown runs whenever setup produced a fixture. Its failure is appended
/// after a running failure and never replaces it.
pub fn run_case(config: &DirectoryTestConfig, case: &TestCase) -> Result<(), CaseError> {
    tracing::debug!("[RUN_CASE_ENTER] {}", case.relative_path);
    let mut lifecycle = Lifecycle {
        case,
        phase: CasePhase::Pending,
    };

    let executor = config
        .executors
        .get(&case.executor)
        .ok_or_else(|| ConfigError::NoExecutor {
            name: case.executor.clone(),
        })?;

    lifecycle.enter(CasePhase::Setup);
    let store = new_store(case.heavy).map_err(|e| CaseError::Setup(e.into()))?;
    let setup = FixtureSetup {
        test_name: &case.test_name,
        heavy: case.heavy,
        store: store.clone(),
        project_descriptor: config.project_descriptor.as_ref(),
    };
    let set_up = panic::catch_unwind(AssertUnwindSafe(|| config.fixture_factory.set_up(setup)))
        .unwrap_or_else(|payload| Err(anyhow::anyhow!("setup panicked: {}", panic_message(payload))));
    let mut fixture = match set_up {
        Ok(fixture) => fixture,
        Err(e) => {
            lifecycle.enter(CasePhase::Failed);
            return Err(CaseError::Setup(e));
        }
    };

    lifecycle.enter(CasePhase::Running);
    let outcome = {
        let mut ctx = ExecutorContext {
            test_name: &case.test_name,
            test_data_path: &case.path,
            executor: &case.executor,
            fixture: &mut *fixture,
            store,
            config,
            assertions: Assertions::new(config.soft_assert_by_default),
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&mut ctx)))
            .unwrap_or_else(|payload| Err(CaseError::Panicked(panic_message(payload))));
        let recorded = ctx.assertions.finish();
        match (recorded, result) {
            (Ok(()), result) => result,
            (Err(recorded), Ok(())) => Err(recorded),
            (Err(recorded), Err(e)) => Err(recorded.merge(e)),
        }
    };
    lifecycle.enter(if outcome.is_ok() {
        CasePhase::Passed
    } else {
        CasePhase::Failed
    });

    let outcome = tear_down(&mut *fixture, outcome);
    lifecycle.enter(CasePhase::TornDown);
    if let Err(e) = &outcome {
        e.log_debug();
    }
    tracing::debug!("[RUN_CASE_EXIT] {} ok={}", case.relative_path, outcome.is_ok());
    outcome
}

fn tear_down(fixture: &mut dyn Fixture, outcome: Result<(), CaseError>) -> Result<(), CaseError> {
    let teardown = panic::catch_unwind(AssertUnwindSafe(|| fixture.tear_down()))
        .unwrap_or_else(|payload| Err(anyhow::anyhow!("teardown panicked: {}", panic_message(payload))));
    match (outcome, teardown) {
        (outcome, Ok(())) => outcome,
        (Ok(()), Err(e)) => Err(CaseError::Host(e.context("Fixture teardown failed"))),
        (Err(run), Err(e)) => Err(run.merge(CaseError::Host(e.context("Fixture teardown failed")))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
