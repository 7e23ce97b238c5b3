//! `actions`: launch the intention named by the test path at the caret.

use super::check_refusal;
use crate::carets::single_caret;
use crate::dispatch::ExecutorContext;
use crate::error::{CaseError, ConfigError};
use crate::host::require;

pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    let files = ctx.load_before_project()?;
    let caret = single_caret(&files, "Action")?;
    let config = ctx.config;
    let intention = config
        .intention_for_path(ctx.test_data_path)
        .ok_or_else(|| ConfigError::invalid("test data path contains no known intention name"))?;
    tracing::debug!("Launching intention {} for {:?}", intention, ctx.test_data_path);

    let path = ctx.open_caret(&caret)?;
    let result = require(ctx.fixture.refactoring(), "actions")?.launch_intention(intention, &path, caret.offset);
    check_refusal(
        ctx,
        result,
        "Intention did not fail, when it was expected",
        "Unexpected intention error",
    )?;
    ctx.check_after_project()
}
