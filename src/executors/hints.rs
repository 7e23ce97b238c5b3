//! `hints`: the inlay hint at the caret must equal `result.txt`.
//!
//! An empty `result.txt` expects no hint at all.

use crate::carets::single_caret;
use crate::constants::RESULT_TXT;
use crate::dispatch::ExecutorContext;
use crate::error::CaseError;
use crate::host::require;

pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    let files = ctx.load_query_project()?;
    let caret = single_caret(&files, "Hints")?;
    let path = ctx.open_caret(&caret)?;
    let expected = ctx.read_fixture(RESULT_TXT)?;

    let hints = require(ctx.fixture.hints(), "hints")?
        .hints_at(&path, caret.offset)
        .map_err(CaseError::host)?;
    if hints.len() > 1 {
        ctx.fail(format!(
            "file {}: there should be only one hint at {}, found {}",
            caret.file.name(),
            caret.line_col(),
            hints.len()
        ))?;
    }

    match (expected.is_empty(), hints.first()) {
        (true, None) => Ok(()),
        (true, Some(hint)) => ctx
            .assertions
            .fail_with_values("Unexpected hint at caret", "", hint.as_str()),
        (false, None) => ctx.fail("no hint found at caret"),
        (false, Some(hint)) => ctx
            .assertions
            .assert_text_eq(expected.trim_end(), hint.trim_end(), "Unexpected hint"),
    }
}
