//! `rename`: rename the element at the caret to `new_name.txt`.

use super::check_refusal;
use crate::carets::single_caret;
use crate::constants::NEW_NAME_FILE;
use crate::dispatch::ExecutorContext;
use crate::error::CaseError;
use crate::host::require;

pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    let files = ctx.load_before_project()?;
    let new_name = ctx.read_fixture(NEW_NAME_FILE)?;
    let new_name = new_name.trim_end_matches(['\r', '\n']);
    let caret = single_caret(&files, "Rename")?;
    let path = ctx.open_caret(&caret)?;

    let result = require(ctx.fixture.refactoring(), "rename")?.rename(&path, caret.offset, new_name);
    let renamed = check_refusal(
        ctx,
        result,
        "Rename did not fail, when it was expected",
        "Unexpected rename error",
    )?;
    if renamed {
        ctx.check_after_project()?;
    }
    Ok(())
}
