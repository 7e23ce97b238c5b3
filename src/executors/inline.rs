use crate::carets::single_caret;
use crate::dispatch::ExecutorContext;
use crate::error::CaseError;
use crate::host::require;

/// `inline`: inline the element at the caret and compare with `after/`.
pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    let files = ctx.load_before_project()?;
    let caret = single_caret(&files, "Inline")?;
    let path = ctx.open_caret(&caret)?;
    require(ctx.fixture.refactoring(), "inline")?
        .inline(&path, caret.offset)
        .map_err(CaseError::host)?;
    ctx.check_after_project()
}
