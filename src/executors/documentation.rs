//! `documentation`: the documentation at the caret must equal `result.html`.

use crate::carets::single_caret;
use crate::constants::RESULT_HTML;
use crate::dispatch::ExecutorContext;
use crate::error::CaseError;
use crate::host::require;

pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    let files = ctx.load_query_project()?;
    let caret = single_caret(&files, "Documentation")?;
    let path = ctx.open_caret(&caret)?;

    let documentation = require(ctx.fixture.documentation(), "documentation")?
        .documentation_at(&path, caret.offset)
        .map_err(CaseError::host)?;
    let Some(documentation) = documentation else {
        return ctx.fail("no documentation found at caret");
    };

    let expected = ctx.read_fixture(RESULT_HTML)?;
    if ctx.config.override_output.documentation {
        ctx.write_fixture(RESULT_HTML, documentation.trim_end())?;
    }
    ctx.assertions.assert_text_eq(
        expected.trim_end(),
        documentation.trim_end(),
        "Unexpected documentation",
    )
}
