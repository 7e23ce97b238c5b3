//! `highlighting`: the host checks its own highlighting markup in every file.

use super::display_name;
use crate::dispatch::ExecutorContext;
use crate::error::CaseError;
use crate::host::require;
use crate::project::load_raw_project;

pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    let paths = load_raw_project(ctx.test_data_path, &*ctx.store)?;
    for path in &paths {
        ctx.fixture.open_file(path).map_err(CaseError::host)?;
        let mismatches = require(ctx.fixture.highlighting(), "highlighting")?
            .check_highlighting(path)
            .map_err(CaseError::host)?;
        for mismatch in mismatches {
            ctx.fail(format!("file {}: {}", display_name(path), mismatch))?;
        }
    }
    Ok(())
}
