//! `find usages`: the usages of each caret's declaration must be the `<usage>` markers.

use super::{caret_clue, check_found_positions, located_in};
use crate::carets::find_carets;
use crate::dispatch::context::caret_path;
use crate::dispatch::ExecutorContext;
use crate::error::CaseError;
use crate::host::{require, Usage};
use crate::markup::{FoundCaret, MarkupFile};

pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    let dir = ctx.test_data_path;
    let files = ctx.load_project(dir)?;
    for caret in &find_carets(&files)? {
        ctx.with_clue(caret_clue("Find usages for", caret.name), |ctx| {
            find_usages_of(ctx, &files, caret)
        })?;
    }
    Ok(())
}

fn find_usages_of(
    ctx: &mut ExecutorContext<'_>,
    files: &[MarkupFile],
    caret: &FoundCaret<'_>,
) -> Result<(), CaseError> {
    let path = caret_path(caret)?;
    ctx.fixture.open_file(&path).map_err(CaseError::host)?;
    ctx.fixture.move_caret(caret.offset);

    let search = require(ctx.fixture.usages(), "find usages")?
        .find_usages(&path, caret.offset)
        .map_err(CaseError::host)?;
    let Some(search) = search else {
        return ctx.fail(format!(
            "file {}: no declaration found at {}",
            caret.file.name(),
            caret.line_col()
        ));
    };

    let usages: Vec<&Usage> = search.usages.iter().collect();
    for file in files {
        let wanted = file.wanted_usage_positions(caret.name);
        let mut found = Vec::new();
        for (usage, start) in located_in(file, &usages, |u| &u.element) {
            let at = file.line_col(start);
            let element = &usage.element;
            if usage.reference_count == 0 {
                ctx.assertions.fail(format!(
                    "File {}: Using element \"{}\"({}) of type {} had no reference",
                    file.name(),
                    element.text,
                    at,
                    element.kind
                ))?;
            } else {
                if !usage.refers_to_definition {
                    ctx.assertions.fail(format!(
                        "File {}: Inconsistent is_reference_to implementation in reference from \"{}\"({}) of type {}",
                        file.name(),
                        element.text,
                        at,
                        element.kind
                    ))?;
                }
                if !wanted.contains(&start) {
                    ctx.assertions.fail(format!(
                        "File {}: Reference from \"{}\"({}) of type {} was not supposed to exist",
                        file.name(),
                        element.text,
                        at,
                        element.kind
                    ))?;
                }
            }
            found.push(start);
        }
        check_found_positions(
            &mut ctx.assertions,
            file,
            &found,
            &wanted,
            |at, times| format!("File {}: Reference from position {} was found {} times", file.name(), at, times),
            |missed| format!("File {}: References from positions {} were not found", file.name(), missed),
        )?;
    }
    Ok(())
}
