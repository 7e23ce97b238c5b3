//! `resolve`: every caret's reference must point at exactly the marked targets.

use super::{caret_clue, check_found_positions, located_in, partition_by_project};
use crate::carets::find_carets;
use crate::constants::EXTERNAL_REFERENCES_FILE;
use crate::dispatch::context::caret_path;
use crate::dispatch::ExecutorContext;
use crate::error::CaseError;
use crate::host::{require, Element};
use crate::markup::{bracketed, FoundCaret, MarkupFile};
use std::collections::BTreeSet;

pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    let dir = ctx.test_data_path;
    let files = ctx.load_project(dir)?;
    let carets = find_carets(&files)?;
    let wanted_external = ctx.read_fixture_lines(EXTERNAL_REFERENCES_FILE)?;

    for caret in &carets {
        ctx.with_clue(caret_clue("Resolve", caret.name), |ctx| {
            resolve_caret(ctx, &files, caret, &wanted_external)
        })?;
    }
    Ok(())
}

fn resolve_caret(
    ctx: &mut ExecutorContext<'_>,
    files: &[MarkupFile],
    caret: &FoundCaret<'_>,
    wanted_external: &[String],
) -> Result<(), CaseError> {
    let path = caret_path(caret)?;
    let has_no_reference = files
        .iter()
        .all(|f| f.wanted_reference_positions(caret.name).is_empty())
        && wanted_external.is_empty();

    let targets = require(ctx.fixture.resolver(), "resolve")?
        .reference_at(&path, caret.offset, has_no_reference)
        .map_err(CaseError::host)?;
    let has_reference = targets.is_some();
    let targets = match targets {
        Some(targets) => targets,
        None if has_no_reference => Vec::new(),
        None => {
            return ctx.fail(format!(
                "File {}: No reference found at offset {}",
                caret.file.name(),
                caret.line_col()
            ));
        }
    };

    let (internal, external) = partition_by_project(files, &targets, |e| e);

    for file in files {
        let wanted = file.wanted_reference_positions(caret.name);
        let mut found = Vec::new();
        for (target, offset) in located_in(file, &internal, |e| e) {
            if !wanted.contains(&offset) {
                ctx.assertions.fail(format!(
                    "File {}: Reference to {} at {} was not supposed to exist",
                    file.name(),
                    target.kind,
                    file.line_col(offset)
                ))?;
            }
            if has_reference {
                let consistent = require(ctx.fixture.resolver(), "resolve")?
                    .is_reference_to(&path, caret.offset, target)
                    .map_err(CaseError::host)?;
                if !consistent {
                    ctx.assertions.fail(format!(
                        "File {}: Inconsistent is_reference_to implementation referring to \"{}\" of type {}",
                        file.name(),
                        target.text,
                        target.kind
                    ))?;
                }
            }
            found.push(offset);
        }
        check_found_positions(
            &mut ctx.assertions,
            file,
            &found,
            &wanted,
            |at, times| format!("File {}: Reference to position {} was found {} times", file.name(), at, times),
            |missed| format!("File {}: References to positions {} were not found", file.name(), missed),
        )?;
    }

    check_external(ctx, &external, wanted_external)
}

fn check_external(
    ctx: &mut ExecutorContext<'_>,
    external: &[&Element],
    wanted: &[String],
) -> Result<(), CaseError> {
    let namer = ctx.config.external_symbol_namer.clone();
    let mut found = BTreeSet::new();
    for target in external {
        let name = match namer(*target) {
            Some(name) => {
                if !wanted.contains(&name) {
                    ctx.fail(format!("Unexpected reference to {}", name))?;
                }
                name
            }
            None => {
                let name = target.describe_unknown();
                ctx.fail(format!("Unexpected reference to {}", name))?;
                name
            }
        };
        found.insert(name);
    }

    let missing: Vec<&String> = wanted.iter().filter(|name| !found.contains(*name)).collect();
    if !missing.is_empty() {
        ctx.fail(format!(
            "Didn't find references to external language elements {}",
            bracketed(missing)
        ))?;
    }
    Ok(())
}
