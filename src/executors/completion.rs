//! `completion`: the suggestions at the caret must be exactly the expected ones.
//!
//! Project elements are expected through `<ref>` markers, elements outside the
//! project through `external suggestions.txt` and items without an element,
//! such as keywords, through `non_psi_items.txt`.

use super::{check_found_positions, located_in, partition_by_project};
use crate::carets::single_caret;
use crate::constants::{EXTERNAL_SUGGESTIONS_FILE, NON_PSI_ITEMS_FILE};
use crate::dispatch::context::caret_path;
use crate::dispatch::ExecutorContext;
use crate::error::{CaseError, ConfigError};
use crate::host::{require, AutocompleteGuard, LookupItem};
use crate::markup::{bracketed, FoundCaret, MarkupFile};
use std::collections::BTreeSet;

pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    let dir = ctx.test_data_path;
    let files = ctx.load_project(dir)?;
    let caret = single_caret(&files, "Completion")?;
    let items = complete_at(ctx, &caret)?;

    let (with_element, without_element): (Vec<&LookupItem>, Vec<&LookupItem>) =
        items.iter().partition(|item| item.element.is_some());

    let lookups: BTreeSet<&str> = without_element
        .iter()
        .map(|item| item.lookup_string.as_str())
        .collect();
    check_non_element_items(ctx, &lookups)?;
    check_element_items(ctx, &files, &caret, &with_element)
}

/// Complete at `caret` with auto-insertion of single items disabled.
pub(crate) fn complete_at(
    ctx: &mut ExecutorContext<'_>,
    caret: &FoundCaret<'_>,
) -> Result<Vec<LookupItem>, CaseError> {
    let path = caret_path(caret)?;
    let mut fixture = AutocompleteGuard::disable(&mut *ctx.fixture);
    fixture.open_file(&path).map_err(CaseError::host)?;
    fixture.move_caret(caret.offset);
    let items = require(fixture.completion(), "completion")?
        .complete(&path, caret.offset)
        .map_err(CaseError::host)?;
    items.ok_or_else(|| ConfigError::invalid("Test code failed to disable autocompletion").into())
}

fn check_non_element_items(ctx: &mut ExecutorContext<'_>, lookups: &BTreeSet<&str>) -> Result<(), CaseError> {
    let expected_lines = ctx.read_fixture_lines(NON_PSI_ITEMS_FILE)?;
    let expected: BTreeSet<&str> = expected_lines.iter().map(String::as_str).collect();

    let missing: Vec<&str> = expected.difference(lookups).copied().collect();
    if !missing.is_empty() {
        ctx.fail(format!(
            "Not all non-element lookups were suggested by the auto-completion: {}",
            bracketed(missing)
        ))?;
    }
    let additional: Vec<&str> = lookups.difference(&expected).copied().collect();
    if !additional.is_empty() {
        ctx.fail(format!(
            "Unexpected non-element lookup items were suggested by the auto-completion: {}",
            bracketed(additional)
        ))?;
    }
    Ok(())
}

fn check_element_items(
    ctx: &mut ExecutorContext<'_>,
    files: &[MarkupFile],
    caret: &FoundCaret<'_>,
    items: &[&LookupItem],
) -> Result<(), CaseError> {
    let elements: Vec<_> = items.iter().filter_map(|item| item.element.as_ref()).collect();
    let (internal, external) = partition_by_project(files, &elements, |e| *e);
    let internal: Vec<_> = internal.into_iter().copied().collect();

    for file in files {
        let wanted = file.wanted_reference_positions(caret.name);
        let mut found = Vec::new();
        for (element, offset) in located_in(file, &internal, |e| e) {
            if !wanted.contains(&offset) {
                ctx.assertions.fail(format!(
                    "file {}: {} at {} was not supposed to be suggested",
                    file.name(),
                    element.kind,
                    file.line_col(offset)
                ))?;
            }
            found.push(offset);
        }
        check_found_positions(
            &mut ctx.assertions,
            file,
            &found,
            &wanted,
            |at, times| format!("file {}: element at position {} was suggested {} times", file.name(), at, times),
            |missed| format!("file {}: elements at positions {} were not suggested", file.name(), missed),
        )?;
    }

    let wanted_external = ctx.read_fixture_lines(EXTERNAL_SUGGESTIONS_FILE)?;
    let namer = ctx.config.external_symbol_namer.clone();
    let mut found_external = BTreeSet::new();
    for element in external {
        let name = match namer(*element) {
            Some(name) => {
                if !wanted_external.contains(&name) {
                    ctx.fail(format!("unexpected suggestion: {}", name))?;
                }
                name
            }
            None => {
                let name = element.describe_unknown();
                ctx.fail(format!("unexpected suggestion: {}", name))?;
                name
            }
        };
        found_external.insert(name);
    }
    let missing: Vec<&String> = wanted_external
        .iter()
        .filter(|name| !found_external.contains(*name))
        .collect();
    if !missing.is_empty() {
        ctx.fail(format!(
            "didn't suggest external language elements {}",
            bracketed(missing)
        ))?;
    }
    Ok(())
}
