//! The default behavior executors, one module per test data directory name.

pub mod actions;
pub mod completion;
pub mod documentation;
pub mod executed_completion;
pub mod find_usages;
pub mod highlighting;
pub mod hints;
pub mod inline;
pub mod parser;
pub mod rename;
pub mod resolve;

use crate::assertions::Assertions;
use crate::constants::SHOULD_FAIL_FILE;
use crate::dispatch::{ExecutorContext, ExecutorRegistry};
use crate::error::CaseError;
use crate::host::{Element, RefusedOperation};
use crate::markup::{LineCol, MarkupFile};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use text_size::TextSize;

pub fn default_registry() -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();
    registry.register("rename", Arc::new(rename::execute));
    registry.register("parser", Arc::new(parser::execute));
    registry.register("documentation", Arc::new(documentation::execute));
    registry.register("find usages", Arc::new(find_usages::execute));
    registry.register("actions", Arc::new(actions::execute));
    registry.register("resolve", Arc::new(resolve::execute));
    registry.register("hints", Arc::new(hints::execute));
    registry.register("inline", Arc::new(inline::execute));
    registry.register("completion", Arc::new(completion::execute));
    registry.register("executed completion", Arc::new(executed_completion::execute));
    registry.register("highlighting", Arc::new(highlighting::execute));
    registry
}

/// Apply the `should_fail.txt` protocol to the result of a refusable operation.
///
/// Returns whether the operation succeeded. Host errors other than
/// [`RefusedOperation`] end the case.
pub(crate) fn check_refusal(
    ctx: &mut ExecutorContext<'_>,
    result: anyhow::Result<()>,
    did_not_fail: &str,
    unexpected: &str,
) -> Result<bool, CaseError> {
    let expected = ctx.read_optional_fixture(SHOULD_FAIL_FILE)?;
    match result {
        Ok(()) => {
            if expected.is_some() {
                ctx.fail(did_not_fail)?;
            }
            Ok(true)
        }
        Err(e) => {
            let Some(refused) = e.downcast_ref::<RefusedOperation>() else {
                return Err(CaseError::host(e));
            };
            tracing::debug!("Operation refused: {}", refused.message);
            match expected {
                None => ctx.fail(format!("{}: {}", unexpected, refused.message))?,
                Some(expected) => ctx.assertions.assert_text_eq(
                    &expected,
                    &refused.message,
                    "Unexpected failure message",
                )?,
            }
            Ok(false)
        }
    }
}

/// Split host elements into those inside one of `files` and the rest.
pub(crate) fn partition_by_project<'e, T>(
    files: &[MarkupFile],
    items: &'e [T],
    element: impl Fn(&'e T) -> &'e Element,
) -> (Vec<&'e T>, Vec<&'e T>) {
    items.iter().partition(|item| {
        element(*item)
            .project_path()
            .is_some_and(|path| files.iter().any(|f| f.path() == Some(path)))
    })
}

/// Items of `internal` located in `file`, with their offsets.
pub(crate) fn located_in<'e, T>(
    file: &MarkupFile,
    internal: &[&'e T],
    element: impl Fn(&'e T) -> &'e Element,
) -> Vec<(&'e T, TextSize)> {
    let Some(path) = file.path() else {
        return Vec::new();
    };
    internal
        .iter()
        .filter_map(|item| element(*item).offset_in(path).map(|offset| (*item, offset)))
        .collect()
}

/// Report positions found more than once and wanted positions never found.
pub(crate) fn check_found_positions(
    assertions: &mut Assertions,
    file: &MarkupFile,
    found: &[TextSize],
    wanted: &[TextSize],
    duplicated: impl Fn(LineCol, usize) -> String,
    missed: impl Fn(String) -> String,
) -> Result<(), CaseError> {
    let mut times: BTreeMap<TextSize, usize> = BTreeMap::new();
    for offset in found {
        *times.entry(*offset).or_default() += 1;
    }
    for (offset, count) in times {
        if count != 1 {
            assertions.fail(duplicated(file.line_col(offset), count))?;
        }
    }

    let not_found: Vec<LineCol> = wanted
        .iter()
        .filter(|offset| !found.contains(offset))
        .map(|offset| file.line_col(*offset))
        .collect();
    if !not_found.is_empty() {
        assertions.fail(missed(crate::markup::bracketed(not_found)))?;
    }
    Ok(())
}

pub(crate) fn caret_clue(prefix: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{} caret {}", prefix, name),
        None => format!("{} nameless caret", prefix),
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
