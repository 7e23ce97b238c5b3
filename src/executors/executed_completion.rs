//! `executed completion`: apply the one marked completion item and compare with `after/`.

use super::completion::complete_at;
use super::partition_by_project;
use crate::carets::single_caret;
use crate::constants::{EXTERNAL_SUGGESTIONS_FILE, NON_PSI_ITEMS_FILE};
use crate::dispatch::ExecutorContext;
use crate::error::{CaseError, ConfigError, Failure};
use crate::host::{require, AutocompleteGuard, Element, LookupItem};
use crate::markup::{bracketed, FoundCaret, MarkupFile};

const SINGLE: &str = "completion tests must select a single element to complete";

pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    let files = ctx.load_before_project()?;
    let caret = single_caret(&files, "Executing completion")?;
    let items = complete_at(ctx, &caret)?;

    let selected = select(ctx, &caret, &files, &items)?.clone();
    tracing::debug!("Selected completion item {:?}", selected.lookup_string);
    {
        let mut fixture = AutocompleteGuard::disable(&mut *ctx.fixture);
        require(fixture.completion(), "completion")?
            .select(&selected)
            .map_err(CaseError::host)?;
    }

    ctx.check_after_project()
}

fn select<'i>(
    ctx: &mut ExecutorContext<'_>,
    caret: &FoundCaret<'_>,
    files: &[MarkupFile],
    items: &'i [LookupItem],
) -> Result<&'i LookupItem, CaseError> {
    let (with_element, without_element): (Vec<&LookupItem>, Vec<&LookupItem>) =
        items.iter().partition(|item| item.element.is_some());

    let element_item = select_element(ctx, caret, files, &with_element)?;
    let has_non_element_file = ctx.has_fixture_file(NON_PSI_ITEMS_FILE);
    if has_non_element_file && element_item.is_some() {
        return Err(ConfigError::invalid(format!(
            "Both an element and a non-element lookup item were specified, but {}",
            SINGLE
        ))
        .into());
    }
    if let Some(item) = element_item {
        return Ok(item);
    }
    if !has_non_element_file {
        return Err(ConfigError::invalid("No internal, external or non-element lookup item was specified").into());
    }

    let wanted = single_line(
        ctx,
        NON_PSI_ITEMS_FILE,
        "Multiple lookup items were specified as non-element items",
        "No lookup item was specified as non-element item",
    )?;
    let found: Vec<&LookupItem> = without_element
        .into_iter()
        .filter(|item| item.lookup_string == wanted)
        .collect();
    match found.as_slice() {
        [] => Err(not_among_entries(&wanted)),
        [item] => Ok(*item),
        _ => Err(ConfigError::invalid(format!(
            "Multiple non-element lookup items with name '{}', but {}",
            wanted, SINGLE
        ))
        .into()),
    }
}

fn select_element<'i>(
    ctx: &mut ExecutorContext<'_>,
    caret: &FoundCaret<'_>,
    files: &[MarkupFile],
    items: &[&'i LookupItem],
) -> Result<Option<&'i LookupItem>, CaseError> {
    let elements: Vec<(&'i LookupItem, &'i Element)> = items
        .iter()
        .filter_map(|item| item.element.as_ref().map(|element| (*item, element)))
        .collect();
    let (internal, external) = partition_by_project(files, &elements, |(_, element)| *element);

    let internal_item = select_internal(caret, files, &internal)?;
    let has_external_file = ctx.has_fixture_file(EXTERNAL_SUGGESTIONS_FILE);
    if has_external_file && internal_item.is_some() {
        return Err(ConfigError::invalid(format!(
            "Both an internal and an external reference was specified, but {}",
            SINGLE
        ))
        .into());
    }
    if internal_item.is_some() || !has_external_file {
        return Ok(internal_item);
    }

    let wanted = single_line(
        ctx,
        EXTERNAL_SUGGESTIONS_FILE,
        "Multiple lookup items were specified as external references",
        "No lookup item was specified as external reference",
    )?;
    let namer = ctx.config.external_symbol_namer.clone();
    let mut found: Vec<&'i LookupItem> = Vec::new();
    for (item, element) in external.iter().map(|pair| **pair) {
        match namer(element) {
            Some(name) if name == wanted => found.push(item),
            Some(_) => {}
            None => ctx.fail(format!("Unexpected suggestion: {}", element.describe_unknown()))?,
        }
    }
    match found.as_slice() {
        [] => Err(not_among_entries(&wanted)),
        [item] => Ok(Some(*item)),
        _ => Err(ConfigError::invalid(format!(
            "Multiple lookup items with external name '{}', but {}",
            wanted, SINGLE
        ))
        .into()),
    }
}

fn select_internal<'i>(
    caret: &FoundCaret<'_>,
    files: &[MarkupFile],
    internal: &[&(&'i LookupItem, &'i Element)],
) -> Result<Option<&'i LookupItem>, CaseError> {
    let mut marked = Vec::new();
    for file in files {
        match file.wanted_reference_positions(caret.name).as_slice() {
            [] => {}
            [offset] => marked.push((file, *offset)),
            _ => {
                return Err(ConfigError::invalid(format!(
                    "File {}: Multiple lookup items were marked, but {}",
                    file.name(),
                    SINGLE
                ))
                .into())
            }
        }
    }
    let (file, offset) = match marked.as_slice() {
        [] => return Ok(None),
        [single] => *single,
        many => {
            return Err(ConfigError::invalid(format!(
                "Multiple lookup items were marked (one in files {}), but {}",
                bracketed(many.iter().map(|(f, _)| f.name())),
                SINGLE
            ))
            .into())
        }
    };

    let Some(path) = file.path() else {
        return Ok(None);
    };
    let matching: Vec<&'i LookupItem> = internal
        .iter()
        .filter(|(_, element)| element.offset_in(path) == Some(offset))
        .map(|(item, _)| *item)
        .collect();
    match matching.as_slice() {
        [] => Err(ConfigError::invalid(format!(
            "The element at {}:{} was not among the completion entries",
            file.name(),
            file.line_col(offset)
        ))
        .into()),
        [item] => Ok(Some(*item)),
        _ => Err(ConfigError::invalid(format!(
            "Multiple lookup items matched the marker in file {}, but {}",
            file.name(),
            SINGLE
        ))
        .into()),
    }
}

/// The only non-empty line of a selection fixture.
fn single_line(
    ctx: &ExecutorContext<'_>,
    fixture: &str,
    multiple: &str,
    none: &str,
) -> Result<String, CaseError> {
    let mut lines: Vec<String> = ctx
        .read_fixture_lines(fixture)?
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect();
    match lines.len() {
        0 => Err(ConfigError::invalid(format!("{}, but {}", none, SINGLE)).into()),
        1 => Ok(lines.remove(0)),
        _ => Err(ConfigError::invalid(format!("{}, but {}", multiple, SINGLE)).into()),
    }
}

fn not_among_entries(wanted: &str) -> CaseError {
    CaseError::Failed(vec![Failure::new(format!(
        "The element at '{}' was not among the completion entries",
        wanted
    ))])
}
