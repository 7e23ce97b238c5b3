//! Project-wide caret registry.
//!
//! Every caret name, including the unnamed slot, may appear at most once
//! across all files of a loaded project.

use crate::error::ConfigError;
use crate::markup::{FoundCaret, MarkupFile};
use rustc_hash::FxHashSet;

/// Collect the carets of all `files`, in load order.
pub fn find_carets(files: &[MarkupFile]) -> Result<Vec<FoundCaret<'_>>, ConfigError> {
    let mut seen: FxHashSet<Option<&str>> = FxHashSet::default();
    let mut carets = Vec::new();

    for caret in files.iter().flat_map(MarkupFile::carets) {
        if !seen.insert(caret.name) {
            return Err(ConfigError::DuplicateCaret {
                name: caret.name.map(str::to_string),
            });
        }
        carets.push(caret);
    }

    if carets.is_empty() {
        return Err(ConfigError::NoCaret);
    }
    Ok(carets)
}

/// The only caret of `files`; `executor` names the behavior in the error.
pub fn single_caret<'a>(files: &'a [MarkupFile], executor: &str) -> Result<FoundCaret<'a>, ConfigError> {
    let mut carets = find_carets(files)?;
    if carets.len() != 1 {
        return Err(ConfigError::ExpectedSingleCaret {
            executor: executor.to_string(),
        });
    }
    Ok(carets.remove(0))
}
