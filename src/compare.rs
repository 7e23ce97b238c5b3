//! Diff of the live project against the expected `after/` tree.

use crate::assertions::Assertions;
use crate::error::{CaseError, ConfigError};
use crate::host::EditorState;
use crate::markup::{bracketed, MarkupFile};
use crate::project::{EntryKind, FileStore};
use rustc_hash::FxHashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Compare every file of `store` with its counterpart below `after_root`.
///
/// After files are parsed as markup, so they may carry the caret position
/// expected once the operation finished. At most one unnamed caret may appear
/// across the whole after tree.
pub fn check_after_project(
    after_root: &Path,
    store: &dyn FileStore,
    editor: &EditorState,
    assertions: &mut Assertions,
) -> Result<(), CaseError> {
    if !after_root.is_dir() {
        return Err(ConfigError::MissingFixture {
            path: after_root.to_path_buf(),
        }
        .into());
    }
    tracing::debug!("[CHECK_AFTER_ENTER] after={:?}", after_root);
    let mut comparison = Comparison {
        after_root,
        store,
        editor,
        assertions,
        unnamed_carets: 0,
    };
    let result = comparison.check_dir(Path::new(""));
    tracing::debug!("[CHECK_AFTER_EXIT] ok={}", result.is_ok());
    result
}

struct Comparison<'a> {
    after_root: &'a Path,
    store: &'a dyn FileStore,
    editor: &'a EditorState,
    assertions: &'a mut Assertions,
    unnamed_carets: usize,
}

impl Comparison<'_> {
    fn check_dir(&mut self, relative: &Path) -> Result<(), CaseError> {
        let reference = self.after_root.join(relative);
        if !reference.exists() {
            return self.assertions.fail(format!(
                "{} has no corresponding directory in after project",
                relative.display()
            ));
        }
        if !reference.is_dir() {
            return self.assertions.fail(format!(
                "{} was a directory, but should have been a regular file",
                relative.display()
            ));
        }

        let live = self
            .store
            .entries(relative)
            .map_err(|e| ConfigError::io(relative, e))?;
        let mut live_names = FxHashSet::default();
        for entry in &live {
            let child = relative.join(&entry.name);
            match entry.kind {
                EntryKind::Directory => self.check_dir(&child)?,
                EntryKind::File => self.check_file(&child)?,
            }
            live_names.insert(entry.name.as_str());
        }

        let mut missed: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(&reference).map_err(|e| ConfigError::io(&reference, e))? {
            let entry = entry.map_err(|e| ConfigError::io(&reference, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !live_names.contains(name.as_str()) {
                missed.push(relative.join(name));
            }
        }
        if !missed.is_empty() {
            missed.sort();
            self.assertions.fail(format!(
                "Missed files {}",
                bracketed(missed.iter().map(|p| p.display()))
            ))?;
        }
        Ok(())
    }

    fn check_file(&mut self, relative: &Path) -> Result<(), CaseError> {
        let reference = self.after_root.join(relative);
        if !reference.exists() {
            return self.assertions.fail(format!(
                "{} has no corresponding file in after project",
                relative.display()
            ));
        }
        if reference.is_dir() {
            return self.assertions.fail(format!(
                "{} is a regular file, but should have been a directory",
                relative.display()
            ));
        }

        let text = fs::read_to_string(&reference).map_err(|e| ConfigError::io(&reference, e))?;
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let expected = MarkupFile::parse(name.as_str(), text);
        let actual = self
            .store
            .read_to_string(relative)
            .map_err(|e| ConfigError::io(relative, e))?;
        self.assertions.assert_text_eq(
            expected.clean_text(),
            &actual,
            format!("Unexpected content in file {}", name),
        )?;

        let carets = expected.carets();
        self.unnamed_carets += carets.iter().filter(|c| c.name.is_none()).count();
        if self.unnamed_carets > 1 {
            return Err(ConfigError::MultipleAfterCarets.into());
        }
        let Some(required) = carets.first() else {
            return Ok(());
        };

        if self.editor.open_file.as_deref() != Some(relative) {
            let open = self
                .editor
                .open_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".to_string());
            return self.assertions.fail_with_values(
                format!("file {}: Caret in unexpected file", relative.display()),
                relative.display().to_string(),
                open,
            );
        }
        if required.offset != self.editor.caret {
            self.assertions.fail_with_values(
                format!("file {}: Caret in unexpected position", relative.display()),
                expected.line_col(required.offset).to_string(),
                expected.line_col(self.editor.caret).to_string(),
            )?;
        }
        Ok(())
    }
}
