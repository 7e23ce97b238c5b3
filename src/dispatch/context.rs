//! What an executor sees of the case it runs.

use crate::assertions::Assertions;
use crate::compare;
use crate::config::DirectoryTestConfig;
use crate::constants::{AFTER_DIR, BEFORE_DIR, PROJECT_DIR};
use crate::error::{CaseError, ConfigError};
use crate::host::Fixture;
use crate::markup::{FoundCaret, MarkupFile};
use crate::project::{loader, FileStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ExecutorContext<'a> {
    /// Directory name of the case, without the disabled prefix.
    pub test_name: &'a str,
    pub test_data_path: &'a Path,
    pub executor: &'a str,
    pub fixture: &'a mut dyn Fixture,
    pub store: Arc<dyn FileStore>,
    pub config: &'a DirectoryTestConfig,
    pub assertions: Assertions,
}

impl<'a> ExecutorContext<'a> {
    /// Load `dir` into the project store.
    ///
    /// When the host can parse, each file's parse errors must match its
    /// `<parse-error>` markers exactly.
    pub fn load_project(&mut self, dir: &Path) -> Result<Vec<MarkupFile>, CaseError> {
        let files = loader::load_project(dir, &*self.store)?;
        if let Some(parser) = self.fixture.parser() {
            for file in &files {
                let Some(path) = file.path() else { continue };
                let found = parser.parse_errors(path).map_err(CaseError::host)?;
                file.check_parse_errors(&found, &mut self.assertions)?;
            }
        }
        Ok(files)
    }

    pub fn load_before_project(&mut self) -> Result<Vec<MarkupFile>, CaseError> {
        let dir = self.test_data_path.join(BEFORE_DIR);
        self.load_project(&dir)
    }

    /// The `project/` tree of query executors.
    pub fn load_query_project(&mut self) -> Result<Vec<MarkupFile>, CaseError> {
        let dir = self.test_data_path.join(PROJECT_DIR);
        self.load_project(&dir)
    }

    /// Open the caret's file and place the editor caret on it, returning the file path.
    pub fn open_caret(&mut self, caret: &FoundCaret<'_>) -> Result<PathBuf, CaseError> {
        let path = caret_path(caret)?;
        self.fixture.open_file(&path).map_err(CaseError::host)?;
        self.fixture.move_caret(caret.offset);
        Ok(path)
    }

    /// Compare the live project and editor caret with `after/`.
    pub fn check_after_project(&mut self) -> Result<(), CaseError> {
        self.fixture.flush().map_err(CaseError::host)?;
        let editor = self.fixture.editor();
        let after = self.test_data_path.join(AFTER_DIR);
        compare::check_after_project(&after, &*self.store, &editor, &mut self.assertions)
    }

    /// Run `f` with `clue` attached to every failure recorded meanwhile.
    pub fn with_clue<T>(
        &mut self,
        clue: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T, CaseError>,
    ) -> Result<T, CaseError> {
        self.assertions.push_clue(clue);
        let result = f(self);
        self.assertions.pop_clue();
        result
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), CaseError> {
        self.assertions.fail(message)
    }

    pub fn fixture_file(&self, name: &str) -> PathBuf {
        self.test_data_path.join(name)
    }

    pub fn has_fixture_file(&self, name: &str) -> bool {
        self.fixture_file(name).is_file()
    }

    /// Contents of a file next to the case's trees.
    pub fn read_fixture(&self, name: &str) -> Result<String, ConfigError> {
        let path = self.fixture_file(name);
        if !path.is_file() {
            return Err(ConfigError::MissingFixture { path });
        }
        fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))
    }

    pub fn read_optional_fixture(&self, name: &str) -> Result<Option<String>, ConfigError> {
        if self.has_fixture_file(name) {
            self.read_fixture(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Lines of an optional list fixture; a missing file is an empty list.
    ///
    /// Duplicate lines are a mistake in the fixture.
    pub fn read_fixture_lines(&self, name: &str) -> Result<Vec<String>, ConfigError> {
        let Some(text) = self.read_optional_fixture(name)? else {
            return Ok(Vec::new());
        };
        let mut lines: Vec<String> = Vec::new();
        for line in text.lines() {
            if lines.iter().any(|l| l == line) {
                return Err(ConfigError::invalid(format!(
                    "{} contains the line \"{}\" more than once",
                    name, line
                )));
            }
            lines.push(line.to_string());
        }
        Ok(lines)
    }

    /// Replace a fixture file, used when expected output is overridden.
    pub fn write_fixture(&self, name: &str, contents: &str) -> Result<(), ConfigError> {
        let path = self.fixture_file(name);
        tracing::info!("Overriding expected output {:?}", path);
        fs::write(&path, contents).map_err(|e| ConfigError::io(&path, e))
    }
}

/// Path of the caret's file in the project store.
pub fn caret_path(caret: &FoundCaret<'_>) -> Result<PathBuf, ConfigError> {
    caret
        .file
        .path()
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::invalid(format!("Caret file {} is not part of the project", caret.file.name())))
}
