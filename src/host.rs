//! The boundary to the IDE host that implements the behaviors under test.
//!
//! The harness never analyzes code itself. A host adapter supplies a
//! [`FixtureFactory`] that builds one [`Fixture`] per test case; the fixture
//! exposes the editor model and whatever behavior capabilities the plugin
//! supports. Capabilities default to `None`, in which case executors that need
//! them fail the case with a configuration error.

use crate::config::ProjectDescriptor;
use crate::error::ConfigError;
use crate::markup::{LineCol, ParseErrorInfo};
use crate::project::FileStore;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use text_size::TextSize;
use thiserror::Error;

/// The host signal for "this operation was refused", e.g. an invalid rename.
///
/// Providers return it inside their `anyhow::Error`; executors compare its
/// message with `should_fail.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RefusedOperation {
    pub message: String,
}

impl RefusedOperation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Where an element reported by the host lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementLocation {
    /// A file of the loaded project; `offset` is the clean offset of the name.
    Project { path: PathBuf, offset: TextSize },
    /// Outside the project, e.g. a standard library.
    External { file_name: String, position: LineCol },
}

/// A code element the host returned: a resolve target, a declaration, a usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub location: ElementLocation,
    /// Host specific element type, used in failure messages.
    pub kind: String,
    pub text: String,
}

impl Element {
    pub fn project(
        path: impl Into<PathBuf>,
        offset: TextSize,
        kind: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            location: ElementLocation::Project {
                path: path.into(),
                offset,
            },
            kind: kind.into(),
            text: text.into(),
        }
    }

    pub fn external(
        file_name: impl Into<String>,
        position: LineCol,
        kind: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            location: ElementLocation::External {
                file_name: file_name.into(),
                position,
            },
            kind: kind.into(),
            text: text.into(),
        }
    }

    pub fn project_path(&self) -> Option<&Path> {
        match &self.location {
            ElementLocation::Project { path, .. } => Some(path),
            ElementLocation::External { .. } => None,
        }
    }

    /// The element's offset if it lives in the project file at `path`.
    pub fn offset_in(&self, path: &Path) -> Option<TextSize> {
        match &self.location {
            ElementLocation::Project { path: p, offset } if p == path => Some(*offset),
            _ => None,
        }
    }

    /// Description of an external element no name could be found for.
    pub fn describe_unknown(&self) -> String {
        match &self.location {
            ElementLocation::External {
                file_name,
                position,
            } => format!(
                "unknown element of type {} in file {} at position {}",
                self.kind, file_name, position
            ),
            ElementLocation::Project { path, .. } => format!(
                "unknown element of type {} in file {}",
                self.kind,
                path.display()
            ),
        }
    }
}

/// Maps an element outside the project to the name used in
/// `external references.txt` and `external suggestions.txt`.
pub type ExternalSymbolNamer = Arc<dyn Fn(&Element) -> Option<String> + Send + Sync>;

pub fn deny_all_external_symbols() -> ExternalSymbolNamer {
    Arc::new(|_| None)
}

/// Editor state the result comparator checks carets against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pub open_file: Option<PathBuf>,
    pub caret: TextSize,
}

pub struct FixtureSetup<'a> {
    pub test_name: &'a str,
    /// Whether `store` lives on disk.
    pub heavy: bool,
    pub store: Arc<dyn FileStore>,
    pub project_descriptor: Option<&'a ProjectDescriptor>,
}

pub trait FixtureFactory: Send + Sync {
    fn set_up(&self, setup: FixtureSetup<'_>) -> anyhow::Result<Box<dyn Fixture>>;
}

/// Per test case host environment.
pub trait Fixture {
    fn open_file(&mut self, path: &Path) -> anyhow::Result<()>;

    fn move_caret(&mut self, offset: TextSize);

    fn editor(&self) -> EditorState;

    /// Write every modified document back to the project store.
    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Toggle automatic insertion of single completion items, returning the previous setting.
    fn set_autocomplete(&mut self, enabled: bool) -> bool {
        enabled
    }

    fn tear_down(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn parser(&mut self) -> Option<&mut dyn ParseProvider> {
        None
    }

    fn resolver(&mut self) -> Option<&mut dyn ResolveProvider> {
        None
    }

    fn completion(&mut self) -> Option<&mut dyn CompletionProvider> {
        None
    }

    fn refactoring(&mut self) -> Option<&mut dyn RefactoringProvider> {
        None
    }

    fn usages(&mut self) -> Option<&mut dyn UsagesProvider> {
        None
    }

    fn documentation(&mut self) -> Option<&mut dyn DocumentationProvider> {
        None
    }

    fn hints(&mut self) -> Option<&mut dyn HintProvider> {
        None
    }

    fn highlighting(&mut self) -> Option<&mut dyn HighlightingProvider> {
        None
    }
}

/// Unwrap an optional capability or report that the host lacks it.
pub fn require<'a, T: ?Sized>(
    capability: Option<&'a mut T>,
    name: &'static str,
) -> Result<&'a mut T, ConfigError> {
    capability.ok_or(ConfigError::MissingCapability { capability: name })
}

pub trait ParseProvider {
    fn parse_errors(&mut self, path: &Path) -> anyhow::Result<Vec<ParseErrorInfo>>;

    /// Debug rendering of the syntax tree, compared with the expected `<test>.txt`.
    fn syntax_tree(&mut self, path: &Path) -> anyhow::Result<String>;
}

pub trait ResolveProvider {
    /// Targets of the reference at `offset`, `None` if there is no reference.
    ///
    /// `incomplete` asks for targets of references that may not fully resolve.
    fn reference_at(
        &mut self,
        path: &Path,
        offset: TextSize,
        incomplete: bool,
    ) -> anyhow::Result<Option<Vec<Element>>>;

    fn is_reference_to(&mut self, path: &Path, offset: TextSize, target: &Element) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupItem {
    pub lookup_string: String,
    /// `None` for keywords, templates and other items without a code element.
    pub element: Option<Element>,
}

pub trait CompletionProvider {
    /// Completion items at `offset`, `None` if a single item was inserted directly.
    fn complete(&mut self, path: &Path, offset: TextSize) -> anyhow::Result<Option<Vec<LookupItem>>>;

    /// Apply `item` from the last completion.
    fn select(&mut self, item: &LookupItem) -> anyhow::Result<()>;
}

pub trait RefactoringProvider {
    fn rename(&mut self, path: &Path, offset: TextSize, new_name: &str) -> anyhow::Result<()>;

    fn inline(&mut self, path: &Path, offset: TextSize) -> anyhow::Result<()>;

    fn launch_intention(&mut self, intention: &str, path: &Path, offset: TextSize) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    /// The using element, positioned at the start of the referencing range.
    pub element: Element,
    /// Number of references the using element carries.
    pub reference_count: usize,
    /// Whether any of those references points at the searched definition.
    pub refers_to_definition: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSearch {
    pub definition: Element,
    pub usages: Vec<Usage>,
}

pub trait UsagesProvider {
    /// `None` if there is no declaration at `offset`.
    fn find_usages(&mut self, path: &Path, offset: TextSize) -> anyhow::Result<Option<UsageSearch>>;
}

pub trait DocumentationProvider {
    fn documentation_at(&mut self, path: &Path, offset: TextSize) -> anyhow::Result<Option<String>>;
}

pub trait HintProvider {
    /// Rendered inlay hints located exactly at `offset`.
    fn hints_at(&mut self, path: &Path, offset: TextSize) -> anyhow::Result<Vec<String>>;
}

pub trait HighlightingProvider {
    /// Compare the host's highlighting with the markup of `path`, returning mismatches.
    fn check_highlighting(&mut self, path: &Path) -> anyhow::Result<Vec<String>>;
}

/// Disables completion auto-insertion for as long as it lives.
///
/// The previous setting is restored on drop, whether or not the guarded
/// operation succeeded.
pub struct AutocompleteGuard<'a> {
    fixture: &'a mut dyn Fixture,
    previous: bool,
}

impl<'a> AutocompleteGuard<'a> {
    pub fn disable(fixture: &'a mut dyn Fixture) -> Self {
        let previous = fixture.set_autocomplete(false);
        Self { fixture, previous }
    }
}

impl<'a> Deref for AutocompleteGuard<'a> {
    type Target = dyn Fixture + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.fixture
    }
}

impl<'a> DerefMut for AutocompleteGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.fixture
    }
}

impl Drop for AutocompleteGuard<'_> {
    fn drop(&mut self) {
        self.fixture.set_autocomplete(self.previous);
    }
}

impl fmt::Debug for AutocompleteGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutocompleteGuard")
            .field("previous", &self.previous)
            .finish()
    }
}
