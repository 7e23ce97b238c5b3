#![allow(dead_code)]

//! A toy language host and fixture tree builder shared by the integration tests.
//!
//! Toy files end in `.toy`. `let NAME = VALUE` declares `NAME`, every other
//! identifier references the declarations of the same name, `print` resolves to
//! an element outside the project, `#` starts a comment and `?` is a parse error.

use ide_dirtests::host::{
    CompletionProvider, DocumentationProvider, EditorState, Element, Fixture, FixtureFactory,
    FixtureSetup, HighlightingProvider, HintProvider, LookupItem, ParseProvider, RefactoringProvider,
    RefusedOperation, ResolveProvider, Usage, UsageSearch, UsagesProvider,
};
use ide_dirtests::markup::{LineCol, ParseErrorInfo};
use ide_dirtests::project::{EntryKind, FileStore};
use ide_dirtests::DirectoryTestConfig;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use text_size::TextSize;

pub const UPPERCASE_INTENTION: &str = "UppercaseIntention";

/// A temporary test data root.
pub struct TestData {
    pub dir: TempDir,
}

impl TestData {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, relative: &str, contents: &str) -> &Self {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    pub fn dir(&self, relative: &str) -> &Self {
        fs::create_dir_all(self.dir.path().join(relative)).unwrap();
        self
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.dir.path().join(relative)).unwrap()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRecord {
    pub test_name: String,
    pub heavy: bool,
    pub on_disk: bool,
    pub thread: Option<String>,
}

#[derive(Default)]
pub struct ToyHost {
    pub fail_setup: bool,
    /// Test name whose setup panics instead of returning.
    pub panic_setup_for: Option<&'static str>,
    pub fail_teardown: bool,
    pub setups: Mutex<Vec<SetupRecord>>,
    pub teardowns: Arc<AtomicUsize>,
}

impl ToyHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn teardown_count(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

/// The config every integration test starts from.
pub fn toy_config(host: &Arc<ToyHost>, data: &TestData) -> DirectoryTestConfig {
    DirectoryTestConfig::new(host.clone())
        .with_test_data_root(data.root())
        .with_known_intentions([UPPERCASE_INTENTION])
        .with_external_symbol_namer(Arc::new(|element: &Element| {
            (element.kind == "Function").then(|| format!("std.{}", element.text))
        }))
}

impl FixtureFactory for ToyHost {
    fn set_up(&self, setup: FixtureSetup<'_>) -> anyhow::Result<Box<dyn Fixture>> {
        self.setups.lock().push(SetupRecord {
            test_name: setup.test_name.to_string(),
            heavy: setup.heavy,
            on_disk: setup.store.disk_root().is_some(),
            thread: std::thread::current().name().map(str::to_string),
        });
        if self.panic_setup_for == Some(setup.test_name) {
            panic!("toy project exploded");
        }
        if self.fail_setup {
            anyhow::bail!("no toy project available");
        }
        Ok(Box::new(ToyFixture {
            store: setup.store,
            docs: BTreeMap::new(),
            open: None,
            caret: TextSize::from(0),
            autocomplete: true,
            fail_teardown: self.fail_teardown,
            teardowns: self.teardowns.clone(),
        }))
    }
}

pub struct ToyFixture {
    store: Arc<dyn FileStore>,
    docs: BTreeMap<PathBuf, String>,
    open: Option<PathBuf>,
    caret: TextSize,
    autocomplete: bool,
    fail_teardown: bool,
    teardowns: Arc<AtomicUsize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Keyword,
    Number,
    Str,
    Error,
    Punct,
}

#[derive(Debug, Clone, Copy)]
pub struct Token<'t> {
    pub kind: TokenKind,
    pub start: usize,
    pub text: &'t str,
}

impl Token<'_> {
    fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < text.len() {
        let c = text[i..].chars().next().unwrap();
        let start = i;
        let kind = if c.is_whitespace() {
            i += c.len_utf8();
            continue;
        } else if c == '#' {
            i = text[i..].find('\n').map_or(text.len(), |n| i + n);
            continue;
        } else if c.is_ascii_alphabetic() || c == '_' {
            i = text[i..].find(|c: char| !is_ident_char(c)).map_or(text.len(), |n| i + n);
            if &text[start..i] == "let" {
                TokenKind::Keyword
            } else {
                TokenKind::Ident
            }
        } else if c.is_ascii_digit() {
            i = text[i..].find(|c: char| !c.is_ascii_digit()).map_or(text.len(), |n| i + n);
            TokenKind::Number
        } else if c == '"' {
            i = text[i + 1..].find('"').map_or(text.len(), |n| i + n + 2);
            TokenKind::Str
        } else if c == '?' {
            i += 1;
            TokenKind::Error
        } else {
            i += c.len_utf8();
            TokenKind::Punct
        };
        tokens.push(Token {
            kind,
            start,
            text: &text[start..i],
        });
    }
    tokens
}

fn is_declaration(tokens: &[Token<'_>], index: usize) -> bool {
    tokens[index].kind == TokenKind::Ident
        && index > 0
        && tokens[index - 1].kind == TokenKind::Keyword
}

fn ident_at(tokens: &[Token<'_>], offset: usize) -> Option<usize> {
    tokens
        .iter()
        .position(|t| t.kind == TokenKind::Ident && t.start <= offset && offset < t.end())
        .or_else(|| {
            tokens
                .iter()
                .position(|t| t.kind == TokenKind::Ident && t.end() == offset)
        })
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(is_ident_char)
        && name != "let"
}

#[derive(Debug, Clone)]
struct Declaration {
    path: PathBuf,
    offset: usize,
    name: String,
    value: String,
    doc: Option<String>,
}

impl Declaration {
    fn element(&self) -> Element {
        Element::project(
            self.path.clone(),
            TextSize::from(self.offset as u32),
            "Declaration",
            self.name.clone(),
        )
    }
}

fn print_element() -> Element {
    Element::external("std.toy", LineCol::new(1, 1), "Function", "print")
}

impl ToyFixture {
    fn text(&self, path: &Path) -> anyhow::Result<String> {
        match self.docs.get(path) {
            Some(text) => Ok(text.clone()),
            None => Ok(self.store.read_to_string(path)?),
        }
    }

    fn set_text(&mut self, path: &Path, text: String) {
        self.docs.insert(path.to_path_buf(), text);
    }

    fn toy_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        let mut pending = vec![PathBuf::new()];
        while let Some(dir) = pending.pop() {
            for entry in self.store.entries(&dir)? {
                let path = dir.join(&entry.name);
                match entry.kind {
                    EntryKind::Directory => pending.push(path),
                    EntryKind::File if entry.name.ends_with(".toy") => out.push(path),
                    EntryKind::File => {}
                }
            }
        }
        out.sort();
        Ok(out)
    }

    fn declarations(&self) -> anyhow::Result<Vec<Declaration>> {
        let mut out = Vec::new();
        for path in self.toy_files()? {
            let text = self.text(&path)?;
            let tokens = tokenize(&text);
            for index in 0..tokens.len() {
                if !is_declaration(&tokens, index) {
                    continue;
                }
                let token = tokens[index];
                let line_start = text[..token.start].rfind('\n').map_or(0, |n| n + 1);
                let line_end = text[token.start..].find('\n').map_or(text.len(), |n| token.start + n);
                let value = text[token.end()..line_end]
                    .trim()
                    .trim_start_matches('=')
                    .trim()
                    .trim_end_matches(';')
                    .to_string();
                let doc = (line_start > 0)
                    .then(|| {
                        let previous_start = text[..line_start - 1].rfind('\n').map_or(0, |n| n + 1);
                        text[previous_start..line_start - 1].trim()
                    })
                    .and_then(|line| line.strip_prefix('#'))
                    .map(|doc| doc.trim().to_string());
                out.push(Declaration {
                    path: path.clone(),
                    offset: token.start,
                    name: token.text.to_string(),
                    value,
                    doc,
                });
            }
        }
        Ok(out)
    }

    fn name_at(&self, path: &Path, offset: TextSize) -> anyhow::Result<Option<(String, usize, bool)>> {
        let text = self.text(path)?;
        let tokens = tokenize(&text);
        Ok(ident_at(&tokens, usize::from(offset))
            .map(|index| (tokens[index].text.to_string(), tokens[index].start, is_declaration(&tokens, index))))
    }

    /// Replace every identifier token named `from` in `path`.
    fn replace_identifier(&mut self, path: &Path, from: &str, to: &str) -> anyhow::Result<()> {
        let text = self.text(path)?;
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for token in tokenize(&text) {
            if token.kind == TokenKind::Ident && token.text == from {
                out.push_str(&text[cursor..token.start]);
                out.push_str(to);
                cursor = token.end();
            }
        }
        out.push_str(&text[cursor..]);
        self.set_text(path, out);
        Ok(())
    }

    fn open_text(&self) -> anyhow::Result<(PathBuf, String)> {
        let path = self
            .open
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no file is open"))?;
        let text = self.text(&path)?;
        Ok((path, text))
    }

    fn insert_item(&mut self, item: &LookupItem) -> anyhow::Result<()> {
        let (path, text) = self.open_text()?;
        let caret = usize::from(self.caret);
        let prefix_start = text[..caret]
            .rfind(|c: char| !is_ident_char(c))
            .map_or(0, |n| n + 1);
        let mut updated = String::with_capacity(text.len() + item.lookup_string.len());
        updated.push_str(&text[..prefix_start]);
        updated.push_str(&item.lookup_string);
        updated.push_str(&text[caret..]);
        self.set_text(&path, updated);
        self.caret = TextSize::from((prefix_start + item.lookup_string.len()) as u32);
        Ok(())
    }
}

impl Fixture for ToyFixture {
    fn open_file(&mut self, path: &Path) -> anyhow::Result<()> {
        if self.store.kind(path) != Some(EntryKind::File) {
            anyhow::bail!("{} is not a file of the project", path.display());
        }
        self.open = Some(path.to_path_buf());
        self.caret = TextSize::from(0);
        Ok(())
    }

    fn move_caret(&mut self, offset: TextSize) {
        self.caret = offset;
    }

    fn editor(&self) -> EditorState {
        EditorState {
            open_file: self.open.clone(),
            caret: self.caret,
        }
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        for (path, text) in std::mem::take(&mut self.docs) {
            self.store.write(&path, &text)?;
        }
        Ok(())
    }

    fn set_autocomplete(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.autocomplete, enabled)
    }

    fn tear_down(&mut self) -> anyhow::Result<()> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        if self.fail_teardown {
            anyhow::bail!("toy project still locked");
        }
        Ok(())
    }

    fn parser(&mut self) -> Option<&mut dyn ParseProvider> {
        Some(self)
    }

    fn resolver(&mut self) -> Option<&mut dyn ResolveProvider> {
        Some(self)
    }

    fn completion(&mut self) -> Option<&mut dyn CompletionProvider> {
        Some(self)
    }

    fn refactoring(&mut self) -> Option<&mut dyn RefactoringProvider> {
        Some(self)
    }

    fn usages(&mut self) -> Option<&mut dyn UsagesProvider> {
        Some(self)
    }

    fn documentation(&mut self) -> Option<&mut dyn DocumentationProvider> {
        Some(self)
    }

    fn hints(&mut self) -> Option<&mut dyn HintProvider> {
        Some(self)
    }

    fn highlighting(&mut self) -> Option<&mut dyn HighlightingProvider> {
        Some(self)
    }
}

impl ParseProvider for ToyFixture {
    fn parse_errors(&mut self, path: &Path) -> anyhow::Result<Vec<ParseErrorInfo>> {
        if path.extension().and_then(|e| e.to_str()) != Some("toy") {
            return Ok(Vec::new());
        }
        let text = self.text(path)?;
        Ok(tokenize(&text)
            .into_iter()
            .filter(|t| t.kind == TokenKind::Error)
            .map(|t| ParseErrorInfo {
                offset: TextSize::from(t.start as u32),
                description: "unexpected '?'".to_string(),
            })
            .collect())
    }

    fn syntax_tree(&mut self, path: &Path) -> anyhow::Result<String> {
        let text = self.text(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut out = format!("File({})", name);
        for token in tokenize(&text) {
            out.push_str(&format!("\n  {:?}({})", token.kind, token.text));
        }
        Ok(out)
    }
}

impl ResolveProvider for ToyFixture {
    fn reference_at(
        &mut self,
        path: &Path,
        offset: TextSize,
        _incomplete: bool,
    ) -> anyhow::Result<Option<Vec<Element>>> {
        let Some((name, _, false)) = self.name_at(path, offset)? else {
            return Ok(None);
        };
        if name == "print" {
            return Ok(Some(vec![print_element()]));
        }
        Ok(Some(
            self.declarations()?
                .iter()
                .filter(|d| d.name == name)
                .map(Declaration::element)
                .collect(),
        ))
    }

    fn is_reference_to(&mut self, path: &Path, offset: TextSize, target: &Element) -> anyhow::Result<bool> {
        Ok(self
            .name_at(path, offset)?
            .is_some_and(|(name, _, _)| name == target.text))
    }
}

impl CompletionProvider for ToyFixture {
    fn complete(&mut self, path: &Path, offset: TextSize) -> anyhow::Result<Option<Vec<LookupItem>>> {
        let text = self.text(path)?;
        let caret = usize::from(offset);
        let prefix_start = text[..caret]
            .rfind(|c: char| !is_ident_char(c))
            .map_or(0, |n| n + 1);
        let prefix = &text[prefix_start..caret];

        let mut items: Vec<LookupItem> = self
            .declarations()?
            .iter()
            .map(|d| LookupItem {
                lookup_string: d.name.clone(),
                element: Some(d.element()),
            })
            .collect();
        items.push(LookupItem {
            lookup_string: "let".to_string(),
            element: None,
        });
        items.push(LookupItem {
            lookup_string: "print".to_string(),
            element: Some(print_element()),
        });
        items.retain(|item| item.lookup_string.starts_with(prefix));

        if self.autocomplete && items.len() == 1 {
            self.insert_item(&items[0])?;
            return Ok(None);
        }
        Ok(Some(items))
    }

    fn select(&mut self, item: &LookupItem) -> anyhow::Result<()> {
        self.insert_item(item)
    }
}

impl RefactoringProvider for ToyFixture {
    fn rename(&mut self, path: &Path, offset: TextSize, new_name: &str) -> anyhow::Result<()> {
        let Some((old, _, _)) = self.name_at(path, offset)? else {
            anyhow::bail!("nothing to rename at {:?}", offset);
        };
        if !is_valid_name(new_name) {
            return Err(RefusedOperation::new(format!("'{}' is not a valid identifier", new_name)).into());
        }
        for file in self.toy_files()? {
            self.replace_identifier(&file, &old, new_name)?;
        }
        Ok(())
    }

    fn inline(&mut self, path: &Path, offset: TextSize) -> anyhow::Result<()> {
        let Some((name, _, false)) = self.name_at(path, offset)? else {
            return Err(RefusedOperation::new("Cannot inline a declaration").into());
        };
        let declaration = self
            .declarations()?
            .into_iter()
            .find(|d| d.path == path && d.name == name)
            .ok_or_else(|| RefusedOperation::new(format!("No declaration of {} to inline", name)))?;

        let text = self.text(path)?;
        let line_start = text[..declaration.offset].rfind('\n').map_or(0, |n| n + 1);
        let line_end = text[declaration.offset..]
            .find('\n')
            .map_or(text.len(), |n| declaration.offset + n + 1);
        let without = format!("{}{}", &text[..line_start], &text[line_end..]);
        self.set_text(path, without);
        self.replace_identifier(path, &name, &declaration.value)?;
        self.caret = TextSize::from(line_start as u32);
        Ok(())
    }

    fn launch_intention(&mut self, intention: &str, path: &Path, offset: TextSize) -> anyhow::Result<()> {
        if intention != UPPERCASE_INTENTION {
            anyhow::bail!("unknown intention {}", intention);
        }
        let text = self.text(path)?;
        let tokens = tokenize(&text);
        let index = ident_at(&tokens, usize::from(offset))
            .ok_or_else(|| RefusedOperation::new("No identifier at caret"))?;
        let token = tokens[index];
        let upper = token.text.to_ascii_uppercase();
        if upper == token.text {
            return Err(RefusedOperation::new("Identifier is already uppercase").into());
        }
        let updated = format!("{}{}{}", &text[..token.start], upper, &text[token.end()..]);
        self.set_text(path, updated);
        self.caret = TextSize::from(token.end() as u32);
        Ok(())
    }
}

impl UsagesProvider for ToyFixture {
    fn find_usages(&mut self, path: &Path, offset: TextSize) -> anyhow::Result<Option<UsageSearch>> {
        let Some((name, _, _)) = self.name_at(path, offset)? else {
            return Ok(None);
        };
        let Some(definition) = self.declarations()?.into_iter().find(|d| d.name == name) else {
            return Ok(None);
        };

        let mut usages = Vec::new();
        for file in self.toy_files()? {
            let text = self.text(&file)?;
            let tokens = tokenize(&text);
            for (index, token) in tokens.iter().enumerate() {
                if token.kind == TokenKind::Ident && token.text == name && !is_declaration(&tokens, index) {
                    usages.push(Usage {
                        element: Element::project(
                            file.clone(),
                            TextSize::from(token.start as u32),
                            "Reference",
                            token.text,
                        ),
                        reference_count: 1,
                        refers_to_definition: true,
                    });
                }
            }
        }
        Ok(Some(UsageSearch {
            definition: definition.element(),
            usages,
        }))
    }
}

impl DocumentationProvider for ToyFixture {
    fn documentation_at(&mut self, path: &Path, offset: TextSize) -> anyhow::Result<Option<String>> {
        let Some((name, _, _)) = self.name_at(path, offset)? else {
            return Ok(None);
        };
        Ok(self
            .declarations()?
            .into_iter()
            .find(|d| d.name == name)
            .and_then(|d| d.doc)
            .map(|doc| format!("<p>{}</p>", doc)))
    }
}

impl HintProvider for ToyFixture {
    fn hints_at(&mut self, path: &Path, offset: TextSize) -> anyhow::Result<Vec<String>> {
        let offset = usize::from(offset);
        Ok(self
            .declarations()?
            .into_iter()
            .filter(|d| d.path == path && d.offset + d.name.len() == offset)
            .filter_map(|d| {
                if d.value.parse::<i64>().is_ok() {
                    Some(": int".to_string())
                } else if d.value.starts_with('"') {
                    Some(": str".to_string())
                } else {
                    None
                }
            })
            .collect())
    }
}

impl HighlightingProvider for ToyFixture {
    /// Every `?` must be wrapped in `<error>` tags, and every tag must wrap a `?`.
    fn check_highlighting(&mut self, path: &Path) -> anyhow::Result<Vec<String>> {
        const OPEN: &str = "<error>";
        const CLOSE: &str = "</error>";

        let raw = self.text(path)?;
        let mut clean = String::with_capacity(raw.len());
        let mut tagged = Vec::new();
        let mut rest = raw.as_str();
        while let Some(open) = rest.find(OPEN) {
            clean.push_str(&rest[..open]);
            let after_open = &rest[open + OPEN.len()..];
            let close = after_open
                .find(CLOSE)
                .ok_or_else(|| anyhow::anyhow!("unterminated {} tag", OPEN))?;
            let start = clean.len();
            clean.push_str(&after_open[..close]);
            tagged.push((start, clean.len()));
            rest = &after_open[close + CLOSE.len()..];
        }
        clean.push_str(rest);

        let errors: Vec<usize> = tokenize(&clean)
            .into_iter()
            .filter(|t| t.kind == TokenKind::Error)
            .map(|t| t.start)
            .collect();

        let mut mismatches = Vec::new();
        for error in &errors {
            if !tagged.iter().any(|(start, end)| start <= error && error < end) {
                mismatches.push(format!("error at offset {} is not marked", error));
            }
        }
        for (start, end) in &tagged {
            if !errors.iter().any(|error| start <= error && error < end) {
                mismatches.push(format!("no error highlighted for '{}'", &clean[*start..*end]));
            }
        }
        Ok(mismatches)
    }
}
