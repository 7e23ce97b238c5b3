//! Turn the test data directory into a tree of test nodes.

use crate::constants::{CONTEXT_FILE, DISABLED_PREFIX, ONLY_FILE, SENTINEL_SUFFIX, SETTINGS_FILE};
use crate::dispatch::ExecutorRegistry;
use crate::error::ConfigError;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const NO_EXECUTOR_REASON: &str = "No executor found for this directory";
pub const NOT_ALL_RUN_NAME: &str = "Not all tests were run";
pub const NOT_ALL_RUN_REASON: &str = "Some tests were disabled by only.txt";
pub const NOT_A_DIRECTORY_REASON: &str = "Expected a directory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestNode {
    Group { name: String, children: Vec<TestNode> },
    Case(TestCase),
    /// Always fails with `reason`.
    Placeholder { name: String, reason: String },
}

impl TestNode {
    pub fn name(&self) -> &str {
        match self {
            TestNode::Group { name, .. } | TestNode::Placeholder { name, .. } => name,
            TestNode::Case(case) => &case.name,
        }
    }
}

/// A leaf test directory bound to one executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    /// Display name, prefixed with `!` when disabled by the only filter.
    pub name: String,
    pub test_name: String,
    pub path: PathBuf,
    /// Path below the test data root, `/` separated.
    pub relative_path: String,
    pub executor: String,
    pub disabled: bool,
    pub heavy: bool,
}

/// Read the trimmed `only.txt` filter of `root`, `None` when absent or empty.
pub fn read_only_filter(root: &Path) -> Result<Option<String>, ConfigError> {
    let path = root.join(ONLY_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let only = fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
    let only = only.trim();
    Ok((!only.is_empty()).then(|| only.to_string()))
}

/// Build the test tree below `root`.
pub fn discover_tree(
    root: &Path,
    executors: &ExecutorRegistry,
    heavy_executors: &FxHashSet<String>,
    only: Option<&str>,
) -> Result<Vec<TestNode>, ConfigError> {
    let mut nodes = Vec::new();
    if only.is_some() {
        nodes.push(TestNode::Placeholder {
            name: NOT_ALL_RUN_NAME.to_string(),
            reason: NOT_ALL_RUN_REASON.to_string(),
        });
    }

    for entry in list_sorted(root)? {
        let name = file_name(&entry);
        if name.ends_with(SENTINEL_SUFFIX) || name == SETTINGS_FILE {
            continue;
        }
        if !executors.contains(&name) {
            tracing::debug!("No executor registered for {:?}", entry);
            nodes.push(TestNode::Placeholder {
                name,
                reason: NO_EXECUTOR_REASON.to_string(),
            });
            continue;
        }
        if !entry.is_dir() {
            nodes.push(TestNode::Placeholder {
                name,
                reason: NOT_A_DIRECTORY_REASON.to_string(),
            });
            continue;
        }

        let walker = Walker {
            root,
            executor: &name,
            heavy: heavy_executors.contains(&name),
            only,
        };
        let children = walker.process_dir(&entry)?;
        nodes.push(TestNode::Group { name, children });
    }
    Ok(nodes)
}

struct Walker<'a> {
    root: &'a Path,
    executor: &'a str,
    heavy: bool,
    only: Option<&'a str>,
}

impl Walker<'_> {
    fn process_dir(&self, dir: &Path) -> Result<Vec<TestNode>, ConfigError> {
        let entries = list_sorted(dir)?;

        if dir.join(CONTEXT_FILE).exists() {
            let mut groups = Vec::new();
            for entry in entries {
                let name = file_name(&entry);
                if name == CONTEXT_FILE {
                    continue;
                }
                if entry.is_dir() {
                    let children = self.process_dir(&entry)?;
                    groups.push(TestNode::Group { name, children });
                } else {
                    groups.push(TestNode::Placeholder {
                        name,
                        reason: NOT_A_DIRECTORY_REASON.to_string(),
                    });
                }
            }
            return Ok(groups);
        }

        Ok(entries
            .into_iter()
            .map(|entry| TestNode::Case(self.case(entry)))
            .collect())
    }

    fn case(&self, path: PathBuf) -> TestCase {
        let test_name = file_name(&path);
        let relative_path = path
            .strip_prefix(self.root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let disabled = self.only.is_some_and(|only| {
            !path.to_string_lossy().ends_with(only) && !relative_path.starts_with(only)
        });
        let name = if disabled {
            format!("{}{}", DISABLED_PREFIX, test_name)
        } else {
            test_name.clone()
        };
        TestCase {
            name,
            test_name,
            path,
            relative_path,
            executor: self.executor.to_string(),
            disabled,
            heavy: self.heavy,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn list_sorted(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ConfigError::io(dir, e))? {
        entries.push(entry.map_err(|e| ConfigError::io(dir, e))?.path());
    }
    entries.sort();
    Ok(entries)
}

/// Every case of `nodes`, depth-first, with the names of its enclosing groups.
pub fn flatten(nodes: &[TestNode]) -> Vec<(Vec<&str>, &TestNode)> {
    fn visit<'a>(nodes: &'a [TestNode], path: &mut Vec<&'a str>, out: &mut Vec<(Vec<&'a str>, &'a TestNode)>) {
        for node in nodes {
            match node {
                TestNode::Group { name, children } => {
                    path.push(name);
                    visit(children, path, out);
                    path.pop();
                }
                leaf => out.push((path.clone(), leaf)),
            }
        }
    }

    let mut out = Vec::new();
    visit(nodes, &mut Vec::new(), &mut out);
    out
}
