//! Backing storage of the project a test case runs against.
//!
//! Light cases keep their files in memory; heavy cases get a real temporary
//! directory so host tooling can read them from disk. All paths are relative
//! to the project root, which is the empty path.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => f.write_str("regular file"),
            EntryKind::Directory => f.write_str("directory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub name: String,
    pub kind: EntryKind,
}

pub trait FileStore: Send + Sync + fmt::Debug {
    /// Create `path` and any missing ancestors.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Replace the contents of the file at `path`, creating ancestors as needed.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Remove a file or a directory with everything below it.
    fn remove(&self, path: &Path) -> io::Result<()>;

    fn kind(&self, path: &Path) -> Option<EntryKind>;

    /// Children of the directory `dir`, sorted by name.
    fn entries(&self, dir: &Path) -> io::Result<Vec<StoreEntry>>;

    /// Location on disk, for stores that have one.
    fn disk_root(&self) -> Option<&Path> {
        None
    }
}

/// Create the store a case runs against.
pub fn new_store(heavy: bool) -> io::Result<Arc<dyn FileStore>> {
    if heavy {
        Ok(Arc::new(TempDirStore::new()?))
    } else {
        Ok(Arc::new(MemoryStore::new()))
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} does not exist", path.display()))
}

fn wrong_kind(path: &Path, expected: EntryKind) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} is not a {}", path.display(), expected),
    )
}

#[derive(Debug, Clone)]
enum Node {
    Directory,
    File(String),
}

/// Project files held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_dirs(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
        let mut current = PathBuf::new();
        for part in path.components() {
            current.push(part);
            match nodes.get(&current) {
                Some(Node::Directory) => {}
                Some(Node::File(_)) => return Err(wrong_kind(&current, EntryKind::Directory)),
                None => {
                    nodes.insert(current.clone(), Node::Directory);
                }
            }
        }
        Ok(())
    }
}

impl FileStore for MemoryStore {
    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        Self::ensure_dirs(&mut self.nodes.write(), &path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let path = normalize(path);
        if path.as_os_str().is_empty() {
            return Err(wrong_kind(&path, EntryKind::File));
        }
        let mut nodes = self.nodes.write();
        if let Some(parent) = path.parent() {
            Self::ensure_dirs(&mut nodes, parent)?;
        }
        if let Some(Node::Directory) = nodes.get(&path) {
            return Err(wrong_kind(&path, EntryKind::File));
        }
        nodes.insert(path, Node::File(contents.to_string()));
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let path = normalize(path);
        match self.nodes.read().get(&path) {
            Some(Node::File(contents)) => Ok(contents.clone()),
            Some(Node::Directory) => Err(wrong_kind(&path, EntryKind::File)),
            None if path.as_os_str().is_empty() => Err(wrong_kind(&path, EntryKind::File)),
            None => Err(not_found(&path)),
        }
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.write();
        if nodes.remove(&path).is_none() {
            return Err(not_found(&path));
        }
        nodes.retain(|key, _| !key.starts_with(&path));
        Ok(())
    }

    fn kind(&self, path: &Path) -> Option<EntryKind> {
        let path = normalize(path);
        if path.as_os_str().is_empty() {
            return Some(EntryKind::Directory);
        }
        self.nodes.read().get(&path).map(|node| match node {
            Node::Directory => EntryKind::Directory,
            Node::File(_) => EntryKind::File,
        })
    }

    fn entries(&self, dir: &Path) -> io::Result<Vec<StoreEntry>> {
        let dir = normalize(dir);
        match self.kind(&dir) {
            Some(EntryKind::Directory) => {}
            Some(EntryKind::File) => return Err(wrong_kind(&dir, EntryKind::Directory)),
            None => return Err(not_found(&dir)),
        }
        let nodes = self.nodes.read();
        let mut entries: Vec<StoreEntry> = nodes
            .iter()
            .filter(|(key, _)| key.parent() == Some(dir.as_path()))
            .filter_map(|(key, node)| {
                let name = key.file_name()?.to_string_lossy().into_owned();
                let kind = match node {
                    Node::Directory => EntryKind::Directory,
                    Node::File(_) => EntryKind::File,
                };
                Some(StoreEntry { name, kind })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Project files in a temporary directory, removed when the store is dropped.
#[derive(Debug)]
pub struct TempDirStore {
    dir: TempDir,
}

impl TempDirStore {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("dirtests_").tempdir()?;
        tracing::debug!("Created heavy project store at {:?}", dir.path());
        Ok(Self { dir })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.dir.path().join(normalize(path))
    }
}

impl FileStore for TempDirStore {
    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full, contents)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let full = self.resolve(path);
        if full.is_dir() {
            fs::remove_dir_all(full)
        } else {
            fs::remove_file(full)
        }
    }

    fn kind(&self, path: &Path) -> Option<EntryKind> {
        let metadata = fs::metadata(self.resolve(path)).ok()?;
        Some(if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        })
    }

    fn entries(&self, dir: &Path) -> io::Result<Vec<StoreEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.resolve(dir))? {
            let entry = entry?;
            let kind = if entry.file_type()?.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(StoreEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn disk_root(&self) -> Option<&Path> {
        Some(self.dir.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn FileStore) {
        store.write(Path::new("src/b.txt"), "b").unwrap();
        store.write(Path::new("a.txt"), "a").unwrap();
        store.create_dir(Path::new("empty")).unwrap();

        assert_eq!(store.read_to_string(Path::new("src/b.txt")).unwrap(), "b");
        assert_eq!(store.kind(Path::new("src")), Some(EntryKind::Directory));
        assert_eq!(store.kind(Path::new("a.txt")), Some(EntryKind::File));
        assert_eq!(store.kind(Path::new("")), Some(EntryKind::Directory));
        assert_eq!(store.kind(Path::new("missing")), None);

        let names: Vec<String> = store
            .entries(Path::new(""))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.txt", "empty", "src"]);

        store.remove(Path::new("src")).unwrap();
        assert_eq!(store.kind(Path::new("src/b.txt")), None);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        exercise(&store);
        assert!(store.disk_root().is_none());
    }

    #[test]
    fn test_temp_dir_store() {
        let store = TempDirStore::new().unwrap();
        exercise(&store);
        assert!(store.disk_root().unwrap().exists());
    }

    #[test]
    fn test_memory_store_rejects_file_over_directory() {
        let store = MemoryStore::new();
        store.create_dir(Path::new("sub")).unwrap();
        assert!(store.write(Path::new("sub"), "x").is_err());
        assert!(store.read_to_string(Path::new("sub")).is_err());
    }

    #[test]
    fn test_new_store_kind() {
        assert!(new_store(true).unwrap().disk_root().is_some());
        assert!(new_store(false).unwrap().disk_root().is_none());
    }
}
