//! Materialize a fixture directory into a project store.

use crate::error::ConfigError;
use crate::markup::MarkupFile;
use crate::project::store::FileStore;
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// Load every file below `fixture_dir` as markup, writing the clean text to `store`.
///
/// Entries are visited depth-first in lexicographic order, so the returned
/// files and every derived test identifier are reproducible. The fixture root
/// maps onto the store root, which already exists.
pub fn load_project(fixture_dir: &Path, store: &dyn FileStore) -> Result<Vec<MarkupFile>, ConfigError> {
    let mut files = Vec::new();
    walk(fixture_dir, store, |relative, text| {
        let file = MarkupFile::backed(relative, text);
        store
            .write(relative, file.clean_text())
            .map_err(|e| ConfigError::io(relative, e))?;
        files.push(file);
        Ok(())
    })?;
    tracing::debug!("Loaded {} markup files from {:?}", files.len(), fixture_dir);
    Ok(files)
}

/// Copy every file below `fixture_dir` verbatim, returning the relative paths.
///
/// Used for fixtures whose markup belongs to the host, e.g. highlighting tags.
pub fn load_raw_project(fixture_dir: &Path, store: &dyn FileStore) -> Result<Vec<PathBuf>, ConfigError> {
    let mut paths = Vec::new();
    walk(fixture_dir, store, |relative, text| {
        store
            .write(relative, &text)
            .map_err(|e| ConfigError::io(relative, e))?;
        paths.push(relative.to_path_buf());
        Ok(())
    })?;
    Ok(paths)
}

fn walk(
    fixture_dir: &Path,
    store: &dyn FileStore,
    mut on_file: impl FnMut(&Path, String) -> Result<(), ConfigError>,
) -> Result<(), ConfigError> {
    if !fixture_dir.is_dir() {
        return Err(ConfigError::MissingFixture {
            path: fixture_dir.to_path_buf(),
        });
    }

    let walker = WalkBuilder::new(fixture_dir)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = entry.map_err(|e| ConfigError::invalid(format!("Failed to walk {:?}: {}", fixture_dir, e)))?;
        let path = entry.path();
        let relative = path
            .strip_prefix(fixture_dir)
            .map_err(|_| ConfigError::invalid(format!("{:?} escaped {:?}", path, fixture_dir)))?;

        if entry.file_type().is_some_and(|t| t.is_dir()) {
            if !relative.as_os_str().is_empty() {
                store
                    .create_dir(relative)
                    .map_err(|e| ConfigError::io(relative, e))?;
            }
            continue;
        }

        let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        on_file(relative, text)?;
    }

    Ok(())
}
