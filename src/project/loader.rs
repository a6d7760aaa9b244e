use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::decl::RawFile;
use crate::error::LoadError;
use crate::state::TypeSystemHost;

const BATCH_EXTENSION: &str = "json";

/// Read and decode one batch file.
///
/// A batch without a `path` is keyed by the file it was read from.
pub fn load_file(path: &Path) -> Result<RawFile, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut file: RawFile = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if file.path.is_empty() {
        file.path = path.display().to_string();
    }
    Ok(file)
}

/// All `*.json` batches under `dir`, decoded in parallel, in path order.
///
/// Every unreadable batch is reported, not only the first.
pub fn load_directory(dir: &Path) -> Result<Vec<RawFile>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }
    let paths = collect_batch_paths(dir)?;
    let results: Vec<_> = paths.par_iter().map(|path| load_file(path)).collect();

    let mut files = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(file) => files.push(file),
            Err(err) => errors.push(err),
        }
    }
    tracing::debug!(
        dir = %dir.display(),
        loaded = files.len(),
        failed = errors.len(),
        "loaded declaration batches"
    );
    if errors.is_empty() {
        Ok(files)
    } else {
        Err(LoadError::Many(errors))
    }
}

/// Load a directory into `host`. Returns the number of files that changed.
///
/// Nothing is applied when any batch fails to load.
pub fn load_directory_into_host(dir: &Path, host: &TypeSystemHost) -> Result<usize, LoadError> {
    let files = load_directory(dir)?;
    Ok(host.set_files(&files))
}

pub fn load_file_into_host(path: &Path, host: &TypeSystemHost) -> Result<bool, LoadError> {
    let file = load_file(path)?;
    Ok(host.set_file(&file))
}

fn collect_batch_paths(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            LoadError::Io {
                path,
                source: err.into(),
            }
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == BATCH_EXTENSION) {
            paths.push(path.to_path_buf());
        }
    }
    Ok(paths)
}
