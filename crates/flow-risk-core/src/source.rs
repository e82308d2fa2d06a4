use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// A flow definition read from disk, kept verbatim for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Base name of the file, used to title the report.
    pub name: String,
    pub content: String,
}

/// Reasons the input file could not be accepted.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("file must have a .xml extension: {}", path.display())]
    InvalidType { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolve `path`, check that it is an existing `.xml` file and read it.
///
/// The content is not checked for well-formedness here.
pub fn load_source(path: impl AsRef<Path>) -> Result<SourceFile, LoadError> {
    let path = path.as_ref();
    let resolved = resolve(path);
    if !resolved.exists() {
        return Err(LoadError::NotFound { path: resolved });
    }
    if resolved.extension().and_then(|ext| ext.to_str()) != Some("xml") {
        return Err(LoadError::InvalidType { path: resolved });
    }
    let content = fs::read_to_string(&resolved).map_err(|source| LoadError::Io {
        path: resolved.clone(),
        source,
    })?;
    let name = resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::debug!(file = %name, bytes = content.len(), "loaded flow source");
    Ok(SourceFile { name, content })
}

fn resolve(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
