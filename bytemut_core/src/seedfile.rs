use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to read seed file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only provider of seed bytes.
///
/// `load` hands out the content for the duration of one run; whatever it
/// acquired is released when the returned value is dropped.
pub trait SeedSource: Send + Sync {
    /// A short name used for output naming and log lines.
    fn name(&self) -> &str;

    fn load(&self) -> Result<Cow<'_, [u8]>, SeedError>;
}

impl SeedSource for Vec<u8> {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> Result<Cow<'_, [u8]>, SeedError> {
        Ok(Cow::Borrowed(self.as_slice()))
    }
}

/// A seed held on disk, read fresh on every `load`.
#[derive(Debug, Clone)]
pub struct SeedFile {
    path: PathBuf,
    name: String,
}

impl SeedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "seed".to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeedSource for SeedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Cow<'_, [u8]>, SeedError> {
        let content = fs::read(&self.path).map_err(|source| SeedError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(Cow::Owned(content))
    }
}
