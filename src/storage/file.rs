use anyhow::{Context, Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use super::Storage;
use crate::runtime::Runtime;

/// Stores each key as a file named after the key inside `dir`.
pub struct FileStorage<R: Runtime> {
    runtime: R,
    dir: PathBuf,
}

impl<R: Runtime> FileStorage<R> {
    pub fn new(runtime: R, dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            bail!("Invalid storage key: '{}'", key);
        }
        Ok(self.dir.join(key))
    }
}

impl<R: Runtime> Storage for FileStorage<R> {
    #[tracing::instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        if !self.runtime.exists(&path) {
            debug!("No stored value for '{}' at {:?}", key, path);
            return Ok(None);
        }
        let value = self
            .runtime
            .read_to_string(&path)
            .with_context(|| format!("Failed to read stored value '{}'", key))?;
        Ok(Some(value.trim_end_matches(['\r', '\n']).to_string()))
    }

    #[tracing::instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        self.runtime
            .create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create storage directory {:?}", self.dir))?;
        self.runtime
            .write(&path, value.as_bytes())
            .with_context(|| format!("Failed to persist value '{}'", key))
    }

    #[tracing::instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        if self.runtime.exists(&path) {
            self.runtime
                .remove_file(&path)
                .with_context(|| format!("Failed to remove stored value '{}'", key))?;
        }
        Ok(())
    }
}
