//! Progress persisted as a JSON file.

use std::{fs, io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};
use parking_jam_system_progression::{Progress, ProgressStore};

/// Stores progress in a single JSON document on disk.
#[derive(Debug)]
pub(crate) struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<Progress>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        let progress = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse progress in {}", self.path.display()))?;
        Ok(Some(progress))
    }

    fn save(&mut self, progress: &Progress) -> Result<()> {
        let json = serde_json::to_string_pretty(progress).context("failed to encode progress")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
