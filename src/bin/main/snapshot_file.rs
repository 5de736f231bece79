use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glance_core::{Snapshot, SnapshotCodec};

/// Binary snapshot record kept in a single file.
pub(super) struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub(super) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when there is no file or its record does not decode.
    pub(super) fn load(&self) -> Result<Option<Snapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", self.path.display()));
            }
        };
        Ok(SnapshotCodec::decode(&bytes))
    }

    /// Writes through a sibling temp file so a crash never leaves half a
    /// record behind.
    pub(super) fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, SnapshotCodec::encode(snapshot))
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
