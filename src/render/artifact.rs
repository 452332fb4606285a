//! Staged writes for rendered artifacts.
//!
//! Output is written to a temporary file next to the target and moved into
//! place only on [`StagedArtifact::commit`]. Dropping an uncommitted artifact
//! deletes the temporary file, so a failed render never leaves a half-written
//! file behind or replaces an earlier one.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tracing::debug;

use crate::error::Result;

pub struct StagedArtifact {
    staged: NamedTempFile,
    target: PathBuf,
}

impl StagedArtifact {
    /// Creates the staging file in the target's directory, keeping the
    /// target's extension so format-sniffing encoders still work.
    pub fn new(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let suffix = target
            .extension()
            .and_then(OsStr::to_str)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        let staged = Builder::new()
            .prefix(".staged-")
            .suffix(&suffix)
            .tempfile_in(&dir)?;
        debug!(staged = %staged.path().display(), target = %target.display(), "Artifact staged");

        Ok(Self { staged, target })
    }

    pub fn path(&self) -> &Path {
        self.staged.path()
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.staged.write_all(bytes)?;
        self.staged.flush()?;
        Ok(())
    }

    /// Atomically moves the staged file onto the target path.
    pub fn commit(self) -> Result<PathBuf> {
        let target = self.target;
        self.staged.persist(&target).map_err(|e| e.error)?;
        debug!(target = %target.display(), "Artifact committed");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn entries(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_commit_moves_content_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.html");

        let mut artifact = StagedArtifact::new(&target).unwrap();
        assert!(artifact.path().to_string_lossy().ends_with(".html"));
        artifact.write_all(b"<html></html>").unwrap();
        assert!(!target.exists());

        artifact.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "<html></html>");
        assert_eq!(entries(dir.path()), 1);
    }

    #[test]
    fn test_drop_without_commit_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.png");

        {
            let mut artifact = StagedArtifact::new(&target).unwrap();
            artifact.write_all(b"partial").unwrap();
        }

        assert!(!target.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_failed_render_keeps_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("route_map.html");
        fs::write(&target, "previous").unwrap();

        {
            let mut artifact = StagedArtifact::new(&target).unwrap();
            artifact.write_all(b"half").unwrap();
        }

        assert_eq!(fs::read_to_string(&target).unwrap(), "previous");
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("no/such/dir/out.png");

        let err = StagedArtifact::new(&target).err().unwrap();
        assert_eq!(err.kind(), "io");
    }
}
