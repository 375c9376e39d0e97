use std::io;
use std::path::{Path, PathBuf};

/// Local copy of a downloaded object.
///
/// Warm Lambda containers keep `/tmp` between invocations, so the file is removed when the
/// guard goes out of scope on every exit path.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Reserve `<staging_dir>/<filename>`, creating the directory when missing.
    pub fn reserve(staging_dir: &Path, filename: &str) -> io::Result<Self> {
        std::fs::create_dir_all(staging_dir)?;
        Ok(Self {
            path: staging_dir.join(filename),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed staged file");
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Failed to remove staged file"
                );
            }
        }
    }
}
