use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("download directory {dir:?} unusable: {reason}")]
    DownloadDir { dir: PathBuf, reason: String },
    /// Names come from `download_filename`; anything that could leave the
    /// download directory is refused.
    #[error("refusing to save download as {0:?}")]
    InvalidName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates the download directory on first use.
pub fn ensure_download_dir(dir: &Path) -> Result<(), SaveError> {
    let unusable = |reason: String| SaveError::DownloadDir {
        dir: dir.to_path_buf(),
        reason,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(unusable("not a directory".to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| unusable(e.to_string()))
        }
        Err(err) => Err(unusable(err.to_string())),
    }
}

/// Saves downloaded files into one directory. Bytes go to a temp file next
/// to the target and are renamed into place, so an interrupted save leaves
/// no partial download behind.
pub struct DownloadSink {
    dir: PathBuf,
}

impl DownloadSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, filename: &str, content: &[u8]) -> Result<PathBuf, SaveError> {
        if !is_plain_name(filename) {
            return Err(SaveError::InvalidName(filename.to_string()));
        }
        ensure_download_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| SaveError::Io(e.error))?;
        Ok(target)
    }
}

fn is_plain_name(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\', '\0'])
}
