//! Audio file storage under a single root directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::OpenOptions;
use tracing::warn;

/// Extension every stored file carries.
pub const AUDIO_EXTENSION: &str = ".mp3";

/// Attempts at finding an unused name before giving up.
const MAX_ALLOCATE_ATTEMPTS: usize = 16;

/// Errors that can occur when storing or reading audio files.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid filename: {0}")]
    InvalidName(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A generated audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAudioFile {
    pub filename: String,
    pub path: PathBuf,
}

/// Eight lowercase hex characters from a fresh v4 UUID.
fn short_hex() -> String {
    let mut hex = uuid::Uuid::new_v4().simple().to_string();
    hex.truncate(8);
    hex
}

/// Stores generated audio in one directory.
///
/// Files are never evicted by the store.
#[derive(Debug, Clone)]
pub struct AudioStore {
    root: PathBuf,
}

impl AudioStore {
    /// Create a store rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn open(root: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check a client-supplied filename.
    ///
    /// Only ASCII alphanumerics and `._-` are allowed, and the name must end
    /// in `.mp3`. Nothing touches the filesystem here.
    pub fn validate_name(name: &str) -> Result<(), StorageError> {
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');

        if name.is_empty() || !name.chars().all(allowed) {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        if !name.ends_with(AUDIO_EXTENSION) || name.len() == AUDIO_EXTENSION.len() {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        Ok(())
    }

    /// Reserve a fresh `tts_<8hex>.mp3` file.
    ///
    /// The file is created empty; the name is unique among existing files.
    pub async fn allocate(&self) -> Result<StoredAudioFile, StorageError> {
        for _ in 0..MAX_ALLOCATE_ATTEMPTS {
            let filename = format!("tts_{}{AUDIO_EXTENSION}", short_hex());
            let path = self.root.join(&filename);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(_) => return Ok(StoredAudioFile { filename, path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::IoError(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "could not find an unused audio filename",
        )))
    }

    /// Remove a file that will not be handed out. Failures are only logged.
    pub async fn discard(&self, file: &StoredAudioFile) {
        if let Err(e) = tokio::fs::remove_file(&file.path).await
            && e.kind() != ErrorKind::NotFound
        {
            warn!(file = %file.filename, error = %e, "failed to discard audio file");
        }
    }

    /// Resolve a client-supplied filename to an existing file.
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        Self::validate_name(name)?;

        let path = self.root.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(path),
            _ => Err(StorageError::NotFound(name.to_string())),
        }
    }

    /// A fresh client-facing name for a download.
    pub fn download_name() -> String {
        format!("tts_output_{}{AUDIO_EXTENSION}", short_hex())
    }
}
