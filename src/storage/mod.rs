//! Storage of generated audio files.
//!
//! Files are named `tts_<8hex>.mp3` and live in one directory supplied at
//! construction. Client-supplied names are validated before any filesystem
//! access.

mod store;

pub use store::{AUDIO_EXTENSION, AudioStore, StorageError, StoredAudioFile};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn is_generated_name(name: &str) -> bool {
        let Some(hex) = name
            .strip_prefix("tts_")
            .and_then(|rest| rest.strip_suffix(".mp3"))
        else {
            return false;
        };
        hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit())
    }

    // ===========================================
    // Name validation
    // ===========================================

    #[test]
    fn test_validate_accepts_generated_names() {
        assert!(AudioStore::validate_name("tts_0a1b2c3d.mp3").is_ok());
        assert!(AudioStore::validate_name("my-file_1.mp3").is_ok());
    }

    #[test]
    fn test_validate_rejects_path_traversal() {
        for name in ["../../etc/passwd", "../tts_0a1b2c3d.mp3", "a/b.mp3", "a\\b.mp3"] {
            assert!(
                matches!(
                    AudioStore::validate_name(name),
                    Err(StorageError::InvalidName(_))
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_disallowed_characters() {
        for name in ["tts 1.mp3", "tts%2e.mp3", "tts;rm.mp3", "tts\0.mp3", "tëst.mp3", ""] {
            assert!(AudioStore::validate_name(name).is_err(), "{name:?}");
        }
    }

    #[test]
    fn test_validate_requires_mp3_extension() {
        assert!(AudioStore::validate_name("tts_0a1b2c3d.wav").is_err());
        assert!(AudioStore::validate_name("tts_0a1b2c3d").is_err());
        assert!(AudioStore::validate_name(".mp3").is_err());
    }

    #[tokio::test]
    async fn test_resolve_invalid_name_never_touches_disk() {
        // The root does not exist; an IO error here would mean we looked.
        let store = AudioStore::new(PathBuf::from("/nonexistent/voice-relay-root"));
        assert!(matches!(
            store.resolve("../../etc/passwd").await,
            Err(StorageError::InvalidName(_))
        ));
    }

    // ===========================================
    // Allocation and lookup
    // ===========================================

    #[tokio::test]
    async fn test_allocate_creates_uniquely_named_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = AudioStore::new(temp_dir.path().to_path_buf());

        let file = store.allocate().await.unwrap();

        assert!(is_generated_name(&file.filename), "{}", file.filename);
        assert_eq!(file.path, temp_dir.path().join(&file.filename));
        assert!(file.path.exists());
    }

    #[tokio::test]
    async fn test_allocate_never_repeats() {
        let temp_dir = TempDir::new().unwrap();
        let store = AudioStore::new(temp_dir.path().to_path_buf());

        let mut names = HashSet::new();
        for _ in 0..200 {
            names.insert(store.allocate().await.unwrap().filename);
        }

        assert_eq!(names.len(), 200);
    }

    #[tokio::test]
    async fn test_resolve_existing_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = AudioStore::new(temp_dir.path().to_path_buf());
        let file = store.allocate().await.unwrap();

        assert_eq!(store.resolve(&file.filename).await.unwrap(), file.path);
        assert!(matches!(
            store.resolve("nonexistent_12345.mp3").await,
            Err(StorageError::NotFound(_))
        ));

        std::fs::create_dir(temp_dir.path().join("folder.mp3")).unwrap();
        assert!(matches!(
            store.resolve("folder.mp3").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_discard_removes_file_and_tolerates_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = AudioStore::new(temp_dir.path().to_path_buf());
        let file = store.allocate().await.unwrap();

        store.discard(&file).await;
        assert!(!file.path.exists());
        store.discard(&file).await;
    }

    #[test]
    fn test_open_creates_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("audio");

        let store = AudioStore::open(root.clone()).unwrap();

        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn test_download_name_is_fresh() {
        let a = AudioStore::download_name();
        let b = AudioStore::download_name();

        assert!(a.starts_with("tts_output_") && a.ends_with(".mp3"));
        assert_eq!(a.len(), "tts_output_".len() + 8 + 4);
        assert_ne!(a, b);
        assert!(AudioStore::validate_name(&a).is_ok());
    }
}
