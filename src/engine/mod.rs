//! Synthesis dispatcher.
//!
//! This module ties the voice catalog, the providers and the audio store
//! together: it validates requests, routes them, and retries once through
//! the default voice when a provider fails.

mod dispatcher;

pub use dispatcher::{
    DEFAULT_MAX_TEXT_CHARS, DEFAULT_VOICE, Dispatcher, FALLBACK_NOTE, SynthesisResult, TTSError,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, EngineVoice, Gender, MockLocalEngine, MockSpeechProvider};
    use crate::storage::AudioStore;
    use crate::voice::LOCAL_GROUP;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn provider(id: &'static str) -> MockSpeechProvider {
        let mut mock = MockSpeechProvider::new();
        mock.expect_id().return_const(id);
        mock
    }

    fn writes(
        bytes: &'static [u8],
    ) -> impl Fn(&str, &str, &std::path::Path) -> Result<(), BackendError> {
        move |_, _, path| {
            std::fs::write(path, bytes)?;
            Ok(())
        }
    }

    fn dispatcher(
        temp_dir: &TempDir,
        remote: MockSpeechProvider,
        cloud: MockSpeechProvider,
        local: Option<MockLocalEngine>,
    ) -> Dispatcher {
        let store = AudioStore::new(temp_dir.path().to_path_buf());
        Dispatcher::new(
            store,
            Arc::new(remote),
            Arc::new(cloud),
            local.map(|l| Arc::new(l) as Arc<dyn crate::backend::LocalEngine>),
        )
    }

    fn stored_files(temp_dir: &TempDir) -> Vec<String> {
        std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    // ===========================================
    // Routing
    // ===========================================

    #[tokio::test]
    async fn test_remote_voice_writes_provider_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let mut remote = provider("remote");
        remote
            .expect_synthesize()
            .withf(|text, voice, _| text == "Hello world" && voice == "Matthew")
            .times(1)
            .returning(writes(b"ID3 matthew"));
        let engine = dispatcher(&temp_dir, remote, provider("cloud"), None);

        let result = engine.synthesize("Hello world", "Matthew").await.unwrap();

        assert!(result.filename.starts_with("tts_") && result.filename.ends_with(".mp3"));
        assert_eq!(result.note, None);
        let stored = std::fs::read(temp_dir.path().join(&result.filename)).unwrap();
        assert_eq!(stored, b"ID3 matthew");
        assert_eq!(stored_files(&temp_dir), vec![result.filename]);
    }

    #[tokio::test]
    async fn test_cloud_accent_uses_region_token() {
        let temp_dir = TempDir::new().unwrap();
        let mut cloud = provider("cloud");
        cloud
            .expect_synthesize()
            .withf(|_, voice, _| voice == "co.uk")
            .times(1)
            .returning(writes(b"ID3 uk"));
        let engine = dispatcher(&temp_dir, provider("remote"), cloud, None);

        let result = engine.synthesize("Hello world", "gtts-uk").await.unwrap();

        assert_eq!(result.note, None);
    }

    #[tokio::test]
    async fn test_unknown_voice_routes_to_default_region() {
        let temp_dir = TempDir::new().unwrap();
        let mut cloud = provider("cloud");
        cloud
            .expect_synthesize()
            .withf(|_, voice, _| voice == "com")
            .times(1)
            .returning(writes(b"ID3 us"));
        let engine = dispatcher(&temp_dir, provider("remote"), cloud, None);

        let result = engine.synthesize("Hello", "no-such-voice").await.unwrap();

        assert_eq!(result.note, None);
        assert!(temp_dir.path().join(&result.filename).exists());
    }

    #[tokio::test]
    async fn test_local_voice_routes_to_engine() {
        let temp_dir = TempDir::new().unwrap();
        let mut local = MockLocalEngine::new();
        local
            .expect_synthesize()
            .withf(|_, voice, _| voice == "en-us")
            .times(1)
            .returning(writes(b"ID3 local"));
        let engine = dispatcher(&temp_dir, provider("remote"), provider("cloud"), Some(local));

        let result = engine.synthesize("Hello", "system-en-us").await.unwrap();

        assert_eq!(result.note, None);
    }

    #[tokio::test]
    async fn test_text_is_trimmed_before_synthesis() {
        let temp_dir = TempDir::new().unwrap();
        let mut cloud = provider("cloud");
        cloud
            .expect_synthesize()
            .withf(|text, _, _| text == "padded")
            .times(1)
            .returning(writes(b"ID3"));
        let engine = dispatcher(&temp_dir, provider("remote"), cloud, None);

        assert!(engine.synthesize("  padded \n", DEFAULT_VOICE).await.is_ok());
    }

    // ===========================================
    // Validation
    // ===========================================

    #[tokio::test]
    async fn test_empty_text_is_rejected_for_any_voice() {
        let temp_dir = TempDir::new().unwrap();
        let engine = dispatcher(&temp_dir, provider("remote"), provider("cloud"), None);

        for (text, voice) in [("", "Matthew"), ("   ", "gtts-uk"), ("\n\t", "whatever")] {
            let result = engine.synthesize(text, voice).await;
            assert!(matches!(result, Err(TTSError::Validation(_))));
        }
        assert!(stored_files(&temp_dir).is_empty());
    }

    #[tokio::test]
    async fn test_overlong_text_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let engine = dispatcher(&temp_dir, provider("remote"), provider("cloud"), None)
            .with_max_text_chars(10);

        let result = engine.synthesize("eleven chars", "Matthew").await;

        assert!(matches!(result, Err(TTSError::Validation(_))));
    }

    // ===========================================
    // Fallback
    // ===========================================

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_default_cloud_voice() {
        let temp_dir = TempDir::new().unwrap();
        let mut remote = provider("remote");
        remote.expect_synthesize().times(1).returning(|_, _, path| {
            std::fs::write(path, b"partial")?;
            Err(BackendError::RequestFailed(
                "Remote speech API failed: 500 Internal Server Error".to_string(),
            ))
        });
        let mut cloud = provider("cloud");
        cloud
            .expect_synthesize()
            .withf(|text, voice, _| text == "Hello world" && voice == "com")
            .times(1)
            .returning(writes(b"ID3 fallback"));
        let engine = dispatcher(&temp_dir, remote, cloud, None);

        let result = engine.synthesize("Hello world", "Matthew").await.unwrap();

        assert_eq!(result.note.as_deref(), Some(FALLBACK_NOTE));
        // The failed attempt's file is gone; only the fallback remains.
        assert_eq!(stored_files(&temp_dir), vec![result.filename.clone()]);
        assert_eq!(
            std::fs::read(temp_dir.path().join(&result.filename)).unwrap(),
            b"ID3 fallback"
        );
    }

    #[tokio::test]
    async fn test_empty_provider_output_triggers_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let mut remote = provider("remote");
        remote.expect_synthesize().times(1).returning(|_, _, _| Ok(()));
        let mut cloud = provider("cloud");
        cloud
            .expect_synthesize()
            .times(1)
            .returning(writes(b"ID3 fallback"));
        let engine = dispatcher(&temp_dir, remote, cloud, None);

        let result = engine.synthesize("Hello", "Brian").await.unwrap();

        assert_eq!(result.note.as_deref(), Some(FALLBACK_NOTE));
        assert_eq!(stored_files(&temp_dir).len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_failure_reports_primary_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut remote = provider("remote");
        remote.expect_synthesize().times(1).returning(|_, _, _| {
            Err(BackendError::RequestFailed("remote said 503".to_string()))
        });
        let mut cloud = provider("cloud");
        cloud.expect_synthesize().times(1).returning(|_, _, _| {
            Err(BackendError::ConnectionFailed("cloud unreachable".to_string()))
        });
        let engine = dispatcher(&temp_dir, remote, cloud, None);

        let err = engine.synthesize("Hello", "Emma").await.unwrap_err();

        assert!(matches!(err, TTSError::Synthesis(_)));
        let message = err.to_string();
        assert!(message.starts_with("All synthesis methods failed"));
        assert!(message.contains("remote said 503"));
        assert!(!message.contains("cloud unreachable"));
        assert!(stored_files(&temp_dir).is_empty());
    }

    #[tokio::test]
    async fn test_failing_default_voice_is_retried_exactly_once() {
        let temp_dir = TempDir::new().unwrap();
        let mut cloud = provider("cloud");
        cloud
            .expect_synthesize()
            .times(2)
            .returning(|_, _, _| Err(BackendError::Timeout("slow".to_string())));
        let engine = dispatcher(&temp_dir, provider("remote"), cloud, None);

        let result = engine.synthesize("Hello", DEFAULT_VOICE).await;

        assert!(matches!(result, Err(TTSError::Synthesis(_))));
    }

    #[tokio::test]
    async fn test_local_engine_failure_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let mut local = MockLocalEngine::new();
        local.expect_synthesize().times(1).returning(|_, _, _| {
            Err(BackendError::TranscodeFailed("no MP3 transcoder available".to_string()))
        });
        let mut cloud = provider("cloud");
        cloud.expect_synthesize().times(1).returning(writes(b"ID3"));
        let engine = dispatcher(&temp_dir, provider("remote"), cloud, Some(local));

        let result = engine.synthesize("Hello", "system-en-us").await.unwrap();

        assert_eq!(result.note.as_deref(), Some(FALLBACK_NOTE));
    }

    // ===========================================
    // Concurrency
    // ===========================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_requests_get_distinct_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut remote = provider("remote");
        remote
            .expect_synthesize()
            .times(2)
            .returning(writes(b"ID3 same"));
        let engine = dispatcher(&temp_dir, remote, provider("cloud"), None);

        let (a, b) = tokio::join!(
            engine.synthesize("Same text", "Joey"),
            engine.synthesize("Same text", "Joey")
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.filename, b.filename);
        let mut files = stored_files(&temp_dir);
        files.sort();
        let mut expected = vec![a.filename, b.filename];
        expected.sort();
        assert_eq!(files, expected);
    }

    // ===========================================
    // Voice listing
    // ===========================================

    #[tokio::test]
    async fn test_list_voices_includes_local_group() {
        let temp_dir = TempDir::new().unwrap();
        let mut local = MockLocalEngine::new();
        local.expect_list_voices().times(1).returning(|| {
            Ok(vec![EngineVoice {
                id: "en-us".to_string(),
                name: "English (America)".to_string(),
                gender: Gender::Female,
            }])
        });
        let engine = dispatcher(&temp_dir, provider("remote"), provider("cloud"), Some(local));

        let listing = engine.list_voices().await;

        let group = listing.group(LOCAL_GROUP).unwrap();
        assert_eq!(group.voices[0].name, "system-en-us");
    }

    #[tokio::test]
    async fn test_list_voices_swallows_engine_failure() {
        let temp_dir = TempDir::new().unwrap();
        let mut local = MockLocalEngine::new();
        local
            .expect_list_voices()
            .times(1)
            .returning(|| Err(BackendError::EngineFailed("boom".to_string())));
        let engine = dispatcher(&temp_dir, provider("remote"), provider("cloud"), Some(local));

        let listing = engine.list_voices().await;

        assert!(listing.group(LOCAL_GROUP).is_none());
        assert_eq!(listing.groups.len(), 7);
    }

    #[tokio::test]
    async fn test_list_voices_without_engine() {
        let temp_dir = TempDir::new().unwrap();
        let engine = dispatcher(&temp_dir, provider("remote"), provider("cloud"), None);

        assert!(!engine.has_local_engine());
        assert!(engine.list_voices().await.group(LOCAL_GROUP).is_none());
    }
}
