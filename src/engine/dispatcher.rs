//! Routes synthesis requests to providers and applies the fallback policy.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::backend::{BackendError, LocalEngine, SpeechProvider};
use crate::storage::{AudioStore, StorageError, StoredAudioFile};
use crate::voice::{CloudAccent, Route, VoiceCatalog, VoiceListing};

/// Voice used when a request names none.
pub const DEFAULT_VOICE: &str = "gtts-us";

/// Note attached to results produced by the fallback voice.
pub const FALLBACK_NOTE: &str = "Used fallback voice";

/// Default upper bound on request text length, in characters.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 5000;

/// Errors that can occur during synthesis.
#[derive(Error, Debug)]
pub enum TTSError {
    #[error("{0}")]
    Validation(String),

    #[error("All synthesis methods failed: {0}")]
    Synthesis(String),

    #[error("Provider error: {0}")]
    BackendError(#[from] BackendError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

/// Outcome of a successful synthesis.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SynthesisResult {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Picks a provider per voice and owns the fallback policy.
pub struct Dispatcher {
    catalog: VoiceCatalog,
    store: AudioStore,
    remote: Arc<dyn SpeechProvider>,
    cloud: Arc<dyn SpeechProvider>,
    local: Option<Arc<dyn LocalEngine>>,
    max_text_chars: usize,
}

impl Dispatcher {
    /// Create a dispatcher. Local voices are routable only when `local` is set.
    pub fn new(
        store: AudioStore,
        remote: Arc<dyn SpeechProvider>,
        cloud: Arc<dyn SpeechProvider>,
        local: Option<Arc<dyn LocalEngine>>,
    ) -> Self {
        Self {
            catalog: VoiceCatalog::new(local.is_some()),
            store,
            remote,
            cloud,
            local,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }

    /// Set the longest accepted text, in characters.
    pub fn with_max_text_chars(mut self, max_text_chars: usize) -> Self {
        self.max_text_chars = max_text_chars;
        self
    }

    pub fn store(&self) -> &AudioStore {
        &self.store
    }

    pub fn has_local_engine(&self) -> bool {
        self.local.is_some()
    }

    /// List selectable voices, probing the local engine if there is one.
    ///
    /// Never fails: a failed voice listing only drops the local group.
    pub async fn list_voices(&self) -> VoiceListing {
        let local = match &self.local {
            Some(engine) => match engine.list_voices().await {
                Ok(voices) => Some(voices),
                Err(e) => {
                    warn!(error = %e, "local engine voice listing failed");
                    None
                }
            },
            None => None,
        };

        self.catalog.listing(local.as_deref())
    }

    /// Synthesize `text` with `voice` into a new stored file.
    ///
    /// A failed provider is retried once through the default cloud accent.
    pub async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesisResult, TTSError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TTSError::Validation("No text provided".to_string()));
        }
        if text.chars().count() > self.max_text_chars {
            return Err(TTSError::Validation(format!(
                "Text exceeds {} characters",
                self.max_text_chars
            )));
        }

        let route = self.catalog.resolve(voice);
        info!(voice, route = ?route, "generating speech");

        let primary = match self.attempt(text, &route).await {
            Ok(file) => {
                info!(file = %file.filename, "audio saved");
                return Ok(SynthesisResult {
                    filename: file.filename,
                    note: None,
                });
            }
            Err(e) => e,
        };

        warn!(voice, error = %primary, "synthesis failed, falling back to default voice");

        match self.attempt(text, &Route::Cloud(CloudAccent::default())).await {
            Ok(file) => {
                info!(file = %file.filename, "fallback audio saved");
                Ok(SynthesisResult {
                    filename: file.filename,
                    note: Some(FALLBACK_NOTE.to_string()),
                })
            }
            Err(fallback) => {
                error!(
                    error = %primary,
                    fallback_error = %fallback,
                    "all synthesis methods failed"
                );
                Err(TTSError::Synthesis(primary.to_string()))
            }
        }
    }

    /// One try on one route. On failure nothing is left on disk.
    async fn attempt(&self, text: &str, route: &Route) -> Result<StoredAudioFile, TTSError> {
        let file = self.store.allocate().await?;

        let result = match self.render(text, route, &file.path).await {
            Ok(()) => ensure_audio(&file.path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            self.store.discard(&file).await;
            return Err(e.into());
        }

        Ok(file)
    }

    async fn render(&self, text: &str, route: &Route, output: &Path) -> Result<(), BackendError> {
        match route {
            Route::Remote(name) => {
                debug!(provider = self.remote.id(), voice = %name, "dispatching");
                self.remote.synthesize(text, name, output).await
            }
            Route::Local(engine_id) => match &self.local {
                Some(engine) => engine.synthesize(text, engine_id, output).await,
                None => Err(BackendError::EngineFailed(
                    "no local engine available".to_string(),
                )),
            },
            Route::Cloud(accent) => {
                debug!(provider = self.cloud.id(), region = accent.region(), "dispatching");
                self.cloud.synthesize(text, accent.region(), output).await
            }
        }
    }
}

async fn ensure_audio(path: &Path) -> Result<(), BackendError> {
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() == 0 {
        return Err(BackendError::EmptyAudio);
    }
    Ok(())
}
