//! Synthesis providers.
//!
//! Each provider turns text plus a voice (or accent region) into an audio
//! file at a path chosen by the caller:
//! - the remote speech API, keyed by voice name
//! - the cloud TTS endpoint, keyed by region token
//! - the optional local engine, keyed by its native voice id

mod client;
mod cloud;
mod local;
mod types;

pub use client::RemoteSpeechClient;
pub use cloud::{CloudTtsClient, MAX_CHUNK_CHARS, split_text};
pub use local::{
    EspeakEngine, MP3_BITRATE, SPEECH_RATE_WPM, Transcoder, check_wav, find_binary,
    parse_voice_list,
};
pub use types::{BackendError, EngineVoice, Gender};

use std::path::Path;

use async_trait::async_trait;

/// A provider reached over the network.
///
/// This trait abstracts the HTTP communication with the providers,
/// allowing for mock implementations in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Short identifier used in logs.
    fn id(&self) -> &'static str;

    /// Synthesize `text` and write MP3 audio to `output`.
    ///
    /// # Arguments
    /// * `voice` - Provider-specific voice name or region token
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<(), BackendError>;
}

/// A synthesis engine installed on the host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalEngine: Send + Sync {
    /// List the voices the engine has installed.
    async fn list_voices(&self) -> Result<Vec<EngineVoice>, BackendError>;

    /// Synthesize `text` with the engine voice `voice` and write MP3 audio to `output`.
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<(), BackendError>;
}
