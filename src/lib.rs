//! voice-relay: a small text-to-speech web backend.
//!
//! Requests name a voice; the voice decides which provider synthesizes the
//! text (a remote speech API, a cloud TTS endpoint, or a local engine).
//! Failed providers are retried once through the default cloud voice, and
//! the resulting MP3 is stored for later playback or download.

pub mod backend;
pub mod cli;
pub mod engine;
pub mod server;
pub mod storage;
pub mod voice;
