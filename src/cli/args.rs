//! CLI argument definitions and parsing.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::engine::DEFAULT_MAX_TEXT_CHARS;

pub const DEFAULT_REMOTE_URL: &str = "https://api.streamelements.com/kappa/v2/speech";
pub const DEFAULT_CLOUD_URL: &str = "https://translate.google.{tld}/translate_tts";

/// Text-to-speech web backend.
#[derive(Parser, Debug)]
#[command(name = "voice-relay")]
#[command(about = "Text-to-speech web backend routing voices to remote, cloud and local providers")]
#[command(version)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "VOICE_RELAY_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "VOICE_RELAY_PORT", default_value_t = 5050)]
    pub port: u16,

    /// Directory generated audio is written to (defaults to the OS temp dir)
    #[arg(long, env = "VOICE_RELAY_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Remote speech API endpoint
    #[arg(long, env = "VOICE_RELAY_REMOTE_URL", default_value = DEFAULT_REMOTE_URL)]
    pub remote_url: String,

    /// Cloud TTS endpoint; `{tld}` is replaced by the accent's region token
    #[arg(long, env = "VOICE_RELAY_CLOUD_URL", default_value = DEFAULT_CLOUD_URL)]
    pub cloud_url: String,

    /// Language requested from the cloud provider
    #[arg(long, env = "VOICE_RELAY_CLOUD_LANG", default_value = "en")]
    pub cloud_lang: String,

    /// Timeout for outbound provider requests, in seconds
    #[arg(long, env = "VOICE_RELAY_REQUEST_TIMEOUT", default_value_t = 15)]
    pub request_timeout_secs: u64,

    /// Timeout for local engine and transcoder runs, in seconds
    #[arg(long, env = "VOICE_RELAY_ENGINE_TIMEOUT", default_value_t = 30)]
    pub engine_timeout_secs: u64,

    /// Local synthesis engine binary
    #[arg(long, env = "VOICE_RELAY_ESPEAK_BIN", default_value = "espeak-ng")]
    pub espeak_bin: String,

    /// MP3 transcoder binary
    #[arg(long, env = "VOICE_RELAY_FFMPEG_BIN", default_value = "ffmpeg")]
    pub ffmpeg_bin: String,

    /// Do not use a local synthesis engine even if one is installed
    #[arg(long)]
    pub no_local_engine: bool,

    /// Longest accepted text, in characters
    #[arg(long, env = "VOICE_RELAY_MAX_TEXT_CHARS", default_value_t = DEFAULT_MAX_TEXT_CHARS)]
    pub max_text_chars: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub storage_dir: PathBuf,
    pub remote_url: String,
    pub cloud_url: String,
    pub cloud_lang: String,
    pub request_timeout: Duration,
    pub engine_timeout: Duration,
    /// `None` disables the local engine.
    pub espeak_bin: Option<String>,
    pub ffmpeg_bin: String,
    pub max_text_chars: usize,
}

impl Args {
    /// Turn the parsed arguments into server settings.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            addr: SocketAddr::new(self.host, self.port),
            storage_dir: self
                .storage_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            remote_url: self.remote_url.clone(),
            cloud_url: self.cloud_url.clone(),
            cloud_lang: self.cloud_lang.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            engine_timeout: Duration::from_secs(self.engine_timeout_secs),
            espeak_bin: (!self.no_local_engine).then(|| self.espeak_bin.clone()),
            ffmpeg_bin: self.ffmpeg_bin.clone(),
            max_text_chars: self.max_text_chars,
        }
    }
}
