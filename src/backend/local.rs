//! Local synthesis through the `espeak-ng` binary, with MP3 output via `ffmpeg`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::LocalEngine;
use super::types::{BackendError, EngineVoice, Gender};

/// Speech rate handed to the engine, in words per minute.
pub const SPEECH_RATE_WPM: u32 = 150;

/// Bitrate of the transcoded MP3.
pub const MP3_BITRATE: &str = "128k";

/// Find an executable by name on `PATH`, or accept it as a literal path.
pub fn find_binary(bin: &str) -> Option<PathBuf> {
    if bin.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(bin);
        return path.is_file().then_some(path);
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}

/// Spawn `cmd`, feed it `stdin`, and wait for it with a deadline.
///
/// The child is killed if the deadline passes.
async fn run_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> std::io::Result<Output> {
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    let mut child = cmd.spawn()?;

    if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(data).await?;
    }

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output,
        Err(_) => Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("process timed out after {}s", timeout.as_secs()),
        )),
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// WAV → MP3 conversion through `ffmpeg`.
#[derive(Debug, Clone)]
pub struct Transcoder {
    binary: PathBuf,
    timeout: Duration,
}

impl Transcoder {
    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    /// Locate `bin` and build a transcoder for it.
    pub fn detect(bin: &str, timeout: Duration) -> Option<Self> {
        find_binary(bin).map(|binary| Self::new(binary, timeout))
    }

    fn args(wav: &Path, mp3: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            wav.into(),
            "-codec:a".into(),
            "libmp3lame".into(),
            "-b:a".into(),
            MP3_BITRATE.into(),
            mp3.into(),
        ]
    }

    /// Convert `wav` into an MP3 at `mp3`.
    pub async fn wav_to_mp3(&self, wav: &Path, mp3: &Path) -> Result<(), BackendError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(Self::args(wav, mp3));

        let output = run_with_timeout(cmd, None, self.timeout)
            .await
            .map_err(|e| BackendError::TranscodeFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(BackendError::TranscodeFailed(stderr_of(&output)));
        }

        Ok(())
    }
}

/// The `espeak-ng` engine.
#[derive(Debug, Clone)]
pub struct EspeakEngine {
    binary: PathBuf,
    transcoder: Transcoder,
    timeout: Duration,
}

impl EspeakEngine {
    pub fn new(binary: PathBuf, transcoder: Transcoder, timeout: Duration) -> Self {
        Self {
            binary,
            transcoder,
            timeout,
        }
    }

    /// Locate `bin` and the `ffmpeg_bin` transcoder on the host.
    ///
    /// Both are required: without MP3 output every local voice would fail,
    /// so a missing transcoder disables the engine as well.
    pub fn detect(bin: &str, ffmpeg_bin: &str, timeout: Duration) -> Option<Self> {
        let Some(binary) = find_binary(bin) else {
            info!(bin, "local engine not found; system voices disabled");
            return None;
        };

        let Some(transcoder) = Transcoder::detect(ffmpeg_bin, timeout) else {
            warn!(bin = ffmpeg_bin, "MP3 transcoder not found; system voices disabled");
            return None;
        };

        Some(Self::new(binary, transcoder, timeout))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn synth_args(voice: &str, wav: &Path) -> Vec<OsString> {
        vec![
            "-v".into(),
            voice.into(),
            "-s".into(),
            SPEECH_RATE_WPM.to_string().into(),
            "-w".into(),
            wav.into(),
            "--stdin".into(),
        ]
    }

    async fn render_wav(&self, text: &str, voice: &str, wav: &Path) -> Result<(), BackendError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(Self::synth_args(voice, wav));

        let output = run_with_timeout(cmd, Some(text.as_bytes()), self.timeout)
            .await
            .map_err(|e| BackendError::EngineFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(BackendError::EngineFailed(stderr_of(&output)));
        }

        let path = wav.to_path_buf();
        tokio::task::spawn_blocking(move || check_wav(&path))
            .await
            .map_err(|e| BackendError::EngineFailed(e.to_string()))?
    }
}

/// Confirm the engine wrote a readable WAV with at least one sample.
pub fn check_wav(path: &Path) -> Result<(), BackendError> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| BackendError::EngineFailed(format!("unreadable WAV output: {e}")))?;

    if reader.duration() == 0 {
        return Err(BackendError::EmptyAudio);
    }

    Ok(())
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
/// ```
pub fn parse_voice_list(listing: &str) -> Vec<EngineVoice> {
    let mut voices: Vec<EngineVoice> = Vec::new();

    for line in listing.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [_, language, age_gender, name, ..] = fields.as_slice() else {
            continue;
        };

        if voices.iter().any(|v| v.id == *language) {
            continue;
        }

        let gender = match age_gender.rsplit('/').next() {
            Some("M") => Gender::Male,
            Some("F") => Gender::Female,
            _ => Gender::Neutral,
        };

        voices.push(EngineVoice {
            id: language.to_string(),
            name: name.replace('_', " "),
            gender,
        });
    }

    voices
}

#[async_trait]
impl LocalEngine for EspeakEngine {
    async fn list_voices(&self) -> Result<Vec<EngineVoice>, BackendError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--voices");

        let output = run_with_timeout(cmd, None, self.timeout)
            .await
            .map_err(|e| BackendError::EngineFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(BackendError::EngineFailed(stderr_of(&output)));
        }

        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<(), BackendError> {
        let wav = output.with_extension("wav");
        debug!(voice, wav = %wav.display(), "rendering local speech");

        let result = async {
            self.render_wav(text, voice, &wav).await?;
            self.transcoder.wav_to_mp3(&wav, output).await
        }
        .await;

        if let Err(e) = tokio::fs::remove_file(&wav).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(wav = %wav.display(), error = %e, "failed to remove intermediate WAV");
        }

        result
    }
}
