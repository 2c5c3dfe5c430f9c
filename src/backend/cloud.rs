//! Cloud text-to-speech client.
//!
//! Speaks through the translate TTS endpoint. The accent is chosen by the
//! region token substituted into the endpoint host, e.g. `co.uk`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::SpeechProvider;
use super::types::BackendError;

/// Longest text the endpoint accepts in a single request.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Placeholder for the region token in the endpoint template.
const REGION_PLACEHOLDER: &str = "{tld}";

/// Cloud TTS client producing MP3 audio.
pub struct CloudTtsClient {
    url_template: String,
    lang: String,
    client: reqwest::Client,
}

impl CloudTtsClient {
    /// Create a client for `url_template`, which may contain `{tld}`.
    pub fn new(
        url_template: impl Into<String>,
        lang: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        Ok(Self::with_client(url_template, lang, client))
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(
        url_template: impl Into<String>,
        lang: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            url_template: url_template.into(),
            lang: lang.into(),
            client,
        }
    }

    /// Build the endpoint URL for a region token.
    pub fn endpoint(&self, region: &str) -> String {
        self.url_template.replace(REGION_PLACEHOLDER, region)
    }

    async fn fetch_chunk(
        &self,
        url: &str,
        chunk: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, BackendError> {
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(url)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", self.lang.as_str()),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
                ("client", "tw-ob"),
                ("ttsspeed", "1"),
            ])
            .send()
            .await
            .map_err(BackendError::from_transport)?;

        if !response.status().is_success() {
            return Err(BackendError::RequestFailed(format!(
                "Cloud TTS failed: {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SpeechProvider for CloudTtsClient {
    fn id(&self) -> &'static str {
        "cloud-tts"
    }

    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<(), BackendError> {
        let url = self.endpoint(voice);
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        debug!(region = voice, chunks = chunks.len(), "requesting cloud speech");

        // Fetch everything before touching the file so a failed chunk
        // never leaves half an utterance behind.
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(&url, chunk, idx, chunks.len()).await?;
            audio.extend_from_slice(&bytes);
        }

        let mut file = tokio::fs::File::create(output).await?;
        file.write_all(&audio).await?;
        file.flush().await?;

        Ok(())
    }
}

/// Characters that end a sentence or clause.
const CLAUSE_ENDINGS: &[char] = &['.', '!', '?', ',', ';', ':'];

fn ends_clause(word: &str) -> bool {
    word.ends_with(CLAUSE_ENDINGS)
}

/// Length of `words` joined by single spaces, in characters.
fn joined_len(words: &[&str]) -> usize {
    let chars: usize = words.iter().map(|w| w.chars().count()).sum();
    chars + words.len().saturating_sub(1)
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// A full piece breaks after the last word ending a sentence or clause, so
/// the next request starts at a natural pause. Without such a word it breaks
/// on whitespace, and a single word longer than the limit is cut at
/// character boundaries.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(current.join(" "));
                current.clear();
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if !current.is_empty() && joined_len(&current) + 1 + word_len > max_chars {
            let cut = current
                .iter()
                .rposition(|w| ends_clause(w))
                .map_or(current.len(), |i| i + 1);
            let carried = current.split_off(cut);
            chunks.push(current.join(" "));
            current = carried;

            // The carried words may still leave no room for this one.
            if !current.is_empty() && joined_len(&current) + 1 + word_len > max_chars {
                chunks.push(current.join(" "));
                current.clear();
            }
        }

        current.push(word);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}
