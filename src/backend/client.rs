//! HTTP client for the remote speech API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::SpeechProvider;
use super::types::BackendError;

/// Remote speech API reached with a query-parameter GET.
///
/// The response body is MP3 audio and is streamed to disk unchanged.
pub struct RemoteSpeechClient {
    url: String,
    client: reqwest::Client,
}

impl RemoteSpeechClient {
    /// Create a client for the endpoint at `url`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        Ok(Self::with_client(url, client))
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl SpeechProvider for RemoteSpeechClient {
    fn id(&self) -> &'static str {
        "remote-speech"
    }

    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<(), BackendError> {
        debug!(voice, url = %self.url, "requesting remote speech");

        let response = self
            .client
            .get(&self.url)
            .query(&[("voice", voice), ("text", text)])
            .send()
            .await
            .map_err(BackendError::from_transport)?;

        if !response.status().is_success() {
            return Err(BackendError::RequestFailed(format!(
                "Remote speech API failed: {}",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(output).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(BackendError::from_transport)?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(())
    }
}
