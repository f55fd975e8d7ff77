use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::foundation::error::{StepcastError, StepcastResult};
use crate::media::tools::MediaTools;
use crate::speech::{SpeechSynthesizer, check_written, measure_speech, prepare_destination};

const SPEECH_ENDPOINT: &str = "https://api.openai.com/v1/audio/speech";

/// Environment variables checked, in order, for the API key.
pub const API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "OPEN_API_KEY"];

#[derive(serde::Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// OpenAI `/v1/audio/speech` client writing MP3.
pub struct OpenAiSynthesizer {
    voice: String,
    model: String,
    api_key: Option<String>,
    endpoint: String,
    client: reqwest::blocking::Client,
    tools: MediaTools,
}

impl std::fmt::Debug for OpenAiSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSynthesizer")
            .field("voice", &self.voice)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl OpenAiSynthesizer {
    /// Build a client with an explicit key. A missing key only fails at [`generate`] time.
    ///
    /// [`generate`]: SpeechSynthesizer::generate
    pub fn new(
        voice: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        tools: MediaTools,
    ) -> StepcastResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| StepcastError::config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            voice: voice.into(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: SPEECH_ENDPOINT.to_string(),
            client,
            tools,
        })
    }

    /// Build a client reading the key from [`API_KEY_VARS`].
    pub fn from_env(
        voice: impl Into<String>,
        model: impl Into<String>,
        tools: MediaTools,
    ) -> StepcastResult<Self> {
        let key = API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()));
        Self::new(voice, model, key, tools)
    }

    /// Point at a different endpoint (proxies, compatible servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl SpeechSynthesizer for OpenAiSynthesizer {
    fn identity(&self) -> String {
        format!("openai_{}_{}", self.model, self.voice)
    }

    fn output_extension(&self) -> &'static str {
        "mp3"
    }

    #[tracing::instrument(skip_all, fields(model = %self.model, voice = %self.voice))]
    fn generate(&self, text: &str, destination: &Path) -> StepcastResult<PathBuf> {
        prepare_destination(text, destination)?;
        let key = self.api_key.as_deref().ok_or_else(|| {
            StepcastError::synthesis(format!(
                "no OpenAI API key; set {}",
                API_KEY_VARS.join(" or ")
            ))
        })?;

        let body = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
            response_format: "mp3",
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&body)
            .send()
            .map_err(|e| StepcastError::synthesis(format!("speech request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(StepcastError::synthesis(format!(
                "speech request returned {status}: {}",
                detail.trim()
            )));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| StepcastError::synthesis(format!("failed to read speech body: {e}")))?;
        if bytes.is_empty() {
            return Err(StepcastError::synthesis("speech response was empty"));
        }
        std::fs::write(destination, &bytes).map_err(|e| {
            StepcastError::synthesis(format!("failed to write '{}': {e}", destination.display()))
        })?;
        tracing::debug!(bytes = bytes.len(), out = %destination.display(), "speech written");
        check_written(destination)
    }

    fn duration(&self, asset: &Path) -> StepcastResult<f64> {
        measure_speech(&self.tools, asset)
    }
}
