//! Speech synthesis port and its adapters.
//!
//! Synthesis and duration measurement are separate calls so a previously generated asset can be
//! re-measured without re-synthesizing it.

use std::path::{Path, PathBuf};

use crate::foundation::config::{SpeechConfig, ToolsConfig};
use crate::foundation::error::{StepcastError, StepcastResult};
use crate::media::tools::{MediaTools, ensure_parent_dir};

/// Subprocess-driven engines (`say`, `piper`, `espeak-ng`).
pub mod command;
/// OpenAI speech API.
pub mod openai;

pub use command::{EspeakSynthesizer, PiperSynthesizer, SaySynthesizer};
pub use openai::OpenAiSynthesizer;

/// Turns narration text into an audio asset and measures it.
pub trait SpeechSynthesizer: Send + Sync {
    /// Stable name for logs. Never used for branching.
    fn identity(&self) -> String;

    /// File extension (without dot) of the assets this engine writes.
    fn output_extension(&self) -> &'static str;

    /// Synthesize `text` into `destination`, creating parent directories as needed.
    ///
    /// Empty or whitespace-only text is an error.
    fn generate(&self, text: &str, destination: &Path) -> StepcastResult<PathBuf>;

    /// Length in seconds (> 0) of an existing asset.
    fn duration(&self, asset: &Path) -> StepcastResult<f64>;
}

impl std::fmt::Debug for dyn SpeechSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSynthesizer").field("identity", &self.identity()).finish()
    }
}

/// Available synthesizer implementations.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SynthesizerKind {
    /// macOS `say`.
    Say,
    /// Local Piper voice model.
    #[default]
    Piper,
    /// `espeak-ng`.
    Espeak,
    /// OpenAI speech API.
    #[serde(rename = "openai")]
    #[value(name = "openai")]
    OpenAi,
}

/// Locations of the subprocess speech engines.
///
/// Defaults to `say`, `piper` and `espeak-ng` resolved on `PATH`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineBinaries {
    /// macOS `say`.
    pub say: PathBuf,
    /// Piper.
    pub piper: PathBuf,
    /// `espeak-ng`.
    pub espeak: PathBuf,
}

impl Default for EngineBinaries {
    fn default() -> Self {
        Self::from(&ToolsConfig::default())
    }
}

impl From<&ToolsConfig> for EngineBinaries {
    fn from(cfg: &ToolsConfig) -> Self {
        Self {
            say: cfg.say.clone(),
            piper: cfg.piper.clone(),
            espeak: cfg.espeak.clone(),
        }
    }
}

/// Inputs for [`create_synthesizer`].
#[derive(Clone, Debug, Default)]
pub struct SynthesizerOpts {
    /// Voice name; `None` picks the engine default.
    pub voice: Option<String>,
    /// Piper `.onnx` model (required for [`SynthesizerKind::Piper`]).
    pub piper_model: Option<PathBuf>,
    /// OpenAI model; `None` means `tts-1-hd`.
    pub openai_model: Option<String>,
    /// Engine binaries.
    pub engines: EngineBinaries,
    /// ffmpeg/ffprobe used for duration measurement.
    pub tools: MediaTools,
}

impl SynthesizerOpts {
    /// Options from the `[speech]` and `[tools]` config sections.
    pub fn from_config(speech: &SpeechConfig, tools: &ToolsConfig) -> Self {
        Self {
            voice: speech.voice.clone(),
            piper_model: speech.piper_model.clone(),
            openai_model: Some(speech.openai_model.clone()),
            engines: EngineBinaries::from(tools),
            tools: MediaTools::from(tools),
        }
    }
}

/// Construct a synthesizer by kind.
pub fn create_synthesizer(
    kind: SynthesizerKind,
    opts: &SynthesizerOpts,
) -> StepcastResult<Box<dyn SpeechSynthesizer>> {
    let tools = opts.tools.clone();
    match kind {
        SynthesizerKind::Say => Ok(Box::new(SaySynthesizer::new(
            opts.engines.say.clone(),
            opts.voice.clone().unwrap_or_else(|| "Samantha".to_string()),
            tools,
        ))),
        SynthesizerKind::Piper => {
            let model = opts.piper_model.clone().ok_or_else(|| {
                StepcastError::config("piper requires a voice model (--piper-model)")
            })?;
            Ok(Box::new(PiperSynthesizer::new(
                opts.engines.piper.clone(),
                model,
                tools,
            )?))
        }
        SynthesizerKind::Espeak => Ok(Box::new(EspeakSynthesizer::new(
            opts.engines.espeak.clone(),
            opts.voice.clone().unwrap_or_else(|| "en-us".to_string()),
            tools,
        ))),
        SynthesizerKind::OpenAi => Ok(Box::new(OpenAiSynthesizer::from_env(
            opts.voice.clone().unwrap_or_else(|| "onyx".to_string()),
            opts.openai_model
                .clone()
                .unwrap_or_else(|| "tts-1-hd".to_string()),
            tools,
        )?)),
    }
}

/// Shared precondition for every engine: non-blank text and a writable parent directory.
pub(crate) fn prepare_destination(text: &str, destination: &Path) -> StepcastResult<()> {
    if text.trim().is_empty() {
        return Err(StepcastError::synthesis("text must not be empty"));
    }
    ensure_parent_dir(destination).map_err(|e| StepcastError::synthesis(format!("{e:#}")))
}

/// Shared postcondition: the engine actually wrote the file.
pub(crate) fn check_written(destination: &Path) -> StepcastResult<PathBuf> {
    if !destination.is_file() {
        return Err(StepcastError::synthesis(format!(
            "audio file was not created at '{}'",
            destination.display()
        )));
    }
    Ok(destination.to_path_buf())
}

/// Shared duration probe via `ffprobe`.
pub(crate) fn measure_speech(tools: &MediaTools, asset: &Path) -> StepcastResult<f64> {
    if !asset.is_file() {
        return Err(StepcastError::synthesis(format!(
            "audio file not found: '{}'",
            asset.display()
        )));
    }
    tools
        .measure_duration(asset)
        .map_err(|e| StepcastError::synthesis(format!("{e:#}")))
}

#[cfg(test)]
#[path = "../../tests/unit/speech/mod.rs"]
mod tests;
