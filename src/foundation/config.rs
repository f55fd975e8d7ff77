use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{StepcastError, StepcastResult};
use crate::speech::SynthesizerKind;

/// File name looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "stepcast.toml";

/// Studio-wide configuration, usually read from `stepcast.toml`.
///
/// Every field has a default so an empty file (or no file) is valid.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    /// Base directory for per-scene build outputs.
    pub output_dir: Option<PathBuf>,
    /// External binaries.
    pub tools: ToolsConfig,
    /// Speech synthesis selection and tuning.
    pub speech: SpeechConfig,
    /// Headless capture settings.
    pub capture: CaptureConfig,
}

/// Locations of external binaries. Bare names are resolved on `PATH`.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// `ffmpeg` binary.
    pub ffmpeg: PathBuf,
    /// `ffprobe` binary.
    pub ffprobe: PathBuf,
    /// Chromium (or Chrome) binary with `--headless` support.
    pub chromium: PathBuf,
    /// macOS `say` binary.
    pub say: PathBuf,
    /// Piper binary.
    pub piper: PathBuf,
    /// `espeak-ng` binary.
    pub espeak: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            chromium: PathBuf::from("chromium"),
            say: PathBuf::from("say"),
            piper: PathBuf::from("piper"),
            espeak: PathBuf::from("espeak-ng"),
        }
    }
}

/// Speech synthesis settings.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeechConfig {
    /// Which synthesizer to use.
    pub engine: SynthesizerKind,
    /// Engine-specific voice name. `None` picks the engine default.
    pub voice: Option<String>,
    /// Path to the Piper `.onnx` voice model.
    pub piper_model: Option<PathBuf>,
    /// OpenAI speech model.
    pub openai_model: String,
    /// Synthesize steps concurrently (results stay in step order).
    pub parallel: bool,
    /// Worker threads for parallel synthesis. `None` uses the rayon default.
    pub threads: Option<usize>,
    /// Re-measure existing step audio instead of re-synthesizing it.
    pub reuse_audio: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine: SynthesizerKind::Piper,
            voice: None,
            piper_model: None,
            openai_model: "tts-1-hd".to_string(),
            parallel: false,
            threads: None,
            reuse_audio: false,
        }
    }
}

/// Capture settings.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Viewport width in pixels (must be even).
    pub width: u32,
    /// Viewport height in pixels (must be even).
    pub height: u32,
    /// Sampling rate of the captured video.
    pub fps: u32,
    /// Virtual time granted to each sampled frame before the screenshot.
    pub frame_settle_ms: u64,
    /// Virtual time granted to the readiness check.
    pub ready_budget_ms: u64,
    /// Worker threads for frame sampling. `None` uses the rayon default.
    pub threads: Option<usize>,
    /// Pass `--no-sandbox` to Chromium (needed when running as root in containers).
    pub no_sandbox: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 10,
            frame_settle_ms: 250,
            ready_budget_ms: 2_000,
            threads: None,
            no_sandbox: false,
        }
    }
}

impl StudioConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> StepcastResult<Self> {
        let cfg: Self =
            toml::from_str(text).map_err(|e| StepcastError::config(format!("{e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a configuration file.
    pub fn from_path(path: &Path) -> StepcastResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_toml_str(&text).map_err(|e| match e {
            StepcastError::Config(msg) => {
                StepcastError::config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Load `explicit` if given, otherwise `stepcast.toml` in `dir` if present,
    /// otherwise defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> StepcastResult<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using config file");
            return Self::from_path(&candidate);
        }
        Ok(Self::default())
    }

    /// Reject values no adapter can work with.
    pub fn validate(&self) -> StepcastResult<()> {
        let c = &self.capture;
        if c.width == 0 || c.height == 0 {
            return Err(StepcastError::config(
                "capture width/height must be non-zero",
            ));
        }
        if !c.width.is_multiple_of(2) || !c.height.is_multiple_of(2) {
            return Err(StepcastError::config(
                "capture width/height must be even (required for yuv420p output)",
            ));
        }
        if c.fps == 0 {
            return Err(StepcastError::config("capture fps must be non-zero"));
        }
        if matches!(self.speech.threads, Some(0)) || matches!(c.threads, Some(0)) {
            return Err(StepcastError::config("thread counts must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
