use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{StepcastError, StepcastResult};
use crate::media::tools::{MediaTools, run_tool};
use crate::speech::{SpeechSynthesizer, check_written, measure_speech, prepare_destination};

/// macOS `say -v <voice> -o <out.aiff> <text>`.
#[derive(Clone, Debug)]
pub struct SaySynthesizer {
    voice: String,
    binary: PathBuf,
    tools: MediaTools,
}

impl SaySynthesizer {
    /// Run `binary` with `voice` (e.g. `Samantha`).
    pub fn new(binary: impl Into<PathBuf>, voice: impl Into<String>, tools: MediaTools) -> Self {
        Self {
            voice: voice.into(),
            binary: binary.into(),
            tools,
        }
    }
}

impl SpeechSynthesizer for SaySynthesizer {
    fn identity(&self) -> String {
        format!("say_{}", self.voice)
    }

    fn output_extension(&self) -> &'static str {
        "aiff"
    }

    fn generate(&self, text: &str, destination: &Path) -> StepcastResult<PathBuf> {
        prepare_destination(text, destination)?;
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-v", &self.voice, "-o"]).arg(destination).arg(text);
        run_tool(&mut cmd, "say").map_err(|e| StepcastError::synthesis(format!("{e:#}")))?;
        check_written(destination)
    }

    fn duration(&self, asset: &Path) -> StepcastResult<f64> {
        measure_speech(&self.tools, asset)
    }
}

/// Piper: text on stdin, WAV written to `--output_file`.
#[derive(Clone, Debug)]
pub struct PiperSynthesizer {
    model: PathBuf,
    binary: PathBuf,
    tools: MediaTools,
}

impl PiperSynthesizer {
    /// Run `binary` with the `.onnx` voice `model`. Fails if the model file is missing.
    pub fn new(
        binary: impl Into<PathBuf>,
        model: PathBuf,
        tools: MediaTools,
    ) -> StepcastResult<Self> {
        if !model.is_file() {
            return Err(StepcastError::config(format!(
                "piper model not found: '{}'",
                model.display()
            )));
        }
        Ok(Self {
            model,
            binary: binary.into(),
            tools,
        })
    }
}

impl SpeechSynthesizer for PiperSynthesizer {
    fn identity(&self) -> String {
        let stem = self
            .model
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("piper_{stem}")
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }

    fn generate(&self, text: &str, destination: &Path) -> StepcastResult<PathBuf> {
        prepare_destination(text, destination)?;

        let mut child = Command::new(&self.binary)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(destination)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                StepcastError::synthesis(format!(
                    "failed to spawn piper '{}' (is it installed and on PATH?): {e}",
                    self.binary.display()
                ))
            })?;

        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(text.as_bytes()),
            None => Err(std::io::Error::other("stdin was not captured")),
        };

        // Reap the child even when the write failed; its stderr carries the reason.
        let out = child
            .wait_with_output()
            .map_err(|e| StepcastError::synthesis(format!("failed to wait for piper: {e}")))?;
        if !out.status.success() {
            return Err(StepcastError::synthesis(format!(
                "piper exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        written.map_err(|e| StepcastError::synthesis(format!("failed to write to piper: {e}")))?;
        check_written(destination)
    }

    fn duration(&self, asset: &Path) -> StepcastResult<f64> {
        measure_speech(&self.tools, asset)
    }
}

/// `espeak-ng -v <voice> -w <out.wav> <text>`.
#[derive(Clone, Debug)]
pub struct EspeakSynthesizer {
    voice: String,
    binary: PathBuf,
    tools: MediaTools,
}

impl EspeakSynthesizer {
    /// Run `binary` with `voice` (e.g. `en-us`).
    pub fn new(binary: impl Into<PathBuf>, voice: impl Into<String>, tools: MediaTools) -> Self {
        Self {
            voice: voice.into(),
            binary: binary.into(),
            tools,
        }
    }
}

impl SpeechSynthesizer for EspeakSynthesizer {
    fn identity(&self) -> String {
        format!("espeak_{}", self.voice)
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }

    fn generate(&self, text: &str, destination: &Path) -> StepcastResult<PathBuf> {
        prepare_destination(text, destination)?;
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-v", &self.voice, "-w"])
            .arg(destination)
            .arg("--")
            .arg(text);
        run_tool(&mut cmd, "espeak-ng")
            .map_err(|e| StepcastError::synthesis(format!("{e:#}")))?;
        check_written(destination)
    }

    fn duration(&self, asset: &Path) -> StepcastResult<f64> {
        measure_speech(&self.tools, asset)
    }
}
