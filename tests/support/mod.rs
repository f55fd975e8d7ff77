#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stepcast::{
    AnimationRenderer, HtmlAnimation, MediaMerger, Orchestrator, PipelineOpts, Ports, SceneSpec,
    SpeechSynthesizer, StepcastError, StepcastResult, TimingPlan, VideoCapture,
};

/// Port calls in the order they happened.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Generate(String),
    Duration(PathBuf),
    Render(Vec<f64>),
    Capture(f64),
    Concat(Vec<PathBuf>),
    Merge,
}

#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<Call>>>);

impl Calls {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn all(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn generated(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|c| match c {
                Call::Generate(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn renders(&self) -> Vec<Vec<f64>> {
        self.all()
            .into_iter()
            .filter_map(|c| match c {
                Call::Render(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn captures(&self) -> Vec<f64> {
        self.all()
            .into_iter()
            .filter_map(|c| match c {
                Call::Capture(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn concats(&self) -> Vec<Vec<PathBuf>> {
        self.all()
            .into_iter()
            .filter_map(|c| match c {
                Call::Concat(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

/// Writes the narration into the "audio" file; the duration is looked up by narration text.
#[derive(Clone, Default)]
pub struct FakeSpeech {
    pub calls: Calls,
    pub durations: BTreeMap<String, f64>,
    pub delays_ms: BTreeMap<String, u64>,
    pub fail_on: Option<String>,
}

impl FakeSpeech {
    pub fn with_durations(calls: &Calls, pairs: &[(&str, f64)]) -> Self {
        Self {
            calls: calls.clone(),
            durations: pairs.iter().map(|(n, d)| (n.to_string(), *d)).collect(),
            ..Self::default()
        }
    }
}

impl SpeechSynthesizer for FakeSpeech {
    fn identity(&self) -> String {
        "fake-speech".into()
    }

    fn output_extension(&self) -> &'static str {
        "txt"
    }

    fn generate(&self, text: &str, destination: &Path) -> StepcastResult<PathBuf> {
        self.calls.push(Call::Generate(text.to_string()));
        if text.trim().is_empty() {
            return Err(StepcastError::synthesis("text must not be empty"));
        }
        if self.fail_on.as_deref() == Some(text) {
            return Err(StepcastError::synthesis(format!("engine refused '{text}'")));
        }
        if let Some(ms) = self.delays_ms.get(text) {
            std::thread::sleep(Duration::from_millis(*ms));
        }
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StepcastError::synthesis(e.to_string()))?;
        }
        std::fs::write(destination, text).map_err(|e| StepcastError::synthesis(e.to_string()))?;
        Ok(destination.to_path_buf())
    }

    fn duration(&self, asset: &Path) -> StepcastResult<f64> {
        self.calls.push(Call::Duration(asset.to_path_buf()));
        let text = std::fs::read_to_string(asset)
            .map_err(|e| StepcastError::synthesis(format!("cannot measure: {e}")))?;
        Ok(self.durations.get(&text).copied().unwrap_or(1.0))
    }
}

/// Real HTML renderer, with the received durations recorded.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub calls: Calls,
}

impl AnimationRenderer for RecordingRenderer {
    fn identity(&self) -> String {
        "recording-html".into()
    }

    fn render(
        &self,
        scene: &SceneSpec,
        timing: &TimingPlan,
        destination: &Path,
    ) -> StepcastResult<PathBuf> {
        self.calls.push(Call::Render(timing.durations().to_vec()));
        HtmlAnimation::new().render(scene, timing, destination)
    }
}

#[derive(Clone, Default)]
pub struct FakeCapture {
    pub calls: Calls,
    pub fail: bool,
}

impl VideoCapture for FakeCapture {
    fn identity(&self) -> String {
        "fake-capture".into()
    }

    fn capture(
        &self,
        artifact: &Path,
        total_duration: f64,
        destination: &Path,
    ) -> StepcastResult<PathBuf> {
        self.calls.push(Call::Capture(total_duration));
        if self.fail {
            return Err(StepcastError::capture("browser crashed"));
        }
        if !artifact.is_file() {
            return Err(StepcastError::capture("artifact missing"));
        }
        std::fs::write(destination, format!("video {total_duration}"))
            .map_err(|e| StepcastError::capture(e.to_string()))?;
        Ok(destination.to_path_buf())
    }
}

#[derive(Clone, Default)]
pub struct FakeMerger {
    pub calls: Calls,
}

impl MediaMerger for FakeMerger {
    fn identity(&self) -> String {
        "fake-merger".into()
    }

    fn concatenate_audio(&self, inputs: &[PathBuf], destination: &Path) -> StepcastResult<PathBuf> {
        self.calls.push(Call::Concat(inputs.to_vec()));
        let mut joined = String::new();
        for input in inputs {
            joined.push_str(
                &std::fs::read_to_string(input).map_err(|e| StepcastError::merge(e.to_string()))?,
            );
        }
        std::fs::write(destination, joined).map_err(|e| StepcastError::merge(e.to_string()))?;
        Ok(destination.to_path_buf())
    }

    fn merge(&self, video: &Path, audio: &Path, destination: &Path) -> StepcastResult<PathBuf> {
        self.calls.push(Call::Merge);
        if !video.is_file() || !audio.is_file() {
            return Err(StepcastError::merge("input missing"));
        }
        std::fs::write(destination, "final").map_err(|e| StepcastError::merge(e.to_string()))?;
        Ok(destination.to_path_buf())
    }
}

/// Orchestrator over fakes that all record into `calls`.
pub fn orchestrator(speech: FakeSpeech, capture: FakeCapture, opts: PipelineOpts) -> Orchestrator {
    let calls = speech.calls.clone();
    Orchestrator::new(
        Ports {
            synthesizer: Box::new(speech),
            renderer: Box::new(RecordingRenderer {
                calls: calls.clone(),
            }),
            capture: Box::new(FakeCapture {
                calls: calls.clone(),
                ..capture
            }),
            merger: Box::new(FakeMerger { calls }),
        },
        opts,
    )
}

pub fn opts(out: &Path) -> PipelineOpts {
    PipelineOpts {
        output_dir: out.to_path_buf(),
        ..PipelineOpts::default()
    }
}

/// Scene JSON with steps `s0..` carrying the given narrations.
pub fn scene_json(id: &str, narrations: &[&str]) -> String {
    let steps: Vec<serde_json::Value> = narrations
        .iter()
        .enumerate()
        .map(|(i, n)| {
            serde_json::json!({
                "id": format!("s{i}"),
                "narration": n,
                "state": { "left": 0, "right": i, "message": format!("step {i}") }
            })
        })
        .collect();
    serde_json::json!({
        "id": id,
        "title": "Two Sum (sorted)",
        "visualization": {
            "type": "array_pointers",
            "config": { "array": [1, 2, 4, 7, 11], "target": 9 }
        },
        "steps": steps,
    })
    .to_string()
}

/// In-memory scene; skips narration checks so empty narration reaches synthesis.
pub fn scene(id: &str, narrations: &[&str]) -> SceneSpec {
    serde_json::from_str(&scene_json(id, narrations)).unwrap()
}
