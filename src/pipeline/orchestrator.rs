use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::animation::{AnimationRenderer, check_alignment};
use crate::capture::VideoCapture;
use crate::foundation::error::{ErrorKind, StepcastError, StepcastResult};
use crate::foundation::threads::build_thread_pool;
use crate::media::merge::MediaMerger;
use crate::pipeline::batch::fallback_scene_id;
use crate::pipeline::layout::{
    ArtifactLayout, KEY_ANIMATION, KEY_AUDIO_CONCAT, KEY_FINAL, KEY_TIMING, KEY_VIDEO, audio_key,
};
use crate::scene::model::{SceneSpec, Step};
use crate::scene::timing::TimingPlan;
use crate::speech::SpeechSynthesizer;

/// Build stages, in execution order. `Failed` is absorbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Scene obtained and structurally valid.
    Loaded,
    /// Per-step speech generation and measurement.
    Synthesizing,
    /// Timing plan assembled.
    Timed,
    /// Animation artifact written.
    Rendered,
    /// Video captured.
    Captured,
    /// Narration concatenated.
    AudioMerged,
    /// Final asset written.
    Finalized,
    /// A stage failed; later stages were skipped.
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Loaded => "LOADED",
            Self::Synthesizing => "SYNTHESIZING",
            Self::Timed => "TIMED",
            Self::Rendered => "RENDERED",
            Self::Captured => "CAPTURED",
            Self::AudioMerged => "AUDIO_MERGED",
            Self::Finalized => "FINALIZED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Where and why a build stopped.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BuildFailure {
    /// Stage that was running when the error occurred.
    pub stage: Stage,
    /// Error category.
    pub kind: ErrorKind,
    /// Verbatim error message.
    pub message: String,
}

/// Outcome of one build (or dry run) of one scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BuildResult {
    /// Scene identifier (a fallback derived from the file name when loading failed).
    pub scene_id: String,
    /// Final asset, present only on success of a real build.
    pub output_path: Option<PathBuf>,
    /// Measured timing, present once the build got past synthesis.
    pub timing: Option<TimingPlan>,
    /// Whether the build (or dry run) succeeded.
    pub success: bool,
    /// Last stage reached: `Finalized`, `Failed`, or `Loaded` for a dry run.
    pub stage: Stage,
    /// Failure detail, present only when `success` is false.
    pub failure: Option<BuildFailure>,
    /// Every intermediate artifact produced, by name, kept on failure too.
    pub intermediates: BTreeMap<String, PathBuf>,
    /// Validation only; nothing was built.
    pub dry_run: bool,
}

impl BuildResult {
    /// Failed result for a scene that could not be loaded.
    pub fn load_failure(scene_id: impl Into<String>, err: &StepcastError, dry_run: bool) -> Self {
        Self {
            scene_id: scene_id.into(),
            output_path: None,
            timing: None,
            success: false,
            stage: Stage::Failed,
            failure: Some(BuildFailure {
                stage: Stage::Loaded,
                kind: err.kind(),
                message: err.to_string(),
            }),
            intermediates: BTreeMap::new(),
            dry_run,
        }
    }

    /// Failure message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }
}

/// The four ports a build drives.
pub struct Ports {
    /// Speech synthesis.
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    /// Animation rendering.
    pub renderer: Box<dyn AnimationRenderer>,
    /// Video capture.
    pub capture: Box<dyn VideoCapture>,
    /// Audio concatenation and final merge.
    pub merger: Box<dyn MediaMerger>,
}

impl std::fmt::Debug for Ports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ports")
            .field("synthesizer", &self.synthesizer.identity())
            .field("renderer", &self.renderer.identity())
            .field("capture", &self.capture.identity())
            .field("merger", &self.merger.identity())
            .finish()
    }
}

/// Orchestrator options.
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Base directory; each scene builds into `<output_dir>/<scene_id>/`.
    pub output_dir: PathBuf,
    /// Synthesize steps concurrently. Results are still assembled in step order.
    pub parallel_synthesis: bool,
    /// Worker threads for parallel synthesis. `None` uses rayon's default.
    pub synthesis_threads: Option<usize>,
    /// Keep step audio whose recorded narration still matches, and only re-measure it.
    pub reuse_audio: bool,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("build"),
            parallel_synthesis: false,
            synthesis_threads: None,
            reuse_audio: false,
        }
    }
}

#[derive(serde::Serialize)]
struct TimingRecord<'a> {
    scene_id: &'a str,
    step_durations: &'a [f64],
    total_duration: f64,
    steps: Vec<TimingStep<'a>>,
}

#[derive(serde::Serialize)]
struct TimingStep<'a> {
    id: &'a str,
    duration: f64,
    narration: &'a str,
}

/// Per-build mutable bookkeeping.
struct BuildState {
    stage: Stage,
    timing: Option<TimingPlan>,
    intermediates: BTreeMap<String, PathBuf>,
}

impl BuildState {
    fn enter(&mut self, scene_id: &str, stage: Stage) {
        self.stage = stage;
        tracing::info!(scene = scene_id, %stage, "stage");
    }

    fn record(&mut self, key: impl Into<String>, path: PathBuf) {
        let key = key.into();
        tracing::debug!(%key, path = %path.display(), "artifact");
        self.intermediates.insert(key, path);
    }
}

/// One step's synthesis outcome: the audio file (if one was written) and its measured length.
struct StepAudio {
    path: Option<PathBuf>,
    duration: StepcastResult<f64>,
}

/// Sequences synthesis, timing, rendering, capture and merging for one scene at a time.
///
/// Ports are injected, so the orchestrator never knows which engines it drives. It owns the
/// scene's artifact directory for the duration of a build. Builds of different scenes can run
/// concurrently on one orchestrator.
#[derive(Debug)]
pub struct Orchestrator {
    ports: Ports,
    opts: PipelineOpts,
}

impl Orchestrator {
    /// Wire ports and options together.
    pub fn new(ports: Ports, opts: PipelineOpts) -> Self {
        Self { ports, opts }
    }

    /// Options in use.
    pub fn opts(&self) -> &PipelineOpts {
        &self.opts
    }

    /// Artifact layout for `scene_id`.
    pub fn layout(&self, scene_id: &str) -> ArtifactLayout {
        ArtifactLayout::new(&self.opts.output_dir, scene_id)
    }

    /// Load `path` and build it. Load failures become a failed result.
    pub fn build_from_path(&self, path: &Path) -> BuildResult {
        match SceneSpec::from_path(path) {
            Ok(scene) => self.build(&scene),
            Err(err) => {
                tracing::error!(path = %path.display(), "{err}");
                BuildResult::load_failure(fallback_scene_id(path), &err, false)
            }
        }
    }

    /// Validate `path` without building.
    pub fn dry_run_path(&self, path: &Path) -> BuildResult {
        match SceneSpec::from_path(path) {
            Ok(scene) => dry_run_scene(&scene),
            Err(err) => {
                tracing::warn!(path = %path.display(), "would fail: {err}");
                BuildResult::load_failure(fallback_scene_id(path), &err, true)
            }
        }
    }

    /// Validate `scene` without building. See [`dry_run_scene`].
    pub fn dry_run(&self, scene: &SceneSpec) -> BuildResult {
        dry_run_scene(scene)
    }

    /// Run every stage for `scene`.
    ///
    /// Never panics on a stage failure: the failing stage, error kind and message land in the
    /// result together with every artifact produced so far.
    #[tracing::instrument(skip_all, fields(scene = %scene.id))]
    pub fn build(&self, scene: &SceneSpec) -> BuildResult {
        let layout = self.layout(&scene.id);
        tracing::info!(
            out = %layout.root().display(),
            synthesizer = %self.ports.synthesizer.identity(),
            renderer = %self.ports.renderer.identity(),
            capture = %self.ports.capture.identity(),
            merger = %self.ports.merger.identity(),
            "build started"
        );

        let mut state = BuildState {
            stage: Stage::Loaded,
            timing: None,
            intermediates: BTreeMap::new(),
        };
        let outcome = self.run(scene, &layout, &mut state);

        match outcome {
            Ok(final_path) => {
                tracing::info!(out = %final_path.display(), "build finished");
                BuildResult {
                    scene_id: scene.id.clone(),
                    output_path: Some(final_path),
                    timing: state.timing,
                    success: true,
                    stage: Stage::Finalized,
                    failure: None,
                    intermediates: state.intermediates,
                    dry_run: false,
                }
            }
            Err(err) => {
                tracing::error!(stage = %state.stage, "build failed: {err}");
                BuildResult {
                    scene_id: scene.id.clone(),
                    output_path: None,
                    timing: state.timing,
                    success: false,
                    stage: Stage::Failed,
                    failure: Some(BuildFailure {
                        stage: state.stage,
                        kind: err.kind(),
                        message: err.to_string(),
                    }),
                    intermediates: state.intermediates,
                    dry_run: false,
                }
            }
        }
    }

    fn run(
        &self,
        scene: &SceneSpec,
        layout: &ArtifactLayout,
        state: &mut BuildState,
    ) -> StepcastResult<PathBuf> {
        state.enter(&scene.id, Stage::Loaded);
        scene.validate_structure()?;

        state.enter(&scene.id, Stage::Synthesizing);
        self.prepare_directory(layout)?;
        let (audio, durations) = self.synthesize(scene, layout, state)?;

        state.enter(&scene.id, Stage::Timed);
        let plan = TimingPlan::new(durations)?;
        check_alignment(scene, &plan)?;
        tracing::info!(
            steps = plan.len(),
            total = format_args!("{:.3}", plan.total()),
            "timing plan"
        );
        self.write_timing(scene, &plan, layout, state);
        state.timing = Some(plan.clone());

        state.enter(&scene.id, Stage::Rendered);
        let artifact = self
            .ports
            .renderer
            .render(scene, &plan, &layout.animation())?;
        state.record(KEY_ANIMATION, artifact.clone());

        state.enter(&scene.id, Stage::Captured);
        let video = self
            .ports
            .capture
            .capture(&artifact, plan.total(), &layout.video())?;
        state.record(KEY_VIDEO, video.clone());

        state.enter(&scene.id, Stage::AudioMerged);
        let narration = self
            .ports
            .merger
            .concatenate_audio(&audio, &layout.audio_concat())?;
        state.record(KEY_AUDIO_CONCAT, narration.clone());

        state.enter(&scene.id, Stage::Finalized);
        let final_path = self
            .ports
            .merger
            .merge(&video, &narration, &layout.final_output())?;
        state.record(KEY_FINAL, final_path.clone());

        Ok(final_path)
    }

    /// Create the scene directory and drop outputs of any previous build.
    fn prepare_directory(&self, layout: &ArtifactLayout) -> StepcastResult<()> {
        let io_err = |what: &str, path: &Path, e: std::io::Error| {
            StepcastError::synthesis(format!("{what} '{}': {e}", path.display()))
        };

        std::fs::create_dir_all(layout.root())
            .map_err(|e| io_err("failed to create", layout.root(), e))?;

        for stale in layout.stage_outputs() {
            match std::fs::remove_file(&stale) {
                Ok(()) => tracing::debug!(path = %stale.display(), "removed previous output"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err("failed to remove", &stale, e)),
            }
        }

        let audio_dir = layout.audio_dir();
        if !self.opts.reuse_audio && audio_dir.exists() {
            std::fs::remove_dir_all(&audio_dir)
                .map_err(|e| io_err("failed to clear", &audio_dir, e))?;
        }
        std::fs::create_dir_all(&audio_dir).map_err(|e| io_err("failed to create", &audio_dir, e))
    }

    /// Generate and measure every step, returning audio paths and durations in step order.
    fn synthesize(
        &self,
        scene: &SceneSpec,
        layout: &ArtifactLayout,
        state: &mut BuildState,
    ) -> StepcastResult<(Vec<PathBuf>, Vec<f64>)> {
        let ext = self.ports.synthesizer.output_extension();
        let dests: Vec<(PathBuf, PathBuf)> = scene
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                (
                    layout.step_audio(i, &step.id, ext),
                    layout.step_narration(i, &step.id),
                )
            })
            .collect();

        let outcomes: Vec<StepAudio> = if self.opts.parallel_synthesis {
            let pool = build_thread_pool(self.opts.synthesis_threads, "synthesis")?;
            pool.install(|| {
                scene
                    .steps
                    .par_iter()
                    .zip(dests.par_iter())
                    .map(|(step, (dest, record))| self.synthesize_step(step, dest, record))
                    .collect()
            })
        } else {
            let mut out = Vec::with_capacity(scene.steps.len());
            for (step, (dest, record)) in scene.steps.iter().zip(&dests) {
                let outcome = self.synthesize_step(step, dest, record);
                let failed = outcome.duration.is_err();
                out.push(outcome);
                if failed {
                    break;
                }
            }
            out
        };

        for (step, outcome) in scene.steps.iter().zip(&outcomes) {
            if let Some(path) = &outcome.path {
                state.record(audio_key(&step.id), path.clone());
            }
        }

        let mut audio = Vec::with_capacity(outcomes.len());
        let mut durations = Vec::with_capacity(outcomes.len());
        for (step, outcome) in scene.steps.iter().zip(outcomes) {
            let duration = outcome.duration?;
            let Some(path) = outcome.path else {
                return Err(StepcastError::synthesis(format!(
                    "step '{}' produced no audio",
                    step.id
                )));
            };
            audio.push(path);
            durations.push(duration);
        }
        Ok((audio, durations))
    }

    /// `record` holds the narration `dest` was spoken from; reuse requires a match.
    fn synthesize_step(&self, step: &Step, dest: &Path, record: &Path) -> StepAudio {
        let synth = &self.ports.synthesizer;

        let reusable = self.opts.reuse_audio
            && dest.is_file()
            && std::fs::read_to_string(record).is_ok_and(|spoken| spoken == step.narration);
        let path = if reusable {
            tracing::debug!(step = %step.id, path = %dest.display(), "reusing audio");
            dest.to_path_buf()
        } else {
            if self.opts.reuse_audio && dest.is_file() {
                tracing::info!(step = %step.id, "narration changed since last build; regenerating");
            }
            // A failed generation must not leave a record vouching for a partial file.
            if let Err(e) = std::fs::remove_file(record)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(
                    path = %record.display(),
                    error = %e,
                    "failed to drop narration record"
                );
            }
            tracing::debug!(step = %step.id, narration = %preview(&step.narration), "generating");
            match synth.generate(&step.narration, dest) {
                Ok(path) => {
                    if let Err(e) = std::fs::write(record, &step.narration) {
                        tracing::warn!(
                            path = %record.display(),
                            error = %e,
                            "failed to record narration"
                        );
                    }
                    path
                }
                Err(err) => {
                    // Engines may leave a partial file behind; keep it for inspection.
                    return StepAudio {
                        path: dest.is_file().then(|| dest.to_path_buf()),
                        duration: Err(err),
                    };
                }
            }
        };

        let duration = synth.duration(&path).and_then(|d| {
            if d.is_finite() && d > 0.0 {
                tracing::info!(step = %step.id, duration = format_args!("{d:.3}"), "measured");
                Ok(d)
            } else {
                Err(StepcastError::synthesis(format!(
                    "step '{}' measured a non-positive duration {d}",
                    step.id
                )))
            }
        });
        StepAudio {
            path: Some(path),
            duration,
        }
    }

    /// Timing record for humans and tooling; a write failure is not fatal.
    fn write_timing(
        &self,
        scene: &SceneSpec,
        plan: &TimingPlan,
        layout: &ArtifactLayout,
        state: &mut BuildState,
    ) {
        let record = TimingRecord {
            scene_id: &scene.id,
            step_durations: plan.durations(),
            total_duration: plan.total(),
            steps: scene
                .steps
                .iter()
                .zip(plan.durations())
                .map(|(step, d)| TimingStep {
                    id: &step.id,
                    duration: *d,
                    narration: &step.narration,
                })
                .collect(),
        };
        let path = layout.timing();
        let written = serde_json::to_string_pretty(&record)
            .map_err(|e| e.to_string())
            .and_then(|text| std::fs::write(&path, text).map_err(|e| e.to_string()));
        match written {
            Ok(()) => state.record(KEY_TIMING, path),
            Err(e) => tracing::warn!(path = %path.display(), "failed to write timing record: {e}"),
        }
    }
}

/// Validate `scene` (including narration content) and report whether it would build.
///
/// Needs no ports and touches nothing on disk.
#[tracing::instrument(skip_all, fields(scene = %scene.id))]
pub fn dry_run_scene(scene: &SceneSpec) -> BuildResult {
    let outcome = scene.validate();
    match &outcome {
        Ok(()) => {
            tracing::info!(steps = scene.steps.len(), "would build");
            for (i, step) in scene.steps.iter().enumerate() {
                tracing::debug!(step = %step.id, index = i, narration = %preview(&step.narration), "step");
            }
        }
        Err(err) => tracing::warn!("would fail: {err}"),
    }
    BuildResult {
        scene_id: scene.id.clone(),
        output_path: None,
        timing: None,
        success: outcome.is_ok(),
        stage: if outcome.is_ok() {
            Stage::Loaded
        } else {
            Stage::Failed
        },
        failure: outcome.err().map(|err| BuildFailure {
            stage: Stage::Loaded,
            kind: err.kind(),
            message: err.to_string(),
        }),
        intermediates: BTreeMap::new(),
        dry_run: true,
    }
}

/// First 50 characters of a narration line for logs.
fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(50).collect();
    if text.chars().nth(50).is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
