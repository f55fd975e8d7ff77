//! Stepcast turns declarative algorithm walkthroughs into narrated videos.
//!
//! A scene (`scene.json`) lists narration steps, each paired with a visualization state. The
//! pipeline is audio-first: the speech for every step is synthesized and measured before anything
//! is drawn, and those measured durations drive the animation so each visual transition lands on
//! its spoken phrase.
//!
//! # Pipeline overview
//!
//! 1. **Load**: `scene.json -> SceneSpec` (validated, immutable)
//! 2. **Synthesize**: per step, [`SpeechSynthesizer::generate`] then [`SpeechSynthesizer::duration`]
//! 3. **Time**: durations -> [`TimingPlan`] (index-aligned with the steps)
//! 4. **Render**: [`AnimationRenderer`] writes a self-contained HTML timeline
//! 5. **Capture**: [`VideoCapture`] records it for the plan total plus a safety margin
//! 6. **Merge**: [`MediaMerger`] concatenates the narration and muxes it over the video, holding
//!    the last frame when the narration runs longer
//!
//! Every stage sits behind a port trait, chosen at runtime through a `create_*` factory, and the
//! [`Orchestrator`] only ever talks to the traits. External tools (`ffmpeg`, `ffprobe`, Chromium,
//! speech engines) are invoked as subprocesses; their locations come from [`StudioConfig`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod capture;
mod foundation;
mod media;
mod pipeline;
mod scene;
mod speech;

pub use animation::html::{Layout, format_seconds};
pub use animation::{AnimationKind, AnimationRenderer, HtmlAnimation, create_renderer};
pub use capture::{
    CAPTURE_SAFETY_MARGIN_SEC, CaptureKind, ChromiumCapture, ChromiumCaptureOpts, VideoCapture,
    capture_seconds, create_capture, frame_count,
};
pub use foundation::config::{
    CaptureConfig, DEFAULT_CONFIG_FILE, SpeechConfig, StudioConfig, ToolsConfig,
};
pub use foundation::error::{ErrorKind, StepcastError, StepcastResult};
pub use media::ffmpeg::FfmpegMerger;
pub use media::merge::{MediaMerger, MergerKind, create_merger};
pub use media::tools::{MediaTools, is_tool_available};
pub use pipeline::batch::{
    BatchOpts, BatchReport, SCENE_FILE_NAME, build_batch, dry_run_batch, fallback_scene_id,
    find_scene_files,
};
pub use pipeline::layout::{ArtifactLayout, audio_key, sanitize_component};
pub use pipeline::orchestrator::{
    BuildFailure, BuildResult, Orchestrator, PipelineOpts, Ports, Stage, dry_run_scene,
};
pub use scene::model::{SceneSpec, Step, StepState, Visualization};
pub use scene::theme::{COLOR_SLOTS, ThemeConfig, ThemePreset};
pub use scene::timing::TimingPlan;
pub use speech::{
    EngineBinaries, EspeakSynthesizer, OpenAiSynthesizer, PiperSynthesizer, SaySynthesizer,
    SpeechSynthesizer, SynthesizerKind, SynthesizerOpts, create_synthesizer,
};
