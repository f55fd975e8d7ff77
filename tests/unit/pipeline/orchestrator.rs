use super::*;

/// Ports that refuse every call; enough for paths that never reach a port.
struct Refuse;

impl SpeechSynthesizer for Refuse {
    fn identity(&self) -> String {
        "refuse".into()
    }
    fn output_extension(&self) -> &'static str {
        "wav"
    }
    fn generate(&self, _text: &str, _destination: &Path) -> StepcastResult<PathBuf> {
        Err(StepcastError::synthesis("refused"))
    }
    fn duration(&self, _asset: &Path) -> StepcastResult<f64> {
        Err(StepcastError::synthesis("refused"))
    }
}

impl AnimationRenderer for Refuse {
    fn identity(&self) -> String {
        "refuse".into()
    }
    fn render(&self, _: &SceneSpec, _: &TimingPlan, _: &Path) -> StepcastResult<PathBuf> {
        Err(StepcastError::render("refused"))
    }
}

impl VideoCapture for Refuse {
    fn identity(&self) -> String {
        "refuse".into()
    }
    fn capture(&self, _: &Path, _: f64, _: &Path) -> StepcastResult<PathBuf> {
        Err(StepcastError::capture("refused"))
    }
}

impl MediaMerger for Refuse {
    fn identity(&self) -> String {
        "refuse".into()
    }
    fn concatenate_audio(&self, _: &[PathBuf], _: &Path) -> StepcastResult<PathBuf> {
        Err(StepcastError::merge("refused"))
    }
    fn merge(&self, _: &Path, _: &Path, _: &Path) -> StepcastResult<PathBuf> {
        Err(StepcastError::merge("refused"))
    }
}

fn orchestrator(out: &Path) -> Orchestrator {
    Orchestrator::new(
        Ports {
            synthesizer: Box::new(Refuse),
            renderer: Box::new(Refuse),
            capture: Box::new(Refuse),
            merger: Box::new(Refuse),
        },
        PipelineOpts {
            output_dir: out.to_path_buf(),
            ..PipelineOpts::default()
        },
    )
}

fn scene(narrations: &[&str]) -> SceneSpec {
    let steps: Vec<serde_json::Value> = narrations
        .iter()
        .enumerate()
        .map(|(i, n)| serde_json::json!({ "id": format!("s{i}"), "narration": n }))
        .collect();
    serde_json::from_value(serde_json::json!({
        "id": "demo",
        "title": "Demo",
        "visualization": { "type": "array" },
        "steps": steps,
    }))
    .unwrap()
}

#[test]
fn stage_names_are_upper_snake() {
    assert_eq!(Stage::AudioMerged.to_string(), "AUDIO_MERGED");
    assert_eq!(Stage::Loaded.to_string(), "LOADED");
    assert_eq!(
        serde_json::to_value(Stage::AudioMerged).unwrap(),
        serde_json::json!("audio_merged")
    );
}

#[test]
fn dry_run_touches_nothing_and_reports_buildable() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let result = orchestrator(&out).dry_run(&scene(&["One.", "Two."]));
    assert!(result.success);
    assert!(result.dry_run);
    assert_eq!(result.stage, Stage::Loaded);
    assert!(result.output_path.is_none());
    assert!(!out.exists());
}

#[test]
fn dry_run_checks_narration_content() {
    let dir = tempfile::tempdir().unwrap();
    let result = orchestrator(dir.path()).dry_run(&scene(&["", "  "]));
    assert!(!result.success);
    let failure = result.failure.unwrap();
    assert_eq!(failure.stage, Stage::Loaded);
    assert_eq!(failure.kind, ErrorKind::Load);
    assert!(failure.message.contains("steps[0].narration"), "{}", failure.message);
}

#[test]
fn synthesis_failure_is_reported_with_stage_and_kind() {
    let dir = tempfile::tempdir().unwrap();
    let result = orchestrator(dir.path()).build(&scene(&["Hello."]));
    assert!(!result.success);
    assert_eq!(result.stage, Stage::Failed);
    assert!(result.timing.is_none());
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Synthesizing);
    assert_eq!(failure.kind, ErrorKind::Synthesis);
    assert_eq!(result.error_message(), Some("synthesis error: refused"));
    assert!(dir.path().join("demo").join("audio").is_dir());
}

#[test]
fn structural_problems_fail_in_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = scene(&["a", "b"]);
    spec.steps[1].id = "s0".into();
    let result = orchestrator(dir.path()).build(&spec);
    let failure = result.failure.unwrap();
    assert_eq!(failure.stage, Stage::Loaded);
    assert_eq!(failure.kind, ErrorKind::Load);
    assert!(!dir.path().join("demo").exists());
}

#[test]
fn previous_stage_outputs_are_cleared_on_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path());
    let layout = orch.layout("demo");
    std::fs::create_dir_all(layout.audio_dir()).unwrap();
    std::fs::write(layout.animation(), "old").unwrap();
    std::fs::write(layout.audio_dir().join("009_stale.wav"), "old").unwrap();

    let result = orch.build(&scene(&["Hello."]));
    assert!(!result.success);
    assert!(!layout.animation().exists());
    assert!(!layout.audio_dir().join("009_stale.wav").exists());
}

#[test]
fn load_failure_result_carries_fallback_id() {
    let err = StepcastError::load("id", "missing field");
    let result = BuildResult::load_failure("broken", &err, false);
    assert_eq!(result.scene_id, "broken");
    assert_eq!(result.failure.as_ref().unwrap().kind, ErrorKind::Load);
    assert_eq!(result.error_message(), Some("load error at 'id': missing field"));
}

#[test]
fn preview_truncates_long_narration() {
    assert_eq!(preview("short"), "short");
    let long = "x".repeat(60);
    assert_eq!(preview(&long), format!("{}...", "x".repeat(50)));
}

#[test]
fn unusable_theme_colour_fails_dry_run_and_build_before_synthesis() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = scene(&["One."]);
    spec.visualization
        .theme
        .colors
        .insert("background".into(), "red;".into());

    let dry = dry_run_scene(&spec);
    assert!(!dry.success);
    assert!(
        dry.error_message()
            .unwrap()
            .contains("visualization.theme.colors.background")
    );

    let result = orchestrator(dir.path()).build(&spec);
    let failure = result.failure.unwrap();
    assert_eq!(failure.stage, Stage::Loaded);
    assert_eq!(failure.kind, ErrorKind::Load);
    assert!(!dir.path().join("demo").exists());
}
