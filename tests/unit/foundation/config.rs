use super::*;

#[test]
fn empty_file_yields_defaults() {
    let cfg = StudioConfig::from_toml_str("").unwrap();
    assert_eq!(cfg.speech.engine, SynthesizerKind::Piper);
    assert_eq!(cfg.tools.ffmpeg, PathBuf::from("ffmpeg"));
    assert_eq!(cfg.capture.width, 1280);
    assert!(cfg.output_dir.is_none());
}

#[test]
fn sections_override_individual_fields() {
    let cfg = StudioConfig::from_toml_str(
        r#"
output_dir = "build"

[tools]
ffmpeg = "/opt/ffmpeg/bin/ffmpeg"

[speech]
engine = "espeak"
voice = "en-us"
parallel = true
threads = 4

[capture]
fps = 24
"#,
    )
    .unwrap();

    assert_eq!(cfg.output_dir, Some(PathBuf::from("build")));
    assert_eq!(cfg.tools.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    assert_eq!(cfg.tools.ffprobe, PathBuf::from("ffprobe"));
    assert_eq!(cfg.speech.engine, SynthesizerKind::Espeak);
    assert_eq!(cfg.speech.voice.as_deref(), Some("en-us"));
    assert!(cfg.speech.parallel);
    assert_eq!(cfg.speech.threads, Some(4));
    assert_eq!(cfg.capture.fps, 24);
    assert_eq!(cfg.capture.height, 720);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = StudioConfig::from_toml_str("[speech]\nengin = \"say\"\n").unwrap_err();
    assert!(matches!(err, StepcastError::Config(_)));
}

#[test]
fn odd_capture_size_is_rejected() {
    let err = StudioConfig::from_toml_str("[capture]\nwidth = 1281\n").unwrap_err();
    assert!(err.to_string().contains("even"));
}

#[test]
fn discover_falls_back_to_defaults_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = StudioConfig::discover(None, dir.path()).unwrap();
    assert_eq!(cfg.capture.fps, 10);
}

#[test]
fn discover_reads_file_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(DEFAULT_CONFIG_FILE),
        "[speech]\nengine = \"say\"\n",
    )
    .unwrap();
    let cfg = StudioConfig::discover(None, dir.path()).unwrap();
    assert_eq!(cfg.speech.engine, SynthesizerKind::Say);
}

#[test]
fn capture_sandbox_flag_defaults_off() {
    assert!(!StudioConfig::from_toml_str("").unwrap().capture.no_sandbox);
    let cfg = StudioConfig::from_toml_str("[capture]\nno_sandbox = true\n").unwrap();
    assert!(cfg.capture.no_sandbox);
}

#[test]
fn speech_engine_binaries_are_configurable() {
    let defaults = StudioConfig::from_toml_str("").unwrap();
    assert_eq!(defaults.tools.say, PathBuf::from("say"));
    assert_eq!(defaults.tools.piper, PathBuf::from("piper"));
    assert_eq!(defaults.tools.espeak, PathBuf::from("espeak-ng"));

    let cfg = StudioConfig::from_toml_str(
        "[tools]\npiper = \"/opt/piper/piper\"\nespeak = \"/usr/local/bin/espeak-ng\"\n",
    )
    .unwrap();
    assert_eq!(cfg.tools.piper, PathBuf::from("/opt/piper/piper"));
    assert_eq!(cfg.tools.espeak, PathBuf::from("/usr/local/bin/espeak-ng"));
    assert_eq!(cfg.tools.say, PathBuf::from("say"));
}
