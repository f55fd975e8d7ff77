use super::*;

#[test]
fn ensure_parent_dir_creates_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("a").join("b").join("out.wav");
    ensure_parent_dir(&target).unwrap();
    assert!(dir.path().join("a").join("b").is_dir());
    ensure_parent_dir(Path::new("bare.wav")).unwrap();
}

#[test]
fn extension_is_lower_cased() {
    assert_eq!(extension_of(Path::new("x/voice.AIFF")).as_deref(), Some("aiff"));
    assert_eq!(extension_of(Path::new("noext")), None);
}

#[test]
fn missing_program_is_reported_by_name() {
    let mut cmd = Command::new("stepcast-definitely-missing-tool");
    let err = run_tool(&mut cmd, "missing tool").unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("stepcast-definitely-missing-tool"), "{msg}");
    assert!(msg.contains("not found"), "{msg}");
}

#[test]
fn measuring_a_missing_file_fails_before_spawning() {
    let tools = MediaTools {
        ffmpeg: PathBuf::from("stepcast-missing-ffmpeg"),
        ffprobe: PathBuf::from("stepcast-missing-ffprobe"),
    };
    let err = tools
        .measure_duration(Path::new("/nonexistent/step.wav"))
        .unwrap_err();
    assert!(err.to_string().contains("media file not found"));
}

#[test]
fn unavailable_tool_is_detected() {
    assert!(!is_tool_available(Path::new("stepcast-definitely-missing-tool")));
}
