use super::*;

#[test]
fn paths_are_namespaced_by_scene_and_step() {
    let layout = ArtifactLayout::new(Path::new("/out"), "two_pointers");
    assert_eq!(layout.root(), Path::new("/out/two_pointers"));
    assert_eq!(
        layout.step_audio(0, "intro", "wav"),
        PathBuf::from("/out/two_pointers/audio/000_intro.wav")
    );
    assert_eq!(
        layout.step_audio(12, "move right", "mp3"),
        PathBuf::from("/out/two_pointers/audio/012_move_right.mp3")
    );
    assert_eq!(
        layout.step_narration(12, "move right"),
        PathBuf::from("/out/two_pointers/audio/012_move_right.narration")
    );
    assert_eq!(layout.timing(), PathBuf::from("/out/two_pointers/timing.json"));
    assert_eq!(layout.animation(), PathBuf::from("/out/two_pointers/animation.html"));
    assert_eq!(layout.video(), PathBuf::from("/out/two_pointers/capture.mp4"));
    assert_eq!(layout.audio_concat(), PathBuf::from("/out/two_pointers/narration.m4a"));
    assert_eq!(layout.final_output(), PathBuf::from("/out/two_pointers/final.mp4"));
}

#[test]
fn different_scenes_never_share_a_directory() {
    let a = ArtifactLayout::new(Path::new("out"), "a");
    let b = ArtifactLayout::new(Path::new("out"), "b");
    assert_ne!(a.root(), b.root());
    assert!(a.stage_outputs().iter().all(|p| p.starts_with(a.root())));
}

#[test]
fn sanitize_keeps_safe_characters_only() {
    assert_eq!(sanitize_component("step-1.a_b"), "step-1.a_b");
    assert_eq!(sanitize_component("../etc/passwd"), ".._etc_passwd");
    assert_eq!(sanitize_component("naïve step"), "na_ve_step");
    assert_eq!(sanitize_component(""), "_");
    assert_eq!(sanitize_component(".."), "__");
}

#[test]
fn audio_keys_use_the_raw_step_id() {
    assert_eq!(audio_key("move right"), "audio/move right");
}
