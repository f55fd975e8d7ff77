use super::*;

#[test]
fn fallback_id_prefers_directory_for_scene_json() {
    assert_eq!(
        fallback_scene_id(Path::new("scenes/two_sum/scene.json")),
        "two_sum"
    );
    assert_eq!(fallback_scene_id(Path::new("scenes/broken.json")), "broken");
    assert_eq!(fallback_scene_id(Path::new("scene.json")), "scene");
}

#[test]
fn directory_scan_finds_scene_files_sorted() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b", "a", "c/nested"] {
        let d = dir.path().join(name);
        std::fs::create_dir_all(&d).unwrap();
        std::fs::write(d.join("scene.json"), "{}").unwrap();
    }
    std::fs::write(dir.path().join("a").join("notes.json"), "{}").unwrap();

    let found = find_scene_files(dir.path()).unwrap();
    let rel: Vec<PathBuf> = found
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        rel,
        vec![
            PathBuf::from("a/scene.json"),
            PathBuf::from("b/scene.json"),
            PathBuf::from("c/nested/scene.json"),
        ]
    );
}

#[test]
fn single_file_is_returned_as_is() {
    let found = find_scene_files(Path::new("does/not/exist.json")).unwrap();
    assert_eq!(found, vec![PathBuf::from("does/not/exist.json")]);
}

#[test]
fn report_counts() {
    let ok = BuildResult {
        success: true,
        failure: None,
        ..BuildResult::load_failure("a", &StepcastError::load("$", "x"), true)
    };
    let bad = BuildResult::load_failure("b", &StepcastError::load("$", "x"), true);
    let report = BatchReport {
        results: vec![ok, bad],
    };
    assert_eq!(report.total(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(!report.all_succeeded());
    assert_eq!(report.failures().next().unwrap().scene_id, "b");
    assert!(!BatchReport::default().all_succeeded());
}
