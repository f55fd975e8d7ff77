use super::*;

fn two_pointer_json() -> &'static str {
    r#"{
        "id": "two_pointers",
        "title": "Two Pointers",
        "visualization": {
            "type": "array_pointers",
            "config": { "array": [1, 2, 4, 7, 11], "target": 9, "future_knob": true }
        },
        "steps": [
            { "id": "intro", "narration": "We look for two numbers summing to nine.",
              "state": { "left": 0, "right": 4, "message": "start" } },
            { "id": "move", "narration": "Eleven is too big, so move right.",
              "state": { "left": 0, "right": 3, "highlight": "right_move", "arrow": "left" } }
        ]
    }"#
}

fn load_err_path(text: &str) -> String {
    match SceneSpec::from_json_str(text).unwrap_err() {
        StepcastError::Load { path, .. } => path,
        other => panic!("expected load error, got {other}"),
    }
}

#[test]
fn parses_valid_scene_and_exposes_accessors() {
    let spec = SceneSpec::from_json_str(two_pointer_json()).unwrap();
    assert_eq!(spec.id, "two_pointers");
    assert_eq!(spec.visualization.kind, "array_pointers");
    assert_eq!(spec.step_ids(), vec!["intro", "move"]);
    assert_eq!(
        spec.narrations(),
        vec![
            "We look for two numbers summing to nine.",
            "Eleven is too big, so move right."
        ]
    );
    assert_eq!(spec.steps[1].state.right, Some(3));
    assert_eq!(spec.steps[1].state.highlight.as_deref(), Some("right_move"));
}

#[test]
fn unknown_state_and_config_keys_survive_a_roundtrip() {
    let spec = SceneSpec::from_json_str(two_pointer_json()).unwrap();
    assert_eq!(
        spec.steps[1].state.extra.get("arrow"),
        Some(&Value::String("left".to_string()))
    );
    assert_eq!(
        spec.visualization.config.get("future_knob"),
        Some(&Value::Bool(true))
    );

    let text = serde_json::to_string(&spec).unwrap();
    let again = SceneSpec::from_json_str(&text).unwrap();
    assert_eq!(again, spec);
}

#[test]
fn narration_is_not_normalized() {
    let text = two_pointer_json().replace(
        "We look for two numbers summing to nine.",
        "  Mixed CASE   spacing  ",
    );
    let spec = SceneSpec::from_json_str(&text).unwrap();
    assert_eq!(spec.steps[0].narration, "  Mixed CASE   spacing  ");
}

#[test]
fn missing_id_reports_root_field() {
    let text = two_pointer_json().replace(r#""id": "two_pointers","#, "");
    assert_eq!(load_err_path(&text), "id");
}

#[test]
fn empty_title_is_rejected() {
    let text = two_pointer_json().replace(r#""title": "Two Pointers""#, r#""title": " ""#);
    assert_eq!(load_err_path(&text), "title");
}

#[test]
fn empty_steps_are_rejected() {
    let text = r#"{"id":"s","title":"t","visualization":{"type":"array"},"steps":[]}"#;
    assert_eq!(load_err_path(text), "steps");
}

#[test]
fn blank_narration_reports_step_path() {
    let text = two_pointer_json().replace("Eleven is too big, so move right.", "   ");
    assert_eq!(load_err_path(&text), "steps[1].narration");
}

#[test]
fn duplicate_step_ids_are_rejected() {
    let text = two_pointer_json().replace(r#""id": "move""#, r#""id": "intro""#);
    let err = SceneSpec::from_json_str(&text).unwrap_err();
    assert!(err.to_string().contains("steps[1].id"));
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn mistyped_state_field_reports_state_path() {
    let text = two_pointer_json().replace(r#""left": 0, "right": 4"#, r#""left": "zero""#);
    assert_eq!(load_err_path(&text), "steps[0].state");
}

#[test]
fn scene_id_must_be_a_safe_directory_name() {
    let text = two_pointer_json().replace(r#""two_pointers""#, r#""../escape""#);
    assert_eq!(load_err_path(&text), "id");
    let text = two_pointer_json().replace(r#""two_pointers""#, r#""a/b""#);
    assert_eq!(load_err_path(&text), "id");
}

#[test]
fn malformed_json_is_a_root_load_error() {
    assert_eq!(load_err_path("{ not json"), "$");
    assert_eq!(load_err_path("[1, 2]"), "$");
}

#[test]
fn structure_check_ignores_narration_content() {
    let mut spec = SceneSpec::from_json_str(two_pointer_json()).unwrap();
    spec.steps[0].narration = String::new();
    assert!(spec.validate_structure().is_ok());
    assert!(spec.validate().is_err());
}

#[test]
fn theme_colour_overrides_are_checked_on_load() {
    let mut value: Value = serde_json::from_str(two_pointer_json()).unwrap();
    value["visualization"]["theme"] = serde_json::json!({
        "preset": "light",
        "colors": { "cell_bg": "#101010", "background": "red;" }
    });
    assert_eq!(
        load_err_path(&value.to_string()),
        "visualization.theme.colors.background"
    );

    value["visualization"]["theme"]["colors"]["background"] = Value::from("rgb(10, 20, 30)");
    let spec = SceneSpec::from_json_str(&value.to_string()).unwrap();
    assert_eq!(spec.visualization.theme.colors["background"], "rgb(10, 20, 30)");
}
