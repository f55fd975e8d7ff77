use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};

use crate::foundation::error::{StepcastError, StepcastResult};
use crate::scene::theme::ThemeConfig;

/// Root scene description: visualization settings plus an ordered list of narrated steps.
///
/// Constructed by [`SceneSpec::from_json_str`] / [`SceneSpec::from_path`] (which validate) and
/// treated as immutable by every pipeline stage.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneSpec {
    /// Stable identifier, also used as the artifact directory name.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Visualization type and its opaque configuration.
    pub visualization: Visualization,
    /// Narration beats in playback order.
    pub steps: Vec<Step>,
}

/// Visualization type tag plus type-specific configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Visualization {
    /// Type tag, e.g. `array_pointers` or `problem_statement`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque configuration (array values, target, ...). Passed through untouched.
    #[serde(default)]
    pub config: Map<String, Value>,
    /// Colour theme.
    #[serde(default)]
    pub theme: ThemeConfig,
}

/// One narration phrase paired with one visualization state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Step {
    /// Identifier, unique within the scene.
    pub id: String,
    /// Text handed verbatim to speech synthesis.
    pub narration: String,
    /// Visualization state shown while the narration plays.
    #[serde(default)]
    pub state: StepState,
}

/// Visualization state of a step.
///
/// The common keys are typed; anything else is kept in `extra` and serialized back unchanged.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepState {
    /// Left pointer index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<i64>,
    /// Right pointer index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<i64>,
    /// Highlight mode (`sum`, `found`, `left_move`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    /// Status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Progressive reveal marker used by problem-statement scenes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal: Option<Value>,
    /// Unknown keys, preserved losslessly.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SceneSpec {
    /// Parse and fully validate a scene document.
    pub fn from_json_str(text: &str) -> StepcastResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| StepcastError::load("$", format!("invalid JSON: {e}")))?;
        let spec = Self::from_value(&value)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Read, parse and fully validate a scene file.
    pub fn from_path(path: &Path) -> StepcastResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StepcastError::load("$", format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Convert a JSON value into a scene, reporting shape errors with their field path.
    ///
    /// Only the document shape is checked here; see [`SceneSpec::validate`] for content rules.
    pub fn from_value(value: &Value) -> StepcastResult<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| StepcastError::load("$", "scene must be a JSON object"))?;

        let id = required_str(root, "id", "id")?;
        let title = required_str(root, "title", "title")?;
        let description = match root.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(StepcastError::load("description", "expected a string")),
        };

        let viz = root
            .get("visualization")
            .ok_or_else(|| StepcastError::load("visualization", "missing field"))?
            .as_object()
            .ok_or_else(|| StepcastError::load("visualization", "expected an object"))?;
        let kind = required_str(viz, "type", "visualization.type")?;
        let config = match viz.get("config") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(m)) => m.clone(),
            Some(_) => {
                return Err(StepcastError::load(
                    "visualization.config",
                    "expected an object",
                ));
            }
        };
        let theme = match viz.get("theme") {
            None | Some(Value::Null) => ThemeConfig::default(),
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| StepcastError::load("visualization.theme", e.to_string()))?,
        };

        let steps_value = root
            .get("steps")
            .ok_or_else(|| StepcastError::load("steps", "missing field"))?
            .as_array()
            .ok_or_else(|| StepcastError::load("steps", "expected an array"))?;

        let mut steps = Vec::with_capacity(steps_value.len());
        for (i, step) in steps_value.iter().enumerate() {
            let at = format!("steps[{i}]");
            let obj = step
                .as_object()
                .ok_or_else(|| StepcastError::load(at.clone(), "expected an object"))?;
            let id = required_str(obj, "id", &format!("{at}.id"))?;
            let narration = required_str(obj, "narration", &format!("{at}.narration"))?;
            let state = match obj.get("state") {
                None | Some(Value::Null) => StepState::default(),
                Some(v @ Value::Object(_)) => serde_json::from_value(v.clone())
                    .map_err(|e| StepcastError::load(format!("{at}.state"), e.to_string()))?,
                Some(_) => {
                    return Err(StepcastError::load(
                        format!("{at}.state"),
                        "expected an object",
                    ));
                }
            };
            steps.push(Step {
                id,
                narration,
                state,
            });
        }

        Ok(Self {
            id,
            title,
            description,
            visualization: Visualization {
                kind,
                config,
                theme,
            },
            steps,
        })
    }

    /// Structural rules: identifiers, title, theme overrides, non-empty unique steps.
    pub fn validate_structure(&self) -> StepcastResult<()> {
        validate_scene_id(&self.id)?;
        if self.title.trim().is_empty() {
            return Err(StepcastError::load("title", "must not be empty"));
        }
        if self.visualization.kind.trim().is_empty() {
            return Err(StepcastError::load("visualization.type", "must not be empty"));
        }
        self.visualization.theme.validate()?;
        if self.steps.is_empty() {
            return Err(StepcastError::load("steps", "must contain at least one step"));
        }

        let mut seen = BTreeSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            if step.id.trim().is_empty() {
                return Err(StepcastError::load(format!("steps[{i}].id"), "must not be empty"));
            }
            if !seen.insert(step.id.as_str()) {
                return Err(StepcastError::load(
                    format!("steps[{i}].id"),
                    format!("duplicate step id '{}'", step.id),
                ));
            }
        }
        Ok(())
    }

    /// Structural rules plus non-empty narration on every step.
    pub fn validate(&self) -> StepcastResult<()> {
        self.validate_structure()?;
        for (i, step) in self.steps.iter().enumerate() {
            if step.narration.trim().is_empty() {
                return Err(StepcastError::load(
                    format!("steps[{i}].narration"),
                    "must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Narration strings in step order.
    pub fn narrations(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.narration.as_str()).collect()
    }

    /// Step ids in step order.
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }
}

fn required_str(obj: &Map<String, Value>, key: &str, path: &str) -> StepcastResult<String> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(StepcastError::load(path, "missing field")),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(StepcastError::load(path, "expected a string")),
    }
}

/// Scene ids name a directory, so they are limited to `[A-Za-z0-9._-]` and may not start with `.`.
fn validate_scene_id(id: &str) -> StepcastResult<()> {
    if id.trim().is_empty() {
        return Err(StepcastError::load("id", "must not be empty"));
    }
    if id.starts_with('.') {
        return Err(StepcastError::load("id", "must not start with '.'"));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(StepcastError::load(
            "id",
            format!("invalid character {bad:?} (allowed: A-Z a-z 0-9 . _ -)"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
