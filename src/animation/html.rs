use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::animation::{AnimationRenderer, check_alignment};
use crate::foundation::error::{StepcastError, StepcastResult};
use crate::media::tools::ensure_parent_dir;
use crate::scene::model::{SceneSpec, StepState};
use crate::scene::theme::is_plain_css_value;
use crate::scene::timing::TimingPlan;

const TEMPLATE: &str = include_str!("template.html");

const TITLE_SLOT: &str = "__STEPCAST_TITLE__";
const THEME_SLOT: &str = "__STEPCAST_THEME_CSS__";
const DURATION_SLOT: &str = "__STEPCAST_DURATION__";
const DATA_SLOT: &str = "__STEPCAST_DATA__";

/// Page layout chosen from the visualization type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Array cells with left/right pointers (`array`, `array_pointers`, and anything unknown).
    Array,
    /// Problem card revealed section by section.
    ProblemStatement,
}

impl Layout {
    /// Layout for a visualization type tag.
    pub fn for_kind(kind: &str) -> Self {
        match kind {
            "problem_statement" => Self::ProblemStatement,
            _ => Self::Array,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::ProblemStatement => "problem_statement",
        }
    }
}

#[derive(serde::Serialize)]
struct StepData<'a> {
    id: &'a str,
    narration: &'a str,
    state: &'a StepState,
}

#[derive(serde::Serialize)]
struct DocumentData<'a> {
    scene_id: &'a str,
    layout: &'static str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    config: &'a Map<String, Value>,
    steps: Vec<StepData<'a>>,
    durations: &'a [f64],
    starts: Vec<f64>,
    total: f64,
}

/// Renders a scene into one HTML file with inline CSS, data and timeline script.
///
/// The page raises `window.animationReady` / `data-animation-ready="true"` once the first state
/// is painted and publishes the plan total as `window.animationDuration` /
/// `data-animation-duration`. Loading it with `#t=<seconds>` paints the state at that instant
/// without starting the clock.
#[derive(Clone, Debug, Default)]
pub struct HtmlAnimation {}

impl HtmlAnimation {
    /// Create the renderer.
    pub fn new() -> Self {
        Self {}
    }

    /// Full document text for `scene` laid out on `timing`.
    pub fn document(&self, scene: &SceneSpec, timing: &TimingPlan) -> StepcastResult<String> {
        check_alignment(scene, timing)?;

        let data = DocumentData {
            scene_id: &scene.id,
            layout: Layout::for_kind(&scene.visualization.kind).as_str(),
            title: &scene.title,
            description: scene.description.as_deref(),
            config: &scene.visualization.config,
            steps: scene
                .steps
                .iter()
                .map(|s| StepData {
                    id: &s.id,
                    narration: &s.narration,
                    state: &s.state,
                })
                .collect(),
            durations: timing.durations(),
            starts: timing.start_offsets(),
            total: timing.total(),
        };
        let json = serde_json::to_string(&data)
            .map_err(|e| StepcastError::render(format!("failed to encode scene data: {e}")))?;

        let theme = theme_css(&scene.visualization.theme.resolve_colors())?;
        let title = escape_html(&scene.title);
        let duration = format_seconds(timing.total());
        let data = escape_script_json(&json);

        Ok(fill_template(
            TEMPLATE,
            &[
                (TITLE_SLOT, title.as_str()),
                (THEME_SLOT, theme.as_str()),
                (DURATION_SLOT, duration.as_str()),
                (DATA_SLOT, data.as_str()),
            ],
        ))
    }
}

impl AnimationRenderer for HtmlAnimation {
    fn identity(&self) -> String {
        "html".to_string()
    }

    #[tracing::instrument(skip_all, fields(scene = %scene.id))]
    fn render(
        &self,
        scene: &SceneSpec,
        timing: &TimingPlan,
        destination: &Path,
    ) -> StepcastResult<PathBuf> {
        let doc = self.document(scene, timing)?;
        ensure_parent_dir(destination).map_err(|e| StepcastError::render(format!("{e:#}")))?;
        std::fs::write(destination, doc).map_err(|e| {
            StepcastError::render(format!("failed to write '{}': {e}", destination.display()))
        })?;
        tracing::debug!(
            out = %destination.display(),
            layout = Layout::for_kind(&scene.visualization.kind).as_str(),
            "animation written"
        );
        Ok(destination.to_path_buf())
    }
}

/// Seconds as written into the duration attribute.
pub fn format_seconds(sec: f64) -> String {
    format!("{sec:.3}")
}

/// `:root` custom properties, one per colour slot (`--cell-bg: #0f3460;`).
fn theme_css(colors: &BTreeMap<String, String>) -> StepcastResult<String> {
    let mut out = String::from(":root {\n");
    for (slot, color) in colors {
        if !is_plain_css_value(color) {
            return Err(StepcastError::render(format!(
                "theme colour for '{slot}' is not a plain css value: {color:?}"
            )));
        }
        out.push_str(&format!("  --{}: {};\n", slot.replace('_', "-"), color.trim()));
    }
    out.push('}');
    Ok(out)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON inside `<script>` must never contain a closing tag sequence.
fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

/// Single left-to-right pass, so substituted values are never rescanned for slots.
fn fill_template(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = slots
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|at| (at, *key, *value)))
            .min_by_key(|(at, _, _)| *at);
        match next {
            Some((at, key, value)) => {
                out.push_str(&rest[..at]);
                out.push_str(value);
                rest = &rest[at + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/html.rs"]
mod tests;
