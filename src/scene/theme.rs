use std::collections::BTreeMap;

use crate::foundation::error::{StepcastError, StepcastResult};

/// Colour slots understood by the animation templates.
pub const COLOR_SLOTS: [&str; 14] = [
    "background",
    "text",
    "title",
    "target",
    "cell_bg",
    "cell_border",
    "cell_text",
    "pointer_left",
    "pointer_right",
    "highlight_found",
    "highlight_sum",
    "message",
    "index_label",
    "step_indicator",
];

/// Built-in colour palettes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreset {
    /// Dark navy background, pink/teal accents.
    #[default]
    Dark,
    /// Light grey background.
    Light,
    /// Near-black background with pastel accents.
    Neetcode,
}

impl ThemePreset {
    /// Colours in [`COLOR_SLOTS`] order.
    fn palette(self) -> [&'static str; 14] {
        match self {
            Self::Dark => [
                "#1a1a2e", "#eee", "#e94560", "#16c79a", "#0f3460", "#16c79a", "#eee", "#e94560",
                "#00b4d8", "#16c79a", "#f7d716", "#f7d716", "#888", "#666",
            ],
            Self::Light => [
                "#f5f5f5", "#333", "#d63384", "#198754", "#ffffff", "#198754", "#333", "#d63384",
                "#0d6efd", "#198754", "#ffc107", "#fd7e14", "#6c757d", "#adb5bd",
            ],
            Self::Neetcode => [
                "#0a0a0f", "#e5e5e5", "#ff6b6b", "#51cf66", "#1a1a2e", "#4dabf7", "#e5e5e5",
                "#ff6b6b", "#4dabf7", "#51cf66", "#ffd43b", "#ffd43b", "#868e96", "#495057",
            ],
        }
    }
}

/// Theme selection: a preset plus optional per-slot overrides.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ThemeConfig {
    /// Base palette.
    #[serde(default)]
    pub preset: ThemePreset,
    /// Slot overrides (`cell_bg = "#123456"`). Unknown slots are kept but unused.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub colors: BTreeMap<String, String>,
}

impl ThemeConfig {
    /// Merge the preset with the overrides.
    pub fn resolve_colors(&self) -> BTreeMap<String, String> {
        let mut out: BTreeMap<String, String> = COLOR_SLOTS
            .iter()
            .zip(self.preset.palette())
            .map(|(slot, color)| ((*slot).to_string(), color.to_string()))
            .collect();
        for (slot, color) in &self.colors {
            if out.contains_key(slot) {
                out.insert(slot.clone(), color.clone());
            }
        }
        out
    }

    /// Every override must be a plain CSS value.
    pub fn validate(&self) -> StepcastResult<()> {
        for (slot, color) in &self.colors {
            if !is_plain_css_value(color) {
                return Err(StepcastError::load(
                    format!("visualization.theme.colors.{slot}"),
                    format!("not a plain css colour value: {color:?}"),
                ));
            }
        }
        Ok(())
    }
}

/// Non-empty and free of characters that could close a declaration, block or tag.
pub(crate) fn is_plain_css_value(value: &str) -> bool {
    !value.trim().is_empty()
        && !value
            .chars()
            .any(|c| matches!(c, ';' | '{' | '}' | '<' | '>' | '"' | '\\'))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/theme.rs"]
mod tests;
