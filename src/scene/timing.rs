use crate::foundation::error::{StepcastError, StepcastResult};

/// Measured per-step durations (seconds), index-aligned with `SceneSpec::steps`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimingPlan {
    durations: Vec<f64>,
    total: f64,
}

impl TimingPlan {
    /// Build a plan from positive, finite durations.
    pub fn new(durations: Vec<f64>) -> StepcastResult<Self> {
        if durations.is_empty() {
            return Err(StepcastError::render("timing plan must not be empty"));
        }
        if let Some((i, d)) = durations
            .iter()
            .enumerate()
            .find(|(_, d)| !d.is_finite() || **d <= 0.0)
        {
            return Err(StepcastError::render(format!(
                "step {i} has invalid duration {d} (must be finite and > 0)"
            )));
        }
        let total = durations.iter().sum();
        Ok(Self { durations, total })
    }

    /// Durations in step order.
    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    /// Sum of all durations.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Number of steps covered.
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    /// Always false for a constructed plan; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Start offset of each step on the timeline.
    pub fn start_offsets(&self) -> Vec<f64> {
        let mut t = 0.0;
        self.durations
            .iter()
            .map(|d| {
                let start = t;
                t += d;
                start
            })
            .collect()
    }

    /// Index of the step visible at time `t` seconds. Times past the end map to the last step.
    pub fn step_at(&self, t: f64) -> usize {
        let mut end = 0.0;
        for (i, d) in self.durations.iter().enumerate() {
            end += d;
            if t < end {
                return i;
            }
        }
        self.durations.len() - 1
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/timing.rs"]
mod tests;
