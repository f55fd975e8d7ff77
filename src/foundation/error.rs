/// Convenience result type used across Stepcast.
pub type StepcastResult<T> = Result<T, StepcastError>;

/// Top-level error taxonomy used by the pipeline and its ports.
#[derive(thiserror::Error, Debug)]
pub enum StepcastError {
    /// Malformed or invalid scene description. `path` names the offending field.
    #[error("load error at '{path}': {message}")]
    Load {
        /// Field path inside the scene document (`$` for the root).
        path: String,
        /// Human readable reason.
        message: String,
    },

    /// Speech generation or duration measurement failure.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Animation artifact construction failure.
    #[error("render error: {0}")]
    Render(String),

    /// Recording mechanism failure.
    #[error("capture error: {0}")]
    Capture(String),

    /// Audio concatenation or audio/video combination failure.
    #[error("merge error: {0}")]
    Merge(String),

    /// Invalid configuration or adapter construction failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Serializable discriminant of [`StepcastError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`StepcastError::Load`].
    Load,
    /// See [`StepcastError::Synthesis`].
    Synthesis,
    /// See [`StepcastError::Render`].
    Render,
    /// See [`StepcastError::Capture`].
    Capture,
    /// See [`StepcastError::Merge`].
    Merge,
    /// See [`StepcastError::Config`].
    Config,
    /// See [`StepcastError::Other`].
    Other,
}

impl StepcastError {
    /// Build a [`StepcastError::Load`] value.
    pub fn load(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Build a [`StepcastError::Synthesis`] value.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`StepcastError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`StepcastError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`StepcastError::Merge`] value.
    pub fn merge(msg: impl Into<String>) -> Self {
        Self::Merge(msg.into())
    }

    /// Build a [`StepcastError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Discriminant for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Load { .. } => ErrorKind::Load,
            Self::Synthesis(_) => ErrorKind::Synthesis,
            Self::Render(_) => ErrorKind::Render,
            Self::Capture(_) => ErrorKind::Capture,
            Self::Merge(_) => ErrorKind::Merge,
            Self::Config(_) => ErrorKind::Config,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Load => "load",
            Self::Synthesis => "synthesis",
            Self::Render => "render",
            Self::Capture => "capture",
            Self::Merge => "merge",
            Self::Config => "config",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
