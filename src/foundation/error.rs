/// Convenience result type used across adcanvas.
pub type AdResult<T> = Result<T, AdError>;

/// Top-level error taxonomy used by the compositor, loader and editor APIs.
#[derive(thiserror::Error, Debug)]
pub enum AdError {
    /// Invalid template, color or other host-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Asset fetch or decode failures.
    #[error("asset error: {0}")]
    Asset(String),

    /// Errors raised while drawing onto a surface.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AdError {
    /// Build an [`AdError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`AdError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build an [`AdError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

impl From<serde_json::Error> for AdError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation(format!("template json: {err}"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
