/// Convenience result type used across flipreel.
pub type FlipreelResult<T> = Result<T, FlipreelError>;

/// Top-level error taxonomy used by export APIs.
#[derive(thiserror::Error, Debug)]
pub enum FlipreelError {
    /// Invalid user-provided settings, frames or project data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while rasterizing an instant onto the output surface.
    #[error("render error: {0}")]
    Render(String),

    /// Errors raised by a still-image codec, the GIF writer or the container muxer.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlipreelError {
    /// Build a [`FlipreelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlipreelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`FlipreelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`FlipreelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
