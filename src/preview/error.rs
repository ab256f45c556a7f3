//! Render failures.
//!
//! Every failure in the preview pipeline is a [`RenderError`]: a kind the caller can match on
//! plus a message meant for the user. None of them are fatal; the caller shows the message
//! and keeps the session running.

use std::fmt;

use thiserror::Error;

/// Classification of a render failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderErrorKind {
    /// The buffer was blank or whitespace-only.
    EmptyInput,
    /// The in-process typesetter could not lay out the markup.
    TypesetFailure,
    /// The external compiler could not be started.
    ToolchainUnavailable,
    /// The external compiler ran and failed, produced nothing, or timed out.
    CompileFailure,
    /// The compiled output could not be turned into a raster.
    ConversionFailure,
}

impl RenderErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyInput => "empty input",
            Self::TypesetFailure => "typeset failure",
            Self::ToolchainUnavailable => "toolchain unavailable",
            Self::CompileFailure => "compile failure",
            Self::ConversionFailure => "conversion failure",
        }
    }
}

impl fmt::Display for RenderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged render failure with a human-readable diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RenderError {
    pub kind: RenderErrorKind,
    pub message: String,
}

impl RenderError {
    pub fn new(kind: RenderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn empty_input() -> Self {
        Self::new(RenderErrorKind::EmptyInput, "nothing to render")
    }

    pub fn typeset(message: impl Into<String>) -> Self {
        Self::new(RenderErrorKind::TypesetFailure, message)
    }

    pub fn toolchain_unavailable(message: impl Into<String>) -> Self {
        Self::new(RenderErrorKind::ToolchainUnavailable, message)
    }

    pub fn compile(message: impl Into<String>) -> Self {
        Self::new(RenderErrorKind::CompileFailure, message)
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(RenderErrorKind::ConversionFailure, message)
    }

    pub fn kind(&self) -> RenderErrorKind {
        self.kind
    }
}

pub type RenderOutcome = Result<super::PreviewImage, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = RenderError::compile("! Undefined control sequence.");
        assert_eq!(err.to_string(), "compile failure: ! Undefined control sequence.");
        assert_eq!(err.kind(), RenderErrorKind::CompileFailure);
    }

    #[test]
    fn empty_input_has_its_own_kind() {
        assert_eq!(RenderError::empty_input().kind, RenderErrorKind::EmptyInput);
    }
}
