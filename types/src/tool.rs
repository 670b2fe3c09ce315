//! Tool call error kinds.
//!
//! A model can ask for a tool that does not exist, or call a real tool with input
//! that fails validation. When a repair step tries to fix either and fails too,
//! the result is a [`ToolCallRepairError`] holding the original failure.

use std::error::Error;
use std::fmt;

use thiserror::Error;

use crate::error::{ErrorCause, SdkError, error_message};
use crate::marker::ErrorMarker;

// ============================================================================
// NoSuchToolError
// ============================================================================

/// The model called a tool that is not registered.
#[derive(Debug, Clone)]
pub struct NoSuchToolError {
    base: SdkError,
    tool_name: String,
    available_tools: Option<Vec<String>>,
}

impl NoSuchToolError {
    pub const NAME: &'static str = "AI_NoSuchToolError";
    pub const MARKER: ErrorMarker = ErrorMarker::new("settle.error.AI_NoSuchToolError");

    pub fn new(tool_name: impl Into<String>, available_tools: Option<Vec<String>>) -> Self {
        let tool_name = tool_name.into();
        let message = match &available_tools {
            Some(tools) => format!(
                "Model tried to call unavailable tool '{tool_name}'. Available tools: {}.",
                tools.join(", ")
            ),
            None => {
                format!("Model tried to call unavailable tool '{tool_name}'. No tools are available.")
            }
        };
        Self {
            base: SdkError::new(Self::NAME, message).with_marker(Self::MARKER),
            tool_name,
            available_tools,
        }
    }

    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    #[must_use]
    pub fn available_tools(&self) -> Option<&[String]> {
        self.available_tools.as_deref()
    }

    #[must_use]
    pub fn as_sdk_error(&self) -> &SdkError {
        &self.base
    }

    #[must_use]
    pub fn is_instance(error: &(dyn Error + 'static)) -> bool {
        SdkError::chain_has_marker(error, &Self::MARKER)
    }
}

impl fmt::Display for NoSuchToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.message())
    }
}

impl Error for NoSuchToolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.base.source()
    }
}

impl From<NoSuchToolError> for SdkError {
    fn from(err: NoSuchToolError) -> Self {
        err.base
    }
}

// ============================================================================
// InvalidToolInputError
// ============================================================================

/// A tool was called with input that could not be parsed or validated.
#[derive(Debug, Clone)]
pub struct InvalidToolInputError {
    base: SdkError,
    tool_name: String,
    tool_input: String,
}

impl InvalidToolInputError {
    pub const NAME: &'static str = "AI_InvalidToolInputError";
    pub const MARKER: ErrorMarker = ErrorMarker::new("settle.error.AI_InvalidToolInputError");

    pub fn new(
        tool_name: impl Into<String>,
        tool_input: impl Into<String>,
        cause: ErrorCause,
    ) -> Self {
        let tool_name = tool_name.into();
        let detail: &dyn Error = &*cause;
        let message = format!(
            "Invalid input for tool {tool_name}: {}",
            error_message(Some(detail))
        );
        Self {
            base: SdkError::new(Self::NAME, message)
                .with_marker(Self::MARKER)
                .with_cause(cause),
            tool_name,
            tool_input: tool_input.into(),
        }
    }

    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Raw input text exactly as the model produced it.
    #[must_use]
    pub fn tool_input(&self) -> &str {
        &self.tool_input
    }

    #[must_use]
    pub fn as_sdk_error(&self) -> &SdkError {
        &self.base
    }

    #[must_use]
    pub fn is_instance(error: &(dyn Error + 'static)) -> bool {
        SdkError::chain_has_marker(error, &Self::MARKER)
    }
}

impl fmt::Display for InvalidToolInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.message())
    }
}

impl Error for InvalidToolInputError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.base.source()
    }
}

impl From<InvalidToolInputError> for SdkError {
    fn from(err: InvalidToolInputError) -> Self {
        err.base
    }
}

// ============================================================================
// ToolCallRepairError
// ============================================================================

/// The tool call failure a repair attempt started from.
#[derive(Debug, Clone, Error)]
pub enum OriginalToolError {
    #[error(transparent)]
    NoSuchTool(#[from] NoSuchToolError),
    #[error(transparent)]
    InvalidToolInput(#[from] InvalidToolInputError),
}

impl OriginalToolError {
    #[must_use]
    pub fn tool_name(&self) -> &str {
        match self {
            Self::NoSuchTool(err) => err.tool_name(),
            Self::InvalidToolInput(err) => err.tool_name(),
        }
    }

    #[must_use]
    pub fn as_sdk_error(&self) -> &SdkError {
        match self {
            Self::NoSuchTool(err) => err.as_sdk_error(),
            Self::InvalidToolInput(err) => err.as_sdk_error(),
        }
    }
}

/// Repairing a failed tool call failed as well.
#[derive(Debug, Clone)]
pub struct ToolCallRepairError {
    base: SdkError,
    original_error: OriginalToolError,
}

impl ToolCallRepairError {
    pub const NAME: &'static str = "AI_ToolCallRepairError";
    pub const MARKER: ErrorMarker = ErrorMarker::new("settle.error.AI_ToolCallRepairError");

    pub fn new(cause: ErrorCause, original_error: impl Into<OriginalToolError>) -> Self {
        let detail: &dyn Error = &*cause;
        let message = format!("Error repairing tool call: {}", error_message(Some(detail)));
        Self {
            base: SdkError::new(Self::NAME, message)
                .with_marker(Self::MARKER)
                .with_cause(cause),
            original_error: original_error.into(),
        }
    }

    /// Replace the generated message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.base = self.base.with_message(message);
        self
    }

    #[must_use]
    pub fn original_error(&self) -> &OriginalToolError {
        &self.original_error
    }

    #[must_use]
    pub fn as_sdk_error(&self) -> &SdkError {
        &self.base
    }

    #[must_use]
    pub fn is_instance(error: &(dyn Error + 'static)) -> bool {
        SdkError::chain_has_marker(error, &Self::MARKER)
    }
}

impl fmt::Display for ToolCallRepairError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.message())
    }
}

impl Error for ToolCallRepairError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.base.source()
    }
}

impl From<ToolCallRepairError> for SdkError {
    fn from(err: ToolCallRepairError) -> Self {
        err.base
    }
}
