//! The shared SDK error carrier.
//!
//! Every SDK error kind wraps an [`SdkError`]. Kind checks compare the markers
//! it carries, so they keep working after an error is type-erased, wrapped by
//! another error, or rebuilt from an [`ErrorReport`].

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::iter;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::marker::{ErrorMarker, SDK_ERROR_MARKER};
use crate::tool::{
    InvalidToolInputError, NoSuchToolError, OriginalToolError, ToolCallRepairError,
};

/// Underlying cause attached to an SDK error.
pub type ErrorCause = Arc<dyn Error + Send + Sync>;

/// Message for a possibly-missing cause.
#[must_use]
pub fn error_message(cause: Option<&dyn Error>) -> String {
    match cause {
        Some(cause) => cause.to_string(),
        None => "unknown error".to_owned(),
    }
}

#[derive(Debug, Clone)]
pub struct SdkError {
    name: Cow<'static, str>,
    message: String,
    cause: Option<ErrorCause>,
    markers: Vec<ErrorMarker>,
}

impl SdkError {
    pub fn new(name: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            cause: None,
            markers: vec![SDK_ERROR_MARKER],
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_cause(mut self, cause: ErrorCause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_marker(mut self, marker: ErrorMarker) -> Self {
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    #[must_use]
    pub fn markers(&self) -> &[ErrorMarker] {
        &self.markers
    }

    /// True when this error is an SDK error tagged with `marker`.
    #[must_use]
    pub fn has_marker(&self, marker: &ErrorMarker) -> bool {
        self.markers.contains(&SDK_ERROR_MARKER) && self.markers.contains(marker)
    }

    /// Find the first SDK error carrier in `error`'s source chain.
    #[must_use]
    pub fn find<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a SdkError> {
        carriers(error).next()
    }

    /// True when `error`, or anything in its source chain, carries `marker`.
    #[must_use]
    pub fn chain_has_marker(error: &(dyn Error + 'static), marker: &ErrorMarker) -> bool {
        carriers(error).any(|carrier| carrier.has_marker(marker))
    }

    /// True when `error`, or anything in its source chain, is an SDK error.
    ///
    /// Carriers are located by downcasting to this crate's types; an error built
    /// by a separately compiled copy of this crate is recognized only after it
    /// crosses over as an [`ErrorReport`].
    #[must_use]
    pub fn is_instance(error: &(dyn Error + 'static)) -> bool {
        Self::chain_has_marker(error, &SDK_ERROR_MARKER)
    }

    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            name: self.name.to_string(),
            message: self.message.clone(),
            cause: self.cause.as_deref().map(ToString::to_string),
            markers: self.markers.clone(),
        }
    }
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// The cause is exposed as the inner error itself rather than the `Arc`, so
// source-chain walks can downcast it.
impl Error for SdkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

fn carrier<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a SdkError> {
    if let Some(sdk) = error.downcast_ref::<SdkError>() {
        return Some(sdk);
    }
    if let Some(err) = error.downcast_ref::<NoSuchToolError>() {
        return Some(err.as_sdk_error());
    }
    if let Some(err) = error.downcast_ref::<InvalidToolInputError>() {
        return Some(err.as_sdk_error());
    }
    if let Some(err) = error.downcast_ref::<OriginalToolError>() {
        return Some(err.as_sdk_error());
    }
    error
        .downcast_ref::<ToolCallRepairError>()
        .map(ToolCallRepairError::as_sdk_error)
}

fn carriers<'a>(error: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a SdkError> {
    iter::successors(Some(error), |&err| err.source()).filter_map(carrier)
}

/// Serializable snapshot of an [`SdkError`].
///
/// The cause is flattened to its message. Markers survive verbatim, so kind
/// checks still pass on the rebuilt error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    pub markers: Vec<ErrorMarker>,
}

/// Cause rebuilt from an [`ErrorReport`]; only its message is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RemoteCause(pub String);

impl From<ErrorReport> for SdkError {
    fn from(report: ErrorReport) -> Self {
        Self {
            name: Cow::Owned(report.name),
            message: report.message,
            cause: report
                .cause
                .map(|message| Arc::new(RemoteCause(message)) as ErrorCause),
            markers: report.markers,
        }
    }
}
