use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace shared by every SDK error marker.
pub const MARKER_NAMESPACE: &str = "settle.error";

/// Marker carried by every [`SdkError`](crate::SdkError).
pub const SDK_ERROR_MARKER: ErrorMarker = ErrorMarker::new(MARKER_NAMESPACE);

/// A namespaced tag identifying an error kind.
///
/// Two markers are equal when their text is equal. Nothing about the Rust type
/// that produced the marker takes part in the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMarker(Cow<'static, str>);

impl ErrorMarker {
    #[must_use]
    pub const fn new(marker: &'static str) -> Self {
        Self(Cow::Borrowed(marker))
    }

    /// Build a marker from text that arrived at runtime (e.g. a deserialized report).
    #[must_use]
    pub fn owned(marker: impl Into<String>) -> Self {
        Self(Cow::Owned(marker.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when this marker sits inside the SDK namespace.
    #[must_use]
    pub fn is_sdk_marker(&self) -> bool {
        self.as_str()
            .strip_prefix(MARKER_NAMESPACE)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }
}

impl fmt::Display for ErrorMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorMarker, MARKER_NAMESPACE, SDK_ERROR_MARKER};

    #[test]
    fn borrowed_and_owned_markers_compare_by_text() {
        let borrowed = ErrorMarker::new("settle.error.AI_NoSuchToolError");
        let owned = ErrorMarker::owned(format!("{MARKER_NAMESPACE}.AI_NoSuchToolError"));
        assert_eq!(borrowed, owned);
    }

    #[test]
    fn namespace_membership() {
        assert!(SDK_ERROR_MARKER.is_sdk_marker());
        assert!(ErrorMarker::new("settle.error.AI_ToolCallRepairError").is_sdk_marker());
        assert!(!ErrorMarker::new("settle.errors.Other").is_sdk_marker());
        assert!(!ErrorMarker::new("other.error").is_sdk_marker());
    }
}
