//! Tagged accessor results
//!
//! Accessors never hand an error to their caller. They return either fresh
//! data or a fallback carrying the last value known locally (if any), so a
//! view can always render something and still tell stale from fresh.

use crate::error::ApiError;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// The request succeeded
    Fresh(T),
    /// The request failed; `last_known` is what the client had before
    Fallback {
        last_known: Option<T>,
        reason: String,
    },
}

impl<T> Fetched<T> {
    /// Turn an operation result into a `Fetched`, logging the failure
    pub(crate) fn recover(
        operation: &str,
        result: crate::error::Result<T>,
        last_known: Option<T>,
    ) -> Self {
        match result {
            Ok(value) => Fetched::Fresh(value),
            Err(e) => Self::failed(operation, &e, last_known),
        }
    }

    pub(crate) fn failed(operation: &str, error: &ApiError, last_known: Option<T>) -> Self {
        warn!(operation, kind = ?error.kind(), "Request failed: {}", error);
        Fetched::Fallback {
            last_known,
            reason: error.to_string(),
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Fetched::Fresh(_))
    }

    /// The fresh value, or the fallback value if there is one
    pub fn value(&self) -> Option<&T> {
        match self {
            Fetched::Fresh(v) => Some(v),
            Fetched::Fallback { last_known, .. } => last_known.as_ref(),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Fetched::Fresh(v) => Some(v),
            Fetched::Fallback { last_known, .. } => last_known,
        }
    }

    /// The value only if it is fresh
    pub fn fresh(self) -> Option<T> {
        match self {
            Fetched::Fresh(v) => Some(v),
            Fetched::Fallback { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Fresh(v) => Fetched::Fresh(f(v)),
            Fetched::Fallback { last_known, reason } => Fetched::Fallback {
                last_known: last_known.map(f),
                reason,
            },
        }
    }
}

impl<T: Default> Fetched<T> {
    /// Fresh value, fallback value, or the empty value, in that order
    pub fn into_value_or_default(self) -> T {
        self.into_value().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_keeps_last_known() {
        let err = ApiError::from_status_code(500, "boom");
        let fetched = Fetched::failed("test", &err, Some(7));
        assert!(!fetched.is_fresh());
        assert_eq!(fetched.value(), Some(&7));
        assert_eq!(fetched.clone().fresh(), None);
        assert_eq!(fetched.into_value(), Some(7));
    }

    #[test]
    fn test_empty_fallback_defaults() {
        let err = ApiError::from_status_code(500, "boom");
        let fetched: Fetched<Vec<u8>> = Fetched::failed("test", &err, None);
        assert_eq!(fetched.into_value_or_default(), Vec::<u8>::new());
    }

    #[test]
    fn test_map_preserves_tag() {
        let fresh = Fetched::Fresh(2).map(|v| v * 10);
        assert_eq!(fresh, Fetched::Fresh(20));

        let err = ApiError::SessionClosed;
        let fallback = Fetched::failed("test", &err, Some(3)).map(|v| v + 1);
        assert_eq!(fallback.value(), Some(&4));
        assert!(!fallback.is_fresh());
    }
}
