//! Errors raised by the navigation framework itself
//!
//! Lifecycle hooks report their own failures through `anyhow::Error`; the
//! variants here are the ones callers are expected to match on.

use std::fmt;

/// Which registry a lookup went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Page,
    Overlay,
    Loading,
}

impl fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenKind::Page => write!(f, "page"),
            ScreenKind::Overlay => write!(f, "overlay"),
            ScreenKind::Loading => write!(f, "loading overlay"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpaError {
    /// A screen was requested by a type id nobody registered
    #[error("Could not find a registered {kind} type with id '{type_id}'")]
    NotFound { kind: ScreenKind, type_id: String },
}

impl SpaError {
    pub fn not_found(kind: ScreenKind, type_id: impl Into<String>) -> Self {
        SpaError::NotFound {
            kind,
            type_id: type_id.into(),
        }
    }

    /// Whether `err` is a [`SpaError::NotFound`]
    pub fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<SpaError>(), Some(SpaError::NotFound { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = SpaError::not_found(ScreenKind::Overlay, "printing");
        assert_eq!(
            err.to_string(),
            "Could not find a registered overlay type with id 'printing'"
        );
    }

    #[test]
    fn test_is_not_found_through_anyhow() {
        let err: anyhow::Error = SpaError::not_found(ScreenKind::Page, "missing").into();
        assert!(SpaError::is_not_found(&err));
        assert!(!SpaError::is_not_found(&anyhow::anyhow!("other")));
    }
}
