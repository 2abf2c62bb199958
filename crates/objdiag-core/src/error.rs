//! Error types for the instrumentation engine
//!
//! Three failure families, kept distinct on purpose:
//! - invariant violations, raised by a self-check and propagated untouched
//! - missing-capability errors (an intercepted object has no self-check),
//!   which signal an integration mistake rather than bad state
//! - pass-through failures of the forwarded operation itself (non-writable,
//!   non-configurable, not callable, not constructible)

/// Raised by a self-check when an object's invariants do not hold.
///
/// The engine never constructs or inspects this error; it only triggers the
/// check and lets the failure surface to whoever performed the intercepted
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invariant violated: {message}")]
pub struct InvariantViolation {
    message: String,
}

impl InvariantViolation {
    /// Create a violation with a descriptive message
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The descriptive message supplied by the self-check
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Assertion helper for writing self-checks
///
/// Returns `Ok(())` when the condition holds, otherwise an
/// [`InvariantViolation`] carrying the message.
#[inline]
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), InvariantViolation> {
    if condition {
        Ok(())
    } else {
        Err(InvariantViolation::new(message))
    }
}

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    /// A self-check reported a violated invariant
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    /// An intercepted object exposes no self-check operation
    #[error("object has no self-check operation")]
    MissingSelfCheck,

    /// Assignment to a non-writable property
    #[error("property is not writable: {0}")]
    NotWritable(String),

    /// Redefinition or deletion of a non-configurable property
    #[error("property is not configurable: {0}")]
    NotConfigurable(String),

    /// Invocation of a property that does not hold a callable
    #[error("property is not callable: {0}")]
    NotCallable(String),

    /// Construction attempted on an object without a constructor slot
    #[error("object is not constructible")]
    NotConstructible,

    /// A callable rejected the arguments it was given
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DiagnosticsError {
    /// Check if this error was raised by a self-check
    #[inline]
    #[must_use]
    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }

    /// Check if this error is a failure of the forwarded operation itself,
    /// unrelated to instrumentation
    #[inline]
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        matches!(
            self,
            Self::NotWritable(_)
                | Self::NotConfigurable(_)
                | Self::NotCallable(_)
                | Self::NotConstructible
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_passes_and_fails() {
        assert!(ensure(true, "never raised").is_ok());

        let err = ensure(false, "count must not go negative").unwrap_err();
        assert_eq!(err.message(), "count must not go negative");
        assert!(err.to_string().contains("invariant violated"));
    }

    #[test]
    fn violation_converts_into_engine_error() {
        let err: DiagnosticsError = InvariantViolation::new("broken").into();
        assert!(err.is_invariant());
        assert!(!err.is_pass_through());
    }

    #[test]
    fn pass_through_classification() {
        assert!(DiagnosticsError::NotWritable("x".to_string()).is_pass_through());
        assert!(DiagnosticsError::NotConstructible.is_pass_through());
        assert!(!DiagnosticsError::MissingSelfCheck.is_pass_through());
    }
}
