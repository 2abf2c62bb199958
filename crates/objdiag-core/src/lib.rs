//! objdiag-core — transparent invariant-check instrumentation for dynamic
//! object graphs.
//!
//! Given a mutable object graph whose nodes declare a zero-argument
//! self-check, [`Diagnostics::wrap`] returns a functionally equivalent
//! wrapped graph that re-runs the relevant self-check around every structural
//! interaction: property reads, writes, definitions, deletions, method
//! invocations and construction. The wrapped code never calls the check
//! itself; invariants are declared once and verified continuously during
//! development.
//!
//! In a production-like environment (see [`ActivationGate`]) `wrap` returns
//! its input unchanged, so instrumentation costs nothing when it is off.
//!
//! # Example
//!
//! ```rust,ignore
//! use objdiag_core::{ensure, ActivationGate, Diagnostics, DiagnosticsConfig, Object};
//!
//! let counter = Object::new()
//!     .with_prop("count", 0)
//!     .with_check(|obj| {
//!         ensure(
//!             obj.peek("count").as_i64().unwrap_or(0) >= 0,
//!             "count must not go negative",
//!         )
//!     });
//!
//! let diag = Diagnostics::with_gate(DiagnosticsConfig::new(), ActivationGate::active());
//! let counter = diag.wrap(counter);
//!
//! counter.set("count", 3)?; // forwarded, then the self-check runs
//! assert!(counter.set("count", -1).is_err());
//! ```

// Core modules
pub mod callable;
pub mod engine;
pub mod error;
pub mod gate;
pub mod object;
pub mod value;

mod proxy;
mod registry;

// Re-exports for convenience
pub use callable::Callable;
pub use engine::{CheckPolicy, Diagnostics, DiagnosticsConfig};
pub use error::{ensure, DiagnosticsError, InvariantViolation};
pub use gate::ActivationGate;
pub use object::{Object, WeakObject};
pub use value::{Descriptor, Value};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with objdiag
    pub use crate::{
        ensure, ActivationGate, Callable, CheckPolicy, Descriptor, Diagnostics,
        DiagnosticsConfig, DiagnosticsError, InvariantViolation, Object, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
