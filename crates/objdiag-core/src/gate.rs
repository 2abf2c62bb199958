//! Activation gate: is this a development-like environment?
//!
//! The process-wide signal is computed once on first use and cached for the
//! process lifetime, so every wrap decision in a run is consistent. The gate
//! itself is an explicit value handed to the engine, which keeps both states
//! testable without touching process globals.

use std::env;

use once_cell::sync::OnceCell;

static PROCESS_SIGNAL: OnceCell<bool> = OnceCell::new();

/// Immutable activation decision injected into the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationGate {
    active: bool,
}

impl ActivationGate {
    /// Gate resolved from the process environment, memoized process-wide
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            active: *PROCESS_SIGNAL.get_or_init(detect),
        }
    }

    /// Explicitly active gate
    #[inline]
    #[must_use]
    pub fn active() -> Self {
        Self { active: true }
    }

    /// Explicitly inactive gate
    #[inline]
    #[must_use]
    pub fn inactive() -> Self {
        Self { active: false }
    }

    /// Whether instrumentation should be installed
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Short-circuited disjunction of environment signals. The first true signal
/// activates the gate; no signal true means inactive. An unreadable signal
/// counts as false, so resolution can never fail.
fn detect() -> bool {
    let signals: [fn() -> bool; 2] = [not_flagged_production, loopback_host];
    let active = signals.iter().any(|signal| signal());
    tracing::debug!(active, "activation gate resolved from environment");
    active
}

/// The execution context is not explicitly flagged as production. An unset
/// variable is not a production flag, so it leaves this signal true.
fn not_flagged_production() -> bool {
    !matches!(env::var("APP_ENV"), Ok(v) if v.eq_ignore_ascii_case("production"))
}

/// The host address indicates a local or loopback context.
fn loopback_host() -> bool {
    env::var("HOSTNAME")
        .map(|host| host == "localhost" || host.starts_with("127."))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_gates() {
        assert!(ActivationGate::active().is_active());
        assert!(!ActivationGate::inactive().is_active());
    }

    #[test]
    fn from_env_is_stable_across_calls() {
        assert_eq!(
            ActivationGate::from_env().is_active(),
            ActivationGate::from_env().is_active()
        );
    }

    #[test]
    fn environment_signals() {
        env::set_var("APP_ENV", "production");
        assert!(!not_flagged_production());
        env::set_var("APP_ENV", "PRODUCTION");
        assert!(!not_flagged_production());
        env::set_var("APP_ENV", "development");
        assert!(not_flagged_production());
        env::remove_var("APP_ENV");
        assert!(not_flagged_production());

        env::set_var("HOSTNAME", "localhost");
        assert!(loopback_host());
        env::set_var("HOSTNAME", "127.0.0.1");
        assert!(loopback_host());
        env::set_var("HOSTNAME", "build-farm-03");
        assert!(!loopback_host());
        env::remove_var("HOSTNAME");
        assert!(!loopback_host());
    }
}
