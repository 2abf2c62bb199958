//! The instrumentation engine
//!
//! [`Diagnostics::wrap`] takes a plain object graph and returns a wrapped
//! graph: every enumerable object-valued property is wrapped recursively and
//! in place, the root gets its own wrapper, and the wrapper's identity is
//! recorded weakly so re-wrapping an engine-produced wrapper is a no-op.
//!
//! When the activation gate is inactive, or the configuration disables
//! instrumentation, `wrap` is an identity function and the graph carries no
//! overhead at all. Invariants then go unverified; that is the production
//! tradeoff, not a defect.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::error::DiagnosticsError;
use crate::gate::ActivationGate;
use crate::object::Object;
use crate::registry::IdentityRegistry;
use crate::value::Value;

/// When the self-check runs relative to a mutating operation
///
/// Two historical variants of this engine disagreed on the point: one checked
/// only after each operation, one both before and after. The difference is
/// observable (a pre-check reports corruption before the next mutation lands,
/// a post-check reports it after), so it is an explicit option here rather
/// than a silent choice. Reads check once, after forwarding, in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckPolicy {
    /// Check once, after the operation completed (baseline: the check
    /// observes post-mutation state)
    #[default]
    AfterOnly,
    /// Additionally check before each mutating operation
    BeforeAndAfter,
}

impl CheckPolicy {
    pub(crate) fn checks_before(self) -> bool {
        matches!(self, Self::BeforeAndAfter)
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    /// Force-disable instrumentation for this engine regardless of the gate
    pub enabled: bool,
    /// Check ordering for mutating operations
    pub policy: CheckPolicy,
}

impl DiagnosticsConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With instrumentation enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// With check ordering policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: CheckPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: CheckPolicy::default(),
        }
    }
}

struct Shared {
    config: DiagnosticsConfig,
    active: bool,
    registry: RefCell<IdentityRegistry>,
    // Set while a self-check runs; suppresses nested interception so a check
    // may traverse the partly wrapped graph freely.
    in_check: Cell<bool>,
}

/// The instrumentation engine handle
///
/// Cheap to clone; clones share one identity registry and one activation
/// decision.
#[derive(Clone)]
pub struct Diagnostics {
    shared: Rc<Shared>,
}

impl Diagnostics {
    /// Engine gated by the process environment
    #[must_use]
    pub fn new(config: DiagnosticsConfig) -> Self {
        Self::with_gate(config, ActivationGate::from_env())
    }

    /// Engine with an explicitly injected gate
    #[must_use]
    pub fn with_gate(config: DiagnosticsConfig, gate: ActivationGate) -> Self {
        Self {
            shared: Rc::new(Shared {
                config,
                active: gate.is_active(),
                registry: RefCell::new(IdentityRegistry::new()),
                in_check: Cell::new(false),
            }),
        }
    }

    /// Whether this engine installs interception at all
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.active && self.shared.config.enabled
    }

    /// This engine's configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DiagnosticsConfig {
        &self.shared.config
    }

    /// Wrap an object graph
    ///
    /// Returns the object unchanged when the engine is inactive, and when
    /// the object is a wrapper this engine already produced (idempotence).
    /// Otherwise nested object-valued properties are substituted in place
    /// with their wrapped forms before the root itself is wrapped. Wrapping
    /// the same plain object twice, independently, yields two distinct
    /// wrappers: the registry guards against re-wrapping wrappers, not
    /// against wrapping a target again.
    #[must_use]
    pub fn wrap(&self, obj: Object) -> Object {
        if !self.is_active() {
            return obj;
        }
        if self.is_wrapped(&obj) {
            tracing::trace!(addr = obj.addr(), "already wrapped, returning unchanged");
            return obj;
        }
        let mut in_flight = HashSet::new();
        self.instrument(obj, &mut in_flight)
    }

    /// Wrap a value: objects are wrapped, everything else passes through
    #[must_use]
    pub fn wrap_value(&self, value: Value) -> Value {
        match value {
            Value::Object(obj) => Value::Object(self.wrap(obj)),
            other => other,
        }
    }

    /// Number of live wrappers this engine is tracking
    #[must_use]
    pub fn tracked_objects(&self) -> usize {
        let mut registry = self.shared.registry.borrow_mut();
        registry.prune();
        registry.len()
    }

    fn instrument(&self, obj: Object, in_flight: &mut HashSet<usize>) -> Object {
        in_flight.insert(obj.addr());
        for name in obj.keys() {
            if let Value::Object(child) = obj.peek(&name) {
                // A back-edge to an object currently being wrapped is left
                // alone; lazy wrap-on-read picks it up later.
                if !self.is_wrapped(&child) && !in_flight.contains(&child.addr()) {
                    let wrapped = self.instrument(child, in_flight);
                    obj.replace_value(&name, Value::Object(wrapped));
                }
            }
        }
        in_flight.remove(&obj.addr());

        let wrapper = Object::proxied(obj, self.clone());
        self.shared.registry.borrow_mut().insert(&wrapper);
        tracing::trace!(addr = wrapper.addr(), "wrapped object");
        wrapper
    }

    /// Whether this object is a live wrapper produced by this engine
    pub(crate) fn is_wrapped(&self, obj: &Object) -> bool {
        self.shared.registry.borrow().contains(obj.addr())
    }

    pub(crate) fn in_check(&self) -> bool {
        self.shared.in_check.get()
    }

    /// Run an object's self-check, suppressing re-entrant checks.
    ///
    /// A missing self-check is an integration mistake and fails fast; an
    /// invariant violation raised by the check propagates unchanged.
    pub(crate) fn run_check(&self, target: &Object) -> Result<(), DiagnosticsError> {
        if self.shared.in_check.get() {
            return Ok(());
        }
        let target = target.unwrapped();
        let check = target
            .check_fn()
            .ok_or(DiagnosticsError::MissingSelfCheck)?;
        self.shared.in_check.set(true);
        let result = check(&target);
        self.shared.in_check.set(false);
        if let Err(violation) = &result {
            tracing::debug!(%violation, "self-check failed");
        }
        result.map_err(DiagnosticsError::from)
    }

    /// Pre-mutation check, active only under [`CheckPolicy::BeforeAndAfter`]
    pub(crate) fn check_before(&self, target: &Object) -> Result<(), DiagnosticsError> {
        if self.shared.config.policy.checks_before() {
            self.run_check(target)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("active", &self.shared.active)
            .field("config", &self.shared.config)
            .finish()
    }
}
