//! Structural interception for wrapped objects
//!
//! Each operation forwards to the target first and runs the target's
//! self-check only once the forwarded operation completed; a pass-through
//! failure (non-writable, non-configurable) propagates unchanged and
//! suppresses the check. Under [`CheckPolicy::BeforeAndAfter`] mutating
//! operations additionally check before forwarding.
//!
//! While a self-check is running, operations through wrappers of the same
//! engine forward without further checks or lazy wrapping.
//!
//! [`CheckPolicy::BeforeAndAfter`]: crate::CheckPolicy::BeforeAndAfter

use crate::callable::Callable;
use crate::error::DiagnosticsError;
use crate::object::{Object, ProxyState};
use crate::value::{Descriptor, Value};

pub(crate) fn get(state: &ProxyState, name: &str) -> Result<Value, DiagnosticsError> {
    let ProxyState { target, engine } = state;
    if engine.in_check() {
        return target.get(name);
    }

    let value = target.get(name)?;
    engine.run_check(target)?;
    Ok(post_process(state, name, value))
}

/// Reads never hand out uninstrumented handles: callables come back checked,
/// and an object value that is not yet wrapped is wrapped on the fly, with
/// the wrapped form substituted back into the target so later reads observe
/// the same wrapper.
fn post_process(state: &ProxyState, name: &str, value: Value) -> Value {
    match value {
        Value::Callable(callable) => Value::Callable(Callable::checked(
            callable,
            state.target.clone(),
            state.engine.clone(),
        )),
        Value::Object(obj) if !state.engine.is_wrapped(&obj) => {
            let wrapped = state.engine.wrap(obj);
            state
                .target
                .replace_value(name, Value::Object(wrapped.clone()));
            Value::Object(wrapped)
        }
        other => other,
    }
}

pub(crate) fn set(state: &ProxyState, name: &str, value: Value) -> Result<(), DiagnosticsError> {
    let ProxyState { target, engine } = state;
    if engine.in_check() {
        return target.set_value(name, value);
    }

    engine.check_before(target)?;
    // Newly attached subgraphs become instrumented transparently.
    let value = engine.wrap_value(value);
    target.set_value(name, value)?;
    engine.run_check(target)
}

pub(crate) fn define(
    state: &ProxyState,
    name: &str,
    descriptor: Descriptor,
) -> Result<(), DiagnosticsError> {
    let ProxyState { target, engine } = state;
    if engine.in_check() {
        return target.define(name, descriptor);
    }

    engine.check_before(target)?;
    target.define(name, descriptor)?;
    engine.run_check(target)
}

pub(crate) fn delete(state: &ProxyState, name: &str) -> Result<(), DiagnosticsError> {
    let ProxyState { target, engine } = state;
    if engine.in_check() {
        return target.delete(name);
    }

    engine.check_before(target)?;
    target.delete(name)?;
    engine.run_check(target)
}

pub(crate) fn construct(state: &ProxyState, args: &[Value]) -> Result<Object, DiagnosticsError> {
    let ProxyState { target, engine } = state;

    let instance = target.construct(args)?;
    // The freshly built instance must verify its own invariants before it is
    // handed to the caller.
    engine.run_check(&instance)?;
    Ok(instance)
}
