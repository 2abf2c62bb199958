//! Callables and their checked wrappers
//!
//! A [`Callable`] is a clonable handle over a function that receives an
//! explicit receiver object plus positional arguments. Reading a callable
//! property through a wrapped object yields a *checked* callable: it forwards
//! the call with receiver and arguments untouched, then runs the origin
//! object's self-check once and returns the result. Method calls are thereby
//! invariant checkpoints.

use std::fmt;
use std::rc::Rc;

use crate::engine::Diagnostics;
use crate::error::DiagnosticsError;
use crate::object::Object;
use crate::value::Value;

type CallFn = Box<dyn Fn(&Object, &[Value]) -> Result<Value, DiagnosticsError>>;

enum CallNode {
    Plain(CallFn),
    Checked {
        inner: Callable,
        origin: Object,
        engine: Diagnostics,
    },
}

/// Clonable handle over a callable value
#[derive(Clone)]
pub struct Callable {
    node: Rc<CallNode>,
}

impl Callable {
    /// Create a plain callable from a function
    ///
    /// The first argument is the receiver the callable was invoked on; it
    /// plays the role a bound `this` would in a dynamic language.
    pub fn new(
        f: impl Fn(&Object, &[Value]) -> Result<Value, DiagnosticsError> + 'static,
    ) -> Self {
        Self {
            node: Rc::new(CallNode::Plain(Box::new(f))),
        }
    }

    /// Wrap a callable so each completed call runs `origin`'s self-check
    pub(crate) fn checked(inner: Callable, origin: Object, engine: Diagnostics) -> Self {
        Self {
            node: Rc::new(CallNode::Checked {
                inner,
                origin,
                engine,
            }),
        }
    }

    /// Invoke the callable
    ///
    /// For a checked callable, the call runs first with receiver and
    /// arguments unchanged; the self-check runs only after the call
    /// completed, and its failure replaces the return value.
    pub fn call(&self, receiver: &Object, args: &[Value]) -> Result<Value, DiagnosticsError> {
        match &*self.node {
            CallNode::Plain(f) => f(receiver, args),
            CallNode::Checked {
                inner,
                origin,
                engine,
            } => {
                let out = inner.call(receiver, args)?;
                engine.run_check(origin)?;
                Ok(out)
            }
        }
    }

    /// Whether this callable carries a self-check wrapper
    #[inline]
    #[must_use]
    pub fn is_checked(&self) -> bool {
        matches!(&*self.node, CallNode::Checked { .. })
    }

    /// Reference identity comparison
    #[inline]
    #[must_use]
    pub fn ptr_eq(a: &Callable, b: &Callable) -> bool {
        Rc::ptr_eq(&a.node, &b.node)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_checked() {
            write!(f, "Callable(checked, {:p})", Rc::as_ptr(&self.node))
        } else {
            write!(f, "Callable({:p})", Rc::as_ptr(&self.node))
        }
    }
}
