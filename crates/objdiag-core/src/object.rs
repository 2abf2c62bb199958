//! Dynamic objects and the wrapped-object handle
//!
//! [`Object`] is a clonable reference handle over either a *plain* node (a
//! property table plus optional self-check and constructor slots) or a
//! *proxied* node produced by [`Diagnostics::wrap`](crate::Diagnostics::wrap).
//! Both share one operation surface, so a wrapped object can stand anywhere a
//! plain one could; interception happens exactly when the node is proxied.
//!
//! Identity is reference identity of the handle's allocation, never
//! structural equality. A proxy is a distinct identity from its target and is
//! bound to exactly one target for its whole lifetime.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::callable::Callable;
use crate::engine::Diagnostics;
use crate::error::{DiagnosticsError, InvariantViolation};
use crate::proxy;
use crate::value::{Descriptor, Value};

pub(crate) type CheckFn = Rc<dyn Fn(&Object) -> Result<(), InvariantViolation>>;
pub(crate) type ConstructFn = Rc<dyn Fn(&[Value]) -> Result<Object, DiagnosticsError>>;

/// Backing storage of a plain object
#[derive(Default)]
pub(crate) struct ObjectData {
    props: IndexMap<String, Descriptor>,
    check: Option<CheckFn>,
    construct: Option<ConstructFn>,
}

impl ObjectData {
    fn get(&self, name: &str) -> Value {
        self.props
            .get(name)
            .map_or(Value::Null, |prop| prop.value.clone())
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), DiagnosticsError> {
        match self.props.get_mut(name) {
            Some(prop) if !prop.writable => Err(DiagnosticsError::NotWritable(name.to_string())),
            Some(prop) => {
                prop.value = value;
                Ok(())
            }
            None => {
                self.props.insert(name.to_string(), Descriptor::new(value));
                Ok(())
            }
        }
    }

    fn define(&mut self, name: &str, descriptor: Descriptor) -> Result<(), DiagnosticsError> {
        match self.props.get(name) {
            Some(prop) if !prop.configurable => {
                Err(DiagnosticsError::NotConfigurable(name.to_string()))
            }
            _ => {
                self.props.insert(name.to_string(), descriptor);
                Ok(())
            }
        }
    }

    fn delete(&mut self, name: &str) -> Result<(), DiagnosticsError> {
        match self.props.get(name) {
            // Deleting an absent property succeeds, as plain deletion would.
            None => Ok(()),
            Some(prop) if !prop.configurable => {
                Err(DiagnosticsError::NotConfigurable(name.to_string()))
            }
            Some(_) => {
                self.props.shift_remove(name);
                Ok(())
            }
        }
    }

    fn enumerable_keys(&self) -> Vec<String> {
        self.props
            .iter()
            .filter(|(_, prop)| prop.enumerable)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn has(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }
}

pub(crate) struct ProxyState {
    pub(crate) target: Object,
    pub(crate) engine: Diagnostics,
}

pub(crate) enum Node {
    Plain(RefCell<ObjectData>),
    Proxied(ProxyState),
}

/// Clonable handle over a dynamic object, plain or wrapped
#[derive(Clone)]
pub struct Object {
    pub(crate) node: Rc<Node>,
}

impl Object {
    /// Create an empty plain object
    #[must_use]
    pub fn new() -> Self {
        Self {
            node: Rc::new(Node::Plain(RefCell::new(ObjectData::default()))),
        }
    }

    pub(crate) fn proxied(target: Object, engine: Diagnostics) -> Self {
        Self {
            node: Rc::new(Node::Proxied(ProxyState { target, engine })),
        }
    }

    /// Add a property with default attributes (builder style)
    #[must_use]
    pub fn with_prop(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.replace_value(&name.into(), value.into());
        self
    }

    /// Add a callable property (builder style)
    #[must_use]
    pub fn with_method(
        self,
        name: impl Into<String>,
        f: impl Fn(&Object, &[Value]) -> Result<Value, DiagnosticsError> + 'static,
    ) -> Self {
        self.replace_value(&name.into(), Value::Callable(Callable::new(f)));
        self
    }

    /// Attach the self-check operation (builder style)
    ///
    /// The engine invokes the check with the *plain target* as its only
    /// argument, so a check reads its own state without passing back through
    /// interception.
    #[must_use]
    pub fn with_check(
        self,
        f: impl Fn(&Object) -> Result<(), InvariantViolation> + 'static,
    ) -> Self {
        {
            let target = self.unwrapped();
            if let Node::Plain(cell) = &*target.node {
                cell.borrow_mut().check = Some(Rc::new(f));
            }
        }
        self
    }

    /// Attach a constructor slot (builder style)
    #[must_use]
    pub fn with_constructor(
        self,
        f: impl Fn(&[Value]) -> Result<Object, DiagnosticsError> + 'static,
    ) -> Self {
        {
            let target = self.unwrapped();
            if let Node::Plain(cell) = &*target.node {
                cell.borrow_mut().construct = Some(Rc::new(f));
            }
        }
        self
    }

    /// Read a property
    ///
    /// On a wrapped object this is an intercepted read: the value is
    /// forwarded, the self-check runs, callables come back checked and
    /// not-yet-wrapped object values are wrapped on the fly. A missing
    /// property reads as [`Value::Null`].
    pub fn get(&self, name: &str) -> Result<Value, DiagnosticsError> {
        match &*self.node {
            Node::Plain(cell) => Ok(cell.borrow().get(name)),
            Node::Proxied(state) => proxy::get(state, name),
        }
    }

    /// Write a property
    ///
    /// On a wrapped object the value is wrapped first if it is a
    /// not-yet-wrapped object, then forwarded; the self-check runs after the
    /// write completed. A failed forward (non-writable property) propagates
    /// and suppresses the post-check.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), DiagnosticsError> {
        self.set_value(name, value.into())
    }

    pub(crate) fn set_value(&self, name: &str, value: Value) -> Result<(), DiagnosticsError> {
        match &*self.node {
            Node::Plain(cell) => cell.borrow_mut().set(name, value),
            Node::Proxied(state) => proxy::set(state, name, value),
        }
    }

    /// Define a property with explicit attributes
    pub fn define(&self, name: &str, descriptor: Descriptor) -> Result<(), DiagnosticsError> {
        match &*self.node {
            Node::Plain(cell) => cell.borrow_mut().define(name, descriptor),
            Node::Proxied(state) => proxy::define(state, name, descriptor),
        }
    }

    /// Delete a property
    pub fn delete(&self, name: &str) -> Result<(), DiagnosticsError> {
        match &*self.node {
            Node::Plain(cell) => cell.borrow_mut().delete(name),
            Node::Proxied(state) => proxy::delete(state, name),
        }
    }

    /// Invoke a callable property with this object as receiver
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, DiagnosticsError> {
        match self.get(name)? {
            Value::Callable(c) => c.call(self, args),
            _ => Err(DiagnosticsError::NotCallable(name.to_string())),
        }
    }

    /// Construct a new instance via the constructor slot
    ///
    /// On a wrapped object the real construction runs first; the fresh
    /// instance's own self-check is then invoked before the instance is
    /// returned.
    pub fn construct(&self, args: &[Value]) -> Result<Object, DiagnosticsError> {
        match &*self.node {
            Node::Plain(cell) => {
                let constructor = cell
                    .borrow()
                    .construct
                    .clone()
                    .ok_or(DiagnosticsError::NotConstructible)?;
                constructor(args)
            }
            Node::Proxied(state) => proxy::construct(state, args),
        }
    }

    /// Run the self-check directly
    ///
    /// Fails fast with [`DiagnosticsError::MissingSelfCheck`] when no check
    /// is attached.
    pub fn check(&self) -> Result<(), DiagnosticsError> {
        let target = self.unwrapped();
        let check = target
            .check_fn()
            .ok_or(DiagnosticsError::MissingSelfCheck)?;
        check(&target).map_err(DiagnosticsError::from)
    }

    /// Read a property without interception
    ///
    /// Never runs a self-check and never wraps the result, even on a wrapped
    /// object. Intended for self-check bodies and tests.
    #[must_use]
    pub fn peek(&self, name: &str) -> Value {
        match &*self.node {
            Node::Plain(cell) => cell.borrow().get(name),
            Node::Proxied(state) => state.target.peek(name),
        }
    }

    /// Enumerable property names, in insertion order (uninstrumented)
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        match &*self.node {
            Node::Plain(cell) => cell.borrow().enumerable_keys(),
            Node::Proxied(state) => state.target.keys(),
        }
    }

    /// Property existence, enumerable or not (uninstrumented)
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        match &*self.node {
            Node::Plain(cell) => cell.borrow().has(name),
            Node::Proxied(state) => state.target.has(name),
        }
    }

    /// Strip proxying, following the target chain to the plain object
    #[must_use]
    pub fn unwrapped(&self) -> Object {
        match &*self.node {
            Node::Plain(_) => self.clone(),
            Node::Proxied(state) => state.target.unwrapped(),
        }
    }

    /// Whether this handle is an interception wrapper
    #[inline]
    #[must_use]
    pub fn is_wrapped(&self) -> bool {
        matches!(&*self.node, Node::Proxied(_))
    }

    /// Reference identity of this handle's allocation
    #[inline]
    #[must_use]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.node) as *const () as usize
    }

    /// Reference identity comparison
    #[inline]
    #[must_use]
    pub fn ptr_eq(a: &Object, b: &Object) -> bool {
        Rc::ptr_eq(&a.node, &b.node)
    }

    /// Create a non-owning handle
    ///
    /// Used by self-checks that refer back to an ancestor object without
    /// creating a reference cycle.
    #[must_use]
    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            node: Rc::downgrade(&self.node),
        }
    }

    pub(crate) fn weak_node(&self) -> Weak<Node> {
        Rc::downgrade(&self.node)
    }

    pub(crate) fn check_fn(&self) -> Option<CheckFn> {
        match &*self.node {
            Node::Plain(cell) => cell.borrow().check.clone(),
            Node::Proxied(state) => state.target.check_fn(),
        }
    }

    /// Replace a stored value bypassing writability, on plain nodes only.
    /// This is the engine's in-place substitution during recursive wrapping
    /// and lazy wrap-on-read store-back.
    pub(crate) fn replace_value(&self, name: &str, value: Value) {
        if let Node::Plain(cell) = &*self.node {
            let mut data = cell.borrow_mut();
            if let Some(prop) = data.props.get_mut(name) {
                prop.value = value;
            } else {
                data.props.insert(name.to_string(), Descriptor::new(value));
            }
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wrapped() {
            write!(f, "Object({:#x}, wrapped)", self.addr())
        } else {
            write!(f, "Object({:#x})", self.addr())
        }
    }
}

/// Non-owning handle to an [`Object`]
#[derive(Clone)]
pub struct WeakObject {
    node: Weak<Node>,
}

impl WeakObject {
    /// Recover a strong handle if the object is still alive
    #[must_use]
    pub fn upgrade(&self) -> Option<Object> {
        self.node.upgrade().map(|node| Object { node })
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakObject(live: {})", self.node.strong_count() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ensure;

    #[test]
    fn get_set_roundtrip() {
        let obj = Object::new();
        assert_eq!(obj.get("missing").unwrap(), Value::Null);

        obj.set("x", 7).unwrap();
        assert_eq!(obj.get("x").unwrap(), Value::Int(7));

        obj.set("x", "seven").unwrap();
        assert_eq!(obj.get("x").unwrap(), Value::Str("seven".to_string()));
    }

    #[test]
    fn non_writable_rejects_assignment() {
        let obj = Object::new();
        obj.define("k", Descriptor::new(1).read_only()).unwrap();

        let err = obj.set("k", 2).unwrap_err();
        assert!(matches!(err, DiagnosticsError::NotWritable(name) if name == "k"));
        assert_eq!(obj.get("k").unwrap(), Value::Int(1));
    }

    #[test]
    fn non_configurable_rejects_define_and_delete() {
        let obj = Object::new();
        obj.define("k", Descriptor::new(1).permanent()).unwrap();

        assert!(matches!(
            obj.define("k", Descriptor::new(2)).unwrap_err(),
            DiagnosticsError::NotConfigurable(_)
        ));
        assert!(matches!(
            obj.delete("k").unwrap_err(),
            DiagnosticsError::NotConfigurable(_)
        ));

        // Deleting an absent property is not an error.
        obj.delete("missing").unwrap();
    }

    #[test]
    fn hidden_props_are_skipped_by_enumeration() {
        let obj = Object::new().with_prop("a", 1).with_prop("b", 2);
        obj.define("secret", Descriptor::new(3).hidden()).unwrap();

        assert_eq!(obj.keys(), vec!["a".to_string(), "b".to_string()]);
        assert!(obj.has("secret"));
    }

    #[test]
    fn invoke_calls_method_with_receiver() {
        let obj = Object::new()
            .with_prop("count", 0)
            .with_method("bump", |recv, _| {
                let count = recv.peek("count").as_i64().unwrap_or(0);
                recv.set("count", count + 1)?;
                Ok(Value::Int(count + 1))
            });

        assert_eq!(obj.invoke("bump", &[]).unwrap(), Value::Int(1));
        assert_eq!(obj.invoke("bump", &[]).unwrap(), Value::Int(2));
        assert_eq!(obj.peek("count"), Value::Int(2));
    }

    #[test]
    fn invoke_non_callable_fails() {
        let obj = Object::new().with_prop("x", 1);
        assert!(matches!(
            obj.invoke("x", &[]).unwrap_err(),
            DiagnosticsError::NotCallable(name) if name == "x"
        ));
    }

    #[test]
    fn check_missing_fails_fast() {
        let obj = Object::new();
        assert!(matches!(
            obj.check().unwrap_err(),
            DiagnosticsError::MissingSelfCheck
        ));
    }

    #[test]
    fn check_reports_violations() {
        let obj = Object::new()
            .with_prop("count", -1)
            .with_check(|o| ensure(o.peek("count").as_i64().unwrap_or(0) >= 0, "count negative"));

        let err = obj.check().unwrap_err();
        assert!(err.is_invariant());

        obj.set("count", 0).unwrap();
        obj.check().unwrap();
    }

    #[test]
    fn construct_requires_slot() {
        let obj = Object::new();
        assert!(matches!(
            obj.construct(&[]).unwrap_err(),
            DiagnosticsError::NotConstructible
        ));

        let factory = Object::new().with_constructor(|args| {
            let seed = args.first().and_then(Value::as_i64).unwrap_or(0);
            Ok(Object::new().with_prop("seed", seed))
        });
        let instance = factory.construct(&[Value::Int(9)]).unwrap();
        assert_eq!(instance.peek("seed"), Value::Int(9));
    }

    #[test]
    fn identity_and_weak_handles() {
        let a = Object::new();
        let b = a.clone();
        assert!(Object::ptr_eq(&a, &b));
        assert_eq!(a.addr(), b.addr());

        let weak = a.downgrade();
        assert!(weak.upgrade().is_some());
        drop(a);
        drop(b);
        assert!(weak.upgrade().is_none());
    }
}
