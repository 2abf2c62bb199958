//! Test fixtures for the objdiag workspace
//!
//! The engine makes no assumptions about the objects it wraps; this crate
//! supplies the domain collaborator the integration tests exercise it with: a
//! tree-structured site registry whose graph-wide self-check verifies that no
//! site is its own parent, every parent exists and every child reference
//! resolves. Every nested object in the registry (the site table, each site,
//! each children set) carries the same check through a weak back-reference,
//! so corruption introduced at any node is reported by the next intercepted
//! operation anywhere in the wrapped graph.

use std::rc::Rc;

use objdiag_core::{
    ensure, Diagnostics, DiagnosticsError, InvariantViolation, Object, Value,
};

type SharedCheck = Rc<dyn Fn(&Object) -> Result<(), InvariantViolation>>;

/// Build a plain site-spec object for `add_site`.
pub fn site_spec(id: i64, name: &str, parent_id: Option<i64>) -> Object {
    Object::new()
        .with_prop("id", id)
        .with_prop("name", name)
        .with_prop("parent_id", parent_id.map_or(Value::Null, Value::from))
}

/// Build an empty site registry.
///
/// The registry exposes `add_site`, `remove_site` and `get_site` methods and
/// stores sites in its `sites` table, keyed by decimal id.
pub fn site_registry() -> Object {
    let registry = Object::new();

    // One graph-wide check, shared by every node. The weak back-reference
    // avoids a cycle between the registry and the checks stored inside it.
    let shared: SharedCheck = {
        let weak = registry.downgrade();
        Rc::new(move |_: &Object| match weak.upgrade() {
            Some(registry) => verify_graph(&registry),
            None => Ok(()),
        })
    };

    let sites = {
        let check = Rc::clone(&shared);
        Object::new().with_check(move |o| check(o))
    };

    let add = {
        let check = Rc::clone(&shared);
        move |recv: &Object, args: &[Value]| add_site(recv, args, &check)
    };

    let registry = registry
        .with_prop("sites", sites)
        .with_method("add_site", add)
        .with_method("remove_site", remove_site)
        .with_method("get_site", get_site);

    let check = Rc::clone(&shared);
    registry.with_check(move |o| check(o))
}

/// The five-node sample tree: HQ with two regional offices, each holding one
/// local site.
pub fn sample_tree() -> Result<Object, DiagnosticsError> {
    let registry = site_registry();
    registry.invoke("add_site", &[site_spec(1, "HQ", None).into()])?;
    registry.invoke("add_site", &[site_spec(2, "Regional Office A", Some(1)).into()])?;
    registry.invoke("add_site", &[site_spec(3, "Regional Office B", Some(1)).into()])?;
    registry.invoke("add_site", &[site_spec(4, "Local Site A1", Some(2)).into()])?;
    registry.invoke("add_site", &[site_spec(5, "Local Site B1", Some(3)).into()])?;
    Ok(registry)
}

/// Sample tree wrapped by the given engine.
pub fn wrapped_sample_tree(diag: &Diagnostics) -> Result<Object, DiagnosticsError> {
    Ok(diag.wrap(sample_tree()?))
}

/// Graph-wide invariant check. Reads only through uninstrumented accessors,
/// so it can run from any node's self-check against a partly wrapped graph.
fn verify_graph(registry: &Object) -> Result<(), InvariantViolation> {
    let sites_value = registry.peek("sites");
    let Some(sites) = sites_value.as_object() else {
        return Err(InvariantViolation::new("registry must hold a site table"));
    };

    for key in sites.keys() {
        let site_value = sites.peek(&key);
        let Some(site) = site_value.as_object() else {
            return Err(InvariantViolation::new(format!(
                "site entry {key} must be an object"
            )));
        };
        let name_value = site.peek("name");
        let name = name_value.as_str().unwrap_or("unnamed");
        let id = site.peek("id").as_i64();

        if let Some(parent_id) = site.peek("parent_id").as_i64() {
            ensure(
                Some(parent_id) != id,
                format!("site {name} cannot be its own parent"),
            )?;
            ensure(
                sites.has(&parent_id.to_string()),
                format!("parent of site {name} must exist"),
            )?;
        }

        let children_value = site.peek("children");
        if let Some(children) = children_value.as_object() {
            for child in children.keys() {
                ensure(
                    sites.has(&child),
                    format!("site {name} must have valid children"),
                )?;
            }
        }
    }
    Ok(())
}

fn object_prop(obj: &Object, name: &str) -> Result<Object, DiagnosticsError> {
    obj.get(name)?.as_object().cloned().ok_or_else(|| {
        DiagnosticsError::InvalidArgument(format!("expected object at property {name}"))
    })
}

fn add_site(
    recv: &Object,
    args: &[Value],
    check: &SharedCheck,
) -> Result<Value, DiagnosticsError> {
    let spec = args.first().and_then(Value::as_object).cloned().ok_or_else(|| {
        DiagnosticsError::InvalidArgument("add_site expects a site spec object".to_string())
    })?;
    let id = spec.peek("id").as_i64().ok_or_else(|| {
        DiagnosticsError::InvalidArgument("site id must be an integer".to_string())
    })?;
    let name_value = spec.peek("name");
    let name = name_value.as_str().unwrap_or("unnamed").to_string();
    let parent = spec.peek("parent_id");

    let sites = object_prop(recv, "sites")?;
    let key = id.to_string();
    ensure(!sites.has(&key), format!("site {name} has already been added"))?;
    ensure(
        parent.as_i64() != Some(id),
        format!("site {name} cannot be its own parent"),
    )?;
    if let Some(parent_id) = parent.as_i64() {
        ensure(
            sites.has(&parent_id.to_string()),
            format!("parent of site {name} must exist"),
        )?;
    }

    let children = {
        let check = Rc::clone(check);
        Object::new().with_check(move |o| check(o))
    };
    let site = {
        let check = Rc::clone(check);
        Object::new()
            .with_prop("id", id)
            .with_prop("name", name.clone())
            .with_prop("parent_id", parent.clone())
            .with_prop("children", children)
            .with_check(move |o| check(o))
    };
    sites.set(&key, site)?;

    if let Some(parent_id) = parent.as_i64() {
        let parent_site = object_prop(&sites, &parent_id.to_string())?;
        let parent_children = object_prop(&parent_site, "children")?;
        parent_children.set(&key, true)?;
    }

    ensure(sites.has(&key), format!("site {name} was not recorded"))?;
    Ok(Value::Object(recv.clone()))
}

fn remove_site(recv: &Object, args: &[Value]) -> Result<Value, DiagnosticsError> {
    let id = args.first().and_then(Value::as_i64).ok_or_else(|| {
        DiagnosticsError::InvalidArgument("remove_site expects a site id".to_string())
    })?;
    let key = id.to_string();
    let sites = object_prop(recv, "sites")?;
    ensure(sites.has(&key), format!("site #{id} must exist"))?;

    let site = object_prop(&sites, &key)?;
    let children = object_prop(&site, "children")?;
    ensure(
        children.keys().is_empty(),
        format!("site #{id} must have no children"),
    )?;

    // Detach from the parent before removing the site itself, so the graph
    // never passes through a state with a dangling child reference.
    if let Some(parent_id) = site.get("parent_id")?.as_i64() {
        let parent_site = object_prop(&sites, &parent_id.to_string())?;
        let parent_children = object_prop(&parent_site, "children")?;
        parent_children.delete(&key)?;
    }
    sites.delete(&key)?;
    Ok(Value::Object(recv.clone()))
}

fn get_site(recv: &Object, args: &[Value]) -> Result<Value, DiagnosticsError> {
    let id = args.first().and_then(Value::as_i64).ok_or_else(|| {
        DiagnosticsError::InvalidArgument("get_site expects a site id".to_string())
    })?;
    let sites = object_prop(recv, "sites")?;
    sites.get(&id.to_string())
}
