//! End-to-end scenario tests: the wrapped site registry reports invariant
//! violations on the next intercepted operation, wherever the corruption was
//! introduced.

use objdiag_core::{
    ActivationGate, Descriptor, Diagnostics, DiagnosticsConfig, Object, Value,
};
use objdiag_testkit::{sample_tree, site_spec};
use pretty_assertions::assert_eq;

const PARENT_ERR: &str = "parent of site Regional Office A must exist";

fn active_engine() -> Diagnostics {
    Diagnostics::with_gate(DiagnosticsConfig::new(), ActivationGate::active())
}

/// Plain tree plus its wrapper; the plain handle lets tests corrupt state
/// without going through interception.
fn wrapped_tree() -> (Object, Object) {
    let plain = sample_tree().unwrap();
    let engine = active_engine();
    (plain.clone(), engine.wrap(plain))
}

/// Corrupt a site's parent reference through the plain handle.
fn corrupt_parent(plain: &Object, id: i64, bad_parent: i64) {
    let sites_value = plain.peek("sites");
    let site_value = sites_value.as_object().unwrap().peek(&id.to_string());
    let site = site_value.as_object().unwrap().unwrapped();
    site.set("parent_id", bad_parent).unwrap();
}

#[test]
fn calling_a_method_triggers_the_graph_check() {
    let (plain, wrapper) = wrapped_tree();

    let hq_value = wrapper.invoke("get_site", &[Value::from(1)]).unwrap();
    let hq = hq_value.as_object().unwrap();
    assert_eq!(hq.get("name").unwrap(), Value::from("HQ"));

    corrupt_parent(&plain, 2, 100);
    let err = wrapper
        .invoke("get_site", &[Value::from(1)])
        .unwrap_err();
    assert!(err.to_string().contains(PARENT_ERR));
}

#[test]
fn defining_a_property_triggers_the_graph_check() {
    let (plain, wrapper) = wrapped_tree();

    corrupt_parent(&plain, 2, -1);
    let err = wrapper
        .define("test_property", Descriptor::new(42))
        .unwrap_err();
    assert!(err.to_string().contains(PARENT_ERR));
}

#[test]
fn setting_a_property_triggers_the_graph_check() {
    let (plain, wrapper) = wrapped_tree();

    corrupt_parent(&plain, 2, -1);
    let err = wrapper.set("test_property", 42).unwrap_err();
    assert!(err.to_string().contains(PARENT_ERR));
}

#[test]
fn deleting_a_property_triggers_the_graph_check() {
    let (plain, wrapper) = wrapped_tree();

    wrapper.set("test_property", 42).unwrap();
    let hq_value = wrapper.invoke("get_site", &[Value::from(1)]).unwrap();
    assert!(hq_value.as_object().is_some());

    corrupt_parent(&plain, 2, -1);
    let err = wrapper.delete("test_property").unwrap_err();
    assert!(err.to_string().contains(PARENT_ERR));
}

#[test]
fn corruption_is_detected_from_a_different_node() {
    let (plain, wrapper) = wrapped_tree();

    // Hold a wrapped handle to HQ before anything goes wrong.
    let hq_value = wrapper.invoke("get_site", &[Value::from(1)]).unwrap();
    let hq = hq_value.as_object().unwrap().clone();
    assert!(hq.is_wrapped());

    // Corrupt Regional Office A; the very next operation on HQ reports it.
    corrupt_parent(&plain, 2, 100);
    let err = hq.get("name").unwrap_err();
    assert!(err.to_string().contains(PARENT_ERR));
}

#[test]
fn sites_added_through_the_wrapper_are_instrumented() {
    let (plain, wrapper) = wrapped_tree();

    let chained = wrapper
        .invoke("add_site", &[site_spec(6, "Local Site A2", Some(2)).into()])
        .unwrap();
    assert_eq!(chained, Value::Object(wrapper.clone()));

    let new_value = wrapper.invoke("get_site", &[Value::from(6)]).unwrap();
    let new_site = new_value.as_object().unwrap();
    assert!(new_site.is_wrapped());
    assert_eq!(new_site.get("name").unwrap(), Value::from("Local Site A2"));

    // Corrupting the freshly added site is caught like any other node.
    corrupt_parent(&plain, 6, 100);
    let err = wrapper.invoke("get_site", &[Value::from(1)]).unwrap_err();
    assert!(err
        .to_string()
        .contains("parent of site Local Site A2 must exist"));
}

#[test]
fn healthy_tree_supports_full_traversal() {
    let (_, wrapper) = wrapped_tree();

    let sites_value = wrapper.get("sites").unwrap();
    let sites = sites_value.as_object().unwrap();
    let keys = sites.keys();
    assert_eq!(keys.len(), 5);

    for key in keys {
        let site_value = sites.get(&key).unwrap();
        let site = site_value.as_object().unwrap();
        assert!(site.is_wrapped());
        assert!(site.get("name").unwrap().as_str().is_some());
    }
}

#[test]
fn removal_through_the_wrapper_keeps_the_graph_valid() {
    let (_, wrapper) = wrapped_tree();

    wrapper.invoke("remove_site", &[Value::from(5)]).unwrap();
    wrapper.invoke("remove_site", &[Value::from(3)]).unwrap();

    let gone = wrapper.invoke("get_site", &[Value::from(5)]).unwrap();
    assert!(gone.is_null());

    let err = wrapper.invoke("remove_site", &[Value::from(1)]).unwrap_err();
    assert!(err.to_string().contains("must have no children"));
}

#[test]
fn inactive_gate_leaves_the_registry_untouched() {
    let plain = sample_tree().unwrap();
    let engine = Diagnostics::with_gate(DiagnosticsConfig::new(), ActivationGate::inactive());

    let out = engine.wrap(plain.clone());
    assert!(Object::ptr_eq(&plain, &out));

    // No interception: corruption goes unnoticed, the production tradeoff.
    corrupt_parent(&plain, 2, 100);
    let hq = out.invoke("get_site", &[Value::from(1)]).unwrap();
    assert!(hq.as_object().is_some());
}
