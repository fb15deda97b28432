//! Integration tests for host methods and host functions

use gavel_model::{Arity, ErrorKind, HostFunction, NodeArena, Value, shared};

use crate::fixtures::james;

#[test]
fn record_methods_see_and_mutate_the_fact() {
    let james = james();
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james.clone());
    assert_eq!(root.call_function("IsOld", &[]).unwrap(), Value::Bool(false));
    root.call_function("IncreaseAge", &[]).unwrap();
    assert_eq!(james.borrow().age, 26);
    assert_eq!(
        root.call_function("Greet", &[Value::from("Hello")]).unwrap(),
        Value::from("Hello, James")
    );
}

#[test]
fn method_errors() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let err = root.call_function("Fly", &[]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoSuchMethod { .. }));
    let err = root.call_function("Greet", &[]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ArityMismatch { actual: 0, .. }));
}

#[test]
fn interface_methods() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let pet = root.get_child_node_by_field("Pet").unwrap();
    assert_eq!(pet.call_function("Speak", &[]).unwrap(), Value::from("Woof"));
}

#[test]
fn string_methods_on_fields() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let name = root.get_child_node_by_field("Name").unwrap();
    assert_eq!(name.call_function("ToUpper", &[]).unwrap(), Value::from("JAMES"));
    assert_eq!(name.call_function("Len", &[]).unwrap(), Value::Int(5));
    assert_eq!(
        name.call_function("HasPrefix", &[Value::from("Ja")]).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        name.call_function("Replace", &[Value::from("m"), Value::from("n")])
            .unwrap(),
        Value::from("Janes")
    );
}

#[test]
fn time_methods_on_fields() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let graduated = root.get_child_node_by_field("GraduationDate").unwrap();
    assert_eq!(graduated.call_function("Year", &[]).unwrap(), Value::Int(2005));
    assert_eq!(graduated.call_function("Month", &[]).unwrap(), Value::Int(7));
    assert_eq!(graduated.call_function("IsZero", &[]).unwrap(), Value::Bool(false));
}

#[test]
fn collection_length_method() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let children = root.get_child_node_by_field("Children").unwrap();
    assert_eq!(children.call_function("Len", &[]).unwrap(), Value::Int(2));
    let friends = root.get_child_node_by_field("Friends").unwrap();
    assert_eq!(friends.call_function("Len", &[]).unwrap(), Value::Int(2));
}

#[test]
fn methods_on_constants() {
    let arena = NodeArena::new();
    let constant = arena.constant(Value::from("  padded "));
    assert_eq!(constant.call_function("Trim", &[]).unwrap(), Value::from("padded"));
}

#[test]
fn host_functions_are_invocable_nodes() {
    let double = shared(HostFunction::new("Double", Arity::Exact(1), |args| {
        match &args[0] {
            Value::Int(n) => Ok(Value::Int(n * 2)),
            other => Ok(other.clone()),
        }
    }));
    let arena = NodeArena::new();
    let node = arena.root("Double", double);
    assert!(node.is_function());
    assert_eq!(node.invoke(&[Value::Int(21)]).unwrap(), Value::Int(42));
    let err = node.invoke(&[]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ArityMismatch { .. }));
}
