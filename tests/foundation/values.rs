//! Integration tests for values and type descriptors

use chrono::{TimeZone, Utc};
use gavel_foundation::{Arity, Type, Value};

// =============================================================================
// Value Types
// =============================================================================

#[test]
fn value_types() {
    assert_eq!(Value::Nil.type_of(), Type::Nil);
    assert_eq!(Value::Bool(true).type_of(), Type::Bool);
    assert_eq!(Value::Int(1).type_of(), Type::Int);
    assert_eq!(Value::Float(1.5).type_of(), Type::Float);
    assert_eq!(Value::from("x").type_of(), Type::String);
    let t = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(Value::from(t).type_of(), Type::Time);
}

#[test]
fn value_accessors() {
    assert_eq!(Value::from("hello").as_str(), Some("hello"));
    assert_eq!(Value::Int(3).as_str(), None);
    assert_eq!(Value::Int(3).as_number(), Some(3.0));
    assert_eq!(Value::Float(2.5).as_number(), Some(2.5));
    assert_eq!(Value::Bool(false).as_bool(), Some(false));
    assert!(Value::Nil.as_bool().is_none());
    let items = Value::from(vec![Value::Int(1), Value::Int(2)]);
    assert_eq!(items.as_array().map(|items| items.len()), Some(2));
}

#[test]
fn value_display() {
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::from("raw").to_string(), "raw");
    assert_eq!(format!("{:?}", Value::from("raw")), "\"raw\"");
    assert_eq!(
        Value::from(vec![Value::Int(1), Value::from("a")]).to_string(),
        "[1, a]"
    );
    let t = Utc.with_ymd_and_hms(2005, 7, 23, 12, 0, 0).unwrap();
    assert_eq!(Value::from(t).to_string(), "2005-07-23T12:00:00Z");
}

#[test]
fn int_and_float_are_distinct_values() {
    assert_ne!(Value::Int(1), Value::Float(1.0));
    assert_eq!(Value::Float(0.5), Value::Float(0.5));
}

// =============================================================================
// Fingerprints
// =============================================================================

#[test]
fn fingerprints_follow_content() {
    assert_eq!(Value::Int(7).fingerprint(), Value::Int(7).fingerprint());
    assert_ne!(Value::Int(7).fingerprint(), Value::Int(8).fingerprint());
    assert_ne!(Value::Int(1).fingerprint(), Value::Float(1.0).fingerprint());
    assert_ne!(Value::from("7").fingerprint(), Value::Int(7).fingerprint());
}

// =============================================================================
// Types and Arity
// =============================================================================

#[test]
fn type_acceptance() {
    assert!(Type::Float.accepts(&Type::Int));
    assert!(!Type::Int.accepts(&Type::Float));
    assert!(!Type::Int.accepts(&Type::String));
    assert!(Type::Any.accepts(&Type::object("Car")));
    assert!(Type::object("Car").accepts(&Type::object("Car")));
    assert!(!Type::object("Car").accepts(&Type::object("Truck")));
    assert!(Type::array(Type::Int).accepts(&Type::array(Type::Any)));
}

#[test]
fn type_names() {
    assert_eq!(Type::array(Type::String).to_string(), "array<string>");
    assert_eq!(Type::map(Type::Int).to_string(), "map<string, int>");
    assert_eq!(Type::object("Person").to_string(), "Person");
}

#[test]
fn arity() {
    assert!(Arity::Exact(2).accepts(2));
    assert!(!Arity::Exact(2).accepts(1));
    assert!(Arity::Range(1, 3).accepts(3));
    assert!(!Arity::Range(1, 3).accepts(4));
    assert!(Arity::Variadic(1).accepts(10));
    assert!(!Arity::Variadic(1).accepts(0));
}
