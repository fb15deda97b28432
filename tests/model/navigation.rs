//! Integration tests for value node navigation and mutation

use gavel_model::{ErrorKind, Kind, NodeArena, Type, Value};

use crate::fixtures::james;

// =============================================================================
// Reads
// =============================================================================

#[test]
fn nested_paths() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());

    let friend = root
        .get_child_node_by_field("Friends")
        .unwrap()
        .get_child_node_by_index(1)
        .unwrap()
        .get_child_node_by_field("Name")
        .unwrap();
    assert_eq!(friend.identified_as(), "Pearson.Friends[1].Name");
    assert_eq!(friend.get_value().unwrap(), Value::from("Peter"));

    let child = root
        .get_child_node_by_field("Children")
        .unwrap()
        .get_child_node_by_selector(Value::from("Graham"))
        .unwrap()
        .get_child_node_by_field("Age")
        .unwrap();
    assert_eq!(child.identified_as(), "Pearson.Children[\"Graham\"].Age");
    assert_eq!(child.get_value().unwrap(), Value::Int(1));
}

#[test]
fn parent_links() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let age = root
        .get_child_node_by_field("Spouse")
        .unwrap()
        .get_child_node_by_field("Age")
        .unwrap();
    let spouse = age.parent().unwrap();
    assert_eq!(spouse.identified_as(), "Pearson.Spouse");
    assert_eq!(spouse.parent().unwrap().identified_as(), "Pearson");
    assert!(spouse.parent().unwrap().parent().is_none());
}

#[test]
fn capability_tags() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let kind = |field: &str| root.get_child_node_by_field(field).unwrap().kind().unwrap();
    assert_eq!(root.kind().unwrap(), Kind::Object);
    assert_eq!(kind("Name"), Kind::String);
    assert_eq!(kind("Age"), Kind::Int);
    assert_eq!(kind("Height"), Kind::Float);
    assert_eq!(kind("Married"), Kind::Bool);
    assert_eq!(kind("GraduationDate"), Kind::Time);
    assert_eq!(kind("Interests"), Kind::Array);
    assert_eq!(kind("Children"), Kind::Map);
    assert_eq!(kind("Nickname"), Kind::Nil);
}

#[test]
fn interface_fields_reach_the_concrete_value() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let pet = root.get_child_node_by_field("Pet").unwrap();
    assert!(pet.is_interface());
    assert_eq!(pet.type_name().unwrap(), "Dog");
    let good = pet.get_child_node_by_field("Good").unwrap();
    assert_eq!(good.identified_as(), "Pearson.Pet.Good");
    assert_eq!(good.get_value().unwrap(), Value::Bool(true));
}

#[test]
fn element_and_map_types() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let interests = root.get_child_node_by_field("Interests").unwrap();
    assert_eq!(interests.get_array_type().unwrap(), Type::String);
    assert_eq!(interests.length().unwrap(), 2);
    let children = root.get_child_node_by_field("Children").unwrap();
    assert_eq!(
        children.map_keys().unwrap(),
        [Value::from("Christen"), Value::from("Graham")]
    );
}

#[test]
fn repeated_navigation_is_idempotent() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let first = root.get_child_node_by_field("Age").unwrap();
    let second = root.get_child_node_by_field("Age").unwrap();
    assert_eq!(first.identified_as(), second.identified_as());
    assert_eq!(first.get_value().unwrap(), second.get_value().unwrap());
}

// =============================================================================
// Navigation Errors
// =============================================================================

#[test]
fn navigation_errors() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());

    let err = root.get_child_node_by_field("Salary").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoSuchField { .. }));

    let friends = root.get_child_node_by_field("Friends").unwrap();
    let err = friends.get_child_node_by_index(5).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::IndexOutOfRange { index: 5, length: 2 }
    ));

    let children = root.get_child_node_by_field("Children").unwrap();
    let err = children
        .get_child_node_by_selector(Value::from("Nobody"))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::KeyNotFound(_)));

    let name = root.get_child_node_by_field("Name").unwrap();
    let err = name.get_child_node_by_field("Length").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotApplicable { .. }));
}

#[test]
fn nil_field_cannot_be_navigated() {
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james());
    let nickname = root.get_child_node_by_field("Nickname").unwrap();
    assert!(nickname.is_nil());
    assert_eq!(nickname.get_value().unwrap(), Value::Nil);
}

// =============================================================================
// Writes
// =============================================================================

#[test]
fn writes_land_on_the_host_object() {
    let james = james();
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james.clone());

    root.set_object_value_by_field("Age", &Value::Int(26)).unwrap();
    root.get_child_node_by_field("Interests")
        .unwrap()
        .set_array_value_at(0, &Value::from("Rugby"))
        .unwrap();
    root.get_child_node_by_field("Scores")
        .unwrap()
        .set_map_value_at(&Value::from("Go"), &Value::Int(3))
        .unwrap();
    root.set_object_value_by_field("Nickname", &Value::from("Jim"))
        .unwrap();
    root.set_object_value_by_field("Height", &Value::Int(2))
        .unwrap();

    let james = james.borrow();
    assert_eq!(james.age, 26);
    assert_eq!(james.interests[0], "Rugby");
    assert_eq!(james.scores.get("Go"), Some(&3));
    assert_eq!(james.nickname.as_deref(), Some("Jim"));
    assert!((james.height - 2.0).abs() < f64::EPSILON);
}

#[test]
fn failed_writes_leave_the_host_untouched() {
    let james = james();
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james.clone());

    let err = root
        .set_object_value_by_field("Age", &Value::from("old"))
        .unwrap_err();
    assert!(err.kind.is_type_mismatch());
    assert_eq!(err.context.unwrap().path.as_deref(), Some("Pearson.Age"));

    let err = root
        .get_child_node_by_field("Interests")
        .unwrap()
        .set_array_value_at(9, &Value::from("Chess"))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IndexOutOfRange { .. }));

    let james = james.borrow();
    assert_eq!(james.age, 25);
    assert_eq!(james.interests, ["Football", "Coding"]);
}

#[test]
fn set_value_through_a_child_node() {
    let james = james();
    let arena = NodeArena::new();
    let root = arena.root("Pearson", james.clone());
    root.get_child_node_by_field("Friends")
        .unwrap()
        .get_child_node_by_index(0)
        .unwrap()
        .get_child_node_by_field("Age")
        .unwrap()
        .set_value(&Value::Int(30))
        .unwrap();
    assert_eq!(james.borrow().friends[0].age, 30);
}
