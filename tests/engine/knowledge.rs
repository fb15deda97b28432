//! Integration tests for knowledge bases and working memory

use gavel_engine::{DataContext, KnowledgeBase, RuleEngine};
use gavel_foundation::{ErrorKind, Value};
use gavel_language::parse;
use gavel_model::{Shared, record, shared};

struct Tank {
    level: i64,
    capacity: i64,
}

record! {
    Tank {
        "Level" => level,
        "Capacity" => capacity,
    }
}

const RULES: &str = r#"
rule Fill "top up" salience 5 { when Tank.Level < Tank.Capacity then Tank.Level += 10; }
rule Alarm { when Tank.Level >= Tank.Capacity then Retract("Alarm"); }
"#;

fn knowledge() -> KnowledgeBase {
    let mut kb = KnowledgeBase::new("Tanks", "2.0.0");
    for decl in parse(RULES).unwrap() {
        kb.add_rule_entry(decl).unwrap();
    }
    kb.index_variables();
    kb
}

fn tank(level: i64) -> (Shared<Tank>, DataContext) {
    let tank = shared(Tank {
        level,
        capacity: 30,
    });
    let mut ctx = DataContext::new();
    ctx.add("Tank", tank.clone()).unwrap();
    (tank, ctx)
}

// =============================================================================
// Entries
// =============================================================================

#[test]
fn entries_keep_header_attributes() {
    let kb = knowledge();
    assert_eq!(kb.name(), "Tanks");
    assert_eq!(kb.version(), "2.0.0");
    assert_eq!(kb.len(), 2);

    let fill = kb.rule_entry("Fill").unwrap();
    assert_eq!(fill.description(), "top up");
    assert_eq!(fill.salience(), 5);
    assert_eq!(fill.order(), 0);
    assert!(!fill.is_retracted());

    assert_eq!(kb.entry_at(1).map(|e| e.name()), Some("Alarm"));
    assert!(kb.entry_at(2).is_none());
    let names: Vec<&str> = kb.rule_entries().map(|e| e.name()).collect();
    assert_eq!(names, ["Fill", "Alarm"]);
}

#[test]
fn duplicate_names_are_rejected() {
    let mut kb = knowledge();
    let again = parse("rule Fill { when true then Log(\"x\"); }").unwrap().remove(0);
    let err = kb.add_rule_entry(again).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateRule(ref name) if name == "Fill"));
    assert_eq!(kb.len(), 2);
}

#[test]
fn unknown_rules() {
    let mut kb = knowledge();
    assert!(matches!(
        kb.retract("Nope").unwrap_err().kind,
        ErrorKind::UnknownRule(_)
    ));
    assert!(matches!(
        kb.is_retracted("Nope").unwrap_err().kind,
        ErrorKind::UnknownRule(_)
    ));
    let (_, ctx) = tank(0);
    assert!(matches!(
        kb.evaluate_condition("Nope", &ctx).unwrap_err().kind,
        ErrorKind::UnknownRule(_)
    ));
}

// =============================================================================
// Rule-at-a-time Evaluation
// =============================================================================

#[test]
fn condition_and_action_by_name() {
    let mut kb = knowledge();
    let (tank, ctx) = tank(0);
    assert!(kb.evaluate_condition("Fill", &ctx).unwrap());
    assert!(!kb.evaluate_condition("Alarm", &ctx).unwrap());
    kb.execute_action("Fill", 0, &ctx).unwrap();
    assert_eq!(tank.borrow().level, 10);

    let err = kb.execute_action("Fill", 1, &ctx).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IndexOutOfRange { index: 1, length: 1 }));
}

#[test]
fn writes_are_fingerprinted() {
    let mut kb = knowledge();
    let (_, ctx) = tank(0);
    kb.execute_action("Fill", 0, &ctx).unwrap();
    assert_eq!(
        kb.memory().fingerprint("Tank.Level"),
        Some(Value::Int(10).fingerprint())
    );
}

// =============================================================================
// Retraction and Reset
// =============================================================================

#[test]
fn reset_restores_every_rule_and_clears_memory() {
    let mut kb = knowledge();
    let (_, ctx) = tank(30);
    RuleEngine::default().execute(&ctx, &mut kb).unwrap();
    assert!(kb.is_retracted("Alarm").unwrap());
    assert!(kb.memory().fingerprint_count() > 0);

    kb.retract("Fill").unwrap();
    kb.reset();
    assert!(!kb.is_retracted("Alarm").unwrap());
    assert!(!kb.is_retracted("Fill").unwrap());
    assert_eq!(kb.memory().fingerprint_count(), 0);
}

#[test]
fn new_instance_is_fresh_and_independent() {
    let mut kb = knowledge();
    kb.retract("Alarm").unwrap();
    let instance = kb.new_instance();
    assert!(!instance.is_retracted("Alarm").unwrap());
    assert!(kb.is_retracted("Alarm").unwrap());
    assert_eq!(instance.snapshot(), kb.snapshot());
}

// =============================================================================
// Variable Index
// =============================================================================

#[test]
fn variable_index() {
    let kb = knowledge();
    let memory = kb.memory();
    assert_eq!(memory.rules_reading("Tank.Level"), ["Alarm", "Fill"]);
    assert!(!memory.dependents("Tank.Capacity").is_empty());
    assert!(memory.variables().any(|v| v == "Tank.Level"));

    let fill = memory.summary("Fill").unwrap();
    assert!(fill.writes.contains("Tank.Level"));
    assert!(!fill.condition_calls);
    assert!(!fill.action_calls);

    let alarm = memory.summary("Alarm").unwrap();
    assert!(alarm.writes.is_empty());
}

#[test]
fn snapshot_lists_rules_in_order() {
    let kb = knowledge();
    let snapshot = kb.snapshot();
    let fill = snapshot.find("rule Fill").unwrap();
    let alarm = snapshot.find("rule Alarm").unwrap();
    assert!(fill < alarm);
    assert!(snapshot.contains("Tank.Level += 10;"));
}
