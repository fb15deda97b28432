//! Retraction, reset and knowledge base instances

use gavel_engine::{DataContext, KnowledgeLibrary, RuleBuilder, RuleEngine};
use gavel_foundation::ErrorKind;
use gavel_model::{Shared, record, shared};

struct Counter {
    hits: i64,
    seen: bool,
    target: String,
}

record! {
    Counter {
        "Hits" => hits,
        "Seen" => seen,
        "Target" => target,
    }
}

const RULES: &str = r#"
rule RuleX salience 10 {
    when Counter.Hits < 5
    then Counter.Hits += 1; Retract("RuleX");
}
rule Watch {
    when Counter.Hits == 1 && !Counter.Seen
    then Counter.Seen = true;
}
"#;

fn library() -> KnowledgeLibrary {
    let mut library = KnowledgeLibrary::new();
    RuleBuilder::new(&mut library)
        .build_rule_from_source("Counting", "1", RULES)
        .unwrap();
    library
}

fn counter() -> (Shared<Counter>, DataContext) {
    let counter = shared(Counter {
        hits: 0,
        seen: false,
        target: "Watch".into(),
    });
    let mut ctx = DataContext::new();
    ctx.add("Counter", counter.clone()).unwrap();
    (counter, ctx)
}

#[test]
fn retracted_rule_stays_out_until_reset() {
    let library = library();
    let mut kb = library.new_knowledge_base_instance("Counting", "1").unwrap();
    let (counter, ctx) = counter();
    let engine = RuleEngine::default();

    let report = engine.execute(&ctx, &mut kb).unwrap();
    assert_eq!(report.fired, ["RuleX", "Watch"]);
    assert!(kb.is_retracted("RuleX").unwrap());
    assert_eq!(counter.borrow().hits, 1);

    let report = engine.execute(&ctx, &mut kb).unwrap();
    assert!(report.fired.is_empty());
    assert_eq!(counter.borrow().hits, 1);

    kb.reset();
    assert!(!kb.is_retracted("RuleX").unwrap());
    let report = engine.execute(&ctx, &mut kb).unwrap();
    assert_eq!(report.fired, ["RuleX"]);
    assert_eq!(counter.borrow().hits, 2);
    assert!(kb.is_retracted("RuleX").unwrap());
}

#[test]
fn fresh_instances_start_unretracted() {
    let library = library();
    let mut first = library.new_knowledge_base_instance("Counting", "1").unwrap();
    let (_, ctx) = counter();
    RuleEngine::default().execute(&ctx, &mut first).unwrap();
    assert!(first.is_retracted("RuleX").unwrap());

    let second = library.new_knowledge_base_instance("Counting", "1").unwrap();
    assert!(!second.is_retracted("RuleX").unwrap());
}

#[test]
fn retract_by_computed_name() {
    let mut library = KnowledgeLibrary::new();
    RuleBuilder::new(&mut library)
        .build_rule_from_source(
            "Counting",
            "2",
            r#"
            rule Silence salience 10 { when Counter.Hits == 0 then Retract(Counter.Target); Counter.Hits = 1; }
            rule Watch { when Counter.Hits == 1 then Counter.Seen = true; }
            "#,
        )
        .unwrap();
    let mut kb = library.new_knowledge_base_instance("Counting", "2").unwrap();
    let (counter, ctx) = counter();
    let report = RuleEngine::default().execute(&ctx, &mut kb).unwrap();
    assert_eq!(report.fired, ["Silence"]);
    assert!(kb.is_retracted("Watch").unwrap());
    assert!(!counter.borrow().seen);
}

#[test]
fn retracting_an_unknown_rule_fails() {
    let mut library = KnowledgeLibrary::new();
    RuleBuilder::new(&mut library)
        .build_rule_from_source(
            "Counting",
            "3",
            r#"rule Oops { when Counter.Hits == 0 then Retract("Nobody"); }"#,
        )
        .unwrap();
    let mut kb = library.new_knowledge_base_instance("Counting", "3").unwrap();
    let (_, ctx) = counter();
    let err = RuleEngine::default().execute(&ctx, &mut kb).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownRule(ref name) if name == "Nobody"));
    assert_eq!(err.context.unwrap().rule.as_deref(), Some("Oops"));
}

#[test]
fn incremental_rules_join_the_same_base() {
    let mut library = library();
    RuleBuilder::new(&mut library)
        .build_rule_from_source(
            "Counting",
            "1",
            r#"rule Finish { when Counter.Seen then Counter.Hits = 100; Retract("Finish"); }"#,
        )
        .unwrap();
    let mut kb = library.new_knowledge_base_instance("Counting", "1").unwrap();
    assert!(kb.contains_rule("RuleX"));
    assert!(kb.contains_rule("Finish"));

    let (counter, ctx) = counter();
    let report = RuleEngine::default().execute(&ctx, &mut kb).unwrap();
    assert_eq!(report.fired, ["RuleX", "Watch", "Finish"]);
    assert_eq!(counter.borrow().hits, 100);
}

#[test]
fn garbage_source_registers_nothing() {
    let mut library = library();
    let err = RuleBuilder::new(&mut library)
        .build_rule_from_source("Counting", "1", "rule Extra { when Counter.Hits then")
        .unwrap_err();
    assert!(err.is_compile_time());
    let kb = library.new_knowledge_base_instance("Counting", "1").unwrap();
    assert_eq!(kb.len(), 2);
    assert!(!kb.contains_rule("Extra"));
}

#[test]
fn invalid_escape_fails_the_build() {
    let mut library = KnowledgeLibrary::new();
    let err = RuleBuilder::new(&mut library)
        .build_rule_from_source(
            "Escapes",
            "1",
            r#"rule E { when Counter.Target == "a\cb" then Counter.Seen = true; }"#,
        )
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::LexicalError { .. }));
    assert!(!library.contains("Escapes", "1"));

    RuleBuilder::new(&mut library)
        .build_rule_from_source(
            "Escapes",
            "1",
            r#"rule E { when Counter.Target == "a\\cb" then Counter.Seen = true; }"#,
        )
        .unwrap();
    assert!(library.contains("Escapes", "1"));
}
