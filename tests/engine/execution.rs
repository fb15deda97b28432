//! Integration tests for the rule cycle

use gavel_engine::{
    DataContext, EngineConfig, ExecutionEvent, ExecutionListener, KnowledgeBase, KnowledgeLibrary,
    RecordingListener, RuleBuilder, RuleEngine, RuleEntry,
};
use gavel_foundation::ErrorKind;
use gavel_model::{Shared, record, shared};

struct Order {
    total: f64,
    items: i64,
    shipping: f64,
    status: String,
    history: Vec<String>,
}

record! {
    Order {
        "Total" => total,
        "Items" => items,
        "Shipping" => shipping,
        "Status" => status,
        "History" => history,
    }
}

fn order(items: i64, total: f64) -> (Shared<Order>, DataContext) {
    let order = shared(Order {
        total,
        items,
        shipping: 0.0,
        status: "new".into(),
        history: vec![String::new(); 3],
    });
    let mut ctx = DataContext::new();
    ctx.add("Order", order.clone()).unwrap();
    (order, ctx)
}

fn knowledge(source: &str) -> KnowledgeBase {
    let mut library = KnowledgeLibrary::new();
    RuleBuilder::new(&mut library)
        .build_rule_from_source("Orders", "1.0.0", source)
        .unwrap();
    library
        .new_knowledge_base_instance("Orders", "1.0.0")
        .unwrap()
}

const ORDER_RULES: &str = r#"
rule Validate salience 100 {
    when Order.Status == "new" && Order.Items > 0
    then Order.Status = "valid"; Order.History[0] = "validated";
}
rule FreeShipping salience 10 {
    when Order.Status == "valid" && Order.Total >= 50.0
    then Order.Shipping = 0.0; Order.Status = "priced"; Order.History[1] = "free";
}
rule FlatShipping salience 10 {
    when Order.Status == "valid" && Order.Total < 50.0
    then Order.Shipping = 4.5; Order.Status = "priced"; Order.History[1] = "flat";
}
rule Ship {
    when Order.Status == "priced"
    then Order.Status = "shipped"; Order.History[2] = Order.Status.ToUpper();
}
"#;

// =============================================================================
// Forward Chaining
// =============================================================================

#[test]
fn chains_to_quiescence() {
    let mut kb = knowledge(ORDER_RULES);
    let (order, ctx) = order(2, 20.0);
    let report = RuleEngine::default().execute(&ctx, &mut kb).unwrap();
    assert_eq!(report.fired, ["Validate", "FlatShipping", "Ship"]);
    assert_eq!(report.cycles, 4);

    let order = order.borrow();
    assert_eq!(order.status, "shipped");
    assert!((order.shipping - 4.5).abs() < f64::EPSILON);
    assert_eq!(order.history, ["validated", "flat", "SHIPPED"]);
}

#[test]
fn other_branch() {
    let mut kb = knowledge(ORDER_RULES);
    let (order, ctx) = order(1, 80.0);
    let report = RuleEngine::default().execute(&ctx, &mut kb).unwrap();
    assert_eq!(report.fired, ["Validate", "FreeShipping", "Ship"]);
    assert_eq!(order.borrow().history[1], "free");
}

#[test]
fn nothing_matches() {
    let mut kb = knowledge(ORDER_RULES);
    let (order, ctx) = order(0, 80.0);
    let report = RuleEngine::default().execute(&ctx, &mut kb).unwrap();
    assert!(report.fired.is_empty());
    assert_eq!(report.cycles, 1);
    assert_eq!(order.borrow().status, "new");
}

#[test]
fn fetch_matching_orders_by_salience() {
    let mut kb = knowledge(
        r#"
        rule Low { when Order.Items > 0 then Order.Items = 0; }
        rule High salience 50 { when Order.Items > 0 then Order.Items = 0; }
        rule Mid salience 5 { when Order.Items > 0 then Order.Items = 0; }
        "#,
    );
    let (_, ctx) = order(3, 0.0);
    let matching = RuleEngine::default()
        .fetch_matching_rules(&ctx, &mut kb)
        .unwrap();
    let names: Vec<&str> = matching.iter().map(RuleEntry::name).collect();
    assert_eq!(names, ["High", "Mid", "Low"]);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn oscillating_rules_hit_the_cycle_limit() {
    let mut kb = knowledge(
        r#"
        rule Open { when Order.Status == "closed" then Order.Status = "open"; }
        rule Close { when Order.Status == "open" then Order.Status = "closed"; }
        "#,
    );
    let (order, ctx) = order(0, 0.0);
    order.borrow_mut().status = "open".into();
    let engine = RuleEngine::new(EngineConfig::default().with_max_cycle(25));
    let err = engine.execute(&ctx, &mut kb).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MaxCycleExceeded { limit: 25 }));
}

#[test]
fn arithmetic_errors_name_the_rule() {
    let mut kb = knowledge("rule Split { when Order.Items == 0 then Order.Items = 10 / Order.Items; }");
    let (order, ctx) = order(0, 0.0);
    let err = RuleEngine::default().execute(&ctx, &mut kb).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DivisionByZero));
    assert_eq!(err.context.unwrap().rule.as_deref(), Some("Split"));
    assert_eq!(order.borrow().items, 0);
}

#[test]
fn earlier_effects_survive_a_later_failure() {
    let mut kb = knowledge(
        r#"rule Partial { when Order.Items == 1 then Order.Items = 2; Order.Status = 3; }"#,
    );
    let (order, ctx) = order(1, 0.0);
    let err = RuleEngine::default().execute(&ctx, &mut kb).unwrap_err();
    assert!(err.kind.is_type_mismatch());
    let order = order.borrow();
    assert_eq!(order.items, 2);
    assert_eq!(order.status, "new");
}

// =============================================================================
// Listeners
// =============================================================================

#[derive(Default)]
struct Counting {
    cycles: u64,
    evaluated: usize,
    executed: Vec<String>,
}

impl ExecutionListener for Counting {
    fn begin_cycle(&mut self, _cycle: u64) {
        self.cycles += 1;
    }

    fn evaluate_rule(&mut self, _cycle: u64, _entry: &RuleEntry, _matched: bool) {
        self.evaluated += 1;
    }

    fn execute_rule(&mut self, _cycle: u64, entry: &RuleEntry) {
        self.executed.push(entry.name().to_string());
    }
}

#[test]
fn custom_listener() {
    let mut kb = knowledge(ORDER_RULES);
    let (_, ctx) = order(2, 20.0);
    let mut listener = Counting::default();
    let report = RuleEngine::default()
        .execute_with_listener(&ctx, &mut kb, &mut listener)
        .unwrap();
    assert_eq!(listener.cycles, report.cycles);
    assert_eq!(listener.executed, report.fired);
    assert_eq!(listener.evaluated, 4 * 4);
}

#[test]
fn recorded_evaluations() {
    let mut kb = knowledge(ORDER_RULES);
    let (_, ctx) = order(0, 0.0);
    let mut listener = RecordingListener::new();
    RuleEngine::default()
        .execute_with_listener(&ctx, &mut kb, &mut listener)
        .unwrap();
    let matched: Vec<bool> = listener
        .events
        .iter()
        .filter_map(|event| match event {
            ExecutionEvent::Evaluated { matched, .. } => Some(*matched),
            _ => None,
        })
        .collect();
    assert_eq!(matched, [false, false, false, false]);
    assert!(listener.fired().is_empty());
}
