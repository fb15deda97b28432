//! Integration tests for data contexts and function providers

use gavel_engine::{
    Binding, DEFUNC, DataContext, FunctionRegistry, KnowledgeLibrary, NativeFunction, RuleBuilder,
    RuleEngine,
};
use gavel_foundation::{Arity, ErrorKind, Value};
use gavel_model::{HostFunction, record, shared};

struct Account {
    balance: i64,
    flagged: bool,
}

record! {
    Account {
        "Balance" => balance,
        "Flagged" => flagged,
    }
}

fn run(source: &str, ctx: &DataContext) -> gavel_foundation::Result<()> {
    let mut library = KnowledgeLibrary::new();
    RuleBuilder::new(&mut library).build_rule_from_source("Accounts", "1", source)?;
    let mut kb = library.new_knowledge_base_instance("Accounts", "1")?;
    RuleEngine::default().execute(ctx, &mut kb).map(|_| ())
}

#[test]
fn bindings() {
    let account = shared(Account {
        balance: 10,
        flagged: false,
    });
    let mut ctx = DataContext::new();
    ctx.add("Account", account.clone()).unwrap();
    assert!(ctx.contains("Account"));
    assert!(matches!(ctx.get("Account"), Some(Binding::Fact(_))));
    assert_eq!(ctx.names().collect::<Vec<_>>(), ["Account"]);

    let err = ctx.add("Account", account).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateBinding(_)));

    let err = ctx.fact("Missing").err().unwrap();
    assert!(matches!(err.kind, ErrorKind::UndefinedFact(_)));

    assert!(ctx.remove("Account").is_some());
    assert!(!ctx.contains("Account"));
}

#[test]
fn function_provider_name_is_reserved() {
    let mut ctx = DataContext::new();
    let err = ctx.add(DEFUNC, shared(1_i64)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateBinding(_)));

    ctx.add_functions(FunctionRegistry::new());
    assert!(matches!(ctx.get(DEFUNC), Some(Binding::Functions(_))));
    assert!(ctx.functions().is_some());
}

#[test]
fn provider_functions_shadow_the_standard_ones() {
    let account = shared(Account {
        balance: 0,
        flagged: false,
    });
    let mut ctx = DataContext::new();
    ctx.add("Account", account.clone()).unwrap();
    ctx.add_functions(FunctionRegistry::new().with(NativeFunction::new(
        "Abs",
        Arity::Exact(1),
        |_, _| Ok(Value::Int(99)),
    )));
    run(
        "rule Fill { when Account.Balance == 0 then Account.Balance = Abs(-5); }",
        &ctx,
    )
    .unwrap();
    assert_eq!(account.borrow().balance, 99);
}

#[test]
fn provider_falls_through_to_standard_functions() {
    let account = shared(Account {
        balance: 0,
        flagged: false,
    });
    let mut ctx = DataContext::new();
    ctx.add("Account", account.clone()).unwrap();
    ctx.add_functions(FunctionRegistry::new());
    run(
        "rule Fill { when Account.Balance == 0 then Account.Balance = Max(3, 7); }",
        &ctx,
    )
    .unwrap();
    assert_eq!(account.borrow().balance, 7);
}

#[test]
fn function_facts_are_callable() {
    let account = shared(Account {
        balance: 250,
        flagged: false,
    });
    let limit = shared(HostFunction::new("Limit", Arity::Exact(0), |_| Ok(Value::Int(100))));
    let mut ctx = DataContext::new();
    ctx.add("Account", account.clone()).unwrap();
    ctx.add("Limit", limit).unwrap();
    run(
        "rule Flag { when !Account.Flagged && Account.Balance > Limit() then Account.Flagged = true; }",
        &ctx,
    )
    .unwrap();
    assert!(account.borrow().flagged);
}

#[test]
fn unknown_functions() {
    let mut ctx = DataContext::new();
    ctx.add(
        "Account",
        shared(Account {
            balance: 0,
            flagged: false,
        }),
    )
    .unwrap();
    let err = run(
        "rule Call { when Account.Balance == 0 then Account.Balance = Nope(); }",
        &ctx,
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UndefinedFunction(_)));
    assert_eq!(err.context.unwrap().rule.as_deref(), Some("Call"));
}

#[test]
fn unknown_facts() {
    let err = run("rule Read { when Ghost.X == 1 then Log(\"x\"); }", &DataContext::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UndefinedFact(_)));
}
