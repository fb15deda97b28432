//! Memoized condition evaluation gives the same results as full evaluation,
//! including when one thermostat is bound under two names and conditions
//! call methods that change facts.

use gavel_engine::{
    DataContext, EngineConfig, ExecutionReport, KnowledgeLibrary, RuleBuilder, RuleEngine,
};
use gavel_foundation::Value;
use gavel_model::{Shared, record, shared};
use proptest::prelude::*;

struct Thermostat {
    current: i64,
    target: i64,
    heating: bool,
    cooling: bool,
    adjustments: i64,
}

record! {
    Thermostat {
        "Current" => current,
        "Target" => target,
        "Heating" => heating,
        "Cooling" => cooling,
        "Adjustments" => adjustments,
    }
    methods {
        "Nudge"(1) => |t, args| {
            if let Value::Int(step) = args[0] {
                t.current += step;
            }
            Ok(Value::Nil)
        },
    }
}

struct Reading {
    value: i64,
}

record! {
    Reading {
        "Value" => value,
    }
}

const CLIMATE_RULES: &str = r#"
rule StartHeating salience 20 {
    when T.Current < T.Target && !T.Heating
    then T.Heating = true; T.Cooling = false;
}
rule StartCooling salience 20 {
    when T.Current > T.Target && !T.Cooling
    then T.Cooling = true; T.Heating = false;
}
rule Heat salience 10 {
    when T.Heating && T.Current < T.Target
    then T.Current += 2; T.Adjustments += 1;
}
rule Cool salience 10 {
    when T.Cooling && T.Current > T.Target
    then T.Nudge(-3); T.Adjustments += 1;
}
rule Settle {
    when (T.Heating || T.Cooling) && T.Current == T.Target
    then T.Heating = false; T.Cooling = false;
}
rule Record {
    when Sensor.Value != T.Current && !T.Heating && !T.Cooling
    then Sensor.Value = T.Current;
}
"#;

struct Gauge {
    ticks: i64,
}

record! {
    Gauge {
        "Ticks" => ticks,
    }
    methods {
        "Sample"(0) => |gauge, _| {
            gauge.ticks += 1;
            Ok(Value::Bool(false))
        },
    }
}

const MIRRORED_RULES: &str = r#"
rule Notice salience 20 {
    when Display.Current == Display.Target && !Display.Heating
    then Display.Heating = true; Display.Adjustments += 1;
}
rule Warm salience 10 {
    when T.Current < T.Target
    then T.Current += 1;
}
rule Sample salience 15 {
    when G.Sample()
    then Log("unreachable");
}
rule Alarm {
    when G.Ticks > 4 && !T.Cooling
    then T.Cooling = true;
}
"#;

type State = (i64, i64, bool, bool, i64, i64);

fn run(config: EngineConfig, current: i64, target: i64) -> (ExecutionReport, State) {
    let mut library = KnowledgeLibrary::new();
    RuleBuilder::new(&mut library)
        .build_rule_from_source("Climate", "1", CLIMATE_RULES)
        .unwrap();
    let mut kb = library.new_knowledge_base_instance("Climate", "1").unwrap();

    let thermostat: Shared<Thermostat> = shared(Thermostat {
        current,
        target,
        heating: false,
        cooling: false,
        adjustments: 0,
    });
    let sensor = shared(Reading { value: -1 });
    let mut ctx = DataContext::new();
    ctx.add("T", thermostat.clone()).unwrap();
    ctx.add("Sensor", sensor.clone()).unwrap();

    let report = RuleEngine::new(config).execute(&ctx, &mut kb).unwrap();
    let t = thermostat.borrow();
    let state = (
        t.current,
        t.target,
        t.heating,
        t.cooling,
        t.adjustments,
        sensor.borrow().value,
    );
    (report, state)
}

#[test]
fn heating_run() {
    let (report, state) = run(EngineConfig::default(), 10, 16);
    assert_eq!(
        report.fired,
        ["StartHeating", "Heat", "Heat", "Heat", "Settle", "Record"]
    );
    assert_eq!(state, (16, 16, false, false, 3, 16));
}

#[test]
fn cooling_through_a_method_call() {
    let (report, state) = run(EngineConfig::default(), 25, 19);
    assert_eq!(
        report.fired,
        ["StartCooling", "Cool", "Cool", "Settle", "Record"]
    );
    assert_eq!(state, (19, 19, false, false, 2, 19));
}

#[test]
fn already_settled() {
    let (report, state) = run(EngineConfig::default(), 20, 20);
    assert_eq!(report.fired, ["Record"]);
    assert_eq!(state.5, 20);
}

#[test]
fn fingerprints_can_persist_between_runs() {
    let mut library = KnowledgeLibrary::new();
    RuleBuilder::new(&mut library)
        .build_rule_from_source("Climate", "1", CLIMATE_RULES)
        .unwrap();
    let mut kb = library.new_knowledge_base_instance("Climate", "1").unwrap();
    let thermostat = shared(Thermostat {
        current: 20,
        target: 20,
        heating: false,
        cooling: false,
        adjustments: 0,
    });
    let sensor = shared(Reading { value: 20 });
    let mut ctx = DataContext::new();
    ctx.add("T", thermostat.clone()).unwrap();
    ctx.add("Sensor", sensor).unwrap();

    let engine = RuleEngine::new(EngineConfig::default().with_reset_fingerprints(false));
    engine.execute(&ctx, &mut kb).unwrap();
    assert!(kb.memory().fingerprint("T.Current").is_some());

    thermostat.borrow_mut().target = 24;
    let report = engine.execute(&ctx, &mut kb).unwrap();
    assert_eq!(report.fired.first().map(String::as_str), Some("StartHeating"));
    assert_eq!(thermostat.borrow().current, 24);
}

fn run_mirrored(config: EngineConfig, current: i64, target: i64) -> (ExecutionReport, State) {
    let mut library = KnowledgeLibrary::new();
    RuleBuilder::new(&mut library)
        .build_rule_from_source("Mirrored", "1", MIRRORED_RULES)
        .unwrap();
    let mut kb = library.new_knowledge_base_instance("Mirrored", "1").unwrap();

    let thermostat = shared(Thermostat {
        current,
        target,
        heating: false,
        cooling: false,
        adjustments: 0,
    });
    let gauge = shared(Gauge { ticks: 0 });
    let mut ctx = DataContext::new();
    ctx.add("T", thermostat.clone()).unwrap();
    ctx.add("Display", thermostat.clone()).unwrap();
    ctx.add("G", gauge.clone()).unwrap();

    let report = RuleEngine::new(config).execute(&ctx, &mut kb).unwrap();
    let t = thermostat.borrow();
    let state = (
        t.current,
        t.target,
        t.heating,
        t.cooling,
        t.adjustments,
        gauge.borrow().ticks,
    );
    (report, state)
}

#[test]
fn one_thermostat_under_two_names() {
    for config in [
        EngineConfig::default(),
        EngineConfig::default().with_memoize_conditions(false),
    ] {
        let (report, state) = run_mirrored(config, 0, 3);
        assert_eq!(report.fired, ["Warm", "Warm", "Warm", "Notice", "Alarm"]);
        assert_eq!(report.cycles, 6);
        assert_eq!(state, (3, 3, true, true, 1, 6));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn aliased_and_calling_conditions_agree(current in -5_i64..8, target in -5_i64..8) {
        let (memo_report, memo_state) = run_mirrored(EngineConfig::default(), current, target);
        let (full_report, full_state) = run_mirrored(EngineConfig::default().with_memoize_conditions(false), current, target);
        prop_assert_eq!(memo_report, full_report);
        prop_assert_eq!(memo_state, full_state);
    }

    #[test]
    fn memoized_and_full_evaluation_agree(current in -30_i64..30, target in -30_i64..30) {
        let (memo_report, memo_state) = run(EngineConfig::default(), current, target);
        let (full_report, full_state) = run(EngineConfig::default().with_memoize_conditions(false), current, target);
        prop_assert_eq!(memo_report.fired, full_report.fired);
        prop_assert_eq!(memo_report.cycles, full_report.cycles);
        prop_assert_eq!(memo_state, full_state);
    }
}
