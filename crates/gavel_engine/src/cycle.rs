//! The rule cycle engine.
//!
//! Each cycle evaluates the condition of every rule that is not retracted,
//! picks the matching rule with the highest salience (earliest declared on
//! ties), and runs its actions. Execution stops at the first cycle in which
//! no rule matches.

use gavel_foundation::{Error, ErrorKind, Result, Type};
use gavel_model::NodeArena;
use tracing::{debug, trace, warn};

use crate::builtins::{FunctionRegistry, NativeFunction};
use crate::config::EngineConfig;
use crate::context::DataContext;
use crate::eval::Evaluator;
use crate::knowledge::{KnowledgeBase, RuleEntry};

/// Outcome of a completed execution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Evaluation passes, including the final one in which nothing matched.
    pub cycles: u64,
    /// Names of fired rules in firing order.
    pub fired: Vec<String>,
}

/// Hooks called as an execution proceeds.
#[allow(unused_variables)]
pub trait ExecutionListener {
    /// A new evaluation pass begins.
    fn begin_cycle(&mut self, cycle: u64) {}

    /// A rule's condition was evaluated.
    fn evaluate_rule(&mut self, cycle: u64, entry: &RuleEntry, matched: bool) {}

    /// A rule was selected and is about to fire.
    fn execute_rule(&mut self, cycle: u64, entry: &RuleEntry) {}
}

struct Silent;

impl ExecutionListener for Silent {}

/// An event seen by a [`RecordingListener`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// An evaluation pass began.
    BeginCycle(u64),
    /// A condition was evaluated.
    Evaluated {
        /// Cycle number.
        cycle: u64,
        /// Rule name.
        rule: String,
        /// Condition result.
        matched: bool,
    },
    /// A rule fired.
    Executed {
        /// Cycle number.
        cycle: u64,
        /// Rule name.
        rule: String,
    },
}

/// Listener that keeps every event.
#[derive(Clone, Debug, Default)]
pub struct RecordingListener {
    /// Events in the order they happened.
    pub events: Vec<ExecutionEvent>,
}

impl RecordingListener {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of fired rules in firing order.
    #[must_use]
    pub fn fired(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ExecutionEvent::Executed { rule, .. } => Some(rule.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ExecutionListener for RecordingListener {
    fn begin_cycle(&mut self, cycle: u64) {
        self.events.push(ExecutionEvent::BeginCycle(cycle));
    }

    fn evaluate_rule(&mut self, cycle: u64, entry: &RuleEntry, matched: bool) {
        self.events.push(ExecutionEvent::Evaluated {
            cycle,
            rule: entry.name().to_string(),
            matched,
        });
    }

    fn execute_rule(&mut self, cycle: u64, entry: &RuleEntry) {
        self.events.push(ExecutionEvent::Executed {
            cycle,
            rule: entry.name().to_string(),
        });
    }
}

/// Runs knowledge bases against data contexts.
#[derive(Debug)]
pub struct RuleEngine {
    config: EngineConfig,
    builtins: FunctionRegistry,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RuleEngine {
    /// Creates an engine with the standard functions.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            builtins: FunctionRegistry::standard(),
        }
    }

    /// Adds an engine-wide function, available to every context that does
    /// not provide one of the same name.
    #[must_use]
    pub fn with_function(mut self, function: NativeFunction) -> Self {
        self.builtins.register(function);
        self
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The engine-wide function table.
    pub fn builtins_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.builtins
    }

    /// Runs rules until none matches.
    ///
    /// # Errors
    ///
    /// The first evaluation or action error, tagged with the rule name;
    /// `TypeMismatch` for a non-boolean condition; `MaxCycleExceeded` once
    /// more than `max_cycle` rules have fired.
    pub fn execute(&self, ctx: &DataContext, kb: &mut KnowledgeBase) -> Result<ExecutionReport> {
        self.execute_with_listener(ctx, kb, &mut Silent)
    }

    /// As [`RuleEngine::execute`], reporting progress to `listener`.
    ///
    /// # Errors
    ///
    /// As for [`RuleEngine::execute`].
    pub fn execute_with_listener(
        &self,
        ctx: &DataContext,
        kb: &mut KnowledgeBase,
        listener: &mut dyn ExecutionListener,
    ) -> Result<ExecutionReport> {
        if self.config.reset_fingerprints {
            kb.memory_mut().reset_all();
        } else {
            kb.memory_mut().clear_memo();
        }

        let result = self.run(ctx, kb, listener);
        match &result {
            Ok(report) => debug!(
                knowledge_base = kb.name(),
                cycles = report.cycles,
                fired = report.fired.len(),
                "execution finished"
            ),
            Err(err) => warn!(knowledge_base = kb.name(), error = %err, "execution aborted"),
        }
        result
    }

    fn run(
        &self,
        ctx: &DataContext,
        kb: &mut KnowledgeBase,
        listener: &mut dyn ExecutionListener,
    ) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::default();
        loop {
            report.cycles += 1;
            let cycle = report.cycles;
            listener.begin_cycle(cycle);

            let activations = self.find_activations(ctx, kb, cycle, listener)?;
            let Some(entry) = activations.into_iter().next() else {
                break;
            };

            let fired = report.fired.len() as u64 + 1;
            if fired > self.config.max_cycle {
                let limit = self.config.max_cycle;
                return Err(Error::new(ErrorKind::MaxCycleExceeded { limit }).in_rule(entry.name()));
            }

            debug!(rule = entry.name(), salience = entry.salience(), cycle, "firing rule");
            listener.execute_rule(cycle, &entry);
            self.fire(ctx, kb, &entry)?;
            report.fired.push(entry.name().to_string());
        }
        Ok(report)
    }

    /// Rules whose condition currently holds, highest salience first and
    /// declaration order on ties. Nothing fires.
    ///
    /// # Errors
    ///
    /// As for condition evaluation in [`RuleEngine::execute`].
    pub fn fetch_matching_rules(
        &self,
        ctx: &DataContext,
        kb: &mut KnowledgeBase,
    ) -> Result<Vec<RuleEntry>> {
        kb.memory_mut().clear_memo();
        self.find_activations(ctx, kb, 1, &mut Silent)
    }

    fn find_activations(
        &self,
        ctx: &DataContext,
        kb: &mut KnowledgeBase,
        cycle: u64,
        listener: &mut dyn ExecutionListener,
    ) -> Result<Vec<RuleEntry>> {
        let candidates: Vec<RuleEntry> = kb
            .rule_entries()
            .filter(|entry| !entry.is_retracted())
            .cloned()
            .collect();

        let mut activations = Vec::new();
        for entry in candidates {
            let matched = self.matches(ctx, kb, &entry)?;
            listener.evaluate_rule(cycle, &entry, matched);
            if matched {
                activations.push(entry);
            }
        }

        activations.sort_by(|a, b| {
            b.salience()
                .cmp(&a.salience())
                .then_with(|| a.order().cmp(&b.order()))
        });
        Ok(activations)
    }

    fn matches(&self, ctx: &DataContext, kb: &mut KnowledgeBase, entry: &RuleEntry) -> Result<bool> {
        let name = entry.name();
        let calls = kb
            .memory()
            .summary(name)
            .is_none_or(|summary| summary.condition_calls);
        let memoizable = self.config.memoize_conditions && !calls;
        let memoized = if memoizable {
            kb.memory().memoized(name)
        } else {
            None
        };
        if let Some(result) = memoized {
            trace!(rule = name, result, "condition memoized");
            return Ok(result);
        }

        let decl = entry.shared_decl();
        let arena = NodeArena::new();
        let mut evaluator = Evaluator::new(ctx, &arena, kb, &self.builtins).in_rule(name);
        let value = evaluator
            .evaluate(&decl.when)
            .map_err(|err| err.in_rule(name))?;
        let reads = evaluator.take_reads();
        let cacheable = evaluator.is_cacheable();

        let result = value
            .as_bool()
            .ok_or_else(|| Error::type_mismatch(Type::Bool, value.type_of()).in_rule(name))?;
        if memoizable && cacheable {
            kb.memory_mut().memoize(name, result, reads);
        }
        // A method called by the condition may have mutated a fact.
        if calls {
            kb.memory_mut().clear_memo();
        }
        trace!(rule = name, result, "condition evaluated");
        Ok(result)
    }

    fn fire(&self, ctx: &DataContext, kb: &mut KnowledgeBase, entry: &RuleEntry) -> Result<()> {
        let name = entry.name();
        let decl = entry.shared_decl();
        let arena = NodeArena::new();
        let mut evaluator = Evaluator::new(ctx, &arena, kb, &self.builtins).in_rule(name);
        for statement in &decl.then {
            evaluator
                .execute(statement)
                .map_err(|err| err.in_rule(name))?;
        }

        // Calls may touch facts without recording a write.
        if kb
            .memory()
            .summary(name)
            .is_none_or(|summary| summary.action_calls)
        {
            kb.memory_mut().clear_memo();
        }
        Ok(())
    }
}
