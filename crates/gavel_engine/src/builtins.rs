//! Built-in functions callable from rules.
//!
//! A bare call such as `Now()` or `Retract("SpeedUp")` resolves to a
//! [`NativeFunction`]. Natives receive their evaluated arguments and a
//! [`CallEnv`] through which they may retract rules or reset working memory.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use gavel_foundation::{Arity, Error, ErrorKind, Result, Type, Value};
use gavel_model::methods::{check_arity, format_time, is_zero_time};
use tracing::info;

use crate::eval::compare_numbers;
use crate::knowledge::KnowledgeBase;

/// Signature of a native function body.
pub type NativeFn = dyn Fn(&[Value], &mut CallEnv<'_>) -> Result<Value>;

/// Engine state visible to a native function.
pub struct CallEnv<'a> {
    knowledge: &'a mut KnowledgeBase,
    rule: Option<&'a str>,
}

impl<'a> CallEnv<'a> {
    /// Creates an environment over a knowledge base.
    pub fn new(knowledge: &'a mut KnowledgeBase, rule: Option<&'a str>) -> Self {
        Self { knowledge, rule }
    }

    /// Name of the rule being evaluated or fired, if any.
    #[must_use]
    pub fn rule_name(&self) -> Option<&str> {
        self.rule
    }

    /// Marks a rule as retracted.
    ///
    /// # Errors
    ///
    /// `UnknownRule` if the knowledge base has no such rule.
    pub fn retract(&mut self, name: &str) -> Result<()> {
        self.knowledge.retract(name)
    }

    /// Drops the fingerprint of `path` and every path related to it, so
    /// conditions reading it are evaluated afresh.
    pub fn forget(&mut self, path: &str) {
        self.knowledge.memory_mut().forget(path);
    }

    /// Clears every fingerprint.
    pub fn reset_memory(&mut self) {
        self.knowledge.memory_mut().reset_all();
    }

    /// The knowledge base being executed.
    #[must_use]
    pub fn knowledge_base(&self) -> &KnowledgeBase {
        self.knowledge
    }
}

/// A named callable with a checked arity.
pub struct NativeFunction {
    name: String,
    arity: Arity,
    func: Box<NativeFn>,
}

impl NativeFunction {
    /// Wraps a closure.
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        func: impl Fn(&[Value], &mut CallEnv<'_>) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            func: Box::new(func),
        }
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted argument counts.
    #[must_use]
    pub const fn arity(&self) -> Arity {
        self.arity
    }

    /// Checks the arity, then runs the function.
    ///
    /// # Errors
    ///
    /// `ArityMismatch`, or whatever the function returns, with the function
    /// name pushed as a frame.
    pub fn call(&self, args: &[Value], env: &mut CallEnv<'_>) -> Result<Value> {
        check_arity(&self.name, self.arity, args)?;
        (self.func)(args, env).map_err(|e| e.with_frame(self.name.clone()))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// A source of native functions, bound into a data context under `DEFUNC`.
pub trait FunctionProvider {
    /// Looks up a function by name.
    fn function(&self, name: &str) -> Option<&NativeFunction>;

    /// Names of all provided functions.
    fn function_names(&self) -> Vec<&str>;
}

/// A table of native functions.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, NativeFunction>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the standard functions.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        register_standard(&mut registry);
        registry
    }

    /// Adds a function, returning any function it replaced.
    pub fn register(&mut self, function: NativeFunction) -> Option<NativeFunction> {
        self.functions.insert(function.name.clone(), function)
    }

    /// Builder form of [`FunctionRegistry::register`].
    #[must_use]
    pub fn with(mut self, function: NativeFunction) -> Self {
        self.register(function);
        self
    }

    /// Returns true if a function with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if no function is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FunctionProvider for FunctionRegistry {
    fn function(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name)
    }

    fn function_names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }
}

fn string_arg(args: &[Value], index: usize) -> Result<&str> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(Error::type_mismatch(Type::String, other.type_of())),
        None => Err(Error::type_mismatch(Type::String, Type::Nil)),
    }
}

fn number_arg(args: &[Value], index: usize) -> Result<&Value> {
    match args.get(index) {
        Some(value) if value.is_numeric() => Ok(value),
        Some(other) => Err(Error::type_mismatch(Type::Float, other.type_of())),
        None => Err(Error::type_mismatch(Type::Float, Type::Nil)),
    }
}

/// Picks the extreme of numeric arguments. The result is a float if any
/// argument is.
#[allow(clippy::cast_precision_loss)]
fn extreme(args: &[Value], wanted: Ordering) -> Result<Value> {
    let mut best = number_arg(args, 0)?;
    for index in 1..args.len() {
        let candidate = number_arg(args, index)?;
        if compare_numbers(candidate, best) == Some(wanted) {
            best = candidate;
        }
    }
    let any_float = args.iter().any(|v| matches!(v, Value::Float(_)));
    match best {
        Value::Int(n) if any_float => Ok(Value::Float(*n as f64)),
        other => Ok(other.clone()),
    }
}

fn register_standard(registry: &mut FunctionRegistry) {
    registry.register(NativeFunction::new("Log", Arity::Exact(1), |args, env| {
        match env.rule_name() {
            Some(rule) => info!(rule, message = %args[0], "rule log"),
            None => info!(message = %args[0], "rule log"),
        }
        Ok(Value::Nil)
    }));

    registry.register(NativeFunction::new("Now", Arity::Exact(0), |_, _| {
        Ok(Value::Time(Utc::now()))
    }));

    registry.register(NativeFunction::new(
        "TimeFormat",
        Arity::Exact(2),
        |args, _| {
            let time = args[0]
                .as_time()
                .ok_or_else(|| Error::type_mismatch(Type::Time, args[0].type_of()))?;
            let layout = string_arg(args, 1)?;
            format_time(&time, layout).map(Value::from)
        },
    ));

    registry.register(NativeFunction::new("IsZero", Arity::Exact(1), |args, _| {
        match &args[0] {
            Value::Nil => Ok(Value::Bool(true)),
            Value::Time(t) => Ok(Value::Bool(is_zero_time(t))),
            other => Err(Error::type_mismatch(Type::Time, other.type_of())),
        }
    }));

    registry.register(NativeFunction::new("Retract", Arity::Exact(1), |args, env| {
        let rule = string_arg(args, 0)?;
        env.retract(rule)?;
        Ok(Value::Nil)
    }));

    // Changed and Forget both drop fingerprints; Changed reads as
    // "I mutated this behind the engine's back".
    for name in ["Changed", "Forget"] {
        registry.register(NativeFunction::new(name, Arity::Exact(1), |args, env| {
            let path = string_arg(args, 0)?;
            env.forget(path);
            Ok(Value::Nil)
        }));
    }

    registry.register(NativeFunction::new("Abs", Arity::Exact(1), |args, _| {
        match number_arg(args, 0)? {
            Value::Int(n) => n
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| Error::new(ErrorKind::Overflow("Abs".into()))),
            Value::Float(n) => Ok(Value::Float(n.abs())),
            _ => Ok(Value::Nil),
        }
    }));

    registry.register(NativeFunction::new("Max", Arity::Variadic(1), |args, _| {
        extreme(args, Ordering::Greater)
    }));

    registry.register(NativeFunction::new("Min", Arity::Variadic(1), |args, _| {
        extreme(args, Ordering::Less)
    }));
}
