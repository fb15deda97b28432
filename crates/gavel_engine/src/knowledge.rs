//! Knowledge bases: named, versioned rule sets with their working memory.

use std::sync::Arc;

use gavel_foundation::{Error, ErrorKind, Result, Type};
use gavel_language::RuleDecl;
use gavel_language::pretty::pretty_print_rule;
use gavel_model::NodeArena;

use crate::builtins::FunctionRegistry;
use crate::context::DataContext;
use crate::eval::Evaluator;
use crate::memory::WorkingMemory;

/// A registered rule and its retraction flag.
#[derive(Clone, Debug)]
pub struct RuleEntry {
    decl: Arc<RuleDecl>,
    retracted: bool,
    order: usize,
}

impl RuleEntry {
    /// Rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    /// Rule description, empty if none was given.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.decl.description
    }

    /// Salience; higher fires first.
    #[must_use]
    pub fn salience(&self) -> i32 {
        self.decl.salience
    }

    /// The rule syntax tree.
    #[must_use]
    pub fn decl(&self) -> &RuleDecl {
        &self.decl
    }

    /// Shared handle to the rule syntax tree.
    #[must_use]
    pub fn shared_decl(&self) -> Arc<RuleDecl> {
        Arc::clone(&self.decl)
    }

    /// True once retracted and until the next reset.
    #[must_use]
    pub const fn is_retracted(&self) -> bool {
        self.retracted
    }

    /// Declaration order within the knowledge base.
    #[must_use]
    pub const fn order(&self) -> usize {
        self.order
    }

    /// Deterministic source rendering of the rule.
    #[must_use]
    pub fn snapshot(&self) -> String {
        pretty_print_rule(&self.decl)
    }
}

/// A named, versioned set of rules.
///
/// Rule trees are shared between clones, so taking an instance of a
/// template is cheap. Each instance has its own retraction flags and
/// working memory.
#[derive(Clone, Debug)]
pub struct KnowledgeBase {
    name: String,
    version: String,
    entries: im::Vector<RuleEntry>,
    index: im::HashMap<String, usize>,
    memory: WorkingMemory,
    next_id: u32,
}

impl KnowledgeBase {
    /// Creates an empty knowledge base.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            entries: im::Vector::new(),
            index: im::HashMap::new(),
            memory: WorkingMemory::new(),
            next_id: 0,
        }
    }

    /// Knowledge base name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Knowledge base version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Registers a rule and numbers its nodes. The variable index is not
    /// rebuilt; call [`KnowledgeBase::index_variables`] after a batch.
    ///
    /// # Errors
    ///
    /// `DuplicateRule` if a rule with this name exists.
    pub fn add_rule_entry(&mut self, mut decl: RuleDecl) -> Result<()> {
        if self.index.contains_key(&decl.name) {
            return Err(Error::new(ErrorKind::DuplicateRule(decl.name)));
        }
        self.next_id = decl.assign_ids(self.next_id);
        let order = self.entries.len();
        self.index.insert(decl.name.clone(), order);
        self.entries.push_back(RuleEntry {
            decl: Arc::new(decl),
            retracted: false,
            order,
        });
        Ok(())
    }

    /// Rebuilds the working-memory index over every registered rule.
    pub fn index_variables(&mut self) {
        self.memory
            .index_variables(self.entries.iter().map(RuleEntry::decl));
    }

    /// Clears every retraction flag and all working-memory fingerprints.
    pub fn reset(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.retracted = false;
        }
        self.memory.reset_all();
    }

    /// Retracts a rule until the next reset.
    ///
    /// # Errors
    ///
    /// `UnknownRule` if there is no such rule.
    pub fn retract(&mut self, name: &str) -> Result<()> {
        let position = self.position(name)?;
        if let Some(entry) = self.entries.get_mut(position) {
            entry.retracted = true;
        }
        Ok(())
    }

    /// Returns true if the rule is retracted.
    ///
    /// # Errors
    ///
    /// `UnknownRule` if there is no such rule.
    pub fn is_retracted(&self, name: &str) -> Result<bool> {
        let position = self.position(name)?;
        Ok(self.entries.get(position).is_some_and(RuleEntry::is_retracted))
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| Error::new(ErrorKind::UnknownRule(name.to_string())))
    }

    /// The entry for a rule.
    #[must_use]
    pub fn rule_entry(&self, name: &str) -> Option<&RuleEntry> {
        self.index.get(name).and_then(|&i| self.entries.get(i))
    }

    /// The entry at a declaration position.
    #[must_use]
    pub fn entry_at(&self, order: usize) -> Option<&RuleEntry> {
        self.entries.get(order)
    }

    /// Every entry in declaration order.
    pub fn rule_entries(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.iter()
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if a rule with this name is registered.
    #[must_use]
    pub fn contains_rule(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Working memory of this instance.
    #[must_use]
    pub fn memory(&self) -> &WorkingMemory {
        &self.memory
    }

    /// Mutable working memory of this instance.
    pub fn memory_mut(&mut self) -> &mut WorkingMemory {
        &mut self.memory
    }

    /// Every rule rendered in declaration order.
    #[must_use]
    pub fn snapshot(&self) -> String {
        self.entries
            .iter()
            .map(RuleEntry::snapshot)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A fresh instance sharing this base's rules and variable index, with
    /// no retractions and empty fingerprints.
    #[must_use]
    pub fn new_instance(&self) -> Self {
        let mut instance = self.clone();
        instance.reset();
        instance
    }

    /// Evaluates one rule's condition with the standard functions.
    ///
    /// # Errors
    ///
    /// `UnknownRule`, any evaluation error, or `TypeMismatch` if the
    /// condition is not boolean.
    pub fn evaluate_condition(&mut self, name: &str, ctx: &DataContext) -> Result<bool> {
        let decl = self.decl_of(name)?;
        let builtins = FunctionRegistry::standard();
        let arena = NodeArena::new();
        let mut evaluator = Evaluator::new(ctx, &arena, self, &builtins).in_rule(&decl.name);
        let value = evaluator
            .evaluate(&decl.when)
            .map_err(|err| err.in_rule(name))?;
        value
            .as_bool()
            .ok_or_else(|| Error::type_mismatch(Type::Bool, value.type_of()).in_rule(name))
    }

    /// Executes one action of a rule with the standard functions.
    ///
    /// # Errors
    ///
    /// `UnknownRule`, `IndexOutOfRange` for a missing action, or any
    /// execution error.
    pub fn execute_action(&mut self, name: &str, index: usize, ctx: &DataContext) -> Result<()> {
        let decl = self.decl_of(name)?;
        let statement = decl
            .then
            .get(index)
            .ok_or_else(|| Error::index_out_of_range(index, decl.then.len()).in_rule(name))?;
        let builtins = FunctionRegistry::standard();
        let arena = NodeArena::new();
        let mut evaluator = Evaluator::new(ctx, &arena, self, &builtins).in_rule(&decl.name);
        evaluator
            .execute(statement)
            .map_err(|err| err.in_rule(name))
    }

    fn decl_of(&self, name: &str) -> Result<Arc<RuleDecl>> {
        self.rule_entry(name)
            .map(RuleEntry::shared_decl)
            .ok_or_else(|| Error::new(ErrorKind::UnknownRule(name.to_string())))
    }
}
