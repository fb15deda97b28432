//! Working memory: what the engine has seen of the facts.
//!
//! Three tables, all keyed by identity path (`TestCar.Speed`,
//! `actor.Children["Christen"]`):
//!
//! - fingerprints: hash of the value last read or written at a path
//! - the variable index: which AST nodes name a path, rebuilt by
//!   [`WorkingMemory::index_variables`] whenever rules are registered
//! - the condition memo: the last result of each call-free condition and
//!   the fingerprints it read
//!
//! The memo is only consulted while every fingerprint it recorded is still
//! current, so a memoized execution fires exactly what full re-evaluation
//! would. Paths rooted at an alias of another binding are stored under the
//! canonical root, so a write through one name is seen through every name.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use gavel_foundation::Value;
use gavel_language::visitor::{assignment_targets, collect_paths, contains_calls};
use gavel_language::{AstId, RuleDecl, Statement};

/// What a rule reads and writes, from its syntax alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSummary {
    /// Static paths read by the condition, prefixes included.
    pub reads: BTreeSet<String>,
    /// Static paths assigned by the actions.
    pub writes: BTreeSet<String>,
    /// True if some action assigns through a computed index.
    pub dynamic_writes: bool,
    /// True if the condition calls a function or method.
    pub condition_calls: bool,
    /// True if some action calls a function or method.
    pub action_calls: bool,
}

#[derive(Clone, Debug)]
struct Memo {
    result: bool,
    observed: Vec<(String, u64)>,
}

/// Fingerprints, variable index and condition memo of one knowledge base.
#[derive(Clone, Debug, Default)]
pub struct WorkingMemory {
    fingerprints: HashMap<String, u64>,
    index: im::OrdMap<String, im::OrdSet<AstId>>,
    summaries: im::HashMap<String, RuleSummary>,
    memo: HashMap<String, Memo>,
    aliases: BTreeMap<String, String>,
}

/// Returns true if one path is the other, or names a value inside it.
#[must_use]
pub fn paths_related(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    match long.strip_prefix(short) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}

impl WorkingMemory {
    /// Creates an empty working memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the variable index and rule summaries from scratch, and
    /// drops the memo.
    pub fn index_variables<'r>(&mut self, rules: impl IntoIterator<Item = &'r RuleDecl>) {
        let mut index: im::OrdMap<String, im::OrdSet<AstId>> = im::OrdMap::new();
        let mut summaries = im::HashMap::new();

        for rule in rules {
            let mut summary = RuleSummary {
                condition_calls: contains_calls(&rule.when),
                ..RuleSummary::default()
            };
            for (path, id) in collect_paths(&rule.when) {
                index.entry(path.clone()).or_default().insert(id);
                summary.reads.insert(path);
            }
            for statement in &rule.then {
                let exprs = match statement {
                    Statement::Assignment(a) => vec![&a.target, &a.value],
                    Statement::Expression(e) => vec![e],
                    Statement::Retract { .. } => vec![],
                };
                for expr in exprs {
                    summary.action_calls |= contains_calls(expr);
                    for (path, id) in collect_paths(expr) {
                        index.entry(path).or_default().insert(id);
                    }
                }
            }
            let writes = assignment_targets(rule);
            summary.writes = writes.targets;
            summary.dynamic_writes = writes.dynamic;
            summaries.insert(rule.name.clone(), summary);
        }

        self.index = index;
        self.summaries = summaries;
        self.memo.clear();
    }

    /// Installs the binding aliases of the context being evaluated. A
    /// different alias table drops every fingerprint and the memo.
    pub fn set_aliases(&mut self, aliases: &BTreeMap<String, String>) {
        if &self.aliases != aliases {
            self.reset_all();
            self.aliases.clone_from(aliases);
        }
    }

    /// `path` with its root binding replaced by the canonical one.
    fn key<'p>(&self, path: &'p str) -> Cow<'p, str> {
        if self.aliases.is_empty() {
            return Cow::Borrowed(path);
        }
        let end = path.find(['.', '[']).unwrap_or(path.len());
        match self.aliases.get(&path[..end]) {
            Some(root) => Cow::Owned(format!("{root}{}", &path[end..])),
            None => Cow::Borrowed(path),
        }
    }

    /// Records a read. Returns true if the value differs from the last one
    /// seen at `path` (or nothing was seen).
    pub fn observe(&mut self, path: &str, value: &Value) -> bool {
        let fingerprint = value.fingerprint();
        let key = self.key(path).into_owned();
        self.fingerprints.insert(key, fingerprint) != Some(fingerprint)
    }

    /// Records a write. Fingerprints of related paths are dropped, since
    /// whatever was read through or inside `path` may have changed.
    pub fn record_write(&mut self, path: &str, value: &Value) {
        self.forget(path);
        let key = self.key(path).into_owned();
        self.fingerprints.insert(key, value.fingerprint());
    }

    /// The fingerprint last recorded at `path`.
    #[must_use]
    pub fn fingerprint(&self, path: &str) -> Option<u64> {
        self.fingerprints.get(self.key(path).as_ref()).copied()
    }

    /// Number of paths with a fingerprint.
    #[must_use]
    pub fn fingerprint_count(&self) -> usize {
        self.fingerprints.len()
    }

    /// Drops the fingerprint of `path` and of every related path.
    pub fn forget(&mut self, path: &str) {
        let key = self.key(path).into_owned();
        self.fingerprints.retain(|known, _| !paths_related(known, &key));
    }

    /// Clears every fingerprint and the memo.
    pub fn reset_all(&mut self) {
        self.fingerprints.clear();
        self.memo.clear();
    }

    /// AST nodes that name `path` exactly.
    #[must_use]
    pub fn dependents(&self, path: &str) -> Vec<AstId> {
        self.index
            .get(path)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Names of rules whose condition reads `path` or a related path, sorted.
    #[must_use]
    pub fn rules_reading(&self, path: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .summaries
            .iter()
            .filter(|(_, summary)| summary.reads.iter().any(|read| paths_related(read, path)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Every indexed path, sorted.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// The syntax summary of a rule, if indexed.
    #[must_use]
    pub fn summary(&self, rule: &str) -> Option<&RuleSummary> {
        self.summaries.get(rule)
    }

    /// The memoized result of a rule's condition, if every path it read
    /// still carries the fingerprint seen at the time.
    #[must_use]
    pub fn memoized(&self, rule: &str) -> Option<bool> {
        let memo = self.memo.get(rule)?;
        memo.observed
            .iter()
            .all(|(path, fingerprint)| self.fingerprint(path) == Some(*fingerprint))
            .then_some(memo.result)
    }

    /// Stores a condition result with the reads it depended on.
    pub fn memoize(&mut self, rule: &str, result: bool, observed: Vec<(String, u64)>) {
        self.memo
            .insert(rule.to_string(), Memo { result, observed });
    }

    /// Drops every memoized condition.
    pub fn clear_memo(&mut self) {
        self.memo.clear();
    }
}
