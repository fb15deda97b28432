//! The knowledge library and the rule builder that fills it.
//!
//! Hosts build rules once into a template knowledge base and take a fresh
//! instance per execution:
//!
//! ```
//! use gavel_engine::{KnowledgeLibrary, RuleBuilder};
//!
//! let mut library = KnowledgeLibrary::new();
//! RuleBuilder::new(&mut library)
//!     .build_rule_from_source("Tutorial", "0.0.1", r#"rule Hello { when true then Log("hi"); }"#)
//!     .unwrap();
//! let kb = library.new_knowledge_base_instance("Tutorial", "0.0.1").unwrap();
//! assert!(kb.contains_rule("Hello"));
//! ```

use std::collections::HashMap;

use gavel_foundation::{Error, ErrorKind, Result};
use gavel_language::{RuleDecl, parse};
use tracing::debug;

use crate::knowledge::KnowledgeBase;

/// Template knowledge bases keyed by name and version.
#[derive(Clone, Debug, Default)]
pub struct KnowledgeLibrary {
    bases: HashMap<(String, String), KnowledgeBase>,
}

impl KnowledgeLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The template for `name`/`version`, created empty if absent.
    pub fn get_knowledge_base(&mut self, name: &str, version: &str) -> &mut KnowledgeBase {
        self.bases
            .entry((name.to_string(), version.to_string()))
            .or_insert_with(|| KnowledgeBase::new(name, version))
    }

    /// The template for `name`/`version`, if present.
    #[must_use]
    pub fn knowledge_base(&self, name: &str, version: &str) -> Option<&KnowledgeBase> {
        self.bases.get(&(name.to_string(), version.to_string()))
    }

    /// A fresh instance of a template: shared rules, no retractions and
    /// empty working memory.
    ///
    /// # Errors
    ///
    /// `UnknownKnowledgeBase` if no such template exists.
    pub fn new_knowledge_base_instance(&self, name: &str, version: &str) -> Result<KnowledgeBase> {
        self.knowledge_base(name, version)
            .map(KnowledgeBase::new_instance)
            .ok_or_else(|| {
                Error::new(ErrorKind::UnknownKnowledgeBase {
                    name: name.to_string(),
                    version: version.to_string(),
                })
            })
    }

    /// Returns true if a template exists for `name`/`version`.
    #[must_use]
    pub fn contains(&self, name: &str, version: &str) -> bool {
        self.knowledge_base(name, version).is_some()
    }

    /// Removes a template.
    pub fn remove(&mut self, name: &str, version: &str) -> Option<KnowledgeBase> {
        self.bases.remove(&(name.to_string(), version.to_string()))
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Returns true if the library holds no template.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    fn insert(&mut self, kb: KnowledgeBase) {
        self.bases
            .insert((kb.name().to_string(), kb.version().to_string()), kb);
    }
}

/// Registers rules into a library, all or nothing per batch.
#[derive(Debug)]
pub struct RuleBuilder<'a> {
    library: &'a mut KnowledgeLibrary,
}

impl<'a> RuleBuilder<'a> {
    /// Creates a builder over a library.
    pub fn new(library: &'a mut KnowledgeLibrary) -> Self {
        Self { library }
    }

    /// Parses rule source and registers every rule in it.
    ///
    /// Returns the number of rules added.
    ///
    /// # Errors
    ///
    /// `LexicalError` or `SyntaxError` from parsing, `DuplicateRule` if a
    /// name is already registered or repeats within the source. Nothing is
    /// registered on error.
    pub fn build_rule_from_source(&mut self, name: &str, version: &str, source: &str) -> Result<usize> {
        let decls = parse(source)?;
        self.build_rules(name, version, decls)
    }

    /// Registers externally built rule trees.
    ///
    /// # Errors
    ///
    /// `DuplicateRule`; nothing is registered on error.
    pub fn build_rules(&mut self, name: &str, version: &str, decls: Vec<RuleDecl>) -> Result<usize> {
        let mut staged = self
            .library
            .knowledge_base(name, version)
            .cloned()
            .unwrap_or_else(|| KnowledgeBase::new(name, version));

        let count = decls.len();
        for decl in decls {
            staged.add_rule_entry(decl)?;
        }
        staged.index_variables();

        debug!(
            knowledge_base = name,
            version,
            added = count,
            total = staged.len(),
            "rules registered"
        );
        self.library.insert(staged);
        Ok(count)
    }
}
