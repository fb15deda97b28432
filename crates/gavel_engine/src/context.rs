//! Named bindings visible to rules during one execution.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use gavel_foundation::{Error, ErrorKind, Result};
use gavel_model::Handle;

use crate::builtins::FunctionProvider;

/// Reserved binding name of the function provider.
pub const DEFUNC: &str = "DEFUNC";

/// What a name in the data context refers to.
#[derive(Clone)]
pub enum Binding {
    /// A host object.
    Fact(Handle),
    /// A table of native functions.
    Functions(Rc<dyn FunctionProvider>),
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fact(handle) => match handle.try_borrow() {
                Ok(fact) => write!(f, "Fact({})", fact.type_name()),
                Err(_) => f.write_str("Fact(<borrowed>)"),
            },
            Self::Functions(provider) => write!(f, "Functions({:?})", provider.function_names()),
        }
    }
}

/// Facts and function providers bound for one execution.
///
/// Holds facts by shared handle, so the host keeps its own reference and
/// sees every mutation. Not `Send`: a context belongs to one thread.
///
/// One handle may be bound under several names. Working memory then tracks
/// all of them under the first such name in sorted order, see
/// [`DataContext::canonical_name`].
#[derive(Clone, Debug, Default)]
pub struct DataContext {
    bindings: BTreeMap<String, Binding>,
    aliases: BTreeMap<String, String>,
}

impl DataContext {
    /// Creates an empty context. Rules still see the standard functions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a fact under `name`.
    ///
    /// ```
    /// use gavel_engine::DataContext;
    /// use gavel_model::shared;
    ///
    /// let speed = shared(10_i64);
    /// let mut ctx = DataContext::new();
    /// ctx.add("Speed", speed.clone()).unwrap();
    /// assert!(ctx.add("Speed", speed).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// `DuplicateBinding` if the name is taken or reserved.
    pub fn add(&mut self, name: impl Into<String>, fact: Handle) -> Result<()> {
        self.bind(name.into(), Binding::Fact(fact))
    }

    /// Binds the function provider that bare calls such as `Log(...)` are
    /// looked up in, replacing any earlier one. Names it does not provide
    /// fall through to the standard functions.
    pub fn add_functions(&mut self, provider: impl FunctionProvider + 'static) {
        self.bindings
            .insert(DEFUNC.to_string(), Binding::Functions(Rc::new(provider)));
    }

    fn bind(&mut self, name: String, binding: Binding) -> Result<()> {
        if name == DEFUNC || self.bindings.contains_key(&name) {
            return Err(Error::new(ErrorKind::DuplicateBinding(name)));
        }
        self.bindings.insert(name, binding);
        self.rebuild_aliases();
        Ok(())
    }

    fn rebuild_aliases(&mut self) {
        let mut first: HashMap<*const (), &str> = HashMap::new();
        let mut aliases = BTreeMap::new();
        for (name, binding) in &self.bindings {
            let Binding::Fact(handle) = binding else {
                continue;
            };
            match first.entry(Rc::as_ptr(handle).cast::<()>()) {
                Entry::Occupied(earlier) => {
                    aliases.insert(name.clone(), (*earlier.get()).to_string());
                }
                Entry::Vacant(slot) => {
                    slot.insert(name);
                }
            }
        }
        self.aliases = aliases;
    }

    /// The fact bound under `name`.
    ///
    /// # Errors
    ///
    /// `UndefinedFact` if nothing, or a function provider, is bound there.
    pub fn fact(&self, name: &str) -> Result<Handle> {
        match self.bindings.get(name) {
            Some(Binding::Fact(handle)) => Ok(Rc::clone(handle)),
            _ => Err(Error::new(ErrorKind::UndefinedFact(name.to_string()))),
        }
    }

    /// The bound function provider, if any.
    #[must_use]
    pub fn functions(&self) -> Option<&dyn FunctionProvider> {
        match self.bindings.get(DEFUNC) {
            Some(Binding::Functions(provider)) => Some(provider.as_ref()),
            _ => None,
        }
    }

    /// The binding under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Returns true if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Removes a binding.
    pub fn remove(&mut self, name: &str) -> Option<Binding> {
        let removed = self.bindings.remove(name);
        self.rebuild_aliases();
        removed
    }

    /// The first name, in sorted order, bound to the same fact as `name`.
    /// Names that share no handle map to themselves.
    #[must_use]
    pub fn canonical_name<'n>(&'n self, name: &'n str) -> &'n str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    /// Every name bound to an already bound fact, with its canonical name.
    #[must_use]
    pub const fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Bound names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}
