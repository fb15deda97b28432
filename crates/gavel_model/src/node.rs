//! Value nodes: addressable views into bound facts.
//!
//! A [`ValueNode`] names one position inside a fact, such as
//! `actor.Friends[0].Name`. Nodes live in a [`NodeArena`] that is created for
//! a single evaluation and dropped afterwards. Each arena entry records only
//! how it was reached (its parent index and selector); every access walks
//! from the root handle again, so a node always sees the live value.

use std::cell::RefCell;
use std::fmt::{self, Write as _};
use std::rc::Rc;

use gavel_foundation::{Error, ErrorKind, Result, Type, Value};

use crate::kind::Kind;
use crate::reflect::{Handle, Reflect, concrete, concrete_mut};

/// How a child node is reached from its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// A record field.
    Field(String),
    /// An array position.
    Index(usize),
    /// A map key.
    Key(Value),
}

impl Selector {
    fn write_path(&self, out: &mut String) {
        // Writing to a String cannot fail.
        let _ = match self {
            Self::Field(name) => write!(out, ".{name}"),
            Self::Index(index) => write!(out, "[{index}]"),
            Self::Key(key) => write!(out, "[{key:?}]"),
        };
    }
}

/// Index of a node within its arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

enum Origin {
    Root(Handle),
    Child { parent: NodeId, selector: Selector },
}

struct Entry {
    origin: Origin,
    path: String,
}

/// Storage for the nodes created during one evaluation.
#[derive(Default)]
pub struct NodeArena {
    entries: RefCell<Vec<Entry>>,
}

impl NodeArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root node for a bound fact.
    pub fn root(&self, name: &str, handle: Handle) -> ValueNode<'_> {
        let id = self.push(Entry {
            origin: Origin::Root(handle),
            path: name.to_string(),
        });
        ValueNode { arena: self, id }
    }

    /// Adds a root node for a constant, so methods can be called on literals.
    pub fn constant(&self, value: Value) -> ValueNode<'_> {
        let name = format!("{value:?}");
        self.root(&name, Rc::new(RefCell::new(value)))
    }

    /// Number of nodes created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns true if no node has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn push(&self, entry: Entry) -> NodeId {
        let mut entries = self.entries.borrow_mut();
        entries.push(entry);
        NodeId(entries.len() - 1)
    }

    fn route(&self, id: NodeId) -> (Handle, Vec<(Selector, String)>) {
        let entries = self.entries.borrow();
        let mut steps = Vec::new();
        let mut current = id;
        loop {
            let entry = &entries[current.0];
            match &entry.origin {
                Origin::Root(handle) => {
                    steps.reverse();
                    return (Rc::clone(handle), steps);
                }
                Origin::Child { parent, selector } => {
                    steps.push((selector.clone(), entry.path.clone()));
                    current = *parent;
                }
            }
        }
    }
}

/// A position inside a bound fact.
#[derive(Clone, Copy)]
pub struct ValueNode<'a> {
    arena: &'a NodeArena,
    id: NodeId,
}

impl<'a> ValueNode<'a> {
    /// The arena index of this node.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// The full path from the root, such as `actor.Children["Christen"]`.
    #[must_use]
    pub fn identified_as(&self) -> String {
        self.arena.entries.borrow()[self.id.0].path.clone()
    }

    /// Returns true for every node except roots.
    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.parent().is_some()
    }

    /// The node this one was reached from.
    #[must_use]
    pub fn parent(&self) -> Option<ValueNode<'a>> {
        match &self.arena.entries.borrow()[self.id.0].origin {
            Origin::Root(_) => None,
            Origin::Child { parent, .. } => Some(ValueNode {
                arena: self.arena,
                id: *parent,
            }),
        }
    }

    /// The selector that reached this node from its parent.
    #[must_use]
    pub fn selector(&self) -> Option<Selector> {
        match &self.arena.entries.borrow()[self.id.0].origin {
            Origin::Root(_) => None,
            Origin::Child { selector, .. } => Some(selector.clone()),
        }
    }

    /// Runs `f` against the live value of this node.
    ///
    /// # Errors
    ///
    /// Navigation errors from any step on the way down, `BorrowConflict` if
    /// the fact is mutably borrowed elsewhere, or the error `f` returns.
    pub fn with_value<R>(&self, f: impl FnOnce(&dyn Reflect) -> Result<R>) -> Result<R> {
        let (handle, steps) = self.arena.route(self.id);
        let root = handle
            .try_borrow()
            .map_err(|_| Error::new(ErrorKind::BorrowConflict(self.identified_as())))?;
        let mut current: &dyn Reflect = &*root;
        for (selector, path) in &steps {
            current = step(current, selector).map_err(|err| err.at_path(path.as_str()))?;
        }
        f(current).map_err(|err| err.at_path(self.identified_as()))
    }

    /// Runs `f` against the live value of this node, mutably.
    ///
    /// # Errors
    ///
    /// As for [`ValueNode::with_value`].
    pub fn with_value_mut<R>(
        &self,
        f: impl FnOnce(&mut dyn Reflect) -> Result<R>,
    ) -> Result<R> {
        let (handle, steps) = self.arena.route(self.id);
        let mut root = handle
            .try_borrow_mut()
            .map_err(|_| Error::new(ErrorKind::BorrowConflict(self.identified_as())))?;
        let mut current: &mut dyn Reflect = &mut *root;
        for (selector, path) in &steps {
            current = step_mut(current, selector).map_err(|err| err.at_path(path.as_str()))?;
        }
        f(current).map_err(|err| err.at_path(self.identified_as()))
    }

    fn child(&self, selector: Selector) -> ValueNode<'a> {
        let mut path = self.identified_as();
        selector.write_path(&mut path);
        let id = self.arena.push(Entry {
            origin: Origin::Child {
                parent: self.id,
                selector,
            },
            path,
        });
        ValueNode {
            arena: self.arena,
            id,
        }
    }

    fn navigate(&self, selector: Selector) -> Result<ValueNode<'a>> {
        self.with_value(|value| step(value, &selector).map(|_| ()))?;
        Ok(self.child(selector))
    }

    /// Node for a record field.
    ///
    /// # Errors
    ///
    /// `NoSuchField` if the record has no such field, `NotApplicable` if
    /// this node is not a record.
    pub fn get_child_node_by_field(&self, name: &str) -> Result<ValueNode<'a>> {
        self.navigate(Selector::Field(name.to_string()))
    }

    /// Node for an array element.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` past the end, `NotApplicable` if not an array.
    pub fn get_child_node_by_index(&self, index: usize) -> Result<ValueNode<'a>> {
        self.navigate(Selector::Index(index))
    }

    /// Node for a map entry. Never creates the entry.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` for a missing key, `NotApplicable` if not a map.
    pub fn get_child_node_by_selector(&self, key: Value) -> Result<ValueNode<'a>> {
        self.navigate(Selector::Key(key))
    }

    /// Snapshot of an array element.
    ///
    /// # Errors
    ///
    /// As for [`ValueNode::get_child_node_by_index`], plus `NotApplicable`
    /// for elements without a scalar snapshot.
    pub fn get_array_value_at(&self, index: usize) -> Result<Value> {
        self.with_value(|value| snapshot(step(value, &Selector::Index(index))?))
    }

    /// Replaces an array element.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange`, or `TypeMismatch` leaving the element unchanged.
    pub fn set_array_value_at(&self, index: usize, new_value: &Value) -> Result<()> {
        self.write_child(Selector::Index(index), new_value)
    }

    /// Snapshot of a map entry.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` for a missing key.
    pub fn get_map_value_at(&self, key: &Value) -> Result<Value> {
        self.with_value(|value| snapshot(step(value, &Selector::Key(key.clone()))?))
    }

    /// Inserts or replaces a map entry.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the key or value does not fit the map.
    pub fn set_map_value_at(&self, key: &Value, new_value: &Value) -> Result<()> {
        self.with_value_mut(|value| {
            let value = concrete_mut(value)?;
            expect_kind(&*value, Kind::Map, "map insert")?;
            value.insert_entry(key, new_value)
        })
    }

    /// Keys of a map node, sorted.
    ///
    /// # Errors
    ///
    /// `NotApplicable` if not a map.
    pub fn map_keys(&self) -> Result<Vec<Value>> {
        self.with_value(|value| {
            let value = concrete(value);
            expect_kind(value, Kind::Map, "keys")?;
            Ok(value.keys())
        })
    }

    /// Appends values to an array node. Nothing is appended on failure.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if any value does not convert to the element type.
    pub fn append_value(&self, values: &[Value]) -> Result<()> {
        self.with_value_mut(|value| {
            let value = concrete_mut(value)?;
            expect_kind(&*value, Kind::Array, "append")?;
            value.append(values)
        })
    }

    /// Writes a record field.
    ///
    /// # Errors
    ///
    /// `NoSuchField`, or `TypeMismatch` leaving the field unchanged.
    pub fn set_object_value_by_field(&self, name: &str, new_value: &Value) -> Result<()> {
        self.write_child(Selector::Field(name.to_string()), new_value)
    }

    fn write_child(&self, selector: Selector, new_value: &Value) -> Result<()> {
        let mut path = self.identified_as();
        selector.write_path(&mut path);
        self.with_value_mut(|value| {
            step_mut(value, &selector)?
                .assign(new_value)
                .map_err(|err| err.at_path(path))
        })
    }

    /// Replaces the value at this node.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the value does not fit the slot.
    pub fn set_value(&self, new_value: &Value) -> Result<()> {
        self.with_value_mut(|value| value.assign(new_value))
    }

    /// Calls a method on the value at this node.
    ///
    /// # Errors
    ///
    /// `NoSuchMethod`, `ArityMismatch`, or the method's own error.
    pub fn call_function(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.with_value_mut(|value| concrete_mut(value)?.call(name, args))
    }

    /// Invokes a function-capability node.
    ///
    /// # Errors
    ///
    /// `NotApplicable` if the node is not callable.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        self.with_value_mut(|value| concrete_mut(value)?.invoke(args))
    }

    /// Scalar snapshot of the value at this node.
    ///
    /// # Errors
    ///
    /// `NotApplicable` for records, maps and functions.
    pub fn get_value(&self) -> Result<Value> {
        self.with_value(snapshot)
    }

    /// Number of elements, entries or bytes.
    ///
    /// # Errors
    ///
    /// `NotApplicable` for values without a length.
    pub fn length(&self) -> Result<usize> {
        self.with_value(|value| {
            let value = concrete(value);
            value
                .length()
                .ok_or_else(|| Error::not_applicable("length", value.kind().to_string()))
        })
    }

    /// Element type of an array node.
    ///
    /// # Errors
    ///
    /// `NotApplicable` if not an array.
    pub fn get_array_type(&self) -> Result<Type> {
        self.with_value(|value| {
            let value = concrete(value);
            expect_kind(value, Kind::Array, "element type")?;
            value
                .element_type()
                .ok_or_else(|| Error::not_applicable("element type", value.type_name()))
        })
    }

    /// Capability tag of the live value (interfaces are not unwrapped).
    ///
    /// # Errors
    ///
    /// Navigation errors.
    pub fn kind(&self) -> Result<Kind> {
        self.with_value(|value| Ok(value.kind()))
    }

    /// Type name of the concrete value.
    ///
    /// # Errors
    ///
    /// Navigation errors.
    pub fn type_name(&self) -> Result<String> {
        self.with_value(|value| Ok(concrete(value).type_name()))
    }

    fn inspect(&self, check: impl FnOnce(&dyn Reflect) -> bool) -> bool {
        self.with_value(|value| Ok(check(value))).unwrap_or(false)
    }

    fn concrete_kind_is(&self, kind: Kind) -> bool {
        self.inspect(|value| concrete(value).kind() == kind)
    }

    /// True for arrays.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.concrete_kind_is(Kind::Array)
    }

    /// True for maps.
    #[must_use]
    pub fn is_map(&self) -> bool {
        self.concrete_kind_is(Kind::Map)
    }

    /// True for records, including records behind an interface.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.concrete_kind_is(Kind::Object)
    }

    /// True for strings.
    #[must_use]
    pub fn is_string(&self) -> bool {
        self.concrete_kind_is(Kind::String)
    }

    /// True for integers.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.concrete_kind_is(Kind::Int)
    }

    /// True for floats.
    #[must_use]
    pub fn is_real(&self) -> bool {
        self.concrete_kind_is(Kind::Float)
    }

    /// True for booleans.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.concrete_kind_is(Kind::Bool)
    }

    /// True for timestamps.
    #[must_use]
    pub fn is_time(&self) -> bool {
        self.concrete_kind_is(Kind::Time)
    }

    /// True for callables.
    #[must_use]
    pub fn is_function(&self) -> bool {
        self.concrete_kind_is(Kind::Function)
    }

    /// True if the slot itself is an interface wrapper.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.inspect(|value| value.kind() == Kind::Interface)
    }

    /// True for nil, empty optionals and empty interfaces.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.concrete_kind_is(Kind::Nil)
    }
}

impl fmt::Debug for ValueNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueNode")
            .field(&self.identified_as())
            .finish()
    }
}

fn snapshot(value: &dyn Reflect) -> Result<Value> {
    let value = concrete(value);
    value
        .get_value()
        .ok_or_else(|| Error::not_applicable("value read", value.type_name()))
}

fn expect_kind(value: &dyn Reflect, kind: Kind, operation: &'static str) -> Result<()> {
    match value.kind() {
        actual if actual == kind => Ok(()),
        Kind::Nil => Err(Error::new(ErrorKind::NilReference)),
        actual => Err(Error::not_applicable(operation, actual.to_string())),
    }
}

fn step<'r>(value: &'r dyn Reflect, selector: &Selector) -> Result<&'r dyn Reflect> {
    let value = concrete(value);
    match selector {
        Selector::Field(name) => {
            expect_kind(value, Kind::Object, "field access")?;
            value
                .field(name)
                .ok_or_else(|| Error::no_such_field(value.type_name(), name.as_str()))
        }
        Selector::Index(index) => {
            expect_kind(value, Kind::Array, "indexing")?;
            value
                .element(*index)
                .ok_or_else(|| Error::index_out_of_range(*index, value.length().unwrap_or(0)))
        }
        Selector::Key(key) => {
            expect_kind(value, Kind::Map, "key lookup")?;
            value
                .entry(key)
                .ok_or_else(|| Error::key_not_found(format!("{key:?}")))
        }
    }
}

fn step_mut<'r>(value: &'r mut dyn Reflect, selector: &Selector) -> Result<&'r mut dyn Reflect> {
    let value = concrete_mut(value)?;
    match selector {
        Selector::Field(name) => {
            expect_kind(&*value, Kind::Object, "field access")?;
            let type_name = value.type_name();
            value
                .field_mut(name)
                .ok_or_else(|| Error::no_such_field(type_name, name.as_str()))
        }
        Selector::Index(index) => {
            expect_kind(&*value, Kind::Array, "indexing")?;
            let length = value.length().unwrap_or(0);
            value
                .element_mut(*index)
                .ok_or_else(|| Error::index_out_of_range(*index, length))
        }
        Selector::Key(key) => {
            expect_kind(&*value, Kind::Map, "key lookup")?;
            value
                .entry_mut(key)
                .ok_or_else(|| Error::key_not_found(format!("{key:?}")))
        }
    }
}
