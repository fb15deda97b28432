//! The host-object protocol.
//!
//! Rules read and write application data through [`Reflect`] trait objects.
//! Each method is a capability: a value answers only the ones its [`Kind`]
//! supports and the defaults report the operation as unsupported.

use std::cell::RefCell;
use std::rc::Rc;

use gavel_foundation::{Error, Result, Type, Value};

use crate::kind::Kind;

/// A host value that rules can inspect, navigate and mutate.
///
/// Implementations exist for scalars, strings, timestamps, vectors, maps,
/// optionals and boxes. Application structs get one from [`crate::record!`].
pub trait Reflect {
    /// The capability tag of the live value.
    fn kind(&self) -> Kind;

    /// The type descriptor of this slot.
    fn type_of(&self) -> Type;

    /// Human-readable type name used in error messages.
    fn type_name(&self) -> String {
        self.type_of().to_string()
    }

    /// Snapshot of the value as a [`Value`].
    ///
    /// Returns `None` for values with no scalar representation (records,
    /// maps, functions).
    fn get_value(&self) -> Option<Value> {
        None
    }

    /// Replaces this value.
    ///
    /// Implementations validate before writing: on error the slot is
    /// unchanged.
    fn assign(&mut self, value: &Value) -> Result<()> {
        Err(Error::type_mismatch(self.type_of(), value.type_of()))
    }

    /// Borrows a named field.
    fn field(&self, _name: &str) -> Option<&dyn Reflect> {
        None
    }

    /// Mutably borrows a named field.
    fn field_mut(&mut self, _name: &str) -> Option<&mut dyn Reflect> {
        None
    }

    /// Field names in declaration order.
    fn field_names(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Number of elements or entries.
    fn length(&self) -> Option<usize> {
        None
    }

    /// Borrows an element of an array.
    fn element(&self, _index: usize) -> Option<&dyn Reflect> {
        None
    }

    /// Mutably borrows an element of an array.
    fn element_mut(&mut self, _index: usize) -> Option<&mut dyn Reflect> {
        None
    }

    /// Declared element type of an array or value type of a map.
    fn element_type(&self) -> Option<Type> {
        None
    }

    /// Appends values to an array. Nothing is appended unless every value
    /// converts to the element type.
    fn append(&mut self, _values: &[Value]) -> Result<()> {
        Err(Error::not_applicable("append", self.kind().to_string()))
    }

    /// Borrows a map entry.
    fn entry(&self, _key: &Value) -> Option<&dyn Reflect> {
        None
    }

    /// Mutably borrows a map entry.
    fn entry_mut(&mut self, _key: &Value) -> Option<&mut dyn Reflect> {
        None
    }

    /// Inserts or replaces a map entry.
    fn insert_entry(&mut self, _key: &Value, _value: &Value) -> Result<()> {
        Err(Error::not_applicable("map insert", self.kind().to_string()))
    }

    /// Map keys, sorted.
    fn keys(&self) -> Vec<Value> {
        Vec::new()
    }

    /// Calls a method exposed by this value.
    fn call(&mut self, method: &str, _args: &[Value]) -> Result<Value> {
        Err(Error::no_such_method(self.type_name(), method))
    }

    /// Invokes this value as a function.
    fn invoke(&mut self, _args: &[Value]) -> Result<Value> {
        Err(Error::not_applicable("invoke", self.kind().to_string()))
    }

    /// The concrete value behind an interface.
    fn inner(&self) -> Option<&dyn Reflect> {
        None
    }

    /// The concrete value behind an interface, mutably.
    fn inner_mut(&mut self) -> Option<&mut dyn Reflect> {
        None
    }
}

/// Conversion from a rule value into a host slot type.
///
/// Element types of host collections implement this so appends and map
/// inserts can build new elements.
pub trait HostType: Sized {
    /// The static type descriptor of this host type.
    fn host_type() -> Type;

    /// Converts a rule value into the host type.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` when the value has a different kind, or
    /// `Overflow` when an integer is out of range for a narrow slot.
    fn from_value(value: &Value) -> Result<Self>;
}

/// A fact bound into a data context.
pub type Handle = Rc<RefCell<dyn Reflect>>;

/// A typed fact handle the host keeps to read results back.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a host value so it can be bound as a fact and inspected afterwards.
///
/// ```
/// use gavel_model::{shared, Handle, Reflect};
///
/// let name = shared(String::from("Rudolf"));
/// let handle: Handle = name.clone();
/// assert_eq!(handle.borrow().type_name(), "string");
/// ```
pub fn shared<T: Reflect + 'static>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Follows interface wrappers down to the concrete value.
#[must_use]
pub fn concrete(value: &dyn Reflect) -> &dyn Reflect {
    let mut current = value;
    while current.kind() == Kind::Interface {
        match current.inner() {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

/// Follows interface wrappers down to the concrete value, mutably.
///
/// # Errors
///
/// Returns `NotApplicable` if an interface reports an inner value for reads
/// but not for writes.
pub fn concrete_mut(value: &mut dyn Reflect) -> Result<&mut dyn Reflect> {
    if value.kind() != Kind::Interface || value.inner().is_none() {
        return Ok(value);
    }
    match value.inner_mut() {
        Some(inner) => concrete_mut(inner),
        None => Err(Error::not_applicable("write", "read-only interface")),
    }
}
