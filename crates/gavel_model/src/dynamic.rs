//! Interface values and callable host values.

use std::fmt;

use gavel_foundation::{Arity, Result, Type, Value};

use crate::kind::Kind;
use crate::methods::check_arity;
use crate::reflect::{HostType, Reflect};

/// A polymorphic slot holding some concrete host value.
///
/// Navigation looks through the wrapper, so a `Dynamic` holding a record
/// behaves like that record for field access and method calls. Assigning a
/// rule value replaces whatever was held.
pub struct Dynamic(Box<dyn Reflect>);

impl Dynamic {
    /// Wraps a concrete value.
    pub fn new(value: impl Reflect + 'static) -> Self {
        Self(Box::new(value))
    }

    /// Borrows the concrete value.
    #[must_use]
    pub fn get(&self) -> &dyn Reflect {
        &*self.0
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dynamic({})", self.0.type_name())
    }
}

impl HostType for Dynamic {
    fn host_type() -> Type {
        Type::Interface
    }

    fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::new(value.clone()))
    }
}

impl Reflect for Dynamic {
    fn kind(&self) -> Kind {
        Kind::Interface
    }

    fn type_of(&self) -> Type {
        Type::Interface
    }

    fn type_name(&self) -> String {
        self.0.type_name()
    }

    fn get_value(&self) -> Option<Value> {
        self.0.get_value()
    }

    fn assign(&mut self, value: &Value) -> Result<()> {
        self.0 = Box::new(value.clone());
        Ok(())
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        self.0.call(method, args)
    }

    fn inner(&self) -> Option<&dyn Reflect> {
        Some(&*self.0)
    }

    fn inner_mut(&mut self) -> Option<&mut dyn Reflect> {
        Some(&mut *self.0)
    }
}

type NativeFn = Box<dyn Fn(&[Value]) -> Result<Value>>;

/// A callable bound as a fact.
///
/// Rules call it by its binding name: `Discount(Order.Total)`.
pub struct HostFunction {
    name: String,
    arity: Arity,
    func: NativeFn,
}

impl HostFunction {
    /// Creates a host function.
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        func: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            func: Box::new(func),
        }
    }

    /// The function name used in errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The accepted argument count.
    #[must_use]
    pub const fn arity(&self) -> Arity {
        self.arity
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl Reflect for HostFunction {
    fn kind(&self) -> Kind {
        Kind::Function
    }

    fn type_of(&self) -> Type {
        Type::Function
    }

    fn invoke(&mut self, args: &[Value]) -> Result<Value> {
        check_arity(&self.name, self.arity, args)?;
        (self.func)(args).map_err(|err| err.with_frame(self.name.clone()))
    }
}
