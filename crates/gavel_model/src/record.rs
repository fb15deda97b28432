//! Field and method tables for application structs.
//!
//! A [`Schema`] is the accessor table that lets rules address `Person.Name`
//! without runtime reflection. [`crate::record!`] builds one per type the
//! first time it is needed and implements [`Reflect`] on top of it.
//!
//! ```
//! use gavel_model::{record, Kind, Reflect, Value};
//!
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! record! {
//!     Person {
//!         "Name" => name,
//!         "Age" => age,
//!     }
//!     methods {
//!         "IncreaseAge"(0) => |person, _args| {
//!             person.age += 1;
//!             Ok(Value::Nil)
//!         },
//!     }
//! }
//!
//! let mut person = Person { name: "Rudolf".into(), age: 42 };
//! assert_eq!(person.kind(), Kind::Object);
//! assert_eq!(person.field("Age").and_then(Reflect::get_value), Some(Value::Int(42)));
//! person.call("IncreaseAge", &[]).unwrap();
//! assert_eq!(person.age, 43);
//! ```

use gavel_foundation::{Arity, Error, Result, Value};

use crate::methods::check_arity;
use crate::reflect::Reflect;

/// Borrows a field of `T`.
pub type Getter<T> = fn(&T) -> &dyn Reflect;

/// Mutably borrows a field of `T`.
pub type GetterMut<T> = fn(&mut T) -> &mut dyn Reflect;

/// A method callable from rules.
pub type MethodFn<T> = fn(&mut T, &[Value]) -> Result<Value>;

struct Field<T> {
    name: &'static str,
    get: Getter<T>,
    get_mut: GetterMut<T>,
}

struct Method<T> {
    name: &'static str,
    arity: Arity,
    func: MethodFn<T>,
}

/// The accessor table of a record type.
pub struct Schema<T> {
    type_name: &'static str,
    fields: Vec<Field<T>>,
    methods: Vec<Method<T>>,
}

impl<T> Schema<T> {
    /// Creates an empty table.
    #[must_use]
    pub const fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: &'static str, get: Getter<T>, get_mut: GetterMut<T>) -> Self {
        self.fields.push(Field { name, get, get_mut });
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn method(mut self, name: &'static str, arity: Arity, func: MethodFn<T>) -> Self {
        self.methods.push(Method { name, arity, func });
        self
    }

    /// The record type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Field names in declaration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Borrows a field by name.
    pub fn get<'a>(&self, target: &'a T, name: &str) -> Option<&'a dyn Reflect> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| (f.get)(target))
    }

    /// Mutably borrows a field by name.
    pub fn get_mut<'a>(&self, target: &'a mut T, name: &str) -> Option<&'a mut dyn Reflect> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| (f.get_mut)(target))
    }

    /// Calls a method by name.
    ///
    /// # Errors
    ///
    /// `NoSuchMethod` for an unknown name, `ArityMismatch` for a wrong
    /// argument count, or whatever the method itself returns.
    pub fn call(&self, target: &mut T, name: &str, args: &[Value]) -> Result<Value> {
        let method = self
            .methods
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| Error::no_such_method(self.type_name, name))?;
        check_arity(name, method.arity, args)?;
        (method.func)(target, args)
    }
}

/// Types with a static accessor table.
pub trait Record: Sized + 'static {
    /// The accessor table, built once.
    fn schema() -> &'static Schema<Self>;
}

/// Implements [`Reflect`](crate::Reflect) for a struct from a field list.
///
/// Each entry maps a rule-visible name to a struct field whose type itself
/// implements `Reflect`. The optional `methods` block maps names to closures
/// taking `(&mut Self, &[Value])` with a fixed argument count.
#[macro_export]
macro_rules! record {
    (
        $ty:ident {
            $($field_name:literal => $field:ident),* $(,)?
        }
        $(methods {
            $($method_name:literal ($arity:expr) => $body:expr),* $(,)?
        })?
    ) => {
        impl $crate::Record for $ty {
            fn schema() -> &'static $crate::Schema<Self> {
                static SCHEMA: ::std::sync::OnceLock<$crate::Schema<$ty>> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    $crate::Schema::<$ty>::new(stringify!($ty))
                        $(.field($field_name, |s| &s.$field, |s| &mut s.$field))*
                        $($(.method($method_name, $crate::Arity::Exact($arity), $body))*)?
                })
            }
        }

        impl $crate::Reflect for $ty {
            fn kind(&self) -> $crate::Kind {
                $crate::Kind::Object
            }

            fn type_of(&self) -> $crate::Type {
                $crate::Type::object(stringify!($ty))
            }

            fn field(&self, name: &str) -> ::std::option::Option<&dyn $crate::Reflect> {
                <Self as $crate::Record>::schema().get(self, name)
            }

            fn field_mut(
                &mut self,
                name: &str,
            ) -> ::std::option::Option<&mut dyn $crate::Reflect> {
                <Self as $crate::Record>::schema().get_mut(self, name)
            }

            fn field_names(&self) -> ::std::vec::Vec<&'static str> {
                <Self as $crate::Record>::schema().field_names()
            }

            fn call(
                &mut self,
                method: &str,
                args: &[$crate::Value],
            ) -> $crate::Result<$crate::Value> {
                <Self as $crate::Record>::schema().call(self, method, args)
            }
        }

        impl $crate::HostType for $ty {
            fn host_type() -> $crate::Type {
                $crate::Type::object(stringify!($ty))
            }

            fn from_value(value: &$crate::Value) -> $crate::Result<Self> {
                ::std::result::Result::Err($crate::Error::type_mismatch(
                    <Self as $crate::HostType>::host_type(),
                    value.type_of(),
                ))
            }
        }
    };
}
