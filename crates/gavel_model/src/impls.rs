//! [`Reflect`] and [`HostType`] for standard library types.

use std::collections::{BTreeMap, HashMap};

use gavel_foundation::{DateTime, Error, ErrorKind, Result, Type, Utc, Value};

use crate::kind::Kind;
use crate::methods::{collection_method, string_method, time_method};
use crate::reflect::{HostType, Reflect};

macro_rules! integer_slot {
    ($($ty:ty),* $(,)?) => {$(
        impl HostType for $ty {
            fn host_type() -> Type {
                Type::Int
            }

            #[allow(clippy::useless_conversion)]
            fn from_value(value: &Value) -> Result<Self> {
                match value {
                    Value::Int(n) => <$ty>::try_from(*n).map_err(|_| {
                        Error::new(ErrorKind::Overflow(format!(
                            "{n} does not fit in {}",
                            stringify!($ty)
                        )))
                    }),
                    other => Err(Error::type_mismatch(Type::Int, other.type_of())),
                }
            }
        }

        impl Reflect for $ty {
            fn kind(&self) -> Kind {
                Kind::Int
            }

            fn type_of(&self) -> Type {
                Type::Int
            }

            #[allow(clippy::useless_conversion)]
            fn get_value(&self) -> Option<Value> {
                i64::try_from(*self).ok().map(Value::Int)
            }

            fn assign(&mut self, value: &Value) -> Result<()> {
                *self = Self::from_value(value)?;
                Ok(())
            }
        }
    )*};
}

integer_slot!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl HostType for f64 {
    fn host_type() -> Type {
        Type::Float
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(n) => Ok(*n),
            Value::Int(n) => Ok(*n as f64),
            other => Err(Error::type_mismatch(Type::Float, other.type_of())),
        }
    }
}

impl HostType for f32 {
    fn host_type() -> Type {
        Type::Float
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> Result<Self> {
        f64::from_value(value).map(|n| n as f32)
    }
}

macro_rules! float_slot {
    ($($ty:ty),*) => {$(
        impl Reflect for $ty {
            fn kind(&self) -> Kind {
                Kind::Float
            }

            fn type_of(&self) -> Type {
                Type::Float
            }

            fn get_value(&self) -> Option<Value> {
                Some(Value::Float(f64::from(*self)))
            }

            fn assign(&mut self, value: &Value) -> Result<()> {
                *self = Self::from_value(value)?;
                Ok(())
            }
        }
    )*};
}

float_slot!(f32, f64);

impl HostType for bool {
    fn host_type() -> Type {
        Type::Bool
    }

    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| Error::type_mismatch(Type::Bool, value.type_of()))
    }
}

impl Reflect for bool {
    fn kind(&self) -> Kind {
        Kind::Bool
    }

    fn type_of(&self) -> Type {
        Type::Bool
    }

    fn get_value(&self) -> Option<Value> {
        Some(Value::Bool(*self))
    }

    fn assign(&mut self, value: &Value) -> Result<()> {
        *self = Self::from_value(value)?;
        Ok(())
    }
}

impl HostType for String {
    fn host_type() -> Type {
        Type::String
    }

    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::type_mismatch(Type::String, value.type_of()))
    }
}

impl Reflect for String {
    fn kind(&self) -> Kind {
        Kind::String
    }

    fn type_of(&self) -> Type {
        Type::String
    }

    fn get_value(&self) -> Option<Value> {
        Some(Value::from(self.as_str()))
    }

    fn assign(&mut self, value: &Value) -> Result<()> {
        *self = Self::from_value(value)?;
        Ok(())
    }

    fn length(&self) -> Option<usize> {
        Some(self.len())
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        string_method(self, method, args)
    }
}

impl HostType for DateTime<Utc> {
    fn host_type() -> Type {
        Type::Time
    }

    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_time()
            .ok_or_else(|| Error::type_mismatch(Type::Time, value.type_of()))
    }
}

impl Reflect for DateTime<Utc> {
    fn kind(&self) -> Kind {
        Kind::Time
    }

    fn type_of(&self) -> Type {
        Type::Time
    }

    fn get_value(&self) -> Option<Value> {
        Some(Value::Time(*self))
    }

    fn assign(&mut self, value: &Value) -> Result<()> {
        *self = Self::from_value(value)?;
        Ok(())
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        time_method(self, method, args)
    }
}

/// A bare `Value` is a dynamically typed slot: it accepts any assignment.
impl HostType for Value {
    fn host_type() -> Type {
        Type::Any
    }

    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl Reflect for Value {
    fn kind(&self) -> Kind {
        match self {
            Self::Nil => Kind::Nil,
            Self::Bool(_) => Kind::Bool,
            Self::Int(_) => Kind::Int,
            Self::Float(_) => Kind::Float,
            Self::String(_) => Kind::String,
            Self::Time(_) => Kind::Time,
            Self::Array(_) => Kind::Array,
        }
    }

    fn type_of(&self) -> Type {
        Value::type_of(self)
    }

    fn get_value(&self) -> Option<Value> {
        Some(self.clone())
    }

    fn assign(&mut self, value: &Value) -> Result<()> {
        *self = value.clone();
        Ok(())
    }

    fn length(&self) -> Option<usize> {
        match self {
            Self::Array(items) => Some(items.len()),
            Self::String(s) => Some(s.len()),
            _ => None,
        }
    }

    fn element(&self, index: usize) -> Option<&dyn Reflect> {
        match self {
            Self::Array(items) => items.get(index).map(|v| v as &dyn Reflect),
            _ => None,
        }
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        match self {
            Self::Array(items) => items.get_mut(index).map(|v| v as &mut dyn Reflect),
            _ => None,
        }
    }

    fn element_type(&self) -> Option<Type> {
        match Value::type_of(self) {
            Type::Array(element) => Some(*element),
            _ => None,
        }
    }

    fn append(&mut self, values: &[Value]) -> Result<()> {
        let Self::Array(items) = self else {
            return Err(Error::not_applicable("append", Reflect::kind(self).to_string()));
        };
        if let Some(first) = items.front() {
            let expected = first.type_of();
            if let Some(bad) = values.iter().find(|v| !expected.accepts(&v.type_of())) {
                return Err(Error::type_mismatch(expected, bad.type_of()));
            }
        }
        items.extend(values.iter().cloned());
        Ok(())
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        match self {
            Self::String(s) => string_method(s, method, args),
            Self::Time(t) => time_method(t, method, args),
            Self::Array(items) => collection_method("array", items.len(), method, args),
            other => Err(Error::no_such_method(Value::type_of(other).to_string(), method)),
        }
    }
}

impl<T: Reflect + HostType> HostType for Vec<T> {
    fn host_type() -> Type {
        Type::array(T::host_type())
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.iter().map(T::from_value).collect(),
            other => Err(Error::type_mismatch(Self::host_type(), other.type_of())),
        }
    }
}

impl<T: Reflect + HostType> Reflect for Vec<T> {
    fn kind(&self) -> Kind {
        Kind::Array
    }

    fn type_of(&self) -> Type {
        Self::host_type()
    }

    fn get_value(&self) -> Option<Value> {
        self.iter()
            .map(Reflect::get_value)
            .collect::<Option<im::Vector<_>>>()
            .map(Value::Array)
    }

    fn assign(&mut self, value: &Value) -> Result<()> {
        *self = Self::from_value(value)?;
        Ok(())
    }

    fn length(&self) -> Option<usize> {
        Some(self.len())
    }

    fn element(&self, index: usize) -> Option<&dyn Reflect> {
        self.get(index).map(|v| v as &dyn Reflect)
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.get_mut(index).map(|v| v as &mut dyn Reflect)
    }

    fn element_type(&self) -> Option<Type> {
        Some(T::host_type())
    }

    fn append(&mut self, values: &[Value]) -> Result<()> {
        let converted = values
            .iter()
            .map(T::from_value)
            .collect::<Result<Vec<_>>>()?;
        self.extend(converted);
        Ok(())
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        collection_method(&self.type_name(), self.len(), method, args)
    }
}

macro_rules! map_slot {
    ($($map:ident),*) => {$(
        impl<V: Reflect + HostType> HostType for $map<String, V> {
            fn host_type() -> Type {
                Type::map(V::host_type())
            }

            fn from_value(value: &Value) -> Result<Self> {
                Err(Error::type_mismatch(Self::host_type(), value.type_of()))
            }
        }

        impl<V: Reflect + HostType> Reflect for $map<String, V> {
            fn kind(&self) -> Kind {
                Kind::Map
            }

            fn type_of(&self) -> Type {
                Self::host_type()
            }

            fn length(&self) -> Option<usize> {
                Some(self.len())
            }

            fn element_type(&self) -> Option<Type> {
                Some(V::host_type())
            }

            fn entry(&self, key: &Value) -> Option<&dyn Reflect> {
                key.as_str()
                    .and_then(|key| self.get(key))
                    .map(|v| v as &dyn Reflect)
            }

            fn entry_mut(&mut self, key: &Value) -> Option<&mut dyn Reflect> {
                key.as_str()
                    .and_then(|key| self.get_mut(key))
                    .map(|v| v as &mut dyn Reflect)
            }

            fn insert_entry(&mut self, key: &Value, value: &Value) -> Result<()> {
                let key = key
                    .as_str()
                    .ok_or_else(|| Error::type_mismatch(Type::String, key.type_of()))?;
                let value = V::from_value(value)?;
                self.insert(key.to_string(), value);
                Ok(())
            }

            fn keys(&self) -> Vec<Value> {
                let mut keys: Vec<&String> = self.keys().collect();
                keys.sort();
                keys.into_iter().map(|k| Value::from(k.as_str())).collect()
            }

            fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
                collection_method(&self.type_name(), self.len(), method, args)
            }
        }
    )*};
}

map_slot!(HashMap, BTreeMap);

impl<T: HostType> HostType for Option<T> {
    fn host_type() -> Type {
        T::host_type()
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// An optional is transparent when filled and nil when empty.
impl<T: Reflect + HostType> Reflect for Option<T> {
    fn kind(&self) -> Kind {
        self.as_ref().map_or(Kind::Nil, Reflect::kind)
    }

    fn type_of(&self) -> Type {
        self.as_ref().map_or_else(T::host_type, Reflect::type_of)
    }

    fn get_value(&self) -> Option<Value> {
        match self {
            Some(inner) => inner.get_value(),
            None => Some(Value::Nil),
        }
    }

    fn assign(&mut self, value: &Value) -> Result<()> {
        if value.is_nil() {
            *self = None;
            return Ok(());
        }
        match self {
            Some(inner) => inner.assign(value),
            None => {
                *self = Some(T::from_value(value)?);
                Ok(())
            }
        }
    }

    fn field(&self, name: &str) -> Option<&dyn Reflect> {
        self.as_ref()?.field(name)
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect> {
        self.as_mut()?.field_mut(name)
    }

    fn field_names(&self) -> Vec<&'static str> {
        self.as_ref().map(Reflect::field_names).unwrap_or_default()
    }

    fn length(&self) -> Option<usize> {
        self.as_ref()?.length()
    }

    fn element(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_ref()?.element(index)
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.as_mut()?.element_mut(index)
    }

    fn element_type(&self) -> Option<Type> {
        self.as_ref()?.element_type()
    }

    fn append(&mut self, values: &[Value]) -> Result<()> {
        match self {
            Some(inner) => inner.append(values),
            None => Err(Error::new(ErrorKind::NilReference)),
        }
    }

    fn entry(&self, key: &Value) -> Option<&dyn Reflect> {
        self.as_ref()?.entry(key)
    }

    fn entry_mut(&mut self, key: &Value) -> Option<&mut dyn Reflect> {
        self.as_mut()?.entry_mut(key)
    }

    fn insert_entry(&mut self, key: &Value, value: &Value) -> Result<()> {
        match self {
            Some(inner) => inner.insert_entry(key, value),
            None => Err(Error::new(ErrorKind::NilReference)),
        }
    }

    fn keys(&self) -> Vec<Value> {
        self.as_ref().map(Reflect::keys).unwrap_or_default()
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        match self {
            Some(inner) => inner.call(method, args),
            None => Err(Error::new(ErrorKind::NilReference)),
        }
    }

    fn invoke(&mut self, args: &[Value]) -> Result<Value> {
        match self {
            Some(inner) => inner.invoke(args),
            None => Err(Error::new(ErrorKind::NilReference)),
        }
    }

    fn inner(&self) -> Option<&dyn Reflect> {
        self.as_ref()?.inner()
    }

    fn inner_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_mut()?.inner_mut()
    }
}

impl<T: HostType> HostType for Box<T> {
    fn host_type() -> Type {
        T::host_type()
    }

    fn from_value(value: &Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: Reflect + ?Sized> Reflect for Box<T> {
    fn kind(&self) -> Kind {
        (**self).kind()
    }

    fn type_of(&self) -> Type {
        (**self).type_of()
    }

    fn type_name(&self) -> String {
        (**self).type_name()
    }

    fn get_value(&self) -> Option<Value> {
        (**self).get_value()
    }

    fn assign(&mut self, value: &Value) -> Result<()> {
        (**self).assign(value)
    }

    fn field(&self, name: &str) -> Option<&dyn Reflect> {
        (**self).field(name)
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect> {
        (**self).field_mut(name)
    }

    fn field_names(&self) -> Vec<&'static str> {
        (**self).field_names()
    }

    fn length(&self) -> Option<usize> {
        (**self).length()
    }

    fn element(&self, index: usize) -> Option<&dyn Reflect> {
        (**self).element(index)
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        (**self).element_mut(index)
    }

    fn element_type(&self) -> Option<Type> {
        (**self).element_type()
    }

    fn append(&mut self, values: &[Value]) -> Result<()> {
        (**self).append(values)
    }

    fn entry(&self, key: &Value) -> Option<&dyn Reflect> {
        (**self).entry(key)
    }

    fn entry_mut(&mut self, key: &Value) -> Option<&mut dyn Reflect> {
        (**self).entry_mut(key)
    }

    fn insert_entry(&mut self, key: &Value, value: &Value) -> Result<()> {
        (**self).insert_entry(key, value)
    }

    fn keys(&self) -> Vec<Value> {
        (**self).keys()
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        (**self).call(method, args)
    }

    fn invoke(&mut self, args: &[Value]) -> Result<Value> {
        (**self).invoke(args)
    }

    fn inner(&self) -> Option<&dyn Reflect> {
        (**self).inner()
    }

    fn inner_mut(&mut self) -> Option<&mut dyn Reflect> {
        (**self).inner_mut()
    }
}
