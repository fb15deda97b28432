//! Methods available on built-in leaf types.
//!
//! Strings, timestamps and collections answer a fixed method set so that
//! rules can write `Person.Name.ToUpper()` or `Order.Placed.Year()` without
//! the host registering anything.

use std::cmp::Ordering;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Timelike, Utc};
use gavel_foundation::{Arity, Error, ErrorKind, Result, Type, Value};

static NIL: Value = Value::Nil;

/// Checks an argument count against an arity.
///
/// # Errors
///
/// Returns `ArityMismatch` naming the callable.
pub fn check_arity(name: &str, arity: Arity, args: &[Value]) -> Result<()> {
    if arity.accepts(args.len()) {
        Ok(())
    } else {
        Err(Error::arity_mismatch(name, arity.to_string(), args.len()))
    }
}

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NIL)
}

fn str_arg<'v>(method: &str, args: &'v [Value], index: usize) -> Result<&'v str> {
    let value = arg(args, index);
    value
        .as_str()
        .ok_or_else(|| Error::type_mismatch(Type::String, value.type_of()).with_frame(method))
}

fn int_arg(method: &str, args: &[Value], index: usize) -> Result<i64> {
    let value = arg(args, index);
    value
        .as_int()
        .ok_or_else(|| Error::type_mismatch(Type::Int, value.type_of()).with_frame(method))
}

fn time_arg(method: &str, args: &[Value], index: usize) -> Result<DateTime<Utc>> {
    let value = arg(args, index);
    value
        .as_time()
        .ok_or_else(|| Error::type_mismatch(Type::Time, value.type_of()).with_frame(method))
}

/// Converts a length or byte offset into a rule integer.
#[must_use]
pub fn length_value(len: usize) -> Value {
    Value::Int(i64::try_from(len).unwrap_or(i64::MAX))
}

const fn ordering_value(ordering: Ordering) -> Value {
    match ordering {
        Ordering::Less => Value::Int(-1),
        Ordering::Equal => Value::Int(0),
        Ordering::Greater => Value::Int(1),
    }
}

/// Calls a string method.
///
/// # Errors
///
/// `NoSuchMethod` for unknown names, `ArityMismatch` for a wrong argument
/// count, `TypeMismatch` for arguments of the wrong kind.
pub fn string_method(receiver: &str, method: &str, args: &[Value]) -> Result<Value> {
    let arity = match method {
        "Len" | "Trim" | "TrimLeft" | "TrimRight" | "ToUpper" | "ToLower" => 0,
        "Contains" | "HasPrefix" | "HasSuffix" | "Index" | "Repeat" | "Compare" => 1,
        "Replace" => 2,
        _ => return Err(Error::no_such_method("string", method)),
    };
    check_arity(method, Arity::Exact(arity), args)?;

    let result = match method {
        "Len" => length_value(receiver.len()),
        "Trim" => receiver.trim().into(),
        "TrimLeft" => receiver.trim_start().into(),
        "TrimRight" => receiver.trim_end().into(),
        "ToUpper" => receiver.to_uppercase().into(),
        "ToLower" => receiver.to_lowercase().into(),
        "Contains" => Value::Bool(receiver.contains(str_arg(method, args, 0)?)),
        "HasPrefix" => Value::Bool(receiver.starts_with(str_arg(method, args, 0)?)),
        "HasSuffix" => Value::Bool(receiver.ends_with(str_arg(method, args, 0)?)),
        "Index" => match receiver.find(str_arg(method, args, 0)?) {
            Some(offset) => length_value(offset),
            None => Value::Int(-1),
        },
        "Compare" => ordering_value(receiver.cmp(str_arg(method, args, 0)?)),
        "Repeat" => {
            let count = int_arg(method, args, 0)?;
            let count = usize::try_from(count).map_err(|_| {
                Error::new(ErrorKind::Host(format!("negative repeat count {count}")))
                    .with_frame(method)
            })?;
            receiver.repeat(count).into()
        }
        "Replace" => receiver
            .replace(str_arg(method, args, 0)?, str_arg(method, args, 1)?)
            .into(),
        _ => return Err(Error::no_such_method("string", method)),
    };
    Ok(result)
}

/// Returns true for the zero timestamp (the Unix epoch).
///
/// `DateTime<Utc>` fields default to the epoch, so this is how rules detect
/// a timestamp the host never set.
#[must_use]
pub fn is_zero_time(time: &DateTime<Utc>) -> bool {
    time.timestamp() == 0 && time.timestamp_subsec_nanos() == 0
}

/// Formats a timestamp with a strftime layout.
///
/// # Errors
///
/// Returns a `Host` error for a malformed layout.
pub fn format_time(time: &DateTime<Utc>, layout: &str) -> Result<String> {
    if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
        return Err(Error::new(ErrorKind::Host(format!(
            "invalid time layout {layout:?}"
        ))));
    }
    Ok(time.format_with_items(StrftimeItems::new(layout)).to_string())
}

/// Calls a timestamp method.
///
/// # Errors
///
/// `NoSuchMethod`, `ArityMismatch` or `TypeMismatch` as for strings.
pub fn time_method(receiver: &DateTime<Utc>, method: &str, args: &[Value]) -> Result<Value> {
    let arity = match method {
        "Year" | "Month" | "Day" | "Hour" | "Minute" | "Second" | "Weekday" | "Unix"
        | "UnixMilli" | "IsZero" => 0,
        "Format" | "Before" | "After" | "Equal" => 1,
        _ => return Err(Error::no_such_method("time", method)),
    };
    check_arity(method, Arity::Exact(arity), args)?;

    let result = match method {
        "Year" => Value::Int(i64::from(receiver.year())),
        "Month" => Value::Int(i64::from(receiver.month())),
        "Day" => Value::Int(i64::from(receiver.day())),
        "Hour" => Value::Int(i64::from(receiver.hour())),
        "Minute" => Value::Int(i64::from(receiver.minute())),
        "Second" => Value::Int(i64::from(receiver.second())),
        "Weekday" => Value::Int(i64::from(receiver.weekday().num_days_from_sunday())),
        "Unix" => Value::Int(receiver.timestamp()),
        "UnixMilli" => Value::Int(receiver.timestamp_millis()),
        "IsZero" => Value::Bool(is_zero_time(receiver)),
        "Format" => format_time(receiver, str_arg(method, args, 0)?)?.into(),
        "Before" => Value::Bool(*receiver < time_arg(method, args, 0)?),
        "After" => Value::Bool(*receiver > time_arg(method, args, 0)?),
        "Equal" => Value::Bool(*receiver == time_arg(method, args, 0)?),
        _ => return Err(Error::no_such_method("time", method)),
    };
    Ok(result)
}

/// Calls a method shared by arrays and maps.
///
/// # Errors
///
/// `NoSuchMethod` for anything but `Len`.
pub fn collection_method(type_name: &str, len: usize, method: &str, args: &[Value]) -> Result<Value> {
    match method {
        "Len" => {
            check_arity(method, Arity::Exact(0), args)?;
            Ok(length_value(len))
        }
        _ => Err(Error::no_such_method(type_name, method)),
    }
}
