//! Methods of the built-in classes, registered statically.
use std::sync::Arc;

use vertype::{ClassRef, PrimitiveType, Type, Value};

use crate::{
    candidate::{MethodCandidate, MethodTable},
    error::{BoxError, CallResult},
};

const NONE: [Type; 0] = [];
const BOOL: Type = Type::Primitive(PrimitiveType::Bool);
const CHAR: Type = Type::Primitive(PrimitiveType::Char);
const INT: Type = Type::Primitive(PrimitiveType::I32);
const LONG: Type = Type::Primitive(PrimitiveType::I64);
const DOUBLE: Type = Type::Primitive(PrimitiveType::F64);
const OBJECT: Type = Type::OBJECT;
const STRING: Type = Type::STRING;
const CHAR_SEQUENCE: Type = Type::Class(ClassRef::CHAR_SEQUENCE);

fn text(value: &Value) -> Result<&str, BoxError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(format!("expected a string, got {other}").into()),
    }
}

fn items(value: &Value) -> Result<&[Value], BoxError> {
    match value {
        Value::Seq(items) => Ok(items),
        other => Err(format!("expected a list, got {other}").into()),
    }
}

fn index(value: &Value) -> Result<usize, BoxError> {
    let raw = value
        .as_i64()
        .ok_or_else(|| format!("expected an index, got {value}"))?;
    usize::try_from(raw).map_err(|_| format!("negative index {raw}").into())
}

fn char_len(s: &str) -> Value {
    Value::from(s.chars().count() as i32)
}

/// Characters `[begin, end)` of `s`, counted in chars.
fn char_slice(s: &str, begin: usize, end: usize) -> Result<Value, BoxError> {
    let len = s.chars().count();
    if begin > end || end > len {
        return Err(format!("range [{begin}, {end}) out of bounds for length {len}").into());
    }
    Ok(Value::from(
        s.chars().skip(begin).take(end - begin).collect::<String>(),
    ))
}

fn register_object(table: &mut MethodTable) -> CallResult<()> {
    let o = ClassRef::OBJECT;
    table
        .register(MethodCandidate::instance(o, "toString", NONE, STRING, |this, _| {
            Ok(match this {
                Value::Str(_) => this.clone(),
                other => Value::from(other.to_string()),
            })
        }))?
        .register(MethodCandidate::instance(o, "equals", [OBJECT], BOOL, |this, args| {
            Ok(Value::from(*this == args[0]))
        }))?;
    Ok(())
}

fn register_text(table: &mut MethodTable) -> CallResult<()> {
    let cs = ClassRef::CHAR_SEQUENCE;
    let s = ClassRef::STRING;
    table
        .register(MethodCandidate::instance(cs, "length", NONE, INT, |this, _| {
            Ok(char_len(text(this)?))
        }))?
        .register(MethodCandidate::instance(cs, "isEmpty", NONE, BOOL, |this, _| {
            Ok(Value::from(text(this)?.is_empty()))
        }))?
        .register(MethodCandidate::instance(cs, "charAt", [INT], CHAR, |this, args| {
            let at = index(&args[0])?;
            text(this)?
                .chars()
                .nth(at)
                .map(Value::from)
                .ok_or_else(|| format!("index {at} out of bounds").into())
        }))?
        .register(MethodCandidate::instance(s, "contains", [CHAR_SEQUENCE], BOOL, |this, args| {
            Ok(Value::from(text(this)?.contains(text(&args[0])?)))
        }))?
        .register(MethodCandidate::instance(s, "startsWith", [STRING], BOOL, |this, args| {
            Ok(Value::from(text(this)?.starts_with(text(&args[0])?)))
        }))?
        .register(MethodCandidate::instance(s, "endsWith", [STRING], BOOL, |this, args| {
            Ok(Value::from(text(this)?.ends_with(text(&args[0])?)))
        }))?
        .register(MethodCandidate::instance(s, "concat", [STRING], STRING, |this, args| {
            Ok(Value::from(format!("{}{}", text(this)?, text(&args[0])?)))
        }))?
        .register(MethodCandidate::instance(s, "toUpperCase", NONE, STRING, |this, _| {
            Ok(Value::from(text(this)?.to_uppercase()))
        }))?
        .register(MethodCandidate::instance(s, "substring", [INT], STRING, |this, args| {
            let this = text(this)?;
            char_slice(this, index(&args[0])?, this.chars().count())
        }))?
        .register(MethodCandidate::instance(s, "substring", [INT, INT], STRING, |this, args| {
            char_slice(text(this)?, index(&args[0])?, index(&args[1])?)
        }))?;

    // `valueOf` overloads exercise widening: an `i8` argument selects `valueOf(i32)`.
    for param in [OBJECT, BOOL, CHAR, INT, LONG, DOUBLE] {
        table.register(MethodCandidate::class_method(s, "valueOf", [param], STRING, |args| {
            Ok(Value::from(match &args[0] {
                Value::Str(s) => s.to_string(),
                other => other.to_string(),
            }))
        }))?;
    }
    Ok(())
}

fn register_numbers(table: &mut MethodTable) -> CallResult<()> {
    let n = ClassRef::NUMBER;
    table
        .register(MethodCandidate::instance(n, "intValue", NONE, INT, |this, _| {
            let v = this.as_f64().ok_or("not a number")?;
            Ok(Value::from(v as i32))
        }))?
        .register(MethodCandidate::instance(n, "longValue", NONE, LONG, |this, _| {
            let v = this.as_f64().ok_or("not a number")?;
            Ok(Value::from(this.as_i64().unwrap_or(v as i64)))
        }))?
        .register(MethodCandidate::instance(n, "doubleValue", NONE, DOUBLE, |this, _| {
            Ok(Value::from(this.as_f64().ok_or("not a number")?))
        }))?
        .register(MethodCandidate::class_method(
            ClassRef::INTEGER,
            "parseInt",
            [STRING],
            INT,
            |args| {
                let parsed: i32 = text(&args[0])?.trim().parse()?;
                Ok(Value::from(parsed))
            },
        ))?;
    Ok(())
}

fn register_lists(table: &mut MethodTable) -> CallResult<()> {
    let l = ClassRef::LIST;
    table
        .register(MethodCandidate::instance(ClassRef::ITERABLE, "isEmpty", NONE, BOOL, |this, _| {
            Ok(Value::from(items(this)?.is_empty()))
        }))?
        .register(MethodCandidate::instance(l, "size", NONE, INT, |this, _| {
            Ok(Value::from(items(this)?.len() as i32))
        }))?
        .register(MethodCandidate::instance(l, "get", [INT], OBJECT, |this, args| {
            let at = index(&args[0])?;
            items(this)?
                .get(at)
                .cloned()
                .ok_or_else(|| format!("index {at} out of bounds").into())
        }))?
        .register(MethodCandidate::instance(l, "contains", [OBJECT], BOOL, |this, args| {
            Ok(Value::from(items(this)?.contains(&args[0])))
        }))?
        .register(MethodCandidate::instance(l, "subList", [INT, INT], OBJECT, |this, args| {
            let (begin, end) = (index(&args[0])?, index(&args[1])?);
            let items = items(this)?;
            if begin > end || end > items.len() {
                return Err(format!("range [{begin}, {end}) out of bounds").into());
            }
            Ok(Value::Seq(Arc::from(&items[begin..end])))
        }))?;
    Ok(())
}

fn register_builtins(table: &mut MethodTable) -> CallResult<()> {
    register_object(table)?;
    register_text(table)?;
    register_numbers(table)?;
    register_lists(table)
}

crate::register_methods!(register_builtins);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_without_duplicates() {
        let mut table = MethodTable::new();
        register_builtins(&mut table).unwrap();
        assert_eq!(table.declared(ClassRef::STRING, "valueOf").len(), 6);
        assert_eq!(table.declared(ClassRef::STRING, "substring").len(), 2);
        assert!(table.declared(ClassRef::STRING, "length").is_empty());
        assert_eq!(table.declared(ClassRef::CHAR_SEQUENCE, "length").len(), 1);
    }

    #[test]
    fn char_slices_count_chars() {
        assert_eq!(char_slice("héllo", 1, 3).unwrap(), Value::from("él"));
        assert!(char_slice("abc", 2, 5).is_err());
        assert_eq!(char_len("héllo"), Value::from(5));
    }
}
