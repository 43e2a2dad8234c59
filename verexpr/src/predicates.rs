//! Standard predicates and value functions.
//!
//! Every factory records its name and arguments as the [identity](crate::node::function::Identity)
//! of the function it returns, so `leaf(is_equal_to(5)) == leaf(is_equal_to(5))`.
//! Text helpers go through the global [`Resolver`] as named calls.
use std::cmp::Ordering;

use vercall::{Argument, BoxError, MethodQuery, Resolver, placeholder};
use vertype::{ClassRef, Value};

use crate::node::Function;

/// Numbers compare by value across widths; everything else by structural equality.
fn same_value(a: &Value, b: &Value) -> bool {
    match a.numeric_cmp(b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

fn compare(input: &Value, bound: &Value) -> Result<Ordering, BoxError> {
    if let Some(ordering) = input.numeric_cmp(bound) {
        return Ok(ordering);
    }
    match (input, bound) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => Err(format!("{input} cannot be compared with {bound}").into()),
    }
}

pub fn is_equal_to(expected: impl Into<Value>) -> Function {
    let expected = expected.into();
    Function::predicate("is_equal_to", [expected.clone()], move |input| {
        same_value(input, &expected)
    })
}

pub fn is_null() -> Function {
    Function::predicate("is_null", [], Value::is_null)
}

pub fn is_not_null() -> Function {
    Function::predicate("is_not_null", [], |input| !input.is_null())
}

/// Holds for `true` only; any other value (including `null`) fails the check.
pub fn is_true() -> Function {
    Function::predicate("is_true", [], |input| matches!(input, Value::Bool(true)))
}

pub fn less_than(bound: impl Into<Value>) -> Function {
    let bound = bound.into();
    Function::new("less_than", [bound.clone()], move |input| {
        Ok(Value::Bool(compare(input, &bound)? == Ordering::Less))
    })
}

pub fn greater_than(bound: impl Into<Value>) -> Function {
    let bound = bound.into();
    Function::new("greater_than", [bound.clone()], move |input| {
        Ok(Value::Bool(compare(input, &bound)? == Ordering::Greater))
    })
}

/// Empty string or empty sequence.
pub fn is_empty() -> Function {
    Function::new("is_empty", [], |input| match input {
        Value::Str(s) => Ok(Value::Bool(s.is_empty())),
        Value::Seq(items) => Ok(Value::Bool(items.is_empty())),
        other => Err(format!("{other} has no length").into()),
    })
}

/// `{0}.contains(needle)`; fails on `null`.
pub fn contains_string(needle: &str) -> Function {
    Function::call(
        MethodQuery::instance(placeholder(0), "contains", [Argument::value(needle)]),
        Resolver::global(),
    )
}

/// `{0}.startsWith(prefix)`; fails on `null`.
pub fn starts_with(prefix: &str) -> Function {
    Function::call(
        MethodQuery::instance(placeholder(0), "startsWith", [Argument::value(prefix)]),
        Resolver::global(),
    )
}

/// Number of characters of a string or of items of a sequence, as an `i32`.
pub fn length() -> Function {
    Function::new("length", [], |input| match input {
        Value::Str(s) => Ok(Value::from(s.chars().count() as i32)),
        Value::Seq(items) => Ok(Value::from(items.len() as i32)),
        other => Err(format!("{other} has no length").into()),
    })
}

/// `String.valueOf({0})`; `null` becomes `"null"`.
pub fn to_string() -> Function {
    Function::call(
        MethodQuery::class_method(ClassRef::STRING, "valueOf", [placeholder(0)]),
        Resolver::global(),
    )
}

/// Item `index` of a sequence.
pub fn element_at(index: usize) -> Function {
    Function::new("element_at", [Value::from(index as i64)], move |input| match input {
        Value::Seq(items) => items
            .get(index)
            .cloned()
            .ok_or_else(|| format!("index {index} out of bounds for length {}", items.len()).into()),
        other => Err(format!("{other} is not a sequence").into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_widens_numbers() {
        let five = is_equal_to(5);
        assert_eq!(five.apply(&Value::from(5i64)).unwrap(), Value::from(true));
        assert_eq!(five.apply(&Value::from(5.0f64)).unwrap(), Value::from(true));
        assert_eq!(five.apply(&Value::from("5")).unwrap(), Value::from(false));
        assert_eq!(five.label(), "is_equal_to(5)");
    }

    #[test]
    fn comparisons_reject_mismatched_kinds() {
        assert_eq!(less_than(3).apply(&Value::from(2.5f32)).unwrap(), Value::from(true));
        assert_eq!(greater_than("b").apply(&Value::from("c")).unwrap(), Value::from(true));
        assert!(less_than(3).apply(&Value::from("x")).is_err());
        assert!(greater_than(3).apply(&Value::Null).is_err());
    }

    #[test]
    fn lengths_and_emptiness() {
        assert_eq!(length().apply(&Value::from("héllo")).unwrap(), Value::from(5));
        assert_eq!(length().apply(&Value::seq([1, 2])).unwrap(), Value::from(2));
        assert!(length().apply(&Value::Null).is_err());
        assert_eq!(is_empty().apply(&Value::from("")).unwrap(), Value::from(true));
        assert!(is_empty().apply(&Value::from(0)).is_err());
    }

    #[test]
    fn text_helpers_are_named_calls() {
        assert_eq!(
            starts_with("he").apply(&Value::from("hello")).unwrap(),
            Value::from(true)
        );
        assert_eq!(
            contains_string("ll").apply(&Value::from("hello")).unwrap(),
            Value::from(true)
        );
        assert!(contains_string("ll").apply(&Value::Null).is_err());
        assert_eq!(starts_with("he").label(), r#"{0}.startsWith("he")"#);
        assert_eq!(starts_with("he"), starts_with("he"));
    }

    #[test]
    fn to_string_handles_null() {
        assert_eq!(to_string().apply(&Value::Null).unwrap(), Value::from("null"));
        assert_eq!(to_string().apply(&Value::from(3i8)).unwrap(), Value::from("3"));
        assert_eq!(to_string().apply(&Value::from("x")).unwrap(), Value::from("x"));
    }

    #[test]
    fn element_access() {
        let items = Value::seq(["a", "b"]);
        assert_eq!(element_at(1).apply(&items).unwrap(), Value::from("b"));
        assert!(element_at(2).apply(&items).is_err());
        assert_eq!(element_at(1).label(), "element_at(1)");
    }
}
