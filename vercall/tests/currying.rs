use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use vercall::{CallError, NativeOperation, Operation, Resolver, Stage};
use vertype::{ClassRef, PrimitiveType, Type, Value};

const LONG: Type = Type::Primitive(PrimitiveType::I64);
const INT: Type = Type::Primitive(PrimitiveType::I32);

fn plain(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn concat3() -> Arc<dyn Operation> {
    Arc::new(NativeOperation::new(
        "concat3",
        [Type::STRING, INT, Type::STRING],
        Type::STRING,
        |args| Ok(Value::from(args.iter().map(plain).collect::<String>())),
    ))
}

#[test]
fn each_parameter_needs_one_application() {
    let add = Arc::new(NativeOperation::new("add", [LONG, LONG], LONG, |args| {
        let (a, b) = (args[0].as_i64().unwrap(), args[1].as_i64().unwrap());
        Ok(Value::from(a + b))
    }));

    let stage = Stage::new(add).unwrap();
    assert!(stage.has_next());
    assert_eq!(stage.remaining(), 2);

    let stage = stage.apply(1i64).unwrap();
    assert!(stage.has_next());

    let stage = stage.apply(2i64).unwrap();
    assert!(!stage.has_next());
    assert_eq!(stage.clone().into_value(), Some(Value::from(3i64)));

    let err = stage.apply(3i64).unwrap_err();
    assert!(err.is_no_more_parameters(), "{err}");
}

#[test]
fn partial_applications_are_reusable() {
    let prefix = Stage::new(concat3()).unwrap().apply("<").unwrap();

    let a = prefix.apply(1).unwrap().apply(">").unwrap();
    let b = prefix.apply(2).unwrap().apply("]").unwrap();
    assert_eq!(a.into_value(), Some(Value::from("<1>")));
    assert_eq!(b.into_value(), Some(Value::from("<2]")));

    match prefix {
        Stage::Pending(function) => {
            assert_eq!(function.bound(), &[Value::from("<")]);
            assert_eq!(function.next_parameter_type(), INT);
        }
        Stage::Final(_) => panic!("one parameter bound out of three"),
    }
}

#[test]
fn arguments_are_checked_against_their_parameter() {
    let stage = Stage::new(concat3()).unwrap().apply("a").unwrap();

    match stage.apply("not a number").unwrap_err() {
        CallError::InvalidArgumentType {
            operation,
            position,
            expected,
            found,
            value,
        } => {
            assert_eq!(operation, "concat3");
            assert_eq!(position, 1);
            assert_eq!(expected, "i32");
            assert_eq!(found, "String");
            assert_eq!(value, "\"not a number\"");
        }
        other => panic!("expected an argument type error, got {other:?}"),
    }

    // Null never fits a primitive parameter.
    assert!(stage.apply(Value::Null).unwrap_err().is_invalid_argument_type());
    // Widening is accepted.
    assert!(stage.apply(3i16).is_ok());
}

#[test]
fn return_values_are_checked_against_the_declaration() {
    let liar = Arc::new(NativeOperation::new("liar", [INT], Type::STRING, |args| {
        Ok(args[0].clone())
    }));

    match Stage::new(liar).unwrap().apply(7).unwrap_err() {
        CallError::InvalidReturnType {
            operation,
            expected,
            found,
            ..
        } => {
            assert_eq!(operation, "liar");
            assert_eq!(expected, "String");
            assert_eq!(found, "Integer");
        }
        other => panic!("expected a return type error, got {other:?}"),
    }
}

#[test]
fn null_fits_a_class_return_type() {
    let nothing = Arc::new(NativeOperation::new("nothing", Vec::new(), Type::STRING, |_| {
        Ok(Value::Null)
    }));
    let stage = Stage::new(nothing).unwrap();
    assert_eq!(stage.into_value(), Some(Value::Null));
}

#[test]
fn operation_runs_once_all_arguments_are_bound() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let op = Arc::new(NativeOperation::new("count", [INT, INT], INT, move |args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(args[1].clone())
    }));

    let stage = Stage::new(op).unwrap().apply(1).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    stage.apply(2).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn native_failures_become_invocation_faults() {
    let failing = Arc::new(NativeOperation::new("failing", [INT], INT, |_| {
        Err("boom".into())
    }));
    let err = Stage::new(failing).unwrap().apply(1).unwrap_err();
    assert!(err.is_invocation_fault());
    assert!(err.to_string().contains("boom"));
}

#[test]
fn resolver_stages_instance_methods_with_receiver_first() {
    let resolver = Resolver::global();
    let substring = resolver
        .curry(ClassRef::STRING, "substring", &[INT, INT])
        .unwrap();
    assert_eq!(substring.remaining(), 3);

    let result = substring
        .apply("hello")
        .and_then(|s| s.apply(1))
        .and_then(|s| s.apply(3))
        .unwrap();
    assert_eq!(result.into_value(), Some(Value::from("el")));

    // The receiver is typed with the declaring class.
    let err = substring.apply(5).unwrap_err();
    assert!(err.is_invalid_argument_type());
}

#[test]
fn resolver_stages_inherited_and_class_methods() {
    let resolver = Resolver::global();

    let length = resolver.curry(ClassRef::STRING, "length", &[]).unwrap();
    let value = length.apply("four").unwrap().into_value();
    assert_eq!(value, Some(Value::from(4)));

    let value_of = resolver
        .curry(ClassRef::STRING, "valueOf", &[INT])
        .unwrap();
    assert_eq!(value_of.remaining(), 1);
    assert_eq!(value_of.apply(12).unwrap().into_value(), Some(Value::from("12")));

    let err = resolver
        .curry(ClassRef::STRING, "valueOf", &[Type::Primitive(PrimitiveType::I8)])
        .unwrap_err();
    assert!(err.is_method_not_found());
}
