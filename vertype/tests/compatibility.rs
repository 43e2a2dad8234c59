use vertype::{ClassRef, ClassRegistry, Conversion, Object, PrimitiveType, Type, Value};

#[test]
fn primitive_parameters_reject_null() {
    let reg = ClassRegistry::new();
    for p in [PrimitiveType::I32, PrimitiveType::Bool, PrimitiveType::F64] {
        assert_eq!(Type::from(p).accepts(&Value::Null, &reg), None);
    }
    assert_eq!(
        Type::STRING.accepts(&Value::Null, &reg),
        Some(Conversion::Assignable)
    );
}

#[test]
fn boxed_primitives_unbox_and_widen() {
    let reg = ClassRegistry::new();
    let long = Type::from(PrimitiveType::I64);

    assert_eq!(long.accepts(&Value::from(1i64), &reg), Some(Conversion::Exact));
    assert_eq!(long.accepts(&Value::from(1i32), &reg), Some(Conversion::Widening));
    assert_eq!(long.accepts(&Value::from('a'), &reg), Some(Conversion::Widening));
    assert_eq!(long.accepts(&Value::from(1.0f32), &reg), None);
    assert_eq!(long.accepts(&Value::from("1"), &reg), None);

    let short = Type::from(PrimitiveType::I16);
    assert_eq!(short.accepts(&Value::from('a'), &reg), None);
}

#[test]
fn class_parameters_use_assignability() {
    let reg = ClassRegistry::new();
    let char_seq = Type::Class(ClassRef::CHAR_SEQUENCE);

    assert_eq!(Type::STRING.accepts(&Value::from("x"), &reg), Some(Conversion::Exact));
    assert_eq!(char_seq.accepts(&Value::from("x"), &reg), Some(Conversion::Assignable));
    assert_eq!(Type::OBJECT.accepts(&Value::from(5), &reg), Some(Conversion::Assignable));
    assert_eq!(
        Type::Class(ClassRef::NUMBER).accepts(&Value::from(5), &reg),
        Some(Conversion::Assignable)
    );
    assert_eq!(Type::STRING.accepts(&Value::from(5), &reg), None);
}

#[test]
fn user_classes_participate_in_assignability() {
    let reg = ClassRegistry::new();
    let shape = reg.declare("Shape", &[]).unwrap();
    let circle = reg.declare("Circle", &[shape]).unwrap();
    let value = Value::from(Object::new(circle).with_field("r", 1.0f64));

    assert_eq!(Type::Class(circle).accepts(&value, &reg), Some(Conversion::Exact));
    assert_eq!(Type::Class(shape).accepts(&value, &reg), Some(Conversion::Assignable));
    assert_eq!(Type::STRING.accepts(&value, &reg), None);
}

#[test]
fn specificity_ordering() {
    let reg = ClassRegistry::new();
    let string = Type::STRING;
    let char_seq = Type::Class(ClassRef::CHAR_SEQUENCE);
    let int = Type::from(PrimitiveType::I32);
    let long = Type::from(PrimitiveType::I64);

    assert!(string.is_narrower_than(&char_seq, &reg));
    assert!(!char_seq.is_narrower_than(&string, &reg));
    assert!(string.is_narrower_than(&string, &reg));

    assert!(int.is_narrower_than(&long, &reg));
    assert!(!long.is_narrower_than(&int, &reg));
    assert!(int.is_narrower_than(&Type::Class(ClassRef::NUMBER), &reg));
    assert!(!Type::Class(ClassRef::INTEGER).is_narrower_than(&int, &reg));
}

#[test]
fn type_display_uses_class_names() {
    let reg = ClassRegistry::new();
    assert_eq!(Type::STRING.fmt(&reg).to_string(), "String");
    assert_eq!(Type::from(PrimitiveType::Char).fmt(&reg).to_string(), "char");
    assert_eq!(Type::Class(ClassRef::LIST).to_string(), "List");
}
