use bindery::{extract, hydrate, TypeAnnotation, TypedValue};
use serde_json::json;

fn fixed_tuple() -> TypeAnnotation {
    TypeAnnotation::Tuple(vec![
        TypeAnnotation::Str,
        TypeAnnotation::Int,
        TypeAnnotation::Str,
        TypeAnnotation::Int,
    ])
}

#[test]
fn test_hydrate_typed_tuple() {
    let typed = hydrate(&json!(["a", 1, 2.1, true]), &fixed_tuple()).unwrap();
    assert_eq!(
        typed,
        TypedValue::Tuple(vec![
            TypedValue::Str("a".into()),
            TypedValue::Int(1),
            TypedValue::Str("2.1".into()),
            TypedValue::Int(1),
        ])
    );
}

#[test]
fn test_hydrate_ellipsis_tuple() {
    // Every element coerces to the single declared type, regardless of position.
    let annotation = TypeAnnotation::variadic_tuple(TypeAnnotation::Str);
    let typed = hydrate(&json!(["a", 1, 2.1, true]), &annotation).unwrap();
    assert_eq!(
        typed,
        TypedValue::Tuple(vec![
            TypedValue::Str("a".into()),
            TypedValue::Str("1".into()),
            TypedValue::Str("2.1".into()),
            TypedValue::Str("true".into()),
        ])
    );
}

#[test]
fn test_hydrate_tuple_ignores_excess_elements() {
    let annotation = TypeAnnotation::Tuple(vec![TypeAnnotation::Str, TypeAnnotation::Int]);
    let typed = hydrate(&json!(["a", 1, "ignored", "also ignored"]), &annotation).unwrap();
    assert_eq!(
        typed,
        TypedValue::Tuple(vec![TypedValue::Str("a".into()), TypedValue::Int(1)])
    );
}

#[test]
fn test_hydrate_tuple_fails_at_missing_position() {
    let err = hydrate(&json!(["a", 1]), &fixed_tuple()).unwrap_err();
    assert!(
        err.to_string().contains("at least 3"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_extract_typed_tuple() {
    let typed = TypedValue::Tuple(vec![
        TypedValue::Str("a".into()),
        TypedValue::Int(1),
        TypedValue::Float(2.1),
        TypedValue::Bool(true),
    ]);
    // Extraction coerces by the declared element types too.
    assert_eq!(extract(&typed, &fixed_tuple()).unwrap(), json!(["a", 1, "2.1", 1]));
}

#[test]
fn test_extract_ellipsis_tuple() {
    let annotation = TypeAnnotation::variadic_tuple(TypeAnnotation::Str);
    let typed = TypedValue::Tuple(vec![
        TypedValue::Str("a".into()),
        TypedValue::Int(1),
        TypedValue::Float(2.1),
        TypedValue::Bool(true),
    ]);
    assert_eq!(
        extract(&typed, &annotation).unwrap(),
        json!(["a", "1", "2.1", "true"])
    );
}

#[test]
fn test_tuple_requires_a_sequence() {
    assert!(hydrate(&json!("not a tuple"), &fixed_tuple()).is_err());
    assert!(hydrate(&json!({"0": "a"}), &fixed_tuple()).is_err());
}
