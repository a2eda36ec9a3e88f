//! Tests for target column analysis and encoding

use credscore::pipeline::*;
use polars::prelude::*;

fn yes_no_frame() -> DataFrame {
    df! {
        "Default_Flag" => ["No", "Yes", "No", "No", " Yes ", "No", "Unknown", "No"],
        "Utilization_Ratio" => [0.1f64, 0.9, 0.2, 0.3, 0.8, 0.1, 0.5, 0.4],
    }
    .unwrap()
}

#[test]
fn test_binary_int_target_needs_no_mapping() {
    let df = df! { "Default_Flag" => [0i32, 1, 0, 1] }.unwrap();
    assert_eq!(
        analyze_target_column(&df, "Default_Flag").unwrap(),
        TargetAnalysis::AlreadyBinary
    );
    assert_eq!(
        target_values(&df, "Default_Flag", None).unwrap(),
        vec![Some(0), Some(1), Some(0), Some(1)]
    );
}

#[test]
fn test_binary_float_target_with_nulls() {
    let df = df! { "Default_Flag" => [Some(0.0f64), Some(1.0), None, Some(1.0)] }.unwrap();
    assert_eq!(
        analyze_target_column(&df, "Default_Flag").unwrap(),
        TargetAnalysis::AlreadyBinary
    );
    assert_eq!(
        target_values(&df, "Default_Flag", None).unwrap(),
        vec![Some(0), Some(1), None, Some(1)]
    );
}

#[test]
fn test_text_target_needs_mapping() {
    match analyze_target_column(&yes_no_frame(), "Default_Flag").unwrap() {
        TargetAnalysis::NeedsMapping { unique_values } => {
            assert!(unique_values.contains(&"Yes".to_string()));
            assert!(unique_values.contains(&"No".to_string()));
        }
        other => panic!("expected NeedsMapping, got {:?}", other),
    }
}

#[test]
fn test_default_mapping_is_yes_no() {
    let values = target_values(&yes_no_frame(), "Default_Flag", None).unwrap();
    assert_eq!(
        values,
        vec![Some(0), Some(1), Some(0), Some(0), Some(1), Some(0), None, Some(0)]
    );
    assert_eq!(count_target_classes(&values), (2, 5, 1));
}

#[test]
fn test_custom_mapping() {
    let df = df! { "status" => ["B", "G", "G", "B", "G"] }.unwrap();
    let mapping = TargetMapping::new("B", "G");
    let values = target_values(&df, "status", Some(&mapping)).unwrap();
    assert_eq!(values, vec![Some(1), Some(0), Some(0), Some(1), Some(0)]);
}

#[test]
fn test_numeric_non_binary_target_goes_through_mapping() {
    let df = df! { "grade" => [1i32, 2, 3, 1, 2, 3] }.unwrap();
    assert!(matches!(
        analyze_target_column(&df, "grade").unwrap(),
        TargetAnalysis::NeedsMapping { .. }
    ));

    let mapping = TargetMapping::new("3", "1");
    let values = target_values(&df, "grade", Some(&mapping)).unwrap();
    assert_eq!(count_target_classes(&values), (2, 2, 2));
}

#[test]
fn test_encode_target_replaces_column() {
    let encoded = encode_target(&yes_no_frame(), "Default_Flag", None).unwrap();
    let col = encoded.column("Default_Flag").unwrap();

    assert_eq!(col.dtype(), &DataType::Int32);
    assert_eq!(col.null_count(), 1);
    assert_eq!(encoded.width(), 2);
    assert_eq!(
        analyze_target_column(&encoded, "Default_Flag").unwrap(),
        TargetAnalysis::AlreadyBinary
    );
}

#[test]
fn test_encode_target_fails_when_nothing_maps() {
    let df = df! { "status" => ["B", "G", "G"] }.unwrap();
    let err = encode_target(&df, "status", None).unwrap_err();
    assert!(err.to_string().contains("no values matching"));
}

#[test]
fn test_missing_target_column() {
    assert!(target_values(&yes_no_frame(), "Nope", None).is_err());
}
