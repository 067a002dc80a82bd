//! Tests for family names.

use super::*;

#[test]
fn test_names_and_labels_parse_back() {
    for family in SetFamily::all() {
        assert_eq!(family.name().parse::<SetFamily>(), Ok(family));
        assert_eq!(family.label().parse::<SetFamily>(), Ok(family));
        assert_eq!(family.label().to_uppercase().parse::<SetFamily>(), Ok(family));
    }
}

#[test]
fn test_unknown_name() {
    let err = "skip_list".parse::<SetFamily>().unwrap_err();
    assert_eq!(err, UnknownFamily("skip_list".to_string()));
    assert_eq!(err.to_string(), "unknown set family: skip_list");
}

#[test]
fn test_labels_are_unique() {
    let labels: std::collections::HashSet<_> =
        SetFamily::all().iter().map(SetFamily::label).collect();
    assert_eq!(labels.len(), SetFamily::all().len());
}
