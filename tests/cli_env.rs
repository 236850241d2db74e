use buildrun::cli::{env_or, parse_env_pairs, require_env};
use buildrun::errors::BuildrunError;

#[test]
fn require_env_returns_the_value_when_set() {
    // SAFETY: test-only; the variable name is unique to this test.
    unsafe { std::env::set_var("BUILDRUN_TEST_REQUIRED", "present") };
    let value = require_env("BUILDRUN_TEST_REQUIRED").expect("variable is set");
    assert_eq!(value, "present");
}

#[test]
fn require_env_fails_with_the_variable_name_when_missing() {
    let err = require_env("BUILDRUN_TEST_DEFINITELY_MISSING")
        .expect_err("variable is not set");
    assert!(matches!(err, BuildrunError::MissingEnv(ref name) if name == "BUILDRUN_TEST_DEFINITELY_MISSING"));
    assert_eq!(
        err.to_string(),
        "environment variable 'BUILDRUN_TEST_DEFINITELY_MISSING' is mandatory"
    );
}

#[test]
fn env_or_falls_back_to_the_default() {
    assert_eq!(env_or("BUILDRUN_TEST_ALSO_MISSING", "25"), "25");

    // SAFETY: test-only; the variable name is unique to this test.
    unsafe { std::env::set_var("BUILDRUN_TEST_OPTIONAL", "587") };
    assert_eq!(env_or("BUILDRUN_TEST_OPTIONAL", "25"), "587");
}

#[test]
fn env_pairs_parse_into_a_map() {
    let pairs = vec!["A=1".to_string(), "B=x=y".to_string()];
    let map = parse_env_pairs(&pairs).expect("valid pairs");
    assert_eq!(map.get("A").map(String::as_str), Some("1"));
    // Only the first '=' separates the name from the value.
    assert_eq!(map.get("B").map(String::as_str), Some("x=y"));
}

#[test]
fn env_pairs_without_an_equals_sign_are_rejected() {
    let pairs = vec!["NOT_A_PAIR".to_string()];
    assert!(parse_env_pairs(&pairs).is_err());
}
