//! Custom Test Assertions
//!
//! Provides assertion helpers for violations and aggregates that give more
//! meaningful failure messages than standard assertions.

use domain_loyalty::{LoyaltyError, ProgramAggregate, ValidationResult, Violation, ViolationCode};

/// Asserts that a result contains a violation with `code`
///
/// # Panics
///
/// Panics listing every recorded violation when the code is absent
pub fn assert_has_violation(result: &ValidationResult, code: ViolationCode) {
    assert!(
        result.has(code),
        "Expected violation {}, got: [{}]",
        code,
        describe(result.violations())
    );
}

/// Asserts that a violation with `code` is reported at `field`
pub fn assert_violation_at(result: &ValidationResult, code: ViolationCode, field: &str) {
    let found = result
        .violations()
        .iter()
        .any(|v| v.code == code && v.field.as_deref() == Some(field));
    assert!(
        found,
        "Expected violation {} at {}, got: [{}]",
        code,
        field,
        describe(result.violations())
    );
}

/// Asserts that a result records no violation
pub fn assert_valid(result: &ValidationResult) {
    assert!(
        result.is_valid(),
        "Expected no violations, got: [{}]",
        describe(result.violations())
    );
}

/// Asserts that an error is a validation failure and returns its violations
pub fn assert_validation_failed(error: &LoyaltyError) -> &[Violation] {
    match error.violations() {
        Some(violations) => violations,
        None => panic!("Expected ValidationFailed, got: {error}"),
    }
}

/// Asserts that two projections of the same program are identical
pub fn assert_same_aggregate(actual: &ProgramAggregate, expected: &ProgramAggregate) {
    assert_eq!(actual.id(), expected.id(), "Aggregates belong to different programs");
    assert_eq!(
        actual.row_count(),
        expected.row_count(),
        "Row counts differ for program {}",
        actual.id()
    );
    assert_eq!(actual, expected);
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
