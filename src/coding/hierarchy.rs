//! Top-level ICD hierarchy buckets
//!
//! Procedure codes keep two digits after the `P_` prefix. Diagnosis codes
//! keep three characters after `D_`, or four for external-cause `E` codes.

const PROCEDURE_PREFIX: &str = "P_";
const DIAGNOSIS_PREFIX: &str = "D_";
const EXTERNAL_CAUSE_PREFIX: &str = "D_E";

/// Reduce a prefixed code to its hierarchy bucket
///
/// Returns `None` for codes with neither a diagnosis nor a procedure prefix.
/// Codes shorter than their cut-off are returned whole.
#[must_use]
pub fn try_reduce(code: &str) -> Option<&str> {
    let cut = if code.starts_with(PROCEDURE_PREFIX) {
        4
    } else if code.starts_with(EXTERNAL_CAUSE_PREFIX) {
        6
    } else if code.starts_with(DIAGNOSIS_PREFIX) {
        5
    } else {
        return None;
    };
    Some(code.get(..cut).unwrap_or(code))
}

/// Reduce a prefixed code to its hierarchy bucket, leaving unprefixed codes unchanged
#[must_use]
pub fn reduce(code: &str) -> String {
    try_reduce(code).unwrap_or(code).to_string()
}
