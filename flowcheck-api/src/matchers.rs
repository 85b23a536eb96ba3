//! Ready-made output matchers.
//!
//! Each constructor returns an [`OutputVerifier`] whose failure names the
//! offending records, so a failing test explains itself. Matching is
//! order-insignificant throughout: parallel delivery gives no arrival-order
//! guarantee.

use std::fmt::Debug;

use flowcheck_core::verifier::{OutputVerifier, VerifyError};

/// The output is exactly the expected multiset, in any order.
pub fn contains_exactly_in_any_order<T>(expected: Vec<T>) -> impl OutputVerifier<T>
where
    T: PartialEq + Debug + Send + 'static,
{
    move |records: &[T]| -> Result<(), VerifyError> {
        let mut missing: Vec<&T> = expected.iter().collect();
        let mut unexpected: Vec<&T> = Vec::new();
        for record in records {
            match missing.iter().position(|e| *e == record) {
                Some(pos) => {
                    missing.swap_remove(pos);
                }
                None => unexpected.push(record),
            }
        }

        if missing.is_empty() && unexpected.is_empty() {
            return Ok(());
        }
        let mut parts = vec![format!(
            "expected exactly {} record(s) in any order, saw {}",
            expected.len(),
            records.len()
        )];
        if !missing.is_empty() {
            parts.push(format!("missing: {:?}", missing));
        }
        if !unexpected.is_empty() {
            parts.push(format!("unexpected: {:?}", unexpected));
        }
        Err(VerifyError::new(parts.join("; ")))
    }
}

/// Every expected record appears in the output (extras are allowed).
pub fn contains_in_any_order<T>(expected: Vec<T>) -> impl OutputVerifier<T>
where
    T: PartialEq + Debug + Send + 'static,
{
    move |records: &[T]| -> Result<(), VerifyError> {
        let mut missing: Vec<&T> = expected.iter().collect();
        for record in records {
            if let Some(pos) = missing.iter().position(|e| *e == record) {
                missing.swap_remove(pos);
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(VerifyError::new(format!(
                "expected record(s) never arrived; missing: {:?}",
                missing
            )))
        }
    }
}

/// The output has exactly `expected` records.
pub fn has_size<T: Send + 'static>(expected: usize) -> impl OutputVerifier<T> {
    move |records: &[T]| -> Result<(), VerifyError> {
        if records.len() == expected {
            Ok(())
        } else {
            Err(VerifyError::new(format!(
                "expected exactly {} record(s), saw {}",
                expected,
                records.len()
            )))
        }
    }
}

/// Every record satisfies the predicate; `description` names the property.
pub fn all_match<T, F>(description: impl Into<String>, predicate: F) -> impl OutputVerifier<T>
where
    T: Debug + Send + 'static,
    F: Fn(&T) -> bool + Send + 'static,
{
    let description = description.into();
    move |records: &[T]| -> Result<(), VerifyError> {
        for (idx, record) in records.iter().enumerate() {
            if !predicate(record) {
                return Err(VerifyError::new(format!(
                    "record {:?} at position {} does not match: {}",
                    record, idx, description
                )));
            }
        }
        Ok(())
    }
}

/// Escape hatch: use a hand-written predicate over the full batch.
pub fn verify_with<T, F>(f: F) -> impl OutputVerifier<T>
where
    T: Send + 'static,
    F: Fn(&[T]) -> Result<(), VerifyError> + Send + 'static,
{
    f
}
