//! Structural equality for nested outputs
//!
//! Comparing a generically-decoded output against a natively-typed fixture is
//! done by canonically encoding both sides with one shared rule and comparing
//! the encodings byte-for-byte. Equality is all-or-nothing: on mismatch both
//! encodings are reported so a human can diff them, with no first-differing-
//! path diagnostic.

use crate::common::{Error, Result};
use crate::output::OutputValue;

/// Structural equality of two nested values, independent of the
/// representation each side arrived in
///
/// Symmetric: swapping the sides never changes the result.
pub fn deep_equal(actual: impl Into<OutputValue>, expected: impl Into<OutputValue>) -> bool {
    actual.into().canonical() == expected.into().canonical()
}

/// Assert that a decoded output equals an expected fixture
///
/// On mismatch returns [`Error::AssertionMismatch`] carrying both canonical
/// encodings. The caller treats this as a failed test outcome; teardown still
/// runs.
pub fn assert_outputs_equal(
    actual: impl Into<OutputValue>,
    expected: impl Into<OutputValue>,
) -> Result<()> {
    let actual = actual.into().canonical();
    let expected = expected.into().canonical();
    if actual == expected {
        Ok(())
    } else {
        Err(Error::AssertionMismatch { actual, expected })
    }
}
