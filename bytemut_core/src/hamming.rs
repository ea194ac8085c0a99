//! Distance measures between equal-length buffers.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HammingError {
    #[error("Buffers differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
}

fn check_lengths(a: &[u8], b: &[u8]) -> Result<(), HammingError> {
    if a.len() != b.len() {
        return Err(HammingError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

/// Number of byte positions at which `a` and `b` differ.
pub fn bytewise_distance(a: &[u8], b: &[u8]) -> Result<usize, HammingError> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).filter(|(x, y)| x != y).count())
}

/// Number of bit positions at which `a` and `b` differ.
pub fn bitwise_distance(a: &[u8], b: &[u8]) -> Result<usize, HammingError> {
    check_lengths(a, b)?;
    Ok(a
        .iter()
        .zip(b)
        .map(|(x, y)| (x ^ y).count_ones() as usize)
        .sum())
}
