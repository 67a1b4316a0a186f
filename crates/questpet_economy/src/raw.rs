//! # Raw Boundary Values
//!
//! Stores hand back signed integers. These conversions reject anything the
//! typed API cannot represent instead of clamping it, so a corrupt record
//! surfaces as an error at the boundary.

use crate::error::{EconomyError, EconomyResult};

/// Validates a stored star tier.
///
/// # Errors
///
/// `InvalidArgument` if negative or too large.
pub fn stars_from_raw(stars: i64) -> EconomyResult<u32> {
    non_negative("star tier", stars)
}

/// Validates a stored fragment balance.
///
/// # Errors
///
/// `InvalidArgument` if negative or too large.
pub fn fragments_from_raw(fragments: i64) -> EconomyResult<u32> {
    non_negative("fragment balance", fragments)
}

/// Validates a stored powder balance.
///
/// # Errors
///
/// `InvalidArgument` if negative.
pub fn powder_from_raw(powder: i64) -> EconomyResult<u64> {
    non_negative("powder balance", powder)
}

fn non_negative<T: TryFrom<i64>>(what: &str, value: i64) -> EconomyResult<T> {
    if value < 0 {
        return Err(EconomyError::InvalidArgument(format!(
            "{what} must not be negative, got {value}"
        )));
    }
    T::try_from(value)
        .map_err(|_| EconomyError::InvalidArgument(format!("{what} out of range: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_values_rejected() {
        assert!(matches!(stars_from_raw(-1), Err(EconomyError::InvalidArgument(_))));
        assert!(matches!(fragments_from_raw(-20), Err(EconomyError::InvalidArgument(_))));
        assert!(matches!(powder_from_raw(-100), Err(EconomyError::InvalidArgument(_))));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            stars_from_raw(i64::from(u32::MAX) + 1),
            Err(EconomyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_valid_values_pass_through() {
        assert_eq!(stars_from_raw(4).unwrap(), 4);
        assert_eq!(fragments_from_raw(0).unwrap(), 0);
        assert_eq!(powder_from_raw(1250).unwrap(), 1250);
    }
}
