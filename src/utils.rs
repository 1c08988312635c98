// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # Utilities - *Internal Helper Utilities*
//!
//! A small collection of helpers for shape arithmetic and environment
//! parsing used elsewhere within the crate.

use std::str::FromStr;

use tracing::warn;

use crate::Stride;

/// Number of elements described by `shape`. Rank-0 shapes hold one element.
#[inline]
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Row-major strides for a densely packed `shape`.
pub fn row_major_strides(shape: &[usize]) -> Vec<Stride> {
    let mut strides = vec![0; shape.len()];
    let mut acc: Stride = 1;
    for (stride, &extent) in strides.iter_mut().zip(shape).rev() {
        *stride = acc;
        acc *= extent.max(1) as Stride;
    }
    strides
}

/// Integer ceiling division.
#[inline(always)]
pub fn ceil_div(n: usize, d: usize) -> usize {
    debug_assert!(d != 0, "ceil_div by zero");
    n.div_ceil(d)
}

/// Reads and parses an environment override.
///
/// Returns `None` when the variable is unset. Values that fail to parse are
/// logged and ignored, so a typo never aborts task setup.
pub fn env_override<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_strides() {
        assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(row_major_strides(&[5]), vec![1]);
        assert!(row_major_strides(&[]).is_empty());
    }

    #[test]
    fn test_element_count_rank0_is_one() {
        assert_eq!(element_count(&[]), 1);
        assert_eq!(element_count(&[3, 0, 2]), 0);
    }

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(10, 3), 4);
        assert_eq!(ceil_div(9, 3), 3);
        assert_eq!(ceil_div(0, 3), 0);
    }

    #[test]
    fn test_env_override_missing_is_none() {
        assert_eq!(env_override::<usize>("BINOP_TEST_UNSET_VARIABLE_XYZ"), None);
    }
}
