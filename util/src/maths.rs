//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Limit a value to the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Limit a value to the symmetric range `[-limit, +limit]`.
///
/// Returns the limited value and `true` if the value had to be changed to fit in the range.
pub fn clamp_sym<T>(value: T, limit: T) -> (T, bool)
where
    T: Float,
{
    let limit = limit.abs();
    let ret = clamp(value, -limit, limit);

    (ret, ret != value)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 10f64), (0f64, 100f64), 2.5), 25.0);
        assert_eq!(lin_map((0f64, 1f64), (1f64, -1f64), 0.5), 0.0);
    }

    #[test]
    fn test_clamp_sym() {
        assert_eq!(clamp_sym(0.5f64, 1.0), (0.5, false));
        assert_eq!(clamp_sym(1.5f64, 1.0), (1.0, true));
        assert_eq!(clamp_sym(-1.5f64, 1.0), (-1.0, true));
        assert_eq!(clamp_sym(-1.5f64, -1.0), (-1.0, true));
        assert_eq!(clamp_sym(-1.0f64, 1.0), (-1.0, false));
    }
}
