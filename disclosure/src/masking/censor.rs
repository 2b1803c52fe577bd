//! Extrapolation and censoring of scalar aggregates.
//!
//! These are pure numeric transformations. They do not decide whether a value
//! should be masked; that is [`super::PrivacyMasker::should_mask`].

/// Numeric aggregates that can pass through masking.
///
/// `from_masked` converts the masked `i64` back into the field's own type so a
/// record keeps its shape after masking. Integer conversions saturate.
pub trait MaskScalar: Copy {
    /// Rounds half away from zero; floats saturate and NaN becomes `0`.
    fn round_to_long(self) -> i64;
    fn is_zero(self) -> bool;
    #[must_use]
    fn from_masked(masked: i64) -> Self;
}

macro_rules! impl_mask_scalar_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MaskScalar for $ty {
                fn round_to_long(self) -> i64 {
                    i64::try_from(self).unwrap_or(i64::MAX)
                }

                fn is_zero(self) -> bool {
                    self == 0
                }

                fn from_masked(masked: i64) -> Self {
                    <$ty>::try_from(masked)
                        .unwrap_or(if masked < 0 { <$ty>::MIN } else { <$ty>::MAX })
                }
            }
        )*
    };
}

impl_mask_scalar_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

#[allow(clippy::cast_possible_truncation)]
impl MaskScalar for f64 {
    fn round_to_long(self) -> i64 {
        self.round() as i64
    }

    #[allow(clippy::float_cmp)]
    fn is_zero(self) -> bool {
        self == 0.0
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_masked(masked: i64) -> Self {
        masked as f64
    }
}

#[allow(clippy::cast_possible_truncation)]
impl MaskScalar for f32 {
    fn round_to_long(self) -> i64 {
        f64::from(self).round() as i64
    }

    #[allow(clippy::float_cmp)]
    fn is_zero(self) -> bool {
        self == 0.0
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_masked(masked: i64) -> Self {
        masked as f32
    }
}

/// Scales a value by `factor` with two-stage rounding: `round(round(value) * factor)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn extrapolate<S: MaskScalar>(value: S, factor: f64) -> i64 {
    (value.round_to_long() as f64 * factor).round() as i64
}

/// Collapses everything below `threshold` to exactly `threshold`.
pub fn apply_privacy_censor(value: i64, threshold: i64) -> i64 {
    value.max(threshold)
}
