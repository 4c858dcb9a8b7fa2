//! Fixed-point decimal amounts.
//!
//! Token reserves, pool shares and ownership fractions are carried as
//! unsigned 256-bit integers with an explicit decimal scale. Every operation
//! that can lose precision truncates toward zero; nothing in this module
//! rounds half-up or goes through floating point.

use ethnum::U256;
use std::fmt;

use crate::TypesError;

/// Scale of token amounts, pool shares and ownership fractions.
pub const WAD_DECIMALS: u8 = 18;

/// Scale of normalized weights (one whole unit == 10^36).
pub const PRECISION_DECIMALS: u8 = 36;

/// Largest scale whose unit still fits in a `U256` with headroom.
const MAX_SCALE: u8 = 76;

/// Decimal digits in `U256::MAX`.
const MAX_DIGITS: i64 = 78;

/// 10^scale as a `U256`.
pub fn pow10(scale: u8) -> U256 {
    U256::new(10).pow(u32::from(scale))
}

/// An unsigned decimal value stored as `raw / 10^scale`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FixedDecimal {
    raw: U256,
    scale: u8,
}

impl FixedDecimal {
    pub fn from_raw(raw: U256, scale: u8) -> Self {
        debug_assert!(scale <= MAX_SCALE);
        Self { raw, scale }
    }

    pub fn zero(scale: u8) -> Self {
        Self::from_raw(U256::ZERO, scale)
    }

    /// Exactly one whole unit at `scale`.
    pub fn one(scale: u8) -> Self {
        Self::from_raw(pow10(scale), scale)
    }

    /// A whole number of units at `scale`.
    pub fn from_integer(units: u128, scale: u8) -> Result<Self, TypesError> {
        U256::new(units)
            .checked_mul(pow10(scale))
            .map(|raw| Self::from_raw(raw, scale))
            .ok_or(TypesError::Overflow("from_integer"))
    }

    /// Parse a plain or exponent-notation decimal string.
    ///
    /// Fraction digits beyond `scale` are truncated. Negative values are
    /// rejected.
    pub fn parse(s: &str, scale: u8) -> Result<Self, TypesError> {
        let invalid = || TypesError::InvalidDecimal(s.to_string());
        if scale > MAX_SCALE {
            return Err(TypesError::Overflow("parse"));
        }

        let trimmed = s.trim();
        let (mantissa, exponent) = match trimmed.find(['e', 'E']) {
            Some(pos) => {
                let exp: i32 = trimmed[pos + 1..].parse().map_err(|_| invalid())?;
                (&trimmed[..pos], exp)
            }
            None => (trimmed, 0),
        };
        let mantissa = mantissa.strip_prefix('+').unwrap_or(mantissa);

        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        // Shift the decimal point by the exponent, then keep `scale`
        // fraction digits. Leading zeros move the point so `total` counts
        // significant digits only.
        let joined = format!("{int_part}{frac_part}");
        let digits = joined.trim_start_matches('0');
        let leading = (joined.len() - digits.len()) as i64;
        let point = int_part.len() as i64 - leading + i64::from(exponent);
        let total = point + i64::from(scale);
        if total > MAX_DIGITS {
            return Err(TypesError::Overflow("parse"));
        }

        let scaled: String = if total <= 0 {
            String::new()
        } else if total as usize >= digits.len() {
            let pad = total as usize - digits.len();
            format!("{digits}{}", "0".repeat(pad))
        } else {
            digits[..total as usize].to_string()
        };

        let scaled = scaled.trim_start_matches('0');
        if scaled.is_empty() {
            return Ok(Self::zero(scale));
        }
        let raw = U256::from_str_radix(scaled, 10).map_err(|_| TypesError::Overflow("parse"))?;
        Ok(Self::from_raw(raw, scale))
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.raw == U256::ZERO
    }

    fn same_scale(&self, other: &Self) -> Result<(), TypesError> {
        if self.scale == other.scale {
            Ok(())
        } else {
            Err(TypesError::ScaleMismatch {
                left: self.scale,
                right: other.scale,
            })
        }
    }

    pub fn checked_add(self, other: Self) -> Result<Self, TypesError> {
        self.same_scale(&other)?;
        self.raw
            .checked_add(other.raw)
            .map(|raw| Self::from_raw(raw, self.scale))
            .ok_or(TypesError::Overflow("add"))
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, TypesError> {
        self.same_scale(&other)?;
        self.raw
            .checked_sub(other.raw)
            .map(|raw| Self::from_raw(raw, self.scale))
            .ok_or(TypesError::Overflow("sub"))
    }

    /// `|self - other|`.
    pub fn abs_diff(self, other: Self) -> Result<Self, TypesError> {
        self.same_scale(&other)?;
        let raw = if self.raw >= other.raw {
            self.raw - other.raw
        } else {
            other.raw - self.raw
        };
        Ok(Self::from_raw(raw, self.scale))
    }

    /// `numerator / denominator` expressed at `scale`, truncated.
    pub fn ratio_truncated(
        numerator: Self,
        denominator: Self,
        scale: u8,
    ) -> Result<Self, TypesError> {
        numerator.same_scale(&denominator)?;
        if denominator.is_zero() {
            return Err(TypesError::DivisionByZero);
        }
        let raw = numerator
            .raw
            .checked_mul(pow10(scale))
            .ok_or(TypesError::Overflow("ratio"))?
            / denominator.raw;
        Ok(Self::from_raw(raw, scale))
    }

    /// `self * factor`, keeping `self`'s scale and truncating the
    /// `factor.scale` extra digits.
    pub fn mul_truncated(self, factor: Self) -> Result<Self, TypesError> {
        let raw = self
            .raw
            .checked_mul(factor.raw)
            .ok_or(TypesError::Overflow("mul"))?
            / pow10(factor.scale);
        Ok(Self::from_raw(raw, self.scale))
    }

    /// Whether `self` and `other` differ by at most `tolerance`.
    pub fn within(self, other: Self, tolerance: Self) -> Result<bool, TypesError> {
        let diff = self.abs_diff(other)?;
        diff.same_scale(&tolerance)?;
        Ok(diff.raw <= tolerance.raw)
    }

    /// Lossy conversion for human-facing derived figures only.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = pow10(self.scale);
        let int = self.raw / unit;
        let frac = self.raw % unit;
        if frac == U256::ZERO {
            return write!(f, "{int}");
        }
        let frac = format!("{:0>width$}", frac.to_string(), width = self.scale as usize);
        write!(f, "{int}.{}", frac.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wad(s: &str) -> FixedDecimal {
        FixedDecimal::parse(s, WAD_DECIMALS).unwrap()
    }

    #[test]
    fn parse_plain_decimal() {
        let d = wad("1000.5");
        assert_eq!(d.raw(), U256::new(1_000_500_000_000_000_000_000));
        assert_eq!(d.to_string(), "1000.5");
    }

    #[test]
    fn parse_integer_and_leading_dot() {
        assert_eq!(wad("42").raw(), pow10(18) * U256::new(42));
        assert_eq!(wad(".25").raw(), U256::new(250_000_000_000_000_000));
        assert_eq!(wad("0").raw(), U256::ZERO);
    }

    #[test]
    fn parse_truncates_excess_fraction_digits() {
        let d = wad("0.1234567890123456789999");
        assert_eq!(d.raw(), U256::new(123_456_789_012_345_678));
    }

    #[test]
    fn parse_exponent_notation() {
        assert_eq!(wad("1e-18").raw(), U256::ONE);
        assert_eq!(wad("1.5E3").raw(), pow10(18) * U256::new(1500));
        assert_eq!(wad("1e-19").raw(), U256::ZERO);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(FixedDecimal::parse("", 18).is_err());
        assert!(FixedDecimal::parse("-1", 18).is_err());
        assert!(FixedDecimal::parse("1.2.3", 18).is_err());
        assert!(FixedDecimal::parse("abc", 18).is_err());
        assert!(FixedDecimal::parse(".", 18).is_err());
    }

    #[test]
    fn parse_bounds_huge_exponents() {
        assert_eq!(
            FixedDecimal::parse("1e2147483000", 18),
            Err(TypesError::Overflow("parse"))
        );
        assert_eq!(
            FixedDecimal::parse("1e61", 18),
            Err(TypesError::Overflow("parse"))
        );
        assert_eq!(wad("1e-2147483000").raw(), U256::ZERO);
        assert_eq!(wad("1e59").raw(), pow10(77));
    }

    #[test]
    fn parse_leading_zeros_do_not_count_toward_overflow() {
        let padded = format!("{}1", "0".repeat(100));
        assert_eq!(wad(&padded).raw(), pow10(18));
    }

    #[test]
    fn ratio_truncates() {
        let one_third = FixedDecimal::ratio_truncated(wad("1"), wad("3"), 18).unwrap();
        assert_eq!(one_third.raw(), U256::new(333_333_333_333_333_333));
        let exact = FixedDecimal::ratio_truncated(wad("60"), wad("100"), 18).unwrap();
        assert_eq!(exact.to_string(), "0.6");
    }

    #[test]
    fn ratio_by_zero_fails() {
        let err = FixedDecimal::ratio_truncated(wad("1"), wad("0"), 18).unwrap_err();
        assert_eq!(err, TypesError::DivisionByZero);
    }

    #[test]
    fn mul_truncated_keeps_left_scale() {
        let reserve = wad("1000");
        let fraction = FixedDecimal::ratio_truncated(wad("40"), wad("100"), 18).unwrap();
        let owned = reserve.mul_truncated(fraction).unwrap();
        assert_eq!(owned.scale(), 18);
        assert_eq!(owned.to_string(), "400");
    }

    #[test]
    fn scale_mismatch_is_an_error() {
        let a = FixedDecimal::one(18);
        let b = FixedDecimal::one(36);
        assert!(matches!(
            a.checked_add(b),
            Err(TypesError::ScaleMismatch { left: 18, right: 36 })
        ));
    }

    #[test]
    fn within_tolerance() {
        let tol = FixedDecimal::one(18);
        assert!(wad("100").within(wad("101"), tol).unwrap());
        assert!(wad("101").within(wad("100"), tol).unwrap());
        assert!(!wad("100").within(wad("105"), tol).unwrap());
    }

    #[test]
    fn checked_sub_underflow() {
        assert!(wad("1").checked_sub(wad("2")).is_err());
        assert_eq!(wad("2").checked_sub(wad("0.5")).unwrap().to_string(), "1.5");
    }

    #[test]
    fn display_small_fraction() {
        assert_eq!(FixedDecimal::from_raw(U256::ONE, 18).to_string(), "0.000000000000000001");
        assert_eq!(FixedDecimal::one(36).to_string(), "1");
    }

    #[test]
    fn to_f64_is_close() {
        assert!((wad("0.25").to_f64() - 0.25).abs() < f64::EPSILON);
    }
}
