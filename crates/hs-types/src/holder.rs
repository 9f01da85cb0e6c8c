//! Holder snapshot records.
//!
//! A [`HolderRecord`] is one address's balance on one snapshot date. The
//! date itself is carried by the store, so the record only holds what the
//! holder-listing API reports about the address.

use crate::TypeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Most significant digits kept when scaling. Fits a 96-bit mantissa.
const MAX_DIGITS: usize = 28;

/// A single holder in a daily snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderRecord {
    /// Normalized address (`0x` + 40 lowercase hex chars).
    pub address: String,

    /// Whether the address is a contract rather than a user wallet.
    pub is_contract: bool,

    /// Token balance in whole-token units.
    pub balance: Decimal,
}

impl HolderRecord {
    /// Build a record from the raw integer amount the API reports.
    ///
    /// `raw_value` is the balance in the token's smallest unit; `decimals`
    /// is the token's fixed-point scale.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::InvalidAddress`] for malformed addresses and
    /// [`TypeError::InvalidAmount`] when the amount is negative, not an
    /// integer, or too large to represent at the given scale.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hs_types::HolderRecord;
    /// use rust_decimal_macros::dec;
    ///
    /// let record = HolderRecord::from_raw(
    ///     "0x00000000219AB540356cBB839Cbe05303d7705Fa",
    ///     true,
    ///     "1500000000000000000",
    ///     18,
    /// ).unwrap();
    ///
    /// assert_eq!(record.address, "0x00000000219ab540356cbb839cbe05303d7705fa");
    /// assert_eq!(record.balance, dec!(1.5));
    /// ```
    pub fn from_raw(
        address: &str,
        is_contract: bool,
        raw_value: &str,
        decimals: u32,
    ) -> Result<Self, TypeError> {
        let address = normalize_address(address)?;
        let balance = scale_raw_amount(raw_value, decimals)?;
        Ok(Self {
            address,
            is_contract,
            balance,
        })
    }
}

/// Validate and normalize an address to lowercase `0x`-prefixed hex.
pub fn normalize_address(address: &str) -> Result<String, TypeError> {
    let trimmed = address.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TypeError::InvalidAddress(address.to_string()));
    }

    Ok(format!("0x{}", hex.to_ascii_lowercase()))
}

/// Scale an integer amount in the token's smallest unit to whole tokens.
///
/// The digit string is split at `decimals` directly, so amounts far beyond
/// 96 bits still convert. Fractional digits past the 28 most significant
/// are truncated.
///
/// ```rust
/// use hs_types::scale_raw_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(scale_raw_amount("2500000", 6).unwrap(), dec!(2.5));
/// assert_eq!(
///     scale_raw_amount(&format!("2{}", "0".repeat(29)), 18).unwrap(),
///     dec!(200000000000),
/// );
/// ```
///
/// # Errors
///
/// [`TypeError::InvalidAmount`] for anything other than ASCII digits, or
/// when the whole-token part alone exceeds 28 digits.
pub fn scale_raw_amount(raw_value: &str, decimals: u32) -> Result<Decimal, TypeError> {
    let digits = raw_value.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TypeError::InvalidAmount(raw_value.to_string()));
    }

    let digits = digits.trim_start_matches('0');
    let scale = decimals as usize;
    let (whole, fraction) = if digits.len() > scale {
        let (whole, fraction) = digits.split_at(digits.len() - scale);
        (whole.to_string(), fraction.to_string())
    } else {
        (String::new(), format!("{:0>width$}", digits, width = scale))
    };

    if whole.len() > MAX_DIGITS {
        return Err(TypeError::InvalidAmount(format!(
            "{} exceeds {} whole-token digits",
            raw_value, MAX_DIGITS
        )));
    }

    let kept = fraction.len().min(MAX_DIGITS - whole.len());
    let mantissa = format!("{}{}", whole, &fraction[..kept]);
    if mantissa.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let mantissa: i128 = mantissa
        .parse()
        .map_err(|_| TypeError::InvalidAmount(raw_value.to_string()))?;
    let value = Decimal::try_from_i128_with_scale(mantissa, kept as u32)?;
    Ok(value.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ADDR: &str = "0xAbCdEf0123456789abcdef0123456789ABCDEF01";

    #[test]
    fn test_normalize_address_lowercases() {
        assert_eq!(
            normalize_address(ADDR).unwrap(),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
    }

    #[test]
    fn test_normalize_address_adds_prefix() {
        let bare = "abcdef0123456789abcdef0123456789abcdef01";
        assert_eq!(normalize_address(bare).unwrap(), format!("0x{}", bare));
    }

    #[test]
    fn test_normalize_address_rejects_bad_input() {
        assert!(normalize_address("0x1234").is_err());
        assert!(normalize_address("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(normalize_address("").is_err());
    }

    #[test]
    fn test_from_raw_scales_balance() {
        let record = HolderRecord::from_raw(ADDR, false, "123450000", 6).unwrap();
        assert_eq!(record.balance, dec!(123.45));
        assert!(!record.is_contract);
    }

    #[test]
    fn test_from_raw_large_wei_amount() {
        // 5 billion tokens at 18 decimals
        let record =
            HolderRecord::from_raw(ADDR, false, "5000000000000000000000000000", 18).unwrap();
        assert_eq!(record.balance, dec!(5000000000));
    }

    #[test]
    fn test_from_raw_zero_decimals() {
        let record = HolderRecord::from_raw(ADDR, false, "42", 0).unwrap();
        assert_eq!(record.balance, dec!(42));
    }

    #[test]
    fn test_from_raw_rejects_fractional_and_negative() {
        assert!(HolderRecord::from_raw(ADDR, false, "1.5", 18).is_err());
        assert!(HolderRecord::from_raw(ADDR, false, "-1", 18).is_err());
        assert!(HolderRecord::from_raw(ADDR, false, "abc", 18).is_err());
    }

    #[test]
    fn test_from_raw_beyond_96_bits() {
        // 2e29 raw at 18 decimals: 200 billion tokens
        let raw = format!("2{}", "0".repeat(29));
        let record = HolderRecord::from_raw(ADDR, false, &raw, 18).unwrap();
        assert_eq!(record.balance, dec!(200000000000));

        let supply = format!("1{}", "0".repeat(30));
        assert_eq!(scale_raw_amount(&supply, 18).unwrap(), dec!(1000000000000));
    }

    #[test]
    fn test_scale_truncates_excess_fraction() {
        // 35 significant digits; only 28 survive
        let raw = "12345678901234567890123456789012345";
        assert_eq!(
            scale_raw_amount(raw, 18).unwrap(),
            dec!(12345678901234567.89012345678)
        );
    }

    #[test]
    fn test_scale_tiny_amount_with_wide_scale() {
        assert_eq!(scale_raw_amount("5", 30).unwrap(), Decimal::ZERO);
        assert_eq!(scale_raw_amount("000", 18).unwrap(), Decimal::ZERO);
        assert_eq!(scale_raw_amount("1", 28).unwrap(), dec!(0.0000000000000000000000000001));
    }

    #[test]
    fn test_scale_rejects_whole_part_overflow() {
        let huge = "9".repeat(40);
        assert!(scale_raw_amount(&huge, 0).is_err());
        assert!(scale_raw_amount("", 18).is_err());
        assert!(scale_raw_amount("1e30", 18).is_err());
    }
}
