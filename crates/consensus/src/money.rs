//! Monetary units and exact decimal conversion.

pub type Amount = i64;

/// Atomic units per major unit (1e8 for every supported currency).
pub const COIN: Amount = 100_000_000;
pub const COIN_DECIMALS: usize = 8;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AmountError {
    Empty,
    InvalidCharacter,
    TooManyDecimals,
    Negative,
    /// Zero where a positive amount is required.
    Zero,
    Overflow,
}

impl std::fmt::Display for AmountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountError::Empty => write!(f, "amount is empty"),
            AmountError::InvalidCharacter => write!(f, "amount contains an invalid character"),
            AmountError::TooManyDecimals => {
                write!(f, "amount has more than {COIN_DECIMALS} decimal places")
            }
            AmountError::Negative => write!(f, "amount must not be negative"),
            AmountError::Zero => write!(f, "amount must be greater than zero"),
            AmountError::Overflow => write!(f, "amount out of range"),
        }
    }
}

impl std::error::Error for AmountError {}

/// Parses a major-unit decimal string ("1.5", "0.00000001", "12") into atomic units.
pub fn parse_amount(input: &str) -> Result<Amount, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }
    if input.starts_with('-') {
        return Err(AmountError::Negative);
    }
    let input = input.strip_prefix('+').unwrap_or(input);

    let (whole, frac) = match input.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (input, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Empty);
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::InvalidCharacter);
    }

    let frac = frac.trim_end_matches('0');
    if frac.len() > COIN_DECIMALS {
        return Err(AmountError::TooManyDecimals);
    }

    let mut units: Amount = 0;
    for digit in whole.bytes() {
        units = units
            .checked_mul(10)
            .and_then(|value| value.checked_add(Amount::from(digit - b'0')))
            .ok_or(AmountError::Overflow)?;
    }
    units = units.checked_mul(COIN).ok_or(AmountError::Overflow)?;

    let mut frac_units: Amount = 0;
    for (position, digit) in frac.bytes().enumerate() {
        let scale = 10_i64.pow((COIN_DECIMALS - 1 - position) as u32);
        frac_units += Amount::from(digit - b'0') * scale;
    }
    units.checked_add(frac_units).ok_or(AmountError::Overflow)
}

/// Formats atomic units as a major-unit decimal string without trailing zeros.
pub fn format_amount(amount: Amount) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let coin = COIN as u64;
    let whole = abs / coin;
    let frac = abs % coin;
    if frac == 0 {
        return format!("{sign}{whole}");
    }
    let frac = format!("{frac:0width$}", width = COIN_DECIMALS);
    format!("{sign}{whole}.{}", frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_whole_and_fractional() {
        assert_eq!(parse_amount("1"), Ok(COIN));
        assert_eq!(parse_amount("1.5"), Ok(150_000_000));
        assert_eq!(parse_amount("0.00000001"), Ok(1));
        assert_eq!(parse_amount(".25"), Ok(25_000_000));
        assert_eq!(parse_amount("10.10000000"), Ok(1_010_000_000));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(parse_amount(""), Err(AmountError::Empty));
        assert_eq!(parse_amount("."), Err(AmountError::Empty));
        assert_eq!(parse_amount("-1"), Err(AmountError::Negative));
        assert_eq!(parse_amount("1e5"), Err(AmountError::InvalidCharacter));
        assert_eq!(parse_amount("0.000000001"), Err(AmountError::TooManyDecimals));
        assert_eq!(parse_amount("99999999999999999999"), Err(AmountError::Overflow));
    }

    #[test]
    fn format_trims_trailing_zeros() {
        assert_eq!(format_amount(COIN), "1");
        assert_eq!(format_amount(150_000_000), "1.5");
        assert_eq!(format_amount(1), "0.00000001");
        assert_eq!(format_amount(-2 * COIN), "-2");
    }
}
