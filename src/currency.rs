use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy, dec};
use serde::Deserialize;

/// Fractional digits kept when a single account is converted to PLN.
pub const ACCOUNT_SCALE: u32 = 3;

/// Fractional digits kept by per-type money aggregates.
pub const AGGREGATE_SCALE: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Pln,
    Usd,
    Eur,
    Chf,
}

impl Currency {
    /// Static exchange rate to PLN, the reference currency.
    pub fn rate(self) -> Decimal {
        match self {
            Currency::Pln => dec!(1.0),
            Currency::Usd => dec!(3.72),
            Currency::Eur => dec!(4.04),
            Currency::Chf => dec!(3.58),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let code = match self {
            Currency::Pln => "PLN",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Chf => "CHF",
        };
        f.write_str(code)
    }
}

/// Rounds half-up to `scale` digits and pins the scale, so `1.5` at scale 3 is `1.500`.
#[inline]
pub fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

#[inline]
pub fn convert(amount: Decimal, rate: Decimal) -> Decimal {
    round_half_up(amount * rate, ACCOUNT_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_keeps_three_digits() {
        let converted = convert(dec!(10.1235), dec!(1.00005));
        assert_eq!(converted, dec!(10.124));
        assert_eq!(converted.scale(), 3);

        let converted = convert(dec!(100), Currency::Usd.rate());
        assert_eq!(converted.to_string(), "372.000");
    }

    #[test]
    fn test_convert_rounds_half_up() {
        assert_eq!(convert(dec!(10.1225), dec!(1)).to_string(), "10.123");
        assert_eq!(convert(dec!(0.0005), dec!(1)).to_string(), "0.001");
        assert_eq!(convert(dec!(-0.0005), dec!(1)).to_string(), "-0.001");
        assert_eq!(convert(dec!(0.00049), dec!(1)).to_string(), "0.000");
    }

    #[test]
    fn test_round_half_up_to_whole() {
        assert_eq!(round_half_up(dec!(2.5), AGGREGATE_SCALE).to_string(), "3");
        assert_eq!(round_half_up(dec!(3.5), AGGREGATE_SCALE).to_string(), "4");
        assert_eq!(round_half_up(dec!(7), AGGREGATE_SCALE).scale(), 0);
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Currency::Pln.to_string(), "PLN");
        assert_eq!(Currency::Chf.to_string(), "CHF");
        assert_eq!(Currency::Pln.rate(), Decimal::ONE);
    }
}
