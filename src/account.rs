use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::currency::{self, Currency};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Account {
    pub number: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub account_type: AccountType,
}

impl Account {
    /// Amount in PLN, rounded half-up to three fractional digits.
    #[inline]
    pub fn in_reference(&self) -> Decimal {
        currency::convert(self.amount, self.currency.rate())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Current,
    Savings,
    Deposit,
    Brokerage,
    Foreign,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AccountType::Current => "CURRENT",
            AccountType::Savings => "SAVINGS",
            AccountType::Deposit => "DEPOSIT",
            AccountType::Brokerage => "BROKERAGE",
            AccountType::Foreign => "FOREIGN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_in_reference_uses_currency_rate() {
        let account = Account {
            number: "PL01".to_string(),
            amount: dec!(10.005),
            currency: Currency::Eur,
            account_type: AccountType::Savings,
        };

        assert_eq!(account.in_reference(), dec!(40.420));
        assert_eq!(account.in_reference().scale(), 3);
    }
}
