use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::account::Account;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub sex: Sex,
    pub permits: BTreeSet<Permit>,
    pub accounts: Vec<Account>,
}

impl User {
    #[inline]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    #[inline]
    pub fn is_woman(&self) -> bool {
        self.sex == Sex::Woman
    }

    #[inline]
    pub fn is_man(&self) -> bool {
        self.sex == Sex::Man
    }

    /// Sum of every account converted to PLN, each rounded before summing.
    pub fn total_in_reference(&self) -> Decimal {
        total_in_reference(&self.accounts)
    }
}

pub fn total_in_reference(accounts: &[Account]) -> Decimal {
    accounts
        .iter()
        .map(Account::in_reference)
        .fold(Decimal::ZERO, |total, amount| total + amount)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Man,
    Woman,
    Other,
}

/// Opaque authorization token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permit(pub String);

impl Permit {
    pub fn new(name: impl Into<String>) -> Self {
        Permit(name.into())
    }
}

impl fmt::Display for Permit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;
    use crate::currency::Currency;
    use rust_decimal::dec;

    fn account(number: &str, amount: Decimal, currency: Currency) -> Account {
        Account {
            number: number.to_string(),
            amount,
            currency,
            account_type: AccountType::Current,
        }
    }

    #[test]
    fn test_total_in_reference_empty() {
        assert_eq!(total_in_reference(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_total_in_reference_rounds_per_account() {
        let accounts = vec![
            account("1", dec!(0.0004), Currency::Pln),
            account("2", dec!(0.0004), Currency::Pln),
        ];

        // rounding once at the end would give 0.001
        assert_eq!(total_in_reference(&accounts), dec!(0.000));

        let accounts = vec![
            account("1", dec!(100), Currency::Pln),
            account("2", dec!(10), Currency::Usd),
        ];
        assert_eq!(total_in_reference(&accounts), dec!(137.200));
    }

    #[test]
    fn test_user_helpers() {
        let user = User {
            first_name: "Zosia".to_string(),
            last_name: "Psikuta".to_string(),
            age: 31,
            sex: Sex::Woman,
            permits: BTreeSet::from([Permit::new("LOAN")]),
            accounts: vec![account("1", dec!(5), Currency::Chf)],
        };

        assert_eq!(user.full_name(), "Zosia Psikuta");
        assert!(user.is_woman());
        assert!(!user.is_man());
        assert_eq!(user.total_in_reference(), dec!(17.900));
    }
}
