use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::account::{Account, AccountType};
use crate::currency::Currency;
use crate::user::{Permit, Sex, User};

/// One CSV row. A row carries a holding and optionally descends to a company,
/// a user and one of the user's accounts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetEntry {
    pub holding: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub permits: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub amount: Option<Decimal>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub currency: Option<Currency>,
    #[serde(rename = "type", default, deserialize_with = "csv::invalid_option")]
    pub account_type: Option<AccountType>,
}

impl DatasetEntry {
    pub fn has_user(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }

    pub fn has_account(&self) -> bool {
        self.number.is_some()
    }

    fn permits(&self) -> BTreeSet<Permit> {
        self.permits
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|permit| !permit.is_empty())
            .map(Permit::new)
            .collect()
    }
}

/// Builds the user described by the row, without accounts.
impl TryFrom<&DatasetEntry> for User {
    type Error = ConversionError;

    fn try_from(value: &DatasetEntry) -> Result<Self, Self::Error> {
        Ok(User {
            first_name: value
                .first_name
                .clone()
                .ok_or(ConversionError::MissingField("first_name"))?,
            last_name: value
                .last_name
                .clone()
                .ok_or(ConversionError::MissingField("last_name"))?,
            age: value.age.ok_or(ConversionError::MissingField("age"))?,
            sex: value.sex.ok_or(ConversionError::MissingField("sex"))?,
            permits: value.permits(),
            accounts: Vec::new(),
        })
    }
}

impl TryFrom<&DatasetEntry> for Account {
    type Error = ConversionError;

    fn try_from(value: &DatasetEntry) -> Result<Self, Self::Error> {
        let amount = value.amount.ok_or(ConversionError::MissingField("amount"))?;
        let currency = value
            .currency
            .ok_or(ConversionError::MissingField("currency"))?;
        amount
            .checked_mul(currency.rate())
            .ok_or(ConversionError::AmountOutOfRange(amount))?;

        Ok(Account {
            number: value
                .number
                .clone()
                .ok_or(ConversionError::MissingField("number"))?,
            amount,
            currency,
            account_type: value
                .account_type
                .ok_or(ConversionError::MissingField("type"))?,
        })
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConversionError {
    #[error("Missing field for conversion: {0}")]
    MissingField(&'static str),
    #[error("User declared outside of a company")]
    UserWithoutCompany,
    #[error("Account declared outside of a user")]
    AccountWithoutUser,
    #[error("Amount cannot be converted to the reference currency: {0}")]
    AmountOutOfRange(Decimal),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn entry() -> DatasetEntry {
        DatasetEntry {
            holding: "Nestle".to_string(),
            company: Some("Nestle Polska".to_string()),
            first_name: Some("Adam".to_string()),
            last_name: Some("Wojcik".to_string()),
            age: Some(42),
            sex: Some(Sex::Man),
            permits: Some("LOAN; DEPOSIT;".to_string()),
            number: Some("PL-1".to_string()),
            amount: Some(dec!(12.50)),
            currency: Some(Currency::Usd),
            account_type: Some(AccountType::Savings),
        }
    }

    #[test]
    fn test_user_from_entry() {
        let user = User::try_from(&entry()).unwrap();

        assert_eq!(user.full_name(), "Adam Wojcik");
        assert_eq!(user.age, 42);
        assert_eq!(
            user.permits,
            BTreeSet::from([Permit::new("LOAN"), Permit::new("DEPOSIT")])
        );
        assert!(user.accounts.is_empty());
    }

    #[test]
    fn test_account_from_entry() {
        let account = Account::try_from(&entry()).unwrap();

        assert_eq!(account.number, "PL-1");
        assert_eq!(account.amount, dec!(12.50));
        assert_eq!(account.currency, Currency::Usd);
        assert_eq!(account.account_type, AccountType::Savings);
    }

    #[test]
    fn test_missing_fields() {
        let mut row = entry();
        row.age = None;
        row.amount = None;

        assert_eq!(
            User::try_from(&row).unwrap_err(),
            ConversionError::MissingField("age")
        );
        assert_eq!(
            Account::try_from(&row).unwrap_err(),
            ConversionError::MissingField("amount")
        );
    }

    #[test]
    fn test_amount_out_of_range() {
        let mut row = entry();
        row.amount = Some(Decimal::MAX / dec!(2));

        assert_eq!(
            Account::try_from(&row).unwrap_err(),
            ConversionError::AmountOutOfRange(Decimal::MAX / dec!(2))
        );

        row.currency = Some(Currency::Pln);
        assert!(Account::try_from(&row).is_ok());
    }
}
