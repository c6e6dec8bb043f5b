use std::collections::HashSet;
use std::io::Read;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, warn};

use crate::account::Account;
use crate::entry::{ConversionError, DatasetEntry};
use crate::error::LoadError;
use crate::holding::{Company, Holding};
use crate::user::User;

/// Accumulates rows into the holding tree, merging rows that name an
/// already-seen holding, company or user in first-seen order.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    holdings: Vec<Holding>,
    account_numbers: HashSet<String>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: &DatasetEntry) -> Result<(), LoadError> {
        if entry.has_user() && entry.company.is_none() {
            return Err(ConversionError::UserWithoutCompany.into());
        }
        if entry.has_account() && !entry.has_user() {
            return Err(ConversionError::AccountWithoutUser.into());
        }

        let user = if entry.has_user() {
            Some(User::try_from(entry)?)
        } else {
            None
        };
        let account = if entry.has_account() {
            Some(Account::try_from(entry)?)
        } else {
            None
        };

        if let Some(account) = &account {
            if self.account_numbers.contains(&account.number) {
                return Err(LoadError::AccountAlreadyExists(account.number.clone()));
            }
        }

        let holding = get_or_create_holding(&mut self.holdings, &entry.holding);
        let Some(company_name) = &entry.company else {
            return Ok(());
        };
        let company = get_or_create_company(holding, company_name);
        let Some(user) = user else {
            return Ok(());
        };
        let user = get_or_create_user(company, user);

        if let Some(account) = account {
            self.account_numbers.insert(account.number.clone());
            user.accounts.push(account);
        }
        Ok(())
    }

    pub fn build(self) -> Vec<Holding> {
        self.holdings
    }
}

#[inline]
fn get_or_create_holding<'a>(holdings: &'a mut Vec<Holding>, name: &str) -> &'a mut Holding {
    let index = match holdings.iter().position(|h| h.name == name) {
        Some(index) => index,
        None => {
            holdings.push(Holding::new(name, Vec::new()));
            holdings.len() - 1
        }
    };
    &mut holdings[index]
}

#[inline]
fn get_or_create_company<'a>(holding: &'a mut Holding, name: &str) -> &'a mut Company {
    let index = match holding.companies.iter().position(|c| c.name == name) {
        Some(index) => index,
        None => {
            holding.companies.push(Company::new(name, Vec::new()));
            holding.companies.len() - 1
        }
    };
    &mut holding.companies[index]
}

#[inline]
fn get_or_create_user(company: &mut Company, user: User) -> &mut User {
    let existing = company
        .users
        .iter()
        .position(|u| u.first_name == user.first_name && u.last_name == user.last_name);
    let index = match existing {
        Some(index) => {
            company.users[index].permits.extend(user.permits);
            index
        }
        None => {
            company.users.push(user);
            company.users.len() - 1
        }
    };
    &mut company.users[index]
}

#[inline]
pub fn load_csv_stream(reader: impl Read) -> Vec<Holding> {
    let mut binding = ReaderBuilder::new()
        .has_headers(true)
        .quoting(false)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let stream = binding
        .deserialize()
        .inspect(|result: &Result<DatasetEntry, csv::Error>| {
            if let Err(e) = result {
                warn!("Error parsing dataset row: {}", e);
            }
        })
        .filter_map(Result::ok);

    load_stream(stream)
}

#[inline]
pub fn load_stream(stream: impl Iterator<Item = DatasetEntry>) -> Vec<Holding> {
    let mut builder = DatasetBuilder::new();
    for entry in stream {
        builder.add_entry(&entry).unwrap_or_else(|e| {
            warn!("Skipping dataset row for holding {}: {}", entry.holding, e);
        });
    }

    let holdings = builder.build();
    debug!(holdings = holdings.len(), "dataset loaded");
    holdings
}
