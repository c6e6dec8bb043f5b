use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fmt::Display;

use rand::Rng;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::account::{Account, AccountType};
use crate::currency::{self, AGGREGATE_SCALE};
use crate::error::QueryError;
use crate::holding::{Company, Holding};
use crate::user::{self, Permit, Sex, User};

/// Scale of the per-user amounts in [`QueryEngine::money_by_account_type_for_men`].
const MEN_MONEY_SCALE: u32 = 2;

pub const MISSING_USER_STATUS: &str = "Brak użytkownika";

/// Read-only queries over a holding tree loaded once at construction.
pub struct QueryEngine {
    holdings: Vec<Holding>,
}

impl QueryEngine {
    pub fn new(holdings: Vec<Holding>) -> Self {
        QueryEngine { holdings }
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    #[inline]
    pub fn companies(&self) -> impl Iterator<Item = &Company> + '_ {
        self.holdings.iter().flat_map(|h| h.companies.iter())
    }

    #[inline]
    pub fn users(&self) -> impl Iterator<Item = &User> + '_ {
        self.companies().flat_map(|c| c.users.iter())
    }

    #[inline]
    pub fn accounts(&self) -> impl Iterator<Item = &Account> + '_ {
        self.users().flat_map(|u| u.accounts.iter())
    }

    pub fn holdings_with_companies(&self) -> usize {
        self.holdings
            .iter()
            .filter(|h| !h.companies.is_empty())
            .count()
    }

    pub fn companies_count(&self) -> usize {
        self.holdings.iter().map(|h| h.companies.len()).sum()
    }

    pub fn users_count(&self) -> usize {
        self.users().count()
    }

    pub fn accounts_count(&self) -> usize {
        self.users().map(|u| u.accounts.len()).sum()
    }

    pub fn woman_count(&self) -> usize {
        self.users().filter(|u| u.is_woman()).count()
    }

    /// Splits users into `(matching, rest)`, each in traversal order.
    pub fn divide_users_by_predicate<P>(&self, predicate: P) -> (Vec<&User>, Vec<&User>)
    where
        P: Fn(&User) -> bool,
    {
        self.users().partition(|u| predicate(u))
    }

    /// Last names of men and of women. Users of other sex are left out of both sets.
    pub fn last_names_by_sex(&self) -> (HashSet<&str>, HashSet<&str>) {
        let mut men = HashSet::new();
        let mut women = HashSet::new();
        for user in self.users() {
            match user.sex {
                Sex::Man => men.insert(user.last_name.as_str()),
                Sex::Woman => women.insert(user.last_name.as_str()),
                Sex::Other => continue,
            };
        }
        (men, women)
    }

    #[inline]
    pub fn to_reference(&self, account: &Account) -> Decimal {
        account.in_reference()
    }

    #[inline]
    pub fn total_in_reference(&self, accounts: &[Account]) -> Decimal {
        user::total_in_reference(accounts)
    }

    /// PLN totals per account type, each rounded half-up to whole units.
    pub fn money_by_account_type(&self) -> HashMap<AccountType, Decimal> {
        let mut totals: HashMap<AccountType, Decimal> = HashMap::new();
        for account in self.accounts() {
            *totals.entry(account.account_type).or_default() += account.in_reference();
        }

        totals
            .into_iter()
            .map(|(account_type, total)| {
                (account_type, currency::round_half_up(total, AGGREGATE_SCALE))
            })
            .collect()
    }

    /// The woman with the largest PLN total. The first one in traversal order wins a tie.
    pub fn richest_woman(&self) -> Option<&User> {
        let mut richest: Option<(&User, Decimal)> = None;
        for user in self.users().filter(|u| u.is_woman()) {
            let total = user.total_in_reference();
            if richest.is_none_or(|(_, best)| total > best) {
                richest = Some((user, total));
            }
        }

        if let Some((user, total)) = richest {
            debug!(user = %user.full_name(), %total, "richest woman");
        }
        richest.map(|(user, _)| user)
    }

    /// Sum of squared ages, accumulated in floating point and truncated.
    pub fn age_squares_sum(&self) -> i64 {
        self.users()
            .map(|u| f64::from(u.age).powi(2))
            .sum::<f64>()
            .trunc() as i64
    }

    pub fn users_per_company(&self) -> HashMap<&str, &[User]> {
        self.users_per_company_with_slice(|users| users)
    }

    /// Company name to "First Last" of every employee.
    pub fn user_names_per_company(&self) -> HashMap<&str, Vec<String>> {
        self.users_per_company_with(User::full_name)
    }

    pub fn users_per_company_with<T, F>(&self, converter: F) -> HashMap<&str, Vec<T>>
    where
        F: Fn(&User) -> T,
    {
        self.users_per_company_with_slice(|users| {
            users.iter().map(&converter).collect::<Vec<T>>()
        })
    }

    fn users_per_company_with_slice<'a, T, F>(&'a self, converter: F) -> HashMap<&'a str, T>
    where
        F: Fn(&'a [User]) -> T,
    {
        let mut map = HashMap::new();
        for company in self.companies() {
            insert_first(&mut map, company.name.as_str(), || {
                converter(company.users.as_slice())
            });
        }
        map
    }

    pub fn accounts_by_number(&self) -> HashMap<&str, &Account> {
        let mut map = HashMap::new();
        for account in self.accounts() {
            insert_first(&mut map, account.number.as_str(), || account);
        }
        map
    }

    /// Every permit held by anyone, mapped to its holders from richest to poorest.
    pub fn users_by_permit_sorted_by_wealth(&self) -> HashMap<&Permit, Vec<&User>> {
        let mut map: HashMap<&Permit, Vec<(&User, Decimal)>> = HashMap::new();
        for user in self.users() {
            let total = user.total_in_reference();
            for permit in &user.permits {
                map.entry(permit).or_default().push((user, total));
            }
        }

        map.into_iter()
            .map(|(permit, mut users)| {
                users.sort_by(|(_, a), (_, b)| b.cmp(a));
                (permit, users.into_iter().map(|(u, _)| u).collect())
            })
            .collect()
    }

    /// Account type to the men holding that type, with each man's PLN total over
    /// accounts of that type.
    pub fn money_by_account_type_for_men(&self) -> HashMap<AccountType, HashMap<&User, Decimal>> {
        let mut map: HashMap<AccountType, HashMap<&User, Decimal>> = HashMap::new();
        for account_type in self.accounts().map(|a| a.account_type) {
            if map.contains_key(&account_type) {
                continue;
            }

            let mut men = HashMap::new();
            for user in self.users().filter(|u| u.is_man()) {
                let mut accounts = user
                    .accounts
                    .iter()
                    .filter(|a| a.account_type == account_type)
                    .peekable();
                if accounts.peek().is_none() {
                    continue;
                }

                // Only this user's own accounts count, even if an equal user
                // appears elsewhere in the tree.
                let total = accounts
                    .map(|a| currency::round_half_up(a.in_reference(), MEN_MONEY_SCALE))
                    .fold(
                        currency::round_half_up(Decimal::ZERO, MEN_MONEY_SCALE),
                        |total, amount| total + amount,
                    );
                insert_first(&mut men, user, || total);
            }
            map.insert(account_type, men);
        }
        map
    }

    /// Names of the first `n` companies, duplicates collapsed.
    pub fn first_n_company_names(&self, n: usize) -> HashSet<&str> {
        self.companies().take(n).map(|c| c.name.as_str()).collect()
    }

    /// The most frequent account type. On a tie the type seen first in traversal order wins.
    pub fn most_popular_account_type(&self) -> Result<AccountType, QueryError> {
        let mut counts: Vec<(AccountType, usize)> = Vec::new();
        for account in self.accounts() {
            match counts.iter_mut().find(|(t, _)| *t == account.account_type) {
                Some((_, count)) => *count += 1,
                None => counts.push((account.account_type, 1)),
            }
        }

        counts
            .into_iter()
            .fold(None, |best: Option<(AccountType, usize)>, current| match best {
                Some(best) if best.1 >= current.1 => Some(best),
                _ => Some(current),
            })
            .map(|(account_type, _)| account_type)
            .ok_or(QueryError::InvalidState)
    }

    pub fn first_matching_user<P>(&self, predicate: P) -> Result<&User, QueryError>
    where
        P: Fn(&User) -> bool,
    {
        self.find_user(predicate).ok_or(QueryError::InvalidArgument)
    }

    pub fn find_user<P>(&self, predicate: P) -> Option<&User>
    where
        P: Fn(&User) -> bool,
    {
        self.users().find(|u| predicate(u))
    }

    pub fn random_distinct_users(&self, n: usize) -> Result<Vec<&User>, QueryError> {
        self.random_distinct_users_with(n, &mut rand::thread_rng())
    }

    /// Shuffles the distinct users once and takes the first `n`.
    pub fn random_distinct_users_with<R>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<&User>, QueryError>
    where
        R: Rng + ?Sized,
    {
        let mut seen = HashSet::new();
        let mut users: Vec<&User> = self.users().filter(|u| seen.insert(*u)).collect();

        if n > users.len() {
            return Err(QueryError::OutOfRange {
                requested: n,
                available: users.len(),
            });
        }

        users.shuffle(rng);
        users.truncate(n);
        Ok(users)
    }

    /// "First Last" of every user, by first name from z to a.
    pub fn sorted_user_names_descending(&self) -> Vec<String> {
        let mut users: Vec<&User> = self.users().collect();
        users.sort_by(|a, b| b.first_name.cmp(&a.first_name));
        users.into_iter().map(User::full_name).collect()
    }

    pub fn holding_names(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.name.to_lowercase()).collect()
    }

    /// Sorted holding names in the form `(Coca-Cola, Nestle, Pepsico)`.
    pub fn holding_names_joined(&self) -> String {
        let mut names: Vec<&str> = self.holdings.iter().map(|h| h.name.as_str()).collect();
        names.sort_unstable();
        format!("({})", names.join(", "))
    }

    pub fn company_names(&self) -> Vec<&str> {
        self.companies().map(|c| c.name.as_str()).collect()
    }

    pub fn company_names_joined(&self) -> String {
        self.company_names().join("+")
    }

    /// Distinct currencies of all accounts, sorted by code.
    pub fn currencies_joined(&self) -> String {
        let codes: BTreeSet<String> = self.accounts().map(|a| a.currency.to_string()).collect();
        codes.into_iter().collect::<Vec<_>>().join(", ")
    }

    pub fn user_first_names_where<P>(&self, predicate: P) -> HashSet<&str>
    where
        P: Fn(&User) -> bool,
    {
        self.users()
            .filter(|u| predicate(u))
            .map(|u| u.first_name.as_str())
            .collect()
    }

    /// First names of users older than `age` who are not men.
    pub fn old_women(&self, age: u32) -> Vec<&str> {
        self.users()
            .filter(|u| u.age > age)
            .inspect(|u| debug!(first_name = %u.first_name, "older than {}", age))
            .filter(|u| !u.is_man())
            .map(|u| u.first_name.as_str())
            .collect()
    }

    pub fn for_each_company<F>(&self, consumer: F)
    where
        F: FnMut(&Company),
    {
        self.companies().for_each(consumer);
    }

    /// Distinct first names, sorted and separated by spaces.
    pub fn user_first_names_joined(&self) -> String {
        let mut names: Vec<&str> = self.users().map(|u| u.first_name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names.join(" ")
    }

    pub fn first_users(&self, limit: usize) -> HashSet<&User> {
        self.users().take(limit).collect()
    }

    /// `"First Last ma lat N"` for a user present in the dataset, otherwise
    /// [`MISSING_USER_STATUS`].
    pub fn age_status(&self, user: Option<&User>) -> String {
        user.and_then(|wanted| self.users().find(|u| *u == wanted))
            .map(|u| format!("{} {} ma lat {}", u.first_name, u.last_name, u.age))
            .unwrap_or_else(|| MISSING_USER_STATUS.to_string())
    }
}

/// Inserts the value for `key` unless the key is already present.
#[inline]
fn insert_first<K, V, F>(map: &mut HashMap<K, V>, key: K, value: F)
where
    K: std::hash::Hash + Eq + fmt::Debug,
    F: FnOnce() -> V,
{
    if map.contains_key(&key) {
        warn!(?key, "duplicate key, keeping the first value");
        return;
    }
    map.insert(key, value());
}

impl Display for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "account_type, total")?;

        let totals: BTreeMap<AccountType, Decimal> =
            self.money_by_account_type().into_iter().collect();
        for (account_type, total) in totals {
            writeln!(f, "{}, {}", account_type, total)?;
        }
        Ok(())
    }
}
