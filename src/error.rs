use thiserror::Error;

use crate::entry::ConversionError;

#[derive(Error, Debug, PartialEq)]
pub enum QueryError {
    #[error("No user matches the given predicate")]
    InvalidArgument,
    #[error("Cannot determine the most popular account type without accounts")]
    InvalidState,
    #[error("Requested {requested} users but only {available} exist")]
    OutOfRange { requested: usize, available: usize },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid entry for dataset conversion: {0}")]
    InvalidEntryForConversion(ConversionError),
    #[error("Account number already exists: {0}")]
    AccountAlreadyExists(String),
}

impl From<ConversionError> for LoadError {
    fn from(error: ConversionError) -> Self {
        LoadError::InvalidEntryForConversion(error)
    }
}
