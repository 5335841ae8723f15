use std::fmt;

use crate::verifier::VerifierError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssetError {
    InvalidName(String),
    InvalidUnits(i8),
    InvalidAmount(i64),
    InvalidHash(usize),
    Verifier(VerifierError),
    /// The ledger view could not answer a query.
    Lookup(String),
    Rejected(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::InvalidName(name) => write!(f, "invalid asset name '{name}'"),
            AssetError::InvalidUnits(units) => write!(f, "units {units} out of range 0..=8"),
            AssetError::InvalidAmount(amount) => write!(f, "invalid asset amount {amount}"),
            AssetError::InvalidHash(len) => {
                write!(f, "asset hash must be 32 or 34 bytes, got {len}")
            }
            AssetError::Verifier(err) => write!(f, "verifier string: {err}"),
            AssetError::Lookup(reason) => write!(f, "asset lookup failed: {reason}"),
            AssetError::Rejected(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for AssetError {}

impl From<VerifierError> for AssetError {
    fn from(err: VerifierError) -> Self {
        AssetError::Verifier(err)
    }
}
