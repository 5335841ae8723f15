use std::fmt;

use evrd_assets::AssetError;
use evrd_consensus::Amount;
use evrd_primitives::DecodeError;
use evrd_storage::StoreError;

#[derive(Debug)]
pub enum LedgerError {
    Store(StoreError),
    Decode(DecodeError),
    Asset(AssetError),
    MissingAsset(String),
    DuplicateAsset(String),
    InsufficientBalance {
        asset: String,
        address: String,
        balance: Amount,
        amount: Amount,
    },
    InvalidAmount(Amount),
    MissingUndo(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Store(err) => write!(f, "{err}"),
            LedgerError::Decode(err) => write!(f, "{err}"),
            LedgerError::Asset(err) => write!(f, "{err}"),
            LedgerError::MissingAsset(name) => write!(f, "asset '{name}' not found"),
            LedgerError::DuplicateAsset(name) => write!(f, "asset '{name}' already exists"),
            LedgerError::InsufficientBalance {
                asset,
                address,
                balance,
                amount,
            } => write!(
                f,
                "address {address} holds {balance} of '{asset}', cannot debit {amount}"
            ),
            LedgerError::InvalidAmount(amount) => write!(f, "invalid ledger amount {amount}"),
            LedgerError::MissingUndo(hash) => write!(f, "missing asset undo for block {hash}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::Store(err)
    }
}

impl From<DecodeError> for LedgerError {
    fn from(err: DecodeError) -> Self {
        LedgerError::Decode(err)
    }
}

impl From<AssetError> for LedgerError {
    fn from(err: AssetError) -> Self {
        LedgerError::Asset(err)
    }
}
