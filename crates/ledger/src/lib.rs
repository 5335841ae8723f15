//! Reference asset ledger: applies block journals to a key-value store and
//! rolls them back on disconnect.

pub mod config;
pub mod error;
pub mod ledger;
pub mod undo;

pub use config::{load_ledger_config, ConfigError, LedgerConfig};
pub use error::LedgerError;
pub use ledger::AssetLedger;
pub use undo::{AssetBlockUndo, FlagUndo};
