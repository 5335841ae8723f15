//! Consensus constants shared by the asset codec and ledger.

pub mod constants;
pub mod money;

pub use money::{money_range, Amount, COIN, MAX_MONEY};

pub type Hash256 = [u8; 32];
