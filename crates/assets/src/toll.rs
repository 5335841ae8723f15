//! Toll fees charged when spending assets that carry toll terms.

use evrd_consensus::constants::{MAX_TOLL_AMOUNT, MIN_TOLL_AMOUNT};
use evrd_consensus::{Amount, COIN};
use evrd_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};

/// Toll owed for moving `amount_sent` units at `toll_fee` per whole unit.
///
/// Any non-zero toll is clamped to `[MIN_TOLL_AMOUNT, MAX_TOLL_AMOUNT]`.
pub fn calculate_toll(amount_sent: Amount, toll_fee: Amount) -> Amount {
    if amount_sent <= 0 || toll_fee <= 0 {
        return 0;
    }
    let toll = i128::from(amount_sent) * i128::from(toll_fee) / i128::from(COIN);
    toll.clamp(i128::from(MIN_TOLL_AMOUNT), i128::from(MAX_TOLL_AMOUNT)) as Amount
}

/// Running toll totals for one asset.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TollTracker {
    pub asset_name: String,
    pub toll_fee: Amount,
    pub toll_address: String,
    pub total_toll_sum: Amount,
    pub total_asset_spent: Amount,
}

impl TollTracker {
    pub fn new(asset_name: impl Into<String>, toll_fee: Amount, toll_address: impl Into<String>) -> Self {
        Self {
            asset_name: asset_name.into(),
            toll_fee,
            toll_address: toll_address.into(),
            total_toll_sum: 0,
            total_asset_spent: 0,
        }
    }

    /// Accounts for a spend and returns the toll it owes.
    pub fn record_spend(&mut self, amount: Amount) -> Amount {
        let toll = calculate_toll(amount, self.toll_fee);
        self.total_asset_spent = self.total_asset_spent.saturating_add(amount.max(0));
        self.total_toll_sum = self.total_toll_sum.saturating_add(toll);
        toll
    }
}

impl Encodable for TollTracker {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_var_str(&self.asset_name);
        encoder.write_i64_le(self.toll_fee);
        encoder.write_var_str(&self.toll_address);
        encoder.write_i64_le(self.total_toll_sum);
        encoder.write_i64_le(self.total_asset_spent);
    }
}

impl Decodable for TollTracker {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            asset_name: decoder.read_var_str()?,
            toll_fee: decoder.read_i64_le()?,
            toll_address: decoder.read_var_str()?,
            total_toll_sum: decoder.read_i64_le()?,
            total_asset_spent: decoder.read_i64_le()?,
        })
    }
}
