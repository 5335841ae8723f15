use evrd_consensus::constants::{ASSET_TRANSFER_TYPE, QUALIFIER_MAX_AMOUNT, QUALIFIER_MIN_AMOUNT};
use evrd_consensus::{money_range, Amount};
use evrd_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};

use crate::error::AssetError;
use crate::hash_field::{read_legacy, write_legacy, ContentHash};
use crate::name::{classify, is_qualifier_name, is_restricted_name, AssetType};
use crate::script::append_asset_payload;
use crate::verifier::address_satisfies_verifier;
use crate::view::AssetStateView;

const EXPIRE_TIME_LEN: usize = 8;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AssetTransfer {
    pub name: String,
    pub amount: Amount,
    /// Attached message, carried in the legacy hash-field layout.
    pub message: Option<ContentHash>,
    /// Only serialized alongside a message; zero means no expiry.
    pub expire_time: i64,
}

impl AssetTransfer {
    pub fn new(name: impl Into<String>, amount: Amount) -> Self {
        Self {
            name: name.into(),
            amount,
            message: None,
            expire_time: 0,
        }
    }

    pub fn with_message(mut self, message: ContentHash, expire_time: i64) -> Self {
        self.message = Some(message);
        self.expire_time = expire_time;
        self
    }

    pub fn is_null(&self) -> bool {
        self.name.is_empty()
    }

    /// Context-free checks on a transfer about to be relayed.
    pub fn is_valid(&self) -> Result<(), AssetError> {
        if classify(&self.name) == AssetType::Invalid {
            return Err(AssetError::InvalidName(self.name.clone()));
        }
        if is_qualifier_name(&self.name)
            && !(QUALIFIER_MIN_AMOUNT..=QUALIFIER_MAX_AMOUNT).contains(&self.amount)
        {
            return Err(AssetError::Rejected(format!(
                "qualifier transfers must move between {QUALIFIER_MIN_AMOUNT} and {QUALIFIER_MAX_AMOUNT}"
            )));
        }
        if self.amount <= 0 || !money_range(self.amount) {
            return Err(AssetError::InvalidAmount(self.amount));
        }
        if self.expire_time < 0 {
            return Err(AssetError::Rejected(
                "transfer expiration time must be positive".to_string(),
            ));
        }
        if self.message.is_none() && self.expire_time > 0 {
            return Err(AssetError::Rejected(
                "transfer expiration time requires a message".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks a transfer of a restricted asset to `address` against the
    /// asset's freeze flags and verifier string. Other assets always pass.
    pub fn contextual_check_against_verifier<V>(
        &self,
        view: &V,
        address: &str,
    ) -> Result<(), AssetError>
    where
        V: AssetStateView + ?Sized,
    {
        if !is_restricted_name(&self.name) {
            return Ok(());
        }
        if view.is_globally_frozen(&self.name)? {
            return Err(AssetError::Rejected(format!(
                "{} is globally frozen",
                self.name
            )));
        }
        if view.is_address_frozen(&self.name, address)? {
            return Err(AssetError::Rejected(format!(
                "{address} is frozen for {}",
                self.name
            )));
        }
        let verifier = view.verifier_string(&self.name)?.ok_or_else(|| {
            AssetError::Rejected(format!("no verifier string for {}", self.name))
        })?;
        if !address_satisfies_verifier(view, &verifier, address)? {
            return Err(AssetError::Rejected(format!(
                "{address} does not satisfy verifier '{verifier}' of {}",
                self.name
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        self.consensus_encode(&mut encoder);
        encoder.into_inner()
    }

    pub fn construct_script(&self, script_pubkey: &[u8]) -> Vec<u8> {
        append_asset_payload(script_pubkey, ASSET_TRANSFER_TYPE, &self.to_bytes())
    }
}

impl Encodable for AssetTransfer {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_var_str(&self.name);
        encoder.write_i64_le(self.amount);
        if write_legacy(encoder, self.message.as_ref()) && self.expire_time != 0 {
            encoder.write_i64_le(self.expire_time);
        }
    }
}

impl Decodable for AssetTransfer {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let name = decoder.read_var_str()?;
        let amount = decoder.read_i64_le()?;
        let message = read_legacy(decoder)?;
        let expire_time = if message.is_interpreted() && decoder.remaining() >= EXPIRE_TIME_LEN {
            decoder.read_i64_le()?
        } else {
            0
        };
        Ok(Self {
            name,
            amount,
            message: message.into_hash(),
            expire_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::testing::FixedView;
    use evrd_consensus::COIN;
    use evrd_primitives::encoding::decode;

    #[test]
    fn short_legacy_message_keeps_expiry() {
        let mut encoder = Encoder::new();
        encoder.write_var_str("GOLD");
        encoder.write_i64_le(COIN);
        encoder.write_u8(evrd_consensus::constants::TXID_NOTIFIER);
        encoder.write_var_bytes(&[3u8; 23]);
        encoder.write_i64_le(1_700_000_000);

        let transfer = decode::<AssetTransfer>(&encoder.into_inner()).expect("decode");
        assert_eq!(transfer.amount, COIN);
        assert_eq!(transfer.message, None);
        assert_eq!(transfer.expire_time, 1_700_000_000);
    }

    #[test]
    fn expiry_needs_message() {
        let plain = AssetTransfer {
            expire_time: 99,
            ..AssetTransfer::new("GOLD", 5)
        };
        // Without a message the expiry never reaches the wire.
        assert_eq!(plain.to_bytes().len(), 5 + 8);
        assert!(plain.is_valid().is_err());

        let with_message = AssetTransfer::new("GOLD", 5).with_message(ContentHash::Ipfs([1; 32]), 99);
        let bytes = with_message.to_bytes();
        assert_eq!(bytes.len(), 5 + 8 + 34 + 8);
        assert_eq!(decode::<AssetTransfer>(&bytes).expect("decode"), with_message);
    }

    #[test]
    fn zero_expiry_is_omitted() {
        let transfer = AssetTransfer::new("GOLD", 5).with_message(ContentHash::Txid([2; 32]), 0);
        assert_eq!(transfer.to_bytes().len(), 5 + 8 + 34);
        assert_eq!(decode::<AssetTransfer>(&transfer.to_bytes()).expect("decode"), transfer);
    }

    #[test]
    fn validity() {
        assert!(AssetTransfer::new("GOLD", 1).is_valid().is_ok());
        assert_eq!(
            AssetTransfer::new("GOLD", 0).is_valid(),
            Err(AssetError::InvalidAmount(0))
        );
        assert!(AssetTransfer::new("#KYC", COIN / 2).is_valid().is_err());
        assert!(AssetTransfer::new("#KYC", COIN).is_valid().is_ok());
        assert!(AssetTransfer::new("", COIN).is_valid().is_err());
    }

    #[test]
    fn restricted_transfer_checks() {
        let mut view = FixedView::default();
        view.verifiers.insert("$GOLD".into(), "KYC".into());
        view.qualifiers.insert(("good".into(), "#KYC".into()));
        let transfer = AssetTransfer::new("$GOLD", COIN);

        assert!(transfer.contextual_check_against_verifier(&view, "good").is_ok());
        assert!(transfer.contextual_check_against_verifier(&view, "bad").is_err());

        view.frozen.insert(("$GOLD".into(), "good".into()));
        assert!(transfer.contextual_check_against_verifier(&view, "good").is_err());
        view.frozen.clear();

        view.global_frozen.insert("$GOLD".into());
        assert!(transfer.contextual_check_against_verifier(&view, "good").is_err());

        let plain = AssetTransfer::new("GOLD", COIN);
        assert!(plain.contextual_check_against_verifier(&view, "bad").is_ok());
    }
}
