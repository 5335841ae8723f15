use evrd_consensus::constants::{ASSET_REISSUE_TYPE, MAX_UNIT, UNITS_UNCHANGED};
use evrd_consensus::{money_range, Amount};
use evrd_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};

use crate::error::AssetError;
use crate::hash_field::{read_hash_field, write_hash_field, ContentHash};
use crate::name::{is_name_length_valid, is_unique_name};
use crate::script::append_asset_payload;
use crate::version::ProtocolVersion;

/// Toll-upgrade fields of a reissue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReissueTollTerms {
    pub permanent_ipfs_hash: Option<ContentHash>,
    /// `None` leaves the issued toll amount untouched.
    pub toll_amount: Option<Amount>,
    /// Empty leaves the issued toll address untouched.
    pub toll_address: String,
    pub reminting: bool,
    pub toll_amount_mutable: bool,
    pub toll_address_mutable: bool,
    pub remintable: bool,
}

impl Default for ReissueTollTerms {
    fn default() -> Self {
        Self {
            permanent_ipfs_hash: None,
            toll_amount: None,
            toll_address: String::new(),
            reminting: false,
            toll_amount_mutable: true,
            toll_address_mutable: true,
            remintable: true,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReissueAsset {
    pub name: String,
    /// Supply added, or units re-minted when `reminting` is set.
    pub amount: Amount,
    /// `-1` keeps the current units.
    pub units: i8,
    pub reissuable: bool,
    pub ipfs_hash: Option<ContentHash>,
    pub permanent_ipfs_hash: Option<ContentHash>,
    /// On the wire this is the "toll amount changed" flag plus the value.
    pub toll_amount: Option<Amount>,
    pub toll_address: String,
    pub reminting: bool,
    pub toll_amount_mutable: bool,
    pub toll_address_mutable: bool,
    pub remintable: bool,
    pub version: ProtocolVersion,
}

impl Default for ReissueAsset {
    fn default() -> Self {
        Self::null()
    }
}

impl ReissueAsset {
    pub fn null() -> Self {
        let terms = ReissueTollTerms::default();
        Self {
            name: String::new(),
            amount: 0,
            units: 0,
            reissuable: true,
            ipfs_hash: None,
            permanent_ipfs_hash: terms.permanent_ipfs_hash,
            toll_amount: terms.toll_amount,
            toll_address: terms.toll_address,
            reminting: terms.reminting,
            toll_amount_mutable: terms.toll_amount_mutable,
            toll_address_mutable: terms.toll_address_mutable,
            remintable: terms.remintable,
            version: ProtocolVersion::Standard,
        }
    }

    pub fn new(
        name: impl Into<String>,
        amount: Amount,
        units: i8,
        reissuable: bool,
        ipfs_hash: Option<ContentHash>,
    ) -> Result<Self, AssetError> {
        let reissue = Self {
            name: name.into(),
            amount,
            units,
            reissuable,
            ipfs_hash,
            ..Self::null()
        };
        reissue.validate()?;
        Ok(reissue)
    }

    pub fn new_with_toll(
        name: impl Into<String>,
        amount: Amount,
        units: i8,
        reissuable: bool,
        ipfs_hash: Option<ContentHash>,
        terms: ReissueTollTerms,
    ) -> Result<Self, AssetError> {
        let reissue = Self {
            name: name.into(),
            amount,
            units,
            reissuable,
            ipfs_hash,
            permanent_ipfs_hash: terms.permanent_ipfs_hash,
            toll_amount: terms.toll_amount,
            toll_address: terms.toll_address,
            reminting: terms.reminting,
            toll_amount_mutable: terms.toll_amount_mutable,
            toll_address_mutable: terms.toll_address_mutable,
            remintable: terms.remintable,
            version: ProtocolVersion::TollUpgrade,
        };
        reissue.validate()?;
        Ok(reissue)
    }

    /// Re-mints `amount` previously burned units without touching anything
    /// else.
    pub fn remint(name: impl Into<String>, amount: Amount, remintable: bool) -> Result<Self, AssetError> {
        Self::new_with_toll(
            name,
            amount,
            UNITS_UNCHANGED,
            true,
            None,
            ReissueTollTerms {
                reminting: true,
                remintable,
                ..ReissueTollTerms::default()
            },
        )
    }

    pub fn validate(&self) -> Result<(), AssetError> {
        if !is_name_length_valid(&self.name) {
            return Err(AssetError::InvalidName(self.name.clone()));
        }
        if !(UNITS_UNCHANGED..=MAX_UNIT).contains(&self.units) {
            return Err(AssetError::InvalidUnits(self.units));
        }
        if !money_range(self.amount) {
            return Err(AssetError::InvalidAmount(self.amount));
        }
        if let Some(toll_amount) = self.toll_amount {
            if !money_range(toll_amount) {
                return Err(AssetError::InvalidAmount(toll_amount));
            }
        }
        Ok(())
    }

    pub fn is_null(&self) -> bool {
        self.name.is_empty()
    }

    pub fn toll_amount_changed(&self) -> bool {
        self.toll_amount.is_some()
    }

    /// Changes only hashes or flags: no supply, units, toll or remint.
    pub fn is_metadata_only(&self) -> bool {
        self.amount == 0
            && self.units == UNITS_UNCHANGED
            && !self.toll_amount_changed()
            && !self.reminting
    }

    pub fn is_remint_only(&self) -> bool {
        self.reminting && self.amount == 0 && self.units == UNITS_UNCHANGED
    }

    pub fn is_toll_version(&self) -> bool {
        self.version.is_toll()
    }

    pub fn is_unique(&self) -> bool {
        is_unique_name(&self.name)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        self.consensus_encode(&mut encoder);
        encoder.into_inner()
    }

    pub fn construct_script(&self, script_pubkey: &[u8]) -> Vec<u8> {
        append_asset_payload(script_pubkey, ASSET_REISSUE_TYPE, &self.to_bytes())
    }
}

impl Encodable for ReissueAsset {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        self.version.write_tag(encoder);
        encoder.write_var_str(&self.name);
        encoder.write_i64_le(self.amount);
        encoder.write_i8(self.units);
        encoder.write_bool(self.reissuable);
        write_hash_field(encoder, self.ipfs_hash.as_ref(), self.version);

        if !self.version.is_toll() {
            return;
        }
        write_hash_field(encoder, self.permanent_ipfs_hash.as_ref(), self.version);
        encoder.write_bool(self.toll_amount_changed());
        if let Some(toll_amount) = self.toll_amount {
            encoder.write_i64_le(toll_amount);
        }
        encoder.write_var_str(&self.toll_address);
        encoder.write_bool(self.reminting);
        encoder.write_bool(self.toll_amount_mutable);
        encoder.write_bool(self.toll_address_mutable);
        encoder.write_bool(self.remintable);
    }
}

impl Decodable for ReissueAsset {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let version = ProtocolVersion::sniff(decoder);
        let name = decoder.read_var_str()?;
        let amount = decoder.read_i64_le()?;
        let units = decoder.read_i8()?;
        let reissuable = decoder.read_bool()?;
        let ipfs_hash = read_hash_field(decoder, version)?.into_hash();

        let mut reissue = Self {
            name,
            amount,
            units,
            reissuable,
            ipfs_hash,
            version,
            ..Self::null()
        };
        if !version.is_toll() {
            return Ok(reissue);
        }

        reissue.permanent_ipfs_hash = read_hash_field(decoder, version)?.into_hash();
        if decoder.read_bool()? {
            reissue.toll_amount = Some(decoder.read_i64_le()?);
        }
        reissue.toll_address = decoder.read_var_str()?;
        reissue.reminting = decoder.read_bool()?;
        reissue.toll_amount_mutable = decoder.read_bool()?;
        reissue.toll_address_mutable = decoder.read_bool()?;
        reissue.remintable = decoder.read_bool()?;
        Ok(reissue)
    }
}
