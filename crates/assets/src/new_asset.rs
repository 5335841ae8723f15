//! Asset issuance record.

use evrd_consensus::constants::{ASSET_NEW_TYPE, ASSET_OWNER_TYPE, MAX_UNIT, MIN_UNIT, UNITS_UNCHANGED};
use evrd_consensus::{money_range, Amount, Hash256};
use evrd_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};

use crate::error::AssetError;
use crate::hash_field::{read_hash_field, write_hash_field, ContentHash};
use crate::name::{is_name_length_valid, is_unique_name, owner_name};
use crate::reissue::ReissueAsset;
use crate::script::append_asset_payload;
use crate::version::ProtocolVersion;

/// Where a record is being serialized. Burn totals are node-local state and
/// are only written to disk, never relayed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SerializeTarget {
    #[default]
    Network,
    Disk,
}

/// Toll-upgrade fields supplied when issuing an upgraded asset.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TollTerms {
    pub permanent_ipfs_hash: Option<ContentHash>,
    pub toll_amount: Amount,
    pub toll_address: String,
    pub toll_amount_mutable: bool,
    pub toll_address_mutable: bool,
    pub remintable: bool,
    /// Only serialized for unique names.
    pub expiring_time: u32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewAsset {
    pub name: String,
    pub amount: Amount,
    pub units: i8,
    pub reissuable: bool,
    pub has_ipfs: bool,
    pub ipfs_hash: Option<ContentHash>,
    pub permanent_ipfs_hash: Option<ContentHash>,
    pub toll_amount: Amount,
    pub toll_address: String,
    pub toll_amount_mutable: bool,
    pub toll_address_mutable: bool,
    pub remintable: bool,
    pub expiring_time: u32,
    pub version: ProtocolVersion,
    pub total_burned: Amount,
    pub currently_burned: Amount,
}

impl Default for NewAsset {
    fn default() -> Self {
        Self::null()
    }
}

impl NewAsset {
    pub fn null() -> Self {
        Self {
            name: String::new(),
            amount: 0,
            units: MAX_UNIT,
            reissuable: false,
            has_ipfs: false,
            ipfs_hash: None,
            permanent_ipfs_hash: None,
            toll_amount: 0,
            toll_address: String::new(),
            toll_amount_mutable: false,
            toll_address_mutable: false,
            remintable: false,
            expiring_time: 0,
            version: ProtocolVersion::Standard,
            total_burned: 0,
            currently_burned: 0,
        }
    }

    /// Legacy issuance.
    pub fn new(
        name: impl Into<String>,
        amount: Amount,
        units: i8,
        reissuable: bool,
        ipfs_hash: Option<ContentHash>,
    ) -> Result<Self, AssetError> {
        let asset = Self {
            name: name.into(),
            amount,
            units,
            reissuable,
            has_ipfs: ipfs_hash.is_some(),
            ipfs_hash,
            ..Self::null()
        };
        asset.validate()?;
        Ok(asset)
    }

    /// Issuance carrying toll and remint terms; always encoded with the
    /// upgrade tag.
    pub fn new_with_toll(
        name: impl Into<String>,
        amount: Amount,
        units: i8,
        reissuable: bool,
        ipfs_hash: Option<ContentHash>,
        terms: TollTerms,
    ) -> Result<Self, AssetError> {
        let asset = Self {
            name: name.into(),
            amount,
            units,
            reissuable,
            has_ipfs: ipfs_hash.is_some(),
            ipfs_hash,
            permanent_ipfs_hash: terms.permanent_ipfs_hash,
            toll_amount: terms.toll_amount,
            toll_address: terms.toll_address,
            toll_amount_mutable: terms.toll_amount_mutable,
            toll_address_mutable: terms.toll_address_mutable,
            remintable: terms.remintable,
            expiring_time: terms.expiring_time,
            version: ProtocolVersion::TollUpgrade,
            ..Self::null()
        };
        asset.validate()?;
        Ok(asset)
    }

    pub fn validate(&self) -> Result<(), AssetError> {
        if !is_name_length_valid(&self.name) {
            return Err(AssetError::InvalidName(self.name.clone()));
        }
        if !(MIN_UNIT..=MAX_UNIT).contains(&self.units) {
            return Err(AssetError::InvalidUnits(self.units));
        }
        if !money_range(self.amount) {
            return Err(AssetError::InvalidAmount(self.amount));
        }
        if !money_range(self.toll_amount) {
            return Err(AssetError::InvalidAmount(self.toll_amount));
        }
        if self.has_ipfs != self.ipfs_hash.is_some() {
            return Err(AssetError::Rejected(
                "has_ipfs flag does not match ipfs hash presence".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_null(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_toll_version(&self) -> bool {
        self.version.is_toll()
    }

    pub fn is_unique(&self) -> bool {
        is_unique_name(&self.name)
    }

    pub fn owner_name(&self) -> String {
        owner_name(&self.name)
    }

    pub fn encode_to(&self, encoder: &mut Encoder, target: SerializeTarget) {
        self.version.write_tag(encoder);
        encoder.write_var_str(&self.name);
        encoder.write_i64_le(self.amount);
        encoder.write_i8(self.units);
        encoder.write_bool(self.reissuable);
        encoder.write_bool(self.has_ipfs);
        if self.has_ipfs {
            write_hash_field(encoder, self.ipfs_hash.as_ref(), self.version);
        }

        if !self.version.is_toll() {
            return;
        }
        write_hash_field(encoder, self.permanent_ipfs_hash.as_ref(), self.version);
        encoder.write_i64_le(self.toll_amount);
        encoder.write_var_str(&self.toll_address);
        encoder.write_bool(self.toll_amount_mutable);
        encoder.write_bool(self.toll_address_mutable);
        encoder.write_bool(self.remintable);
        if self.is_unique() {
            encoder.write_u32_le(self.expiring_time);
        }
        if target == SerializeTarget::Disk {
            encoder.write_i64_le(self.total_burned);
            encoder.write_i64_le(self.currently_burned);
        }
    }

    pub fn decode_from(
        decoder: &mut Decoder<'_>,
        target: SerializeTarget,
    ) -> Result<Self, DecodeError> {
        let version = ProtocolVersion::sniff(decoder);
        let name = decoder.read_var_str()?;
        let amount = decoder.read_i64_le()?;
        let units = decoder.read_i8()?;
        let reissuable = decoder.read_bool()?;
        let has_ipfs = decoder.read_u8()? == 1;
        let ipfs_hash = if has_ipfs {
            read_hash_field(decoder, version)?.into_hash()
        } else {
            None
        };

        let mut asset = Self {
            name,
            amount,
            units,
            reissuable,
            has_ipfs,
            ipfs_hash,
            version,
            ..Self::null()
        };
        if !version.is_toll() {
            return Ok(asset);
        }

        asset.permanent_ipfs_hash = read_hash_field(decoder, version)?.into_hash();
        asset.toll_amount = decoder.read_i64_le()?;
        asset.toll_address = decoder.read_var_str()?;
        asset.toll_amount_mutable = decoder.read_bool()?;
        asset.toll_address_mutable = decoder.read_bool()?;
        asset.remintable = decoder.read_bool()?;
        if asset.is_unique() {
            asset.expiring_time = decoder.read_u32_le()?;
        }
        if target == SerializeTarget::Disk {
            asset.total_burned = decoder.read_i64_le()?;
            asset.currently_burned = decoder.read_i64_le()?;
        }
        Ok(asset)
    }

    pub fn to_bytes(&self, target: SerializeTarget) -> Vec<u8> {
        let mut encoder = Encoder::new();
        self.encode_to(&mut encoder, target);
        encoder.into_inner()
    }

    /// Appends the issuance payload to `script_pubkey`.
    pub fn construct_script(&self, script_pubkey: &[u8]) -> Vec<u8> {
        append_asset_payload(
            script_pubkey,
            ASSET_NEW_TYPE,
            &self.to_bytes(SerializeTarget::Network),
        )
    }

    /// Appends the owner-token payload (`NAME!`) to `script_pubkey`.
    pub fn construct_owner_script(&self, script_pubkey: &[u8]) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.write_var_str(&self.owner_name());
        append_asset_payload(script_pubkey, ASSET_OWNER_TYPE, &encoder.into_inner())
    }

    /// Applies a reissue on top of this asset's current state.
    pub fn apply_reissue(&mut self, reissue: &ReissueAsset) -> Result<(), AssetError> {
        if reissue.name != self.name {
            return Err(AssetError::Rejected(format!(
                "reissue for '{}' applied to '{}'",
                reissue.name, self.name
            )));
        }

        if reissue.reminting {
            self.record_remint(reissue.amount)?;
        } else {
            self.amount = self
                .amount
                .checked_add(reissue.amount)
                .filter(|amount| money_range(*amount))
                .ok_or(AssetError::InvalidAmount(reissue.amount))?;
        }
        if reissue.units != UNITS_UNCHANGED {
            self.units = reissue.units;
        }
        self.reissuable = reissue.reissuable;
        if let Some(hash) = reissue.ipfs_hash {
            self.has_ipfs = true;
            self.ipfs_hash = Some(hash);
        }

        if !reissue.version.is_toll() {
            return Ok(());
        }
        self.version = ProtocolVersion::TollUpgrade;
        if let Some(hash) = reissue.permanent_ipfs_hash {
            self.permanent_ipfs_hash = Some(hash);
        }
        if let Some(toll_amount) = reissue.toll_amount {
            self.toll_amount = toll_amount;
        }
        if !reissue.toll_address.is_empty() {
            self.toll_address = reissue.toll_address.clone();
        }
        self.toll_amount_mutable = reissue.toll_amount_mutable;
        self.toll_address_mutable = reissue.toll_address_mutable;
        self.remintable = reissue.remintable;
        Ok(())
    }

    /// Accounts for `amount` units sent to the burn-mint address.
    pub fn record_burn(&mut self, amount: Amount) -> Result<(), AssetError> {
        if amount < 0 {
            return Err(AssetError::InvalidAmount(amount));
        }
        self.total_burned = self
            .total_burned
            .checked_add(amount)
            .ok_or(AssetError::InvalidAmount(amount))?;
        self.currently_burned = self
            .currently_burned
            .checked_add(amount)
            .ok_or(AssetError::InvalidAmount(amount))?;
        Ok(())
    }

    /// Re-mints previously burned units.
    pub fn record_remint(&mut self, amount: Amount) -> Result<(), AssetError> {
        if amount < 0 || amount > self.currently_burned {
            return Err(AssetError::Rejected(format!(
                "cannot remint {amount} of '{}': only {} burned",
                self.name, self.currently_burned
            )));
        }
        self.currently_burned -= amount;
        Ok(())
    }
}

impl Encodable for NewAsset {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        self.encode_to(encoder, SerializeTarget::Network);
    }
}

impl Decodable for NewAsset {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Self::decode_from(decoder, SerializeTarget::Network)
    }
}

/// Asset metadata as persisted by the ledger, with the block that issued it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatabasedAssetData {
    pub asset: NewAsset,
    pub height: i32,
    pub block_hash: Hash256,
}

impl DatabasedAssetData {
    pub fn new(asset: NewAsset, height: i32, block_hash: Hash256) -> Self {
        Self {
            asset,
            height,
            block_hash,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        self.asset.encode_to(&mut encoder, SerializeTarget::Disk);
        encoder.write_i32_le(self.height);
        encoder.write_hash_le(&self.block_hash);
        encoder.into_inner()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut decoder = Decoder::new(bytes);
        let asset = NewAsset::decode_from(&mut decoder, SerializeTarget::Disk)?;
        let height = decoder.read_i32_le()?;
        let block_hash = decoder.read_hash_le()?;
        if !decoder.is_empty() {
            return Err(DecodeError::TrailingBytes);
        }
        Ok(Self {
            asset,
            height,
            block_hash,
        })
    }
}
