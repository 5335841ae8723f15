//! Address tagging, restriction and verifier records carried in
//! `OP_EVR_ASSET` outputs that hold no value.

use evrd_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};

use crate::error::AssetError;
use crate::name::{classify, AssetType};
use crate::script::{global_restriction_script, null_asset_script, verifier_script};
use crate::view::AssetStateView;

const NULL_FLAG: i8 = -1;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NullAssetData {
    pub name: String,
    /// On/off switch; its meaning depends on the output it appears in.
    pub flag: i8,
}

impl Default for NullAssetData {
    fn default() -> Self {
        Self {
            name: String::new(),
            flag: NULL_FLAG,
        }
    }
}

impl NullAssetData {
    pub fn new(name: impl Into<String>, flag: i8) -> Self {
        Self {
            name: name.into(),
            flag,
        }
    }

    pub fn is_null(&self) -> bool {
        self.name.is_empty()
    }

    /// Only qualifiers and restricted assets carry flag records, and the flag
    /// must be 0 or 1. With `force_check_primary_exists` the asset must
    /// already be issued.
    pub fn is_valid<V>(&self, view: &V, force_check_primary_exists: bool) -> Result<(), AssetError>
    where
        V: AssetStateView + ?Sized,
    {
        match classify(&self.name) {
            AssetType::Invalid => return Err(AssetError::InvalidName(self.name.clone())),
            AssetType::Qualifier | AssetType::SubQualifier | AssetType::Restricted => {}
            _ => {
                return Err(AssetError::Rejected(format!(
                    "{} must be a qualifier, sub qualifier, or restricted asset",
                    self.name
                )))
            }
        }
        if self.flag != 0 && self.flag != 1 {
            return Err(AssetError::Rejected(format!(
                "flag must be 1 or 0, got {}",
                self.flag
            )));
        }
        if force_check_primary_exists && !view.asset_exists(&self.name)? {
            return Err(AssetError::Rejected(format!(
                "asset doesn't exist: {}",
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

    /// Tag or restriction record targeting the address with `address_hash`.
    pub fn construct_script(&self, address_hash: &[u8; 20]) -> Vec<u8> {
        null_asset_script(address_hash, &self.to_bytes())
    }

    pub fn construct_global_restriction_script(&self) -> Vec<u8> {
        global_restriction_script(&self.to_bytes())
    }
}

impl Encodable for NullAssetData {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_var_str(&self.name);
        encoder.write_i8(self.flag);
    }
}

impl Decodable for NullAssetData {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            name: decoder.read_var_str()?,
            flag: decoder.read_i8()?,
        })
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NullAssetVerifierString {
    pub verifier: String,
}

impl NullAssetVerifierString {
    pub fn new(verifier: impl Into<String>) -> Self {
        Self {
            verifier: verifier.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.verifier.is_empty()
    }

    pub fn construct_script(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        self.consensus_encode(&mut encoder);
        verifier_script(&encoder.into_inner())
    }
}

impl Encodable for NullAssetVerifierString {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_var_str(&self.verifier);
    }
}

impl Decodable for NullAssetVerifierString {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            verifier: decoder.read_var_str()?,
        })
    }
}
