use evrd_assets::DatabasedAssetData;
use evrd_primitives::encoding::{DecodeError, Decoder, Encoder};
use evrd_storage::Column;

const ASSET_UNDO_VERSION: u8 = 1;

/// Prior state of one presence flag (tag, freeze, root marker).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlagUndo {
    pub column: Column,
    pub key: Vec<u8>,
    pub was_set: bool,
}

/// State the ledger held before a block connected, captured the first time
/// each key is touched. Balances are not captured; they are inverted from
/// the journal deltas instead.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AssetBlockUndo {
    pub assets: Vec<(String, Option<DatabasedAssetData>)>,
    pub flags: Vec<FlagUndo>,
    pub verifiers: Vec<(String, Option<String>)>,
}

impl AssetBlockUndo {
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.flags.is_empty() && self.verifiers.is_empty()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.write_u8(ASSET_UNDO_VERSION);
        encoder.write_u32_le(self.assets.len() as u32);
        for (name, prev) in &self.assets {
            encoder.write_var_str(name);
            encoder.write_u8(if prev.is_some() { 1 } else { 0 });
            if let Some(data) = prev {
                encoder.write_var_bytes(&data.encode());
            }
        }
        encoder.write_u32_le(self.flags.len() as u32);
        for flag in &self.flags {
            encoder.write_u8(flag_column_tag(flag.column));
            encoder.write_var_bytes(&flag.key);
            encoder.write_bool(flag.was_set);
        }
        encoder.write_u32_le(self.verifiers.len() as u32);
        for (name, prev) in &self.verifiers {
            encoder.write_var_str(name);
            encoder.write_u8(if prev.is_some() { 1 } else { 0 });
            if let Some(verifier) = prev {
                encoder.write_var_str(verifier);
            }
        }
        encoder.into_inner()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut decoder = Decoder::new(bytes);
        let version = decoder.read_u8()?;
        if version != ASSET_UNDO_VERSION {
            return Err(DecodeError::InvalidData("unsupported asset undo version"));
        }

        let assets_len = decoder.read_u32_le()? as usize;
        let mut assets = Vec::with_capacity(assets_len.min(1024));
        for _ in 0..assets_len {
            let name = decoder.read_var_str()?;
            let has_prev = decoder.read_u8()? != 0;
            let prev = if has_prev {
                let record_bytes = decoder.read_var_bytes()?;
                Some(
                    DatabasedAssetData::decode(&record_bytes)
                        .map_err(|_| DecodeError::InvalidData("invalid asset record in undo"))?,
                )
            } else {
                None
            };
            assets.push((name, prev));
        }

        let flags_len = decoder.read_u32_le()? as usize;
        let mut flags = Vec::with_capacity(flags_len.min(1024));
        for _ in 0..flags_len {
            let column = flag_column_from_tag(decoder.read_u8()?)
                .ok_or(DecodeError::InvalidData("invalid flag column in undo"))?;
            let key = decoder.read_var_bytes()?;
            let was_set = decoder.read_bool()?;
            flags.push(FlagUndo {
                column,
                key,
                was_set,
            });
        }

        let verifiers_len = decoder.read_u32_le()? as usize;
        let mut verifiers = Vec::with_capacity(verifiers_len.min(1024));
        for _ in 0..verifiers_len {
            let name = decoder.read_var_str()?;
            let has_prev = decoder.read_u8()? != 0;
            let prev = if has_prev {
                Some(decoder.read_var_str()?)
            } else {
                None
            };
            verifiers.push((name, prev));
        }

        if !decoder.is_empty() {
            return Err(DecodeError::TrailingBytes);
        }
        Ok(Self {
            assets,
            flags,
            verifiers,
        })
    }
}

fn flag_column_tag(column: Column) -> u8 {
    match column {
        Column::AddressQualifier => 0,
        Column::RootQualifier => 1,
        Column::AddressRestriction => 2,
        Column::GlobalRestriction => 3,
        _ => u8::MAX,
    }
}

fn flag_column_from_tag(tag: u8) -> Option<Column> {
    match tag {
        0 => Some(Column::AddressQualifier),
        1 => Some(Column::RootQualifier),
        2 => Some(Column::AddressRestriction),
        3 => Some(Column::GlobalRestriction),
        _ => None,
    }
}
