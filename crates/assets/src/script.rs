//! `OP_EVR_ASSET` output scripts.
//!
//! Issue, owner, reissue and transfer payloads ride on a standard output:
//! `<p2pkh|p2sh> OP_EVR_ASSET <"evr" type payload> OP_DROP`. Tag, restriction
//! and verifier records stand alone and start with `OP_EVR_ASSET`.

use evrd_consensus::constants::{
    ASSET_NEW_TYPE, ASSET_OWNER_TYPE, ASSET_REISSUE_TYPE, ASSET_SCRIPT_PREFIX,
    ASSET_TRANSFER_TYPE, OP_EVR_ASSET,
};

const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_RESERVED: u8 = 0x50;
const OP_DROP: u8 = 0x75;
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

const P2PKH_LEN: usize = 25;
const P2SH_LEN: usize = 23;
const ADDRESS_HASH_LEN: usize = 20;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssetScriptKind {
    NewAsset,
    Owner,
    Reissue,
    Transfer,
    NullAssetData,
    GlobalRestriction,
    Verifier,
}

impl AssetScriptKind {
    fn from_type_byte(byte: u8) -> Option<Self> {
        match byte {
            ASSET_NEW_TYPE => Some(AssetScriptKind::NewAsset),
            ASSET_OWNER_TYPE => Some(AssetScriptKind::Owner),
            ASSET_REISSUE_TYPE => Some(AssetScriptKind::Reissue),
            ASSET_TRANSFER_TYPE => Some(AssetScriptKind::Transfer),
            _ => None,
        }
    }
}

/// An asset output split into its parts. `destination` is the standard
/// script for value-carrying outputs, the 20-byte address hash for tag and
/// restriction records, and empty otherwise.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AssetScript<'a> {
    pub kind: AssetScriptKind,
    pub destination: &'a [u8],
    pub payload: &'a [u8],
}

/// Appends `OP_EVR_ASSET <"evr" type_byte payload> OP_DROP`.
pub fn append_asset_payload(script_pubkey: &[u8], type_byte: u8, payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(ASSET_SCRIPT_PREFIX.len() + 1 + payload.len());
    data.extend_from_slice(&ASSET_SCRIPT_PREFIX);
    data.push(type_byte);
    data.extend_from_slice(payload);

    let mut script = Vec::with_capacity(script_pubkey.len() + data.len() + 8);
    script.extend_from_slice(script_pubkey);
    script.push(OP_EVR_ASSET);
    push_data(&mut script, &data);
    script.push(OP_DROP);
    script
}

pub fn null_asset_script(address_hash: &[u8; ADDRESS_HASH_LEN], payload: &[u8]) -> Vec<u8> {
    let mut script = vec![OP_EVR_ASSET];
    push_data(&mut script, address_hash);
    push_data(&mut script, payload);
    script
}

pub fn global_restriction_script(payload: &[u8]) -> Vec<u8> {
    let mut script = vec![OP_EVR_ASSET, OP_RESERVED, OP_RESERVED];
    push_data(&mut script, payload);
    script
}

pub fn verifier_script(payload: &[u8]) -> Vec<u8> {
    let mut script = vec![OP_EVR_ASSET, OP_RESERVED];
    push_data(&mut script, payload);
    script
}

/// Minimal push of `data`.
pub fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len < OP_PUSHDATA1 as usize {
        script.push(len as u8);
    } else if len <= u8::MAX as usize {
        script.push(OP_PUSHDATA1);
        script.push(len as u8);
    } else if len <= u16::MAX as usize {
        script.push(OP_PUSHDATA2);
        script.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        script.push(OP_PUSHDATA4);
        script.extend_from_slice(&(len as u32).to_le_bytes());
    }
    script.extend_from_slice(data);
}

pub fn parse_asset_script(script: &[u8]) -> Option<AssetScript<'_>> {
    if script.first() == Some(&OP_EVR_ASSET) {
        return parse_null_asset_script(script);
    }

    let prefix_len = if has_p2pkh_prefix(script) {
        P2PKH_LEN
    } else if has_p2sh_prefix(script) {
        P2SH_LEN
    } else {
        return None;
    };
    if script.get(prefix_len) != Some(&OP_EVR_ASSET) {
        return None;
    }

    let mut cursor = prefix_len + 1;
    let data = read_push(script, &mut cursor)?;
    if script.get(cursor) != Some(&OP_DROP) || cursor + 1 != script.len() {
        return None;
    }
    let body = data.strip_prefix(&ASSET_SCRIPT_PREFIX[..])?;
    let (&type_byte, payload) = body.split_first()?;
    Some(AssetScript {
        kind: AssetScriptKind::from_type_byte(type_byte)?,
        destination: &script[..prefix_len],
        payload,
    })
}

fn parse_null_asset_script(script: &[u8]) -> Option<AssetScript<'_>> {
    let (kind, mut cursor, destination) = match script.get(1..3)? {
        [OP_RESERVED, OP_RESERVED] => (AssetScriptKind::GlobalRestriction, 3, &script[..0]),
        [OP_RESERVED, _] => (AssetScriptKind::Verifier, 2, &script[..0]),
        _ => {
            let mut cursor = 1;
            let hash = read_push(script, &mut cursor)?;
            if hash.len() != ADDRESS_HASH_LEN {
                return None;
            }
            (AssetScriptKind::NullAssetData, cursor, hash)
        }
    };
    let payload = read_push(script, &mut cursor)?;
    if cursor != script.len() {
        return None;
    }
    Some(AssetScript {
        kind,
        destination,
        payload,
    })
}

fn has_p2pkh_prefix(script: &[u8]) -> bool {
    script.len() > P2PKH_LEN
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 0x14
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
}

fn has_p2sh_prefix(script: &[u8]) -> bool {
    script.len() > P2SH_LEN && script[0] == OP_HASH160 && script[1] == 0x14 && script[22] == OP_EQUAL
}

fn read_push<'a>(script: &'a [u8], cursor: &mut usize) -> Option<&'a [u8]> {
    let opcode = *script.get(*cursor)?;
    *cursor += 1;
    let len = match opcode {
        0x00..=0x4b => opcode as usize,
        OP_PUSHDATA1 => {
            let len = *script.get(*cursor)? as usize;
            *cursor += 1;
            len
        }
        OP_PUSHDATA2 => {
            let bytes = script.get(*cursor..*cursor + 2)?;
            *cursor += 2;
            u16::from_le_bytes([bytes[0], bytes[1]]) as usize
        }
        OP_PUSHDATA4 => {
            let bytes = script.get(*cursor..*cursor + 4)?;
            *cursor += 4;
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
        }
        _ => return None,
    };
    let data = script.get(*cursor..cursor.checked_add(len)?)?;
    *cursor += len;
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p2pkh() -> Vec<u8> {
        let mut script = vec![OP_DUP, OP_HASH160, 0x14];
        script.extend_from_slice(&[0x11; 20]);
        script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        script
    }

    #[test]
    fn push_sizes() {
        for (len, header) in [(0usize, 1usize), (75, 1), (76, 2), (255, 2), (256, 3), (70_000, 5)] {
            let mut script = Vec::new();
            push_data(&mut script, &vec![0u8; len]);
            assert_eq!(script.len(), header + len, "len {len}");
            let mut cursor = 0;
            assert_eq!(read_push(&script, &mut cursor).map(<[u8]>::len), Some(len));
            assert_eq!(cursor, script.len());
        }
    }

    #[test]
    fn value_output_round_trip() {
        let script = append_asset_payload(&p2pkh(), ASSET_TRANSFER_TYPE, b"payload");
        assert_eq!(script[25], OP_EVR_ASSET);
        assert_eq!(*script.last().expect("drop"), OP_DROP);

        let parsed = parse_asset_script(&script).expect("asset script");
        assert_eq!(parsed.kind, AssetScriptKind::Transfer);
        assert_eq!(parsed.destination, &p2pkh()[..]);
        assert_eq!(parsed.payload, b"payload");
    }

    #[test]
    fn p2sh_prefix() {
        let mut prefix = vec![OP_HASH160, 0x14];
        prefix.extend_from_slice(&[0x22; 20]);
        prefix.push(OP_EQUAL);
        let script = append_asset_payload(&prefix, ASSET_NEW_TYPE, &[1, 2, 3]);
        let parsed = parse_asset_script(&script).expect("asset script");
        assert_eq!(parsed.kind, AssetScriptKind::NewAsset);
        assert_eq!(parsed.destination.len(), 23);
    }

    #[test]
    fn standalone_records() {
        let tagged = null_asset_script(&[7; 20], b"tag");
        let parsed = parse_asset_script(&tagged).expect("tag");
        assert_eq!(parsed.kind, AssetScriptKind::NullAssetData);
        assert_eq!(parsed.destination, &[7; 20]);
        assert_eq!(parsed.payload, b"tag");

        let global_script = global_restriction_script(b"g");
        let global = parse_asset_script(&global_script).expect("global");
        assert_eq!(global.kind, AssetScriptKind::GlobalRestriction);
        assert_eq!(global.payload, b"g");

        let verifier_bytes = verifier_script(b"v");
        let verifier = parse_asset_script(&verifier_bytes).expect("verifier");
        assert_eq!(verifier.kind, AssetScriptKind::Verifier);
        assert_eq!(verifier.payload, b"v");
    }

    #[test]
    fn rejects_foreign_scripts() {
        assert_eq!(parse_asset_script(&p2pkh()), None);
        assert_eq!(parse_asset_script(&[]), None);

        let mut unknown_type = append_asset_payload(&p2pkh(), b'z', b"x");
        assert_eq!(parse_asset_script(&unknown_type), None);
        unknown_type.push(0x00);
        assert_eq!(parse_asset_script(&unknown_type), None);

        let mut missing_drop = append_asset_payload(&p2pkh(), ASSET_REISSUE_TYPE, b"x");
        missing_drop.pop();
        assert_eq!(parse_asset_script(&missing_drop), None);
    }
}
