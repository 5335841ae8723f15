//! Content-hash fields (IPFS hash or plain txid reference).
//!
//! Legacy layout: `[tag][var bytes]`, read only when at least 33 bytes remain.
//! Upgraded layout: `[len][tag][var bytes]`, where `len == 0` means no hash and
//! nothing else follows.

use evrd_consensus::constants::{
    IPFS_HASH_LEN, IPFS_SHA2_256, IPFS_SHA2_256_LEN, PLAIN_HASH_LEN, TXID_NOTIFIER,
};
use evrd_consensus::Hash256;
use evrd_primitives::encoding::{DecodeError, Decoder, Encoder};

use crate::error::AssetError;
use crate::version::ProtocolVersion;

const LEGACY_MIN_REMAINING: usize = 33;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ContentHash {
    /// Plain 32-byte reference, rendered as the digest itself.
    Txid(Hash256),
    /// IPFS sha2-256 multihash, rendered as `0x12 0x20` followed by the digest.
    Ipfs(Hash256),
}

impl ContentHash {
    /// Parses a rendered hash. 32 bytes is a plain hash; 34 bytes is a
    /// content-addressed hash whose first two bytes are the multihash marker.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        match bytes.len() {
            PLAIN_HASH_LEN => {
                let mut digest = [0u8; 32];
                digest.copy_from_slice(bytes);
                Ok(ContentHash::Txid(digest))
            }
            IPFS_HASH_LEN => {
                let mut digest = [0u8; 32];
                digest.copy_from_slice(&bytes[2..]);
                Ok(ContentHash::Ipfs(digest))
            }
            len => Err(AssetError::InvalidHash(len)),
        }
    }

    pub fn digest(&self) -> &Hash256 {
        match self {
            ContentHash::Txid(digest) | ContentHash::Ipfs(digest) => digest,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            ContentHash::Txid(_) => TXID_NOTIFIER,
            ContentHash::Ipfs(_) => IPFS_SHA2_256,
        }
    }

    pub fn rendered_len(&self) -> usize {
        match self {
            ContentHash::Txid(_) => PLAIN_HASH_LEN,
            ContentHash::Ipfs(_) => IPFS_HASH_LEN,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rendered_len());
        if let ContentHash::Ipfs(_) = self {
            out.push(IPFS_SHA2_256);
            out.push(IPFS_SHA2_256_LEN);
        }
        out.extend_from_slice(self.digest());
        out
    }

    /// `None` when the payload is shorter than a digest.
    fn from_wire(tag: u8, payload: &[u8]) -> Option<Self> {
        let digest: Hash256 = payload.get(..PLAIN_HASH_LEN)?.try_into().ok()?;
        if tag == IPFS_SHA2_256 {
            Some(ContentHash::Ipfs(digest))
        } else {
            Some(ContentHash::Txid(digest))
        }
    }

    fn write_body(&self, encoder: &mut Encoder) {
        encoder.write_u8(self.tag());
        encoder.write_var_bytes(self.digest());
    }
}

/// Outcome of reading a hash field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HashFieldRead {
    /// Nothing was interpreted: too few bytes remained.
    NotPresent,
    /// The field was present and explicitly empty.
    Empty,
    /// The field was consumed but its payload does not hold a usable digest.
    Malformed,
    Hash(ContentHash),
}

impl HashFieldRead {
    /// Whether the field was interpreted. Transfers only look for a trailing
    /// expiry when this holds.
    pub fn is_interpreted(&self) -> bool {
        !matches!(self, HashFieldRead::NotPresent)
    }

    pub fn into_hash(self) -> Option<ContentHash> {
        match self {
            HashFieldRead::Hash(hash) => Some(hash),
            HashFieldRead::NotPresent | HashFieldRead::Empty | HashFieldRead::Malformed => None,
        }
    }
}

/// Legacy read: interprets the field only when at least 33 bytes remain.
pub fn read_legacy(decoder: &mut Decoder<'_>) -> Result<HashFieldRead, DecodeError> {
    if decoder.remaining() < LEGACY_MIN_REMAINING {
        return Ok(HashFieldRead::NotPresent);
    }
    read_body(decoder)
}

/// Reads `[tag][var bytes]`. Only a truncated var-bytes read is an error; a
/// payload shorter than a digest is `Malformed`.
fn read_body(decoder: &mut Decoder<'_>) -> Result<HashFieldRead, DecodeError> {
    let tag = decoder.read_u8()?;
    let payload = decoder.read_var_bytes()?;
    Ok(ContentHash::from_wire(tag, &payload)
        .map(HashFieldRead::Hash)
        .unwrap_or(HashFieldRead::Malformed))
}

/// Legacy write. An absent hash writes nothing and reports `false`.
pub fn write_legacy(encoder: &mut Encoder, hash: Option<&ContentHash>) -> bool {
    match hash {
        Some(hash) => {
            hash.write_body(encoder);
            true
        }
        None => false,
    }
}

/// Length-prefixed read used by upgraded records.
pub fn read_prefixed(decoder: &mut Decoder<'_>) -> Result<HashFieldRead, DecodeError> {
    if decoder.is_empty() {
        return Ok(HashFieldRead::NotPresent);
    }
    let start = decoder.position();
    let len = decoder.read_u8()? as usize;
    if len == 0 {
        return Ok(HashFieldRead::Empty);
    }
    if decoder.remaining() < len {
        decoder.rewind_to(start);
        return Ok(HashFieldRead::NotPresent);
    }
    let body = read_body(decoder)?;
    if len != PLAIN_HASH_LEN && len != IPFS_HASH_LEN {
        return Ok(HashFieldRead::Malformed);
    }
    Ok(body)
}

/// Length-prefixed write. An absent hash is a single zero byte.
pub fn write_prefixed(encoder: &mut Encoder, hash: Option<&ContentHash>) -> bool {
    match hash {
        Some(hash) => {
            encoder.write_u8(hash.rendered_len() as u8);
            hash.write_body(encoder);
        }
        None => encoder.write_u8(0),
    }
    true
}

pub fn read_hash_field(
    decoder: &mut Decoder<'_>,
    version: ProtocolVersion,
) -> Result<HashFieldRead, DecodeError> {
    if version.is_toll() {
        read_prefixed(decoder)
    } else {
        read_legacy(decoder)
    }
}

pub fn write_hash_field(
    encoder: &mut Encoder,
    hash: Option<&ContentHash>,
    version: ProtocolVersion,
) -> bool {
    if version.is_toll() {
        write_prefixed(encoder, hash)
    } else {
        write_legacy(encoder, hash)
    }
}

/// Writes a rendered hash (0, 32 or 34 bytes). Any other length writes nothing
/// and reports `false`.
pub fn write_rendered_hash_field(
    encoder: &mut Encoder,
    rendered: &[u8],
    version: ProtocolVersion,
) -> bool {
    if rendered.is_empty() {
        return write_hash_field(encoder, None, version);
    }
    match ContentHash::from_bytes(rendered) {
        Ok(hash) => write_hash_field(encoder, Some(&hash), version),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipfs() -> ContentHash {
        ContentHash::Ipfs([0xaa; 32])
    }

    #[test]
    fn rendering_lengths() {
        assert_eq!(ipfs().to_bytes().len(), 34);
        assert_eq!(ipfs().to_bytes()[..2], [0x12, 0x20]);
        assert_eq!(ContentHash::Txid([1; 32]).to_bytes(), vec![1; 32]);
        assert_eq!(ContentHash::from_bytes(&ipfs().to_bytes()), Ok(ipfs()));
        assert_eq!(
            ContentHash::from_bytes(&[0u8; 33]),
            Err(AssetError::InvalidHash(33))
        );
    }

    #[test]
    fn legacy_layout() {
        let mut encoder = Encoder::new();
        assert!(write_legacy(&mut encoder, Some(&ipfs())));
        let bytes = encoder.into_inner();
        assert_eq!(bytes.len(), 34);
        assert_eq!(bytes[0], IPFS_SHA2_256);
        assert_eq!(bytes[1], 32);

        let mut decoder = Decoder::new(&bytes);
        assert_eq!(read_legacy(&mut decoder), Ok(HashFieldRead::Hash(ipfs())));
        assert!(decoder.is_empty());
    }

    #[test]
    fn legacy_read_needs_33_bytes() {
        let bytes = [0u8; 32];
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(read_legacy(&mut decoder), Ok(HashFieldRead::NotPresent));
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn legacy_unknown_tag_is_plain_hash() {
        let mut bytes = vec![0x99, 32];
        bytes.extend_from_slice(&[7u8; 32]);
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(
            read_legacy(&mut decoder),
            Ok(HashFieldRead::Hash(ContentHash::Txid([7; 32])))
        );
    }

    #[test]
    fn prefixed_empty_is_single_byte() {
        let mut encoder = Encoder::new();
        assert!(write_prefixed(&mut encoder, None));
        let mut bytes = encoder.into_inner();
        assert_eq!(bytes, vec![0]);

        bytes.extend_from_slice(&[0x55; 40]);
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(read_prefixed(&mut decoder), Ok(HashFieldRead::Empty));
        assert_eq!(decoder.remaining(), 40);
    }

    #[test]
    fn prefixed_txid_round_trip() {
        let hash = ContentHash::Txid([3; 32]);
        let mut encoder = Encoder::new();
        write_prefixed(&mut encoder, Some(&hash));
        let bytes = encoder.into_inner();
        assert_eq!(bytes[..3], [32, TXID_NOTIFIER, 32]);

        let mut decoder = Decoder::new(&bytes);
        assert_eq!(read_prefixed(&mut decoder), Ok(HashFieldRead::Hash(hash)));
        assert!(decoder.is_empty());
    }

    #[test]
    fn prefixed_odd_length_is_consumed_as_malformed() {
        let mut bytes = vec![33u8, TXID_NOTIFIER, 32];
        bytes.extend_from_slice(&[4u8; 32]);
        bytes.push(0xee);
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(read_prefixed(&mut decoder), Ok(HashFieldRead::Malformed));
        assert_eq!(decoder.remaining(), 1);
    }

    #[test]
    fn prefixed_short_input_leaves_cursor() {
        let bytes = [34u8, IPFS_SHA2_256, 32, 1, 2, 3];
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(read_prefixed(&mut decoder), Ok(HashFieldRead::NotPresent));
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn prefixed_truncated_body_is_an_error() {
        let mut bytes = vec![32u8, TXID_NOTIFIER, 40];
        bytes.extend_from_slice(&[0u8; 32]);
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(read_prefixed(&mut decoder), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn legacy_short_payload_is_malformed() {
        let mut bytes = vec![TXID_NOTIFIER, 23];
        bytes.extend_from_slice(&[6u8; 23]);
        bytes.extend_from_slice(&[0u8; 8]);
        let mut decoder = Decoder::new(&bytes);
        let read = read_legacy(&mut decoder).expect("read");
        assert_eq!(read, HashFieldRead::Malformed);
        assert!(read.is_interpreted());
        assert_eq!(read.into_hash(), None);
        assert_eq!(decoder.remaining(), 8);
    }

    #[test]
    fn rendered_invalid_length_writes_nothing() {
        for version in [ProtocolVersion::Standard, ProtocolVersion::TollUpgrade] {
            let mut encoder = Encoder::new();
            assert!(!write_rendered_hash_field(&mut encoder, &[1u8; 20], version));
            assert!(encoder.is_empty());
        }

        let mut encoder = Encoder::new();
        assert!(write_rendered_hash_field(
            &mut encoder,
            &ipfs().to_bytes(),
            ProtocolVersion::TollUpgrade
        ));
        assert_eq!(encoder.len(), 35);
    }
}
