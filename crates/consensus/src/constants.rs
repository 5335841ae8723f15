//! Asset-layer constants shared across encoding and validation.

use crate::money::{Amount, COIN};

/// Version tag value for records serialized before the toll upgrade.
///
/// Never written to the wire; records without a recognised tag decode as this.
pub const STANDARD_VERSION: u32 = 0xABCD_EF00;
/// Version tag prefixed to records carrying toll/remint extensions.
pub const TOLL_UPGRADE_VERSION: u32 = 0xABCD_EF01;

/// Tag byte of a content-addressed (IPFS sha2-256) hash.
pub const IPFS_SHA2_256: u8 = 0x12;
/// Digest length byte that follows [`IPFS_SHA2_256`] in the rendered hash.
pub const IPFS_SHA2_256_LEN: u8 = 0x20;
/// Tag byte of a plain 32-byte reference hash (usually a txid).
pub const TXID_NOTIFIER: u8 = 0x54;

/// Length of a plain hash rendering.
pub const PLAIN_HASH_LEN: usize = 32;
/// Length of a content-addressed hash rendering (2-byte marker + digest).
pub const IPFS_HASH_LEN: usize = 34;

pub const MAX_UNIT: i8 = 8;
pub const MIN_UNIT: i8 = 0;
/// Units value in a reissue meaning "leave units unchanged".
pub const UNITS_UNCHANGED: i8 = -1;

pub const MAX_NAME_LENGTH: usize = 31;

/// Amount credited for an owner token.
pub const OWNER_ASSET_AMOUNT: Amount = COIN;
pub const OWNER_TAG: char = '!';
pub const UNIQUE_TAG: char = '#';
pub const SUB_NAME_DELIMITER: char = '/';
pub const QUALIFIER_PREFIX: char = '#';
pub const RESTRICTED_PREFIX: char = '$';

/// Smallest non-zero toll charged on a spend.
pub const MIN_TOLL_AMOUNT: Amount = 5_000;
/// Largest toll charged on a single spend.
pub const MAX_TOLL_AMOUNT: Amount = 1_000_000_000 * COIN;

/// Marker script opcode introducing asset payloads.
pub const OP_EVR_ASSET: u8 = 0xc0;
/// Three-byte payload prefix of issue/reissue/transfer/owner scripts.
pub const ASSET_SCRIPT_PREFIX: [u8; 3] = *b"evr";
pub const ASSET_NEW_TYPE: u8 = b'q';
pub const ASSET_OWNER_TYPE: u8 = b'o';
pub const ASSET_REISSUE_TYPE: u8 = b'r';
pub const ASSET_TRANSFER_TYPE: u8 = b't';

/// Qualifier tokens are transferred in whole units between these bounds.
pub const QUALIFIER_MIN_AMOUNT: Amount = COIN;
pub const QUALIFIER_MAX_AMOUNT: Amount = 10 * COIN;

pub const MAX_VERIFIER_STRING_LENGTH: usize = 80;
