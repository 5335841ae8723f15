//! Record version tag detection.
//!
//! Records written after the toll upgrade start with a 4-byte magic. Older
//! records have no tag at all, so the decoder looks ahead and only consumes the
//! four bytes when they match the upgrade magic.

use evrd_consensus::constants::{STANDARD_VERSION, TOLL_UPGRADE_VERSION};
use evrd_log::log_trace;
use evrd_primitives::encoding::{Decoder, Encoder};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ProtocolVersion {
    /// Untagged legacy layout.
    #[default]
    Standard,
    /// Tagged layout carrying toll, remint and permanent-hash fields.
    TollUpgrade,
}

impl ProtocolVersion {
    pub const fn magic(self) -> u32 {
        match self {
            ProtocolVersion::Standard => STANDARD_VERSION,
            ProtocolVersion::TollUpgrade => TOLL_UPGRADE_VERSION,
        }
    }

    pub fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            STANDARD_VERSION => Some(ProtocolVersion::Standard),
            TOLL_UPGRADE_VERSION => Some(ProtocolVersion::TollUpgrade),
            _ => None,
        }
    }

    pub fn is_toll(self) -> bool {
        self >= ProtocolVersion::TollUpgrade
    }

    /// Determines the effective version of the record at the cursor.
    ///
    /// Consumes the tag only when it equals the upgrade magic. A short buffer
    /// or any other value leaves the cursor where it was and yields
    /// [`ProtocolVersion::Standard`].
    pub fn sniff(decoder: &mut Decoder<'_>) -> Self {
        match decoder.peek_u32_le() {
            Some((TOLL_UPGRADE_VERSION, consumed)) => {
                if decoder.skip(consumed).is_ok() {
                    return ProtocolVersion::TollUpgrade;
                }
                ProtocolVersion::Standard
            }
            Some((other, _)) => {
                log_trace!("no version tag ({other:#010x}); decoding legacy layout");
                ProtocolVersion::Standard
            }
            None => ProtocolVersion::Standard,
        }
    }

    /// Writes the tag for upgraded records. The standard version is never
    /// written so legacy bytes stay unchanged.
    pub fn write_tag(self, encoder: &mut Encoder) {
        if self.is_toll() {
            encoder.write_u32_le(self.magic());
        }
    }
}
