//! Asset name classification.
//!
//! Only the checks the codec and journal depend on live here; the full naming
//! grammar belongs to consensus validation.

use evrd_consensus::constants::{
    MAX_NAME_LENGTH, OWNER_TAG, QUALIFIER_PREFIX, RESTRICTED_PREFIX, SUB_NAME_DELIMITER,
    UNIQUE_TAG,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AssetType {
    Root = 0,
    Sub = 1,
    Unique = 2,
    MsgChannel = 3,
    Qualifier = 4,
    SubQualifier = 5,
    Restricted = 6,
    Vote = 7,
    Reissue = 8,
    ReissueMetadata = 9,
    Reminting = 10,
    Owner = 11,
    NullAddQualifier = 12,
    Invalid = 13,
}

impl AssetType {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => AssetType::Root,
            1 => AssetType::Sub,
            2 => AssetType::Unique,
            3 => AssetType::MsgChannel,
            4 => AssetType::Qualifier,
            5 => AssetType::SubQualifier,
            6 => AssetType::Restricted,
            7 => AssetType::Vote,
            8 => AssetType::Reissue,
            9 => AssetType::ReissueMetadata,
            10 => AssetType::Reminting,
            11 => AssetType::Owner,
            12 => AssetType::NullAddQualifier,
            _ => AssetType::Invalid,
        }
    }
}

/// True for `root#tag` names: a non-empty part free of `^ ~ # !`, one `#`,
/// then a non-empty part free of `~ # ! /`.
pub fn is_unique_name(name: &str) -> bool {
    let Some(split) = name.find(UNIQUE_TAG) else {
        return false;
    };
    let (root, tag) = (&name[..split], &name[split + 1..]);
    !root.is_empty()
        && !tag.is_empty()
        && !root.contains(['^', '~', '#', '!'])
        && !tag.contains(['~', '#', '!', '/'])
}

pub fn is_name_length_valid(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_NAME_LENGTH
}

pub fn is_owner_name(name: &str) -> bool {
    name.len() > 1 && name.ends_with(OWNER_TAG)
}

pub fn owner_name(name: &str) -> String {
    let mut owner = String::with_capacity(name.len() + 1);
    owner.push_str(name);
    owner.push(OWNER_TAG);
    owner
}

pub fn is_qualifier_name(name: &str) -> bool {
    name.len() > 1 && name.starts_with(QUALIFIER_PREFIX)
}

pub fn is_sub_qualifier_name(name: &str) -> bool {
    is_qualifier_name(name) && name.contains(SUB_NAME_DELIMITER)
}

pub fn is_restricted_name(name: &str) -> bool {
    name.len() > 1 && name.starts_with(RESTRICTED_PREFIX)
}

/// Name with any owner tag, unique tag, or sub-asset path removed.
///
/// `ROOT/SUB#TAG` and `ROOT!` map to `ROOT`; `#KYC/LEVEL` maps to `#KYC`.
pub fn root_name(name: &str) -> &str {
    let name = name.strip_suffix(OWNER_TAG).unwrap_or(name);
    let body_start = usize::from(name.starts_with([QUALIFIER_PREFIX, RESTRICTED_PREFIX]));
    let end = name[body_start..]
        .find([SUB_NAME_DELIMITER, UNIQUE_TAG])
        .map(|pos| pos + body_start)
        .unwrap_or(name.len());
    &name[..end]
}

/// Best-effort classification from the name's shape.
pub fn classify(name: &str) -> AssetType {
    if !is_name_length_valid(name) && !(is_owner_name(name) && name.len() <= MAX_NAME_LENGTH + 1)
    {
        return AssetType::Invalid;
    }
    if is_owner_name(name) {
        AssetType::Owner
    } else if is_sub_qualifier_name(name) {
        AssetType::SubQualifier
    } else if is_qualifier_name(name) {
        AssetType::Qualifier
    } else if is_restricted_name(name) {
        AssetType::Restricted
    } else if is_unique_name(name) {
        AssetType::Unique
    } else if name.contains('~') {
        AssetType::MsgChannel
    } else if name.contains(SUB_NAME_DELIMITER) {
        AssetType::Sub
    } else {
        AssetType::Root
    }
}
