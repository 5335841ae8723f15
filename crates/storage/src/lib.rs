use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

pub mod lru;
pub mod memory;

pub use lru::{KeyNotFound, LruCache};

#[derive(Debug)]
pub enum StoreError {
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Column {
    /// Asset metadata keyed by asset name.
    AssetMeta,
    /// Balance keyed by asset name, `0x00`, address.
    AssetBalance,
    /// Per-block undo records keyed by block hash.
    AssetUndo,
    /// Qualifier tags keyed by qualifier name, `0x00`, address.
    AddressQualifier,
    /// Root-qualifier markers keyed by root name, `0x00`, address.
    RootQualifier,
    /// Frozen addresses keyed by restricted name, `0x00`, address.
    AddressRestriction,
    /// Globally frozen restricted assets keyed by name.
    GlobalRestriction,
    /// Verifier strings keyed by restricted asset name.
    Verifier,
    /// Toll accounting keyed by asset name.
    TollTracker,
    Meta,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::AssetMeta,
        Column::AssetBalance,
        Column::AssetUndo,
        Column::AddressQualifier,
        Column::RootQualifier,
        Column::AddressRestriction,
        Column::GlobalRestriction,
        Column::Verifier,
        Column::TollTracker,
        Column::Meta,
    ];

    pub const fn bit(self) -> u32 {
        match self {
            Column::AssetMeta => 1 << 0,
            Column::AssetBalance => 1 << 1,
            Column::AssetUndo => 1 << 2,
            Column::AddressQualifier => 1 << 3,
            Column::RootQualifier => 1 << 4,
            Column::AddressRestriction => 1 << 5,
            Column::GlobalRestriction => 1 << 6,
            Column::Verifier => 1 << 7,
            Column::TollTracker => 1 << 8,
            Column::Meta => 1 << 9,
        }
    }

    pub const fn index(self) -> usize {
        self.bit().trailing_zeros() as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Column::AssetMeta => "asset_meta",
            Column::AssetBalance => "asset_balance",
            Column::AssetUndo => "asset_undo",
            Column::AddressQualifier => "address_qualifier",
            Column::RootQualifier => "root_qualifier",
            Column::AddressRestriction => "address_restriction",
            Column::GlobalRestriction => "global_restriction",
            Column::Verifier => "verifier",
            Column::TollTracker => "toll_tracker",
            Column::Meta => "meta",
        }
    }
}

/// Inline-capacity byte buffer used for batch keys. Asset keys (name, a
/// separator, an address) fit without spilling to the heap.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriteKey(SmallVec<[u8; 80]>);

impl WriteKey {
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for WriteKey {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Vec<u8>> for WriteKey {
    fn from(value: Vec<u8>) -> Self {
        Self(SmallVec::from_vec(value))
    }
}

impl From<&[u8]> for WriteKey {
    fn from(value: &[u8]) -> Self {
        Self(SmallVec::from_slice(value))
    }
}

impl<const N: usize> From<[u8; N]> for WriteKey {
    fn from(value: [u8; N]) -> Self {
        Self(SmallVec::from_slice(&value))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WriteOp {
    Put {
        column: Column,
        key: WriteKey,
        value: Vec<u8>,
    },
    Delete {
        column: Column,
        key: WriteKey,
    },
}

impl WriteOp {
    pub fn column(&self) -> Column {
        match self {
            WriteOp::Put { column, .. } | WriteOp::Delete { column, .. } => *column,
        }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key, .. } => key.as_slice(),
        }
    }
}

/// Ordered list of mutations applied atomically by [`KeyValueStore::write_batch`].
/// Later operations on the same key win.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, column: Column, key: impl Into<WriteKey>, value: impl Into<Vec<u8>>) {
        self.ops.push(WriteOp::Put {
            column,
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, column: Column, key: impl Into<WriteKey>) {
        self.ops.push(WriteOp::Delete {
            column,
            key: key.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &WriteOp> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Latest staged state of a key: `Some(Some(value))` for a pending put,
    /// `Some(None)` for a pending delete, `None` when the batch never touched it.
    pub fn pending(&self, column: Column, key: &[u8]) -> Option<Option<&[u8]>> {
        self.ops.iter().rev().find_map(|op| {
            if op.column() != column || op.key() != key {
                return None;
            }
            match op {
                WriteOp::Put { value, .. } => Some(Some(value.as_slice())),
                WriteOp::Delete { .. } => Some(None),
            }
        })
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn scan_prefix(&self, column: Column, prefix: &[u8]) -> Result<ScanResult, StoreError>;
    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.as_ref().get(column, key)
    }

    fn scan_prefix(&self, column: Column, prefix: &[u8]) -> Result<ScanResult, StoreError> {
        self.as_ref().scan_prefix(column, prefix)
    }

    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        self.as_ref().write_batch(batch)
    }
}
