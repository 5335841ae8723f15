//! Per-block ledger journal.
//!
//! Each entry describes one ledger mutation with enough context to apply it
//! on connect and invert it on disconnect. Ordered kinds are held in maps
//! keyed by their comparison key, so iteration order never depends on the
//! order entries were added; a later entry with an equal key replaces the
//! earlier one.

use std::collections::BTreeMap;

use evrd_consensus::{Amount, Hash256};
use evrd_primitives::encoding::Encoder;
use evrd_primitives::{sha256d, OutPoint};

use crate::new_asset::NewAsset;
use crate::reissue::ReissueAsset;
use crate::transfer::AssetTransfer;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum QualifierType {
    Remove = 0,
    Add = 1,
}

impl QualifierType {
    pub fn from_flag(flag: i8) -> Option<Self> {
        match flag {
            0 => Some(QualifierType::Remove),
            1 => Some(QualifierType::Add),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RestrictedType {
    UnfreezeAddress = 0,
    FreezeAddress = 1,
    GlobalUnfreeze = 2,
    GlobalFreeze = 3,
}

impl RestrictedType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(RestrictedType::UnfreezeAddress),
            1 => Some(RestrictedType::FreezeAddress),
            2 => Some(RestrictedType::GlobalUnfreeze),
            3 => Some(RestrictedType::GlobalFreeze),
            _ => None,
        }
    }

    pub fn is_freeze(self) -> bool {
        matches!(self, RestrictedType::FreezeAddress | RestrictedType::GlobalFreeze)
    }

    pub fn is_global(self) -> bool {
        matches!(self, RestrictedType::GlobalUnfreeze | RestrictedType::GlobalFreeze)
    }
}

/// Block that produced an entry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BlockRef {
    pub height: i32,
    pub hash: Hash256,
}

impl BlockRef {
    pub fn new(height: i32, hash: Hash256) -> Self {
        Self { height, hash }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewAssetEntry {
    pub asset: NewAsset,
    pub address: String,
    pub block: BlockRef,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReissueAssetEntry {
    pub reissue: ReissueAsset,
    pub address: String,
    pub outpoint: OutPoint,
    pub block: BlockRef,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewTransferEntry {
    pub transfer: AssetTransfer,
    pub address: String,
    pub outpoint: OutPoint,
    /// Unset for transfers seen outside a block (mempool).
    pub block: Option<BlockRef>,
}

/// Owner token issued alongside a new asset; `asset_name` is the token
/// name itself, e.g. `GOLD!`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewOwnerEntry {
    pub asset_name: String,
    pub address: String,
}

/// Balance restored to `address`, e.g. when undoing a spend.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UndoAssetAmountEntry {
    pub asset_name: String,
    pub address: String,
    pub amount: Amount,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpendAssetEntry {
    pub asset_name: String,
    pub address: String,
    pub amount: Amount,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QualifierAddressEntry {
    pub asset_name: String,
    pub address: String,
    pub qualifier_type: QualifierType,
}

impl QualifierAddressEntry {
    pub fn identity_hash(&self) -> Hash256 {
        pair_identity(&self.asset_name, &self.address)
    }
}

/// Marks that `address` holds some qualifier under `root_asset_name`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RootQualifierCheckerEntry {
    pub root_asset_name: String,
    pub address: String,
}

impl RootQualifierCheckerEntry {
    pub fn identity_hash(&self) -> Hash256 {
        pair_identity(&self.root_asset_name, &self.address)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RestrictedAddressEntry {
    pub asset_name: String,
    pub address: String,
    pub restricted_type: RestrictedType,
}

impl RestrictedAddressEntry {
    pub fn identity_hash(&self) -> Hash256 {
        pair_identity(&self.asset_name, &self.address)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RestrictedGlobalEntry {
    pub asset_name: String,
    pub restricted_type: RestrictedType,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RestrictedVerifiersEntry {
    pub asset_name: String,
    pub verifier: String,
    /// Set when the entry restores a verifier while undoing a reissue.
    pub undoing_reissue: bool,
}

/// Double sha256 over `var_str(name) || var_str(address)`.
pub fn pair_identity(name: &str, address: &str) -> Hash256 {
    let mut encoder = Encoder::new();
    encoder.write_var_str(name);
    encoder.write_var_str(address);
    sha256d(&encoder.into_inner())
}

type PairKey = (String, String);

/// One entry in application order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JournalEntry<'a> {
    NewAsset(&'a NewAssetEntry),
    NewOwner(&'a NewOwnerEntry),
    Reissue(&'a ReissueAssetEntry),
    Transfer(&'a NewTransferEntry),
    UndoAmount(&'a UndoAssetAmountEntry),
    Spend(&'a SpendAssetEntry),
    QualifierAddress(&'a QualifierAddressEntry),
    RootQualifier(&'a RootQualifierCheckerEntry),
    RestrictedAddress(&'a RestrictedAddressEntry),
    RestrictedGlobal(&'a RestrictedGlobalEntry),
    RestrictedVerifiers(&'a RestrictedVerifiersEntry),
}

impl JournalEntry<'_> {
    pub fn asset_name(&self) -> &str {
        match self {
            JournalEntry::NewAsset(entry) => &entry.asset.name,
            JournalEntry::NewOwner(entry) => &entry.asset_name,
            JournalEntry::Reissue(entry) => &entry.reissue.name,
            JournalEntry::Transfer(entry) => &entry.transfer.name,
            JournalEntry::UndoAmount(entry) => &entry.asset_name,
            JournalEntry::Spend(entry) => &entry.asset_name,
            JournalEntry::QualifierAddress(entry) => &entry.asset_name,
            JournalEntry::RootQualifier(entry) => &entry.root_asset_name,
            JournalEntry::RestrictedAddress(entry) => &entry.asset_name,
            JournalEntry::RestrictedGlobal(entry) => &entry.asset_name,
            JournalEntry::RestrictedVerifiers(entry) => &entry.asset_name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            JournalEntry::NewAsset(_) => "new_asset",
            JournalEntry::NewOwner(_) => "new_owner",
            JournalEntry::Reissue(_) => "reissue",
            JournalEntry::Transfer(_) => "transfer",
            JournalEntry::UndoAmount(_) => "undo_amount",
            JournalEntry::Spend(_) => "spend",
            JournalEntry::QualifierAddress(_) => "qualifier_address",
            JournalEntry::RootQualifier(_) => "root_qualifier",
            JournalEntry::RestrictedAddress(_) => "restricted_address",
            JournalEntry::RestrictedGlobal(_) => "restricted_global",
            JournalEntry::RestrictedVerifiers(_) => "restricted_verifiers",
        }
    }
}

/// Every asset mutation produced while connecting one block.
#[derive(Clone, Debug, Default)]
pub struct BlockJournal {
    new_assets: BTreeMap<String, NewAssetEntry>,
    new_owners: BTreeMap<String, NewOwnerEntry>,
    reissues: BTreeMap<OutPoint, ReissueAssetEntry>,
    transfers: BTreeMap<OutPoint, NewTransferEntry>,
    undo_amounts: Vec<UndoAssetAmountEntry>,
    spends: Vec<SpendAssetEntry>,
    qualifier_addresses: BTreeMap<PairKey, QualifierAddressEntry>,
    root_qualifiers: BTreeMap<PairKey, RootQualifierCheckerEntry>,
    restricted_addresses: BTreeMap<PairKey, RestrictedAddressEntry>,
    restricted_globals: BTreeMap<String, RestrictedGlobalEntry>,
    restricted_verifiers: BTreeMap<String, RestrictedVerifiersEntry>,
}

impl BlockJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_new_asset(&mut self, entry: NewAssetEntry) -> Option<NewAssetEntry> {
        self.new_assets.insert(entry.asset.name.clone(), entry)
    }

    pub fn add_new_owner(&mut self, entry: NewOwnerEntry) -> Option<NewOwnerEntry> {
        self.new_owners.insert(entry.asset_name.clone(), entry)
    }

    pub fn add_reissue(&mut self, entry: ReissueAssetEntry) -> Option<ReissueAssetEntry> {
        self.reissues.insert(entry.outpoint, entry)
    }

    pub fn add_transfer(&mut self, entry: NewTransferEntry) -> Option<NewTransferEntry> {
        self.transfers.insert(entry.outpoint, entry)
    }

    pub fn add_undo_amount(&mut self, entry: UndoAssetAmountEntry) {
        self.undo_amounts.push(entry);
    }

    pub fn add_spend(&mut self, entry: SpendAssetEntry) {
        self.spends.push(entry);
    }

    pub fn add_qualifier_address(
        &mut self,
        entry: QualifierAddressEntry,
    ) -> Option<QualifierAddressEntry> {
        let key = (entry.asset_name.clone(), entry.address.clone());
        self.qualifier_addresses.insert(key, entry)
    }

    pub fn add_root_qualifier(
        &mut self,
        entry: RootQualifierCheckerEntry,
    ) -> Option<RootQualifierCheckerEntry> {
        let key = (entry.root_asset_name.clone(), entry.address.clone());
        self.root_qualifiers.insert(key, entry)
    }

    pub fn add_restricted_address(
        &mut self,
        entry: RestrictedAddressEntry,
    ) -> Option<RestrictedAddressEntry> {
        let key = (entry.asset_name.clone(), entry.address.clone());
        self.restricted_addresses.insert(key, entry)
    }

    pub fn add_restricted_global(
        &mut self,
        entry: RestrictedGlobalEntry,
    ) -> Option<RestrictedGlobalEntry> {
        self.restricted_globals.insert(entry.asset_name.clone(), entry)
    }

    pub fn add_restricted_verifiers(
        &mut self,
        entry: RestrictedVerifiersEntry,
    ) -> Option<RestrictedVerifiersEntry> {
        self.restricted_verifiers.insert(entry.asset_name.clone(), entry)
    }

    pub fn reissues(&self) -> impl Iterator<Item = &ReissueAssetEntry> + '_ {
        self.reissues.values()
    }

    pub fn transfers(&self) -> impl Iterator<Item = &NewTransferEntry> + '_ {
        self.transfers.values()
    }

    pub fn len(&self) -> usize {
        self.new_assets.len()
            + self.new_owners.len()
            + self.reissues.len()
            + self.transfers.len()
            + self.undo_amounts.len()
            + self.spends.len()
            + self.qualifier_addresses.len()
            + self.root_qualifiers.len()
            + self.restricted_addresses.len()
            + self.restricted_globals.len()
            + self.restricted_verifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in the order they are applied when the block connects:
    /// issuance, reissue, balance credits, balance debits, then tags,
    /// restrictions and verifiers. Within a kind, entries follow their key
    /// order; unordered kinds keep insertion order.
    pub fn connect_order(&self) -> Vec<JournalEntry<'_>> {
        let mut entries = Vec::with_capacity(self.len());
        entries.extend(self.new_assets.values().map(JournalEntry::NewAsset));
        entries.extend(self.new_owners.values().map(JournalEntry::NewOwner));
        entries.extend(self.reissues.values().map(JournalEntry::Reissue));
        entries.extend(self.transfers.values().map(JournalEntry::Transfer));
        entries.extend(self.undo_amounts.iter().map(JournalEntry::UndoAmount));
        entries.extend(self.spends.iter().map(JournalEntry::Spend));
        entries.extend(
            self.qualifier_addresses
                .values()
                .map(JournalEntry::QualifierAddress),
        );
        entries.extend(self.root_qualifiers.values().map(JournalEntry::RootQualifier));
        entries.extend(
            self.restricted_addresses
                .values()
                .map(JournalEntry::RestrictedAddress),
        );
        entries.extend(
            self.restricted_globals
                .values()
                .map(JournalEntry::RestrictedGlobal),
        );
        entries.extend(
            self.restricted_verifiers
                .values()
                .map(JournalEntry::RestrictedVerifiers),
        );
        entries
    }

    /// Exact reverse of [`BlockJournal::connect_order`].
    pub fn disconnect_order(&self) -> Vec<JournalEntry<'_>> {
        let mut entries = self.connect_order();
        entries.reverse();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outpoint(first: u8, index: u32) -> OutPoint {
        let mut hash = [0u8; 32];
        hash[0] = first;
        OutPoint::new(hash, index)
    }

    #[test]
    fn identity_hash_depends_on_both_parts() {
        let entry = QualifierAddressEntry {
            asset_name: "#KYC".into(),
            address: "addr".into(),
            qualifier_type: QualifierType::Add,
        };
        let removal = QualifierAddressEntry {
            qualifier_type: QualifierType::Remove,
            ..entry.clone()
        };
        assert_eq!(entry.identity_hash(), removal.identity_hash());

        let root = RootQualifierCheckerEntry {
            root_asset_name: "#KYC".into(),
            address: "addr".into(),
        };
        assert_eq!(root.identity_hash(), entry.identity_hash());
        assert_ne!(pair_identity("#KYC", "addr2"), entry.identity_hash());
        // var-str framing keeps the split point significant
        assert_ne!(pair_identity("AB", "C"), pair_identity("A", "BC"));
    }

    #[test]
    fn equal_key_replaces() {
        let mut journal = BlockJournal::new();
        let first = RestrictedGlobalEntry {
            asset_name: "$GOLD".into(),
            restricted_type: RestrictedType::GlobalFreeze,
        };
        assert!(journal.add_restricted_global(first.clone()).is_none());
        let second = RestrictedGlobalEntry {
            restricted_type: RestrictedType::GlobalUnfreeze,
            ..first.clone()
        };
        assert_eq!(journal.add_restricted_global(second.clone()), Some(first));
        assert_eq!(journal.len(), 1);
        assert_eq!(
            journal.connect_order(),
            vec![JournalEntry::RestrictedGlobal(&second)]
        );
    }

    #[test]
    fn unordered_kinds_keep_duplicates() {
        let mut journal = BlockJournal::new();
        let spend = SpendAssetEntry {
            asset_name: "GOLD".into(),
            address: "a".into(),
            amount: 5,
        };
        journal.add_spend(spend.clone());
        journal.add_spend(spend);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn transfers_follow_outpoint_order() {
        let mut journal = BlockJournal::new();
        for (first, index) in [(3u8, 1u32), (1, 7), (3, 0), (2, 0)] {
            journal.add_transfer(NewTransferEntry {
                transfer: AssetTransfer::new("GOLD", 1),
                address: "a".into(),
                outpoint: outpoint(first, index),
                block: None,
            });
        }
        let order: Vec<_> = journal.transfers().map(|entry| entry.outpoint).collect();
        assert_eq!(
            order,
            vec![outpoint(1, 7), outpoint(2, 0), outpoint(3, 0), outpoint(3, 1)]
        );
    }

    #[test]
    fn restricted_type_flags() {
        assert!(RestrictedType::GlobalFreeze.is_global());
        assert!(RestrictedType::GlobalFreeze.is_freeze());
        assert!(!RestrictedType::UnfreezeAddress.is_freeze());
        assert_eq!(RestrictedType::from_i32(4), None);
        assert_eq!(QualifierType::from_flag(1), Some(QualifierType::Add));
        assert_eq!(QualifierType::from_flag(-1), None);
    }
}
