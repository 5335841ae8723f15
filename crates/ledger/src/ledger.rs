//! Asset ledger state backed by a [`KeyValueStore`].
//!
//! `connect_block` turns a block's journal into a [`WriteBatch`] plus an
//! undo record stored under the block hash; `disconnect_block` consumes that
//! record to restore the previous state. Neither writes to the store: callers
//! hand the batch to [`AssetLedger::commit_batch`], which also keeps the
//! lookup caches coherent.

use std::collections::HashSet;
use std::sync::Mutex;

use evrd_assets::{
    AssetError, AssetStateView, BlockJournal, BlockRef, DatabasedAssetData, JournalEntry,
    QualifierType, TollTracker,
};
use evrd_consensus::constants::OWNER_ASSET_AMOUNT;
use evrd_consensus::{money_range, Amount, Hash256};
use evrd_log::{log_debug, log_info, log_trace, log_warn};
use evrd_primitives::encoding::{decode, encode, DecodeError, Decoder};
use evrd_storage::{Column, KeyValueStore, LruCache, WriteBatch, WriteOp};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::undo::{AssetBlockUndo, FlagUndo};

const FLAG_SET: [u8; 1] = [1];

pub struct AssetLedger<S> {
    store: S,
    asset_cache: Mutex<LruCache<String, DatabasedAssetData>>,
    verifier_cache: Mutex<LruCache<String, Option<String>>>,
}

/// First-touch snapshots collected while building a connect batch.
#[derive(Default)]
struct UndoBuilder {
    undo: AssetBlockUndo,
    seen_assets: HashSet<String>,
    seen_flags: HashSet<(Column, Vec<u8>)>,
    seen_verifiers: HashSet<String>,
}

impl<S: KeyValueStore> AssetLedger<S> {
    pub fn new(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            asset_cache: Mutex::new(LruCache::new(config.asset_cache_entries)),
            verifier_cache: Mutex::new(LruCache::new(config.verifier_cache_entries)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Committed metadata for `name`.
    pub fn asset(&self, name: &str) -> Result<Option<DatabasedAssetData>, LedgerError> {
        if let Ok(mut cache) = self.asset_cache.lock() {
            if cache.exists(name) {
                if let Ok(data) = cache.get(name) {
                    return Ok(Some(data.clone()));
                }
            }
        }
        let Some(bytes) = self.store.get(Column::AssetMeta, name.as_bytes())? else {
            return Ok(None);
        };
        let data = DatabasedAssetData::decode(&bytes)?;
        if let Ok(mut cache) = self.asset_cache.lock() {
            cache.put(name.to_string(), data.clone());
        }
        Ok(Some(data))
    }

    pub fn balance(&self, name: &str, address: &str) -> Result<Amount, LedgerError> {
        match self.store.get(Column::AssetBalance, &pair_key(name, address))? {
            Some(bytes) => Ok(decode_balance(&bytes)?),
            None => Ok(0),
        }
    }

    /// Every address holding a non-zero balance of `name`, ordered by address.
    pub fn holders(&self, name: &str) -> Result<Vec<(String, Amount)>, LedgerError> {
        let prefix = pair_key(name, "");
        let mut out = Vec::new();
        for (key, value) in self.store.scan_prefix(Column::AssetBalance, &prefix)? {
            let address = String::from_utf8(key[prefix.len()..].to_vec())
                .map_err(|_| DecodeError::InvalidData("invalid address in balance key"))?;
            out.push((address, decode_balance(&value)?));
        }
        Ok(out)
    }

    pub fn verifier(&self, restricted_name: &str) -> Result<Option<String>, LedgerError> {
        if let Ok(mut cache) = self.verifier_cache.lock() {
            if let Ok(verifier) = cache.get(restricted_name) {
                return Ok(verifier.clone());
            }
        }
        let verifier = match self.store.get(Column::Verifier, restricted_name.as_bytes())? {
            Some(bytes) => Some(
                String::from_utf8(bytes)
                    .map_err(|_| DecodeError::InvalidData("invalid verifier string"))?,
            ),
            None => None,
        };
        if let Ok(mut cache) = self.verifier_cache.lock() {
            cache.put(restricted_name.to_string(), verifier.clone());
        }
        Ok(verifier)
    }

    pub fn toll_tracker(&self, name: &str) -> Result<Option<TollTracker>, LedgerError> {
        match self.store.get(Column::TollTracker, name.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn has_block_undo(&self, block_hash: &Hash256) -> Result<bool, LedgerError> {
        Ok(self.store.get(Column::AssetUndo, block_hash)?.is_some())
    }

    /// Builds the batch that applies `journal` for `block`.
    pub fn connect_block(
        &self,
        journal: &BlockJournal,
        block: BlockRef,
    ) -> Result<WriteBatch, LedgerError> {
        let mut batch = WriteBatch::new();
        let mut undo = UndoBuilder::default();

        for entry in journal.connect_order() {
            log_trace!(
                "connect {} entry for '{}' at height {}",
                entry.kind(),
                entry.asset_name(),
                block.height
            );
            match entry {
                JournalEntry::NewAsset(entry) => {
                    let name = &entry.asset.name;
                    if self.pending_asset(&batch, name)?.is_some() {
                        return Err(LedgerError::DuplicateAsset(name.clone()));
                    }
                    undo.asset(name, None);
                    let data = DatabasedAssetData::new(
                        entry.asset.clone(),
                        entry.block.height,
                        entry.block.hash,
                    );
                    batch.put(Column::AssetMeta, name.as_bytes(), data.encode());
                    self.credit(&mut batch, name, &entry.address, entry.asset.amount)?;
                }
                JournalEntry::NewOwner(entry) => {
                    self.credit(&mut batch, &entry.asset_name, &entry.address, OWNER_ASSET_AMOUNT)?;
                }
                JournalEntry::Reissue(entry) => {
                    let name = &entry.reissue.name;
                    let Some(mut data) = self.pending_asset(&batch, name)? else {
                        return Err(LedgerError::MissingAsset(name.clone()));
                    };
                    undo.asset(name, Some(&data));
                    data.asset.apply_reissue(&entry.reissue)?;
                    data.height = entry.block.height;
                    data.block_hash = entry.block.hash;
                    batch.put(Column::AssetMeta, name.as_bytes(), data.encode());
                    self.credit(&mut batch, name, &entry.address, entry.reissue.amount)?;
                }
                JournalEntry::Transfer(entry) => {
                    self.credit(
                        &mut batch,
                        &entry.transfer.name,
                        &entry.address,
                        entry.transfer.amount,
                    )?;
                }
                JournalEntry::UndoAmount(entry) => {
                    self.credit(&mut batch, &entry.asset_name, &entry.address, entry.amount)?;
                }
                JournalEntry::Spend(entry) => {
                    self.debit(&mut batch, &entry.asset_name, &entry.address, entry.amount)?;
                    self.track_toll(&mut batch, &entry.asset_name, entry.amount)?;
                }
                JournalEntry::QualifierAddress(entry) => {
                    let key = pair_key(&entry.asset_name, &entry.address);
                    undo.flag(self, &batch, Column::AddressQualifier, &key)?;
                    match entry.qualifier_type {
                        QualifierType::Add => batch.put(Column::AddressQualifier, key, FLAG_SET),
                        QualifierType::Remove => batch.delete(Column::AddressQualifier, key),
                    }
                }
                JournalEntry::RootQualifier(entry) => {
                    let key = pair_key(&entry.root_asset_name, &entry.address);
                    undo.flag(self, &batch, Column::RootQualifier, &key)?;
                    batch.put(Column::RootQualifier, key, FLAG_SET);
                }
                JournalEntry::RestrictedAddress(entry) => {
                    let key = pair_key(&entry.asset_name, &entry.address);
                    undo.flag(self, &batch, Column::AddressRestriction, &key)?;
                    if entry.restricted_type.is_freeze() {
                        batch.put(Column::AddressRestriction, key, FLAG_SET);
                    } else {
                        batch.delete(Column::AddressRestriction, key);
                    }
                }
                JournalEntry::RestrictedGlobal(entry) => {
                    let key = entry.asset_name.as_bytes();
                    undo.flag(self, &batch, Column::GlobalRestriction, key)?;
                    if entry.restricted_type.is_freeze() {
                        batch.put(Column::GlobalRestriction, key, FLAG_SET);
                    } else {
                        batch.delete(Column::GlobalRestriction, key);
                    }
                }
                JournalEntry::RestrictedVerifiers(entry) => {
                    let name = &entry.asset_name;
                    if !undo.seen_verifiers.contains(name.as_str()) {
                        let prev = self.pending_verifier(&batch, name)?;
                        undo.verifier(name, prev);
                    }
                    if entry.undoing_reissue {
                        log_debug!("restoring verifier of '{name}' from an undone reissue");
                    }
                    batch.put(Column::Verifier, name.as_bytes(), entry.verifier.as_bytes());
                }
            }
        }

        let undo = undo.undo;
        batch.put(Column::AssetUndo, block.hash, undo.encode());
        log_info!(
            "asset block connected height {} hash {} entries {} ops {}",
            block.height,
            hash256_to_hex(&block.hash),
            journal.len(),
            batch.len()
        );
        Ok(batch)
    }

    /// Builds the batch that reverts a block previously applied with
    /// [`AssetLedger::connect_block`] from the same journal.
    pub fn disconnect_block(
        &self,
        journal: &BlockJournal,
        block_hash: &Hash256,
    ) -> Result<WriteBatch, LedgerError> {
        let Some(undo_bytes) = self.store.get(Column::AssetUndo, block_hash)? else {
            log_warn!("no asset undo for block {}", hash256_to_hex(block_hash));
            return Err(LedgerError::MissingUndo(hash256_to_hex(block_hash)));
        };
        let undo = AssetBlockUndo::decode(&undo_bytes)?;
        let mut batch = WriteBatch::new();

        for entry in journal.disconnect_order() {
            log_trace!(
                "disconnect {} entry for '{}'",
                entry.kind(),
                entry.asset_name()
            );
            match entry {
                JournalEntry::NewAsset(entry) => {
                    self.debit(&mut batch, &entry.asset.name, &entry.address, entry.asset.amount)?;
                }
                JournalEntry::NewOwner(entry) => {
                    self.debit(&mut batch, &entry.asset_name, &entry.address, OWNER_ASSET_AMOUNT)?;
                }
                JournalEntry::Reissue(entry) => {
                    self.debit(
                        &mut batch,
                        &entry.reissue.name,
                        &entry.address,
                        entry.reissue.amount,
                    )?;
                }
                JournalEntry::Transfer(entry) => {
                    self.debit(
                        &mut batch,
                        &entry.transfer.name,
                        &entry.address,
                        entry.transfer.amount,
                    )?;
                }
                JournalEntry::UndoAmount(entry) => {
                    self.debit(&mut batch, &entry.asset_name, &entry.address, entry.amount)?;
                }
                JournalEntry::Spend(entry) => {
                    self.credit(&mut batch, &entry.asset_name, &entry.address, entry.amount)?;
                }
                JournalEntry::QualifierAddress(_)
                | JournalEntry::RootQualifier(_)
                | JournalEntry::RestrictedAddress(_)
                | JournalEntry::RestrictedGlobal(_)
                | JournalEntry::RestrictedVerifiers(_) => {}
            }
        }

        for (name, prev) in &undo.assets {
            match prev {
                Some(data) => batch.put(Column::AssetMeta, name.as_bytes(), data.encode()),
                None => batch.delete(Column::AssetMeta, name.as_bytes()),
            }
        }
        for flag in &undo.flags {
            if flag.was_set {
                batch.put(flag.column, flag.key.as_slice(), FLAG_SET);
            } else {
                batch.delete(flag.column, flag.key.as_slice());
            }
        }
        for (name, prev) in &undo.verifiers {
            match prev {
                Some(verifier) => batch.put(Column::Verifier, name.as_bytes(), verifier.as_bytes()),
                None => batch.delete(Column::Verifier, name.as_bytes()),
            }
        }
        batch.delete(Column::AssetUndo, *block_hash);

        log_info!(
            "asset block disconnected hash {} entries {} restored {}",
            hash256_to_hex(block_hash),
            journal.len(),
            undo.assets.len() + undo.flags.len() + undo.verifiers.len()
        );
        Ok(batch)
    }

    /// Writes `batch` and drops cached entries it touched.
    pub fn commit_batch(&self, batch: WriteBatch) -> Result<(), LedgerError> {
        self.store.write_batch(&batch)?;

        let ops = batch.into_ops();
        if let Ok(mut cache) = self.asset_cache.lock() {
            for op in &ops {
                if op.column() == Column::AssetMeta {
                    if let Ok(name) = std::str::from_utf8(op.key()) {
                        cache.erase(name);
                    }
                }
            }
        }
        if let Ok(mut cache) = self.verifier_cache.lock() {
            for op in &ops {
                if op.column() != Column::Verifier {
                    continue;
                }
                let Ok(name) = std::str::from_utf8(op.key()) else {
                    continue;
                };
                match op {
                    WriteOp::Put { value, .. } => {
                        let verifier = String::from_utf8(value.clone()).ok();
                        cache.put(name.to_string(), verifier);
                    }
                    WriteOp::Delete { .. } => cache.put(name.to_string(), None),
                }
            }
        }
        Ok(())
    }

    fn pending_asset(
        &self,
        batch: &WriteBatch,
        name: &str,
    ) -> Result<Option<DatabasedAssetData>, LedgerError> {
        match batch.pending(Column::AssetMeta, name.as_bytes()) {
            Some(Some(bytes)) => Ok(Some(DatabasedAssetData::decode(bytes)?)),
            Some(None) => Ok(None),
            None => self.asset(name),
        }
    }

    fn pending_verifier(
        &self,
        batch: &WriteBatch,
        name: &str,
    ) -> Result<Option<String>, LedgerError> {
        match batch.pending(Column::Verifier, name.as_bytes()) {
            Some(Some(bytes)) => Ok(Some(
                String::from_utf8(bytes.to_vec())
                    .map_err(|_| DecodeError::InvalidData("invalid verifier string"))?,
            )),
            Some(None) => Ok(None),
            None => self.verifier(name),
        }
    }

    fn pending_flag(
        &self,
        batch: &WriteBatch,
        column: Column,
        key: &[u8],
    ) -> Result<bool, LedgerError> {
        match batch.pending(column, key) {
            Some(value) => Ok(value.is_some()),
            None => Ok(self.store.get(column, key)?.is_some()),
        }
    }

    fn pending_balance(
        &self,
        batch: &WriteBatch,
        key: &[u8],
    ) -> Result<Amount, LedgerError> {
        match batch.pending(Column::AssetBalance, key) {
            Some(Some(bytes)) => Ok(decode_balance(bytes)?),
            Some(None) => Ok(0),
            None => match self.store.get(Column::AssetBalance, key)? {
                Some(bytes) => Ok(decode_balance(&bytes)?),
                None => Ok(0),
            },
        }
    }

    fn credit(
        &self,
        batch: &mut WriteBatch,
        name: &str,
        address: &str,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let key = pair_key(name, address);
        let balance = self.pending_balance(batch, &key)?;
        let updated = balance
            .checked_add(amount)
            .filter(|value| money_range(*value))
            .ok_or(LedgerError::InvalidAmount(amount))?;
        write_balance(batch, key, updated);
        Ok(())
    }

    fn debit(
        &self,
        batch: &mut WriteBatch,
        name: &str,
        address: &str,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let key = pair_key(name, address);
        let balance = self.pending_balance(batch, &key)?;
        if balance < amount {
            log_warn!("refusing to debit {amount} of '{name}' from {address}: balance {balance}");
            return Err(LedgerError::InsufficientBalance {
                asset: name.to_string(),
                address: address.to_string(),
                balance,
                amount,
            });
        }
        write_balance(batch, key, balance - amount);
        Ok(())
    }

    /// Adds a spend to the asset's toll totals when it charges a toll.
    fn track_toll(
        &self,
        batch: &mut WriteBatch,
        name: &str,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let Some(data) = self.pending_asset(batch, name)? else {
            return Ok(());
        };
        let asset = &data.asset;
        if !asset.is_toll_version() || asset.toll_amount <= 0 {
            return Ok(());
        }
        let mut tracker = match batch.pending(Column::TollTracker, name.as_bytes()) {
            Some(Some(bytes)) => decode::<TollTracker>(bytes)?,
            Some(None) => TollTracker::new(name, asset.toll_amount, asset.toll_address.clone()),
            None => self.toll_tracker(name)?.unwrap_or_else(|| {
                TollTracker::new(name, asset.toll_amount, asset.toll_address.clone())
            }),
        };
        tracker.toll_fee = asset.toll_amount;
        tracker.toll_address = asset.toll_address.clone();
        let toll = tracker.record_spend(amount);
        log_trace!("toll {toll} owed on {amount} of '{name}'");
        batch.put(Column::TollTracker, name.as_bytes(), encode(&tracker));
        Ok(())
    }
}

impl UndoBuilder {
    fn asset(&mut self, name: &str, prev: Option<&DatabasedAssetData>) {
        if self.seen_assets.insert(name.to_string()) {
            self.undo.assets.push((name.to_string(), prev.cloned()));
        }
    }

    fn verifier(&mut self, name: &str, prev: Option<String>) {
        if self.seen_verifiers.insert(name.to_string()) {
            self.undo.verifiers.push((name.to_string(), prev));
        }
    }

    fn flag<S: KeyValueStore>(
        &mut self,
        ledger: &AssetLedger<S>,
        batch: &WriteBatch,
        column: Column,
        key: &[u8],
    ) -> Result<(), LedgerError> {
        if self.seen_flags.contains(&(column, key.to_vec())) {
            return Ok(());
        }
        let was_set = ledger.pending_flag(batch, column, key)?;
        self.seen_flags.insert((column, key.to_vec()));
        self.undo.flags.push(FlagUndo {
            column,
            key: key.to_vec(),
            was_set,
        });
        Ok(())
    }
}

impl<S: KeyValueStore> AssetStateView for AssetLedger<S> {
    fn asset_exists(&self, name: &str) -> Result<bool, AssetError> {
        self.asset(name)
            .map(|data| data.is_some())
            .map_err(lookup_error)
    }

    fn verifier_string(&self, restricted_name: &str) -> Result<Option<String>, AssetError> {
        self.verifier(restricted_name).map_err(lookup_error)
    }

    fn has_qualifier(&self, address: &str, qualifier: &str) -> Result<bool, AssetError> {
        self.store
            .get(Column::AddressQualifier, &pair_key(qualifier, address))
            .map(|value| value.is_some())
            .map_err(|err| AssetError::Lookup(err.to_string()))
    }

    fn is_address_frozen(&self, restricted_name: &str, address: &str) -> Result<bool, AssetError> {
        self.store
            .get(Column::AddressRestriction, &pair_key(restricted_name, address))
            .map(|value| value.is_some())
            .map_err(|err| AssetError::Lookup(err.to_string()))
    }

    fn is_globally_frozen(&self, restricted_name: &str) -> Result<bool, AssetError> {
        self.store
            .get(Column::GlobalRestriction, restricted_name.as_bytes())
            .map(|value| value.is_some())
            .map_err(|err| AssetError::Lookup(err.to_string()))
    }
}

fn lookup_error(err: LedgerError) -> AssetError {
    AssetError::Lookup(err.to_string())
}

/// `name || 0x00 || address`; asset names never contain a zero byte.
fn pair_key(name: &str, address: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(name.len() + 1 + address.len());
    key.extend_from_slice(name.as_bytes());
    key.push(0);
    key.extend_from_slice(address.as_bytes());
    key
}

fn decode_balance(bytes: &[u8]) -> Result<Amount, DecodeError> {
    let mut decoder = Decoder::new(bytes);
    let balance = decoder.read_i64_le()?;
    if !decoder.is_empty() {
        return Err(DecodeError::TrailingBytes);
    }
    Ok(balance)
}

fn write_balance(batch: &mut WriteBatch, key: Vec<u8>, balance: Amount) {
    if balance == 0 {
        batch.delete(Column::AssetBalance, key);
    } else {
        batch.put(Column::AssetBalance, key, balance.to_le_bytes());
    }
}

fn hash256_to_hex(hash: &Hash256) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(64);
    for byte in hash.iter().rev() {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
