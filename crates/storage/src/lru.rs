//! Bounded least-recently-used cache.
//!
//! Entries live in an index-stable arena (`slots` plus a free list) threaded by
//! a doubly-linked recency list; a hash map points each key at its slot. Every
//! operation is O(1) amortized. Not synchronized: callers sharing an instance
//! across threads wrap it in their own lock.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Returned by [`LruCache::get`] when the key is absent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyNotFound;

impl fmt::Display for KeyNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "there is no such key in cache")
    }
}

impl std::error::Error for KeyNotFound {}

struct Slot<K, V> {
    entry: Option<(K, V)>,
    prev: Option<usize>,
    next: Option<usize>,
}

pub struct LruCache<K, V> {
    map: HashMap<K, usize>,
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
    // most recently used
    head: Option<usize>,
    // least recently used
    tail: Option<usize>,
    max_size: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates a cache holding at most `max_size` entries. A size of zero is
    /// valid and keeps the cache permanently empty.
    pub fn new(max_size: usize) -> Self {
        Self {
            map: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            max_size,
        }
    }

    /// Inserts or replaces `key`, marking it most recently used. Evicts the
    /// least recently used entry when the population exceeds the maximum.
    pub fn put(&mut self, key: K, value: V) {
        if let Some(&index) = self.map.get(&key) {
            if let Some(entry) = self.slots[index].entry.as_mut() {
                entry.1 = value;
            }
            self.promote(index);
            return;
        }

        let index = self.allocate(key.clone(), value);
        self.map.insert(key, index);
        self.push_front(index);

        while self.map.len() > self.max_size {
            self.evict_tail();
        }
    }

    /// Returns the value for `key` and marks it most recently used.
    ///
    /// Absence is an error; check with [`LruCache::exists`] first when a missing
    /// key is an expected outcome.
    pub fn get<Q>(&mut self, key: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = *self.map.get(key).ok_or(KeyNotFound)?;
        self.promote(index);
        self.slots[index]
            .entry
            .as_ref()
            .map(|(_, value)| value)
            .ok_or(KeyNotFound)
    }

    pub fn erase<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(index) = self.map.remove(key) {
            self.unlink(index);
            self.release(index);
        }
    }

    /// Pure lookup; does not change recency.
    pub fn exists<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.map.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Changes the capacity, evicting least recently used entries if the cache
    /// is now over it.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.map.len() > self.max_size {
            self.evict_tail();
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let index = cursor?;
            let slot = &self.slots[index];
            cursor = slot.next;
            slot.entry.as_ref().map(|(key, _)| key)
        })
    }

    fn allocate(&mut self, key: K, value: V) -> usize {
        let slot = Slot {
            entry: Some((key, value)),
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = slot;
                index
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, index: usize) -> Option<(K, V)> {
        let entry = self.slots[index].entry.take();
        self.slots[index].prev = None;
        self.slots[index].next = None;
        self.free.push(index);
        entry
    }

    fn push_front(&mut self, index: usize) {
        self.slots[index].prev = None;
        self.slots[index].next = self.head;
        match self.head {
            Some(head) => self.slots[head].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
    }

    fn unlink(&mut self, index: usize) {
        let prev = self.slots[index].prev;
        let next = self.slots[index].next;
        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }
        self.slots[index].prev = None;
        self.slots[index].next = None;
    }

    fn promote(&mut self, index: usize) {
        if self.head == Some(index) {
            return;
        }
        self.unlink(index);
        self.push_front(index);
    }

    fn evict_tail(&mut self) {
        let Some(index) = self.tail else {
            return;
        };
        self.unlink(index);
        if let Some((key, _)) = self.release(index) {
            self.map.remove(&key);
        }
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("size", &self.map.len())
            .field("max_size", &self.max_size)
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
