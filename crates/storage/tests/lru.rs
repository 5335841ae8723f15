use evrd_storage::{KeyNotFound, LruCache};

#[test]
fn evicts_least_recently_used() {
    let mut cache = LruCache::new(2);
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("c", 3);

    assert!(!cache.exists(&"a"));
    assert_eq!(cache.get(&"b"), Ok(&2));
    assert_eq!(cache.get(&"c"), Ok(&3));

    // `c` was read last above; refresh `b` so `c` becomes the eviction victim.
    assert_eq!(cache.get(&"b"), Ok(&2));
    cache.put("d", 4);
    assert!(!cache.exists(&"c"));
    assert!(cache.exists(&"b"));
    assert!(cache.exists(&"d"));
    assert_eq!(cache.size(), 2);
}

#[test]
fn exists_does_not_refresh() {
    let mut cache = LruCache::new(2);
    cache.put(1u8, "one");
    cache.put(2u8, "two");
    assert!(cache.exists(&1));
    cache.put(3u8, "three");
    assert!(!cache.exists(&1));
    assert!(cache.exists(&2));
}

#[test]
fn put_refreshes_existing_key() {
    let mut cache = LruCache::new(2);
    cache.put(1u8, 10);
    cache.put(2u8, 20);
    cache.put(1u8, 11);
    cache.put(3u8, 30);
    assert_eq!(cache.get(&1), Ok(&11));
    assert!(!cache.exists(&2));
    assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
}

#[test]
fn get_missing_key_fails() {
    let mut cache: LruCache<String, u32> = LruCache::new(4);
    assert_eq!(cache.get("missing"), Err(KeyNotFound));
    assert_eq!(KeyNotFound.to_string(), "there is no such key in cache");
}

#[test]
fn zero_capacity_is_always_empty() {
    let mut cache = LruCache::new(0);
    cache.put("a", 1);
    assert_eq!(cache.size(), 0);
    assert!(!cache.exists(&"a"));
    assert_eq!(cache.max_size(), 0);
}

#[test]
fn erase_and_clear() {
    let mut cache = LruCache::new(3);
    cache.put('x', 1);
    cache.put('y', 2);
    cache.erase(&'x');
    cache.erase(&'z');
    assert_eq!(cache.size(), 1);
    assert!(!cache.exists(&'x'));

    cache.clear();
    assert_eq!(cache.size(), 0);
    assert_eq!(cache.max_size(), 3);
    cache.put('q', 9);
    assert_eq!(cache.get(&'q'), Ok(&9));
}

#[test]
fn shrinking_evicts_oldest() {
    let mut cache = LruCache::new(3);
    cache.put(1u32, ());
    cache.put(2u32, ());
    cache.put(3u32, ());
    cache.set_max_size(1);
    assert_eq!(cache.size(), 1);
    assert!(cache.exists(&3));
}
