//! Layout-independent content hashing for entry collections.

use xxhash_rust::xxh3::Xxh3;

/// Seed for the XXH3-64 content hash, shared by every collection so that equal
/// contents hash identically regardless of the collection type.
pub const CONTENT_HASH_SEED: u64 = 0x5269_6e67_4865_6170; // "RingHeap" in hex

/// Streaming XXH3-64 hasher over `(entry_size, count, entries...)`.
///
/// Entries must be fed in logical order; the physical layout of the collection
/// never enters the hash.
pub struct ContentHasher {
    inner: Xxh3,
}

impl ContentHasher {
    pub fn new(entry_size: usize, count: usize) -> ContentHasher {
        let mut inner = Xxh3::with_seed(CONTENT_HASH_SEED);
        inner.update(&(entry_size as u64).to_le_bytes());
        inner.update(&(count as u64).to_le_bytes());
        ContentHasher { inner }
    }

    #[inline]
    pub fn update(&mut self, entry: &[u8]) {
        self.inner.update(entry);
    }

    pub fn finish(&self) -> u64 {
        self.inner.digest()
    }
}
