use std::hash::{Hash, Hasher};

use ringheap_common::{Result, error::Error, verify_arg, verify_index};
use ringheap_memory::{ContentHasher, MemoryView};

use crate::config::CapacityPolicy;

/// A LIFO stack of fixed-size entries.
///
/// Entries occupy `[0, len)` of the backing view, bottom first, so the stack
/// never wraps and its bytes can be handed out as one slice.
#[derive(Clone)]
pub struct EntryStack {
    storage: MemoryView<'static>,
    len: usize,
    policy: CapacityPolicy,
}

impl EntryStack {
    pub fn new(entry_size: usize, capacity: usize) -> Result<EntryStack> {
        Ok(EntryStack {
            storage: MemoryView::allocate(entry_size, capacity, true)?,
            len: 0,
            policy: CapacityPolicy::default(),
        })
    }

    pub fn with_entry_size(entry_size: usize) -> Result<EntryStack> {
        Self::with_policy(entry_size, CapacityPolicy::default())
    }

    pub fn with_policy(entry_size: usize, policy: CapacityPolicy) -> Result<EntryStack> {
        policy.validate()?;
        Ok(EntryStack {
            storage: MemoryView::allocate(entry_size, policy.initial_capacity, true)?,
            len: 0,
            policy,
        })
    }

    /// Creates a full stack from `bytes`; the last entry ends up on top.
    pub fn from_bytes(entry_size: usize, bytes: &[u8]) -> Result<EntryStack> {
        let storage = MemoryView::from_copy(entry_size, bytes)?;
        let len = storage.capacity();
        Ok(EntryStack {
            storage,
            len,
            policy: CapacityPolicy::default(),
        })
    }

    #[inline]
    pub fn entry_size(&self) -> usize {
        self.storage.entry_size()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, value: &[u8]) -> Result<()> {
        verify_arg!(value, value.len() == self.entry_size());
        if self.len == self.capacity() {
            self.grow()?;
        }
        self.storage.write(self.len, value)?;
        self.len += 1;
        Ok(())
    }

    pub fn push_typed<T>(&mut self, value: T) -> Result<()>
    where
        T: bytemuck::NoUninit,
    {
        self.push(bytemuck::bytes_of(&value))
    }

    /// Removes the top entry and returns it.
    pub fn pop(&mut self) -> Result<&[u8]> {
        if self.is_empty() {
            return Err(Error::empty("pop"));
        }
        self.len -= 1;
        self.storage.entry(self.len)
    }

    pub fn pop_typed<T>(&mut self) -> Result<T>
    where
        T: bytemuck::AnyBitPattern,
    {
        verify_arg!(T, std::mem::size_of::<T>() == self.entry_size());
        self.pop().map(bytemuck::pod_read_unaligned)
    }

    pub fn peek(&self) -> Result<&[u8]> {
        if self.is_empty() {
            return Err(Error::empty("peek"));
        }
        self.storage.entry(self.len - 1)
    }

    /// Entry at `index`, counted from the bottom of the stack.
    pub fn get(&self, index: usize) -> Result<&[u8]> {
        verify_index!(index, index, self.len);
        self.storage.entry(index)
    }

    pub fn set(&mut self, index: usize, value: &[u8]) -> Result<()> {
        verify_arg!(value, value.len() == self.entry_size());
        verify_index!(index, index, self.len);
        self.storage.write(index, value)
    }

    /// Exchanges the entries at bottom-based indices `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) -> Result<()> {
        verify_index!(i, i, self.len);
        verify_index!(j, j, self.len);
        self.storage.swap_entries(i, j)
    }

    /// Overwrites the entry at `dst` with a copy of the entry at `src`.
    pub fn duplicate(&mut self, src: usize, dst: usize) -> Result<()> {
        verify_index!(src, src, self.len);
        verify_index!(dst, dst, self.len);
        self.storage.copy_entry(src, dst)
    }

    /// Drops the top `n` entries. Fails with `OutOfBounds` when `n > len()`.
    pub fn truncate(&mut self, n: usize) -> Result<()> {
        verify_index!(n, n, self.len + 1);
        self.len -= n;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Changes the capacity. Fails with `InvalidArgument` when `new_capacity < len()`.
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        verify_arg!(new_capacity, new_capacity >= self.len);
        log::debug!(
            "entry stack resize: {} -> {} entries, len {}",
            self.capacity(),
            new_capacity,
            self.len
        );
        self.storage.set_capacity(new_capacity, true)
    }

    pub fn grow(&mut self) -> Result<bool> {
        let capacity = self.policy.grown_capacity(self.capacity())?;
        self.resize(capacity)?;
        Ok(true)
    }

    pub fn grow_to_fit(&mut self, additional: usize) -> Result<bool> {
        match self
            .policy
            .capacity_to_fit(self.len, additional, self.capacity())?
        {
            Some(capacity) => {
                self.resize(capacity)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn shrink(&mut self) -> Result<bool> {
        match self.policy.shrunk_capacity(self.len, self.capacity()) {
            Some(capacity) => {
                self.resize(capacity)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The stored entries, bottom first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage.as_bytes()[..self.len * self.entry_size()]
    }

    /// XXH3-64 hash of `(entry_size, len, entries bottom first)`.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = ContentHasher::new(self.entry_size(), self.len);
        hasher.update(self.as_bytes());
        hasher.finish()
    }
}

impl PartialEq for EntryStack {
    fn eq(&self, other: &EntryStack) -> bool {
        self.entry_size() == other.entry_size()
            && self.len == other.len
            && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for EntryStack {}

impl Hash for EntryStack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entry_size().hash(state);
        self.len.hash(state);
        state.write(self.as_bytes());
    }
}

impl std::fmt::Debug for EntryStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStack")
            .field("entry_size", &self.entry_size())
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("bytes", &self.as_bytes())
            .finish()
    }
}
