use std::hash::{Hash, Hasher};

use ringheap_common::{Result, error::Error, verify_arg, verify_index};
use ringheap_memory::{ContentHasher, MemoryView};

use crate::config::CapacityPolicy;

/// A growable circular deque of fixed-size entries.
///
/// The logical sequence occupies `len` slots of the backing [`MemoryView`]
/// starting at `head` and wrapping past the end of the view. Every capacity
/// change re-expresses that window as the contiguous run `[0, len)`, so after
/// any resize `head() == 0` and the buffer is not segmented.
///
/// # Invariants
/// - `len <= capacity`.
/// - `head < capacity` whenever `capacity > 0`, and `head == 0` otherwise.
#[derive(Clone)]
pub struct RingBuffer {
    storage: MemoryView<'static>,
    head: usize,
    len: usize,
    policy: CapacityPolicy,
}

/// How `resize` moved the occupied window before reallocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Translation {
    /// Nothing stored; only `head` is reset.
    Empty,
    /// The window already starts at offset 0.
    Contiguous,
    /// Unsegmented window moved down to offset 0.
    Compact,
    /// Segmented window rejoined into one run at offset 0.
    Flatten,
}

impl Translation {
    fn as_str(self) -> &'static str {
        match self {
            Translation::Empty => "empty",
            Translation::Contiguous => "contiguous",
            Translation::Compact => "compact",
            Translation::Flatten => "flatten",
        }
    }
}

impl RingBuffer {
    /// Creates an empty buffer of `capacity` entries of `entry_size` bytes.
    pub fn new(entry_size: usize, capacity: usize) -> Result<RingBuffer> {
        Self::with_capacity_and_policy(entry_size, capacity, CapacityPolicy::default())
    }

    /// Creates an empty buffer with the default initial capacity.
    pub fn with_entry_size(entry_size: usize) -> Result<RingBuffer> {
        Self::with_policy(entry_size, CapacityPolicy::default())
    }

    /// Creates an empty buffer sized and shrunk according to `policy`.
    pub fn with_policy(entry_size: usize, policy: CapacityPolicy) -> Result<RingBuffer> {
        Self::with_capacity_and_policy(entry_size, policy.initial_capacity, policy)
    }

    pub fn with_capacity_and_policy(
        entry_size: usize,
        capacity: usize,
        policy: CapacityPolicy,
    ) -> Result<RingBuffer> {
        policy.validate()?;
        Ok(RingBuffer {
            storage: MemoryView::allocate(entry_size, capacity, true)?,
            head: 0,
            len: 0,
            policy,
        })
    }

    /// Creates a full buffer holding a copy of `bytes`, which must contain a whole
    /// number of entries.
    pub fn from_bytes(entry_size: usize, bytes: &[u8]) -> Result<RingBuffer> {
        Ok(Self::from_memory_view(MemoryView::from_copy(entry_size, bytes)?))
    }

    /// Adopts every entry of `view` as the buffer's contents, in offset order.
    ///
    /// An owned view is taken over without copying; a borrowed one is copied.
    pub fn from_memory_view(view: MemoryView<'_>) -> RingBuffer {
        let storage = view.into_owned();
        let len = storage.capacity();
        RingBuffer {
            storage,
            head: 0,
            len,
            policy: CapacityPolicy::default(),
        }
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

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Physical offset of the first logical entry.
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Whether the occupied window wraps past the end of the backing memory.
    #[inline]
    pub fn is_segmented(&self) -> bool {
        self.head + self.len > self.capacity()
    }

    pub fn policy(&self) -> &CapacityPolicy {
        &self.policy
    }

    /// Replaces the capacity policy. The current capacity is left as is.
    pub fn set_policy(&mut self, policy: CapacityPolicy) -> Result<()> {
        policy.validate()?;
        self.policy = policy;
        Ok(())
    }

    /// Translates a logical index into a physical offset.
    ///
    /// `index` must be below the capacity.
    #[inline]
    fn physical(&self, index: usize) -> usize {
        let offset = self.head + index;
        let capacity = self.capacity();
        if offset >= capacity {
            offset - capacity
        } else {
            offset
        }
    }

    /// Returns the entry at logical `index`.
    pub fn get(&self, index: usize) -> Result<&[u8]> {
        verify_index!(index, index, self.len);
        self.storage.entry(self.physical(index))
    }

    /// Returns the entry at logical `index` for in-place modification.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        verify_index!(index, index, self.len);
        let offset = self.physical(index);
        self.storage.entry_mut(offset)
    }

    /// Overwrites the entry at logical `index`.
    pub fn set(&mut self, index: usize, value: &[u8]) -> Result<()> {
        verify_arg!(value, value.len() == self.entry_size());
        verify_index!(index, index, self.len);
        let offset = self.physical(index);
        self.storage.write(offset, value)
    }

    pub fn get_typed<T>(&self, index: usize) -> Result<T>
    where
        T: bytemuck::AnyBitPattern,
    {
        verify_index!(index, index, self.len);
        self.storage.get(self.physical(index))
    }

    pub fn front(&self) -> Result<&[u8]> {
        if self.is_empty() {
            return Err(Error::empty("front"));
        }
        self.get(0)
    }

    pub fn back(&self) -> Result<&[u8]> {
        if self.is_empty() {
            return Err(Error::empty("back"));
        }
        self.get(self.len - 1)
    }

    /// Exchanges the entries at logical indices `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) -> Result<()> {
        verify_index!(i, i, self.len);
        verify_index!(j, j, self.len);
        let (a, b) = (self.physical(i), self.physical(j));
        self.storage.swap_entries(a, b)
    }

    /// Appends `value` after the last entry, growing the buffer when full.
    pub fn push_back(&mut self, value: &[u8]) -> Result<()> {
        verify_arg!(value, value.len() == self.entry_size());
        if self.is_full() {
            self.grow()?;
        }
        let offset = self.physical(self.len);
        self.storage.write(offset, value)?;
        self.len += 1;
        Ok(())
    }

    /// Inserts `value` before the first entry, growing the buffer when full.
    pub fn push_front(&mut self, value: &[u8]) -> Result<()> {
        verify_arg!(value, value.len() == self.entry_size());
        if self.is_full() {
            self.grow()?;
        }
        let head = if self.head == 0 {
            self.capacity() - 1
        } else {
            self.head - 1
        };
        self.storage.write(head, value)?;
        self.head = head;
        self.len += 1;
        Ok(())
    }

    pub fn push_back_typed<T>(&mut self, value: T) -> Result<()>
    where
        T: bytemuck::NoUninit,
    {
        self.push_back(bytemuck::bytes_of(&value))
    }

    pub fn push_front_typed<T>(&mut self, value: T) -> Result<()>
    where
        T: bytemuck::NoUninit,
    {
        self.push_front(bytemuck::bytes_of(&value))
    }

    /// Removes the first entry and returns it.
    ///
    /// The returned slice points into the vacated slot and stays valid until the
    /// next mutation of the buffer.
    pub fn pop_front(&mut self) -> Result<&[u8]> {
        if self.is_empty() {
            return Err(Error::empty("pop_front"));
        }
        let offset = self.head;
        self.head = self.physical(1);
        self.len -= 1;
        self.storage.entry(offset)
    }

    /// Removes the last entry and returns it.
    ///
    /// The returned slice points into the vacated slot and stays valid until the
    /// next mutation of the buffer.
    pub fn pop_back(&mut self) -> Result<&[u8]> {
        if self.is_empty() {
            return Err(Error::empty("pop_back"));
        }
        self.len -= 1;
        let offset = self.physical(self.len);
        self.storage.entry(offset)
    }

    pub fn pop_front_typed<T>(&mut self) -> Result<T>
    where
        T: bytemuck::AnyBitPattern,
    {
        verify_arg!(T, std::mem::size_of::<T>() == self.entry_size());
        self.pop_front().map(bytemuck::pod_read_unaligned)
    }

    pub fn pop_back_typed<T>(&mut self) -> Result<T>
    where
        T: bytemuck::AnyBitPattern,
    {
        verify_arg!(T, std::mem::size_of::<T>() == self.entry_size());
        self.pop_back().map(bytemuck::pod_read_unaligned)
    }

    /// Removes up to `n` entries from the front, in FIFO order.
    ///
    /// Asking for more entries than the buffer holds is not an error: the result
    /// then holds every remaining entry.
    pub fn pop_front_many(&mut self, n: usize) -> Result<Vec<Vec<u8>>> {
        let count = n.min(self.len);
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(self.pop_front()?.to_vec());
        }
        Ok(entries)
    }

    /// Removes every entry. The capacity is retained.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Drops the last `n` entries.
    pub fn truncate_back(&mut self, n: usize) -> Result<()> {
        verify_index!(n, n, self.len + 1);
        self.len -= n;
        if self.len == 0 {
            self.head = 0;
        }
        Ok(())
    }

    /// Iterates over the entries in logical order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            ring: self,
            front: 0,
            back: self.len,
        }
    }

    /// Copies the entries out in logical order.
    pub fn to_vec(&self) -> Vec<Vec<u8>> {
        self.iter().map(<[u8]>::to_vec).collect()
    }

    /// Copies the entries into one contiguous byte vector, in logical order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len * self.entry_size());
        for entry in self.iter() {
            bytes.extend_from_slice(entry);
        }
        bytes
    }

    /// Changes the capacity to `new_capacity` entries.
    ///
    /// The occupied window is first rejoined into the contiguous run `[0, len)`
    /// within the current capacity; the backing memory is then reallocated. After
    /// the call `head() == 0`, including when the reallocation fails.
    ///
    /// Fails with `InvalidArgument` when `new_capacity < len()`.
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        verify_arg!(new_capacity, new_capacity >= self.len);
        let old_capacity = self.capacity();
        let translation = self.normalize()?;
        log::debug!(
            "ring buffer resize ({}): {} -> {} entries, len {}",
            translation.as_str(),
            old_capacity,
            new_capacity,
            self.len
        );
        self.storage.set_capacity(new_capacity, true)
    }

    /// Doubles the capacity (minimum 1).
    pub fn grow(&mut self) -> Result<bool> {
        let capacity = self.policy.grown_capacity(self.capacity())?;
        self.resize(capacity)?;
        Ok(true)
    }

    /// Ensures room for `additional` more entries, growing to the next power of
    /// two that fits. Returns whether the buffer was resized.
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

    /// Halves the capacity when the buffer is sparsely occupied, never going
    /// below the policy's minimum. Returns whether the buffer was resized.
    pub fn shrink(&mut self) -> Result<bool> {
        match self.policy.shrunk_capacity(self.len, self.capacity()) {
            Some(capacity) => {
                self.resize(capacity)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Moves the occupied window to `[0, len)` without changing the capacity.
    fn normalize(&mut self) -> Result<Translation> {
        let translation = if self.len == 0 {
            Translation::Empty
        } else if self.head == 0 {
            Translation::Contiguous
        } else if !self.is_segmented() {
            self.storage.copy_range(self.head, 0, self.len)?;
            Translation::Compact
        } else {
            self.flatten()?;
            Translation::Flatten
        };
        self.head = 0;
        Ok(translation)
    }

    /// Rejoins a segmented window.
    ///
    /// The window consists of the upper fragment `[head, capacity)` followed by
    /// the lower fragment `[0, wrapped)`. The shorter one is stashed, the other is
    /// moved into its final place, and the stash is written back.
    fn flatten(&mut self) -> Result<()> {
        let upper = self.capacity() - self.head;
        let wrapped = self.len - upper;
        if upper <= wrapped {
            let stash = self.storage.range(self.head, upper)?.to_vec();
            self.storage.copy_range(0, upper, wrapped)?;
            self.storage.write_range(0, &stash)
        } else {
            let stash = self.storage.range(0, wrapped)?.to_vec();
            self.storage.copy_range(self.head, 0, upper)?;
            self.storage.write_range(upper, &stash)
        }
    }

    /// XXH3-64 hash of `(entry_size, len, entries in logical order)`.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = ContentHasher::new(self.entry_size(), self.len);
        for entry in self.iter() {
            hasher.update(entry);
        }
        hasher.finish()
    }
}

/// Logical-order iterator over a [`RingBuffer`].
pub struct Iter<'a> {
    ring: &'a RingBuffer,
    front: usize,
    back: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.front == self.back {
            return None;
        }
        let entry = self.ring.get(self.front).ok()?;
        self.front += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let entry = self.ring.get(self.back - 1).ok()?;
        self.back -= 1;
        Some(entry)
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a RingBuffer {
    type Item = &'a [u8];
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Buffers are equal when they hold the same entries in the same logical order,
/// regardless of capacity or physical layout.
impl PartialEq for RingBuffer {
    fn eq(&self, other: &RingBuffer) -> bool {
        self.entry_size() == other.entry_size()
            && self.len == other.len
            && self.iter().eq(other.iter())
    }
}

impl Eq for RingBuffer {}

impl Hash for RingBuffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entry_size().hash(state);
        self.len.hash(state);
        for entry in self.iter() {
            state.write(entry);
        }
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("entry_size", &self.entry_size())
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("head", &self.head)
            .field("entries", &self.to_vec())
            .finish()
    }
}
