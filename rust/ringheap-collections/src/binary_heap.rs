use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use ringheap_common::{Result, error::Error, verify_arg};

use crate::{comparator::EntryComparator, ring_buffer::RingBuffer};

/// A binary heap of fixed-size entries stored in a [`RingBuffer`].
///
/// The comparator fully determines the extraction order: the entry that
/// compares `Less` than every other one is at the top. Parent and child
/// positions are logical ring indices, so the heap never depends on the
/// physical layout of its storage.
#[derive(Clone)]
pub struct BinaryHeap<C> {
    ring: RingBuffer,
    comparator: C,
}

impl<C: EntryComparator> BinaryHeap<C> {
    /// Creates an empty heap with the default initial capacity.
    ///
    /// Fails with `InvalidArgument` when `comparator` only orders entries of a
    /// different size.
    pub fn new(entry_size: usize, comparator: C) -> Result<BinaryHeap<C>> {
        check_entry_size(entry_size, &comparator)?;
        Ok(BinaryHeap {
            ring: RingBuffer::with_entry_size(entry_size)?,
            comparator,
        })
    }

    pub fn with_capacity(entry_size: usize, capacity: usize, comparator: C) -> Result<BinaryHeap<C>> {
        check_entry_size(entry_size, &comparator)?;
        Ok(BinaryHeap {
            ring: RingBuffer::new(entry_size, capacity)?,
            comparator,
        })
    }

    /// Takes over the entries of `ring` and arranges them into heap order.
    pub fn from_ring(mut ring: RingBuffer, comparator: C) -> Result<BinaryHeap<C>> {
        check_entry_size(ring.entry_size(), &comparator)?;
        heapify(&mut ring, &comparator)?;
        Ok(BinaryHeap { ring, comparator })
    }

    #[inline]
    pub fn entry_size(&self) -> usize {
        self.ring.entry_size()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// The underlying storage, in heap order.
    pub fn as_ring(&self) -> &RingBuffer {
        &self.ring
    }

    pub fn into_ring(self) -> RingBuffer {
        self.ring
    }

    pub fn insert(&mut self, value: &[u8]) -> Result<()> {
        self.ring.push_back(value)?;
        let last = self.ring.len() - 1;
        sift_up(&mut self.ring, &self.comparator, last)
    }

    pub fn insert_typed<T>(&mut self, value: T) -> Result<()>
    where
        T: bytemuck::NoUninit,
    {
        self.insert(bytemuck::bytes_of(&value))
    }

    /// Inserts every entry of `bytes`, which must hold a whole number of entries.
    pub fn insert_many(&mut self, bytes: &[u8]) -> Result<()> {
        let entry_size = self.entry_size();
        verify_arg!(bytes, bytes.len() % entry_size == 0);
        self.ring.grow_to_fit(bytes.len() / entry_size)?;
        for value in bytes.chunks_exact(entry_size) {
            self.insert(value)?;
        }
        Ok(())
    }

    /// Returns the top entry without removing it.
    pub fn peek(&self) -> Result<&[u8]> {
        if self.is_empty() {
            return Err(Error::empty("peek"));
        }
        self.ring.get(0)
    }

    pub fn peek_typed<T>(&self) -> Result<T>
    where
        T: bytemuck::AnyBitPattern,
    {
        if self.is_empty() {
            return Err(Error::empty("peek"));
        }
        self.ring.get_typed(0)
    }

    /// Removes the top entry and returns it.
    ///
    /// The returned slice points into the vacated slot and stays valid until the
    /// next mutation of the heap.
    pub fn extract_top(&mut self) -> Result<&[u8]> {
        extract_top(&mut self.ring, &self.comparator)
    }

    pub fn extract_top_typed<T>(&mut self) -> Result<T>
    where
        T: bytemuck::AnyBitPattern,
    {
        verify_arg!(T, std::mem::size_of::<T>() == self.entry_size());
        self.extract_top().map(bytemuck::pod_read_unaligned)
    }

    /// Removes up to `n` entries, in extraction order.
    ///
    /// Asking for more entries than the heap holds is not an error: the result
    /// then holds every remaining entry and the heap is left empty.
    pub fn extract_many(&mut self, n: usize) -> Result<Vec<Vec<u8>>> {
        let count = n.min(self.len());
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(self.extract_top()?.to_vec());
        }
        Ok(entries)
    }

    /// Every entry in extraction order. The heap itself is left untouched.
    pub fn to_sorted_vec(&self) -> Result<Vec<Vec<u8>>> {
        let mut ring = self.ring.clone();
        let mut entries = Vec::with_capacity(ring.len());
        while !ring.is_empty() {
            entries.push(extract_top(&mut ring, &self.comparator)?.to_vec());
        }
        Ok(entries)
    }

    pub fn clear(&mut self) {
        self.ring.clear();
    }

    /// Changes the capacity. Fails with `InvalidArgument` when `new_capacity < len()`.
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        self.ring.resize(new_capacity)
    }

    pub fn grow(&mut self) -> Result<bool> {
        self.ring.grow()
    }

    pub fn grow_to_fit(&mut self, additional: usize) -> Result<bool> {
        self.ring.grow_to_fit(additional)
    }

    pub fn shrink(&mut self) -> Result<bool> {
        self.ring.shrink()
    }

    /// XXH3-64 hash of the entries in storage order.
    pub fn content_hash(&self) -> u64 {
        self.ring.content_hash()
    }
}

/// Heaps are equal when their storage holds the same entries in the same order.
/// Comparators are not compared.
impl<C> PartialEq for BinaryHeap<C> {
    fn eq(&self, other: &BinaryHeap<C>) -> bool {
        self.ring == other.ring
    }
}

impl<C> Eq for BinaryHeap<C> {}

impl<C> Hash for BinaryHeap<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ring.hash(state);
    }
}

impl<C> std::fmt::Debug for BinaryHeap<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryHeap").field("ring", &self.ring).finish()
    }
}

fn check_entry_size(entry_size: usize, comparator: &dyn EntryComparator) -> Result<()> {
    if let Some(size) = comparator.entry_size() {
        verify_arg!(comparator, size == entry_size);
    }
    Ok(())
}

#[inline]
fn precedes(ring: &RingBuffer, comparator: &dyn EntryComparator, a: usize, b: usize) -> Result<bool> {
    Ok(comparator.compare(ring.get(a)?, ring.get(b)?) == Ordering::Less)
}

/// Moves the entry at `index` toward the root until its parent precedes or
/// equals it.
pub(crate) fn sift_up(ring: &mut RingBuffer, comparator: &dyn EntryComparator, mut index: usize) -> Result<()> {
    while index > 0 {
        let parent = (index - 1) / 2;
        if !precedes(ring, comparator, index, parent)? {
            break;
        }
        ring.swap(index, parent)?;
        index = parent;
    }
    Ok(())
}

/// Moves the entry at `index` toward the leaves of the heap `[0, end)` until
/// no child precedes it.
pub(crate) fn sift_down(
    ring: &mut RingBuffer,
    comparator: &dyn EntryComparator,
    mut index: usize,
    end: usize,
) -> Result<()> {
    loop {
        let left = 2 * index + 1;
        if left >= end {
            break;
        }
        let right = left + 1;
        let child = if right < end && precedes(ring, comparator, right, left)? {
            right
        } else {
            left
        };
        if !precedes(ring, comparator, child, index)? {
            break;
        }
        ring.swap(index, child)?;
        index = child;
    }
    Ok(())
}

/// Arranges every entry of `ring` into heap order, bottom-up.
pub(crate) fn heapify(ring: &mut RingBuffer, comparator: &dyn EntryComparator) -> Result<()> {
    let len = ring.len();
    for index in (0..len / 2).rev() {
        sift_down(ring, comparator, index, len)?;
    }
    Ok(())
}

/// Swaps the root with the last entry, restores heap order over the rest and
/// pops the old root off the back.
pub(crate) fn extract_top<'a>(
    ring: &'a mut RingBuffer,
    comparator: &dyn EntryComparator,
) -> Result<&'a [u8]> {
    if ring.is_empty() {
        return Err(Error::empty("extract_top"));
    }
    let last = ring.len() - 1;
    if last > 0 {
        ring.swap(0, last)?;
        sift_down(ring, comparator, 0, last)?;
    }
    ring.pop_back()
}
