use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use ringheap_common::{Result, error::Error};

use crate::{
    binary_heap::{extract_top, heapify, sift_up},
    config::CapacityPolicy,
    handle_arena::{HANDLE_SIZE, HandleArena},
    ring_buffer::RingBuffer,
};

/// A binary heap of owned values ordered by `compare`.
///
/// Handles are kept in heap order in a [`RingBuffer`] and sifted by the same
/// routines as [`BinaryHeap`](crate::BinaryHeap); the comparator sees the values
/// the handles refer to. Values still in the heap are dropped with it.
///
/// Cloning requires both `T` and `F` to be `Clone`, and the clone owns its own
/// copy of every value.
#[derive(Clone)]
pub struct ObjectHeap<T, F> {
    ring: RingBuffer,
    arena: HandleArena<T>,
    compare: F,
}

impl<T, F> ObjectHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    pub fn new(compare: F) -> Result<ObjectHeap<T, F>> {
        Self::with_policy(CapacityPolicy::default(), compare)
    }

    pub fn with_capacity(capacity: usize, compare: F) -> Result<ObjectHeap<T, F>> {
        Ok(ObjectHeap {
            ring: RingBuffer::new(HANDLE_SIZE, capacity)?,
            arena: HandleArena::new(),
            compare,
        })
    }

    pub fn with_policy(policy: CapacityPolicy, compare: F) -> Result<ObjectHeap<T, F>> {
        Ok(ObjectHeap {
            ring: RingBuffer::with_policy(HANDLE_SIZE, policy)?,
            arena: HandleArena::new(),
            compare,
        })
    }

    /// Builds a heap holding `values` with a single bottom-up heapify pass.
    pub fn from_values(values: impl IntoIterator<Item = T>, compare: F) -> Result<ObjectHeap<T, F>> {
        let values = values.into_iter();
        let mut heap = Self::new(compare)?;
        heap.ring.grow_to_fit(values.size_hint().0)?;
        for value in values {
            heap.push_handle(value)?;
        }

        let Self {
            ring,
            arena,
            compare,
        } = &mut heap;
        let comparator = |a: &[u8], b: &[u8]| arena.compare_entries(a, b, compare);
        heapify(ring, &comparator)?;
        Ok(heap)
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

    /// Adds `value` to the heap.
    ///
    /// Room for the handle is made before `value` is stored, so a failed growth
    /// leaves the heap unchanged.
    pub fn insert(&mut self, value: T) -> Result<()> {
        self.push_handle(value)?;

        let Self {
            ring,
            arena,
            compare,
        } = self;
        let comparator = |a: &[u8], b: &[u8]| arena.compare_entries(a, b, compare);
        let last = ring.len() - 1;
        sift_up(ring, &comparator, last)
    }

    /// Adds every value of `values`.
    pub fn insert_many(&mut self, values: impl IntoIterator<Item = T>) -> Result<()> {
        let values = values.into_iter();
        self.ring.grow_to_fit(values.size_hint().0)?;
        for value in values {
            self.insert(value)?;
        }
        Ok(())
    }

    /// Returns the top value without removing it.
    pub fn peek(&self) -> Result<&T> {
        if self.is_empty() {
            return Err(Error::empty("peek"));
        }
        self.arena
            .resolve(self.ring.get(0)?)
            .ok_or_else(stale_handle)
    }

    /// Removes the top value.
    pub fn extract_top(&mut self) -> Result<T> {
        let Self {
            ring,
            arena,
            compare,
        } = self;
        let comparator = |a: &[u8], b: &[u8]| arena.compare_entries(a, b, compare);
        let handle = bytemuck::pod_read_unaligned::<u64>(extract_top(ring, &comparator)?);
        arena.take(handle).ok_or_else(stale_handle)
    }

    /// Removes up to `n` values, in extraction order.
    ///
    /// Asking for more values than the heap holds is not an error: the result
    /// then holds every remaining value.
    pub fn extract_many(&mut self, n: usize) -> Result<Vec<T>> {
        let count = n.min(self.len());
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.extract_top()?);
        }
        Ok(values)
    }

    /// Iterates over the values in storage (heap array) order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.ring.iter().filter_map(|entry| self.arena.resolve(entry))
    }

    /// Clones the values out in storage order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Clones the values out in extraction order, leaving the heap untouched.
    pub fn to_sorted_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut values: Vec<&T> = self.iter().collect();
        values.sort_by(|a, b| (self.compare)(*a, *b));
        values.into_iter().cloned().collect()
    }

    /// Drops every value. The capacity is retained.
    pub fn clear(&mut self) {
        self.ring.clear();
        self.arena.clear();
    }

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

    pub fn comparator(&self) -> &F {
        &self.compare
    }

    /// Stores `value` and appends its handle without restoring heap order.
    fn push_handle(&mut self, value: T) -> Result<()> {
        if self.ring.is_full() {
            self.ring.grow()?;
        }
        let handle = self.arena.insert(value);
        self.ring
            .push_back_typed(handle)
            .inspect_err(|_| drop(self.arena.take(handle)))
    }
}

#[cold]
fn stale_handle() -> Error {
    Error::invalid_operation("object heap handle without a value")
}

/// Heaps are equal when they hold equal values in the same storage order. The
/// comparators are not compared.
impl<T: PartialEq, F> PartialEq for ObjectHeap<T, F> {
    fn eq(&self, other: &ObjectHeap<T, F>) -> bool {
        self.ring.len() == other.ring.len()
            && self
                .ring
                .iter()
                .zip(other.ring.iter())
                .all(|(a, b)| self.arena.resolve(a) == other.arena.resolve(b))
    }
}

impl<T: Eq, F> Eq for ObjectHeap<T, F> {}

impl<T: Hash, F> Hash for ObjectHeap<T, F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ring.len().hash(state);
        for entry in self.ring.iter() {
            self.arena.resolve(entry).hash(state);
        }
    }
}

impl<T, F> std::fmt::Debug for ObjectHeap<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectHeap")
            .field("len", &self.ring.len())
            .field("capacity", &self.ring.capacity())
            .finish()
    }
}
