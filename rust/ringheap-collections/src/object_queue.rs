use std::hash::{Hash, Hasher};

use ringheap_common::{Result, error::Error};

use crate::{
    config::CapacityPolicy,
    handle_arena::{HANDLE_SIZE, HandleArena},
    ring_buffer::RingBuffer,
};

/// A FIFO queue of owned values.
///
/// The queue order lives in a [`RingBuffer`] of 8-byte handles; the values
/// themselves sit in an arena owned by the queue. Values move in on `enqueue`,
/// move out on `dequeue`, and whatever is still queued is dropped with the queue.
///
/// A clone copies both the handles and the values, so it shares nothing with
/// the original.
#[derive(Clone)]
pub struct ObjectQueue<T> {
    ring: RingBuffer,
    arena: HandleArena<T>,
}

impl<T> ObjectQueue<T> {
    pub fn new() -> Result<ObjectQueue<T>> {
        Self::with_policy(CapacityPolicy::default())
    }

    pub fn with_capacity(capacity: usize) -> Result<ObjectQueue<T>> {
        Ok(ObjectQueue {
            ring: RingBuffer::new(HANDLE_SIZE, capacity)?,
            arena: HandleArena::new(),
        })
    }

    pub fn with_policy(policy: CapacityPolicy) -> Result<ObjectQueue<T>> {
        Ok(ObjectQueue {
            ring: RingBuffer::with_policy(HANDLE_SIZE, policy)?,
            arena: HandleArena::new(),
        })
    }

    /// Creates a queue holding `values`, first value at the front.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Result<ObjectQueue<T>> {
        let mut queue = Self::new()?;
        queue.enqueue_many(values)?;
        Ok(queue)
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

    /// Appends `value` at the back of the queue.
    ///
    /// Room for the handle is made before `value` is stored, so a failed growth
    /// leaves the queue unchanged.
    pub fn enqueue(&mut self, value: T) -> Result<()> {
        self.reserve_slot()?;
        let handle = self.arena.insert(value);
        self.ring
            .push_back_typed(handle)
            .inspect_err(|_| drop(self.arena.take(handle)))
    }

    /// Puts `value` in front of every queued value.
    pub fn enqueue_front(&mut self, value: T) -> Result<()> {
        self.reserve_slot()?;
        let handle = self.arena.insert(value);
        self.ring
            .push_front_typed(handle)
            .inspect_err(|_| drop(self.arena.take(handle)))
    }

    /// Appends every value of `values`, in iteration order.
    pub fn enqueue_many(&mut self, values: impl IntoIterator<Item = T>) -> Result<()> {
        let values = values.into_iter();
        self.ring.grow_to_fit(values.size_hint().0)?;
        for value in values {
            self.enqueue(value)?;
        }
        Ok(())
    }

    /// Removes the value at the front of the queue.
    pub fn dequeue(&mut self) -> Result<T> {
        if self.is_empty() {
            return Err(Error::empty("dequeue"));
        }
        let handle = self.ring.pop_front_typed::<u64>()?;
        self.take(handle)
    }

    /// Removes the value at the back of the queue.
    pub fn dequeue_back(&mut self) -> Result<T> {
        if self.is_empty() {
            return Err(Error::empty("dequeue_back"));
        }
        let handle = self.ring.pop_back_typed::<u64>()?;
        self.take(handle)
    }

    /// Removes up to `n` values from the front, in FIFO order.
    ///
    /// Asking for more values than the queue holds is not an error: the result
    /// then holds every remaining value.
    pub fn dequeue_many(&mut self, n: usize) -> Result<Vec<T>> {
        let count = n.min(self.len());
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.dequeue()?);
        }
        Ok(values)
    }

    pub fn peek(&self) -> Result<&T> {
        if self.is_empty() {
            return Err(Error::empty("peek"));
        }
        self.get(0)
    }

    /// Value at queue position `index`, 0 being the front.
    pub fn get(&self, index: usize) -> Result<&T> {
        let entry = self.ring.get(index)?;
        self.arena.resolve(entry).ok_or_else(stale_handle)
    }

    /// Iterates over the queued values, front to back.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.ring.iter().filter_map(|entry| self.arena.resolve(entry))
    }

    /// Clones the queued values out, front to back.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Drops every queued value. The capacity is retained.
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

    fn reserve_slot(&mut self) -> Result<()> {
        if self.ring.is_full() {
            self.ring.grow()?;
        }
        Ok(())
    }

    fn take(&mut self, handle: u64) -> Result<T> {
        self.arena.take(handle).ok_or_else(stale_handle)
    }
}

#[cold]
fn stale_handle() -> Error {
    Error::invalid_operation("object queue handle without a value")
}

/// Queues are equal when they hold equal values in the same order.
impl<T: PartialEq> PartialEq for ObjectQueue<T> {
    fn eq(&self, other: &ObjectQueue<T>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for ObjectQueue<T> {}

impl<T: Hash> Hash for ObjectQueue<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for value in self.iter() {
            value.hash(state);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObjectQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
