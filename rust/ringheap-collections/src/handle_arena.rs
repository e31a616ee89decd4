//! Slot storage behind the object collections.
//!
//! An object collection keeps its values here and stores only their 8-byte
//! handles in a [`RingBuffer`](crate::RingBuffer), so the raw ring and heap
//! code never has to know how to move or drop a `T`.

use std::cmp::Ordering;

/// Size of a handle entry, in bytes.
pub(crate) const HANDLE_SIZE: usize = std::mem::size_of::<u64>();

#[derive(Clone)]
pub(crate) struct HandleArena<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
}

impl<T> HandleArena<T> {
    pub fn new() -> HandleArena<T> {
        HandleArena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Stores `value` and returns its handle.
    pub fn insert(&mut self, value: T) -> u64 {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                slot as u64
            }
            None => {
                self.slots.push(Some(value));
                (self.slots.len() - 1) as u64
            }
        }
    }

    /// Moves the value out and releases its handle.
    pub fn take(&mut self, handle: u64) -> Option<T> {
        let slot = handle as usize;
        let value = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        Some(value)
    }

    pub fn get(&self, handle: u64) -> Option<&T> {
        self.slots.get(handle as usize)?.as_ref()
    }

    /// Resolves a handle entry read straight from a ring.
    pub fn resolve(&self, entry: &[u8]) -> Option<&T> {
        self.get(read_handle(entry))
    }

    /// Orders two handle entries by the values they refer to.
    ///
    /// A handle without a value is a broken collection invariant: debug builds
    /// panic, release builds fall back to ordering by handle.
    pub fn compare_entries<F>(&self, a: &[u8], b: &[u8], compare: &F) -> Ordering
    where
        F: Fn(&T, &T) -> Ordering,
    {
        match (self.resolve(a), self.resolve(b)) {
            (Some(a), Some(b)) => compare(a, b),
            (left, right) => {
                debug_assert!(
                    left.is_some() && right.is_some(),
                    "object handle without a value"
                );
                read_handle(a).cmp(&read_handle(b))
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[inline]
fn read_handle(entry: &[u8]) -> u64 {
    bytemuck::pod_read_unaligned(entry)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_slots_are_reused() {
        let mut arena = HandleArena::new();
        let a = arena.insert("a".to_string());
        let b = arena.insert("b".to_string());
        assert_ne!(a, b);
        assert_eq!(arena.take(a).as_deref(), Some("a"));
        assert_eq!(arena.take(a), None);
        assert_eq!(arena.get(a), None);

        let c = arena.insert("c".to_string());
        assert_eq!(c, a);
        assert_eq!(arena.get(c).map(String::as_str), Some("c"));
        assert_eq!(arena.resolve(&b.to_ne_bytes()).map(String::as_str), Some("b"));
    }

    #[test]
    fn test_clear_drops_values() {
        let value = Rc::new(5);
        let mut arena = HandleArena::new();
        arena.insert(value.clone());
        arena.insert(value.clone());
        assert_eq!(Rc::strong_count(&value), 3);
        arena.clear();
        assert_eq!(Rc::strong_count(&value), 1);
    }

    #[test]
    fn test_compare_entries() {
        let mut arena = HandleArena::new();
        let low = arena.insert(1);
        let high = arena.insert(10);
        let order = arena.compare_entries(&low.to_ne_bytes(), &high.to_ne_bytes(), &i32::cmp);
        assert_eq!(order, Ordering::Less);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut arena = HandleArena::new();
        let a = arena.insert(vec![1]);
        let b = arena.insert(vec![2]);
        arena.take(b);

        let mut copy = arena.clone();
        assert_eq!(copy.get(a), Some(&vec![1]));
        assert_eq!(copy.get(b), None);
        // The free list is cloned too, so handles line up.
        assert_eq!(copy.insert(vec![3]), b);
        copy.take(a);
        assert_eq!(arena.get(a), Some(&vec![1]));
        assert_eq!(arena.get(b), None);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "object handle without a value")]
    fn test_compare_released_handle_panics_in_debug() {
        let mut arena = HandleArena::new();
        let live = arena.insert(1);
        let released = arena.insert(2);
        arena.take(released);
        let _ = arena.compare_entries(&live.to_ne_bytes(), &released.to_ne_bytes(), &i32::cmp);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_compare_released_handle_orders_by_handle() {
        let mut arena = HandleArena::new();
        let live = arena.insert(1);
        let released = arena.insert(2);
        arena.take(released);
        let order = arena.compare_entries(&live.to_ne_bytes(), &released.to_ne_bytes(), &i32::cmp);
        assert_eq!(order, live.cmp(&released));
    }
}
