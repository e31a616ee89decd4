use std::hash::{Hash, Hasher};

use ringheap_common::{Result, error::Error, verify_index};

use crate::{
    config::CapacityPolicy,
    entry_stack::EntryStack,
    handle_arena::{HANDLE_SIZE, HandleArena},
};

/// A LIFO stack of owned values.
///
/// Handles are stacked in an [`EntryStack`]; the values live in an arena owned
/// by the stack and are dropped with it.
#[derive(Clone)]
pub struct ObjectStack<T> {
    stack: EntryStack,
    arena: HandleArena<T>,
}

impl<T> ObjectStack<T> {
    pub fn new() -> Result<ObjectStack<T>> {
        Self::with_policy(CapacityPolicy::default())
    }

    pub fn with_capacity(capacity: usize) -> Result<ObjectStack<T>> {
        Ok(ObjectStack {
            stack: EntryStack::new(HANDLE_SIZE, capacity)?,
            arena: HandleArena::new(),
        })
    }

    pub fn with_policy(policy: CapacityPolicy) -> Result<ObjectStack<T>> {
        Ok(ObjectStack {
            stack: EntryStack::with_policy(HANDLE_SIZE, policy)?,
            arena: HandleArena::new(),
        })
    }

    /// Creates a stack holding `values`; the last value ends up on top.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Result<ObjectStack<T>> {
        let mut stack = Self::new()?;
        stack.push_many(values)?;
        Ok(stack)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.stack.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Pushes `value` on top. The stack grows before `value` is stored.
    pub fn push(&mut self, value: T) -> Result<()> {
        if self.stack.len() == self.stack.capacity() {
            self.stack.grow()?;
        }
        let handle = self.arena.insert(value);
        self.stack
            .push_typed(handle)
            .inspect_err(|_| drop(self.arena.take(handle)))
    }

    /// Pushes every value of `values`, in iteration order.
    pub fn push_many(&mut self, values: impl IntoIterator<Item = T>) -> Result<()> {
        let values = values.into_iter();
        self.stack.grow_to_fit(values.size_hint().0)?;
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    pub fn pop(&mut self) -> Result<T> {
        if self.is_empty() {
            return Err(Error::empty("pop"));
        }
        let handle = self.stack.pop_typed::<u64>()?;
        self.arena.take(handle).ok_or_else(stale_handle)
    }

    pub fn peek(&self) -> Result<&T> {
        if self.is_empty() {
            return Err(Error::empty("peek"));
        }
        self.get(self.len() - 1)
    }

    /// Value at `index`, counted from the bottom of the stack.
    pub fn get(&self, index: usize) -> Result<&T> {
        let entry = self.stack.get(index)?;
        self.arena.resolve(entry).ok_or_else(stale_handle)
    }

    /// Value `depth` entries below the top; depth 0 is the top.
    pub fn get_from_top(&self, depth: usize) -> Result<&T> {
        verify_index!(depth, depth, self.len());
        self.get(self.len() - 1 - depth)
    }

    /// Iterates over the values, bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        (0..self.len()).filter_map(|index| self.get(index).ok())
    }

    /// Clones the values out, bottom to top.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Drops every value. The capacity is retained.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.arena.clear();
    }

    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        self.stack.resize(new_capacity)
    }

    pub fn grow(&mut self) -> Result<bool> {
        self.stack.grow()
    }

    pub fn grow_to_fit(&mut self, additional: usize) -> Result<bool> {
        self.stack.grow_to_fit(additional)
    }

    pub fn shrink(&mut self) -> Result<bool> {
        self.stack.shrink()
    }
}

#[cold]
fn stale_handle() -> Error {
    Error::invalid_operation("object stack handle without a value")
}

impl<T: PartialEq> PartialEq for ObjectStack<T> {
    fn eq(&self, other: &ObjectStack<T>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for ObjectStack<T> {}

impl<T: Hash> Hash for ObjectStack<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for value in self.iter() {
            value.hash(state);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObjectStack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{hash::DefaultHasher, rc::Rc};

    use super::*;

    fn std_hash<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_lifo() {
        let mut stack = ObjectStack::with_capacity(1).unwrap();
        for i in 0..6 {
            stack.push(format!("v{i}")).unwrap();
        }
        assert_eq!(stack.capacity(), 8);
        assert_eq!(stack.peek().unwrap(), "v5");
        assert_eq!(stack.get(0).unwrap(), "v0");
        assert_eq!(stack.get_from_top(1).unwrap(), "v4");
        assert!(stack.get_from_top(6).unwrap_err().is_out_of_bounds());
        assert!(stack.get(6).unwrap_err().is_out_of_bounds());

        for i in (0..6).rev() {
            assert_eq!(stack.pop().unwrap(), format!("v{i}"));
        }
        assert!(stack.pop().unwrap_err().is_empty_collection());
        assert!(stack.peek().unwrap_err().is_empty_collection());
    }

    #[test]
    fn test_push_many_and_iter() {
        let mut stack = ObjectStack::from_values(["a", "b"]).unwrap();
        stack.push_many(["c", "d"]).unwrap();
        assert_eq!(stack.to_vec(), vec!["a", "b", "c", "d"]);
        assert_eq!(stack.iter().rev().copied().collect::<Vec<_>>(), vec!["d", "c", "b", "a"]);
        assert_eq!(format!("{stack:?}"), r#"["a", "b", "c", "d"]"#);
    }

    #[test]
    fn test_full_stack_grows_before_taking_the_value() {
        let value = Rc::new(());
        let mut stack = ObjectStack::with_capacity(0).unwrap();
        for expected_capacity in [1, 2, 4] {
            stack.push(value.clone()).unwrap();
            assert_eq!(stack.capacity(), expected_capacity);
        }
        assert_eq!(Rc::strong_count(&value), 4);
        drop(stack.pop().unwrap());
        assert_eq!(Rc::strong_count(&value), 3);
        stack.clear();
        assert_eq!(Rc::strong_count(&value), 1);
    }

    #[test]
    fn test_capacity_changes() {
        let mut stack = ObjectStack::from_values(0..3).unwrap();
        assert_eq!(stack.capacity(), 16);
        assert!(stack.shrink().unwrap());
        assert_eq!(stack.capacity(), 8);
        assert!(stack.resize(2).unwrap_err().is_invalid_arg());
        stack.resize(3).unwrap();
        assert!(stack.grow_to_fit(2).unwrap());
        assert_eq!(stack.capacity(), 8);
        stack.grow().unwrap();
        assert_eq!(stack.capacity(), 16);
        assert_eq!(stack.to_vec(), vec![0, 1, 2]);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = ObjectStack::from_values(vec![vec![1], vec![2]]).unwrap();
        let mut copy = original.clone();
        assert_eq!(copy, original);
        assert_eq!(std_hash(&copy), std_hash(&original));

        copy.pop().unwrap();
        copy.push(vec![3, 3]).unwrap();
        assert_eq!(original.to_vec(), vec![vec![1], vec![2]]);
        assert_eq!(copy.to_vec(), vec![vec![1], vec![3, 3]]);
        assert_ne!(copy, original);
    }
}
