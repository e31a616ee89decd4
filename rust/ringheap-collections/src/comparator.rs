//! Three-way comparison over opaque entries.

use std::{cmp::Ordering, marker::PhantomData};

/// Orders two entries of a heap.
///
/// `Ordering::Less` means `a` precedes `b`, i.e. `a` is extracted first. The
/// comparator alone decides whether a heap behaves as a min-heap or a max-heap.
pub trait EntryComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// The only entry size this comparator can order, if it has one.
    ///
    /// Heaps reject a comparator whose entry size differs from their own at
    /// construction, before any entry is stored.
    fn entry_size(&self) -> Option<usize> {
        None
    }
}

impl<F> EntryComparator for F
where
    F: Fn(&[u8], &[u8]) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        self(a, b)
    }
}

/// Byte-wise lexicographic order.
pub fn lexicographic(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Orders entries decoded as `T`.
pub struct TypedOrder<T> {
    reversed: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedOrder<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedOrder<T> {}

impl<T> std::fmt::Debug for TypedOrder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedOrder")
            .field("type", &std::any::type_name::<T>())
            .field("reversed", &self.reversed)
            .finish()
    }
}

impl<T> EntryComparator for TypedOrder<T>
where
    T: bytemuck::AnyBitPattern + Ord,
{
    /// # Panics
    ///
    /// Panics if an entry is not exactly `size_of::<T>()` bytes.
    #[inline]
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        let order = read::<T>(a).cmp(&read::<T>(b));
        if self.reversed { order.reverse() } else { order }
    }

    fn entry_size(&self) -> Option<usize> {
        Some(std::mem::size_of::<T>())
    }
}

/// Entries decoded as `T`, smallest first.
pub fn ascending<T>() -> TypedOrder<T>
where
    T: bytemuck::AnyBitPattern + Ord,
{
    TypedOrder {
        reversed: false,
        _marker: PhantomData,
    }
}

/// Entries decoded as `T`, largest first.
pub fn descending<T>() -> TypedOrder<T>
where
    T: bytemuck::AnyBitPattern + Ord,
{
    TypedOrder {
        reversed: true,
        _marker: PhantomData,
    }
}

#[inline]
fn read<T: bytemuck::AnyBitPattern>(entry: &[u8]) -> T {
    bytemuck::pod_read_unaligned(entry)
}
