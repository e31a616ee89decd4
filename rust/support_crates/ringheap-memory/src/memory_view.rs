use std::{
    hash::{Hash, Hasher},
    ops::Range,
};

use ringheap_common::{Result, error::Error, verify_arg, verify_index};

use crate::hashing::ContentHasher;

/// A bounds-checked region of memory partitioned into fixed-size entries.
///
/// The view either owns its backing allocation or borrows it from the caller;
/// the choice is made at construction and never changes. Only owned views can
/// change their capacity.
///
/// # Invariants
/// - `entry_size > 0` and is fixed for the lifetime of the view.
/// - The backing region is exactly `entry_size * capacity` bytes long.
/// - Every offset passed to an accessor must be `< capacity`; anything else fails
///   with `OutOfBounds` before a single byte is touched.
pub struct MemoryView<'a> {
    storage: Storage<'a>,
    entry_size: usize,
    capacity: usize,
}

enum Storage<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

impl Storage<'_> {
    #[inline]
    fn bytes(&self) -> &[u8] {
        match self {
            Storage::Owned(bytes) => bytes,
            Storage::Borrowed(bytes) => bytes,
        }
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Storage::Owned(bytes) => bytes,
            Storage::Borrowed(bytes) => bytes,
        }
    }
}

impl MemoryView<'static> {
    /// Allocates an owned view of `capacity` entries of `entry_size` bytes.
    ///
    /// When `zeroed` is set, every byte is guaranteed to be zero. Otherwise the
    /// contents are unspecified; they are still initialized, since safe code never
    /// hands out uninitialized memory.
    pub fn allocate(entry_size: usize, capacity: usize, zeroed: bool) -> Result<MemoryView<'static>> {
        verify_arg!(entry_size, entry_size > 0);
        let len = byte_len(entry_size, capacity)?;
        log::trace!("allocating memory view: {capacity} x {entry_size} bytes (zeroed: {zeroed})");
        Ok(MemoryView {
            storage: Storage::Owned(alloc_bytes(len)?),
            entry_size,
            capacity,
        })
    }

    /// Allocates an owned view with every entry set to `value`.
    pub fn with_value(entry_size: usize, capacity: usize, value: &[u8]) -> Result<MemoryView<'static>> {
        verify_arg!(value, value.len() == entry_size);
        let mut view = Self::allocate(entry_size, capacity, false)?;
        view.fill_range(0, capacity, value)?;
        Ok(view)
    }

    /// Creates an owned view holding a copy of `source`.
    ///
    /// The capacity is `source.len() / entry_size`; `source` must hold a whole
    /// number of entries.
    pub fn from_copy(entry_size: usize, source: &[u8]) -> Result<MemoryView<'static>> {
        let count = entry_count(entry_size, source.len())?;
        Self::from_copy_with_capacity(entry_size, count, source)
    }

    /// Creates an owned view of `capacity` entries whose low end holds a copy
    /// of `source`. The remaining entries are zeroed.
    pub fn from_copy_with_capacity(
        entry_size: usize,
        capacity: usize,
        source: &[u8],
    ) -> Result<MemoryView<'static>> {
        let count = entry_count(entry_size, source.len())?;
        verify_arg!(capacity, capacity >= count);
        let mut view = Self::allocate(entry_size, capacity, true)?;
        view.as_bytes_mut()[..source.len()].copy_from_slice(source);
        Ok(view)
    }

    /// Takes ownership of an existing allocation without copying it.
    ///
    /// The capacity is `bytes.len() / entry_size`; `bytes` must hold a whole
    /// number of entries.
    pub fn from_owned_bytes(entry_size: usize, bytes: Vec<u8>) -> Result<MemoryView<'static>> {
        let capacity = entry_count(entry_size, bytes.len())?;
        Ok(MemoryView {
            storage: Storage::Owned(bytes),
            entry_size,
            capacity,
        })
    }
}

impl<'a> MemoryView<'a> {
    /// Creates a view over memory owned by the caller.
    ///
    /// A borrowed view supports every accessor but cannot change its capacity.
    pub fn borrowed(entry_size: usize, bytes: &'a mut [u8]) -> Result<MemoryView<'a>> {
        let capacity = entry_count(entry_size, bytes.len())?;
        Ok(MemoryView {
            storage: Storage::Borrowed(bytes),
            entry_size,
            capacity,
        })
    }

    /// Size of a single entry, in bytes.
    #[inline]
    pub fn entry_size(&self) -> usize {
        self.entry_size
    }

    /// Number of entries the view holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.capacity == 0
    }

    /// Whether the view is responsible for releasing its memory.
    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    /// Total size of the view, in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.entry_size * self.capacity
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.bytes()
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.storage.bytes_mut()
    }

    /// Returns the entry at `offset`.
    pub fn entry(&self, offset: usize) -> Result<&[u8]> {
        verify_index!(offset, offset, self.capacity);
        let range = self.byte_range(offset..offset + 1);
        Ok(&self.as_bytes()[range])
    }

    /// Returns the entry at `offset` for in-place modification.
    pub fn entry_mut(&mut self, offset: usize) -> Result<&mut [u8]> {
        verify_index!(offset, offset, self.capacity);
        let range = self.byte_range(offset..offset + 1);
        Ok(&mut self.as_bytes_mut()[range])
    }

    /// Overwrites the entry at `offset` with `value`.
    ///
    /// `value` must be exactly `entry_size` bytes long.
    pub fn write(&mut self, offset: usize, value: &[u8]) -> Result<()> {
        verify_arg!(value, value.len() == self.entry_size);
        self.entry_mut(offset)?.copy_from_slice(value);
        Ok(())
    }

    /// Returns the bytes of the `length` entries starting at `offset`.
    pub fn range(&self, offset: usize, length: usize) -> Result<&[u8]> {
        let range = self.check_range("range", offset, length)?;
        let range = self.byte_range(range);
        Ok(&self.as_bytes()[range])
    }

    /// Overwrites the entries starting at `offset` with `bytes`, which must hold a
    /// whole number of entries.
    pub fn write_range(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let length = entry_count(self.entry_size, bytes.len())?;
        let range = self.check_range("write_range", offset, length)?;
        let range = self.byte_range(range);
        self.as_bytes_mut()[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Sets every entry in `[offset, offset + length)` to `value`.
    pub fn fill_range(&mut self, offset: usize, length: usize, value: &[u8]) -> Result<()> {
        verify_arg!(value, value.len() == self.entry_size);
        let range = self.check_range("fill_range", offset, length)?;
        let range = self.byte_range(range);
        let entry_size = self.entry_size;
        for entry in self.as_bytes_mut()[range].chunks_exact_mut(entry_size) {
            entry.copy_from_slice(value);
        }
        Ok(())
    }

    /// Zeroes every entry in `[offset, offset + length)`.
    pub fn zero_range(&mut self, offset: usize, length: usize) -> Result<()> {
        let range = self.check_range("zero_range", offset, length)?;
        let range = self.byte_range(range);
        self.as_bytes_mut()[range].fill(0);
        Ok(())
    }

    /// Copies the entry at `src` over the entry at `dst`.
    pub fn copy_entry(&mut self, src: usize, dst: usize) -> Result<()> {
        self.copy_range(src, dst, 1)
    }

    /// Copies `length` entries starting at `src` to `dst`.
    ///
    /// The ranges may overlap; the copy behaves as if the source were first
    /// copied to a temporary buffer.
    pub fn copy_range(&mut self, src: usize, dst: usize, length: usize) -> Result<()> {
        let src = self.check_range("copy_range source", src, length)?;
        let dst = self.check_range("copy_range destination", dst, length)?;
        let src = self.byte_range(src);
        let dst = self.byte_range(dst);
        self.as_bytes_mut().copy_within(src, dst.start);
        Ok(())
    }

    /// Exchanges the entries at `a` and `b`.
    pub fn swap_entries(&mut self, a: usize, b: usize) -> Result<()> {
        self.swap_range(a, 1, b)
    }

    /// Exchanges the `length` entries starting at `a` with those starting at `b`.
    ///
    /// Overlapping ranges go through a temporary copy of the first range: after the
    /// call, `[a, a + length)` holds the old contents of `[b, b + length)`, and then
    /// `[b, b + length)` receives the old contents of `[a, a + length)`.
    pub fn swap_range(&mut self, a: usize, length: usize, b: usize) -> Result<()> {
        let a = self.check_range("swap_range first", a, length)?;
        let b = self.check_range("swap_range second", b, length)?;
        if a.start == b.start || length == 0 {
            return Ok(());
        }

        let a = self.byte_range(a);
        let b = self.byte_range(b);
        let bytes = self.as_bytes_mut();
        if a.end <= b.start || b.end <= a.start {
            let (low, high) = if a.start < b.start { (a, b) } else { (b, a) };
            let (head, tail) = bytes.split_at_mut(high.start);
            head[low].swap_with_slice(&mut tail[..high.end - high.start]);
        } else {
            let saved = bytes[a.clone()].to_vec();
            bytes.copy_within(b.clone(), a.start);
            bytes[b].copy_from_slice(&saved);
        }
        Ok(())
    }

    /// Reads the entry at `offset` as a `T`.
    ///
    /// `T` must be exactly `entry_size` bytes long. The read does not require the
    /// entry to be aligned for `T`.
    pub fn get<T>(&self, offset: usize) -> Result<T>
    where
        T: bytemuck::AnyBitPattern,
    {
        verify_arg!(T, std::mem::size_of::<T>() == self.entry_size);
        Ok(bytemuck::pod_read_unaligned(self.entry(offset)?))
    }

    /// Writes `value` into the entry at `offset`.
    pub fn set<T>(&mut self, offset: usize, value: T) -> Result<()>
    where
        T: bytemuck::NoUninit,
    {
        verify_arg!(T, std::mem::size_of::<T>() == self.entry_size);
        self.write(offset, bytemuck::bytes_of(&value))
    }

    /// Reallocates the view to hold `capacity` entries.
    ///
    /// Existing entries keep their offsets. Shrinking discards the entries at or
    /// beyond `capacity`; growing appends entries that are zero when `zeroed` is set
    /// and unspecified otherwise. Fails with `InvalidOperation` on a borrowed view.
    pub fn set_capacity(&mut self, capacity: usize, zeroed: bool) -> Result<()> {
        let new_len = byte_len(self.entry_size, capacity)?;
        let Storage::Owned(bytes) = &mut self.storage else {
            return Err(Error::invalid_operation("set_capacity on a borrowed memory view"));
        };

        if new_len > bytes.len() {
            bytes
                .try_reserve_exact(new_len - bytes.len())
                .map_err(|_| Error::allocation_failed(new_len))?;
            bytes.resize(new_len, 0);
        } else {
            bytes.truncate(new_len);
            bytes.shrink_to_fit();
        }

        log::trace!(
            "memory view capacity {} -> {} entries of {} bytes (zeroed: {zeroed})",
            self.capacity,
            capacity,
            self.entry_size
        );
        self.capacity = capacity;
        Ok(())
    }

    /// Returns an owned copy of this view, regardless of whether this one is owned.
    pub fn to_owned_view(&self) -> MemoryView<'static> {
        MemoryView {
            storage: Storage::Owned(self.as_bytes().to_vec()),
            entry_size: self.entry_size,
            capacity: self.capacity,
        }
    }

    /// Converts the view into an owned one, copying only if the memory is borrowed.
    pub fn into_owned(self) -> MemoryView<'static> {
        let entry_size = self.entry_size;
        let capacity = self.capacity;
        MemoryView {
            storage: Storage::Owned(self.into_vec()),
            entry_size,
            capacity,
        }
    }

    /// Consumes the view and returns its bytes, copying only if the memory is borrowed.
    pub fn into_vec(self) -> Vec<u8> {
        match self.storage {
            Storage::Owned(bytes) => bytes,
            Storage::Borrowed(bytes) => bytes.to_vec(),
        }
    }

    /// XXH3-64 hash of `(entry_size, capacity, bytes)`.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = ContentHasher::new(self.entry_size, self.capacity);
        hasher.update(self.as_bytes());
        hasher.finish()
    }
}

impl MemoryView<'_> {
    /// Validates `[offset, offset + length)` against the capacity.
    fn check_range(&self, name: &str, offset: usize, length: usize) -> Result<Range<usize>> {
        let end = offset
            .checked_add(length)
            .ok_or_else(|| Error::out_of_bounds(name, offset, self.capacity))?;
        if end > self.capacity {
            return Err(Error::out_of_bounds(name, end - 1, self.capacity));
        }
        Ok(offset..end)
    }

    /// Converts a validated entry range into a byte range.
    #[inline]
    fn byte_range(&self, entries: Range<usize>) -> Range<usize> {
        entries.start * self.entry_size..entries.end * self.entry_size
    }
}

/// Clones always produce an owned view: a borrowed view's clone does not share
/// the caller's memory.
impl Clone for MemoryView<'_> {
    fn clone(&self) -> Self {
        MemoryView {
            storage: Storage::Owned(self.as_bytes().to_vec()),
            entry_size: self.entry_size,
            capacity: self.capacity,
        }
    }
}

impl<'b> PartialEq<MemoryView<'b>> for MemoryView<'_> {
    fn eq(&self, other: &MemoryView<'b>) -> bool {
        self.entry_size == other.entry_size
            && self.capacity == other.capacity
            && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for MemoryView<'_> {}

impl Hash for MemoryView<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entry_size.hash(state);
        self.capacity.hash(state);
        self.as_bytes().hash(state);
    }
}

impl std::fmt::Debug for MemoryView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryView")
            .field("entry_size", &self.entry_size)
            .field("capacity", &self.capacity)
            .field("owned", &self.is_owned())
            .field("bytes", &self.as_bytes())
            .finish()
    }
}

/// Byte length of `capacity` entries, rejecting sizes the allocator could never serve.
fn byte_len(entry_size: usize, capacity: usize) -> Result<usize> {
    verify_arg!(entry_size, entry_size > 0);
    match entry_size.checked_mul(capacity) {
        Some(len) if len <= isize::MAX as usize => Ok(len),
        _ => Err(Error::invalid_arg(
            "capacity",
            format!("{capacity} entries of {entry_size} bytes exceed the addressable size"),
        )),
    }
}

/// Number of whole entries in `len` bytes.
fn entry_count(entry_size: usize, len: usize) -> Result<usize> {
    verify_arg!(entry_size, entry_size > 0);
    verify_arg!(len, len % entry_size == 0);
    Ok(len / entry_size)
}

fn alloc_bytes(len: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| Error::allocation_failed(len))?;
    bytes.resize(len, 0);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::hash::DefaultHasher;

    use ringheap_common::error::ErrorKind;

    use super::*;

    fn sequential(capacity: usize) -> MemoryView<'static> {
        let values = (0..capacity as u32).collect::<Vec<_>>();
        MemoryView::from_copy(4, bytemuck::cast_slice(&values)).unwrap()
    }

    fn values(view: &MemoryView) -> Vec<u32> {
        (0..view.capacity())
            .map(|i| view.get::<u32>(i).unwrap())
            .collect()
    }

    fn std_hash<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_allocate() {
        let view = MemoryView::allocate(4, 8, true).unwrap();
        assert_eq!(view.entry_size(), 4);
        assert_eq!(view.capacity(), 8);
        assert_eq!(view.byte_len(), 32);
        assert!(view.is_owned());
        assert!(!view.is_empty());
        assert!(view.as_bytes().iter().all(|&b| b == 0));

        let view = MemoryView::allocate(16, 0, false).unwrap();
        assert!(view.is_empty());
        assert!(view.entry(0).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_allocate_invalid() {
        let e = MemoryView::allocate(0, 8, true).unwrap_err();
        assert!(e.is_invalid_arg());

        let e = MemoryView::allocate(8, usize::MAX / 4, true).unwrap_err();
        assert!(e.is_invalid_arg());
    }

    #[test]
    fn test_with_value() {
        let view = MemoryView::with_value(2, 5, &[7, 9]).unwrap();
        assert_eq!(view.as_bytes(), &[7, 9, 7, 9, 7, 9, 7, 9, 7, 9]);
        assert!(MemoryView::with_value(2, 5, &[7]).unwrap_err().is_invalid_arg());
    }

    #[test]
    fn test_from_copy() {
        let source = [1u8, 2, 3, 4, 5, 6];
        let view = MemoryView::from_copy(2, &source).unwrap();
        assert_eq!(view.capacity(), 3);
        assert_eq!(view.entry(1).unwrap(), &[3, 4]);

        assert!(MemoryView::from_copy(4, &source).unwrap_err().is_invalid_arg());
        assert!(MemoryView::from_copy(0, &source).unwrap_err().is_invalid_arg());

        let view = MemoryView::from_copy_with_capacity(2, 5, &source).unwrap();
        assert_eq!(view.capacity(), 5);
        assert_eq!(view.as_bytes(), &[1, 2, 3, 4, 5, 6, 0, 0, 0, 0]);
        assert!(
            MemoryView::from_copy_with_capacity(2, 2, &source)
                .unwrap_err()
                .is_invalid_arg()
        );
    }

    #[test]
    fn test_from_owned_bytes_is_zero_copy() {
        let bytes = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let ptr = bytes.as_ptr();
        let view = MemoryView::from_owned_bytes(4, bytes).unwrap();
        assert!(view.is_owned());
        assert_eq!(view.capacity(), 2);
        assert_eq!(view.as_bytes().as_ptr(), ptr);
        assert_eq!(view.into_vec().as_ptr(), ptr);
    }

    #[test]
    fn test_read_bounds() {
        let view = sequential(8);
        for i in 0..8 {
            assert_eq!(view.get::<u32>(i).unwrap(), i as u32);
        }
        for offset in [8, 9, usize::MAX] {
            let e = view.entry(offset).unwrap_err();
            match e.kind() {
                ErrorKind::OutOfBounds { index, bound, .. } => {
                    assert_eq!(*index, offset);
                    assert_eq!(*bound, 8);
                }
                kind => panic!("unexpected error kind {kind:?}"),
            }
        }
    }

    #[test]
    fn test_write() {
        let mut view = sequential(4);
        view.write(2, &[0xff; 4]).unwrap();
        assert_eq!(view.get::<u32>(2).unwrap(), u32::MAX);

        // Failed writes leave the view untouched.
        let before = view.clone();
        assert!(view.write(4, &[1; 4]).unwrap_err().is_out_of_bounds());
        assert!(view.write(0, &[1; 3]).unwrap_err().is_invalid_arg());
        assert_eq!(view, before);
    }

    #[test]
    fn test_typed_accessors_check_size() {
        let mut view = sequential(4);
        assert!(view.get::<u64>(0).unwrap_err().is_invalid_arg());
        assert!(view.set::<u16>(0, 1).unwrap_err().is_invalid_arg());
        view.set::<f32>(1, 1.5).unwrap();
        assert_eq!(view.get::<f32>(1).unwrap(), 1.5);
        view.set::<i32>(3, -7).unwrap();
        assert_eq!(view.get::<i32>(3).unwrap(), -7);
    }

    #[test]
    fn test_unaligned_entries() {
        let mut view = MemoryView::allocate(8, 3, true).unwrap();
        view.set::<[u8; 8]>(1, *b"abcdefgh").unwrap();
        assert_eq!(&view.as_bytes()[8..16], b"abcdefgh");

        // u64 reads go through an unaligned load.
        let mut bytes = vec![0u8; 17];
        bytes[1..9].copy_from_slice(&42u64.to_ne_bytes());
        let view = MemoryView::borrowed(8, &mut bytes[1..17]).unwrap();
        assert_eq!(view.get::<u64>(0).unwrap(), 42);
    }

    #[test]
    fn test_range_and_write_range() {
        let mut view = sequential(6);
        let saved = view.range(1, 2).unwrap().to_vec();
        assert_eq!(saved.len(), 8);

        view.write_range(4, &saved).unwrap();
        assert_eq!(values(&view), vec![0, 1, 2, 3, 1, 2]);

        assert!(view.range(5, 2).unwrap_err().is_out_of_bounds());
        assert!(view.write_range(5, &saved).unwrap_err().is_out_of_bounds());
        assert!(view.write_range(0, &saved[..3]).unwrap_err().is_invalid_arg());
        assert!(view.range(6, 0).unwrap().is_empty());
    }

    #[test]
    fn test_into_owned() {
        let mut bytes = [5u8, 6];
        let view = MemoryView::borrowed(1, &mut bytes).unwrap();
        let mut owned = view.into_owned();
        owned.set_capacity(3, true).unwrap();
        assert_eq!(owned.as_bytes(), &[5, 6, 0]);
        assert_eq!(bytes, [5, 6]);
    }

    #[test]
    fn test_fill_and_zero_range() {
        let mut view = sequential(6);
        view.fill_range(1, 3, &[9, 0, 0, 0]).unwrap();
        assert_eq!(values(&view), vec![0, 9, 9, 9, 4, 5]);

        view.zero_range(3, 3).unwrap();
        assert_eq!(values(&view), vec![0, 9, 9, 0, 0, 0]);

        assert!(view.zero_range(4, 3).unwrap_err().is_out_of_bounds());
        assert!(view.zero_range(usize::MAX, 2).unwrap_err().is_out_of_bounds());
        view.zero_range(6, 0).unwrap();
    }

    #[test]
    fn test_copy_range() {
        let mut view = sequential(8);
        view.copy_range(0, 4, 4).unwrap();
        assert_eq!(values(&view), vec![0, 1, 2, 3, 0, 1, 2, 3]);

        view.copy_entry(7, 0).unwrap();
        assert_eq!(values(&view), vec![3, 1, 2, 3, 0, 1, 2, 3]);

        assert!(view.copy_range(5, 0, 4).unwrap_err().is_out_of_bounds());
        assert!(view.copy_range(0, 5, 4).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_copy_range_overlapping() {
        let mut view = sequential(8);
        view.copy_range(0, 2, 5).unwrap();
        assert_eq!(values(&view), vec![0, 1, 0, 1, 2, 3, 4, 7]);

        let mut view = sequential(8);
        view.copy_range(3, 1, 5).unwrap();
        assert_eq!(values(&view), vec![0, 3, 4, 5, 6, 7, 6, 7]);
    }

    #[test]
    fn test_swap() {
        let mut view = sequential(8);
        view.swap_entries(0, 7).unwrap();
        assert_eq!(values(&view), vec![7, 1, 2, 3, 4, 5, 6, 0]);

        view.swap_range(1, 2, 5).unwrap();
        assert_eq!(values(&view), vec![7, 5, 6, 3, 4, 1, 2, 0]);

        view.swap_entries(3, 3).unwrap();
        assert_eq!(values(&view), vec![7, 5, 6, 3, 4, 1, 2, 0]);

        let before = view.clone();
        assert!(view.swap_range(6, 3, 0).unwrap_err().is_out_of_bounds());
        assert!(view.swap_entries(0, 8).unwrap_err().is_out_of_bounds());
        assert_eq!(view, before);
    }

    #[test]
    fn test_swap_range_overlapping() {
        let mut view = sequential(6);
        view.swap_range(0, 3, 2).unwrap();
        // [0, 3) takes the old [2, 5), then [2, 5) takes the old [0, 3).
        assert_eq!(values(&view), vec![2, 3, 0, 1, 2, 5]);
    }

    #[test]
    fn test_set_capacity_grow_and_shrink() {
        let mut view = sequential(4);
        view.set_capacity(8, true).unwrap();
        assert_eq!(view.capacity(), 8);
        assert_eq!(values(&view), vec![0, 1, 2, 3, 0, 0, 0, 0]);

        view.set_capacity(2, false).unwrap();
        assert_eq!(view.capacity(), 2);
        assert_eq!(values(&view), vec![0, 1]);
        assert!(view.entry(2).unwrap_err().is_out_of_bounds());

        view.set_capacity(0, false).unwrap();
        assert!(view.is_empty());
        view.set_capacity(1, true).unwrap();
        assert_eq!(values(&view), vec![0]);
    }

    #[test]
    fn test_borrowed_view() {
        let mut bytes = [1u8, 2, 3, 4];
        {
            let mut view = MemoryView::borrowed(2, &mut bytes).unwrap();
            assert!(!view.is_owned());
            view.write(1, &[8, 9]).unwrap();

            let e = view.set_capacity(4, true).unwrap_err();
            assert!(matches!(e.kind(), ErrorKind::InvalidOperation { .. }));
            assert_eq!(view.capacity(), 2);

            let owned = view.to_owned_view();
            assert!(owned.is_owned());
            assert_eq!(owned, view);
        }
        assert_eq!(bytes, [1, 2, 8, 9]);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut bytes = [0u8; 8];
        let view = MemoryView::borrowed(4, &mut bytes).unwrap();
        let mut copy = view.clone();
        assert!(copy.is_owned());
        copy.set::<u32>(0, 5).unwrap();
        assert_eq!(view.get::<u32>(0).unwrap(), 0);

        let original = sequential(3);
        let mut copy = original.clone();
        copy.set::<u32>(2, 99).unwrap();
        assert_eq!(values(&original), vec![0, 1, 2]);
        assert_ne!(original, copy);
    }

    #[test]
    fn test_equality_and_hash() {
        let a = sequential(4);
        let b = MemoryView::from_owned_bytes(4, a.as_bytes().to_vec()).unwrap();
        assert_eq!(a, b);
        assert_eq!(std_hash(&a), std_hash(&b));
        assert_eq!(a.content_hash(), b.content_hash());

        // Same bytes, different entry shape.
        let c = MemoryView::from_copy(2, a.as_bytes()).unwrap();
        assert_ne!(a, c);
        assert_ne!(a.content_hash(), c.content_hash());

        let mut d = a.clone();
        d.set_capacity(5, true).unwrap();
        assert_ne!(a, d);
    }
}
