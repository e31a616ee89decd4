//! Raw entry memory for the ringheap collections.
//!
//! A [`MemoryView`] partitions a contiguous byte region into `capacity` entries of
//! `entry_size` bytes each. Every offset-based access is bounds-checked here; the
//! collections built on top (ring buffer, heap, stack) only translate their logical
//! indices into offsets and rely on this crate to reject anything out of range.

pub mod hashing;
pub mod memory_view;

pub use hashing::ContentHasher;
pub use memory_view::MemoryView;
