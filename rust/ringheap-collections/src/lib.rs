//! Growable collections over fixed-size, type-erased entries.
//!
//! [`RingBuffer`] is a circular deque on top of a
//! [`MemoryView`](ringheap_memory::MemoryView); [`BinaryHeap`] keeps a ring in
//! heap order under a caller-supplied [`EntryComparator`]. [`EntryStack`] is the
//! non-wrapping LIFO counterpart. [`ObjectQueue`], [`ObjectHeap`] and
//! [`ObjectStack`] carry owned values through the same code by storing handles.

pub mod binary_heap;
pub mod comparator;
pub mod config;
pub mod entry_stack;
mod handle_arena;
pub mod object_heap;
pub mod object_queue;
pub mod object_stack;
pub mod ring_buffer;

pub use binary_heap::BinaryHeap;
pub use comparator::{EntryComparator, TypedOrder, ascending, descending, lexicographic};
pub use config::CapacityPolicy;
pub use entry_stack::EntryStack;
pub use object_heap::ObjectHeap;
pub use object_queue::ObjectQueue;
pub use object_stack::ObjectStack;
pub use ring_buffer::RingBuffer;
