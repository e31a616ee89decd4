//! Capacity policy shared by the growable collections.

use ringheap_common::{Result, error::Error, verify_arg};

/// Capacity of a collection created without an explicit one.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// `shrink()` never goes below this many entries.
pub const DEFAULT_MIN_CAPACITY: usize = 4;

/// `shrink()` only halves the capacity once `len <= capacity / DEFAULT_SHRINK_DIVISOR`.
pub const DEFAULT_SHRINK_DIVISOR: usize = 4;

/// Growth and shrink thresholds for a collection.
///
/// Growth itself is fixed: a full collection doubles its capacity (minimum 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    /// Capacity used when the caller does not supply one.
    pub initial_capacity: usize,
    /// Floor for `shrink()`.
    pub min_capacity: usize,
    /// Occupancy divisor below which `shrink()` halves the capacity.
    pub shrink_divisor: usize,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            min_capacity: DEFAULT_MIN_CAPACITY,
            shrink_divisor: DEFAULT_SHRINK_DIVISOR,
        }
    }
}

impl CapacityPolicy {
    /// Validates the policy and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        verify_arg!(min_capacity, self.min_capacity > 0);
        verify_arg!(shrink_divisor, self.shrink_divisor >= 2);
        Ok(())
    }

    /// Capacity after one growth step: double, minimum 1.
    pub fn grown_capacity(&self, capacity: usize) -> Result<usize> {
        capacity
            .checked_mul(2)
            .map(|c| c.max(1))
            .ok_or_else(|| Error::invalid_arg("capacity", "doubled capacity overflows"))
    }

    /// Smallest capacity holding `len + additional` entries: the next power of two,
    /// or the exact count when no power of two is representable.
    ///
    /// Returns `None` when `capacity` already fits.
    pub fn capacity_to_fit(
        &self,
        len: usize,
        additional: usize,
        capacity: usize,
    ) -> Result<Option<usize>> {
        let needed = len
            .checked_add(additional)
            .ok_or_else(|| Error::invalid_arg("additional", "len + additional overflows"))?;
        if needed <= capacity {
            return Ok(None);
        }
        Ok(Some(needed.checked_next_power_of_two().unwrap_or(needed)))
    }

    /// Capacity after one shrink step, or `None` when the collection should keep
    /// its current capacity.
    pub fn shrunk_capacity(&self, len: usize, capacity: usize) -> Option<usize> {
        if capacity <= self.min_capacity || len > capacity / self.shrink_divisor {
            return None;
        }
        let target = (capacity / 2).max(self.min_capacity).max(len);
        (target < capacity).then_some(target)
    }
}
