//! Normalized interval table with logarithmic membership queries.

use super::interval::{merge_intervals, AddressBits, Interval};

/// Sorted, non-overlapping, non-adjacent intervals for one address family.
///
/// Immutable once built. A configuration change builds a new table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTable<T> {
    intervals: Vec<Interval<T>>,
}

/// IPv4 table over 32-bit addresses.
pub type Ipv4Table = RangeTable<u32>;

/// IPv6 table over 128-bit addresses.
pub type Ipv6Table = RangeTable<u128>;

impl<T: AddressBits> RangeTable<T> {
    /// Normalize raw intervals into a table.
    pub fn from_intervals(raw: Vec<Interval<T>>) -> Self {
        Self {
            intervals: merge_intervals(raw),
        }
    }

    /// Whether `addr` falls inside any interval.
    ///
    /// Finds the interval with the greatest `start <= addr`; since the table
    /// is normalized, comparing against its `end` is sufficient.
    pub fn contains(&self, addr: T) -> bool {
        match self.intervals.binary_search_by(|iv| iv.start().cmp(&addr)) {
            Ok(_) => true,
            Err(0) => false,
            Err(idx) => addr <= self.intervals[idx - 1].end(),
        }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn intervals(&self) -> &[Interval<T>] {
        &self.intervals
    }
}

impl<T> Default for RangeTable<T> {
    fn default() -> Self {
        Self {
            intervals: Vec::new(),
        }
    }
}
