//! Closed address intervals and the merge sweep.
//!
//! # Responsibilities
//! - Represent `[start, end]` over a fixed-width unsigned address domain
//! - Compute the host mask for a prefix length
//! - Collapse overlapping and adjacent intervals into a minimal sorted set
//!
//! # Design Decisions
//! - One generic merge over `AddressBits`; the width is chosen at the type level
//! - `successor` returns `None` at the top of the domain instead of wrapping

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Unsigned integer domain backing one address family.
pub trait AddressBits: Copy + Ord + fmt::Debug + Send + Sync + 'static {
    /// Width of the domain in bits (32 or 128).
    const WIDTH: u8;

    /// `self + 1`, or `None` if `self` is the largest value of the domain.
    fn successor(self) -> Option<Self>;

    /// Mask with the low `WIDTH - prefix_len` bits set.
    ///
    /// `prefix_len` must not exceed `WIDTH`.
    fn host_mask(prefix_len: u8) -> Self;

    /// Bitwise OR, used to extend a network literal to the end of its block.
    fn or(self, other: Self) -> Self;

    /// Render a value as an address of the matching family.
    fn fmt_addr(self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl AddressBits for u32 {
    const WIDTH: u8 = 32;

    fn successor(self) -> Option<Self> {
        self.checked_add(1)
    }

    fn host_mask(prefix_len: u8) -> Self {
        debug_assert!(prefix_len <= Self::WIDTH);
        u32::MAX.checked_shr(u32::from(prefix_len)).unwrap_or(0)
    }

    fn or(self, other: Self) -> Self {
        self | other
    }

    fn fmt_addr(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv4Addr::from(self))
    }
}

impl AddressBits for u128 {
    const WIDTH: u8 = 128;

    fn successor(self) -> Option<Self> {
        self.checked_add(1)
    }

    fn host_mask(prefix_len: u8) -> Self {
        debug_assert!(prefix_len <= Self::WIDTH);
        u128::MAX.checked_shr(u32::from(prefix_len)).unwrap_or(0)
    }

    fn or(self, other: Self) -> Self {
        self | other
    }

    fn fmt_addr(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv6Addr::from(self))
    }
}

/// A closed range `[start, end]` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval<T> {
    start: T,
    end: T,
}

impl<T: AddressBits> Interval<T> {
    /// Create an interval. Returns `None` if `start > end`.
    pub fn new(start: T, end: T) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Interval covered by `network/prefix_len`.
    ///
    /// The network literal is used as given: host bits below the prefix are
    /// not cleared, so a misaligned literal anchors the interval at itself.
    pub fn from_prefix(network: T, prefix_len: u8) -> Self {
        Self {
            start: network,
            end: network.or(T::host_mask(prefix_len)),
        }
    }

    pub fn start(&self) -> T {
        self.start
    }

    pub fn end(&self) -> T {
        self.end
    }

    /// Whether `addr` lies inside this interval.
    pub fn contains(&self, addr: T) -> bool {
        self.start <= addr && addr <= self.end
    }

    /// Whether `next` overlaps or directly follows this interval.
    fn touches(&self, next: &Self) -> bool {
        match self.end.successor() {
            Some(after_end) => next.start <= after_end,
            // Ends at the domain maximum: everything after it is covered.
            None => true,
        }
    }
}

impl<T: AddressBits> fmt::Display for Interval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.start.fmt_addr(f)?;
        f.write_str(" - ")?;
        self.end.fmt_addr(f)
    }
}

/// Sort and merge intervals so that no two results overlap or touch.
///
/// The output is strictly ascending and, for consecutive entries `a, b`,
/// satisfies `a.end + 1 < b.start`.
pub fn merge_intervals<T: AddressBits>(mut intervals: Vec<Interval<T>>) -> Vec<Interval<T>> {
    if intervals.len() < 2 {
        return intervals;
    }

    intervals.sort_unstable_by_key(|iv| iv.start);

    let mut merged = Vec::with_capacity(intervals.len());
    let mut iter = intervals.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for next in iter {
        if current.touches(&next) {
            current.end = current.end.max(next.end);
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);

    merged
}
