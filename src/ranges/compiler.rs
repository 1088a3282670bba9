//! CIDR prefix compilation.
//!
//! Turns a list of `address/prefix` strings into one `RangeTable` per
//! address family. Entries that do not parse are skipped with a warning;
//! compilation as a whole never fails.

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;

use super::interval::Interval;
use super::table::{Ipv4Table, Ipv6Table};

/// Compiled IPv4 and IPv6 tables built from one prefix list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledRanges {
    v4: Ipv4Table,
    v6: Ipv6Table,
    skipped: usize,
}

impl CompiledRanges {
    /// Whether `addr` is covered, using only the table of its own family.
    ///
    /// IPv4-mapped IPv6 addresses are not normalized: they are looked up in
    /// the IPv6 table.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(v4) => self.v4.contains(u32::from(v4)),
            IpAddr::V6(v6) => self.v6.contains(u128::from(v6)),
        }
    }

    pub fn v4(&self) -> &Ipv4Table {
        &self.v4
    }

    pub fn v6(&self) -> &Ipv6Table {
        &self.v6
    }

    /// Merged IPv4 interval count.
    pub fn len_v4(&self) -> usize {
        self.v4.len()
    }

    pub fn len_v6(&self) -> usize {
        self.v6.len()
    }

    /// Number of input entries dropped because they did not parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }
}

impl fmt::Display for CompiledRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ipv4 ({} intervals)", self.v4.len())?;
        for iv in self.v4.intervals() {
            writeln!(f, "  {iv}")?;
        }
        writeln!(f, "ipv6 ({} intervals)", self.v6.len())?;
        for iv in self.v6.intervals() {
            writeln!(f, "  {iv}")?;
        }
        Ok(())
    }
}

/// Compile CIDR prefixes into merged per-family tables.
pub fn compile<I, S>(prefixes: I) -> CompiledRanges
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    let mut skipped = 0;

    for entry in prefixes {
        let entry = entry.as_ref();
        match parse_prefix(entry) {
            Some(IpNet::V4(net)) => {
                v4.push(Interval::from_prefix(u32::from(net.addr()), net.prefix_len()));
            }
            Some(IpNet::V6(net)) => {
                v6.push(Interval::from_prefix(u128::from(net.addr()), net.prefix_len()));
            }
            None => {
                skipped += 1;
                tracing::warn!(entry = %entry, "Skipping malformed CIDR entry");
            }
        }
    }

    let compiled = CompiledRanges {
        v4: Ipv4Table::from_intervals(v4),
        v6: Ipv6Table::from_intervals(v6),
        skipped,
    };

    tracing::debug!(
        ipv4_intervals = compiled.v4.len(),
        ipv6_intervals = compiled.v6.len(),
        skipped,
        "Compiled address ranges"
    );

    compiled
}

/// Parse `address/prefix`. A bare address without a prefix is rejected.
fn parse_prefix(entry: &str) -> Option<IpNet> {
    let entry = entry.trim();
    if !entry.contains('/') {
        return None;
    }
    entry.parse::<IpNet>().ok()
}
