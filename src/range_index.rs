//! ## Range index
//! Segment tree over per-partition sketches answering union queries over any contiguous range
//! of partitions with `O(log k)` register-wise merges.
//!
//! Nodes are stored in a flat vector using heap addressing:
//! - nodes[0]                  - unused, keeps children of node `i` at `2i` and `2i + 1`
//! - nodes[1]                  - root, union of all partitions
//! - nodes[size..size + k]     - leaves, copies of the partition sketches
//! - nodes[size + k..2 * size] - padding leaves, empty sketches
//!
//! where `size` is `k` rounded up to a power of two. Empty sketches are the identity of merge,
//! so padding doesn't change any union. The tree is built bottom-up one level at a time and
//! never changes afterwards.

use std::hash::Hasher;

use log::debug;
use rayon::prelude::*;
use wyhash::WyHash;

use crate::error::{Error, Result};
use crate::hyperloglog::HyperLogLog;

pub struct RangeIndex<H: Hasher + Default = WyHash> {
    /// Number of indexed partitions
    len: usize,
    /// Position of the first leaf
    size: usize,
    nodes: Vec<HyperLogLog<H>>,
}

impl<H: Hasher + Default> RangeIndex<H> {
    /// Build index over `sketches`, leaf `i` holding a copy of `sketches[i]`.
    ///
    /// Fails with [`Error::EmptyInput`] for no sketches and [`Error::IncompatibleSketch`]
    /// when register counts differ.
    pub fn build(sketches: &[HyperLogLog<H>]) -> Result<Self> {
        let first = sketches.first().ok_or(Error::EmptyInput)?;
        check_register_counts(first.register_count(), sketches)?;

        let len = sketches.len();
        let size = len.next_power_of_two();
        let empty = first.empty_like();

        let mut nodes = Vec::with_capacity(2 * size);
        nodes.resize(size, empty.clone());
        nodes.extend(sketches.iter().cloned());
        nodes.resize(2 * size, empty);

        // Parents of one level live in `nodes[width..2 * width]`, their children right after.
        let mut width = size / 2;
        while width > 0 {
            let (upper, lower) = nodes.split_at_mut(2 * width);
            let children = &lower[..2 * width];
            upper[width..]
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, parent)| {
                    parent.merge_registers(&children[2 * i]);
                    parent.merge_registers(&children[2 * i + 1]);
                });
            width /= 2;
        }

        debug!(
            "built range index: partitions={}, registers={}, nodes={}",
            len,
            first.register_count(),
            nodes.len() - 1
        );

        Ok(Self { len, size, nodes })
    }

    /// Return number of indexed partitions
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn register_count(&self) -> usize {
        self.nodes[1].register_count()
    }

    /// Return node stored at heap `position`, `1` being the root
    #[inline]
    pub fn node(&self, position: usize) -> Option<&HyperLogLog<H>> {
        match position {
            0 => None,
            _ => self.nodes.get(position),
        }
    }

    /// Return union sketch of partitions in `[low, high]`.
    ///
    /// Fails with [`Error::InvalidRange`] when `low > high` or `high` is not a partition.
    pub fn query(&self, low: usize, high: usize) -> Result<HyperLogLog<H>> {
        if low > high || high >= self.len {
            return Err(Error::InvalidRange {
                low,
                high,
                len: self.len,
            });
        }
        Ok(self.union(low, high + 1))
    }

    /// Return union sketch of every partition except `partition`.
    ///
    /// The complement of the only partition of a single-partition index is the empty sketch.
    pub fn complement(&self, partition: usize) -> Result<HyperLogLog<H>> {
        if partition >= self.len {
            return Err(Error::InvalidRange {
                low: partition,
                high: partition,
                len: self.len,
            });
        }
        Ok(self.complement_unchecked(partition))
    }

    /// Complement of a partition known to be in range
    pub(crate) fn complement_unchecked(&self, partition: usize) -> HyperLogLog<H> {
        if partition == 0 {
            self.union(1, self.len)
        } else if partition == self.len - 1 {
            self.union(0, partition)
        } else {
            let mut others = self.union(0, partition);
            others.merge_registers(&self.union(partition + 1, self.len));
            others
        }
    }

    /// Union of partitions in half-open range `[start, end)`, empty sketch for an empty range
    fn union(&self, start: usize, end: usize) -> HyperLogLog<H> {
        let mut result = self.nodes[1].empty_like();
        let mut l = start + self.size;
        let mut r = end + self.size;
        while l < r {
            if l & 1 == 1 {
                result.merge_registers(&self.nodes[l]);
                l += 1;
            }
            if r & 1 == 1 {
                r -= 1;
                result.merge_registers(&self.nodes[r]);
            }
            l >>= 1;
            r >>= 1;
        }
        result
    }
}

/// Ensure every sketch has `register_count` registers
pub(crate) fn check_register_counts<H: Hasher + Default>(
    register_count: usize,
    sketches: &[HyperLogLog<H>],
) -> Result<()> {
    match sketches
        .iter()
        .find(|sketch| sketch.register_count() != register_count)
    {
        Some(sketch) => Err(Error::IncompatibleSketch {
            expected: register_count,
            found: sketch.register_count(),
        }),
        None => Ok(()),
    }
}
