//! ## HyperLogLog sketch
//! Estimates the number of distinct items inserted into it using `M` one-byte registers,
//! where `M` is a power of two chosen at construction.
//!
//! [Original HyperLogLog paper](http://algo.inria.fr/flajolet/Publications/FlFuGaMe07.pdf)
//!
//! Hash layout for a sketch with `M = 2^B` registers:
//! - top `B` bits      - register index
//! - remaining bits    - rank source, the register stores the position of their leftmost set bit
//!
//! Expected relative error is `1.04 / sqrt(M)`:
//!   M = 64:   13.00%
//!   M = 1024:  3.25%
//!   M = 4096:  1.62%
//!
//! Registers only ever grow, so merging two sketches is a register-wise maximum. Merge is
//! commutative, associative and idempotent, which lets sketches of disjoint partitions be
//! combined in any grouping.

use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::mem::size_of;

use wyhash::WyHash;

use crate::error::{Error, Result};

/// Number of registers used by `HyperLogLog::default()`
pub const DEFAULT_REGISTER_COUNT: usize = 1 << 12;

/// HyperLogLog cardinality sketch.
///
/// Sketches can only be merged when they share both the register count and the hasher `H`;
/// the hasher is part of the type so mixing hash functions is rejected at compile time.
pub struct HyperLogLog<H: Hasher + Default = WyHash> {
    /// Number of registers, always a power of two
    register_count: usize,
    /// `log2(register_count)`, number of hash bits used for the register index
    index_bits: u32,
    /// Bias correction constant for `register_count`
    alpha: f64,
    /// Register ranks
    registers: Box<[u8]>,
    /// Zero-sized build hasher, every insert hashes with a fresh `H`
    build_hasher: BuildHasherDefault<H>,
}

impl<H: Hasher + Default> HyperLogLog<H> {
    /// Creates new empty sketch with `register_count` registers.
    ///
    /// Fails with [`Error::InvalidConfiguration`] unless `register_count` is a positive power of two.
    pub fn new(register_count: usize) -> Result<Self> {
        if !register_count.is_power_of_two() {
            return Err(Error::InvalidConfiguration(register_count));
        }
        Ok(Self::zeroed(register_count))
    }

    /// Create sketch without validating `register_count`
    #[inline]
    fn zeroed(register_count: usize) -> Self {
        Self {
            register_count,
            index_bits: register_count.trailing_zeros(),
            alpha: alpha(register_count),
            registers: vec![0u8; register_count].into_boxed_slice(),
            build_hasher: BuildHasherDefault::default(),
        }
    }

    /// Create empty sketch with the same configuration as `self`
    #[inline]
    pub(crate) fn empty_like(&self) -> Self {
        Self::zeroed(self.register_count)
    }

    #[inline]
    pub fn register_count(&self) -> usize {
        self.register_count
    }

    #[inline]
    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[inline]
    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Return number of registers still set to zero
    #[inline]
    pub fn zero_registers(&self) -> usize {
        self.registers.iter().filter(|&&r| r == 0).count()
    }

    /// Return whether nothing was inserted or merged since construction or last `reset`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registers.iter().all(|&r| r == 0)
    }

    /// Insert a hashable item into the sketch
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        let hash = hasher.finish();
        self.insert_hash(hash);
    }

    /// Insert already computed 64-bit hash into the sketch
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        let (idx, rank) = self.decode_hash(hash);
        let register = &mut self.registers[idx];
        if rank > *register {
            *register = rank;
        }
    }

    /// Return register index and rank of `hash`.
    ///
    /// An all-zero remainder gets rank `64 - B + 1`, one above the highest rank a set bit can produce.
    #[inline]
    fn decode_hash(&self, hash: u64) -> (usize, u8) {
        let idx = hash.checked_shr(64 - self.index_bits).unwrap_or(0) as usize;
        let max_rank = 64 - self.index_bits + 1;
        let rank = ((hash << self.index_bits).leading_zeros() + 1).min(max_rank);
        (idx, rank as u8)
    }

    /// Return cardinality estimate.
    ///
    /// Uses linear counting while the raw estimate is at most `2.5 * M` and some registers are
    /// still zero. An empty sketch estimates exactly `0.0`.
    pub fn estimate(&self) -> f64 {
        let m = self.register_count as f64;
        let sum: f64 = self
            .registers
            .iter()
            .map(|&r| 2f64.powi(-i32::from(r)))
            .sum();
        let estimate = self.alpha * m * m / sum;
        if estimate <= 2.5 * m {
            let zeros = self.zero_registers();
            if zeros > 0 {
                return m * (m / zeros as f64).ln();
            }
        }
        estimate
    }

    /// Merge `rhs` into `self`, making `self` the sketch of the union of both item sets.
    ///
    /// Fails with [`Error::IncompatibleSketch`] when register counts differ, leaving `self` untouched.
    pub fn merge(&mut self, rhs: &Self) -> Result<()> {
        if self.register_count != rhs.register_count {
            return Err(Error::IncompatibleSketch {
                expected: self.register_count,
                found: rhs.register_count,
            });
        }
        self.merge_registers(rhs);
        Ok(())
    }

    /// Register-wise maximum, caller must ensure both sketches have the same register count
    #[inline]
    pub(crate) fn merge_registers(&mut self, rhs: &Self) {
        debug_assert_eq!(self.register_count, rhs.register_count);
        for (lhs, &rhs) in self.registers.iter_mut().zip(rhs.registers.iter()) {
            *lhs = (*lhs).max(rhs);
        }
    }

    /// Set every register back to zero
    #[inline]
    pub fn reset(&mut self) {
        self.registers.fill(0);
    }

    /// Return memory size of the sketch
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.registers.len()
    }
}

impl<H: Hasher + Default> Default for HyperLogLog<H> {
    fn default() -> Self {
        Self::zeroed(DEFAULT_REGISTER_COUNT)
    }
}

impl<H: Hasher + Default> Clone for HyperLogLog<H> {
    fn clone(&self) -> Self {
        Self {
            register_count: self.register_count,
            index_bits: self.index_bits,
            alpha: self.alpha,
            registers: self.registers.clone(),
            build_hasher: BuildHasherDefault::default(),
        }
    }
}

impl<H: Hasher + Default> PartialEq for HyperLogLog<H> {
    /// Compare sketches register by register
    fn eq(&self, rhs: &Self) -> bool {
        self.register_count == rhs.register_count && self.registers == rhs.registers
    }
}

impl<H: Hasher + Default> Debug for HyperLogLog<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ registers: {}, estimate: {:.2}, size: {} }}",
            self.register_count,
            self.estimate(),
            self.size_of()
        )
    }
}

/// Parameter for bias correction
#[inline]
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}
