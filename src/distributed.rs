//! ## Distributed estimator
//! Combines per-partition sketches into two global estimates over the combined sample:
//! - NDV: number of distinct sampled values, the union of all partition sketches.
//! - F1: number of values sampled exactly once overall.
//!
//! A value is a global singleton when it is a singleton in the sample of its partition and
//! absent from every other partition. With `X_i` the singletons of partition `i` and `Y_i` the
//! values of all other partitions:
//!
//! `F1 = sum(|X_i \ Y_i|) ~ sum(NDV(X_i U Y_i) - NDV(Y_i))`
//!
//! `Y_i` comes from the range index as the union of the partitions left and right of `i`.
//!
//! Paper: https://arxiv.org/pdf/2206.05476.pdf

use std::hash::Hasher;

use log::{debug, trace};
use rayon::prelude::*;
use wyhash::WyHash;

use crate::error::{Error, Result};
use crate::hyperloglog::HyperLogLog;
use crate::partition::PartitionSketches;
use crate::range_index::{check_register_counts, RangeIndex};

/// Estimator over a fixed set of partitions, immutable once built.
pub struct DistributedEstimator<H: Hasher + Default = WyHash> {
    /// Sketch of all sampled values per partition
    ndv_sketches: Vec<HyperLogLog<H>>,
    /// Sketch of values sampled exactly once per partition
    f1_sketches: Vec<HyperLogLog<H>>,
    /// Union index over `ndv_sketches`
    index: RangeIndex<H>,
}

impl<H: Hasher + Default> DistributedEstimator<H> {
    /// Build estimator from one ndv and one f1 sketch per partition.
    ///
    /// Fails with [`Error::LengthMismatch`], [`Error::EmptyInput`] or [`Error::IncompatibleSketch`]
    /// (checked in that order). All sketches must share the register count of `ndv_sketches[0]`.
    pub fn new(
        ndv_sketches: Vec<HyperLogLog<H>>,
        f1_sketches: Vec<HyperLogLog<H>>,
    ) -> Result<Self> {
        if ndv_sketches.len() != f1_sketches.len() {
            return Err(Error::LengthMismatch {
                ndv: ndv_sketches.len(),
                f1: f1_sketches.len(),
            });
        }
        let register_count = ndv_sketches
            .first()
            .ok_or(Error::EmptyInput)?
            .register_count();
        check_register_counts(register_count, &f1_sketches)?;
        let index = RangeIndex::build(&ndv_sketches)?;

        debug!(
            "built distributed estimator: partitions={}, registers={}",
            ndv_sketches.len(),
            register_count
        );

        Ok(Self {
            ndv_sketches,
            f1_sketches,
            index,
        })
    }

    /// Build estimator from collected partitions
    pub fn from_partitions(partitions: Vec<PartitionSketches<H>>) -> Result<Self> {
        let (ndv_sketches, f1_sketches) = partitions
            .into_iter()
            .map(|partition| (partition.ndv, partition.f1))
            .unzip();
        Self::new(ndv_sketches, f1_sketches)
    }

    /// Return number of partitions
    #[inline]
    pub fn partitions(&self) -> usize {
        self.ndv_sketches.len()
    }

    #[inline]
    pub fn register_count(&self) -> usize {
        self.index.register_count()
    }

    /// Return union sketch of partitions in `[low, high]`
    pub fn query_range(&self, low: usize, high: usize) -> Result<HyperLogLog<H>> {
        self.index.query(low, high)
    }

    /// Return union sketch of all partitions except `partition`
    pub fn complement_of(&self, partition: usize) -> Result<HyperLogLog<H>> {
        self.index.complement(partition)
    }

    /// Return estimated number of distinct values in the combined sample
    pub fn estimate_global_ndv(&self) -> f64 {
        let mut union = self.ndv_sketches[0].empty_like();
        for sketch in &self.ndv_sketches {
            union.merge_registers(sketch);
        }
        union.estimate()
    }

    /// Return estimated number of values sampled exactly once across all partitions.
    ///
    /// The estimate is the raw difference of sketch estimates and may be fractional or
    /// slightly negative when the true count is close to zero.
    pub fn estimate_global_f1(&self) -> f64 {
        let singletons: Vec<f64> = (0..self.partitions())
            .into_par_iter()
            .map(|partition| self.singletons_unchecked(partition))
            .collect();
        // summed in partition order to keep the result deterministic
        let f1: f64 = singletons.iter().sum();
        if f1 < 0.0 {
            debug!("negative f1 estimate {} from {} partitions", f1, singletons.len());
        }
        f1
    }

    /// Return `(estimate_global_ndv(), estimate_global_f1())`
    pub fn estimate_both(&self) -> (f64, f64) {
        (self.estimate_global_ndv(), self.estimate_global_f1())
    }

    /// Return estimated number of values sampled once in `partition` and never elsewhere
    pub fn partition_singletons(&self, partition: usize) -> Result<f64> {
        if partition >= self.partitions() {
            return Err(Error::InvalidRange {
                low: partition,
                high: partition,
                len: self.partitions(),
            });
        }
        Ok(self.singletons_unchecked(partition))
    }

    fn singletons_unchecked(&self, partition: usize) -> f64 {
        let others = self.index.complement_unchecked(partition);
        let mut union = self.f1_sketches[partition].clone();
        union.merge_registers(&others);
        let singletons = union.estimate() - others.estimate();
        trace!("partition {} singletons: {}", partition, singletons);
        singletons
    }
}

/// Estimate global NDV and F1 from one ndv and one f1 sketch per partition
pub fn estimate_ndv_and_f1<H: Hasher + Default>(
    ndv_sketches: Vec<HyperLogLog<H>>,
    f1_sketches: Vec<HyperLogLog<H>>,
) -> Result<(f64, f64)> {
    DistributedEstimator::new(ndv_sketches, f1_sketches).map(|estimator| estimator.estimate_both())
}
