//! Per-partition sketch collection.
//!
//! Each partition summarises its already sampled values into two sketches: one of every
//! distinct value and one of the values that occur exactly once in the sample. Partitions are
//! independent, so `collect_partitions` builds them concurrently.

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};

use hashbrown::HashMap;
use rayon::prelude::*;
use wyhash::WyHash;

use crate::error::Result;
use crate::hyperloglog::HyperLogLog;

/// Sketches summarising the sample of one partition
pub struct PartitionSketches<H: Hasher + Default = WyHash> {
    /// Sketch of all distinct sampled values
    pub ndv: HyperLogLog<H>,
    /// Sketch of values sampled exactly once
    pub f1: HyperLogLog<H>,
    /// Number of sampled values, duplicates included
    pub sample_count: usize,
}

impl<H: Hasher + Default> PartitionSketches<H> {
    /// Summarise `samples` of one partition into sketches with `register_count` registers
    pub fn from_samples<T: Hash + Eq>(samples: &[T], register_count: usize) -> Result<Self> {
        let mut ndv = HyperLogLog::new(register_count)?;
        let mut f1 = ndv.empty_like();

        let mut frequencies: HashMap<&T, usize> = HashMap::new();
        for value in samples {
            *frequencies.entry(value).or_insert(0) += 1;
        }
        for (value, frequency) in frequencies {
            ndv.insert(value);
            if frequency == 1 {
                f1.insert(value);
            }
        }

        Ok(Self {
            ndv,
            f1,
            sample_count: samples.len(),
        })
    }
}

impl<H: Hasher + Default> Clone for PartitionSketches<H> {
    fn clone(&self) -> Self {
        Self {
            ndv: self.ndv.clone(),
            f1: self.f1.clone(),
            sample_count: self.sample_count,
        }
    }
}

impl<H: Hasher + Default> PartialEq for PartitionSketches<H> {
    fn eq(&self, rhs: &Self) -> bool {
        self.sample_count == rhs.sample_count && self.ndv == rhs.ndv && self.f1 == rhs.f1
    }
}

impl<H: Hasher + Default> Debug for PartitionSketches<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionSketches")
            .field("ndv", &self.ndv)
            .field("f1", &self.f1)
            .field("sample_count", &self.sample_count)
            .finish()
    }
}

/// Summarise the samples of every partition, preserving partition order
pub fn collect_partitions<T, S, H>(
    partitions: &[S],
    register_count: usize,
) -> Result<Vec<PartitionSketches<H>>>
where
    T: Hash + Eq + Sync,
    S: AsRef<[T]> + Sync,
    H: Hasher + Default,
{
    partitions
        .par_iter()
        .map(|samples| PartitionSketches::from_samples(samples.as_ref(), register_count))
        .collect()
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_from_samples() {
        let samples = [1u64, 2, 2, 3, 4, 4, 4, 5];
        let partition = PartitionSketches::<WyHash>::from_samples(&samples, 64).unwrap();
        assert_eq!(partition.sample_count, 8);

        let mut ndv = HyperLogLog::new(64).unwrap();
        for value in [1u64, 2, 3, 4, 5] {
            ndv.insert(&value);
        }
        let mut f1 = HyperLogLog::new(64).unwrap();
        for value in [1u64, 3, 5] {
            f1.insert(&value);
        }
        assert_eq!(partition.ndv, ndv);
        assert_eq!(partition.f1, f1);
    }

    #[test]
    fn test_from_samples_empty() {
        let partition = PartitionSketches::<WyHash>::from_samples::<u64>(&[], 16).unwrap();
        assert_eq!(partition.sample_count, 0);
        assert!(partition.ndv.is_empty());
        assert!(partition.f1.is_empty());
    }

    #[test]
    fn test_from_samples_invalid_register_count() {
        assert_eq!(
            PartitionSketches::<WyHash>::from_samples(&["a", "b"], 48).err(),
            Some(Error::InvalidConfiguration(48))
        );
    }

    #[test]
    fn test_collect_partitions_preserves_order() {
        let partitions: Vec<Vec<u64>> = (0..8u64)
            .map(|i| (0..100 * (i + 1)).map(|v| v * 7 + i).collect())
            .collect();
        let collected = collect_partitions::<_, _, WyHash>(&partitions, 256).unwrap();
        assert_eq!(collected.len(), partitions.len());
        for (samples, partition) in partitions.iter().zip(&collected) {
            assert_eq!(
                partition,
                &PartitionSketches::from_samples(samples.as_slice(), 256).unwrap()
            );
        }
    }
}
