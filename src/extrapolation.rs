//! Extrapolation from sample statistics to the full dataset.
//!
//! The distributed estimator only describes the sample. Extrapolation formulas correct the
//! observed NDV upwards for values the sample never saw, using the number of singletons.

use std::hash::Hasher;

use crate::distributed::DistributedEstimator;
use crate::error::Result;
use crate::partition::PartitionSketches;

/// Global statistics of a sample collected over all partitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStatistics {
    /// Estimated number of distinct sampled values
    pub observed_ndv: f64,
    /// Estimated number of values sampled exactly once, may be negative due to estimator noise
    pub f1: f64,
    /// Total number of sampled values
    pub sample_count: usize,
}

impl SampleStatistics {
    /// Run the distributed estimator over collected partitions
    pub fn from_partitions<H: Hasher + Default>(
        partitions: Vec<PartitionSketches<H>>,
    ) -> Result<Self> {
        let sample_count = partitions.iter().map(|p| p.sample_count).sum();
        let (observed_ndv, f1) = DistributedEstimator::from_partitions(partitions)?.estimate_both();
        Ok(Self {
            observed_ndv,
            f1,
            sample_count,
        })
    }

    /// First-order Jackknife: `observed_ndv + (n - 1) / n * f1`.
    ///
    /// Negative `f1` is treated as zero. Returns `observed_ndv` for an empty sample.
    ///
    /// https://mmeredith.net/blog/2013/1312_Jackknife_estimators.htm
    pub fn first_order_jackknife(&self) -> f64 {
        if self.sample_count == 0 {
            return self.observed_ndv;
        }
        let n = self.sample_count as f64;
        self.observed_ndv + (n - 1.0) / n * self.f1.max(0.0)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::error::Error;
    use crate::partition::collect_partitions;
    use test_case::test_case;
    use wyhash::WyHash;

    #[test_case(100.0, 8.0, 4 => 106.0; "positive f1")]
    #[test_case(100.0, -3.0, 4 => 100.0; "negative f1 clamped")]
    #[test_case(100.0, 50.0, 1 => 100.0; "single sample")]
    #[test_case(0.0, 0.0, 0 => 0.0; "empty sample")]
    fn test_first_order_jackknife(observed_ndv: f64, f1: f64, sample_count: usize) -> f64 {
        SampleStatistics {
            observed_ndv,
            f1,
            sample_count,
        }
        .first_order_jackknife()
    }

    #[test]
    fn test_from_partitions() {
        // each partition samples its own values twice and 200 values once
        let partitions: Vec<Vec<u64>> = (0..4u64)
            .map(|i| {
                let base = i * 10_000;
                (base..base + 300)
                    .chain(base..base + 300)
                    .chain(base + 5000..base + 5200)
                    .collect()
            })
            .collect();
        let collected = collect_partitions::<_, _, WyHash>(&partitions, 4096).unwrap();
        let statistics = SampleStatistics::from_partitions(collected).unwrap();

        assert_eq!(statistics.sample_count, 4 * 800);
        assert!((statistics.observed_ndv - 2000.0).abs() < 100.0);
        assert!((statistics.f1 - 800.0).abs() < 80.0);
        assert!(statistics.first_order_jackknife() > statistics.observed_ndv);
    }

    #[test]
    fn test_from_partitions_empty() {
        assert_eq!(
            SampleStatistics::from_partitions::<WyHash>(vec![]).err(),
            Some(Error::EmptyInput)
        );
    }
}
