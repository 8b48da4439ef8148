//! `ndv-estimator` estimates the number of distinct values (NDV) and the number of values seen
//! exactly once (F1) in a sample spread over many partitions, without gathering the sample in one place.
//!
//! Every partition summarises its sample into two mergeable HyperLogLog sketches. The
//! distributed estimator indexes them in a segment tree and combines them by inclusion-exclusion
//! so that values present in several partitions are not counted as singletons.
//!
//! ```
//! use ndv_estimator::{collect_partitions, SampleStatistics};
//! use wyhash::WyHash;
//!
//! let partitions: Vec<Vec<u64>> = vec![
//!     (0..1000).chain(0..500).collect(),
//!     (500..1500).collect(),
//! ];
//! let sketches = collect_partitions::<_, _, WyHash>(&partitions, 1024)?;
//! let statistics = SampleStatistics::from_partitions(sketches)?;
//! println!(
//!     "ndv = {:.0}, f1 = {:.0}, jackknife = {:.0}",
//!     statistics.observed_ndv,
//!     statistics.f1,
//!     statistics.first_order_jackknife()
//! );
//! # Ok::<(), ndv_estimator::Error>(())
//! ```
pub mod distributed;
pub mod error;
pub mod extrapolation;
pub mod hyperloglog;
pub mod partition;
pub mod range_index;

pub use distributed::{estimate_ndv_and_f1, DistributedEstimator};
pub use error::{Error, Result};
pub use extrapolation::SampleStatistics;
pub use hyperloglog::{HyperLogLog, DEFAULT_REGISTER_COUNT};
pub use partition::{collect_partitions, PartitionSketches};
pub use range_index::RangeIndex;
