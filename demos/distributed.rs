use hashbrown::HashSet;
use ndv_estimator::{collect_partitions, SampleStatistics};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wyhash::WyHash;

const PARTITIONS: usize = 10;
const VALUES_PER_PARTITION: usize = 200_000;
const SAMPLE_RATE: f64 = 0.2;
const REGISTER_COUNT: usize = 1 << 16;

fn main() -> Result<(), ndv_estimator::Error> {
    let mut rng = StdRng::seed_from_u64(7);

    // Skewed data: small values are far more frequent than large ones.
    let data: Vec<Vec<u64>> = (0..PARTITIONS)
        .map(|_| {
            (0..VALUES_PER_PARTITION)
                .map(|_| {
                    let bits = rng.gen_range(1..24);
                    rng.gen_range(0..1u64 << bits)
                })
                .collect()
        })
        .collect();
    let actual_ndv = data.iter().flatten().collect::<HashSet<_>>().len();

    let samples: Vec<Vec<u64>> = data
        .iter()
        .map(|partition| {
            partition
                .iter()
                .copied()
                .filter(|_| rng.gen_bool(SAMPLE_RATE))
                .collect()
        })
        .collect();

    let sketches = collect_partitions::<_, _, WyHash>(&samples, REGISTER_COUNT)?;
    let statistics = SampleStatistics::from_partitions(sketches)?;
    let estimated_ndv = statistics.first_order_jackknife();

    println!(
        "partitions: {}, sample rate: {}, registers: {}",
        PARTITIONS, SAMPLE_RATE, REGISTER_COUNT
    );
    println!(
        "samples: {}, observed ndv: {:.0}, f1: {:.0}",
        statistics.sample_count, statistics.observed_ndv, statistics.f1
    );
    println!(
        "actual ndv: {}, first-order jackknife ndv: {:.0}, q-error: {:.3}",
        actual_ndv,
        estimated_ndv,
        q_error(actual_ndv as f64, estimated_ndv)
    );
    Ok(())
}

fn q_error(actual: f64, estimate: f64) -> f64 {
    if actual > estimate {
        actual / estimate
    } else {
        estimate / actual
    }
}
