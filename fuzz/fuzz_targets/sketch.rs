#![no_main]

use libfuzzer_sys::fuzz_target;
use ndv_estimator::HyperLogLog;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);
    let register_count = 1 << (data[0] % 12);

    let mut sketch1 = HyperLogLog::<wyhash::WyHash>::new(register_count).unwrap();
    for chunk in first_half.chunks(4) {
        let registers = sketch1.registers().to_vec();
        sketch1.insert(&chunk);
        assert!(sketch1.registers().iter().zip(&registers).all(|(new, old)| new >= old));
        assert!(sketch1.estimate() > 0.0);
    }

    let mut sketch2 = HyperLogLog::<wyhash::WyHash>::new(register_count).unwrap();
    for chunk in second_half.chunks(4) {
        sketch2.insert(&chunk);
    }

    let mut merged1 = sketch1.clone();
    merged1.merge(&sketch2).unwrap();
    let mut merged2 = sketch2.clone();
    merged2.merge(&sketch1).unwrap();
    assert_eq!(merged1, merged2);

    let mut idempotent = merged1.clone();
    idempotent.merge(&sketch1).unwrap();
    assert_eq!(idempotent, merged1);
});
