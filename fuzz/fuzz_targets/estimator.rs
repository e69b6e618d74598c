#![no_main]

use libfuzzer_sys::fuzz_target;
use loglog_registers::{AnyEstimator, CardinalityEstimatorTrait, Variant};
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);

    for variant in Variant::ALL {
        let mut forward = AnyEstimator::<8>::new(variant);
        for chunk in first_half.chunks(4).chain(second_half.chunks(4)) {
            forward.insert(chunk);
            let estimate = forward.estimate();
            assert!(estimate.is_finite() && estimate > 0.0);
            assert!(forward.used_registers() > 0);
        }

        // insertion order must not matter
        let mut backward = AnyEstimator::<8>::new(variant);
        for chunk in second_half.chunks(4).chain(first_half.chunks(4)).rev() {
            backward.insert(chunk);
        }
        assert_eq!(forward, backward);
        assert_eq!(forward.estimate(), backward.estimate());
    }
});
