use std::fmt::Write;
use crate::cache::{LOAD_CODE, STORE_CODE};

/// Renders `(code, address)` pairs in the trace text format, with a fixed access size of 4
pub fn render_trace<I: IntoIterator<Item = (u8, u64)>>(accesses: I) -> String {
    let mut out = String::new();
    for (code, address) in accesses {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{} {address:#010x} 4", code as char);
    }
    out
}

/// A strided sweep over `footprint` bytes, repeated `passes` times
///
/// Every eighth access is a store. Sweeps larger than the cache thrash it under both policies,
/// smaller ones hit after the first pass
pub fn strided_trace(footprint: u64, stride: u64, passes: usize) -> String {
    let steps = footprint / stride.max(1);
    render_trace((0..passes).flat_map(|_| 0..steps).enumerate().map(|(i, step)| {
        let code = if i % 8 == 7 { STORE_CODE } else { LOAD_CODE };
        (code, step * stride)
    }))
}

/// A deterministic pseudo random trace over `footprint` bytes, using a linear congruential
/// generator so benchmarks replay the same accesses every time
pub fn scattered_trace(footprint: u64, accesses: usize, seed: u64) -> String {
    let mut state = seed;
    render_trace((0..accesses).map(|i| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let code = if i % 4 == 3 { STORE_CODE } else { LOAD_CODE };
        (code, (state >> 16) % footprint.max(1))
    }))
}
