//! ## Address and rank decomposition
//! Splits a 32-bit hash into a register index and a rank:
//! - the top `P` bits select one of `M = 2^P` registers
//! - the remaining `32 - P` bits (left-justified) feed the rank function
//!
//! The rank is the number of leading zeros among those `32 - P` bits plus one.
//! For an all-zero remainder no 1-bit was observed in the available window and
//! the rank is `32 - P + 1`.

/// Return register index and rank of a 32-bit hash for precision `P`
#[inline]
pub(crate) fn decode_hash<const P: usize>(hash: u32) -> (usize, u32) {
    let idx = (hash >> (32 - P)) as usize;
    let w = hash << P;
    let rank = if w == 0 {
        (32 - P + 1) as u32
    } else {
        // low `P` bits of `w` are zero, so the first 1-bit lies in the top `32 - P` bits
        w.leading_zeros() + 1
    };
    (idx, rank)
}

/// Fold a 64-bit hash into the 32-bit value consumed by the estimator
#[inline]
pub fn fold_hash(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

/// Parameter for bias correction
#[inline]
pub(crate) fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}
