//! ## Correction policies
//! Converts the raw harmonic-mean estimate `alpha * M^2 / sum(2^-register)` into the
//! final cardinality estimate.
//!
//! All policies share two regimes:
//! - small range: while some registers are still empty and the raw estimate is below
//!   `2.5 * M`, linear counting `M * ln(M / zeros)` is used instead.
//! - large range: once the estimate exceeds `2^32 / 30`, hash space collisions are
//!   compensated with `-2^32 * ln(1 - E / 2^32)`.
//!
//! They differ in how the raw estimate is adjusted between these regimes:
//! - `Uncorrected` returns it as is.
//! - `BiasTable` multiplies it by an empirically tuned factor keyed by `raw / M`.
//! - `SaturationAware` scales it up when many registers hit the packing ceiling.

use tracing::trace;

/// Size of the 32-bit hash space
const HASH_SPACE: f64 = 4_294_967_296.0;
/// Estimate above which large range correction is applied
const LARGE_RANGE_THRESHOLD: f64 = HASH_SPACE / 30.0;
/// Ratio `raw / M` below which linear counting is preferred
const SMALL_RANGE_RATIO: f64 = 2.5;
/// Fraction of empty registers below which `BiasTable` applies `SPARSE_ZEROS_PENALTY`
const SPARSE_ZEROS_FRACTION: f64 = 0.01;
const SPARSE_ZEROS_PENALTY: f64 = 0.98;
/// Fraction of saturated registers above which `SaturationAware` scales the estimate up
const SATURATION_FRACTION: f64 = 0.01;
const SATURATION_WEIGHT: f64 = 0.5;
/// Flat deflation applied by `SaturationAware`
const PACKED_DEFLATION: f64 = 0.99;

/// Multiplicative bias correction bands as `(upper bound of raw / M, factor)` pairs,
/// evaluated top-down. The first band only applies when no register is empty,
/// otherwise linear counting takes over.
pub const BIAS_BANDS: [(f64, f64); 8] = [
    (2.5, 0.97),
    (5.0, 0.98),
    (10.0, 0.985),
    (20.0, 0.99),
    (40.0, 0.995),
    (60.0, 1.00),
    (80.0, 0.98),
    (f64::INFINITY, 0.96),
];

/// Aggregate register state consumed by correction policies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegisterSummary {
    /// Number of registers `M`
    pub registers: usize,
    /// Number of registers still set to zero
    pub zeros: usize,
    /// Number of registers at the store's maximum value
    pub saturated: usize,
}

impl RegisterSummary {
    /// Fraction of registers still set to zero
    #[inline]
    pub fn zero_fraction(&self) -> f64 {
        self.zeros as f64 / self.registers as f64
    }

    /// Fraction of registers at the store's maximum value
    #[inline]
    pub fn saturated_fraction(&self) -> f64 {
        self.saturated as f64 / self.registers as f64
    }

    /// Linear counting estimate, `None` when no register is empty
    #[inline]
    fn linear_counting(&self) -> Option<f64> {
        (self.zeros > 0).then(|| linear_counting(self.registers, self.zeros))
    }
}

/// Correction policy turning a raw harmonic-mean estimate into the final estimate.
pub trait CorrectionPolicy {
    /// Return corrected estimate for `raw` estimate of registers described by `summary`
    fn correct(raw: f64, summary: &RegisterSummary) -> f64;
}

/// Classic HyperLogLog corrections only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uncorrected;

/// Empirically tuned multiplicative bias table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BiasTable;

/// Saturation-aware correction for packed registers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaturationAware;

impl CorrectionPolicy for Uncorrected {
    #[inline]
    fn correct(raw: f64, summary: &RegisterSummary) -> f64 {
        if raw <= SMALL_RANGE_RATIO * summary.registers as f64 {
            if let Some(estimate) = summary.linear_counting() {
                trace!(raw, zeros = summary.zeros, "linear counting");
                return estimate;
            }
        }
        large_range_correction(raw)
    }
}

impl CorrectionPolicy for BiasTable {
    #[inline]
    fn correct(raw: f64, summary: &RegisterSummary) -> f64 {
        let ratio = raw / summary.registers as f64;
        if ratio < SMALL_RANGE_RATIO {
            if let Some(estimate) = summary.linear_counting() {
                trace!(raw, zeros = summary.zeros, "linear counting");
                return estimate;
            }
        }

        let mut factor = bias_factor(ratio);
        if summary.zero_fraction() < SPARSE_ZEROS_FRACTION {
            factor *= SPARSE_ZEROS_PENALTY;
        }
        trace!(raw, ratio, factor, "bias table");
        large_range_correction(raw * factor)
    }
}

impl CorrectionPolicy for SaturationAware {
    #[inline]
    fn correct(raw: f64, summary: &RegisterSummary) -> f64 {
        if raw <= SMALL_RANGE_RATIO * summary.registers as f64 {
            if let Some(estimate) = summary.linear_counting() {
                trace!(raw, zeros = summary.zeros, "linear counting");
                return estimate;
            }
        }

        let mut estimate = raw;
        let saturated = summary.saturated_fraction();
        if saturated > SATURATION_FRACTION {
            trace!(raw, saturated, "saturated registers");
            estimate *= 1.0 + saturated * SATURATION_WEIGHT;
        }
        large_range_correction(estimate * PACKED_DEFLATION)
    }
}

/// Return bias correction factor for `ratio = raw / M`
#[inline]
pub fn bias_factor(ratio: f64) -> f64 {
    BIAS_BANDS
        .iter()
        .find(|&&(upper, _)| ratio < upper)
        .map_or(BIAS_BANDS[BIAS_BANDS.len() - 1].1, |&(_, factor)| factor)
}

/// Linear counting estimate of `m` registers with `zeros` empty ones
#[inline]
pub fn linear_counting(m: usize, zeros: usize) -> f64 {
    let m = m as f64;
    m * (m / zeros as f64).ln()
}

/// Compensate 32-bit hash collisions for estimates above `2^32 / 30`.
///
/// The correction diverges as the estimate approaches `2^32`, estimates at or beyond the
/// hash space size are returned unchanged.
#[inline]
pub fn large_range_correction(estimate: f64) -> f64 {
    if estimate <= LARGE_RANGE_THRESHOLD || estimate >= HASH_SPACE {
        return estimate;
    }
    trace!(estimate, "large range correction");
    -HASH_SPACE * (1.0 - estimate / HASH_SPACE).ln()
}
