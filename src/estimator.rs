//! HyperLogLog estimator allows to estimate number of distinct elements
//! in the stream or dataset and is defined with const `P` parameter and three strategies:
//! - `P`: precision parameter in [4..16] range, which defines
//!   number of bits to use for HyperLogLog register indices (`M = 2^P` registers).
//! - `R`: register store, see [`crate::registers`].
//! - `C`: correction policy, see [`crate::correction`].
//! - `H`: hasher used by `insert` to turn items into hashes.
//!
//! # Data-structure design rationale
//!
//! ## Shared ingest path
//! All variants share one address/rank decomposition and one max-merge update rule:
//! a 32-bit hash selects a register with its top `P` bits, its remaining bits yield a rank,
//! and the register keeps the maximum rank observed. The final register array depends only
//! on the set of hashes seen, not on their order or multiplicity.
//!
//! ## Low latency
//! - Number of zero registers, number of saturated registers and registers' harmonic sum
//!   are updated as registers grow, allowing to have truly constant `estimate` operations.
//! - Harmonic sum terms are powers of two, so the running sum is exact and `estimate`
//!   is a pure function of register contents.
//!
//! ## Variants
//! - `StandardHyperLogLog`: one byte per register, classic small and large range corrections.
//!   - Memory: `M` bytes (1024 bytes for P = 10)
//! - `BiasCorrectedHyperLogLog`: one byte per register, empirically tuned bias table.
//!   - Memory: `M` bytes (1024 bytes for P = 10)
//! - `CompactHyperLogLog`: 6 bits per register packed into `u32` words, ranks saturate at 63.
//!   - Memory: `4 * ceil(M / 5)` bytes (820 bytes for P = 10)
//!
//! Expected error is `1.04 / sqrt(M)`:
//!   P = 10: 1.04 / sqrt(2^10) = 3.25%
//!   P = 12: 1.04 / sqrt(2^12) = 1.62%
//!   P = 14: 1.04 / sqrt(2^14) = 0.81%
//!   P = 16: 1.04 / sqrt(2^16) = 0.41%

use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::marker::PhantomData;

use enum_dispatch::enum_dispatch;
use tracing::debug;
use wyhash::WyHash;

use crate::correction::{BiasTable, CorrectionPolicy, RegisterSummary, SaturationAware, Uncorrected};
use crate::rank::{alpha, decode_hash, fold_hash};
use crate::registers::{DenseRegisters, PackedRegisters, RegisterStore};

/// One byte per register, classic corrections only
pub type StandardHyperLogLog<const P: usize> = HyperLogLog<P, DenseRegisters, Uncorrected>;
/// One byte per register, empirically tuned bias table
pub type BiasCorrectedHyperLogLog<const P: usize> = HyperLogLog<P, DenseRegisters, BiasTable>;
/// 6-bit packed registers with saturation-aware correction
pub type CompactHyperLogLog<const P: usize> = HyperLogLog<P, PackedRegisters<6>, SaturationAware>;

/// Common contract of all cardinality estimators
#[enum_dispatch]
pub trait CardinalityEstimatorTrait {
    /// Insert 32-bit hash into estimator
    fn insert_hash(&mut self, hash: u32);
    /// Return cardinality estimate
    fn estimate(&self) -> f64;
    /// Set all registers to zero
    fn reset(&mut self);
    /// Return number of registers which observed at least one hash
    fn used_registers(&self) -> usize;
    /// Return memory size of register storage in bytes
    fn memory_usage(&self) -> usize;
    /// Return theoretical relative standard error `1.04 / sqrt(M)`
    fn standard_error(&self) -> f64;
}

/// HyperLogLog estimator with `2^P` registers kept in `R` and corrected by `C`
pub struct HyperLogLog<
    const P: usize = 12,
    R: RegisterStore = DenseRegisters,
    C: CorrectionPolicy = Uncorrected,
    H: Hasher + Default = WyHash,
> {
    /// Register storage
    registers: R,
    /// Bias correction constant derived from number of registers
    alpha: f64,
    /// Number of registers set to 0
    zeros: usize,
    /// Number of registers set to `R::MAX_VALUE`
    saturated: usize,
    /// Sum of `2^-register` over all registers
    harmonic_sum: f64,
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
    /// Zero-sized correction policy marker
    policy: PhantomData<C>,
}

impl<const P: usize, R, C, H> HyperLogLog<P, R, C, H>
where
    R: RegisterStore,
    C: CorrectionPolicy,
    H: Hasher + Default,
{
    /// Ensure that `P` is in correct range at compile time
    const VALID_PARAMS: () = assert!(P >= 4 && P <= 16);
    /// Number of HyperLogLog registers
    const M: usize = 1 << P;

    /// Creates new instance of `HyperLogLog`
    #[inline]
    pub fn new() -> Self {
        // compile time check of params
        _ = Self::VALID_PARAMS;

        Self {
            registers: R::with_len(Self::M),
            alpha: alpha(Self::M),
            zeros: Self::M,
            saturated: 0,
            harmonic_sum: Self::M as f64,
            build_hasher: BuildHasherDefault::default(),
            policy: PhantomData,
        }
    }

    /// Insert a hashable item into `HyperLogLog`
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        self.insert_hash(fold_hash(hasher.finish()));
    }

    /// Return number of registers `M = 2^P`
    #[inline]
    pub fn register_count(&self) -> usize {
        Self::M
    }

    /// Return value of `idx` register
    #[inline]
    pub fn get_register(&self, idx: usize) -> u8 {
        self.registers.get(idx)
    }

    /// Return whether no hash has been inserted since creation or last reset
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.zeros == Self::M
    }

    /// Return aggregate register state consumed by the correction policy
    #[inline]
    pub fn summary(&self) -> RegisterSummary {
        RegisterSummary {
            registers: Self::M,
            zeros: self.zeros,
            saturated: self.saturated,
        }
    }

    /// Return uncorrected harmonic-mean estimate `alpha * M^2 / sum(2^-register)`
    #[inline]
    pub fn raw_estimate(&self) -> f64 {
        let m = Self::M as f64;
        self.alpha * m * m / self.harmonic_sum
    }
}

impl<const P: usize, R, C, H> CardinalityEstimatorTrait for HyperLogLog<P, R, C, H>
where
    R: RegisterStore,
    C: CorrectionPolicy,
    H: Hasher + Default,
{
    /// Insert hash into `HyperLogLog`, keeping the maximum rank per register
    #[inline]
    fn insert_hash(&mut self, hash: u32) {
        let (idx, rank) = decode_hash::<P>(hash);
        let new_rank = rank.min(u32::from(R::MAX_VALUE)) as u8;
        let old_rank = self.registers.get(idx);
        if new_rank > old_rank {
            self.registers.set(idx, new_rank);

            // Update number of zero and saturated registers and harmonic sum
            self.zeros -= usize::from(old_rank == 0);
            self.saturated += usize::from(new_rank == R::MAX_VALUE);
            self.harmonic_sum -= register_weight(old_rank);
            self.harmonic_sum += register_weight(new_rank);
        }
    }

    /// Return cardinality estimate of `HyperLogLog`
    #[inline]
    fn estimate(&self) -> f64 {
        C::correct(self.raw_estimate(), &self.summary())
    }

    fn reset(&mut self) {
        self.registers.clear();
        self.zeros = Self::M;
        self.saturated = 0;
        self.harmonic_sum = Self::M as f64;
        debug!(registers = Self::M, "estimator reset");
    }

    #[inline]
    fn used_registers(&self) -> usize {
        Self::M - self.zeros
    }

    #[inline]
    fn memory_usage(&self) -> usize {
        self.registers.memory_usage()
    }

    #[inline]
    fn standard_error(&self) -> f64 {
        1.04 / (Self::M as f64).sqrt()
    }
}

impl<const P: usize, R, C, H> Default for HyperLogLog<P, R, C, H>
where
    R: RegisterStore,
    C: CorrectionPolicy,
    H: Hasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const P: usize, R, C, H> Clone for HyperLogLog<P, R, C, H>
where
    R: RegisterStore + Clone,
    C: CorrectionPolicy,
    H: Hasher + Default,
{
    /// Clone `HyperLogLog`
    fn clone(&self) -> Self {
        Self {
            registers: self.registers.clone(),
            alpha: self.alpha,
            zeros: self.zeros,
            saturated: self.saturated,
            harmonic_sum: self.harmonic_sum,
            build_hasher: BuildHasherDefault::default(),
            policy: PhantomData,
        }
    }
}

impl<const P: usize, R, C, H> PartialEq for HyperLogLog<P, R, C, H>
where
    R: RegisterStore + PartialEq,
    C: CorrectionPolicy,
    H: Hasher + Default,
{
    /// Compare register contents, aggregates follow from them
    fn eq(&self, rhs: &Self) -> bool {
        self.registers == rhs.registers
    }
}

impl<const P: usize, R, C, H> Debug for HyperLogLog<P, R, C, H>
where
    R: RegisterStore,
    C: CorrectionPolicy,
    H: Hasher + Default,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ estimate: {:.0}, used: {}, size: {} }}",
            self.estimate(),
            self.used_registers(),
            self.memory_usage()
        )
    }
}

/// Contribution `2^-rank` of a register to the harmonic sum
#[inline]
fn register_weight(rank: u8) -> f64 {
    1.0 / ((1u64 << rank) as f64)
}
