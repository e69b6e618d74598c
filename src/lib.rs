//! `loglog-registers` is a Rust crate designed to estimate the number of distinct elements in a stream of
//! 32-bit hashes using bounded memory.
//!
//! This library implements HyperLogLog as one estimator parameterized by a register store and a correction
//! policy, with three ready-made variants trading accuracy against memory footprint.
pub mod correction;
pub mod estimator;
mod rank;
pub mod registers;
pub mod variant;

pub use correction::{BiasTable, CorrectionPolicy, RegisterSummary, SaturationAware, Uncorrected};
pub use estimator::{
    BiasCorrectedHyperLogLog, CardinalityEstimatorTrait, CompactHyperLogLog, HyperLogLog,
    StandardHyperLogLog,
};
pub use rank::fold_hash;
pub use registers::{DenseRegisters, PackedRegisters, RegisterStore};
pub use variant::{AnyEstimator, EstimatorError, Variant};
