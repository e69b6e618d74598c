//! ## Runtime variant selection
//! `AnyEstimator` wraps the three estimator variants behind a single value so that callers
//! can choose the variant at run time, e.g. from a command line or configuration string.

use std::fmt::{Display, Formatter};
use std::hash::Hash;
use std::str::FromStr;

use enum_dispatch::enum_dispatch;
use thiserror::Error;
use tracing::debug;

use crate::estimator::{
    BiasCorrectedHyperLogLog, CardinalityEstimatorTrait, CompactHyperLogLog, StandardHyperLogLog,
};

/// Estimator error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimatorError {
    #[error("unknown estimator variant {0:?}, expected one of: standard, bias-corrected, compact")]
    UnknownVariant(String),
}

/// Estimator variants, each pairing a register store with a correction policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// One byte per register, classic corrections only
    Standard,
    /// One byte per register, empirically tuned bias table
    BiasCorrected,
    /// 6-bit packed registers, saturation-aware correction
    Compact,
}

impl Variant {
    /// All variants in comparison order
    pub const ALL: [Variant; 3] = [Variant::Standard, Variant::BiasCorrected, Variant::Compact];

    /// Return canonical variant name
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::BiasCorrected => "bias-corrected",
            Variant::Compact => "compact",
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "uncorrected" => Ok(Variant::Standard),
            "bias-corrected" | "improved" | "bias-table" => Ok(Variant::BiasCorrected),
            "compact" | "packed" => Ok(Variant::Compact),
            _ => Err(EstimatorError::UnknownVariant(s.to_string())),
        }
    }
}

/// Estimator of any variant with precision `P`
#[enum_dispatch(CardinalityEstimatorTrait)]
#[derive(Debug, Clone, PartialEq)]
pub enum AnyEstimator<const P: usize> {
    Standard(StandardHyperLogLog<P>),
    BiasCorrected(BiasCorrectedHyperLogLog<P>),
    Compact(CompactHyperLogLog<P>),
}

impl<const P: usize> AnyEstimator<P> {
    /// Creates new empty estimator of given variant
    pub fn new(variant: Variant) -> Self {
        debug!(%variant, precision = P, "creating estimator");
        match variant {
            Variant::Standard => AnyEstimator::Standard(StandardHyperLogLog::new()),
            Variant::BiasCorrected => AnyEstimator::BiasCorrected(BiasCorrectedHyperLogLog::new()),
            Variant::Compact => AnyEstimator::Compact(CompactHyperLogLog::new()),
        }
    }

    /// Return variant of this estimator
    pub fn variant(&self) -> Variant {
        match self {
            AnyEstimator::Standard(_) => Variant::Standard,
            AnyEstimator::BiasCorrected(_) => Variant::BiasCorrected,
            AnyEstimator::Compact(_) => Variant::Compact,
        }
    }

    /// Insert a hashable item into estimator
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        match self {
            AnyEstimator::Standard(e) => e.insert(item),
            AnyEstimator::BiasCorrected(e) => e.insert(item),
            AnyEstimator::Compact(e) => e.insert(item),
        }
    }
}

impl<const P: usize> FromStr for AnyEstimator<P> {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self::new)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("standard" => Ok(Variant::Standard))]
    #[test_case("Uncorrected" => Ok(Variant::Standard))]
    #[test_case("bias-corrected" => Ok(Variant::BiasCorrected))]
    #[test_case(" improved " => Ok(Variant::BiasCorrected))]
    #[test_case("bias-table" => Ok(Variant::BiasCorrected))]
    #[test_case("COMPACT" => Ok(Variant::Compact))]
    #[test_case("packed" => Ok(Variant::Compact))]
    #[test_case("loglog" => Err(EstimatorError::UnknownVariant("loglog".to_string())); "unknown name")]
    #[test_case("" => Err(EstimatorError::UnknownVariant(String::new())); "empty name")]
    fn test_parse_variant(s: &str) -> Result<Variant, EstimatorError> {
        s.parse()
    }

    #[test]
    fn test_variant_display_round_trip() {
        for variant in Variant::ALL {
            assert_eq!(variant.to_string().parse::<Variant>(), Ok(variant));
        }
    }

    #[test]
    fn test_error_message() {
        let err = "hll++".parse::<Variant>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown estimator variant \"hll++\", expected one of: standard, bias-corrected, compact"
        );
    }

    #[test_case(Variant::Standard => "Standard({ estimate: 2, used: 2, size: 1024 })")]
    #[test_case(Variant::BiasCorrected => "BiasCorrected({ estimate: 2, used: 2, size: 1024 })")]
    #[test_case(Variant::Compact => "Compact({ estimate: 2, used: 2, size: 820 })")]
    fn test_any_estimator(variant: Variant) -> String {
        let mut e = AnyEstimator::<10>::new(variant);
        assert_eq!(e.variant(), variant);
        assert_eq!(e.estimate(), 0.0);
        assert_eq!(e.standard_error(), 1.04 / 32.0);
        e.insert_hash(0x0000_0001);
        e.insert_hash(0xffc0_0000);
        e.insert_hash(0xffc0_0000);
        assert_eq!(e.used_registers(), 2);
        format!("{:?}", e)
    }

    #[test]
    fn test_any_estimator_matches_concrete() {
        let mut any: AnyEstimator<12> = "compact".parse().unwrap();
        let mut concrete = CompactHyperLogLog::<12>::new();
        for i in 0..10_000u32 {
            any.insert(&i);
            concrete.insert(&i);
        }
        assert_eq!(any.estimate(), concrete.estimate());
        assert_eq!(any.memory_usage(), concrete.memory_usage());

        any.reset();
        assert_eq!(any.estimate(), 0.0);
        assert_eq!(any, AnyEstimator::Compact(CompactHyperLogLog::<12>::new()));
    }
}
