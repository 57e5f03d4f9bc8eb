#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//!
//! # Usage
//!
//! ```
//! use hqcfail::{Attack, AttackConfig, DecapsulationOracle, SchemeParams, SimulatedOracle};
//!
//! let params = SchemeParams { n: 1030, n1: 8, n2: 128, omega: 12, delta: 2 };
//! let mut oracle = SimulatedOracle::builder(params).radius(6).seed(1).build()?;
//! let (pk, sk) = oracle.keypair();
//! let secret = oracle.reveal_secret(&sk);
//!
//! let config = AttackConfig { seed: Some(2), ..AttackConfig::default() };
//! let report = Attack::new(&mut oracle, config)?.run(&pk, &sk)?;
//! println!("{} queries, {} bits wrong", report.queries, report.recovered.distance(&secret));
//! # Ok::<(), hqcfail::AttackError>(())
//! ```

#[cfg(test)]
mod test_util;

/// Failure conditions.
pub mod error;

/// Shape of the attacked secret.
pub mod params;

/// Packed bit vectors.
pub mod vector;

/// Ciphertext bit flipping with guaranteed restore.
pub mod mutator;

/// The oracle contract and query counting.
pub mod oracle;

/// Seedable shuffles.
pub mod rng;

/// Per-position vote tallies.
pub mod evidence;

/// Protocol knobs.
pub mod config;

/// Locating the decoding-failure boundary inside a block.
pub mod threshold;

/// Per-bit classification at the boundary.
pub mod classifier;

/// Tail hypotheses.
pub mod patterns;

/// Tail resolution against known-error decapsulation.
pub mod resolver;

/// Probe message choice.
pub mod probe;

/// The attack loop.
pub mod driver;

/// A fast simulated oracle.
pub mod simulated;

/// A leaking HQC implementation.
pub mod hqc;

pub use config::{AttackConfig, WeightOverflow};
pub use driver::{Attack, AttackReport, Outcome};
pub use error::{AttackError, Result};
pub use oracle::{DecapsulationOracle, Session, TimingClass};
pub use params::SchemeParams;
pub use patterns::{Pattern, PatternCatalog};
pub use simulated::SimulatedOracle;
pub use vector::SecretVector;
