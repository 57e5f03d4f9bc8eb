//! Error types for the attack engine.

use thiserror::Error;

/// Fatal conditions that abort an attack run.
///
/// Abstaining classifications and an exhausted pattern catalog are not errors:
/// they show up in the [`AttackReport`](crate::driver::AttackReport) instead.
#[derive(Error, Debug)]
pub enum AttackError {
    /// A ciphertext or error-vector guess of the wrong length reached the oracle.
    #[error("oracle precondition violated: expected length {expected}, got {actual}")]
    OraclePrecondition {
        /// Length the oracle requires (bytes for ciphertexts, bits for vectors).
        expected: usize,
        /// Length it was handed.
        actual: usize,
    },

    /// The probe ciphertext was not restored to its backup at the end of a trial.
    #[error("ciphertext differs from its backup after trial {trial}")]
    FlipAsymmetry {
        /// One-based trial index.
        trial: usize,
    },

    /// More positions were resolved as errors than the secret can hold.
    #[error("resolved error weight {weight} exceeds the secret weight {omega}")]
    WeightOverflow {
        /// Number of positions currently predicted as errors.
        weight: usize,
        /// Fixed weight of the secret vector.
        omega: usize,
    },

    /// Scheme parameters are inconsistent.
    #[error("invalid scheme parameters: {0}")]
    InvalidParams(String),

    /// Attack configuration is inconsistent with itself or the scheme.
    #[error("invalid attack configuration: {0}")]
    InvalidConfig(String),

    /// Two aggregators with different shapes were merged.
    #[error("evidence shape mismatch: {left} positions vs {right}")]
    EvidenceShape {
        /// Length of the receiving aggregator.
        left: usize,
        /// Length of the merged aggregator.
        right: usize,
    },

    /// Reading a configuration file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid JSON for [`AttackConfig`](crate::config::AttackConfig).
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, AttackError>;
