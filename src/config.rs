//! Attack configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AttackError, Result},
    params::SchemeParams,
};

/// Heaviest default tail pattern.
pub const DEFAULT_PATTERN_WEIGHT: usize = 3;

/// What the driver does when more positions resolve as errors than the secret holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightOverflow {
    /// Abort with [`AttackError::WeightOverflow`]. Against a noiseless oracle
    /// this can only come from a classification bug.
    #[default]
    Fatal,
    /// Stop probing and report the partial vector. For noisy oracles.
    Tolerate,
}

/// Knobs of the statistical protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Outer trial budget; also fixes the per-position quorum.
    pub majority_of: u32,
    /// Extra queries issued to confirm a class change during threshold search.
    pub boundary_confirmations: u32,
    /// Abstain without querying on positions whose prediction the remaining
    /// trials can no longer change, and end the trials once none is left.
    pub skip_resolved_bits: bool,
    /// Reaction to a resolved weight above the secret weight.
    pub weight_overflow: WeightOverflow,
    /// Largest tail pattern the resolver tries; `None` means
    /// [`DEFAULT_PATTERN_WEIGHT`] or the whole tail, whichever is smaller.
    pub max_pattern_weight: Option<usize>,
    /// Known-error decapsulations the resolver may spend before giving up.
    pub max_pattern_tests: u64,
    /// Random messages examined when choosing the probe message.
    pub probe_search_budget: u64,
    /// Stop the probe search at the first message with at least this class.
    pub probe_target_class: u64,
    /// Seed of the permutation service; `None` seeds from the thread rng.
    pub seed: Option<u64>,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            majority_of: 5,
            boundary_confirmations: 0,
            skip_resolved_bits: true,
            weight_overflow: WeightOverflow::Fatal,
            max_pattern_weight: None,
            max_pattern_tests: 1 << 20,
            probe_search_budget: 1_000_000,
            probe_target_class: 6,
            seed: None,
        }
    }
}

impl AttackConfig {
    /// Quorum `ceil((majority_of + 1) / 2)`.
    pub fn majority_min(&self) -> u32 {
        (self.majority_of + 2) / 2
    }

    /// Load a JSON configuration; absent fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Heaviest tail pattern the resolver tries for `params`.
    pub fn pattern_weight(&self, params: &SchemeParams) -> usize {
        self.max_pattern_weight
            .unwrap_or(DEFAULT_PATTERN_WEIGHT)
            .min(params.tail_len())
    }

    /// Check the configuration against the attacked scheme.
    pub fn validate(&self, params: &SchemeParams) -> Result<()> {
        if self.majority_of == 0 {
            return Err(AttackError::InvalidConfig(
                "majority_of must be at least 1".into(),
            ));
        }
        if self.probe_search_budget == 0 {
            return Err(AttackError::InvalidConfig(
                "probe_search_budget must be at least 1".into(),
            ));
        }
        if self.max_pattern_tests == 0 {
            return Err(AttackError::InvalidConfig(
                "max_pattern_tests must be at least 1".into(),
            ));
        }
        if let Some(w) = self.max_pattern_weight
            && w > params.tail_len()
        {
            return Err(AttackError::InvalidConfig(format!(
                "max_pattern_weight {w} exceeds the tail length {}",
                params.tail_len()
            )));
        }
        Ok(())
    }
}
