//! Per-position vote counters accumulated across trials.

use core::ops::Range;

use crate::{
    error::{AttackError, Result},
    vector::SecretVector,
};

/// Outcome of probing one position in one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vote {
    /// The position was set in the secret.
    Error,
    /// The position was clear in the secret.
    Clear,
    /// No inference possible this round.
    Abstain,
}

/// Vote counters for every coded-segment position.
///
/// Counters only ever grow, so once a position is resolved it stays resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvidenceAggregator {
    votes_error: Vec<u32>,
    votes_total: Vec<u32>,
    majority_min: u32,
    weight: usize,
}

impl EvidenceAggregator {
    /// Empty counters for `len` positions, resolving at `majority_min` same-direction votes.
    pub fn new(len: usize, majority_min: u32) -> Self {
        Self {
            votes_error: vec![0; len],
            votes_total: vec![0; len],
            majority_min,
            weight: 0,
        }
    }

    /// Number of tracked positions.
    pub fn len(&self) -> usize {
        self.votes_total.len()
    }

    /// `true` when no positions are tracked.
    pub fn is_empty(&self) -> bool {
        self.votes_total.is_empty()
    }

    /// Quorum a position needs in one direction.
    pub fn majority_min(&self) -> u32 {
        self.majority_min
    }

    /// Add one observation for `pos`. Abstentions are not counted.
    pub fn record(&mut self, pos: usize, vote: Vote) {
        match vote {
            Vote::Abstain => return,
            Vote::Error => {
                self.votes_error[pos] += 1;
                if self.votes_error[pos] == self.majority_min {
                    self.weight += 1;
                }
            }
            Vote::Clear => {}
        }
        self.votes_total[pos] += 1;
    }

    /// Error votes for `pos`.
    pub fn votes_error(&self, pos: usize) -> u32 {
        self.votes_error[pos]
    }

    /// Non-abstaining votes for `pos`.
    pub fn votes_total(&self, pos: usize) -> u32 {
        self.votes_total[pos]
    }

    /// Either side of `pos` has reached the quorum.
    #[inline]
    pub fn is_resolved(&self, pos: usize) -> bool {
        let err = self.votes_error[pos];
        err >= self.majority_min || self.votes_total[pos] - err >= self.majority_min
    }

    /// Predicted bit for `pos`: set once the error side reached the quorum.
    #[inline]
    pub fn predict(&self, pos: usize) -> bool {
        self.votes_error[pos] >= self.majority_min
    }

    /// Every position in `range` is resolved.
    pub fn block_resolved(&self, range: Range<usize>) -> bool {
        range.into_iter().all(|pos| self.is_resolved(pos))
    }

    /// `true` when `remaining` more error votes cannot change the prediction
    /// for `pos`: it is resolved, or its error side can no longer reach the quorum.
    #[inline]
    pub fn is_settled(&self, pos: usize, remaining: u32) -> bool {
        self.is_resolved(pos) || self.votes_error[pos] + remaining < self.majority_min
    }

    /// Every position in `range` is settled with `remaining` votes to go.
    pub fn block_settled(&self, range: Range<usize>, remaining: u32) -> bool {
        range.into_iter().all(|pos| self.is_settled(pos, remaining))
    }

    /// Positions of the coded segment still open with `remaining` votes to go.
    pub fn open_count(&self, remaining: u32) -> usize {
        (0..self.len())
            .filter(|&pos| !self.is_settled(pos, remaining))
            .count()
    }

    /// Per-position confidence, `None` where no vote was cast.
    pub fn confidences(&self) -> Vec<Option<f64>> {
        (0..self.len()).map(|pos| self.confidence(pos)).collect()
    }

    /// Number of positions predicted as errors.
    pub fn resolved_weight(&self) -> usize {
        self.weight
    }

    /// Number of resolved positions.
    pub fn resolved_count(&self) -> usize {
        (0..self.len()).filter(|&pos| self.is_resolved(pos)).count()
    }

    /// Share of votes on the leading side, `None` without votes.
    pub fn confidence(&self, pos: usize) -> Option<f64> {
        let total = self.votes_total[pos];
        if total == 0 {
            return None;
        }
        let err = self.votes_error[pos];
        Some(f64::from(err.max(total - err)) / f64::from(total))
    }

    /// Current prediction embedded into a vector of `n` bits; positions past the
    /// tracked range stay clear.
    pub fn prediction(&self, n: usize) -> SecretVector {
        let support: Vec<usize> = (0..self.len()).filter(|&pos| self.predict(pos)).collect();
        SecretVector::from_support(n, &support)
    }

    /// Add the counters of `other`, e.g. from an independent trial run.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if other.len() != self.len() || other.majority_min != self.majority_min {
            return Err(AttackError::EvidenceShape {
                left: self.len(),
                right: other.len(),
            });
        }
        for (a, b) in self.votes_error.iter_mut().zip(&other.votes_error) {
            *a += b;
        }
        for (a, b) in self.votes_total.iter_mut().zip(&other.votes_total) {
            *a += b;
        }
        self.weight = self
            .votes_error
            .iter()
            .filter(|&&e| e >= self.majority_min)
            .count();
        Ok(())
    }
}
