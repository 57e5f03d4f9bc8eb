//! Per-bit classification of a block sitting at its failure boundary.
//!
//! With the block just past its correction radius, flipping one more bit `j`
//! brings decoding back exactly when `j` is currently wrong in the modified
//! ciphertext. A bit is currently wrong either because it was set in the
//! secret and we left it alone, or because it was clear and we flipped it.
//! Knowing which bits we flipped separates the two cases.

use core::ops::Range;

use tracing::debug;

use crate::{
    error::Result,
    evidence::{EvidenceAggregator, Vote},
    mutator::FlipGuard,
    oracle::{DecapsulationOracle, Session, TimingClass},
};

/// Vote for one probed bit.
///
/// A matching class means `j` was an error in the modified ciphertext, so in
/// the original secret it is an error unless our own flip put it there.
#[inline]
pub fn infer_vote(matches_reference: bool, our_flip: bool) -> Vote {
    match (matches_reference, our_flip) {
        (false, _) => Vote::Abstain,
        (true, false) => Vote::Error,
        (true, true) => Vote::Clear,
    }
}

/// Votes cast while classifying one block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockTally {
    /// Positions voted as set.
    pub error: usize,
    /// Positions voted as clear.
    pub clear: usize,
    /// Probed positions without a usable answer.
    pub abstain: usize,
    /// Already resolved positions left unprobed.
    pub skipped: usize,
}

impl BlockTally {
    fn add(&mut self, vote: Vote) {
        match vote {
            Vote::Error => self.error += 1,
            Vote::Clear => self.clear += 1,
            Vote::Abstain => self.abstain += 1,
        }
    }
}

/// Probe every bit of `block` once and record the votes.
///
/// `flipped` are the positions the threshold search applied to reach the
/// boundary; they must still be applied in `guard`. Each probe flip is undone
/// before the next one. With `remaining` set, positions already settled for
/// that many outstanding trials are skipped without a query.
pub fn classify_block<O: DecapsulationOracle>(
    session: &mut Session<'_, O>,
    guard: &mut FlipGuard<'_>,
    block: Range<usize>,
    flipped: &[usize],
    reference: TimingClass,
    evidence: &mut EvidenceAggregator,
    remaining: Option<u32>,
) -> Result<BlockTally> {
    let mut ours = vec![false; block.len()];
    for &pos in flipped {
        ours[pos - block.start] = true;
    }

    let mut tally = BlockTally::default();
    for j in block.clone() {
        if remaining.is_some_and(|left| evidence.is_settled(j, left)) {
            tally.skipped += 1;
            continue;
        }
        let class = {
            let mut probe = guard.nested();
            probe.flip(j);
            session.timing_class(probe.ciphertext())?
        };
        let vote = infer_vote(class == reference, ours[j - block.start]);
        evidence.record(j, vote);
        tally.add(vote);
    }

    debug!(
        block = block.start / block.len().max(1),
        error = tally.error,
        clear = tally.clear,
        abstain = tally.abstain,
        skipped = tally.skipped,
        "classified block"
    );
    Ok(tally)
}
