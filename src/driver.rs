//! The attack state machine: corrupt, recover, reset, resolve.

use core::ops::{ControlFlow, Range};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    classifier::classify_block,
    config::{AttackConfig, WeightOverflow},
    error::{AttackError, Result},
    evidence::EvidenceAggregator,
    mutator::{CiphertextBuffer, FlipGuard},
    oracle::{DecapsulationOracle, Session, TimingClass},
    params::SchemeParams,
    patterns::{Pattern, PatternCatalog},
    probe::select_probe_message,
    resolver::{Resolution, TailResolver},
    rng::PermutationSource,
    threshold::{Threshold, ThresholdSearch},
    vector::SecretVector,
};

/// How an attack run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A tail pattern completed the prediction and decapsulated correctly.
    Recovered,
    /// No tail pattern matched; the prediction is best effort.
    Unresolved,
    /// Probing stopped because more positions resolved as errors than the secret holds.
    WeightOverflow,
}

/// Spread of the per-position confidence over the coded segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ConfidenceSummary {
    /// Lowest share of votes on the leading side.
    pub min: Option<f64>,
    /// Average share over positions with votes.
    pub mean: Option<f64>,
    /// Positions that never received a vote.
    pub unvoted: usize,
}

impl ConfidenceSummary {
    fn of(evidence: &EvidenceAggregator) -> Self {
        let mut summary = Self::default();
        let mut sum = 0.0;
        let mut voted = 0usize;
        for pos in 0..evidence.len() {
            match evidence.confidence(pos) {
                Some(c) => {
                    sum += c;
                    voted += 1;
                    summary.min = Some(summary.min.map_or(c, |m: f64| m.min(c)));
                }
                None => summary.unvoted += 1,
            }
        }
        if voted > 0 {
            summary.mean = Some(sum / voted as f64);
        }
        summary
    }
}

/// Everything an attack run produced.
#[derive(Clone, Debug, Serialize)]
pub struct AttackReport {
    /// How the run ended.
    pub outcome: Outcome,
    /// Support of the recovered (or best-effort) secret vector.
    pub support: Vec<usize>,
    /// Outer trials started.
    pub trials: usize,
    /// Instrumented decapsulations.
    pub queries: u64,
    /// Known-error decapsulations spent by the resolver.
    pub verifications: u64,
    /// Positions resolved as errors.
    pub resolved_weight: usize,
    /// Positions resolved either way.
    pub resolved_positions: usize,
    /// Accepted tail pattern.
    pub pattern: Option<Pattern>,
    /// Confidence spread of the coded-segment prediction.
    pub confidence: ConfidenceSummary,
    /// Block rounds whose threshold search never saw the class change.
    pub skipped_rounds: usize,
    /// Reference class the probes were compared against.
    pub reference_class: TimingClass,
    /// Random messages examined while choosing the probe.
    pub probe_examined: u64,
    /// Seed of the permutation source.
    pub seed: u64,
    /// Hamming distance to the true secret, when it was supplied.
    pub bits_wrong: Option<usize>,
    /// The recovered vector itself.
    #[serde(skip)]
    pub recovered: SecretVector,
    /// Vote counters behind the coded-segment prediction.
    #[serde(skip)]
    pub evidence: EvidenceAggregator,
}

impl AttackReport {
    /// Score the report against the true secret.
    pub fn with_ground_truth(mut self, secret: &SecretVector) -> Self {
        self.bits_wrong = Some(self.recovered.distance(secret));
        self
    }

    /// Share of votes on the leading side for every coded-segment position,
    /// `None` where no vote was cast.
    pub fn confidences(&self) -> Vec<Option<f64>> {
        self.evidence.confidences()
    }

    /// `true` when the recovered vector is exactly `secret`.
    pub fn matches(&self, secret: &SecretVector) -> bool {
        self.recovered == *secret
    }
}

/// Running counters shared by the passes of one attack.
struct Progress {
    evidence: EvidenceAggregator,
    skipped_rounds: usize,
    overflowed: bool,
    /// Trials left, the current one included.
    remaining: u32,
}

impl Progress {
    /// Nothing in `range` can change the prediction any more.
    fn block_done(&self, range: Range<usize>, skip_settled: bool) -> bool {
        if skip_settled {
            self.evidence.block_settled(range, self.remaining)
        } else {
            self.evidence.block_resolved(range)
        }
    }
}

/// Drives an oracle through the full key-recovery attack.
pub struct Attack<'o, O: DecapsulationOracle> {
    oracle: &'o mut O,
    config: AttackConfig,
    catalog: Option<PatternCatalog>,
}

impl<'o, O: DecapsulationOracle> Attack<'o, O> {
    /// Check `config` against the oracle's parameters and its ciphertext layout.
    pub fn new(oracle: &'o mut O, config: AttackConfig) -> Result<Self> {
        let params = oracle.params();
        params.validate()?;
        config.validate(&params)?;
        let region = oracle.codeword_region();
        if region.len() < params.n1n2() || region.end > 8 * oracle.ciphertext_len() {
            return Err(AttackError::InvalidParams(format!(
                "codeword region {region:?} cannot hold {} bits inside a {}-byte ciphertext",
                params.n1n2(),
                oracle.ciphertext_len()
            )));
        }
        Ok(Self {
            oracle,
            config,
            catalog: None,
        })
    }

    /// Use `catalog` for the tail instead of every pattern up to the configured weight.
    pub fn with_catalog(mut self, catalog: PatternCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &AttackConfig {
        &self.config
    }

    /// Recover the secret behind `sk`, querying only through the oracle.
    pub fn run(&mut self, pk: &O::PublicKey, sk: &O::SecretKey) -> Result<AttackReport> {
        let params = self.oracle.params();
        let origin = self.oracle.codeword_region().start;
        let mut perms = match self.config.seed {
            Some(seed) => PermutationSource::from_seed(seed),
            None => PermutationSource::from_entropy(),
        };
        info!(
            n = params.n,
            n1 = params.n1,
            n2 = params.n2,
            omega = params.omega,
            majority_of = self.config.majority_of,
            seed = perms.seed(),
            "starting attack"
        );

        let probe = select_probe_message(
            &mut *self.oracle,
            pk,
            self.config.probe_search_budget,
            self.config.probe_target_class,
        );
        let mut ct = self.oracle.probe_ciphertext(pk, &probe.message);
        let backup = ct.clone();

        let mut session = Session::new(&mut *self.oracle, sk);
        let reference = reference_class(&mut session, &ct, probe.class, self.config.majority_of)?;

        let mut progress = Progress {
            evidence: EvidenceAggregator::new(params.n1n2(), self.config.majority_min()),
            skipped_rounds: 0,
            overflowed: false,
            remaining: self.config.majority_of,
        };
        let round = Round {
            params,
            config: &self.config,
            origin,
            search: ThresholdSearch::new(self.config.boundary_confirmations),
            reference,
        };

        let mut trials = 0;
        for trial in 1..=self.config.majority_of as usize {
            if progress.overflowed || progress.evidence.resolved_weight() >= params.omega {
                break;
            }
            progress.remaining = self.config.majority_of - trial as u32 + 1;
            let open = progress.evidence.open_count(progress.remaining);
            if self.config.skip_resolved_bits && open == 0 {
                info!(trial, "every position settled");
                break;
            }
            trials = trial;
            info!(
                trial,
                resolved = progress.evidence.resolved_count(),
                weight = progress.evidence.resolved_weight(),
                open,
                "trial"
            );

            let order = perms.shuffled(0..params.n1);
            let (first, rest) = order.split_at(params.delta);
            let (second, _) = rest.split_at(params.delta);
            for pass in [(first, rest), (second, first)] {
                let flow = round.pass(&mut session, &mut ct, pass, &mut perms, &mut progress)?;
                if flow.is_break() {
                    break;
                }
            }

            if ct != backup {
                return Err(AttackError::FlipAsymmetry { trial });
            }
        }
        check_weight(&params, &self.config, &mut progress)?;

        let baseline = progress.evidence.prediction(params.n);
        let (outcome, recovered, pattern) = if progress.overflowed {
            (Outcome::WeightOverflow, baseline, None)
        } else {
            let default_catalog;
            let catalog = match &self.catalog {
                Some(catalog) => catalog,
                None => {
                    let max = self.config.pattern_weight(&params);
                    default_catalog = PatternCatalog::exhaustive(params.tail_len(), max);
                    &default_catalog
                }
            };
            let resolver =
                TailResolver::new(params, catalog).with_limit(self.config.max_pattern_tests);
            match resolver.resolve(&mut session, pk, &baseline)? {
                Resolution::Found { pattern, .. } => {
                    let recovered = pattern.apply(&baseline, params.n1n2());
                    (Outcome::Recovered, recovered, Some(pattern))
                }
                Resolution::Unresolved { tested } => {
                    warn!(tested, "no tail pattern matched");
                    (Outcome::Unresolved, baseline, None)
                }
            }
        };

        let report = AttackReport {
            outcome,
            support: recovered.support(),
            trials,
            queries: session.queries(),
            verifications: session.verifications(),
            resolved_weight: progress.evidence.resolved_weight(),
            resolved_positions: progress.evidence.resolved_count(),
            pattern,
            confidence: ConfidenceSummary::of(&progress.evidence),
            skipped_rounds: progress.skipped_rounds,
            reference_class: reference,
            probe_examined: probe.examined,
            seed: perms.seed(),
            bits_wrong: None,
            recovered,
            evidence: progress.evidence,
        };
        info!(
            outcome = ?report.outcome,
            queries = report.queries,
            verifications = report.verifications,
            weight = report.support.len(),
            "attack finished"
        );
        Ok(report)
    }
}

/// Fixed inputs of every pass of one attack.
struct Round<'c> {
    params: SchemeParams,
    config: &'c AttackConfig,
    origin: usize,
    search: ThresholdSearch,
    reference: TimingClass,
}

impl Round<'_> {
    /// Corrupt whole blocks, probe the blocks in `recover`, undo the corruption.
    fn pass<O: DecapsulationOracle>(
        &self,
        session: &mut Session<'_, O>,
        ct: &mut CiphertextBuffer,
        (corrupt, recover): (&[usize], &[usize]),
        perms: &mut PermutationSource,
        progress: &mut Progress,
    ) -> Result<ControlFlow<()>> {
        let params = self.params;
        let mut guard = FlipGuard::new(ct, self.origin);
        for &b in corrupt {
            guard.flip_range(params.block(b));
        }

        for &b in recover {
            check_weight(&params, self.config, progress)?;
            if progress.overflowed || progress.evidence.resolved_weight() == params.omega {
                return Ok(ControlFlow::Break(()));
            }
            let block = params.block(b);
            if progress.block_done(block.clone(), self.config.skip_resolved_bits) {
                continue;
            }

            let order = perms.shuffled(block.clone());
            let mut scope = guard.nested();
            match self.search.run(session, &mut scope, &order, self.reference)? {
                Threshold::Boundary { flips } => {
                    debug!(block = b, flips, "boundary found");
                    classify_block(
                        session,
                        &mut scope,
                        block,
                        &order[..flips],
                        self.reference,
                        &mut progress.evidence,
                        self.config.skip_resolved_bits.then_some(progress.remaining),
                    )?;
                }
                Threshold::Exhausted => {
                    warn!(block = b, "class never changed, skipping block this round");
                    progress.skipped_rounds += 1;
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

/// Fail or stop when the resolved weight exceeds the secret weight.
fn check_weight(
    params: &SchemeParams,
    config: &AttackConfig,
    progress: &mut Progress,
) -> Result<()> {
    let weight = progress.evidence.resolved_weight();
    if weight <= params.omega || progress.overflowed {
        return Ok(());
    }
    match config.weight_overflow {
        WeightOverflow::Fatal => Err(AttackError::WeightOverflow {
            weight,
            omega: params.omega,
        }),
        WeightOverflow::Tolerate => {
            warn!(weight, omega = params.omega, "resolved weight overflow, stopping");
            progress.overflowed = true;
            Ok(())
        }
    }
}

/// Most frequent class over `samples` queries on the clean probe; the offline
/// class wins ties.
fn reference_class<O: DecapsulationOracle>(
    session: &mut Session<'_, O>,
    ct: &CiphertextBuffer,
    offline: TimingClass,
    samples: u32,
) -> Result<TimingClass> {
    let mut seen: Vec<(TimingClass, u32)> = Vec::new();
    for _ in 0..samples.max(1) {
        let class = session.timing_class(ct)?;
        match seen.iter_mut().find(|(c, _)| *c == class) {
            Some((_, count)) => *count += 1,
            None => seen.push((class, 1)),
        }
    }
    let top = seen.iter().map(|&(_, count)| count).max().unwrap_or(0);
    let offline_count = seen
        .iter()
        .find(|(c, _)| *c == offline)
        .map_or(0, |&(_, count)| count);
    let reference = if offline_count == top {
        offline
    } else {
        seen.iter()
            .find(|&&(_, count)| count == top)
            .map_or(offline, |&(c, _)| c)
    };
    if reference != offline {
        warn!(
            observed = reference.0,
            offline = offline.0,
            "clean probe class differs from its offline class"
        );
    }
    Ok(reference)
}
