//! A fast stand-in oracle with the decoding structure of HQC.
//!
//! Each block of the coded segment carries one repetition symbol: a block
//! with at most `radius` bit errors decodes to its symbol, one within
//! `radius` of the complement decodes to the wrong symbol, anything else is
//! an erasure. The outer code succeeds when `2 * wrong + erased <= 2 * delta`
//! against the nearest codeword the oracle has issued. The timing class is a
//! keyed hash of the decoded message, so a decoding failure changes it.
//!
//! Ciphertext layout: one kind byte, the `n1 * n2` bit codeword component
//! (little-endian, padded to whole bytes) and a 16-byte salt. Probe
//! ciphertexts are decrypted by adding the coded segment of `y`; honest ones
//! are masked with a stream derived from the whole of `y`, so any wrong guess
//! in [`decapsulate_with_known_error`](DecapsulationOracle::decapsulate_with_known_error)
//! fails.

use core::ops::Range;

use rand::seq::index;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha3::digest::{Digest, ExtendableOutput, Update, XofReader};
use sha3::{Sha3_256, Shake256};
use tracing::debug;

use crate::{
    error::{AttackError, Result},
    mutator::CiphertextBuffer,
    oracle::{DecapsulationOracle, TimingClass},
    params::SchemeParams,
    vector::SecretVector,
};

const KIND_HONEST: u8 = 0;
const KIND_PROBE: u8 = 1;
const SALT_BYTES: usize = 16;

/// Correction radius used when the builder is not given one.
pub const DEFAULT_RADIUS: usize = 8;

/// Simulated plaintext.
pub type SimMessage = [u8; 16];

/// Simulated shared secret.
pub type SimSharedSecret = [u8; 32];

/// Public key of the simulated scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimPublicKey {
    id: [u8; 32],
    mask_key: [u8; 32],
}

/// Secret key of the simulated scheme.
#[derive(Clone, Debug)]
pub struct SimSecretKey {
    id: [u8; 32],
    y: SecretVector,
}

/// Configures a [`SimulatedOracle`].
#[derive(Clone, Debug)]
pub struct SimulatedOracleBuilder {
    params: SchemeParams,
    radius: usize,
    noise: f64,
    seed: Option<u64>,
    tail_pattern: Option<Vec<usize>>,
}

impl SimulatedOracleBuilder {
    /// Bit errors a block tolerates before its symbol is lost.
    pub fn radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// Probability that an instrumented query reports the opposite outcome.
    pub fn noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    /// Seed for keys, messages and noise.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Force the tail of every generated secret to exactly these offsets
    /// (relative to the start of the tail).
    pub fn tail_pattern(mut self, offsets: Vec<usize>) -> Self {
        self.tail_pattern = Some(offsets);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<SimulatedOracle> {
        self.params.validate()?;
        if !(0.0..=1.0).contains(&self.noise) {
            return Err(AttackError::InvalidConfig(format!(
                "noise {} is not a probability",
                self.noise
            )));
        }
        if 2 * self.radius >= self.params.n2 {
            return Err(AttackError::InvalidConfig(format!(
                "radius {} must be below half the block length {}",
                self.radius, self.params.n2
            )));
        }
        if let Some(pattern) = &self.tail_pattern {
            let mut sorted = pattern.clone();
            sorted.sort_unstable();
            sorted.dedup();
            if sorted.len() != pattern.len() || sorted.len() > self.params.omega {
                return Err(AttackError::InvalidConfig(
                    "tail pattern must hold distinct offsets, at most omega of them".into(),
                ));
            }
            if sorted.last().is_some_and(|&o| o >= self.params.tail_len()) {
                return Err(AttackError::InvalidConfig(format!(
                    "tail pattern offset outside the {}-bit tail",
                    self.params.tail_len()
                )));
            }
        }

        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        Ok(SimulatedOracle {
            params: self.params,
            radius: self.radius,
            noise: self.noise,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tail_pattern: self.tail_pattern,
            codebook: Vec::new(),
        })
    }
}

/// What the outer decoder made of a received word.
enum Outer {
    /// Decoded to the issued codeword at this codebook index.
    Codeword(usize),
    /// Failed; carries the garbage message and the nearest issued codeword.
    Failure {
        garbage: SimMessage,
        nearest: Option<usize>,
    },
}

/// Simulated HQC-like decapsulation oracle.
pub struct SimulatedOracle {
    params: SchemeParams,
    radius: usize,
    noise: f64,
    rng: ChaCha8Rng,
    tail_pattern: Option<Vec<usize>>,
    // every message that has been encoded, with its outer codeword
    codebook: Vec<(SimMessage, Vec<bool>)>,
}

impl SimulatedOracle {
    /// Builder for the given shape, with [`DEFAULT_RADIUS`], no noise and a random seed.
    pub fn builder(params: SchemeParams) -> SimulatedOracleBuilder {
        SimulatedOracleBuilder {
            params,
            radius: DEFAULT_RADIUS,
            noise: 0.0,
            seed: None,
            tail_pattern: None,
        }
    }

    /// Block correction radius.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Outcome flip probability.
    pub fn noise(&self) -> f64 {
        self.noise
    }

    fn v_bytes(&self) -> usize {
        self.params.n1n2().div_ceil(8)
    }

    fn v_range(&self) -> Range<usize> {
        1..1 + self.v_bytes()
    }

    fn sample_secret(&mut self) -> SecretVector {
        let p = self.params;
        let mut support = Vec::with_capacity(p.omega);
        match &self.tail_pattern {
            Some(pattern) => {
                support.extend(pattern.iter().map(|&o| p.n1n2() + o));
                let rest = p.omega - pattern.len();
                support.extend(index::sample(&mut self.rng, p.n1n2(), rest));
            }
            None => support.extend(index::sample(&mut self.rng, p.n, p.omega)),
        }
        SecretVector::from_support(p.n, &support)
    }

    fn register(&mut self, m: &SimMessage) {
        if !self.codebook.iter().any(|(known, _)| known == m) {
            let symbols = encode_symbols(m, self.params.n1);
            self.codebook.push((*m, symbols));
        }
    }

    fn codeword(&self, m: &SimMessage) -> SecretVector {
        let p = self.params;
        let mut v = SecretVector::zeros(p.n1n2());
        for (i, bit) in encode_symbols(m, p.n1).into_iter().enumerate() {
            if bit {
                for j in p.block(i) {
                    v.set(j, true);
                }
            }
        }
        v
    }

    fn honest_ciphertext(&self, pk: &SimPublicKey, m: &SimMessage, salt: &[u8]) -> Vec<u8> {
        let mut v = self.codeword(m);
        v.xor_assign(&mask_stream(&pk.mask_key, salt, self.params.n1n2()));
        let mut ct = Vec::with_capacity(self.ciphertext_len());
        ct.push(KIND_HONEST);
        ct.extend_from_slice(&v.to_le_bytes());
        ct.extend_from_slice(salt);
        ct
    }

    fn check_len(&self, ct: &CiphertextBuffer) -> Result<()> {
        if ct.len() != self.ciphertext_len() {
            return Err(AttackError::OraclePrecondition {
                expected: self.ciphertext_len(),
                actual: ct.len(),
            });
        }
        Ok(())
    }

    /// Received word after removing the key-dependent part.
    fn received(&self, ct: &CiphertextBuffer, y: &SecretVector) -> SecretVector {
        let bytes = ct.as_bytes();
        let mut v = SecretVector::from_le_bytes(self.params.n1n2(), &bytes[self.v_range()]);
        if bytes[0] == KIND_PROBE {
            v.xor_assign(&y.resized(self.params.n1n2()));
        } else {
            let salt = &bytes[self.v_range().end..];
            v.xor_assign(&mask_stream(&mask_key(y), salt, self.params.n1n2()));
        }
        v
    }

    fn inner_decode(&self, v: &SecretVector) -> Vec<Option<bool>> {
        let p = self.params;
        (0..p.n1)
            .map(|b| {
                let d = v.weight_in(p.block(b));
                if d <= self.radius {
                    Some(false)
                } else if p.n2 - d <= self.radius {
                    Some(true)
                } else {
                    None
                }
            })
            .collect()
    }

    fn outer_decode(&self, symbols: &[Option<bool>]) -> Outer {
        let budget = 2 * self.params.delta;
        let nearest = self
            .codebook
            .iter()
            .enumerate()
            .map(|(idx, (_, code))| {
                let cost: usize = symbols
                    .iter()
                    .zip(code)
                    .map(|(s, &c)| match s {
                        Some(bit) if *bit == c => 0,
                        Some(_) => 2,
                        None => 1,
                    })
                    .sum();
                (cost, idx)
            })
            .min();
        match nearest {
            Some((cost, idx)) if cost <= budget => Outer::Codeword(idx),
            _ => Outer::Failure {
                garbage: garbage_message(symbols),
                nearest: nearest.map(|(_, idx)| idx),
            },
        }
    }

    fn decode(&self, ct: &CiphertextBuffer, y: &SecretVector) -> Outer {
        let v = self.received(ct, y);
        self.outer_decode(&self.inner_decode(&v))
    }

    /// Full decapsulation with an explicit error vector and key identity.
    fn decapsulate_as(
        &self,
        ct: &CiphertextBuffer,
        id: &[u8; 32],
        y: &SecretVector,
    ) -> SimSharedSecret {
        let bytes = ct.as_bytes();
        if bytes[0] == KIND_HONEST
            && let Outer::Codeword(idx) = self.decode(ct, y)
        {
            let m = self.codebook[idx].0;
            let salt = &bytes[self.v_range().end..];
            let pk = SimPublicKey {
                id: *id,
                mask_key: mask_key(y),
            };
            if self.honest_ciphertext(&pk, &m, salt) == bytes {
                return shared_secret(id, &m, salt);
            }
        }
        rejection_secret(id, bytes)
    }
}

impl DecapsulationOracle for SimulatedOracle {
    type PublicKey = SimPublicKey;
    type SecretKey = SimSecretKey;
    type Message = SimMessage;
    type SharedSecret = SimSharedSecret;

    fn params(&self) -> SchemeParams {
        self.params
    }

    fn ciphertext_len(&self) -> usize {
        1 + self.v_bytes() + SALT_BYTES
    }

    fn codeword_region(&self) -> Range<usize> {
        8..8 + self.params.n1n2()
    }

    fn keypair(&mut self) -> (SimPublicKey, SimSecretKey) {
        let mut id = [0u8; 32];
        self.rng.fill_bytes(&mut id);
        let y = self.sample_secret();
        debug!(weight = y.weight(), "simulated keypair");
        let pk = SimPublicKey {
            id,
            mask_key: mask_key(&y),
        };
        (pk, SimSecretKey { id, y })
    }

    fn encapsulate(&mut self, pk: &SimPublicKey) -> (CiphertextBuffer, SimSharedSecret) {
        let m = self.random_message();
        self.encapsulate_with_message(pk, &m)
    }

    fn encapsulate_with_message(
        &mut self,
        pk: &SimPublicKey,
        message: &SimMessage,
    ) -> (CiphertextBuffer, SimSharedSecret) {
        self.register(message);
        let mut salt = [0u8; SALT_BYTES];
        self.rng.fill_bytes(&mut salt);
        let ct = self.honest_ciphertext(pk, message, &salt);
        (ct.into(), shared_secret(&pk.id, message, &salt))
    }

    fn decapsulate(&mut self, ct: &CiphertextBuffer, sk: &SimSecretKey) -> Result<SimSharedSecret> {
        self.check_len(ct)?;
        Ok(self.decapsulate_as(ct, &sk.id, &sk.y))
    }

    fn decapsulate_instrumented(
        &mut self,
        ct: &CiphertextBuffer,
        sk: &SimSecretKey,
    ) -> Result<(SimMessage, TimingClass)> {
        self.check_len(ct)?;
        let flip = self.noise > 0.0 && self.rng.random_bool(self.noise);
        let (message, shown) = match self.decode(ct, &sk.y) {
            Outer::Codeword(idx) => {
                let m = self.codebook[idx].0;
                let shown = if flip { garbage_message(&[]) } else { m };
                (m, shown)
            }
            Outer::Failure { garbage, nearest } => {
                let shown = match nearest {
                    Some(idx) if flip => self.codebook[idx].0,
                    _ => garbage,
                };
                (garbage, shown)
            }
        };
        Ok((message, class_of(&sk.id, &shown)))
    }

    fn decapsulate_with_known_error(
        &mut self,
        ct: &CiphertextBuffer,
        pk: &SimPublicKey,
        guess: &SecretVector,
    ) -> Result<SimSharedSecret> {
        self.check_len(ct)?;
        if guess.len() != self.params.n {
            return Err(AttackError::OraclePrecondition {
                expected: self.params.n,
                actual: guess.len(),
            });
        }
        Ok(self.decapsulate_as(ct, &pk.id, guess))
    }

    fn random_message(&mut self) -> SimMessage {
        let mut m = [0u8; 16];
        self.rng.fill_bytes(&mut m);
        m
    }

    fn probe_ciphertext(&mut self, _pk: &SimPublicKey, message: &SimMessage) -> CiphertextBuffer {
        self.register(message);
        let mut ct = Vec::with_capacity(self.ciphertext_len());
        ct.push(KIND_PROBE);
        ct.extend_from_slice(&self.codeword(message).to_le_bytes());
        ct.resize(self.ciphertext_len(), 0);
        ct.into()
    }

    fn message_timing(&self, pk: &SimPublicKey, message: &SimMessage) -> TimingClass {
        class_of(&pk.id, message)
    }

    fn reveal_secret(&self, sk: &SimSecretKey) -> SecretVector {
        sk.y.clone()
    }
}

fn digest32(h: Sha3_256) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&h.finalize());
    out
}

fn encode_symbols(m: &SimMessage, n1: usize) -> Vec<bool> {
    let mut bytes = vec![0u8; n1.div_ceil(8)];
    let mut xof = Shake256::default();
    xof.update(b"sim-encode");
    xof.update(m);
    xof.finalize_xof().read(&mut bytes);
    (0..n1).map(|i| (bytes[i >> 3] >> (i & 7)) & 1 == 1).collect()
}

fn mask_key(y: &SecretVector) -> [u8; 32] {
    let mut h = Sha3_256::new();
    Digest::update(&mut h, b"sim-mask-key");
    Digest::update(&mut h, y.to_le_bytes());
    digest32(h)
}

fn mask_stream(key: &[u8; 32], salt: &[u8], len: usize) -> SecretVector {
    let mut bytes = vec![0u8; len.div_ceil(8)];
    let mut xof = Shake256::default();
    xof.update(key);
    xof.update(salt);
    xof.finalize_xof().read(&mut bytes);
    SecretVector::from_le_bytes(len, &bytes)
}

fn garbage_message(symbols: &[Option<bool>]) -> SimMessage {
    let mut h = Sha3_256::new();
    Digest::update(&mut h, b"sim-garbage");
    for s in symbols {
        Digest::update(&mut h, [s.map_or(2, u8::from)]);
    }
    let digest = h.finalize();
    let mut m = [0u8; 16];
    m.copy_from_slice(&digest[..16]);
    m
}

fn class_of(id: &[u8; 32], m: &SimMessage) -> TimingClass {
    let mut h = Sha3_256::new();
    Digest::update(&mut h, b"sim-class");
    Digest::update(&mut h, id);
    Digest::update(&mut h, m);
    let digest = h.finalize();
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    TimingClass(u64::from_le_bytes(word))
}

fn shared_secret(id: &[u8; 32], m: &SimMessage, salt: &[u8]) -> SimSharedSecret {
    let mut h = Sha3_256::new();
    Digest::update(&mut h, id);
    Digest::update(&mut h, m);
    Digest::update(&mut h, salt);
    digest32(h)
}

fn rejection_secret(id: &[u8; 32], ct: &[u8]) -> SimSharedSecret {
    let mut h = Sha3_256::new();
    Digest::update(&mut h, b"reject");
    Digest::update(&mut h, id);
    Digest::update(&mut h, ct);
    digest32(h)
}
