//! The decapsulation oracle the attack queries, and query accounting.

use core::fmt::Debug;
use core::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    error::Result, mutator::CiphertextBuffer, params::SchemeParams, vector::SecretVector,
};

/// Discrete side-channel observation of one decapsulation.
///
/// Only equality against a reference class carries meaning. For rejection-
/// sampling leaks, the value counts XOF refills, so larger values are rarer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimingClass(pub u64);

/// A key-encapsulation scheme whose decapsulation leaks a [`TimingClass`].
///
/// Malformed ciphertexts are reported as
/// [`AttackError::OraclePrecondition`](crate::error::AttackError::OraclePrecondition);
/// the attack treats that as fatal.
pub trait DecapsulationOracle {
    /// Encapsulation key.
    type PublicKey;
    /// Decapsulation key. The attack only passes it back to the oracle.
    type SecretKey;
    /// Plaintext encoded into the ciphertext.
    type Message: Clone + PartialEq + Debug;
    /// Encapsulated shared secret.
    type SharedSecret: PartialEq + Debug;

    /// Shape of the secret error vector.
    fn params(&self) -> SchemeParams;

    /// Length in bytes every ciphertext must have.
    fn ciphertext_len(&self) -> usize;

    /// Absolute bit range of the noisy-codeword component inside a serialized
    /// ciphertext. Coded-segment position `i` maps to bit `start + i`.
    fn codeword_region(&self) -> Range<usize>;

    /// Fresh keypair.
    fn keypair(&mut self) -> (Self::PublicKey, Self::SecretKey);

    /// Encapsulate a random message.
    fn encapsulate(&mut self, pk: &Self::PublicKey) -> (CiphertextBuffer, Self::SharedSecret);

    /// Encapsulate a chosen message.
    fn encapsulate_with_message(
        &mut self,
        pk: &Self::PublicKey,
        message: &Self::Message,
    ) -> (CiphertextBuffer, Self::SharedSecret);

    /// Genuine decapsulation.
    fn decapsulate(
        &mut self,
        ct: &CiphertextBuffer,
        sk: &Self::SecretKey,
    ) -> Result<Self::SharedSecret>;

    /// Decapsulation that also reports the decoded message and the leaked class.
    fn decapsulate_instrumented(
        &mut self,
        ct: &CiphertextBuffer,
        sk: &Self::SecretKey,
    ) -> Result<(Self::Message, TimingClass)>;

    /// Decapsulation evaluated with `guess` in place of the key's error vector.
    /// Used only to verify hypotheses.
    fn decapsulate_with_known_error(
        &mut self,
        ct: &CiphertextBuffer,
        pk: &Self::PublicKey,
        guess: &SecretVector,
    ) -> Result<Self::SharedSecret>;

    /// A uniformly random message.
    fn random_message(&mut self) -> Self::Message;

    /// Ciphertext whose decryption sees `Encode(message)` plus the coded
    /// segment of the secret error vector and nothing else.
    fn probe_ciphertext(&mut self, pk: &Self::PublicKey, message: &Self::Message)
    -> CiphertextBuffer;

    /// Class an honest decapsulation of `probe_ciphertext(pk, message)` reports,
    /// computed without the secret key.
    fn message_timing(&self, pk: &Self::PublicKey, message: &Self::Message) -> TimingClass;

    /// Ground-truth secret vector. Only meaningful in test and evaluation builds.
    fn reveal_secret(&self, sk: &Self::SecretKey) -> SecretVector;
}

/// Counting wrapper around an oracle and the victim key it decapsulates with.
pub struct Session<'a, O: DecapsulationOracle> {
    oracle: &'a mut O,
    sk: &'a O::SecretKey,
    queries: u64,
    verifications: u64,
}

impl<'a, O: DecapsulationOracle> Session<'a, O> {
    /// Start counting queries against `sk`.
    pub fn new(oracle: &'a mut O, sk: &'a O::SecretKey) -> Self {
        Self {
            oracle,
            sk,
            queries: 0,
            verifications: 0,
        }
    }

    /// One instrumented decapsulation; returns only the leaked class.
    pub fn timing_class(&mut self, ct: &CiphertextBuffer) -> Result<TimingClass> {
        let (_, class) = self.query(ct)?;
        Ok(class)
    }

    /// One instrumented decapsulation.
    pub fn query(&mut self, ct: &CiphertextBuffer) -> Result<(O::Message, TimingClass)> {
        self.queries += 1;
        let (message, class) = self.oracle.decapsulate_instrumented(ct, self.sk)?;
        trace!(query = self.queries, class = class.0, "instrumented decapsulation");
        Ok((message, class))
    }

    /// One known-error decapsulation, counted separately from instrumented queries.
    pub fn verify(
        &mut self,
        ct: &CiphertextBuffer,
        pk: &O::PublicKey,
        guess: &SecretVector,
    ) -> Result<O::SharedSecret> {
        self.verifications += 1;
        self.oracle.decapsulate_with_known_error(ct, pk, guess)
    }

    /// Direct access to the oracle for non-counted calls (encapsulation, probe setup).
    pub fn oracle(&mut self) -> &mut O {
        &mut *self.oracle
    }

    /// Instrumented queries issued so far.
    pub fn queries(&self) -> u64 {
        self.queries
    }

    /// Known-error decapsulations issued so far.
    pub fn verifications(&self) -> u64 {
        self.verifications
    }
}
