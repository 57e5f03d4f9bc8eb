//! Choosing the plaintext the probe ciphertext carries.

use tracing::debug;

use crate::oracle::{DecapsulationOracle, TimingClass};

/// The selected probe message.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeMessage<M> {
    /// Plaintext to encode.
    pub message: M,
    /// Its offline timing class.
    pub class: TimingClass,
    /// Random messages examined to find it.
    pub examined: u64,
}

/// Search up to `budget` random messages for one whose class reaches `target`.
///
/// A rare class makes accidental matches after a decoding failure unlikely.
/// When no message reaches `target` the largest class seen wins; earlier
/// messages win ties. `budget` is treated as at least one.
pub fn select_probe_message<O: DecapsulationOracle>(
    oracle: &mut O,
    pk: &O::PublicKey,
    budget: u64,
    target: u64,
) -> ProbeMessage<O::Message> {
    let message = oracle.random_message();
    let class = oracle.message_timing(pk, &message);
    let mut best = ProbeMessage {
        message,
        class,
        examined: 1,
    };
    while best.class.0 < target && best.examined < budget {
        let message = oracle.random_message();
        let class = oracle.message_timing(pk, &message);
        best.examined += 1;
        if class > best.class {
            best.message = message;
            best.class = class;
        }
    }
    debug!(class = best.class.0, examined = best.examined, "probe message");
    best
}
