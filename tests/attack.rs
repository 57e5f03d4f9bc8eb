//! End-to-end attack runs against the simulated oracle at HQC-1 dimensions.

use hqcfail::{
    Attack, AttackConfig, DecapsulationOracle, Outcome, Pattern, PatternCatalog, SchemeParams,
    SecretVector, SimulatedOracle, WeightOverflow,
    simulated::{SimPublicKey, SimSecretKey},
};

const HQC1: SchemeParams = SchemeParams::HQC1;

/// A key pair whose secret has no bits in the tail.
fn keypair_with_clean_tail(
    oracle: &mut SimulatedOracle,
) -> (SimPublicKey, SimSecretKey, SecretVector) {
    loop {
        let (pk, sk) = oracle.keypair();
        let y = oracle.reveal_secret(&sk);
        if y.weight_in(HQC1.tail()) == 0 {
            return (pk, sk, y);
        }
    }
}

#[test]
fn noiseless_oracle_gives_exact_recovery() {
    let mut oracle = SimulatedOracle::builder(HQC1)
        .radius(8)
        .seed(101)
        .build()
        .unwrap();
    let (pk, sk, y) = keypair_with_clean_tail(&mut oracle);
    assert_eq!(y.weight(), 66);

    let config = AttackConfig {
        seed: Some(5),
        ..AttackConfig::default()
    };
    let report = Attack::new(&mut oracle, config)
        .unwrap()
        .run(&pk, &sk)
        .unwrap()
        .with_ground_truth(&y);

    assert_eq!(report.outcome, Outcome::Recovered);
    assert!(report.matches(&y));
    assert_eq!(report.bits_wrong, Some(0));
    assert!(report.trials <= 5);
    assert!(
        report.queries <= 5 * (HQC1.n1 * HQC1.n2) as u64,
        "{} queries",
        report.queries
    );
    assert_eq!(report.pattern, Some(Pattern::default()));
}

#[test]
fn tail_bits_keep_queries_within_five_passes() {
    let mut oracle = SimulatedOracle::builder(HQC1)
        .radius(8)
        .tail_pattern(vec![2])
        .seed(5)
        .build()
        .unwrap();
    let (pk, sk) = oracle.keypair();
    let y = oracle.reveal_secret(&sk);
    assert_eq!(y.weight_in(HQC1.tail()), 1);

    let config = AttackConfig {
        seed: Some(5),
        ..AttackConfig::default()
    };
    let report = Attack::new(&mut oracle, config)
        .unwrap()
        .run(&pk, &sk)
        .unwrap()
        .with_ground_truth(&y);

    // the coded segment never reaches omega, so only settled positions end the trials
    assert!(
        report.queries <= 5 * HQC1.n1n2() as u64,
        "{} queries",
        report.queries
    );
    assert_eq!(report.outcome, Outcome::Recovered);
    assert!(report.matches(&y));
    assert_eq!(report.pattern, Some(Pattern::new(vec![2])));
}

#[test]
fn ten_percent_noise_still_finds_errors() {
    for seed in [7u64, 8] {
        let mut oracle = SimulatedOracle::builder(HQC1)
            .radius(8)
            .noise(0.1)
            .seed(seed)
            .build()
            .unwrap();
        let (pk, sk) = oracle.keypair();
        let y = oracle.reveal_secret(&sk);

        let config = AttackConfig {
            majority_of: 5,
            boundary_confirmations: 4,
            weight_overflow: WeightOverflow::Tolerate,
            seed: Some(seed),
            ..AttackConfig::default()
        };
        assert_eq!(config.majority_min(), 3);
        let report = Attack::new(&mut oracle, config)
            .unwrap()
            .run(&pk, &sk)
            .unwrap()
            .with_ground_truth(&y);

        let coded = HQC1.n1n2();
        let truth = y.resized(coded);
        let predicted = report.recovered.resized(coded);
        let wrong = predicted.distance(&truth);
        assert!(
            wrong * 20 <= coded,
            "seed {seed}: {wrong} of {coded} positions wrong"
        );
        // an all-clear prediction would pass the distance check, not these
        let recalled = predicted.iter_ones().filter(|&i| truth.get(i)).count();
        let false_pos = predicted.weight() - recalled;
        assert!(
            recalled * 10 >= truth.weight() * 4,
            "seed {seed}: recalled {recalled} of {}",
            truth.weight()
        );
        assert!(
            false_pos <= HQC1.omega,
            "seed {seed}: {false_pos} false positives"
        );
        assert!(report.trials <= 5);
    }
}

#[test]
fn listed_catalog_resolves_a_weight_two_tail() {
    let mut oracle = SimulatedOracle::builder(HQC1)
        .radius(8)
        .tail_pattern(vec![1, 3])
        .seed(202)
        .build()
        .unwrap();
    let (pk, sk) = oracle.keypair();
    let y = oracle.reveal_secret(&sk);
    assert_eq!(y.weight_in(HQC1.tail()), 2);

    let catalog = PatternCatalog::from_patterns(vec![
        Pattern::new(vec![0]),
        Pattern::new(vec![2, 4]),
        Pattern::new(vec![1, 3]),
        Pattern::new(vec![0, 1]),
    ]);
    let config = AttackConfig {
        seed: Some(9),
        ..AttackConfig::default()
    };
    let report = Attack::new(&mut oracle, config)
        .unwrap()
        .with_catalog(catalog)
        .run(&pk, &sk)
        .unwrap();

    assert_eq!(report.outcome, Outcome::Recovered);
    assert_eq!(report.pattern, Some(Pattern::new(vec![1, 3])));
    assert!(report.matches(&y));

    // the recovered vector opens fresh honest ciphertexts
    let (ct, k) = oracle.encapsulate(&pk);
    assert_eq!(
        oracle
            .decapsulate_with_known_error(&ct, &pk, &report.recovered)
            .unwrap(),
        k
    );
}

#[test]
fn report_serializes_to_json() {
    let params = SchemeParams {
        n: 1030,
        n1: 8,
        n2: 128,
        omega: 12,
        delta: 2,
    };
    let mut oracle = SimulatedOracle::builder(params)
        .radius(6)
        .seed(3)
        .build()
        .unwrap();
    let (pk, sk) = oracle.keypair();
    let config = AttackConfig {
        seed: Some(4),
        ..AttackConfig::default()
    };
    let report = Attack::new(&mut oracle, config).unwrap().run(&pk, &sk).unwrap();
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert!(json.get("evidence").is_none());
    assert_eq!(json["seed"], 4);
    assert_eq!(json["queries"], report.queries);
    assert!(json["support"].is_array());
    assert!(json.get("recovered").is_none());
}

#[test]
fn unresolved_run_keeps_per_position_confidence() {
    let mut oracle = SimulatedOracle::builder(HQC1)
        .radius(8)
        .tail_pattern(vec![1, 3])
        .seed(202)
        .build()
        .unwrap();
    let (pk, sk) = oracle.keypair();
    let y = oracle.reveal_secret(&sk);

    let catalog = PatternCatalog::from_patterns(vec![Pattern::default(), Pattern::new(vec![0])]);
    let config = AttackConfig {
        seed: Some(9),
        ..AttackConfig::default()
    };
    let report = Attack::new(&mut oracle, config)
        .unwrap()
        .with_catalog(catalog)
        .run(&pk, &sk)
        .unwrap();

    assert_eq!(report.outcome, Outcome::Unresolved);
    assert_eq!(report.pattern, None);
    assert_eq!(report.verifications, 2);

    let confidences = report.confidences();
    assert_eq!(confidences.len(), HQC1.n1n2());
    assert_eq!(report.evidence.prediction(HQC1.n), report.recovered);
    for i in report.recovered.iter_ones() {
        assert!(report.evidence.predict(i));
        assert!(confidences[i].is_some_and(|c| c >= 0.5), "position {i}");
        assert!(y.get(i), "position {i} is not an error");
    }
    assert_eq!(report.recovered.weight_in(HQC1.tail()), 0);
}
