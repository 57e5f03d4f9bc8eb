//! hqcfail: run the decoding-failure timing attack against one backend.
//!
//! Generates a victim key pair, recovers its secret through the oracle and
//! scores the result against the real secret.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use eyre::{Context, Result};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use hqcfail::hqc::{Hqc1Oracle, Hqc3Oracle, Hqc5Oracle};
use hqcfail::simulated::DEFAULT_RADIUS;
use hqcfail::{Attack, AttackConfig, DecapsulationOracle, SchemeParams, SimulatedOracle};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Instrumented HQC-1
    Hqc1,
    /// Instrumented HQC-3
    Hqc3,
    /// Instrumented HQC-5
    Hqc5,
    /// Simulated oracle with HQC-1 dimensions
    Simulated,
}

#[derive(Parser)]
#[command(name = "hqcfail")]
#[command(about = "Recover an HQC secret key through a decoding-failure timing oracle")]
#[command(version)]
struct Args {
    /// Oracle to attack
    #[arg(long, value_enum, default_value = "simulated")]
    backend: Backend,

    /// JSON attack configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the victim key and oracle randomness
    #[arg(long, default_value = "1")]
    oracle_seed: u64,

    /// Seed for the attack's shuffles
    #[arg(long)]
    seed: Option<u64>,

    /// Trials per position (majority vote size)
    #[arg(long)]
    majority_of: Option<u32>,

    /// Extra queries confirming each boundary
    #[arg(long)]
    confirmations: Option<u32>,

    /// Block correction radius of the simulated oracle
    #[arg(long, default_value_t = DEFAULT_RADIUS)]
    radius: usize,

    /// Probability that a simulated query reports the wrong outcome
    #[arg(long, default_value = "0.0")]
    noise: f64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => AttackConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AttackConfig::default(),
    };
    if let Some(m) = args.majority_of {
        config.majority_of = m;
    }
    if let Some(c) = args.confirmations {
        config.boundary_confirmations = c;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    match args.backend {
        Backend::Hqc1 => run(Hqc1Oracle::from_seed(args.oracle_seed), config, args.json),
        Backend::Hqc3 => run(Hqc3Oracle::from_seed(args.oracle_seed), config, args.json),
        Backend::Hqc5 => run(Hqc5Oracle::from_seed(args.oracle_seed), config, args.json),
        Backend::Simulated => {
            let oracle = SimulatedOracle::builder(SchemeParams::HQC1)
                .radius(args.radius)
                .noise(args.noise)
                .seed(args.oracle_seed)
                .build()
                .wrap_err("Invalid simulated oracle settings")?;
            run(oracle, config, args.json)
        }
    }
}

fn run<O: DecapsulationOracle>(mut oracle: O, config: AttackConfig, json: bool) -> Result<()> {
    let (pk, sk) = oracle.keypair();
    let secret = oracle.reveal_secret(&sk);

    let start = Instant::now();
    let report = Attack::new(&mut oracle, config)?
        .run(&pk, &sk)
        .wrap_err("Attack aborted")?
        .with_ground_truth(&secret);
    info!("Attack time: {:.2?}", start.elapsed());

    if !report.matches(&secret) {
        warn!(bits_wrong = ?report.bits_wrong, "recovered vector differs from the secret");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("outcome:       {:?}", report.outcome);
        println!("exact match:   {}", report.matches(&secret));
        println!("bits wrong:    {}", report.bits_wrong.unwrap_or_default());
        println!("trials:        {}", report.trials);
        println!("queries:       {}", report.queries);
        println!("verifications: {}", report.verifications);
        println!("tail pattern:  {:?}", report.pattern.as_ref().map(|p| p.offsets()));
    }
    Ok(())
}
