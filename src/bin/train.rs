//! Обучение сети на выборке из файла
//!
//! Использование:
//! ```text
//! cargo run --bin train -- data/xor.data --epochs 2000 --seed 7
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use lib_backprop_network::{Network, TrainingConfig, TrainingData};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Train a backpropagation network on a data file")]
struct Args {
    /// Training data file
    data: PathBuf,

    /// Training rate
    #[arg(long, default_value = "0.15")]
    eta: f64,

    /// Momentum
    #[arg(long, default_value = "0.5")]
    alpha: f64,

    /// Smoothing factor of the running average error
    #[arg(long, default_value = "0.0")]
    smoothing: f64,

    /// Seed for reproducible initial weights
    #[arg(long)]
    seed: Option<u64>,

    /// Passes over the whole data file
    #[arg(long, default_value = "1")]
    epochs: usize,

    /// Print only the final error
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let data = TrainingData::from_path(&args.data)
        .with_context(|| format!("failed to read {}", args.data.display()))?;
    println!(
        "Topology = {}",
        data.topology().iter().map(|layer| layer.neurons).join(" ")
    );

    let config = TrainingConfig {
        eta: args.eta,
        alpha: args.alpha,
        error_smoothing: args.smoothing,
    };
    let mut rng: Box<dyn RngCore> = match args.seed {
        Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    };
    let mut network = Network::random(rng.as_mut(), config, data.topology())?;

    for epoch in 1..=args.epochs {
        for pass in &data {
            network.feed_forward(pass.inputs())?;
            if !args.quiet {
                println!("Epoch {epoch}");
                println!("Inputs   = {}", pass.inputs().iter().join(" "));
                println!("Outputs  = {}", network.results().iter().join(" "));
                println!("Expected = {}", pass.expected().iter().join(" "));
            }
            network.back_propagate(pass.expected())?;
            if !args.quiet {
                println!("Recent average error = {}", network.recent_average_error());
            }
        }
    }

    info!(
        epochs = args.epochs,
        passes = data.len(),
        error = network.last_error(),
        average = network.recent_average_error(),
        "training finished"
    );
    Ok(())
}
