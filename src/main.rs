//! Pedaler Design - inverse design of passive filters
//!
//! Generates simulated filter datasets, trains a VAE on them and asks the
//! trained model for component values that reproduce a target response.
//!
//! # Usage
//!
//! ```bash
//! pedaler-design generate --num-samples 1000 --output dataset.npz
//! pedaler-design train --dataset dataset.npz --epochs 20 --output model.json
//! pedaler-design design --model model.json --filter-type bandpass --r 1k --l 10m --c 100n
//! pedaler-design sweep filter.cir --start 10 --stop 1e6 --points 200
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::info;
use pedaler_design::{
    circuit::Circuit,
    dataset::DEFAULT_COUNT,
    dsl,
    error::{DesignError, Result},
    logging,
    model::{Architecture, Vae, VaeConfig},
    solver::{self, AcAnalysis, FrequencySweep, Spacing, DEFAULT_POINTS, DEFAULT_START_HZ, DEFAULT_STOP_HZ},
    training::{TrainConfig, Trainer},
    ComponentValues, Dataset, DatasetGenerator, Designer, GeneratorConfig, Topology,
};

/// Inverse design of passive RC/RLC filters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate random filters and save them as an NPZ dataset
    Generate {
        /// Number of filters to simulate
        #[arg(short = 'n', long, default_value_t = DEFAULT_COUNT)]
        num_samples: usize,

        /// Output dataset path
        #[arg(short, long, default_value = "dataset.npz")]
        output: PathBuf,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Train a VAE on a dataset and save the best checkpoint
    Train(TrainArgs),

    /// Design a filter that matches the response of the given one
    Design {
        /// Trained model checkpoint
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// lowpass, highpass or bandpass
        #[arg(long, default_value = "lowpass")]
        filter_type: Topology,

        /// Target resistance in ohms
        #[arg(long, value_parser = parse_si)]
        r: f64,

        /// Target inductance in henries (bandpass only)
        #[arg(long, value_parser = parse_si)]
        l: Option<f64>,

        /// Target capacitance in farads
        #[arg(long, value_parser = parse_si)]
        c: f64,

        /// Write a `freq_hz,target_db,designed_db` CSV here
        #[arg(long)]
        comparison: Option<PathBuf>,

        /// Write the designed filter's netlist here
        #[arg(long)]
        netlist: Option<PathBuf>,
    },

    /// AC-sweep a netlist and print its response as CSV
    Sweep {
        /// Path to the netlist
        #[arg(value_name = "NETLIST")]
        netlist: PathBuf,

        #[arg(long, default_value_t = DEFAULT_START_HZ, value_parser = parse_si)]
        start: f64,

        #[arg(long, default_value_t = DEFAULT_STOP_HZ, value_parser = parse_si)]
        stop: f64,

        #[arg(long, default_value_t = DEFAULT_POINTS)]
        points: usize,

        /// log or linear
        #[arg(long, default_value_t = Spacing::Logarithmic)]
        spacing: Spacing,
    },
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Dataset to train on; generated on the fly when omitted
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Samples to generate when no dataset is given
    #[arg(short = 'n', long, default_value_t = 500)]
    num_samples: usize,

    /// shallow or deep
    #[arg(long, default_value = "shallow")]
    model_type: Architecture,

    #[arg(long, default_value_t = 10)]
    epochs: usize,

    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Latent width; architecture default when omitted
    #[arg(long)]
    latent_dim: Option<usize>,

    /// Hidden width; architecture default when omitted
    #[arg(long)]
    hidden_dim: Option<usize>,

    #[arg(long, default_value_t = 1e-3)]
    lr: f32,

    /// Epochs without improvement before stopping
    #[arg(long, default_value_t = 5)]
    patience: usize,

    /// Per-epoch loss log
    #[arg(long, default_value = "metrics.csv")]
    metrics: PathBuf,

    /// Best checkpoint
    #[arg(short, long, default_value = "model.json")]
    output: PathBuf,

    #[arg(long)]
    seed: Option<u64>,
}

/// Accept plain numbers as well as netlist values such as `10k` or `4.7n`.
fn parse_si(text: &str) -> std::result::Result<f64, String> {
    dsl::parse_value(text).ok_or_else(|| format!("invalid value: {}", text))
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            num_samples,
            output,
            seed,
        } => generate(num_samples, output, seed),
        Command::Train(args) => train(args),
        Command::Design {
            model,
            filter_type,
            r,
            l,
            c,
            comparison,
            netlist,
        } => {
            let values = ComponentValues {
                resistance: Some(r),
                inductance: l,
                capacitance: Some(c),
            };
            design(model, filter_type, &values, comparison, netlist)
        }
        Command::Sweep {
            netlist,
            start,
            stop,
            points,
            spacing,
        } => sweep(netlist, FrequencySweep::new(start, stop, points, spacing)?),
    }
}

fn generate(count: usize, output: PathBuf, seed: Option<u64>) -> Result<()> {
    let mut config = GeneratorConfig::new().with_count(count);
    config.seed = seed;
    let dataset = DatasetGenerator::new(config)?.generate(&FrequencySweep::default())?;
    dataset.save(&output)
}

fn train(args: TrainArgs) -> Result<()> {
    let dataset = match &args.dataset {
        Some(path) => Dataset::load(path)?,
        None => {
            info!("No dataset given, generating {} samples", args.num_samples);
            let mut config = GeneratorConfig::new().with_count(args.num_samples);
            config.seed = args.seed;
            DatasetGenerator::new(config)?.generate(&FrequencySweep::default())?
        }
    };

    let mut model_config = VaeConfig::new(args.model_type, dataset.feature_dim());
    if let Some(latent_dim) = args.latent_dim {
        model_config = model_config.with_latent_dim(latent_dim);
    }
    if let Some(hidden_dim) = args.hidden_dim {
        model_config = model_config.with_hidden_dim(hidden_dim);
    }
    if let Some(seed) = args.seed {
        model_config = model_config.with_seed(seed);
    }

    let mut config = TrainConfig::new()
        .with_epochs(args.epochs)
        .with_batch_size(args.batch_size)
        .with_learning_rate(args.lr)
        .with_patience(args.patience)
        .with_checkpoint_path(&args.output)
        .with_metrics_path(&args.metrics);
    config.seed = args.seed;

    let report = Trainer::new(config, Vae::new(model_config)?)?.fit_dataset(&dataset)?;
    info!(
        "Finished after {} epochs ({}), best validation loss {:.4}, model saved to {}",
        report.epochs_run,
        report.stop_reason,
        report.best_val_loss,
        args.output.display()
    );
    Ok(())
}

fn design(
    model: PathBuf,
    topology: Topology,
    values: &ComponentValues,
    comparison: Option<PathBuf>,
    netlist: Option<PathBuf>,
) -> Result<()> {
    solver::ensure_available()?;
    let mut designer = Designer::from_checkpoint(&model)?;
    let report = designer.evaluate_values(topology, values)?;

    if let Some(path) = comparison {
        report.write_comparison(path)?;
    }
    if let Some(path) = netlist {
        std::fs::write(&path, report.designed.netlist().to_string()).map_err(|e| DesignError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        info!("Wrote designed netlist to {}", path.display());
    }

    println!("target:   {}", report.target);
    println!("designed: {}", report.designed);
    println!(
        "response error: rms {:.3} dB, max {:.3} dB",
        report.rms_db_error(),
        report.max_db_error()
    );
    Ok(())
}

fn sweep(netlist: PathBuf, sweep: FrequencySweep) -> Result<()> {
    solver::ensure_available()?;
    let ast = dsl::parse_file(&netlist)?;
    let circuit = Circuit::from_ast(&ast)?;

    let mut analysis = AcAnalysis::new(circuit)?;
    let phasors = analysis.run(sweep.points())?;

    let write_err = |e| DesignError::FileWriteError {
        path: "<stdout>".to_string(),
        source: e,
    };
    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    writer
        .write_record(["freq_hz", "magnitude", "phase_deg"])
        .map_err(|e| DesignError::MetricsLog {
            path: "<stdout>".to_string(),
            source: e,
        })?;
    for (freq, v) in sweep.points().iter().zip(&phasors) {
        writer
            .write_record([freq.to_string(), v.norm().to_string(), v.arg().to_degrees().to_string()])
            .map_err(|e| DesignError::MetricsLog {
                path: "<stdout>".to_string(),
                source: e,
            })?;
    }
    writer.flush().map_err(write_err)
}
