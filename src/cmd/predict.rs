use crate::reports;
use chespi::api;
use chespi::config::Config;
use chespi::error::ChespiResult;
use chespi::model::ShiftModel;
use chespi::optimizer::runner::{Prediction, ProgressCallback};
use clap::Args;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub config: Config,

    /// Independent runs; the lowest-energy result is reported.
    #[arg(short = 'a', long)]
    pub attempts: Option<usize>,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,

    /// Write the full prediction as JSON.
    #[arg(long)]
    pub json: Option<String>,

    /// Write per-residue probabilities as CSV.
    #[arg(long)]
    pub out: Option<String>,

    /// Known 8-class assignment (inline or file) to report Q8/Q3 against.
    #[arg(long, allow_hyphen_values = true)]
    pub reference: Option<String>,
}

struct CliLogger;
impl ProgressCallback for CliLogger {
    fn on_progress(&self, stage: usize, temperature: f64, best_energy: f64, _labels: &str) -> bool {
        info!("Stage {:2} | T {:.3} | Best: {:.3}", stage, temperature, best_energy);
        true
    }
}

pub fn run(args: PredictArgs, model: Arc<ShiftModel>, config: &Config) -> ChespiResult<()> {
    // Read up front so a bad reference fails before the search
    let reference = args.reference.as_deref().map(super::read_reference).transpose()?;
    let attempts = args.attempts.unwrap_or(1).max(1);
    let mut best: Option<Prediction> = None;

    for i in 1..=attempts {
        if attempts > 1 {
            info!("➡️  Attempt #{} of {}", i, attempts);
        }
        let seed = args.seed.map(|s| s.wrapping_add((i as u64).wrapping_mul(100)));
        let prediction = api::run_prediction(model.clone(), config, seed, CliLogger)?;
        if best.as_ref().map_or(true, |b| prediction.energy < b.energy) {
            best = Some(prediction);
        }
    }

    let Some(prediction) = best else {
        return Ok(());
    };

    info!("=== 🏆 FINAL RESULT ===");
    info!("Energy: {:.3} (guess {:.3})", prediction.energy, prediction.guess_energy);

    reports::print_prediction(&prediction);
    reports::print_residue_table(&prediction);

    if let Some(reference) = &reference {
        let accuracy = api::evaluate_prediction(&prediction, reference)?;
        info!(
            "🎯 Q8 {:.3} | Q3 {:.3} (best candidate)",
            accuracy.best.q8, accuracy.best.q3
        );
        reports::print_accuracy(&accuracy);
    }

    if let Some(path) = &args.json {
        reports::write_json(path, &prediction)?;
        info!("💾 Prediction written to {}", path);
    }
    if let Some(path) = &args.out {
        reports::write_residue_csv(path, &prediction)?;
        info!("💾 Per-residue probabilities written to {}", path);
    }
    Ok(())
}
