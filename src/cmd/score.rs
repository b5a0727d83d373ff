use crate::reports;
use chespi::api;
use chespi::config::Config;
use chespi::error::ChespiResult;
use chespi::labels::parse_ss8;
use chespi::model::ShiftModel;
use clap::Args;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub config: Config,

    /// 8-class assignment to evaluate, one `HGIE-TSB` letter per residue.
    #[arg(short, long, allow_hyphen_values = true)]
    pub labels: String,

    /// Seeds the repair of short elements.
    #[arg(short = 'S', long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub json: Option<String>,

    /// Known 8-class assignment (inline or file) to report Q8/Q3 against.
    #[arg(long, allow_hyphen_values = true)]
    pub reference: Option<String>,
}

pub fn run(args: ScoreArgs, model: &ShiftModel, config: &Config) -> ChespiResult<()> {
    let mut report = api::score_labels(model, &args.labels, config, args.seed)?;
    if report.repairs > 0 {
        warn!(
            "⚠️  Input needed {} repair(s): {} -> {}",
            report.repairs, report.input, report.labels
        );
    }

    if let Some(reference) = &args.reference {
        let reference = super::read_reference(reference)?;
        let labels = parse_ss8(&report.labels)?;
        report.accuracy = Some(api::evaluate_accuracy(&labels, &reference)?);
    }

    reports::print_score(&report);

    if let Some(path) = &args.json {
        reports::write_json(path, &report)?;
        info!("💾 Score written to {}", path);
    }
    Ok(())
}
