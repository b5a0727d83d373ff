use chespi::config::Config;
use chespi::error::{ChespiError, ChespiResult};
use chespi::model::corvals::CoefficientTable;
use chespi::model::loader::{load_observations, parse_sequence, read_sequence};
use chespi::model::prior::PriorTable;
use chespi::model::{ModelBuildParams, ShiftModel};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Sequence file (raw or FASTA), or the sequence itself.
    #[arg(global = true, short = 'q', long)]
    sequence: Option<String>,

    /// CSV with columns resi,aa,pc1,pc2,zscore.
    #[arg(global = true, short = 'x', long)]
    shifts: Option<String>,

    /// Secondary-structure predictor output (.ss8); composition prior if absent.
    #[arg(global = true, long)]
    priors: Option<String>,

    /// Coefficient table JSON; embedded table if absent.
    #[arg(global = true, long)]
    corvals: Option<String>,

    /// JSON config file; command-line flags override it.
    #[arg(global = true, long)]
    config_file: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Predict(cmd::predict::PredictArgs),
    Score(cmd::score::ScoreArgs),
}

fn main() {
    // 1. Parse Raw Matches (to distinguish user input from defaults)
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("🧬 Initializing CheSPI...");

    // 2. Resolve config: file first, then flags typed on the command line
    let (cli_config, sub_matches) = match &cli.command {
        Commands::Predict(args) => (&args.config, subcommand(&matches, "predict")),
        Commands::Score(args) => (&args.config, subcommand(&matches, "score")),
    };
    let config = match &cli.config_file {
        Some(path) => {
            info!("📂 Loading config: {}", path);
            let mut file_config = Config::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            });
            file_config.merge_from_cli(cli_config, sub_matches);
            file_config
        }
        None => cli_config.clone(),
    };

    // 3. Load inputs and build the model
    let model = match load_model(&cli, &config) {
        Ok(m) => Arc::new(m),
        Err(e) => {
            error!("❌ FATAL ERROR INITIALIZING MODEL:");
            error!("   {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Predict(args) => cmd::predict::run(args, model, &config),
        Commands::Score(args) => cmd::score::run(args, &model, &config),
    };
    if let Err(e) = result {
        error!("❌ {}", e);
        process::exit(1);
    }
}

fn subcommand<'a>(matches: &'a ArgMatches, name: &str) -> &'a ArgMatches {
    matches.subcommand_matches(name).unwrap_or(matches)
}

fn load_model(cli: &Cli, config: &Config) -> ChespiResult<ShiftModel> {
    let sequence = cli
        .sequence
        .as_deref()
        .ok_or_else(|| ChespiError::Input("--sequence is required".to_string()))?;
    let sequence = if Path::new(sequence).exists() {
        info!("📂 Loading sequence: {}", sequence);
        read_sequence(sequence)?
    } else {
        parse_sequence(sequence)
    };

    let shifts = cli
        .shifts
        .as_deref()
        .ok_or_else(|| ChespiError::Input("--shifts is required".to_string()))?;
    info!("📂 Loading shifts: {}", shifts);
    let observations = load_observations(shifts)?;

    let priors = match &cli.priors {
        Some(path) => {
            info!("📂 Loading priors: {}", path);
            Some(PriorTable::from_ss8_file(path)?)
        }
        None => None,
    };
    let coefficients = match &cli.corvals {
        Some(path) => {
            info!("📂 Loading coefficients: {}", path);
            Some(CoefficientTable::load_from_file(path)?)
        }
        None => None,
    };

    ModelBuildParams {
        sequence,
        observations,
        priors,
        coefficients,
        params: config.model.clone(),
    }
    .build_model()
}
