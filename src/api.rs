use crate::config::Config;
use crate::error::{ChespiError, ChespiResult};
use crate::labels::{parse_ss8, ss8_string, Ss8};
use crate::model::corvals::CoefficientTable;
use crate::model::loader::Observation;
use crate::model::prior::PriorTable;
use crate::model::{ModelBuildParams, ShiftModel};
use crate::optimizer::candidate::Candidate;
use crate::optimizer::repair::ValidityRepairer;
use crate::optimizer::runner::{OptimizationOptions, Optimizer, Prediction, ProgressCallback, Silent};
use crate::optimizer::segments::SegmentIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub use crate::model::loader::{load_observations, read_sequence};

/// Everything one prediction needs besides configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub sequence: String,
    pub observations: Vec<Observation>,
    /// Per-residue 8-class priors in `HGIE-TSB` order; composition prior
    /// when absent.
    #[serde(default)]
    pub priors: Option<Vec<[f64; 8]>>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResidueScore {
    pub resi: usize,
    pub aa: char,
    pub label: Ss8,
    pub observed: Option<[f64; 2]>,
    pub predicted: [f64; 2],
    /// Zero where there is no shift data.
    pub log_posterior: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub input: String,
    /// Labels after validity repair.
    pub labels: String,
    pub repairs: usize,
    pub energy: f64,
    pub residues: Vec<ResidueScore>,
    /// Agreement with `--reference`, when one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<Accuracy>,
}

/// Fractions of residues whose label matches a reference assignment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Accuracy {
    pub q8: f64,
    pub q3: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionAccuracy {
    /// Best candidate.
    pub best: Accuracy,
    /// Most frequent label at each residue.
    pub consensus: Accuracy,
    /// Mean population frequency of the reference label.
    pub reference_frequency: f64,
}

/// Service: build the scoring model for a request.
pub fn build_model(
    request: &PredictionRequest,
    config: &Config,
    coefficients: Option<CoefficientTable>,
) -> ChespiResult<ShiftModel> {
    let priors = match &request.priors {
        Some(cols) => Some(PriorTable::from_columns(cols.clone())?),
        None => None,
    };
    ModelBuildParams {
        sequence: request.sequence.clone(),
        observations: request.observations.clone(),
        priors,
        coefficients,
        params: config.model.clone(),
    }
    .build_model()
}

/// Service: run the optimizer on a request with the embedded coefficients.
pub fn predict(request: &PredictionRequest, config: &Config) -> ChespiResult<Prediction> {
    let model = Arc::new(build_model(request, config, None)?);
    run_prediction(model, config, request.seed, Silent)
}

pub fn run_prediction<CB: ProgressCallback>(
    model: Arc<ShiftModel>,
    config: &Config,
    seed: Option<u64>,
    callback: CB,
) -> ChespiResult<Prediction> {
    let options = OptimizationOptions::try_from(config)?;
    info!(
        "Optimizing {} residues: {} population(s) of {}, schedule {:?}",
        model.len(),
        options.populations,
        options.population_size,
        options.temperatures
    );
    Optimizer::new(model, options).run(seed, callback)
}

/// Service: repair and score one fixed 8-class assignment.
pub fn score_labels(
    model: &ShiftModel,
    labels: &str,
    config: &Config,
    seed: Option<u64>,
) -> ChespiResult<ScoreReport> {
    let parsed = parse_ss8(labels.trim())?;
    if parsed.len() != model.len() {
        return Err(ChespiError::Input(format!(
            "label string has {} residues, sequence has {}",
            parsed.len(),
            model.len()
        )));
    }

    let repairer = ValidityRepairer::new(config.rules, config.search.max_repair_iterations);
    let mut rng = match seed {
        Some(s) => fastrand::Rng::with_seed(s),
        None => fastrand::Rng::new(),
    };
    let mut segments = SegmentIndex::from_labels(parsed);
    let repairs = repairer.repair(&mut segments, &mut rng)?;
    let candidate = Candidate::new(model, segments.labels().to_vec());

    let residues = (0..model.len())
        .map(|n| ResidueScore {
            resi: n + 1,
            aa: model.sequence()[n] as char,
            label: candidate.labels()[n],
            observed: model.observed(n),
            predicted: candidate.predicted(n),
            log_posterior: candidate.log_post()[n],
        })
        .collect();

    Ok(ScoreReport {
        input: labels.trim().to_string(),
        labels: ss8_string(candidate.labels()),
        repairs,
        energy: candidate.energy(),
        residues,
        accuracy: None,
    })
}

/// Service: Q8/Q3 of `predicted` against a reference 8-class string.
pub fn evaluate_accuracy(predicted: &[Ss8], reference: &str) -> ChespiResult<Accuracy> {
    let reference = parse_reference(reference, predicted.len())?;
    Ok(agreement(predicted, &reference))
}

/// Service: scores both the best candidate and the population consensus
/// against a reference 8-class string.
pub fn evaluate_prediction(prediction: &Prediction, reference: &str) -> ChespiResult<PredictionAccuracy> {
    let best = parse_ss8(&prediction.labels)?;
    let reference = parse_reference(reference, best.len())?;
    let consensus: Vec<Ss8> = prediction.residues.iter().map(|r| r.max8).collect();

    let reference_frequency = prediction
        .residues
        .iter()
        .zip(&reference)
        .map(|(r, label)| r.probs8[label.index()])
        .sum::<f64>()
        / reference.len().max(1) as f64;

    Ok(PredictionAccuracy {
        best: agreement(&best, &reference),
        consensus: agreement(&consensus, &reference),
        reference_frequency,
    })
}

fn parse_reference(reference: &str, len: usize) -> ChespiResult<Vec<Ss8>> {
    let parsed = parse_ss8(reference.trim())?;
    if parsed.len() != len {
        return Err(ChespiError::Input(format!(
            "reference assignment has {} residues, prediction has {}",
            parsed.len(),
            len
        )));
    }
    Ok(parsed)
}

fn agreement(predicted: &[Ss8], reference: &[Ss8]) -> Accuracy {
    let total = reference.len().max(1) as f64;
    let q8 = predicted.iter().zip(reference).filter(|(p, r)| p == r).count();
    let q3 = predicted
        .iter()
        .zip(reference)
        .filter(|(p, r)| p.class() == r.class())
        .count();
    Accuracy {
        q8: q8 as f64 / total,
        q3: q3 as f64 / total,
    }
}
