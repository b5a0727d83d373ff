use super::candidate::Candidate;
use super::repair::ValidityRepairer;
use super::population::{BreedParams, BreedStats, GrowthMode, Population, ResidueSummary};
use crate::config::{Config, ElementRules};
use crate::error::{ChespiError, ChespiResult};
use crate::labels::{collapse, ss3_string, ss8_string};
use crate::model::guess::initial_guess;
use crate::model::ShiftModel;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct OptimizationOptions {
    pub population_size: usize,
    pub limit_factor: f64,
    pub temperatures: Vec<f64>,
    pub operator_probs: [f64; 3],
    pub selection_ratios: [f64; 2],
    pub sort_every: usize,
    pub keep: usize,
    pub populations: usize,
    pub merge_keep: usize,
    pub max_repair_iterations: usize,
    pub rules: ElementRules,
}

impl TryFrom<&Config> for OptimizationOptions {
    type Error = ChespiError;

    fn try_from(cfg: &Config) -> ChespiResult<Self> {
        Ok(Self {
            population_size: cfg.search.population_size,
            limit_factor: cfg.search.limit_factor,
            temperatures: cfg.search.get_temperature_schedule()?,
            operator_probs: cfg.search.get_operator_probs()?,
            selection_ratios: cfg.search.get_selection_ratios()?,
            sort_every: cfg.search.sort_every,
            keep: cfg.search.keep,
            populations: cfg.search.populations.max(1),
            merge_keep: cfg.search.merge_keep,
            max_repair_iterations: cfg.search.max_repair_iterations,
            rules: cfg.rules,
        })
    }
}

impl OptimizationOptions {
    /// Breeding parameters for one stage of the schedule.
    fn stage(&self, temperature: f64, growth: GrowthMode) -> BreedParams {
        BreedParams {
            limit_factor: self.limit_factor / self.temperatures.len() as f64,
            temperature,
            operator_probs: self.operator_probs,
            selection_ratios: self.selection_ratios,
            sort_every: self.sort_every,
            growth,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub sequence: String,
    /// Best candidate, 8-class.
    pub labels: String,
    /// Best candidate, 3-class.
    pub classes: String,
    pub energy: f64,
    /// Energy of the seed built from the mean-field guess.
    pub guess_energy: f64,
    /// `guess_energy - energy`: log-likelihood gained by the search.
    pub improvement: f64,
    pub spread: f64,
    pub population_size: usize,
    pub confidence8: String,
    pub confidence3: String,
    pub stats: BreedStats,
    pub residues: Vec<ResidueSummary>,
}

/// Receives the best energy after every temperature stage.
/// Boolean return value indicates if the search should continue (true) or abort (false).
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, stage: usize, temperature: f64, best_energy: f64, best_labels: &str) -> bool;
}

/// Ignores progress.
pub struct Silent;

impl ProgressCallback for Silent {
    fn on_progress(&self, _: usize, _: f64, _: f64, _: &str) -> bool {
        true
    }
}

pub struct Optimizer {
    model: Arc<ShiftModel>,
    options: OptimizationOptions,
}

impl Optimizer {
    pub fn new(model: Arc<ShiftModel>, options: OptimizationOptions) -> Self {
        Self { model, options }
    }

    pub fn run<CB: ProgressCallback>(&self, seed: Option<u64>, callback: CB) -> ChespiResult<Prediction> {
        let opts = &self.options;
        let start = Instant::now();

        // 1. Seed candidate from the mean-field guess
        let guess = initial_guess(&self.model);
        let mut pops: Vec<Population> = (0..opts.populations)
            .map(|i| {
                Population::new(
                    self.model.clone(),
                    opts.rules,
                    opts.max_repair_iterations,
                    seed.map(|s| s.wrapping_add(i as u64)),
                )
            })
            .collect();

        let repairer = ValidityRepairer::new(opts.rules, opts.max_repair_iterations);
        let mut rng = match seed {
            Some(s) => fastrand::Rng::with_seed(s.wrapping_add(9999)),
            None => fastrand::Rng::new(),
        };
        let seeded = Candidate::repaired(&self.model, guess.labels.clone(), &repairer, &mut rng)?;
        let guess_energy = seeded.energy();
        info!(
            "Guess: {} (energy {:.3})",
            ss8_string(seeded.labels()),
            guess_energy
        );

        // 2. Random members drawn from the guess posterior, plus the seed
        pops.par_iter_mut()
            .map(|p| -> ChespiResult<()> {
                p.fill_from_random(opts.population_size, &guess.probs)?;
                p.push(seeded.clone());
                Ok(())
            })
            .collect::<ChespiResult<Vec<_>>>()?;

        // 3. Anneal every population through the schedule
        let mut stats = BreedStats::default();
        for (stage, &temperature) in opts.temperatures.iter().enumerate() {
            let params = opts.stage(temperature, GrowthMode::Append);
            let stage_stats = pops
                .par_iter_mut()
                .map(|p| p.breed(&params))
                .collect::<ChespiResult<Vec<_>>>()?;
            for s in stage_stats {
                accumulate(&mut stats, &s);
            }

            let Some((energy, labels)) = best_of(&pops) else {
                break;
            };
            debug!(
                "Stage {} | T {:.3} | Best: {:.3} | {} accepted",
                stage, temperature, energy, stats.accepted
            );
            if !callback.on_progress(stage, temperature, energy, &labels) {
                break;
            }
        }

        // 4. Merge independent populations and re-breed at the final temperature
        let mut population = if pops.len() > 1 {
            let mut merged = Population::merge(pops, opts.merge_keep)
                .ok_or_else(|| ChespiError::Structural("no population to merge".to_string()))?;
            let last = opts.temperatures.last().copied().unwrap_or(1.0);
            let s = merged.breed(&opts.stage(last, GrowthMode::Replace))?;
            accumulate(&mut stats, &s);
            merged
        } else {
            pops.pop()
                .ok_or_else(|| ChespiError::Structural("no population bred".to_string()))?
        };
        population.rescore();
        population.cull(opts.keep);

        let summary = population
            .summarize()
            .ok_or_else(|| ChespiError::Structural("population is empty".to_string()))?;
        let best = population
            .best()
            .ok_or_else(|| ChespiError::Structural("population is empty".to_string()))?;

        let prediction = Prediction {
            sequence: String::from_utf8_lossy(self.model.sequence()).into_owned(),
            labels: ss8_string(best.labels()),
            classes: ss3_string(&collapse(best.labels())),
            energy: best.energy(),
            guess_energy,
            improvement: guess_energy - best.energy(),
            spread: summary.spread,
            population_size: population.len(),
            confidence8: summary.residues.iter().map(|r| r.confidence8).collect(),
            confidence3: summary.residues.iter().map(|r| r.confidence3).collect(),
            stats,
            residues: summary.residues,
        };
        info!(
            "Search finished in {:.2}s: energy {:.3} (improved by {:.3})",
            start.elapsed().as_secs_f64(),
            prediction.energy,
            prediction.improvement
        );
        Ok(prediction)
    }
}

fn best_of(pops: &[Population]) -> Option<(f64, String)> {
    pops.iter()
        .filter_map(Population::best)
        .min_by(|a, b| a.energy().total_cmp(&b.energy()))
        .map(|c| (c.energy(), c.key()))
}

fn accumulate(total: &mut BreedStats, s: &BreedStats) {
    total.attempts += s.attempts;
    total.accepted += s.accepted;
    total.duplicates += s.duplicates;
    total.no_proposal += s.no_proposal;
    total.uninformative += s.uninformative;
    total.repair_failures += s.repair_failures;
}
