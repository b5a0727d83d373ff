pub mod backcalc;
pub mod corvals;
pub mod guess;
pub mod likelihood;
pub mod loader;
pub mod prior;

use self::backcalc::ShiftBackCalculator;
use self::corvals::CoefficientTable;
use self::likelihood::Sigmas;
use self::loader::Observation;
use self::prior::PriorTable;
use crate::config::ModelParams;
use crate::consts::{MIN_SEQUENCE_LEN, PRIOR_FLOOR};
use crate::error::{ChespiError, ChespiResult};
use crate::labels::Ss8;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

/// Immutable scoring context shared by every candidate of a run: the
/// back-calculator, the observations, the priors and the sigma table.
#[derive(Debug, Clone)]
pub struct ShiftModel {
    sequence: Vec<u8>,
    backcalc: ShiftBackCalculator,
    observed: Vec<Option<[f64; 2]>>,
    resolved: Vec<usize>,
    resolved_prefix: Vec<usize>,
    disordered: Vec<bool>,
    priors: PriorTable,
    log_priors: Vec<[f64; 8]>,
    sigmas: Sigmas,
}

#[derive(TypedBuilder)]
pub struct ModelBuildParams {
    pub sequence: String,
    pub observations: Vec<Observation>,
    /// Falls back to the amino-acid composition prior.
    #[builder(default, setter(strip_option))]
    pub priors: Option<PriorTable>,
    /// Falls back to the embedded table.
    #[builder(default, setter(strip_option))]
    pub coefficients: Option<CoefficientTable>,
    #[builder(default)]
    pub params: ModelParams,
}

impl ModelBuildParams {
    pub fn build_model(self) -> ChespiResult<ShiftModel> {
        let sequence: Vec<u8> = self
            .sequence
            .trim()
            .bytes()
            .map(|b| b.to_ascii_uppercase())
            .collect();
        let n = sequence.len();
        if n < MIN_SEQUENCE_LEN {
            return Err(ChespiError::Input(format!(
                "sequence has {} residues, need at least {}",
                n, MIN_SEQUENCE_LEN
            )));
        }
        if self.observations.is_empty() {
            return Err(ChespiError::Input("no resolved residues".to_string()));
        }

        let table = match self.coefficients {
            Some(t) => t,
            None => CoefficientTable::embedded()?,
        };
        let residues = sequence
            .iter()
            .enumerate()
            .map(|(i, &aa)| {
                table.aa_index(aa).ok_or_else(|| {
                    ChespiError::Input(format!(
                        "unknown amino acid '{}' at position {}",
                        aa as char,
                        i + 1
                    ))
                })
            })
            .collect::<ChespiResult<Vec<_>>>()?;

        let mut priors = match self.priors {
            Some(p) => p,
            None => PriorTable::composition(&sequence)?,
        };
        if priors.len() != n {
            return Err(ChespiError::Input(format!(
                "prior table covers {} residues, sequence has {}",
                priors.len(),
                n
            )));
        }

        let mut observed = vec![None; n];
        let mut disordered = vec![false; n];
        for obs in &self.observations {
            if obs.resi == 0 || obs.resi > n {
                return Err(ChespiError::Input(format!(
                    "resolved residue {} outside sequence of length {}",
                    obs.resi, n
                )));
            }
            let i = obs.resi - 1;
            if let Some(aa) = obs.aa {
                if aa.to_ascii_uppercase() as u32 != sequence[i] as u32 {
                    return Err(ChespiError::Input(format!(
                        "residue {} is '{}' in the shift table but '{}' in the sequence",
                        obs.resi, aa, sequence[i] as char
                    )));
                }
            }
            if observed[i].is_some() {
                return Err(ChespiError::Input(format!(
                    "residue {} listed twice",
                    obs.resi
                )));
            }
            observed[i] = Some(obs.channels());
            if obs
                .zscore
                .is_some_and(|z| z < self.params.disorder_threshold)
            {
                disordered[i] = true;
                priors.mark_disordered(i);
            }
        }

        let resolved: Vec<usize> = (0..n).filter(|&i| observed[i].is_some()).collect();
        let mut resolved_prefix = vec![0; n + 1];
        for i in 0..n {
            resolved_prefix[i + 1] = resolved_prefix[i] + observed[i].is_some() as usize;
        }

        let log_priors = priors
            .columns()
            .iter()
            .map(|col| col.map(|p| p.max(PRIOR_FLOOR).ln()))
            .collect();

        let n_disordered = disordered.iter().filter(|d| **d).count();
        if n_disordered > 0 {
            debug!("{} residues flagged disordered", n_disordered);
        }
        info!(
            "Model ready: {} residues, {} with shift data",
            n,
            resolved.len()
        );

        Ok(ShiftModel {
            backcalc: ShiftBackCalculator::new(&table, &residues),
            sequence,
            observed,
            resolved,
            resolved_prefix,
            disordered,
            priors,
            log_priors,
            sigmas: Sigmas::scaled(self.params.sigma_scale),
        })
    }
}

impl ShiftModel {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn backcalc(&self) -> &ShiftBackCalculator {
        &self.backcalc
    }

    pub fn priors(&self) -> &PriorTable {
        &self.priors
    }

    pub fn sigmas(&self) -> &Sigmas {
        &self.sigmas
    }

    pub fn resolved(&self) -> &[usize] {
        &self.resolved
    }

    #[inline(always)]
    pub fn observed(&self, n: usize) -> Option<[f64; 2]> {
        self.observed[n]
    }

    pub fn is_disordered(&self, n: usize) -> bool {
        self.disordered[n]
    }

    /// Number of residues with shift data in `[lo, hi)`.
    #[inline(always)]
    pub fn resolved_between(&self, lo: usize, hi: usize) -> usize {
        self.resolved_prefix[hi] - self.resolved_prefix[lo]
    }

    #[inline(always)]
    pub fn log_prior(&self, n: usize, label: Ss8) -> f64 {
        self.log_priors[n][label.index()]
    }

    /// `ln(prior * lik_pc1 * lik_pc2)`, or `None` for a residue without
    /// shift data.
    #[inline(always)]
    pub fn residue_log_posterior(&self, n: usize, label: Ss8, predicted: [f64; 2]) -> Option<f64> {
        let obs = self.observed[n]?;
        Some(
            self.log_priors[n][label.index()]
                + self.sigmas.log_likelihood(0, label, predicted[0] - obs[0])
                + self.sigmas.log_likelihood(1, label, predicted[1] - obs[1]),
        )
    }
}
