use super::candidate::Candidate;
use super::crossover::{consecutive_crossover, multi_parent_crossover};
use super::mutation::{Mutation, MutationProposer};
use super::repair::ValidityRepairer;
use super::{pick_weighted, select_normal};
use crate::config::ElementRules;
use crate::consts::CROSSOVER_SWITCH_PROB;
use crate::error::{ChespiError, ChespiResult};
use crate::labels::{Ss3, Ss8};
use crate::model::guess::argmax_label;
use crate::model::likelihood::LocalEvaluation;
use crate::model::ShiftModel;
use fastrand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

/// Where accepted crossover children go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthMode {
    /// Overwrite the worse parent (or the last slot for multi-parent).
    Replace,
    /// Append; the population grows during the cycle.
    Append,
}

#[derive(Debug, Clone)]
pub struct BreedParams {
    /// Breeding attempts per member present at the start of the cycle.
    pub limit_factor: f64,
    pub temperature: f64,
    /// Weights of mutation, two-parent crossover and multi-parent crossover.
    pub operator_probs: [f64; 3],
    /// Selection spread for the first and for the other parents.
    pub selection_ratios: [f64; 2],
    pub sort_every: usize,
    pub growth: GrowthMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BreedStats {
    pub attempts: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub no_proposal: usize,
    pub uninformative: usize,
    pub repair_failures: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EnergyStats {
    pub size: usize,
    pub mean: f64,
    pub min: f64,
    pub std_dev: f64,
    pub spread: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResidueSummary {
    /// 1-based.
    pub resi: usize,
    pub aa: char,
    /// Label in the best candidate.
    pub label: Ss8,
    pub class: Ss3,
    /// Label frequencies over the population, `HGIE-TSB` order.
    pub probs8: [f64; 8],
    /// Class frequencies, `HSC` order.
    pub probs3: [f64; 3],
    pub max8: Ss8,
    pub max3: Ss3,
    pub confidence8: char,
    pub confidence3: char,
    /// Best candidate's posterior here; 0 without shift data.
    pub p0: f64,
    pub observed: Option<[f64; 2]>,
    pub predicted: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct PopulationSummary {
    pub best_energy: f64,
    pub spread: f64,
    pub residues: Vec<ResidueSummary>,
}

/// An energy-ordered pool of candidates deduplicated by label string.
pub struct Population {
    model: Arc<ShiftModel>,
    proposer: MutationProposer,
    repairer: ValidityRepairer,
    members: Vec<Candidate>,
    seen: HashSet<String>,
    best: usize,
    rng: Rng,
}

impl Population {
    pub fn new(
        model: Arc<ShiftModel>,
        rules: ElementRules,
        max_repair_iterations: usize,
        seed: Option<u64>,
    ) -> Self {
        let rng = if let Some(s) = seed {
            Rng::with_seed(s)
        } else {
            Rng::new()
        };
        Self {
            model,
            proposer: MutationProposer::new(rules),
            repairer: ValidityRepairer::new(rules, max_repair_iterations),
            members: Vec::new(),
            seen: HashSet::new(),
            best: 0,
            rng,
        }
    }

    pub fn members(&self) -> &[Candidate] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Lowest-energy member.
    pub fn best(&self) -> Option<&Candidate> {
        self.members.get(self.best)
    }

    /// Adds a candidate unless its labels are already present.
    pub fn push(&mut self, candidate: Candidate) -> bool {
        if !self.seen.insert(candidate.key()) {
            return false;
        }
        self.members.push(candidate);
        self.track_best(self.members.len() - 1);
        true
    }

    /// Draws `num` candidates residue by residue from `probs`, each repaired
    /// before scoring. Draws whose repair diverges are dropped.
    pub fn fill_from_random(&mut self, num: usize, probs: &[[f64; 8]]) -> ChespiResult<usize> {
        let mut added = 0;
        for _ in 0..num {
            let labels: Vec<Ss8> = probs
                .iter()
                .map(|col| {
                    pick_weighted(&mut self.rng, col)
                        .and_then(Ss8::from_index)
                        .unwrap_or(Ss8::Loop)
                })
                .collect();
            match Candidate::repaired(&self.model, labels, &self.repairer, &mut self.rng) {
                Ok(c) => {
                    if self.push(c) {
                        added += 1;
                    }
                }
                Err(ChespiError::RepairDiverged { iterations }) => {
                    warn!("Dropping random candidate: repair stopped after {} iterations", iterations);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }

    /// Recomputes every member's caches from its labels, dropping the error
    /// accumulated by windowed commits.
    pub fn rescore(&mut self) {
        for c in self.members.iter_mut() {
            c.rescore(&self.model);
        }
    }

    pub fn sort(&mut self) {
        self.members.sort_by(|a, b| a.energy().total_cmp(&b.energy()));
        self.best = 0;
    }

    /// Sorts and keeps the `keep` best.
    pub fn cull(&mut self, keep: usize) {
        self.sort();
        if keep > 0 && self.members.len() > keep {
            self.members.truncate(keep);
        }
        self.seen = self.members.iter().map(Candidate::key).collect();
    }

    /// Folds the members of `other` that are not yet present into `self`.
    /// Returns how many were shared.
    pub fn absorb(&mut self, other: Population) -> usize {
        let mut shared = 0;
        for c in other.members {
            if !self.push(c) {
                shared += 1;
            }
        }
        shared
    }

    /// Union of independently bred populations, deduplicated, sorted and
    /// culled to `keep`.
    pub fn merge(populations: Vec<Population>, keep: usize) -> Option<Population> {
        let mut iter = populations.into_iter();
        let mut merged = iter.next()?;
        for other in iter {
            let shared = merged.absorb(other);
            debug!("Merged population, {} candidates in common", shared);
        }
        merged.cull(keep);
        Some(merged)
    }

    fn track_best(&mut self, i: usize) {
        if self.best >= self.members.len()
            || self.members[i].energy() < self.members[self.best].energy()
        {
            self.best = i;
        }
    }

    /// Metropolis test. A worse child never replaces the current best.
    fn accept(&mut self, enerdiff: f64, target: Option<usize>, temperature: f64) -> bool {
        if enerdiff <= 0.0 {
            return true;
        }
        if target == Some(self.best) {
            return false;
        }
        (-enerdiff / temperature).exp() > self.rng.f64()
    }

    fn place(&mut self, child: Candidate, target: Option<usize>) {
        self.seen.insert(child.key());
        let slot = match target {
            Some(t) => {
                let displaced = std::mem::replace(&mut self.members[t], child);
                self.seen.remove(&displaced.key());
                t
            }
            None => {
                self.members.push(child);
                self.members.len() - 1
            }
        };
        self.track_best(slot);
    }

    /// One breeding cycle at a fixed temperature.
    pub fn breed(&mut self, params: &BreedParams) -> ChespiResult<BreedStats> {
        let mut stats = BreedStats::default();
        let size = self.members.len();
        if size == 0 {
            return Ok(stats);
        }
        self.seen = self.members.iter().map(Candidate::key).collect();
        let limit = (size as f64 * params.limit_factor).round() as usize;
        let [first_ratio, other_ratio] = params.selection_ratios;

        for _ in 0..limit {
            stats.attempts += 1;
            let i = select_normal(&mut self.rng, first_ratio, size);
            let op = pick_weighted(&mut self.rng, &params.operator_probs).unwrap_or(0);

            let accepted = match op {
                0 => self.try_mutation(i, params, &mut stats)?,
                1 => self.try_crossover(i, size, other_ratio, params, &mut stats)?,
                _ => self.try_multi_crossover(size, other_ratio, params, &mut stats)?,
            };

            if accepted {
                stats.accepted += 1;
                if params.sort_every > 0 && stats.accepted % params.sort_every == 0 {
                    self.rescore();
                    self.sort();
                    let s = self.energy_stats();
                    debug!(
                        "average energy: {:9.3} {:9.3} {:8.4} {:7.4} {:4} {:3}",
                        s.mean, s.min, s.std_dev, s.spread, stats.attempts, s.size
                    );
                }
            }
        }
        Ok(stats)
    }

    fn try_mutation(
        &mut self,
        i: usize,
        params: &BreedParams,
        stats: &mut BreedStats,
    ) -> ChespiResult<bool> {
        let Some(mutation) = self.proposer.propose(self.members[i].segments(), &mut self.rng) else {
            stats.no_proposal += 1;
            return Ok(false);
        };
        let window = match self.members[i].evaluate(&self.model, &mutation) {
            LocalEvaluation::Scored(w) => w,
            LocalEvaluation::Uninformative => {
                stats.uninformative += 1;
                return Ok(false);
            }
        };
        if self.seen.contains(&edited_key(self.members[i].labels(), &mutation)) {
            stats.duplicates += 1;
            return Ok(false);
        }
        if !self.accept(-window.delta, Some(i), params.temperature) {
            return Ok(false);
        }
        let mut child = self.members[i].clone();
        child.commit(&mutation, window)?;
        self.place(child, Some(i));
        Ok(true)
    }

    fn try_crossover(
        &mut self,
        i: usize,
        size: usize,
        ratio: f64,
        params: &BreedParams,
        stats: &mut BreedStats,
    ) -> ChespiResult<bool> {
        if size < 2 {
            stats.no_proposal += 1;
            return Ok(false);
        }
        let mut o = i;
        while o == i {
            o = select_normal(&mut self.rng, ratio, size);
        }
        let labels = consecutive_crossover(
            self.members[i].labels(),
            self.members[o].labels(),
            CROSSOVER_SWITCH_PROB,
            &mut self.rng,
        );
        let Some(child) = self.repaired_child(labels, stats)? else {
            return Ok(false);
        };
        let worse = if self.members[i].energy() >= self.members[o].energy() {
            i
        } else {
            o
        };
        let (reference, target) = match params.growth {
            GrowthMode::Replace => (self.members[worse].energy(), Some(worse)),
            GrowthMode::Append => (self.members[i].energy(), None),
        };
        self.consider(child, reference, target, params, stats)
    }

    fn try_multi_crossover(
        &mut self,
        size: usize,
        ratio: f64,
        params: &BreedParams,
        stats: &mut BreedStats,
    ) -> ChespiResult<bool> {
        let labels = multi_parent_crossover(&self.members, size, ratio, &mut self.rng);
        let Some(child) = self.repaired_child(labels, stats)? else {
            return Ok(false);
        };
        let last = self.members.len() - 1;
        let reference = self.members[last].energy();
        self.consider(child, reference, Some(last), params, stats)
    }

    fn repaired_child(
        &mut self,
        labels: Vec<Ss8>,
        stats: &mut BreedStats,
    ) -> ChespiResult<Option<Candidate>> {
        match Candidate::repaired(&self.model, labels, &self.repairer, &mut self.rng) {
            Ok(c) => Ok(Some(c)),
            Err(ChespiError::RepairDiverged { iterations }) => {
                warn!("Discarding child: repair stopped after {} iterations", iterations);
                stats.repair_failures += 1;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn consider(
        &mut self,
        child: Candidate,
        reference: f64,
        target: Option<usize>,
        params: &BreedParams,
        stats: &mut BreedStats,
    ) -> ChespiResult<bool> {
        if self.seen.contains(&child.key()) {
            stats.duplicates += 1;
            return Ok(false);
        }
        if !self.accept(child.energy() - reference, target, params.temperature) {
            return Ok(false);
        }
        self.place(child, target);
        Ok(true)
    }

    /// Per-residue 8-class frequencies over all members.
    pub fn label_frequencies(&self) -> Vec<[f64; 8]> {
        let n = self.model.len();
        let mut freqs = vec![[0.0; 8]; n];
        if self.members.is_empty() {
            return freqs;
        }
        for c in &self.members {
            for (f, l) in freqs.iter_mut().zip(c.labels()) {
                f[l.index()] += 1.0;
            }
        }
        let total = self.members.len() as f64;
        for f in freqs.iter_mut() {
            for p in f.iter_mut() {
                *p /= total;
            }
        }
        freqs
    }

    pub fn energy_stats(&self) -> EnergyStats {
        let size = self.members.len();
        if size == 0 {
            return EnergyStats {
                size,
                mean: 0.0,
                min: 0.0,
                std_dev: 0.0,
                spread: 1.0,
            };
        }
        let energies: Vec<f64> = self.members.iter().map(Candidate::energy).collect();
        let mean = energies.iter().sum::<f64>() / size as f64;
        let var = energies.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / size as f64;
        let min = energies.iter().cloned().fold(f64::INFINITY, f64::min);
        EnergyStats {
            size,
            mean,
            min,
            std_dev: var.sqrt(),
            spread: spread(&self.label_frequencies()),
        }
    }

    pub fn summarize(&self) -> Option<PopulationSummary> {
        let best = self.best()?;
        let freqs = self.label_frequencies();
        let residues = freqs
            .iter()
            .enumerate()
            .map(|(n, probs8)| {
                let mut probs3 = [0.0; 3];
                for label in Ss8::iter() {
                    probs3[label.class().index()] += probs8[label.index()];
                }
                let max8 = argmax_label(probs8);
                let max3 = Ss3::iter()
                    .max_by(|a, b| probs3[a.index()].total_cmp(&probs3[b.index()]))
                    .unwrap_or(Ss3::Coil);
                let observed = self.model.observed(n);
                let p0 = if observed.is_some() {
                    best.log_post()[n].exp()
                } else {
                    0.0
                };
                ResidueSummary {
                    resi: n + 1,
                    aa: self.model.sequence()[n] as char,
                    label: best.labels()[n],
                    class: best.labels()[n].class(),
                    probs8: *probs8,
                    probs3,
                    max8,
                    max3,
                    confidence8: confidence_digit(probs8[max8.index()], p0),
                    confidence3: confidence_digit(probs3[max3.index()], p0),
                    p0,
                    observed,
                    predicted: best.predicted(n),
                }
            })
            .collect();
        Some(PopulationSummary {
            best_energy: best.energy(),
            spread: spread(&freqs),
            residues,
        })
    }
}

/// Key of `labels` with the mutation's edit written over it.
fn edited_key(labels: &[Ss8], mutation: &Mutation) -> String {
    let (start, edit) = mutation.edit();
    labels
        .iter()
        .enumerate()
        .map(|(p, l)| {
            if p >= start && p < start + edit.len() {
                edit[p - start].symbol()
            } else {
                l.symbol()
            }
        })
        .collect()
}

/// `exp` of the mean per-residue Shannon entropy: 1 when every member
/// agrees, up to 8.
pub fn spread(freqs: &[[f64; 8]]) -> f64 {
    if freqs.is_empty() {
        return 1.0;
    }
    let total: f64 = freqs
        .iter()
        .map(|f| {
            f.iter()
                .filter(|p| **p > 0.0)
                .map(|p| -p * p.ln())
                .sum::<f64>()
        })
        .sum();
    (total / freqs.len() as f64).exp()
}

/// Confidence digit for the top frequency `pr`; a unanimous residue is
/// split into `9` and `8` by the best candidate's posterior `p0`.
pub fn confidence_digit(pr: f64, p0: f64) -> char {
    let digit = if pr >= 1.0 {
        if 1.0 + p0 / 0.4 > 1.1 {
            9
        } else {
            8
        }
    } else if pr > 0.96 {
        7
    } else if pr > 0.90 {
        6
    } else if pr < 0.60 {
        1
    } else {
        ((pr * 10.0).floor() as i64 - 3).max(0)
    };
    char::from_digit(digit as u32, 10).unwrap_or('0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_digits() {
        assert_eq!(confidence_digit(1.0, 0.1), '9');
        assert_eq!(confidence_digit(1.0, 0.01), '8');
        assert_eq!(confidence_digit(0.97, 0.0), '7');
        assert_eq!(confidence_digit(0.92, 0.0), '6');
        assert_eq!(confidence_digit(0.85, 0.0), '5');
        assert_eq!(confidence_digit(0.65, 0.0), '3');
        assert_eq!(confidence_digit(0.59, 0.0), '1');
    }

    #[test]
    fn test_spread_bounds() {
        let agree = vec![[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]; 4];
        assert!((spread(&agree) - 1.0).abs() < 1e-12);
        let uniform = vec![[0.125; 8]; 4];
        assert!((spread(&uniform) - 8.0).abs() < 1e-9);
    }
}
