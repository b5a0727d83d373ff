use super::mutation::Mutation;
use super::repair::ValidityRepairer;
use super::segments::SegmentIndex;
use crate::consts::NUM_CHANNELS;
use crate::error::ChespiResult;
use crate::labels::{ss8_string, Ss8};
use crate::model::backcalc::ContributionTable;
use crate::model::likelihood::{LocalEvaluation, LocalLikelihoodEvaluator, PendingWindow};
use crate::model::ShiftModel;
use fastrand::Rng;

/// One complete label assignment with its cached back-calculation.
///
/// Owns its segment index, both contribution tables and the per-residue
/// log posterior; cloning deep-copies all of them.
#[derive(Debug, Clone)]
pub struct Candidate {
    segments: SegmentIndex,
    tables: [ContributionTable; NUM_CHANNELS],
    log_post: Vec<f64>,
    energy: f64,
}

impl Candidate {
    /// Scores `labels` from scratch. No validity repair is applied.
    pub fn new(model: &ShiftModel, labels: Vec<Ss8>) -> Self {
        let full = LocalLikelihoodEvaluator::new(model).evaluate_full(&labels);
        Self {
            segments: SegmentIndex::from_labels(labels),
            tables: full.tables,
            log_post: full.log_post,
            energy: -full.total,
        }
    }

    /// Repairs `labels` first, then scores the result.
    pub fn repaired(
        model: &ShiftModel,
        labels: Vec<Ss8>,
        repairer: &ValidityRepairer,
        rng: &mut Rng,
    ) -> ChespiResult<Self> {
        let mut segments = SegmentIndex::from_labels(labels);
        repairer.repair(&mut segments, rng)?;
        let mut candidate = Self::new(model, segments.labels().to_vec());
        candidate.segments = segments;
        Ok(candidate)
    }

    pub fn segments(&self) -> &SegmentIndex {
        &self.segments
    }

    pub fn labels(&self) -> &[Ss8] {
        self.segments.labels()
    }

    /// Energy is the negated total log posterior; lower is better.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn log_post(&self) -> &[f64] {
        &self.log_post
    }

    pub fn tables(&self) -> &[ContributionTable; NUM_CHANNELS] {
        &self.tables
    }

    pub fn predicted(&self, n: usize) -> [f64; NUM_CHANNELS] {
        [self.tables[0].predicted(n), self.tables[1].predicted(n)]
    }

    /// Population dedup key: the 8-class string.
    pub fn key(&self) -> String {
        ss8_string(self.labels())
    }

    pub fn evaluate(&self, model: &ShiftModel, mutation: &Mutation) -> LocalEvaluation {
        let (start, edit) = mutation.edit();
        LocalLikelihoodEvaluator::new(model).evaluate(self.labels(), &self.log_post, start, &edit)
    }

    /// Applies an accepted mutation and splices the window scored for it.
    /// On error the candidate is left untouched.
    pub fn commit(&mut self, mutation: &Mutation, window: PendingWindow) -> ChespiResult<()> {
        let mut segments = self.segments.clone();
        mutation.apply(&mut segments)?;
        self.segments = segments;
        for (table, columns) in self.tables.iter_mut().zip(&window.columns) {
            table.splice(window.lo, columns);
        }
        let hi = window.hi();
        self.log_post[window.lo..hi].copy_from_slice(&window.log_post);
        self.energy -= window.delta;
        Ok(())
    }

    /// Recomputes every cache from the labels, dropping accumulated
    /// floating-point drift.
    pub fn rescore(&mut self, model: &ShiftModel) {
        let full = LocalLikelihoodEvaluator::new(model).evaluate_full(self.labels());
        self.tables = full.tables;
        self.log_post = full.log_post;
        self.energy = -full.total;
    }
}
