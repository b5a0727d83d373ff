use super::backcalc::{Column, ContributionTable, LabelView};
use super::ShiftModel;
use crate::consts::{CHANNEL_SIGMAS, NEIGHBOR_SPAN, NUM_CHANNELS};
use crate::labels::Ss8;

/// Label-dependent Gaussian widths for both channels.
#[derive(Debug, Clone, Copy)]
pub struct Sigmas {
    values: [[f64; 8]; NUM_CHANNELS],
    logs: [[f64; 8]; NUM_CHANNELS],
}

impl Sigmas {
    pub fn scaled(scale: f64) -> Self {
        let mut values = CHANNEL_SIGMAS;
        let mut logs = [[0.0; 8]; NUM_CHANNELS];
        for ch in 0..NUM_CHANNELS {
            for l in 0..8 {
                values[ch][l] *= scale;
                logs[ch][l] = values[ch][l].ln();
            }
        }
        Self { values, logs }
    }

    #[inline(always)]
    pub fn get(&self, ch: usize, label: Ss8) -> f64 {
        self.values[ch][label.index()]
    }

    /// `ln(exp(-dev²/2σ²) / σ)`
    #[inline(always)]
    pub fn log_likelihood(&self, ch: usize, label: Ss8, dev: f64) -> f64 {
        let z = dev / self.values[ch][label.index()];
        -0.5 * z * z - self.logs[ch][label.index()]
    }
}

/// Window columns and per-residue log posteriors for a proposed edit,
/// ready to be spliced into a candidate on acceptance.
#[derive(Debug, Clone)]
pub struct PendingWindow {
    pub lo: usize,
    pub columns: [Vec<Column>; NUM_CHANNELS],
    /// One entry per residue in the window; unresolved residues hold 0.
    pub log_post: Vec<f64>,
    pub local: f64,
    pub delta: f64,
}

impl PendingWindow {
    pub fn hi(&self) -> usize {
        self.lo + self.log_post.len()
    }
}

#[derive(Debug, Clone)]
pub enum LocalEvaluation {
    Scored(PendingWindow),
    /// The window holds no observed residue; never accept.
    Uninformative,
}

#[derive(Debug, Clone)]
pub struct FullEvaluation {
    pub tables: [ContributionTable; NUM_CHANNELS],
    pub log_post: Vec<f64>,
    pub total: f64,
}

pub struct LocalLikelihoodEvaluator<'a> {
    model: &'a ShiftModel,
}

impl<'a> LocalLikelihoodEvaluator<'a> {
    pub fn new(model: &'a ShiftModel) -> Self {
        Self { model }
    }

    pub fn evaluate_full(&self, labels: &[Ss8]) -> FullEvaluation {
        let tables = self.model.backcalc().tables(labels);
        let mut log_post = vec![0.0; labels.len()];
        let mut total = 0.0;
        for (n, lp) in log_post.iter_mut().enumerate() {
            let predicted = [tables[0].predicted(n), tables[1].predicted(n)];
            if let Some(v) = self.model.residue_log_posterior(n, labels[n], predicted) {
                *lp = v;
                total += v;
            }
        }
        FullEvaluation {
            tables,
            log_post,
            total,
        }
    }

    /// Scores overwriting `[start, start + edit.len())` of `labels` by
    /// recomputing only the edit plus `NEIGHBOR_SPAN` residues either side.
    /// `log_post` is the committed per-residue cache.
    pub fn evaluate(
        &self,
        labels: &[Ss8],
        log_post: &[f64],
        start: usize,
        edit: &[Ss8],
    ) -> LocalEvaluation {
        let n = labels.len();
        let lo = start.saturating_sub(NEIGHBOR_SPAN);
        let hi = (start + edit.len() + NEIGHBOR_SPAN).min(n);
        if lo >= hi || self.model.resolved_between(lo, hi) == 0 {
            return LocalEvaluation::Uninformative;
        }

        let view = LabelView::proposed(labels, start, edit);
        let calc = self.model.backcalc();
        let columns = [calc.columns(0, lo, hi, &view), calc.columns(1, lo, hi, &view)];

        let mut window_post = vec![0.0; hi - lo];
        let mut local = 0.0;
        let mut previous = 0.0;
        for (k, lp) in window_post.iter_mut().enumerate() {
            let r = lo + k;
            let predicted = [
                columns[0][k].iter().sum::<f64>(),
                columns[1][k].iter().sum::<f64>(),
            ];
            if let Some(v) = self
                .model
                .residue_log_posterior(r, view.get(r as isize), predicted)
            {
                *lp = v;
                local += v;
                previous += log_post[r];
            }
        }

        LocalEvaluation::Scored(PendingWindow {
            lo,
            columns,
            log_post: window_post,
            local,
            delta: local - previous,
        })
    }
}
