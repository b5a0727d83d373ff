use super::ShiftModel;
use crate::consts::{COIL_MIX, HELIX_MIX, NUM_CHANNELS};
use crate::labels::{Ss3, Ss8, COIL_LABELS};
use strum::IntoEnumIterator;

/// Posterior under a mean-field neighborhood, used to seed and to sample
/// the first population.
#[derive(Debug, Clone)]
pub struct InitialGuess {
    /// Normalized prior x likelihood at resolved residues, the prior elsewhere.
    pub probs: Vec<[f64; 8]>,
    /// Most probable label per residue.
    pub labels: Vec<Ss8>,
}

/// Neighbor contribution a residue of `class` receives when every neighbor
/// carries that class's typical label mix.
fn mean_field_neighbor_sum(model: &ShiftModel, ch: usize, class: Ss3) -> f64 {
    let tensor = model.backcalc().neighbor_tensor(ch, class);
    let mut per_label = [0.0; 8];
    for direction in tensor {
        for distance in direction {
            for (l, v) in distance.iter().enumerate() {
                per_label[l] += v;
            }
        }
    }
    match class {
        Ss3::Strand => per_label[Ss8::Strand.index()],
        Ss3::Helix => weighted(
            &[Ss8::AlphaHelix, Ss8::ThreeTen, Ss8::PiHelix],
            &HELIX_MIX,
            &per_label,
        ),
        Ss3::Coil => weighted(&COIL_LABELS, &COIL_MIX, &per_label),
    }
}

fn weighted(labels: &[Ss8], weights: &[f64], per_label: &[f64; 8]) -> f64 {
    let total: f64 = weights.iter().sum();
    labels
        .iter()
        .zip(weights)
        .map(|(l, w)| per_label[l.index()] * w)
        .sum::<f64>()
        / total
}

pub fn initial_guess(model: &ShiftModel) -> InitialGuess {
    let mut field = [[0.0; 3]; NUM_CHANNELS];
    for (ch, row) in field.iter_mut().enumerate() {
        for class in Ss3::iter() {
            row[class.index()] = mean_field_neighbor_sum(model, ch, class);
        }
    }

    let mut probs = model.priors().columns().to_vec();
    for &n in model.resolved() {
        let mut post = [0.0; 8];
        for label in Ss8::iter() {
            let predicted = [
                model.backcalc().own_term(0, n, label) + field[0][label.class().index()],
                model.backcalc().own_term(1, n, label) + field[1][label.class().index()],
            ];
            if let Some(lp) = model.residue_log_posterior(n, label, predicted) {
                post[label.index()] = lp;
            }
        }
        // Softmax in log space keeps tiny likelihoods from underflowing.
        let max = post.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for p in post.iter_mut() {
            *p = (*p - max).exp();
            sum += *p;
        }
        for p in post.iter_mut() {
            *p /= sum;
        }
        probs[n] = post;
    }

    let labels = probs.iter().map(argmax_label).collect();
    InitialGuess { probs, labels }
}

pub fn argmax_label(col: &[f64; 8]) -> Ss8 {
    let mut best = 0;
    for (i, p) in col.iter().enumerate() {
        if *p > col[best] {
            best = i;
        }
    }
    Ss8::from_index(best).unwrap_or(Ss8::Loop)
}
