mod common;

use chespi::config::ElementRules;
use chespi::labels::parse_ss8;
use chespi::model::guess::initial_guess;
use chespi::model::likelihood::LocalLikelihoodEvaluator;
use chespi::optimizer::candidate::Candidate;
use chespi::optimizer::population::{BreedParams, GrowthMode, Population};
use common::{synthetic_model, NATIVE};
use std::collections::HashSet;
use std::sync::Arc;

fn params(growth: GrowthMode, temperature: f64) -> BreedParams {
    BreedParams {
        limit_factor: 10.0,
        temperature,
        operator_probs: [0.6, 0.3, 0.1],
        selection_ratios: [0.5, 2.0],
        sort_every: 10,
        growth,
    }
}

fn seeded_population(seed: u64) -> Population {
    let model = Arc::new(synthetic_model(&[3, 17]));
    let guess = initial_guess(&model);
    let mut pop = Population::new(model, ElementRules::default(), 1000, Some(seed));
    pop.fill_from_random(15, &guess.probs).unwrap();
    pop
}

fn min_energy(pop: &Population) -> f64 {
    pop.members()
        .iter()
        .map(Candidate::energy)
        .fold(f64::INFINITY, f64::min)
}

fn assert_unique(pop: &Population) {
    let keys: HashSet<String> = pop.members().iter().map(Candidate::key).collect();
    assert_eq!(keys.len(), pop.len());
}

#[test]
fn test_best_never_worsens_under_replacement() {
    let mut pop = seeded_population(11);
    assert!(!pop.is_empty());
    let mut best = min_energy(&pop);

    // A hot schedule accepts plenty of uphill moves; the best slot must
    // still survive every cycle.
    for _ in 0..5 {
        pop.breed(&params(GrowthMode::Replace, 50.0)).unwrap();
        let now = min_energy(&pop);
        assert!(now <= best + 1e-9, "best rose from {} to {}", best, now);
        let tracked = pop.best().unwrap().energy();
        assert!((tracked - now).abs() < 1e-9);
        best = now;
    }
    assert_unique(&pop);
}

#[test]
fn test_append_mode_grows_population() {
    let mut pop = seeded_population(5);
    let before = pop.len();
    let stats = pop.breed(&params(GrowthMode::Append, 0.5)).unwrap();
    assert!(stats.attempts > 0);
    assert!(pop.len() >= before);
    assert_unique(&pop);
}

#[test]
fn test_duplicate_push_is_rejected() {
    let mut pop = seeded_population(2);
    let model = Arc::new(synthetic_model(&[3, 17]));
    let native = Candidate::new(&model, parse_ss8(NATIVE).unwrap());
    let first = pop.push(native.clone());
    assert!(!pop.push(native));
    assert!(first || pop.members().iter().any(|c| c.key() == NATIVE));
}

#[test]
fn test_merge_deduplicates() {
    let a = seeded_population(21);
    let b = seeded_population(21);
    let size = a.len();

    let merged = Population::merge(vec![a, b], 100).unwrap();
    assert_eq!(merged.len(), size);
    assert_unique(&merged);

    let energies: Vec<f64> = merged.members().iter().map(Candidate::energy).collect();
    assert!(energies.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_cull_keeps_lowest_energies() {
    let mut pop = seeded_population(8);
    let mut energies: Vec<f64> = pop.members().iter().map(Candidate::energy).collect();
    energies.sort_by(|a, b| a.total_cmp(b));

    pop.cull(5);
    assert_eq!(pop.len(), energies.len().min(5));
    for (c, e) in pop.members().iter().zip(&energies) {
        assert!((c.energy() - e).abs() < 1e-12);
    }
}

#[test]
fn test_summary_frequencies_are_normalized() {
    let mut pop = seeded_population(13);
    pop.breed(&params(GrowthMode::Append, 0.5)).unwrap();
    let summary = pop.summarize().unwrap();

    assert_eq!(summary.residues.len(), NATIVE.len());
    assert!(summary.spread >= 1.0 - 1e-12 && summary.spread <= 8.0 + 1e-9);
    for r in &summary.residues {
        assert!((r.probs8.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((r.probs3.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(r.confidence8.is_ascii_digit());
        assert!(r.confidence3.is_ascii_digit());
    }
    // Residues 3 and 17 have no shifts, so no p0
    assert_eq!(summary.residues[2].p0, 0.0);
    assert_eq!(summary.residues[16].p0, 0.0);
}

#[test]
fn test_periodic_sort_rescores_members() {
    let mut pop = seeded_population(21);
    let p = BreedParams {
        operator_probs: [1.0, 0.0, 0.0],
        sort_every: 1,
        ..params(GrowthMode::Replace, 2.0)
    };
    let stats = pop.breed(&p).unwrap();
    assert!(stats.accepted > 0);

    let model = synthetic_model(&[3, 17]);
    let eval = LocalLikelihoodEvaluator::new(&model);
    for c in pop.members() {
        let full = eval.evaluate_full(c.labels());
        assert!((c.energy() + full.total).abs() < 1e-9);
    }
}

#[test]
fn test_replaced_assignment_can_rejoin() {
    let mut pop = seeded_population(8);
    let originals: Vec<Candidate> = pop.members().to_vec();
    pop.breed(&params(GrowthMode::Replace, 50.0)).unwrap();

    let present: HashSet<String> = pop.members().iter().map(Candidate::key).collect();
    let displaced: Vec<Candidate> = originals
        .into_iter()
        .filter(|c| !present.contains(&c.key()))
        .collect();
    assert!(!displaced.is_empty());
    for c in displaced {
        assert!(pop.push(c));
    }
    assert_unique(&pop);
}
