pub mod candidate;
pub mod crossover;
pub mod mutation;
pub mod population;
pub mod repair;
pub mod runner;
pub mod segments;

use fastrand::Rng;
use std::f64::consts::TAU;

/// Index drawn in proportion to `weights`. `None` when no weight is positive.
#[inline(always)]
pub fn pick_weighted(rng: &mut Rng, weights: &[f64]) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let mut r = rng.f64() * total;
    let mut last = None;
    for (i, w) in weights.iter().enumerate() {
        if *w <= 0.0 {
            continue;
        }
        if r < *w {
            return Some(i);
        }
        r -= w;
        last = Some(i);
    }
    last
}

/// Standard normal deviate (Box-Muller).
#[inline(always)]
fn normal(rng: &mut Rng) -> f64 {
    let u1 = 1.0 - rng.f64();
    let u2 = rng.f64();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Rank biased toward the front of a sorted population: `|N(0, ratio)| *
/// size`, redrawn until it lands inside. Ratios above 1 pick uniformly.
pub fn select_normal(rng: &mut Rng, ratio: f64, size: usize) -> usize {
    if size <= 1 {
        return 0;
    }
    if ratio > 1.0 {
        return rng.usize(..size);
    }
    loop {
        let i = (normal(rng) * ratio).abs() * size as f64;
        if i < size as f64 {
            return i as usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_weighted_skips_zero_weights() {
        let mut rng = Rng::with_seed(1);
        for _ in 0..500 {
            let i = pick_weighted(&mut rng, &[0.0, 0.7, 0.0, 0.3]).unwrap();
            assert!(i == 1 || i == 3);
        }
        assert_eq!(pick_weighted(&mut rng, &[0.0, 0.0]), None);
        assert_eq!(pick_weighted(&mut rng, &[]), None);
    }

    #[test]
    fn test_select_normal_favours_front() {
        let mut rng = Rng::with_seed(5);
        let mut front = 0;
        for _ in 0..2000 {
            let i = select_normal(&mut rng, 0.5, 20);
            assert!(i < 20);
            if i < 10 {
                front += 1;
            }
        }
        assert!(front > 1200, "front picks {}", front);
    }
}
