use super::candidate::Candidate;
use super::select_normal;
use crate::labels::Ss8;
use fastrand::Rng;

/// Two-parent crossover in consecutive blocks: starts from a random parent
/// and switches parent at each residue with probability `switch_prob`.
pub fn consecutive_crossover(a: &[Ss8], b: &[Ss8], switch_prob: f64, rng: &mut Rng) -> Vec<Ss8> {
    debug_assert_eq!(a.len(), b.len());
    let parents = [a, b];
    let mut from = rng.usize(..2);
    let mut child = Vec::with_capacity(a.len());
    for i in 0..a.len() {
        if rng.f64() < switch_prob {
            from = 1 - from;
        }
        child.push(parents[from][i]);
    }
    child
}

/// Each residue copied from a separately drawn member of the first `size`
/// members, biased to the front by `ratio`.
pub fn multi_parent_crossover(
    members: &[Candidate],
    size: usize,
    ratio: f64,
    rng: &mut Rng,
) -> Vec<Ss8> {
    let size = size.min(members.len());
    let n = members.first().map_or(0, |m| m.labels().len());
    (0..n)
        .map(|i| members[select_normal(rng, ratio, size)].labels()[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::parse_ss8;

    #[test]
    fn test_consecutive_takes_every_residue_from_a_parent() {
        let a = parse_ss8("HHHHHHHHHH").unwrap();
        let b = parse_ss8("EEEEEEEEEE").unwrap();
        let mut rng = Rng::with_seed(42);
        for _ in 0..50 {
            let child = consecutive_crossover(&a, &b, 0.2, &mut rng);
            assert_eq!(child.len(), 10);
            assert!(child.iter().all(|l| *l == Ss8::AlphaHelix || *l == Ss8::Strand));
        }
    }

    #[test]
    fn test_zero_switch_copies_one_parent() {
        let a = parse_ss8("HHHH----").unwrap();
        let b = parse_ss8("--EEEE--").unwrap();
        let mut rng = Rng::with_seed(3);
        let child = consecutive_crossover(&a, &b, 0.0, &mut rng);
        assert!(child == a || child == b);
    }
}
