#![allow(dead_code)]

use chespi::labels::parse_ss8;
use chespi::model::loader::Observation;
use chespi::model::{ModelBuildParams, ShiftModel};
use chespi::optimizer::candidate::Candidate;

pub const SEQUENCE: &str = "MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQ";
pub const NATIVE: &str = "--HHHHHHHHHHH----EEEEE--EEEEE----";

/// Every residue resolved at zero; only useful to get a back-calculator.
pub fn flat_observations(n: usize) -> Vec<Observation> {
    (1..=n)
        .map(|resi| Observation {
            resi,
            aa: None,
            pc1: 0.0,
            pc2: 0.0,
            zscore: None,
        })
        .collect()
}

pub fn build(sequence: &str, observations: Vec<Observation>) -> ShiftModel {
    ModelBuildParams::builder()
        .sequence(sequence.to_string())
        .observations(observations)
        .build()
        .build_model()
        .unwrap()
}

/// Observations that `labels` reproduces exactly, with the residues in
/// `gaps` (1-based) left unresolved.
pub fn synthetic_observations(sequence: &str, labels: &str, gaps: &[usize]) -> Vec<Observation> {
    let scaffold = build(sequence, flat_observations(sequence.len()));
    let native = Candidate::new(&scaffold, parse_ss8(labels).unwrap());
    (0..sequence.len())
        .filter(|n| !gaps.contains(&(n + 1)))
        .map(|n| {
            let [pc1, pc2] = native.predicted(n);
            Observation {
                resi: n + 1,
                aa: sequence.chars().nth(n),
                pc1,
                pc2,
                zscore: Some(12.0),
            }
        })
        .collect()
}

pub fn synthetic_model(gaps: &[usize]) -> ShiftModel {
    build(SEQUENCE, synthetic_observations(SEQUENCE, NATIVE, gaps))
}

pub fn shifts_csv(observations: &[Observation]) -> String {
    let mut out = String::from("resi,aa,pc1,pc2,zscore\n");
    for o in observations {
        out.push_str(&format!(
            "{},{},{:.6},{:.6},{}\n",
            o.resi,
            o.aa.map(String::from).unwrap_or_default(),
            o.pc1,
            o.pc2,
            o.zscore.map(|z| z.to_string()).unwrap_or_default()
        ));
    }
    out
}
