use crate::consts::{NEIGHBOR_SPAN, NUM_CHANNELS, WINDOW_ROWS};
use crate::error::{ChespiError, ChespiResult};
use crate::labels::{Ss3, Ss8};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use strum::IntoEnumIterator;

const EMBEDDED_CORVALS: &str = include_str!("../../data/corvals.json");

pub const NUM_AMINO_ACIDS: usize = 20;

#[derive(Deserialize)]
struct RawClassCoefficients {
    context: Vec<f64>,
    neighbors: Vec<f64>,
}

#[derive(Deserialize)]
struct RawChannel {
    classes: HashMap<String, RawClassCoefficients>,
    baselines: HashMap<String, f64>,
}

#[derive(Deserialize)]
struct RawTable {
    amino_acids: String,
    channels: Vec<RawChannel>,
}

/// Neighbor couplings for one receiving class:
/// `[direction][distance - 1][neighbor label]`, direction 0 = left.
pub type NeighborTensor = [[[f64; 8]; NEIGHBOR_SPAN]; 2];

#[derive(Debug, Clone)]
pub struct ChannelCoefficients {
    /// `[class][offset + 4][amino acid]`
    pub context: [[[f64; NUM_AMINO_ACIDS]; WINDOW_ROWS]; 3],
    pub neighbors: [NeighborTensor; 3],
    pub baselines: [f64; 8],
}

/// Empirical sequence-context and neighbor-coupling coefficients for both
/// shift-projection channels. Loaded once, then shared read-only.
#[derive(Debug, Clone)]
pub struct CoefficientTable {
    aa_lookup: [Option<u8>; 256],
    amino_acids: Vec<u8>,
    pub channels: [ChannelCoefficients; NUM_CHANNELS],
}

impl CoefficientTable {
    pub fn embedded() -> ChespiResult<Self> {
        Self::from_json(EMBEDDED_CORVALS)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ChespiResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn from_json(json: &str) -> ChespiResult<Self> {
        let raw: RawTable = serde_json::from_str(json)?;

        let amino_acids: Vec<u8> = raw.amino_acids.bytes().collect();
        if amino_acids.len() != NUM_AMINO_ACIDS {
            return Err(ChespiError::Config(format!(
                "coefficient table lists {} amino acids, expected {}",
                amino_acids.len(),
                NUM_AMINO_ACIDS
            )));
        }
        let mut aa_lookup = [None; 256];
        for (i, &aa) in amino_acids.iter().enumerate() {
            aa_lookup[aa as usize] = Some(i as u8);
        }

        if raw.channels.len() != NUM_CHANNELS {
            return Err(ChespiError::Config(format!(
                "coefficient table has {} channels, expected {}",
                raw.channels.len(),
                NUM_CHANNELS
            )));
        }

        let first = convert_channel(&raw.channels[0])?;
        let second = convert_channel(&raw.channels[1])?;

        Ok(Self {
            aa_lookup,
            amino_acids,
            channels: [first, second],
        })
    }

    #[inline(always)]
    pub fn aa_index(&self, aa: u8) -> Option<usize> {
        self.aa_lookup[aa.to_ascii_uppercase() as usize].map(|i| i as usize)
    }

    /// Column used for residues beyond either terminus.
    pub fn padding_index(&self) -> usize {
        self.aa_index(b'G').unwrap_or(0)
    }

    pub fn amino_acids(&self) -> &[u8] {
        &self.amino_acids
    }
}

fn convert_channel(raw: &RawChannel) -> ChespiResult<ChannelCoefficients> {
    let mut context = [[[0.0; NUM_AMINO_ACIDS]; WINDOW_ROWS]; 3];
    let mut neighbors = [[[[0.0; 8]; NEIGHBOR_SPAN]; 2]; 3];

    for class in Ss3::iter() {
        let key = class.to_string();
        let coeffs = raw
            .classes
            .get(&key)
            .ok_or_else(|| ChespiError::Config(format!("missing coefficients for class {}", key)))?;

        if coeffs.context.len() != WINDOW_ROWS * NUM_AMINO_ACIDS {
            return Err(ChespiError::Config(format!(
                "class {} context has {} values",
                key,
                coeffs.context.len()
            )));
        }
        if coeffs.neighbors.len() != 2 * NEIGHBOR_SPAN * 8 {
            return Err(ChespiError::Config(format!(
                "class {} neighbor tensor has {} values",
                key,
                coeffs.neighbors.len()
            )));
        }

        let c = class.index();
        for (row, chunk) in coeffs.context.chunks_exact(NUM_AMINO_ACIDS).enumerate() {
            context[c][row].copy_from_slice(chunk);
        }
        for (i, chunk) in coeffs.neighbors.chunks_exact(8).enumerate() {
            neighbors[c][i / NEIGHBOR_SPAN][i % NEIGHBOR_SPAN].copy_from_slice(chunk);
        }
    }

    let mut baselines = [0.0; 8];
    for label in Ss8::iter() {
        baselines[label.index()] = *raw
            .baselines
            .get(&label.to_string())
            .ok_or_else(|| ChespiError::Config(format!("missing baseline for '{}'", label)))?;
    }

    Ok(ChannelCoefficients {
        context,
        neighbors,
        baselines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_table_loads() {
        let table = CoefficientTable::embedded().unwrap();
        assert_eq!(table.amino_acids(), b"ARDNCEQGHILKMFPSTWYV");
        assert_eq!(table.aa_index(b'A'), Some(0));
        assert_eq!(table.aa_index(b'v'), Some(19));
        assert_eq!(table.aa_index(b'X'), None);
        assert_eq!(table.padding_index(), 7);
        assert!((table.channels[0].baselines[Ss8::PiHelix.index()] - 1.631761).abs() < 1e-9);
        assert!((table.channels[1].baselines[Ss8::Loop.index()] - 0.431278).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_truncated_table() {
        let json = r#"{"amino_acids": "ARDNC", "channels": []}"#;
        assert!(matches!(
            CoefficientTable::from_json(json),
            Err(ChespiError::Config(_))
        ));
    }
}
