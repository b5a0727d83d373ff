use crate::error::{ChespiError, ChespiResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One resolved residue with its two shift-projection values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// 1-based position in the full sequence.
    pub resi: usize,
    #[serde(default)]
    pub aa: Option<char>,
    pub pc1: f64,
    pub pc2: f64,
    /// Per-residue quality score; low values flag disorder.
    #[serde(default)]
    pub zscore: Option<f64>,
}

impl Observation {
    pub fn channels(&self) -> [f64; 2] {
        [self.pc1, self.pc2]
    }
}

/// Reads a `resi,aa,pc1,pc2,zscore` table (`aa` and `zscore` may be empty).
pub fn load_observations<P: AsRef<Path>>(path: P) -> ChespiResult<Vec<Observation>> {
    debug!("Loading shift projections from {}", path.as_ref().display());
    read_observations(File::open(path)?)
}

pub fn read_observations<R: Read>(reader: R) -> ChespiResult<Vec<Observation>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut observations = Vec::new();
    for record in rdr.deserialize() {
        let obs: Observation = record?;
        observations.push(obs);
    }
    if observations.is_empty() {
        return Err(ChespiError::Input("shift table has no rows".to_string()));
    }
    Ok(observations)
}

/// Accepts a raw one-letter sequence or FASTA (header lines skipped).
pub fn parse_sequence(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.starts_with('>') && !l.starts_with(';'))
        .flat_map(|l| l.chars())
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub fn read_sequence<P: AsRef<Path>>(path: P) -> ChespiResult<String> {
    Ok(parse_sequence(&fs::read_to_string(path)?))
}
