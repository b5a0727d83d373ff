use crate::consts::{COMPOSITION_PRIOR, DISORDER_PRIOR};
use crate::error::{ChespiError, ChespiResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// `.ss8` columns are H G I E B T S L; this maps them onto HGIE-TSB.
const SS8_FILE_ORDER: [usize; 8] = [0, 1, 2, 3, 7, 5, 6, 4];

/// Per-residue prior distribution over the 8 classes (HGIE-TSB order).
#[derive(Debug, Clone, PartialEq)]
pub struct PriorTable {
    columns: Vec<[f64; 8]>,
}

impl PriorTable {
    pub fn from_columns(columns: Vec<[f64; 8]>) -> ChespiResult<Self> {
        let mut columns = columns;
        for (i, col) in columns.iter_mut().enumerate() {
            normalize(col).ok_or_else(|| {
                ChespiError::Input(format!("prior column {} has no positive mass", i + 1))
            })?;
        }
        Ok(Self { columns })
    }

    /// Amino-acid composition fallback.
    pub fn composition(sequence: &[u8]) -> ChespiResult<Self> {
        let columns = sequence
            .iter()
            .map(|&aa| {
                let aa = aa.to_ascii_uppercase();
                COMPOSITION_PRIOR
                    .iter()
                    .find(|(code, _)| *code == aa)
                    .map(|(_, probs)| *probs)
                    .ok_or_else(|| {
                        ChespiError::Input(format!("no composition prior for '{}'", aa as char))
                    })
            })
            .collect::<ChespiResult<Vec<_>>>()?;
        Self::from_columns(columns)
    }

    pub fn from_ss8_file<P: AsRef<Path>>(path: P) -> ChespiResult<Self> {
        Self::from_ss8_reader(BufReader::new(File::open(path)?))
    }

    /// Reads predictor output: comment and blank lines, then one row per
    /// residue `resi aa ss3 pH pG pI pE pB pT pS pL`.
    pub fn from_ss8_reader<R: BufRead>(reader: R) -> ChespiResult<Self> {
        let mut columns = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if fields.len() < 11 {
                return Err(ChespiError::Input(format!(
                    "line {}: expected 11 columns in .ss8 row, found {}",
                    line_no + 1,
                    fields.len()
                )));
            }
            let mut raw = [0.0; 8];
            for (k, field) in fields[3..11].iter().enumerate() {
                raw[k] = field.parse().map_err(|_| {
                    ChespiError::Input(format!("line {}: bad probability '{}'", line_no + 1, field))
                })?;
            }
            let mut col = [0.0; 8];
            for (dst, &src) in SS8_FILE_ORDER.iter().enumerate() {
                col[dst] = raw[src];
            }
            columns.push(col);
        }
        if columns.is_empty() {
            return Err(ChespiError::Input("prior file has no residue rows".to_string()));
        }
        Self::from_columns(columns)
    }

    /// Replaces a residue's prior with the disordered-residue distribution.
    pub fn mark_disordered(&mut self, n: usize) {
        let mut col = DISORDER_PRIOR;
        // Mass is fixed and positive.
        let _ = normalize(&mut col);
        self.columns[n] = col;
    }

    #[inline(always)]
    pub fn column(&self, n: usize) -> &[f64; 8] {
        &self.columns[n]
    }

    pub fn columns(&self) -> &[[f64; 8]] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub(crate) fn normalize(col: &mut [f64; 8]) -> Option<()> {
    if col.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return None;
    }
    let sum: f64 = col.iter().sum();
    if sum <= 0.0 {
        return None;
    }
    col.iter_mut().for_each(|p| *p /= sum);
    Some(())
}
