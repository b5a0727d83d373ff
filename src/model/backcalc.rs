use super::corvals::{CoefficientTable, NeighborTensor};
use crate::consts::{NEIGHBOR_SPAN, NUM_CHANNELS, OWN_ROW, WINDOW_ROWS};
use crate::labels::{Ss3, Ss8};
use strum::IntoEnumIterator;

/// One residue's contributions: rows 0..4 come from the left neighbors
/// (row 3 is the nearest), row 4 is the own term, rows 5..9 the right
/// neighbors (row 5 is the nearest).
pub type Column = [f64; WINDOW_ROWS];

/// Back-calculated contributions for one channel, one column per residue.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionTable {
    columns: Vec<Column>,
}

impl ContributionTable {
    #[inline(always)]
    pub fn predicted(&self, n: usize) -> f64 {
        self.columns[n].iter().sum()
    }

    pub fn column(&self, n: usize) -> &Column {
        &self.columns[n]
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Overwrites `[lo, lo + columns.len())`.
    pub fn splice(&mut self, lo: usize, columns: &[Column]) {
        self.columns[lo..lo + columns.len()].copy_from_slice(columns);
    }
}

/// Labels as they would read after overwriting `[start, start + edit.len())`.
#[derive(Debug, Clone, Copy)]
pub struct LabelView<'a> {
    base: &'a [Ss8],
    start: usize,
    edit: &'a [Ss8],
}

impl<'a> LabelView<'a> {
    pub fn committed(base: &'a [Ss8]) -> Self {
        Self {
            base,
            start: 0,
            edit: &[],
        }
    }

    pub fn proposed(base: &'a [Ss8], start: usize, edit: &'a [Ss8]) -> Self {
        Self { base, start, edit }
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Positions outside the sequence read as loop.
    #[inline(always)]
    pub fn get(&self, pos: isize) -> Ss8 {
        if pos < 0 || pos as usize >= self.base.len() {
            return Ss8::Loop;
        }
        let p = pos as usize;
        if p >= self.start && p < self.start + self.edit.len() {
            self.edit[p - self.start]
        } else {
            self.base[p]
        }
    }
}

/// Additive back-calculation of the two shift-projection channels.
///
/// The sequence-context part of each residue's own term is fixed once the
/// sequence is known, so it is folded with the label baselines into
/// `own_terms[channel][residue][label]` up front.
#[derive(Debug, Clone)]
pub struct ShiftBackCalculator {
    own_terms: [Vec<[f64; 8]>; NUM_CHANNELS],
    neighbors: [[NeighborTensor; 3]; NUM_CHANNELS],
}

impl ShiftBackCalculator {
    /// `residues` holds coefficient-table amino-acid indices.
    pub fn new(table: &CoefficientTable, residues: &[usize]) -> Self {
        let n = residues.len();
        let pad = table.padding_index();
        let mut own_terms = [vec![[0.0; 8]; n], vec![[0.0; 8]; n]];

        for (ch, coeffs) in table.channels.iter().enumerate() {
            for i in 0..n {
                let mut context = [0.0; 3];
                for (c, ctx) in context.iter_mut().enumerate() {
                    for row in 0..WINDOW_ROWS {
                        let pos = i as isize + row as isize - NEIGHBOR_SPAN as isize;
                        let aa = if pos < 0 || pos as usize >= n {
                            pad
                        } else {
                            residues[pos as usize]
                        };
                        *ctx += coeffs.context[c][row][aa];
                    }
                }
                for label in Ss8::iter() {
                    own_terms[ch][i][label.index()] =
                        context[label.class().index()] + coeffs.baselines[label.index()];
                }
            }
        }

        Self {
            own_terms,
            neighbors: [table.channels[0].neighbors, table.channels[1].neighbors],
        }
    }

    pub fn len(&self) -> usize {
        self.own_terms[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.own_terms[0].is_empty()
    }

    #[inline(always)]
    pub fn own_term(&self, ch: usize, n: usize, label: Ss8) -> f64 {
        self.own_terms[ch][n][label.index()]
    }

    pub fn neighbor_tensor(&self, ch: usize, class: Ss3) -> &NeighborTensor {
        &self.neighbors[ch][class.index()]
    }

    pub fn column(&self, ch: usize, n: usize, labels: &LabelView) -> Column {
        let own = labels.get(n as isize);
        let tensor = &self.neighbors[ch][own.class().index()];
        let mut col = [0.0; WINDOW_ROWS];
        col[OWN_ROW] = self.own_terms[ch][n][own.index()];
        for d in 1..=NEIGHBOR_SPAN {
            let left = labels.get(n as isize - d as isize);
            let right = labels.get(n as isize + d as isize);
            col[OWN_ROW - d] = tensor[0][d - 1][left.index()];
            col[OWN_ROW + d] = tensor[1][d - 1][right.index()];
        }
        col
    }

    pub fn columns(&self, ch: usize, lo: usize, hi: usize, labels: &LabelView) -> Vec<Column> {
        (lo..hi).map(|n| self.column(ch, n, labels)).collect()
    }

    pub fn table(&self, ch: usize, labels: &[Ss8]) -> ContributionTable {
        let view = LabelView::committed(labels);
        ContributionTable {
            columns: self.columns(ch, 0, labels.len(), &view),
        }
    }

    pub fn tables(&self, labels: &[Ss8]) -> [ContributionTable; NUM_CHANNELS] {
        [self.table(0, labels), self.table(1, labels)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::parse_ss8;

    fn calculator(seq: &str) -> ShiftBackCalculator {
        let table = CoefficientTable::embedded().unwrap();
        let residues: Vec<usize> = seq.bytes().map(|b| table.aa_index(b).unwrap()).collect();
        ShiftBackCalculator::new(&table, &residues)
    }

    #[test]
    fn test_view_pads_with_loop_and_reads_edit() {
        let base = parse_ss8("HHHH").unwrap();
        let edit = parse_ss8("EE").unwrap();
        let view = LabelView::proposed(&base, 1, &edit);
        assert_eq!(view.get(-1), Ss8::Loop);
        assert_eq!(view.get(0), Ss8::AlphaHelix);
        assert_eq!(view.get(2), Ss8::Strand);
        assert_eq!(view.get(3), Ss8::AlphaHelix);
        assert_eq!(view.get(4), Ss8::Loop);
    }

    #[test]
    fn test_column_sum_is_prediction() {
        let calc = calculator("MKVLAAGIE");
        let labels = parse_ss8("--HHHHH--").unwrap();
        let table = calc.table(0, &labels);
        let col = table.column(4);
        assert_eq!(col[OWN_ROW], calc.own_term(0, 4, Ss8::AlphaHelix));
        let tensor = calc.neighbor_tensor(0, Ss3::Helix);
        assert_eq!(col[OWN_ROW - 2], tensor[0][1][Ss8::AlphaHelix.index()]);
        assert_eq!(col[OWN_ROW - 3], tensor[0][2][Ss8::Loop.index()]);
        assert_eq!(col[OWN_ROW + 4], tensor[1][3][Ss8::Loop.index()]);
        assert!((table.predicted(4) - col.iter().sum::<f64>()).abs() < 1e-12);
    }

    #[test]
    fn test_edit_changes_only_window() {
        let calc = calculator("MKVLAAGIEKLLRSA");
        let before = parse_ss8("---------------").unwrap();
        let mut after = before.clone();
        after[7] = Ss8::Strand;
        let t0 = calc.table(1, &before);
        let t1 = calc.table(1, &after);
        assert_ne!(t0.column(7), t1.column(7));
        for n in (0..3).chain(12..before.len()) {
            assert_eq!(t0.column(n), t1.column(n), "residue {} outside the window moved", n);
        }
    }
}
