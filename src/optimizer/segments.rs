use crate::error::{ChespiError, ChespiResult};
use crate::labels::{Ss3, Ss8};

/// A maximal run of one 3-class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub class: Ss3,
    pub start: usize,
    pub len: usize,
}

impl Segment {
    #[inline(always)]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    #[inline(always)]
    pub fn last(&self) -> usize {
        self.start + self.len - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn delta(self) -> isize {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }

    pub fn random(rng: &mut fastrand::Rng) -> Side {
        if rng.bool() {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Run-length index over a label assignment.
///
/// Holds the 8-class labels, their 3-class image, an ordered arena of
/// segments tiling `[0, n)` and a position -> segment-ordinal array. The
/// ordinal array is the only lookup path; it is renumbered when a structural
/// edit splices the arena.
#[derive(Debug, Clone)]
pub struct SegmentIndex {
    labels: Vec<Ss8>,
    classes: Vec<Ss3>,
    segments: Vec<Segment>,
    owner: Vec<usize>,
}

impl SegmentIndex {
    pub fn from_labels(labels: Vec<Ss8>) -> Self {
        let classes: Vec<Ss3> = labels.iter().map(|l| l.class()).collect();
        let mut index = Self {
            labels,
            classes,
            segments: Vec::new(),
            owner: Vec::new(),
        };
        index.rebuild();
        index
    }

    /// Builds from a bare 3-class sequence, filling each residue with the
    /// class's canonical 8-class label.
    pub fn from_classes(classes: &[Ss3]) -> Self {
        Self::from_labels(classes.iter().map(|c| c.canonical_label()).collect())
    }

    fn rebuild(&mut self) {
        self.segments.clear();
        self.owner = vec![0; self.classes.len()];
        let mut s = 0;
        while s < self.classes.len() {
            let class = self.classes[s];
            let mut e = s + 1;
            while e < self.classes.len() && self.classes[e] == class {
                e += 1;
            }
            let ordinal = self.segments.len();
            self.owner[s..e].fill(ordinal);
            self.segments.push(Segment {
                class,
                start: s,
                len: e - s,
            });
            s = e;
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[Ss8] {
        &self.labels
    }

    pub fn classes(&self) -> &[Ss3] {
        &self.classes
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline(always)]
    pub fn label(&self, pos: usize) -> Ss8 {
        self.labels[pos]
    }

    #[inline(always)]
    pub fn class(&self, pos: usize) -> Ss3 {
        self.classes[pos]
    }

    #[inline(always)]
    pub fn owner_of(&self, pos: usize) -> usize {
        self.owner[pos]
    }

    #[inline(always)]
    pub fn segment_at(&self, pos: usize) -> Segment {
        self.segments[self.owner[pos]]
    }

    pub fn segments_of(&self, class: Ss3) -> impl Iterator<Item = Segment> + '_ {
        self.segments.iter().copied().filter(move |s| s.class == class)
    }

    /// Segment following the one with `ordinal`, if any.
    pub fn next_segment(&self, ordinal: usize) -> Option<Segment> {
        self.segments.get(ordinal + 1).copied()
    }

    pub fn prev_segment(&self, ordinal: usize) -> Option<Segment> {
        ordinal.checked_sub(1).map(|o| self.segments[o])
    }

    fn check_pos(&self, pos: usize, op: &str) -> ChespiResult<()> {
        if pos >= self.len() {
            return Err(ChespiError::Structural(format!(
                "{} at position {} outside sequence of length {}",
                op,
                pos,
                self.len()
            )));
        }
        Ok(())
    }

    /// Writes an 8-class label without changing its 3-class image.
    pub fn set_label(&mut self, pos: usize, label: Ss8) -> ChespiResult<()> {
        self.check_pos(pos, "set_label")?;
        if label.class() != self.classes[pos] {
            return Err(ChespiError::Structural(format!(
                "point write of '{}' at {} would change class {}",
                label, pos, self.classes[pos]
            )));
        }
        self.labels[pos] = label;
        Ok(())
    }

    /// Extends the segment owning `pos` by `|delta|` residues on the side
    /// given by the sign of `delta`, converting them to `class`. An adjacent
    /// segment that would be consumed entirely is relabelled as a whole and
    /// merges with whatever lies beyond it. Extending past a terminus is a
    /// no-op.
    pub fn increment(&mut self, pos: usize, class: Ss3, delta: isize) -> ChespiResult<()> {
        self.check_pos(pos, "increment")?;
        let step = delta.unsigned_abs();
        if step == 0 {
            return Ok(());
        }
        let seg = self.segment_at(pos);
        let (lo, hi) = if delta > 0 {
            if seg.end() >= self.len() {
                return Ok(());
            }
            let next = self.segment_at(seg.end());
            if next.len <= step {
                (next.start, next.end())
            } else {
                (seg.end(), seg.end() + step)
            }
        } else {
            if seg.start == 0 {
                return Ok(());
            }
            let prev = self.segment_at(seg.start - 1);
            if prev.len <= step {
                (prev.start, prev.end())
            } else {
                (seg.start - step, seg.start)
            }
        };
        self.assign(lo, hi, class);
        self.resegment(lo, hi);
        Ok(())
    }

    /// Shrinks the segment owning `pos` by `|delta|` residues on the side
    /// given by the sign of `delta`; the freed residues take `class`, either
    /// joining the neighbor or forming a new boundary segment at a terminus.
    pub fn decrement(&mut self, pos: usize, class: Ss3, delta: isize) -> ChespiResult<()> {
        self.check_pos(pos, "decrement")?;
        let step = delta.unsigned_abs();
        if step == 0 {
            return Ok(());
        }
        let seg = self.segment_at(pos);
        let step = step.min(seg.len);
        let (lo, hi) = if delta > 0 {
            (seg.end() - step, seg.end())
        } else {
            (seg.start, seg.start + step)
        };
        self.assign(lo, hi, class);
        self.resegment(lo, hi);
        Ok(())
    }

    /// Relabels the whole segment owning `pos`, merging with matching
    /// neighbors on either side.
    pub fn delete(&mut self, pos: usize, from: Ss3, to: Ss3) -> ChespiResult<()> {
        self.check_pos(pos, "delete")?;
        let seg = self.segment_at(pos);
        if seg.class != from {
            return Err(ChespiError::Structural(format!(
                "delete expected a {} segment at {}, found {}",
                from, pos, seg.class
            )));
        }
        self.assign(seg.start, seg.end(), to);
        self.resegment(seg.start, seg.end());
        Ok(())
    }

    /// Relabels one residue, splitting its segment or joining a neighbor.
    pub fn modify_at(&mut self, pos: usize, to: Ss3) -> ChespiResult<()> {
        self.relabel_span(pos, 1, to)
    }

    /// Relabels `[start, start + len)` as one edit.
    pub fn relabel_span(&mut self, start: usize, len: usize, to: Ss3) -> ChespiResult<()> {
        if len == 0 {
            return Ok(());
        }
        self.check_pos(start + len - 1, "relabel_span")?;
        self.assign(start, start + len, to);
        self.resegment(start, start + len);
        Ok(())
    }

    fn assign(&mut self, lo: usize, hi: usize, class: Ss3) {
        for p in lo..hi {
            self.classes[p] = class;
            if self.labels[p].class() != class {
                self.labels[p] = class.canonical_label();
            }
        }
    }

    /// Re-runs the segmentation over the segments touching `[lo, hi)` and
    /// their immediate neighbors, splices the arena and shifts the ordinals
    /// of everything downstream.
    fn resegment(&mut self, lo: usize, hi: usize) {
        let n = self.len();
        if n == 0 || lo >= hi {
            return;
        }
        let first = self.owner[lo.saturating_sub(1)];
        let last = self.owner[hi.min(n - 1)];
        let span_start = self.segments[first].start;
        let span_end = self.segments[last].end();

        let mut runs = Vec::with_capacity(last - first + 3);
        let mut s = span_start;
        while s < span_end {
            let class = self.classes[s];
            let mut e = s + 1;
            while e < span_end && self.classes[e] == class {
                e += 1;
            }
            runs.push(Segment {
                class,
                start: s,
                len: e - s,
            });
            s = e;
        }

        let removed = last - first + 1;
        let added = runs.len();
        self.segments.splice(first..=last, runs);

        for ordinal in first..first + added {
            let seg = self.segments[ordinal];
            self.owner[seg.start..seg.end()].fill(ordinal);
        }
        if added != removed {
            for o in &mut self.owner[span_end..] {
                *o = *o + added - removed;
            }
        }

        debug_assert!(
            self.check_tiling().is_ok(),
            "{:?}",
            self.check_tiling().err()
        );
    }

    fn check_tiling(&self) -> ChespiResult<()> {
        let mut expected_start = 0;
        for (i, seg) in self.segments.iter().enumerate() {
            if seg.len == 0 {
                return Err(ChespiError::Structural(format!("segment {} is empty", i)));
            }
            if seg.start != expected_start {
                return Err(ChespiError::Structural(format!(
                    "segment {} starts at {} but previous ended at {}",
                    i, seg.start, expected_start
                )));
            }
            if i > 0 && self.segments[i - 1].class == seg.class {
                return Err(ChespiError::Structural(format!(
                    "segments {} and {} share class {}",
                    i - 1,
                    i,
                    seg.class
                )));
            }
            expected_start = seg.end();
        }
        if expected_start != self.len() {
            return Err(ChespiError::Structural(format!(
                "segments cover {} of {} residues",
                expected_start,
                self.len()
            )));
        }
        Ok(())
    }

    /// Cross-checks the stored 3-class sequence against the segment arena,
    /// the ordinal array and the 8-class collapse.
    pub fn validate(&self) -> ChespiResult<()> {
        self.check_tiling()?;

        let mut from_segments = Vec::with_capacity(self.len());
        for seg in &self.segments {
            from_segments.extend(std::iter::repeat(seg.class).take(seg.len));
        }

        for p in 0..self.len() {
            let seg = self.segments.get(self.owner[p]).ok_or_else(|| {
                ChespiError::Structural(format!("position {} points at a missing segment", p))
            })?;
            if p < seg.start || p >= seg.end() {
                return Err(ChespiError::Structural(format!(
                    "position {} owned by segment {}..{}",
                    p,
                    seg.start,
                    seg.end()
                )));
            }
            let collapsed = self.labels[p].class();
            if from_segments[p] != self.classes[p]
                || seg.class != self.classes[p]
                || collapsed != self.classes[p]
            {
                return Err(ChespiError::Structural(format!(
                    "representations disagree at {}: stored {}, arena {}, owner {}, labels {}",
                    p, self.classes[p], from_segments[p], seg.class, collapsed
                )));
            }
        }
        Ok(())
    }
}
