use super::pick_weighted;
use super::segments::{Segment, SegmentIndex, Side};
use crate::config::ElementRules;
use crate::consts::*;
use crate::error::ChespiResult;
use crate::labels::{Ss3, Ss8, COIL_LABELS};
use fastrand::Rng;
use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
pub enum MutationKind {
    CoilPoint,
    Grow,
    Shrink,
    Split,
    DeleteElement,
    HelixToThreeTen,
    CoilToThreeTen,
}

impl MutationKind {
    pub const ALL: [MutationKind; 7] = [
        MutationKind::CoilPoint,
        MutationKind::Grow,
        MutationKind::Shrink,
        MutationKind::Split,
        MutationKind::DeleteElement,
        MutationKind::HelixToThreeTen,
        MutationKind::CoilToThreeTen,
    ];
}

/// A proposed local edit. Carries what the commit step needs; proposing
/// never touches the index.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Coil-to-coil relabel of one residue.
    CoilPoint { pos: usize, label: Ss8 },
    /// Element starting at `anchor` takes over `pos` on `side`.
    Grow {
        anchor: usize,
        class: Ss3,
        side: Side,
        pos: usize,
        label: Ss8,
    },
    /// Element starting at `anchor` gives up its boundary residue `pos`.
    Shrink {
        anchor: usize,
        class: Ss3,
        side: Side,
        pos: usize,
        label: Ss8,
    },
    /// One coil residue inserted inside a long element.
    Split { pos: usize, label: Ss8 },
    /// Whole element starting at `start` replaced by coil.
    DeleteElement {
        start: usize,
        class: Ss3,
        labels: Vec<Ss8>,
    },
    HelixToThreeTen { start: usize, len: usize },
    CoilToThreeTen { start: usize },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::CoilPoint { .. } => MutationKind::CoilPoint,
            Mutation::Grow { .. } => MutationKind::Grow,
            Mutation::Shrink { .. } => MutationKind::Shrink,
            Mutation::Split { .. } => MutationKind::Split,
            Mutation::DeleteElement { .. } => MutationKind::DeleteElement,
            Mutation::HelixToThreeTen { .. } => MutationKind::HelixToThreeTen,
            Mutation::CoilToThreeTen { .. } => MutationKind::CoilToThreeTen,
        }
    }

    /// First residue of the edited span and its proposed labels.
    pub fn edit(&self) -> (usize, Vec<Ss8>) {
        match self {
            Mutation::CoilPoint { pos, label }
            | Mutation::Grow { pos, label, .. }
            | Mutation::Shrink { pos, label, .. }
            | Mutation::Split { pos, label } => (*pos, vec![*label]),
            Mutation::DeleteElement { start, labels, .. } => (*start, labels.clone()),
            Mutation::HelixToThreeTen { start, len } => (*start, vec![Ss8::ThreeTen; *len]),
            Mutation::CoilToThreeTen { start } => {
                (*start, vec![Ss8::ThreeTen; COIL_THREE_TEN_LEN])
            }
        }
    }

    /// Commits the edit: the structural primitive matching the kind first,
    /// then the proposed 8-class labels.
    pub fn apply(&self, index: &mut SegmentIndex) -> ChespiResult<()> {
        match self {
            Mutation::CoilPoint { .. } | Mutation::HelixToThreeTen { .. } => {}
            Mutation::Grow {
                anchor,
                class,
                side,
                ..
            } => index.increment(*anchor, *class, side.delta())?,
            Mutation::Shrink {
                anchor, side, label, ..
            } => index.decrement(*anchor, label.class(), side.delta())?,
            Mutation::Split { pos, .. } => index.modify_at(*pos, Ss3::Coil)?,
            Mutation::DeleteElement { start, class, .. } => {
                index.delete(*start, *class, Ss3::Coil)?
            }
            Mutation::CoilToThreeTen { start } => {
                index.relabel_span(*start, COIL_THREE_TEN_LEN, Ss3::Helix)?
            }
        }

        let (start, labels) = self.edit();
        for (k, label) in labels.into_iter().enumerate() {
            index.set_label(start + k, label)?;
        }
        debug_assert!(index.validate().is_ok(), "{:?}", index.validate().err());
        Ok(())
    }
}

/// Draws one of the seven local edits.
#[derive(Debug, Clone, Copy)]
pub struct MutationProposer {
    rules: ElementRules,
}

impl MutationProposer {
    pub fn new(rules: ElementRules) -> Self {
        Self { rules }
    }

    /// Draws operators by `OPERATOR_WEIGHTS` until one applies. `None` when
    /// nothing applied after `MAX_PROPOSAL_DRAWS` draws.
    pub fn propose(&self, index: &SegmentIndex, rng: &mut Rng) -> Option<Mutation> {
        for _ in 0..MAX_PROPOSAL_DRAWS {
            let kind = MutationKind::ALL[pick_weighted(rng, &OPERATOR_WEIGHTS)?];
            if let Some(m) = self.propose_kind(kind, index, rng) {
                return Some(m);
            }
        }
        None
    }

    pub fn propose_kind(
        &self,
        kind: MutationKind,
        index: &SegmentIndex,
        rng: &mut Rng,
    ) -> Option<Mutation> {
        match kind {
            MutationKind::CoilPoint => self.coil_point(index, rng),
            MutationKind::Grow => self.grow(index, rng),
            MutationKind::Shrink => self.shrink(index, rng),
            MutationKind::Split => self.split(index, rng),
            MutationKind::DeleteElement => self.delete_element(index, rng),
            MutationKind::HelixToThreeTen => self.helix_to_three_ten(index, rng),
            MutationKind::CoilToThreeTen => self.coil_to_three_ten(index, rng),
        }
    }

    fn shrink_min(&self, class: Ss3) -> usize {
        match class {
            Ss3::Helix => self.rules.min_helix_shrink,
            _ => self.rules.min_strand,
        }
    }

    fn split_min(&self, class: Ss3) -> usize {
        match class {
            Ss3::Helix => self.rules.min_helix,
            _ => self.rules.min_strand,
        }
    }

    pub fn coil_point(&self, index: &SegmentIndex, rng: &mut Rng) -> Option<Mutation> {
        let seg = random_segment(&index.segments_of(Ss3::Coil).collect::<Vec<_>>(), rng)?;
        let pos = seg.start + rng.usize(..seg.len);
        let current = index.label(pos);

        let near_strand = (pos > 0 && index.label(pos - 1) == Ss8::Strand)
            || (pos + 1 < index.len() && index.label(pos + 1) == Ss8::Strand);
        let weights: &[f64] = if near_strand {
            &COIL_POINT_MIX_NEAR_STRAND
        } else {
            &COIL_POINT_MIX
        };

        // Same distribution as redrawing until the label changes.
        let mut masked = [0.0; 4];
        for (i, w) in weights.iter().enumerate() {
            if COIL_LABELS[i] != current {
                masked[i] = *w;
            }
        }
        let label = COIL_LABELS[pick_weighted(rng, &masked)?];
        Some(Mutation::CoilPoint { pos, label })
    }

    pub fn grow(&self, index: &SegmentIndex, rng: &mut Rng) -> Option<Mutation> {
        let class = choose_class(index, rng, |_| true)?;
        let seg = random_segment(&index.segments_of(class).collect::<Vec<_>>(), rng)?;
        let n = index.len();

        let side = match (seg.start == 0, seg.end() == n) {
            (true, true) => return None,
            (true, false) => Side::Right,
            (false, true) => Side::Left,
            (false, false) => Side::random(rng),
        };
        let (pos, label) = match side {
            Side::Right => (seg.end(), index.label(seg.last())),
            Side::Left => (seg.start - 1, index.label(seg.start)),
        };
        Some(Mutation::Grow {
            anchor: seg.start,
            class,
            side,
            pos,
            label,
        })
    }

    /// Only elements at or above the shrink minimum of their class qualify.
    pub fn shrink(&self, index: &SegmentIndex, rng: &mut Rng) -> Option<Mutation> {
        let eligible = |s: Segment| s.len >= self.shrink_min(s.class);
        let class = choose_class(index, rng, eligible)?;
        let candidates: Vec<Segment> = index.segments_of(class).filter(|s| eligible(*s)).collect();
        let seg = random_segment(&candidates, rng)?;

        let side = Side::random(rng);
        let (pos, beyond) = match side {
            Side::Right => (seg.last(), Some(seg.end()).filter(|&b| b < index.len())),
            Side::Left => (seg.start, seg.start.checked_sub(1)),
        };
        let label = match beyond {
            Some(b) if index.class(b) != Ss3::Coil => index.label(b),
            _ => sample_coil(rng, &SHRINK_COIL_MIX[mix_row(class)])?,
        };
        Some(Mutation::Shrink {
            anchor: seg.start,
            class,
            side,
            pos,
            label,
        })
    }

    pub fn split(&self, index: &SegmentIndex, rng: &mut Rng) -> Option<Mutation> {
        let eligible = |s: Segment| s.len > 2 * self.split_min(s.class);
        let class = choose_class(index, rng, eligible)?;
        let min = self.split_min(class);
        let candidates: Vec<Segment> = index.segments_of(class).filter(|s| eligible(*s)).collect();
        let seg = random_segment(&candidates, rng)?;

        let pos = seg.start + min + rng.usize(..seg.len - 2 * min);
        let label = sample_coil(rng, &SPLIT_COIL_MIX[mix_row(class)])?;
        Some(Mutation::Split { pos, label })
    }

    /// Only the shortest element of the drawn class is a target, and only
    /// when it is within `DELETE_SLACK` of the class minimum.
    pub fn delete_element(&self, index: &SegmentIndex, rng: &mut Rng) -> Option<Mutation> {
        let class = choose_class(index, rng, |_| true)?;
        let seg = index.segments_of(class).min_by_key(|s| s.len)?;
        if seg.len > self.shrink_min(class) + DELETE_SLACK {
            return None;
        }
        let mix = &DELETE_COIL_MIX[mix_row(class)];
        let labels = (0..seg.len)
            .map(|_| sample_coil(rng, mix))
            .collect::<Option<Vec<_>>>()?;
        Some(Mutation::DeleteElement {
            start: seg.start,
            class,
            labels,
        })
    }

    pub fn helix_to_three_ten(&self, index: &SegmentIndex, rng: &mut Rng) -> Option<Mutation> {
        let helices: Vec<Segment> = index.segments_of(Ss3::Helix).collect();
        let shortest = helices.iter().map(|s| s.len).min()?;

        let (start, len) = if shortest > WHOLE_HELIX_THREE_TEN_MAX {
            let seg = random_segment(&helices, rng)?;
            let lengths = [3, seg.len.min(4), seg.len.min(5)];
            let len = lengths[pick_weighted(rng, &THREE_TEN_LENGTH_MIX)?];
            match Side::random(rng) {
                Side::Left => (seg.start, len),
                Side::Right => (seg.end() - len, len),
            }
        } else {
            let short: Vec<Segment> = helices
                .into_iter()
                .filter(|s| s.len <= WHOLE_HELIX_THREE_TEN_MAX)
                .collect();
            let seg = random_segment(&short, rng)?;
            (seg.start, seg.len)
        };

        let has_alpha = index.labels()[start..start + len]
            .iter()
            .any(|l| *l == Ss8::AlphaHelix);
        has_alpha.then_some(Mutation::HelixToThreeTen { start, len })
    }

    pub fn coil_to_three_ten(&self, index: &SegmentIndex, rng: &mut Rng) -> Option<Mutation> {
        let coils: Vec<Segment> = index
            .segments_of(Ss3::Coil)
            .filter(|s| s.len >= COIL_THREE_TEN_LEN)
            .collect();
        let seg = random_segment(&coils, rng)?;
        let start = seg.start + rng.usize(..=seg.len - COIL_THREE_TEN_LEN);
        Some(Mutation::CoilToThreeTen { start })
    }
}

fn random_segment(segments: &[Segment], rng: &mut Rng) -> Option<Segment> {
    if segments.is_empty() {
        return None;
    }
    Some(segments[rng.usize(..segments.len())])
}

/// Picks helix or strand among the classes with at least one eligible
/// element, uniformly when both qualify.
fn choose_class<F: Fn(Segment) -> bool>(
    index: &SegmentIndex,
    rng: &mut Rng,
    eligible: F,
) -> Option<Ss3> {
    let has = |class: Ss3| index.segments_of(class).any(&eligible);
    match (has(Ss3::Helix), has(Ss3::Strand)) {
        (true, true) => Some(if rng.bool() { Ss3::Helix } else { Ss3::Strand }),
        (true, false) => Some(Ss3::Helix),
        (false, true) => Some(Ss3::Strand),
        (false, false) => None,
    }
}

fn mix_row(class: Ss3) -> usize {
    match class {
        Ss3::Helix => 0,
        _ => 1,
    }
}

fn sample_coil(rng: &mut Rng, weights: &[f64; 4]) -> Option<Ss8> {
    pick_weighted(rng, weights).map(|i| COIL_LABELS[i])
}
