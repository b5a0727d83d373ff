use super::pick_weighted;
use super::segments::{Segment, SegmentIndex, Side};
use crate::config::ElementRules;
use crate::consts::*;
use crate::error::{ChespiError, ChespiResult};
use crate::labels::{Ss3, Ss8, COIL_LABELS};
use fastrand::Rng;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    ShortHelix(Segment),
    ShortStrand(Segment),
    /// A 1-2 residue 3-10 run `[start, start + len)` inside `helix`.
    ShortThreeTen {
        helix: Segment,
        start: usize,
        len: usize,
    },
}

/// Drives a segment index to a state with no short helices, short strands
/// or stray 3-10 fragments.
#[derive(Debug, Clone, Copy)]
pub struct ValidityRepairer {
    rules: ElementRules,
    max_iterations: usize,
}

impl ValidityRepairer {
    pub fn new(rules: ElementRules, max_iterations: usize) -> Self {
        Self {
            rules,
            max_iterations,
        }
    }

    /// Scans short helices, then short strands, then short 3-10 runs.
    pub fn find_first_violation(&self, index: &SegmentIndex) -> Option<Violation> {
        if let Some(seg) = index
            .segments_of(Ss3::Helix)
            .find(|s| s.len < self.rules.min_helix)
        {
            return Some(Violation::ShortHelix(seg));
        }
        if let Some(seg) = index
            .segments_of(Ss3::Strand)
            .find(|s| s.len < self.rules.min_strand)
        {
            return Some(Violation::ShortStrand(seg));
        }
        for helix in index.segments_of(Ss3::Helix) {
            let mut p = helix.start;
            while p < helix.end() {
                if index.label(p) != Ss8::ThreeTen {
                    p += 1;
                    continue;
                }
                let start = p;
                while p < helix.end() && index.label(p) == Ss8::ThreeTen {
                    p += 1;
                }
                let len = p - start;
                if len < MIN_THREE_TEN && len < helix.len {
                    return Some(Violation::ShortThreeTen { helix, start, len });
                }
            }
        }
        None
    }

    /// Repairs until no violation remains; returns the number of repairs.
    pub fn repair(&self, index: &mut SegmentIndex, rng: &mut Rng) -> ChespiResult<usize> {
        let mut iterations = 0;
        while let Some(violation) = self.find_first_violation(index) {
            if iterations >= self.max_iterations {
                return Err(ChespiError::RepairDiverged { iterations });
            }
            trace!("repair {}: {:?}", iterations, violation);
            match violation {
                Violation::ShortHelix(seg) | Violation::ShortStrand(seg) => {
                    self.fix_short_element(index, seg, rng)?
                }
                Violation::ShortThreeTen { helix, start, len } => {
                    fix_three_ten(index, helix, start, len)?
                }
            }
            iterations += 1;
        }
        debug_assert!(index.validate().is_ok(), "{:?}", index.validate().err());
        Ok(iterations)
    }

    fn fix_short_element(
        &self,
        index: &mut SegmentIndex,
        seg: Segment,
        rng: &mut Rng,
    ) -> ChespiResult<()> {
        let (delete_prob, mix) = match (seg.class, seg.len) {
            (Ss3::Helix, 1) => (REPAIR_DELETE_PROB_SINGLE, &REPAIR_COIL_MIX[0]),
            (Ss3::Helix, _) => (REPAIR_DELETE_PROB_LONGER, &REPAIR_COIL_MIX[1]),
            (_, 1) => (REPAIR_DELETE_PROB_SINGLE, &REPAIR_COIL_MIX[2]),
            _ => (REPAIR_DELETE_PROB_LONGER, &REPAIR_COIL_MIX[2]),
        };

        let side = if rng.f64() < delete_prob {
            None
        } else {
            extend_side(index, seg, rng)
        };

        match side {
            Some(side) => index.increment(seg.start, seg.class, side.delta()),
            None => {
                index.delete(seg.start, seg.class, Ss3::Coil)?;
                for p in seg.start..seg.end() {
                    let label = pick_weighted(rng, mix)
                        .map(|i| COIL_LABELS[i])
                        .unwrap_or(Ss8::Loop);
                    index.set_label(p, label)?;
                }
                Ok(())
            }
        }
    }
}

/// Direction to grow a short element: toward the only coil neighbor, away
/// from a terminus, otherwise random. `None` when the element spans the
/// whole sequence.
fn extend_side(index: &SegmentIndex, seg: Segment, rng: &mut Rng) -> Option<Side> {
    let ordinal = index.owner_of(seg.start);
    let prev = index.prev_segment(ordinal);
    let next = index.next_segment(ordinal);
    match (prev, next) {
        (None, None) => None,
        (None, Some(_)) => Some(Side::Right),
        (Some(_), None) => Some(Side::Left),
        (Some(p), Some(n)) => match (p.class == Ss3::Coil, n.class == Ss3::Coil) {
            (true, false) => Some(Side::Left),
            (false, true) => Some(Side::Right),
            _ => Some(Side::random(rng)),
        },
    }
}

/// A whole 3-residue helix becomes `GGG`; a run at either helix end grows
/// to exactly three residues at that end; an interior run is absorbed into
/// the alpha helix.
fn fix_three_ten(
    index: &mut SegmentIndex,
    helix: Segment,
    start: usize,
    len: usize,
) -> ChespiResult<()> {
    let span = if helix.len <= MIN_THREE_TEN {
        Some(helix.start..helix.end())
    } else if start == helix.start {
        Some(helix.start..helix.start + MIN_THREE_TEN)
    } else if start + len == helix.end() {
        Some(helix.end() - MIN_THREE_TEN..helix.end())
    } else {
        None
    };

    match span {
        Some(span) => {
            for p in span {
                index.set_label(p, Ss8::ThreeTen)?;
            }
        }
        None => {
            for p in start..start + len {
                index.set_label(p, Ss8::AlphaHelix)?;
            }
        }
    }
    Ok(())
}
