/// Residues on each side whose labels feed a residue's predicted value.
pub const NEIGHBOR_SPAN: usize = 4;

/// Rows of a contribution column: 4 left neighbors, own term, 4 right neighbors.
pub const WINDOW_ROWS: usize = 2 * NEIGHBOR_SPAN + 1;

/// Row holding the residue's own context term.
pub const OWN_ROW: usize = NEIGHBOR_SPAN;

/// Number of shift-projection channels (PC1, PC2).
pub const NUM_CHANNELS: usize = 2;

/// Shortest sequence accepted for prediction.
pub const MIN_SEQUENCE_LEN: usize = 5;

/// Minimum helix length enforced by repair and by split.
pub const DEFAULT_MIN_HELIX: usize = 3;

/// Minimum strand length.
pub const DEFAULT_MIN_STRAND: usize = 2;

/// Helix minimum used when shrinking or deleting a helix.
/// Larger than `DEFAULT_MIN_HELIX`.
pub const DEFAULT_MIN_HELIX_SHRINK: usize = 4;

/// Elements longer than `min + DELETE_SLACK` are never deleted outright.
pub const DELETE_SLACK: usize = 2;

/// Priors are floored before taking logs.
pub const PRIOR_FLOOR: f64 = 1e-12;

/// Residues with a quality z-score under this are treated as disordered.
pub const DEFAULT_DISORDER_THRESHOLD: f64 = 8.0;

/// Global widening applied to the per-label sigma table.
pub const DEFAULT_SIGMA_SCALE: f64 = 1.1;

/// Gaussian widths per channel and 8-class label (HGIE-TSB order), unscaled.
pub const CHANNEL_SIGMAS: [[f64; 8]; 2] = [
    [2.110, 2.858, 3.897, 3.663, 3.116, 2.980, 2.932, 3.876],
    [3.071, 3.947, 3.337, 3.490, 3.344, 3.670, 3.532, 3.886],
];

/// Prior column for a disordered residue (HGIE-TSB order).
pub const DISORDER_PRIOR: [f64; 8] = [0.0, 0.0, 0.0, 0.05, 0.8, 0.0, 0.2, 0.0];

/// Mean-field label weights inside a helix (H, G, I).
pub const HELIX_MIX: [f64; 3] = [0.8896, 0.1104, 0.0001];

/// Mean-field label weights inside coil (-, T, S, B).
pub const COIL_MIX: [f64; 4] = [0.5621, 0.2402, 0.1736, 0.0241];

/// Operator weights: coil-point, grow, shrink, split, delete, helix->3-10, coil->3-10.
pub const OPERATOR_WEIGHTS: [f64; 7] = [0.30, 0.20, 0.20, 0.05, 0.05, 0.12, 0.08];

/// Coil relabel weights (-, T, S, B) for a coil-point mutation.
pub const COIL_POINT_MIX: [f64; 4] = [0.4, 0.2, 0.3, 0.1];

/// Coil relabel weights (-, T, S) next to a strand; bridges are excluded.
pub const COIL_POINT_MIX_NEAR_STRAND: [f64; 3] = [0.4, 0.3, 0.3];

/// Mutation re-draws before a proposer gives up for this cycle.
pub const MAX_PROPOSAL_DRAWS: usize = 64;

/// Amino-acid composition prior (HGIE-TSB order).
pub const COMPOSITION_PRIOR: [(u8, [f64; 8]); 20] = [
    (b'G', [0.14211, 0.03448, 0.00052, 0.14263, 0.20585, 0.27795, 0.18652, 0.00993]),
    (b'P', [0.15732, 0.05774, 0.0, 0.09958, 0.40084, 0.17908, 0.09289, 0.01255]),
    (b'C', [0.21405, 0.04682, 0.0, 0.32441, 0.23077, 0.09699, 0.07358, 0.01338]),
    (b'T', [0.23194, 0.03681, 0.00069, 0.29375, 0.22986, 0.10208, 0.08958, 0.01528]),
    (b'N', [0.22014, 0.04991, 0.0, 0.14973, 0.25312, 0.19608, 0.11854, 0.01248]),
    (b'S', [0.24804, 0.06414, 0.0, 0.21270, 0.23495, 0.12173, 0.10471, 0.01374]),
    (b'V', [0.27904, 0.01946, 0.0, 0.44024, 0.14508, 0.05447, 0.04780, 0.01390]),
    (b'W', [0.36533, 0.06667, 0.0, 0.26933, 0.13600, 0.08800, 0.05333, 0.02133]),
    (b'F', [0.33894, 0.04248, 0.0, 0.30442, 0.16372, 0.07080, 0.06814, 0.01150]),
    (b'H', [0.30162, 0.05206, 0.0, 0.20826, 0.20287, 0.13824, 0.07899, 0.01795]),
    (b'D', [0.27330, 0.06214, 0.00063, 0.11921, 0.25618, 0.15916, 0.11921, 0.01015]),
    (b'Y', [0.33054, 0.03975, 0.00105, 0.30439, 0.14644, 0.09205, 0.06485, 0.02092]),
    (b'I', [0.32101, 0.02190, 0.0, 0.38672, 0.15674, 0.04517, 0.05270, 0.01574]),
    (b'M', [0.42247, 0.02472, 0.0, 0.26292, 0.16629, 0.05393, 0.06067, 0.00899]),
    (b'L', [0.41264, 0.03732, 0.0, 0.26463, 0.15098, 0.06616, 0.05683, 0.01145]),
    (b'K', [0.38018, 0.04684, 0.0, 0.17108, 0.15954, 0.14460, 0.08622, 0.01154]),
    (b'R', [0.38118, 0.04386, 0.0, 0.21850, 0.16268, 0.09888, 0.08134, 0.01356]),
    (b'Q', [0.44944, 0.04831, 0.0, 0.15843, 0.16180, 0.09438, 0.07528, 0.01236]),
    (b'A', [0.47164, 0.04645, 0.0, 0.18669, 0.13444, 0.09335, 0.06163, 0.00581]),
    (b'E', [0.44922, 0.05857, 0.00062, 0.15016, 0.14081, 0.11776, 0.07726, 0.00561]),
];

/// Coil relabel weights (-, T, S, B) for the residue a shrink frees,
/// indexed by the shrinking element (helix, strand).
pub const SHRINK_COIL_MIX: [[f64; 4]; 2] = [[0.5, 0.27, 0.2, 0.03], [0.65, 0.15, 0.2, 0.0]];

/// Coil relabel weights for the residue a split inserts.
pub const SPLIT_COIL_MIX: [[f64; 4]; 2] = [[0.27, 0.5, 0.2, 0.03], [0.65, 0.15, 0.2, 0.0]];

/// Coil relabel weights for residues of a deleted element.
pub const DELETE_COIL_MIX: [[f64; 4]; 2] = [[0.5, 0.27, 0.2, 0.03], [0.5, 0.15, 0.2, 0.15]];

/// Helices up to this length are converted to 3-10 as a whole.
pub const WHOLE_HELIX_THREE_TEN_MAX: usize = 4;

/// Lengths of a terminal 3-10 overwrite are drawn from
/// `[3, min(len, 4), min(len, 5)]` with these weights.
pub const THREE_TEN_LENGTH_MIX: [f64; 3] = [0.6, 0.3, 0.1];

/// Residues in a coil-to-3-10 overwrite.
pub const COIL_THREE_TEN_LEN: usize = 3;

/// Chance per residue that two-parent crossover switches parent.
pub const CROSSOVER_SWITCH_PROB: f64 = 0.2;

/// Probability that the repairer deletes (rather than extends) a short
/// element, by class and length.
pub const REPAIR_DELETE_PROB_SINGLE: f64 = 0.6;
pub const REPAIR_DELETE_PROB_LONGER: f64 = 0.1;

/// Coil fill for repair deletions in `-TSB` order: single-residue helix,
/// longer helix, strand.
pub const REPAIR_COIL_MIX: [[f64; 4]; 3] = [
    [0.3, 0.45, 0.2, 0.05],
    [0.2, 0.65, 0.1, 0.05],
    [0.4, 0.15, 0.2, 0.25],
];

/// Length a short 3-10 run is promoted to.
pub const MIN_THREE_TEN: usize = 3;
