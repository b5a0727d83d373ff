use chespi::config::ElementRules;
use chespi::labels::{collapse, Ss3, Ss8};
use chespi::optimizer::mutation::MutationProposer;
use chespi::optimizer::repair::ValidityRepairer;
use chespi::optimizer::segments::SegmentIndex;
use chespi::optimizer::{pick_weighted, select_normal};
use fastrand::Rng;
use proptest::prelude::*;

// --- STRATEGIES ---

fn arb_label() -> impl Strategy<Value = Ss8> {
    prop_oneof![
        4 => Just(Ss8::AlphaHelix),
        1 => Just(Ss8::ThreeTen),
        3 => Just(Ss8::Strand),
        4 => Just(Ss8::Loop),
        1 => Just(Ss8::Turn),
        1 => Just(Ss8::Bend),
        1 => Just(Ss8::Bridge),
    ]
}

prop_compose! {
    fn arb_labels()(labels in proptest::collection::vec(arb_label(), 5..80)) -> Vec<Ss8> {
        labels
    }
}

prop_compose! {
    fn arb_rules()(
        min_helix in 2usize..6,
        min_strand in 1usize..4,
        extra in 0usize..3
    ) -> ElementRules {
        ElementRules {
            min_helix,
            min_strand,
            min_helix_shrink: min_helix + extra,
        }
    }
}

fn assert_tiles(index: &SegmentIndex) {
    let mut expected = 0;
    for seg in index.segments() {
        assert_eq!(seg.start, expected);
        assert!(seg.len > 0);
        expected = seg.end();
    }
    assert_eq!(expected, index.len());
    assert_eq!(collapse(index.labels()), index.classes());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn test_repair_reaches_valid_state(
        labels in arb_labels(),
        rules in arb_rules(),
        seed in any::<u64>()
    ) {
        let n = labels.len();
        let mut index = SegmentIndex::from_labels(labels);
        let repairer = ValidityRepairer::new(rules, 10_000);
        repairer.repair(&mut index, &mut Rng::with_seed(seed)).unwrap();

        prop_assert_eq!(index.len(), n);
        prop_assert!(repairer.find_first_violation(&index).is_none());
        prop_assert!(index.validate().is_ok());
        assert_tiles(&index);
        for seg in index.segments_of(Ss3::Helix) {
            prop_assert!(seg.len >= rules.min_helix);
        }
        for seg in index.segments_of(Ss3::Strand) {
            prop_assert!(seg.len >= rules.min_strand);
        }
    }

    #[test]
    fn test_mutation_chain_keeps_index_consistent(
        labels in arb_labels(),
        seed in any::<u64>()
    ) {
        let mut rng = Rng::with_seed(seed);
        let mut index = SegmentIndex::from_labels(labels);
        let proposer = MutationProposer::new(ElementRules::default());

        for _ in 0..40 {
            let Some(m) = proposer.propose(&index, &mut rng) else {
                continue;
            };
            let (start, edit) = m.edit();
            m.apply(&mut index).unwrap();
            prop_assert_eq!(&index.labels()[start..start + edit.len()], &edit[..]);
            prop_assert!(index.validate().is_ok(), "{:?}", m);
        }
        assert_tiles(&index);
    }

    #[test]
    fn test_select_normal_in_range(
        ratio in 0.01f64..3.0,
        size in 1usize..200,
        seed in any::<u64>()
    ) {
        let mut rng = Rng::with_seed(seed);
        for _ in 0..20 {
            prop_assert!(select_normal(&mut rng, ratio, size) < size);
        }
    }

    #[test]
    fn test_pick_weighted_never_picks_zero_weight(
        weights in proptest::collection::vec(prop_oneof![Just(0.0), 0.01f64..1.0], 1..10),
        seed in any::<u64>()
    ) {
        let mut rng = Rng::with_seed(seed);
        match pick_weighted(&mut rng, &weights) {
            Some(i) => prop_assert!(weights[i] > 0.0),
            None => prop_assert!(weights.iter().all(|w| *w <= 0.0)),
        }
    }
}
