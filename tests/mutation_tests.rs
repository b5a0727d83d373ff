use chespi::config::ElementRules;
use chespi::labels::{parse_ss8, ss8_string, Ss8};
use chespi::optimizer::mutation::{Mutation, MutationKind, MutationProposer};
use chespi::optimizer::segments::SegmentIndex;
use fastrand::Rng;
use rstest::rstest;

fn index(s: &str) -> SegmentIndex {
    SegmentIndex::from_labels(parse_ss8(s).unwrap())
}

fn overwrite(labels: &[Ss8], mutation: &Mutation) -> String {
    let (start, edit) = mutation.edit();
    let mut out = labels.to_vec();
    out[start..start + edit.len()].copy_from_slice(&edit);
    ss8_string(&out)
}

#[rstest]
#[case("----------", MutationKind::CoilPoint, true)]
#[case("----------", MutationKind::Grow, false)]
#[case("----------", MutationKind::Shrink, false)]
#[case("----------", MutationKind::Split, false)]
#[case("----------", MutationKind::DeleteElement, false)]
#[case("----------", MutationKind::HelixToThreeTen, false)]
#[case("----------", MutationKind::CoilToThreeTen, true)]
#[case("HHHHHHHHHH", MutationKind::CoilPoint, false)]
#[case("HHHHHHHHHH", MutationKind::Grow, false)]
#[case("HHHHHHHHHH", MutationKind::CoilToThreeTen, false)]
#[case("--HHH-----", MutationKind::Shrink, false)]
#[case("--GGG-----", MutationKind::HelixToThreeTen, false)]
#[case("--HHHH----", MutationKind::HelixToThreeTen, true)]
#[case("--EE------", MutationKind::DeleteElement, true)]
#[case("-HHHHHHHHHHHHHH-", MutationKind::DeleteElement, false)]
#[case("-HH-", MutationKind::CoilToThreeTen, false)]
fn test_operator_applicability(
    #[case] labels: &str,
    #[case] kind: MutationKind,
    #[case] applies: bool,
) {
    let idx = index(labels);
    let proposer = MutationProposer::new(ElementRules::default());
    let mut rng = Rng::with_seed(42);
    for _ in 0..20 {
        let proposal = proposer.propose_kind(kind, &idx, &mut rng);
        assert_eq!(proposal.is_some(), applies, "{} on {}", kind, labels);
        if let Some(m) = proposal {
            assert_eq!(m.kind(), kind);
        }
    }
}

#[test]
fn test_all_coil_proposals_stay_coil_or_three_ten() {
    let idx = index("----------");
    let proposer = MutationProposer::new(ElementRules::default());
    let mut rng = Rng::with_seed(5);
    for _ in 0..200 {
        let m = proposer.propose(&idx, &mut rng).expect("coil always has a move");
        assert!(matches!(
            m.kind(),
            MutationKind::CoilPoint | MutationKind::CoilToThreeTen
        ));
    }
}

#[test]
fn test_applied_mutation_matches_its_edit() {
    let start = "--HHHHHHHHHHH----EEEEE--EEEEE----";
    let proposer = MutationProposer::new(ElementRules::default());
    let mut rng = Rng::with_seed(2024);

    for _ in 0..500 {
        let mut idx = index(start);
        let Some(m) = proposer.propose(&idx, &mut rng) else {
            continue;
        };
        let expected = overwrite(idx.labels(), &m);
        m.apply(&mut idx).unwrap();
        assert_eq!(ss8_string(idx.labels()), expected, "{:?}", m);
        idx.validate().unwrap();
    }
}

#[test]
fn test_helix_to_three_ten_on_long_helix_touches_an_end() {
    let idx = index("--HHHHHHHHHH--");
    let proposer = MutationProposer::new(ElementRules::default());
    let mut rng = Rng::with_seed(9);
    for _ in 0..100 {
        match proposer.helix_to_three_ten(&idx, &mut rng) {
            Some(Mutation::HelixToThreeTen { start, len }) => {
                assert!((3..=5).contains(&len));
                assert!(start == 2 || start + len == 12, "{} {}", start, len);
            }
            other => panic!("unexpected proposal {:?}", other),
        }
    }
}

#[test]
fn test_delete_targets_shortest_element() {
    let idx = index("-EE---EEEE-");
    let proposer = MutationProposer::new(ElementRules::default());
    let mut rng = Rng::with_seed(1);
    for _ in 0..50 {
        match proposer.delete_element(&idx, &mut rng) {
            Some(Mutation::DeleteElement { start, labels, .. }) => {
                assert_eq!(start, 1);
                assert_eq!(labels.len(), 2);
            }
            other => panic!("unexpected proposal {:?}", other),
        }
    }
}
