mod common;

use common::{shifts_csv, synthetic_observations, NATIVE, SEQUENCE};
use std::fs;
use std::process::Command;

#[test]
fn test_seeded_runs_are_identical() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let shifts_path = dir.path().join("shifts.csv");
    fs::write(
        &shifts_path,
        shifts_csv(&synthetic_observations(SEQUENCE, NATIVE, &[10])),
    )
    .unwrap();

    let run = |name: &str| -> serde_json::Value {
        let json_path = dir.path().join(name);
        let output = Command::new(env!("CARGO_BIN_EXE_chespi"))
            .args([
                "predict",
                "--sequence",
                SEQUENCE,
                "--shifts",
                shifts_path.to_str().unwrap(),
                "--population-size",
                "10",
                "--limit-factor",
                "10",
                "--populations",
                "3",
                "--attempts",
                "2",
                "-S",
                "12345",
                "--json",
                json_path.to_str().unwrap(),
            ])
            .output()
            .expect("Run failed");
        assert!(
            output.status.success(),
            "STDERR:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap()
    };

    let a = run("a.json");
    let b = run("b.json");

    assert_eq!(a["labels"], b["labels"], "Seeded runs diverged");
    assert_eq!(a["energy"], b["energy"]);
    assert_eq!(a["confidence8"], b["confidence8"]);
    assert_eq!(a["residues"], b["residues"]);
}
