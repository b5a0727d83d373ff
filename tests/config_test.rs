use chespi::config::{Config, ElementRules, ModelParams, SearchParams};
use chespi::error::ChespiError;
use chespi::optimizer::runner::OptimizationOptions;
use std::io::Write;

// Helper to create a config for testing without relying on Clap parsing
fn get_test_config() -> Config {
    Config {
        search: SearchParams {
            population_size: 20,
            limit_factor: 30.0,
            temperature_schedule: "0.6,0.45,0.3".to_string(),
            operator_probs: "0.6,0.3,0.1".to_string(),
            selection_ratios: "0.5,2.0".to_string(),
            sort_every: 10,
            keep: 50,
            populations: 2,
            merge_keep: 30,
            max_repair_iterations: 1000,
        },
        model: ModelParams {
            disorder_threshold: 8.0,
            sigma_scale: 1.1,
        },
        rules: ElementRules {
            min_helix: 3,
            min_strand: 2,
            min_helix_shrink: 4,
        },
    }
}

#[test]
fn test_schedule_parsing_custom() {
    let mut config = get_test_config();
    config.search.temperature_schedule = " 1.0, 0.5 ,0.25".to_string();
    assert_eq!(
        config.search.get_temperature_schedule().unwrap(),
        vec![1.0, 0.5, 0.25]
    );
}

#[test]
fn test_schedule_rejects_non_positive() {
    let mut config = get_test_config();
    config.search.temperature_schedule = "0.5,0.0".to_string();
    assert!(matches!(
        config.search.get_temperature_schedule(),
        Err(ChespiError::Config(_))
    ));
}

#[test]
fn test_operator_probs_partial_is_error() {
    let mut config = get_test_config();
    config.search.operator_probs = "0.5,0.5".to_string();
    match config.search.get_operator_probs() {
        Err(ChespiError::Config(msg)) => assert!(msg.contains("requires 3 values")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_selection_ratios_garbage_is_error() {
    let mut config = get_test_config();
    config.search.selection_ratios = "bad, 2.0".to_string();
    match config.search.get_selection_ratios() {
        Err(ChespiError::Config(msg)) => assert!(msg.contains("Invalid number")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_options_from_config() {
    let config = get_test_config();
    let opts = OptimizationOptions::try_from(&config).unwrap();
    assert_eq!(opts.population_size, 20);
    assert_eq!(opts.temperatures.len(), 3);
    assert_eq!(opts.operator_probs, [0.6, 0.3, 0.1]);
    assert_eq!(opts.populations, 2);
    assert_eq!(opts.rules, config.rules);
}

#[test]
fn test_zero_populations_clamped_to_one() {
    let mut config = get_test_config();
    config.search.populations = 0;
    let opts = OptimizationOptions::try_from(&config).unwrap();
    assert_eq!(opts.populations, 1);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "search": {{ "population_size": 7 }}, "rules": {{ "min_helix": 4 }} }}"#
    )
    .unwrap();

    let config = Config::load_from_file(file.path()).unwrap();
    let defaults = Config::default();
    assert_eq!(config.search.population_size, 7);
    assert_eq!(config.search.limit_factor, defaults.search.limit_factor);
    assert_eq!(config.rules.min_helix, 4);
    assert_eq!(config.rules.min_strand, defaults.rules.min_strand);
    assert_eq!(config.model.sigma_scale, defaults.model.sigma_scale);
}

#[test]
fn test_malformed_file_is_json_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(matches!(
        Config::load_from_file(file.path()),
        Err(ChespiError::Json(_))
    ));
}

#[derive(clap::Parser)]
struct Harness {
    #[command(flatten)]
    config: Config,
}

#[test]
fn test_merge_only_copies_typed_flags() {
    use clap::{CommandFactory, FromArgMatches};

    let matches = Harness::command()
        .try_get_matches_from(["chespi", "--keep", "9", "--min-strand", "3"])
        .unwrap();
    let cli = Harness::from_arg_matches(&matches).unwrap();

    let mut file_config = get_test_config();
    file_config.search.population_size = 99;
    file_config.merge_from_cli(&cli.config, &matches);

    assert_eq!(file_config.search.keep, 9);
    assert_eq!(file_config.rules.min_strand, 3);
    // Untyped flags keep the file's value, not the clap default
    assert_eq!(file_config.search.population_size, 99);
}
