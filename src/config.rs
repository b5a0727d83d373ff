use crate::consts::*;
use crate::error::{ChespiError, ChespiResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub model: ModelParams,
    #[command(flatten)]
    pub rules: ElementRules,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[arg(long, default_value_t = 25)]
    pub population_size: usize,
    /// Breeding attempts per population member, spread over the schedule.
    #[arg(long, default_value_t = 75.0)]
    pub limit_factor: f64,
    #[arg(long, default_value = "0.6,0.45,0.3")]
    pub temperature_schedule: String,
    /// Mutation, crossover and multi-parent recombination weights.
    #[arg(long, default_value = "0.6,0.3,0.1")]
    pub operator_probs: String,
    /// Spread of the half-normal parent pick (values above 1 pick uniformly).
    #[arg(long, default_value = "0.5,2.0")]
    pub selection_ratios: String,
    #[arg(long, default_value_t = 10)]
    pub sort_every: usize,
    #[arg(long, default_value_t = 100)]
    pub keep: usize,
    #[arg(long, default_value_t = 1)]
    pub populations: usize,
    #[arg(long, default_value_t = 30)]
    pub merge_keep: usize,
    #[arg(long, default_value_t = 1000)]
    pub max_repair_iterations: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            population_size: 25,
            limit_factor: 75.0,
            temperature_schedule: "0.6,0.45,0.3".to_string(),
            operator_probs: "0.6,0.3,0.1".to_string(),
            selection_ratios: "0.5,2.0".to_string(),
            sort_every: 10,
            keep: 100,
            populations: 1,
            merge_keep: 30,
            max_repair_iterations: 1000,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    #[arg(long, default_value_t = DEFAULT_DISORDER_THRESHOLD)]
    pub disorder_threshold: f64,
    #[arg(long, default_value_t = DEFAULT_SIGMA_SCALE)]
    pub sigma_scale: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            disorder_threshold: DEFAULT_DISORDER_THRESHOLD,
            sigma_scale: DEFAULT_SIGMA_SCALE,
        }
    }
}

/// Minimum element lengths shared by the proposer and the repairer.
#[derive(Args, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ElementRules {
    #[arg(long, default_value_t = DEFAULT_MIN_HELIX)]
    pub min_helix: usize,
    #[arg(long, default_value_t = DEFAULT_MIN_STRAND)]
    pub min_strand: usize,
    /// Helix minimum applied by shrink and delete.
    #[arg(long, default_value_t = DEFAULT_MIN_HELIX_SHRINK)]
    pub min_helix_shrink: usize,
}

impl Default for ElementRules {
    fn default() -> Self {
        Self {
            min_helix: DEFAULT_MIN_HELIX,
            min_strand: DEFAULT_MIN_STRAND,
            min_helix_shrink: DEFAULT_MIN_HELIX_SHRINK,
        }
    }
}

impl SearchParams {
    pub fn get_temperature_schedule(&self) -> ChespiResult<Vec<f64>> {
        let temps = parse_f64_list(&self.temperature_schedule, "temperature_schedule")?;
        if temps.is_empty() || temps.iter().any(|t| *t <= 0.0) {
            return Err(ChespiError::Config(
                "--temperature-schedule needs at least one positive value".to_string(),
            ));
        }
        Ok(temps)
    }

    pub fn get_operator_probs(&self) -> ChespiResult<[f64; 3]> {
        parse_f64_array::<3>(&self.operator_probs, "operator_probs")
    }

    pub fn get_selection_ratios(&self) -> ChespiResult<[f64; 2]> {
        parse_f64_array::<2>(&self.selection_ratios, "selection_ratios")
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ChespiResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Copies values the user typed on the command line over a file config.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(search.population_size);
        update_if_present!(search.limit_factor);
        update_if_present!(search.temperature_schedule);
        update_if_present!(search.operator_probs);
        update_if_present!(search.selection_ratios);
        update_if_present!(search.sort_every);
        update_if_present!(search.keep);
        update_if_present!(search.populations);
        update_if_present!(search.merge_keep);
        update_if_present!(search.max_repair_iterations);

        update_if_present!(model.disorder_threshold);
        update_if_present!(model.sigma_scale);

        update_if_present!(rules.min_helix);
        update_if_present!(rules.min_strand);
        update_if_present!(rules.min_helix_shrink);
    }
}

fn parse_f64_list(s: &str, name: &str) -> ChespiResult<Vec<f64>> {
    s.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            let value: f64 = p
                .trim()
                .parse()
                .map_err(|_| ChespiError::Config(format!("Invalid number '{}' in --{}", p, name)))?;
            if !value.is_finite() {
                return Err(ChespiError::Config(format!(
                    "Non-finite value '{}' in --{}",
                    p.trim(),
                    name
                )));
            }
            Ok(value)
        })
        .collect()
}

fn parse_f64_array<const N: usize>(s: &str, name: &str) -> ChespiResult<[f64; N]> {
    let values = parse_f64_list(s, name)?;
    if values.len() != N {
        return Err(ChespiError::Config(format!(
            "--{} requires {} values, got {}",
            name,
            N,
            values.len()
        )));
    }
    let mut arr = [0.0; N];
    arr.copy_from_slice(&values);
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let cfg = Config::default();
        assert_eq!(
            cfg.search.get_temperature_schedule().unwrap(),
            vec![0.6, 0.45, 0.3]
        );
        assert_eq!(cfg.search.get_operator_probs().unwrap(), [0.6, 0.3, 0.1]);
        assert_eq!(cfg.search.get_selection_ratios().unwrap(), [0.5, 2.0]);
        assert_eq!(cfg.rules.min_helix, 3);
        assert_eq!(cfg.rules.min_helix_shrink, 4);
    }

    #[test]
    fn test_bad_lists_are_config_errors() {
        let search = SearchParams {
            operator_probs: "0.5,0.5".to_string(),
            temperature_schedule: "0.3,abc".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            search.get_operator_probs(),
            Err(ChespiError::Config(_))
        ));
        assert!(matches!(
            search.get_temperature_schedule(),
            Err(ChespiError::Config(_))
        ));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let search = SearchParams {
            selection_ratios: "nan,2.0".to_string(),
            temperature_schedule: "0.6,inf".to_string(),
            operator_probs: "0.6,-inf,0.1".to_string(),
            ..Default::default()
        };
        for result in [
            search.get_selection_ratios().map(|v| v.to_vec()),
            search.get_temperature_schedule(),
            search.get_operator_probs().map(|v| v.to_vec()),
        ] {
            match result {
                Err(ChespiError::Config(msg)) => assert!(msg.contains("Non-finite"), "{}", msg),
                other => panic!("expected a config error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"search": {"population_size": 8}}"#).unwrap();
        assert_eq!(cfg.search.population_size, 8);
        assert_eq!(cfg.search.keep, 100);
        assert_eq!(cfg.model.sigma_scale, DEFAULT_SIGMA_SCALE);
    }
}
