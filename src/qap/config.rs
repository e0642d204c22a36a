//! # QapConfig
//!
//! Parameters of the QAP solver. Built from code with the fluent builder, or
//! from the plain key/value maps produced by environment variables and config
//! files.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use qapopt::qap::{Algorithm, QapConfig};
//!
//! let config = QapConfig::builder()
//!     .algorithm(Algorithm::Genetic)
//!     .max_iterations(5_000)
//!     .seed(42)
//!     .build();
//! assert!(config.validate().is_ok());
//!
//! let params = HashMap::from([
//!     ("algorithm".to_string(), "simulated_annealing".to_string()),
//!     ("cooling_rate".to_string(), "0.99".to_string()),
//! ]);
//! let parsed = QapConfig::from_params(&params).unwrap();
//! assert_eq!(parsed.algorithm, Algorithm::SimulatedAnnealing);
//! assert_eq!(parsed.cooling_rate, 0.99);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{OptimizerError, Result};

/// The search strategy used by the QAP solver.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    SimulatedAnnealing,
    Genetic,
}

impl Algorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::SimulatedAnnealing => "simulated_annealing",
            Algorithm::Genetic => "genetic",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated_annealing" | "sa" => Ok(Algorithm::SimulatedAnnealing),
            "genetic" | "ga" => Ok(Algorithm::Genetic),
            other => Err(OptimizerError::Configuration(format!(
                "unknown algorithm '{}', expected 'simulated_annealing' or 'genetic'",
                other
            ))),
        }
    }
}

/// Configuration for the QAP solver.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct QapConfig {
    pub algorithm: Algorithm,
    /// Iteration budget. For the genetic algorithm this is divided by the
    /// population size to get the number of generations.
    pub max_iterations: usize,
    /// Starting temperature of simulated annealing.
    pub temperature_init: f64,
    /// Geometric cooling factor, strictly between 0 and 1.
    pub cooling_rate: f64,
    /// Annealing stops once the temperature drops below this floor.
    pub min_temperature: f64,
    /// Probability of a swap mutation per child.
    pub mutation_rate: f64,
    pub tournament_size: usize,
    /// Upper bound on the population; the actual size is `min(max_population, 2n)`.
    pub max_population: usize,
    pub seed: Option<u64>,
    /// Cooperative wall-clock budget.
    pub timeout: Option<Duration>,
    /// Recorded but unused: there is no GPU path.
    pub enable_gpu: bool,
}

impl Default for QapConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::SimulatedAnnealing,
            max_iterations: 10_000,
            temperature_init: 100.0,
            cooling_rate: 0.995,
            min_temperature: 1e-3,
            mutation_rate: 0.1,
            tournament_size: 3,
            max_population: 50,
            seed: None,
            timeout: None,
            enable_gpu: false,
        }
    }
}

impl QapConfig {
    /// Returns a builder for creating a `QapConfig` instance.
    pub fn builder() -> QapConfigBuilder {
        QapConfigBuilder::default()
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - `max_iterations` is 0
    /// - `temperature_init` is not positive
    /// - `cooling_rate` is not strictly between 0 and 1
    /// - `min_temperature` is negative or not below `temperature_init`
    /// - `mutation_rate` is outside `[0, 1]`
    /// - `tournament_size` or `max_population` is too small
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(OptimizerError::Configuration(
                "Maximum iterations must be greater than 0".to_string(),
            ));
        }
        if !(self.temperature_init > 0.0 && self.temperature_init.is_finite()) {
            return Err(OptimizerError::Configuration(
                "Initial temperature must be positive".to_string(),
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(OptimizerError::Configuration(
                "Cooling rate must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }
        if !(self.min_temperature >= 0.0 && self.min_temperature < self.temperature_init) {
            return Err(OptimizerError::Configuration(
                "Minimum temperature must be non-negative and below the initial temperature"
                    .to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(OptimizerError::Configuration(
                "Mutation rate must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.tournament_size < 1 {
            return Err(OptimizerError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        if self.max_population < 2 {
            return Err(OptimizerError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads a configuration from string key/value pairs, starting from the defaults.
    ///
    /// Recognised keys: `algorithm`, `max_iterations`, `temperature_init`,
    /// `cooling_rate`, `min_temperature`, `mutation_rate`, `tournament_size`,
    /// `max_population`, `seed`, `timeout_secs`, `enable_gpu`. Unknown keys are
    /// ignored so one map can carry settings for several components.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        for (key, raw) in params {
            match key.as_str() {
                "algorithm" => config.algorithm = raw.parse()?,
                "max_iterations" => config.max_iterations = parse_param(key, raw)?,
                "temperature_init" => config.temperature_init = parse_param(key, raw)?,
                "cooling_rate" => config.cooling_rate = parse_param(key, raw)?,
                "min_temperature" => config.min_temperature = parse_param(key, raw)?,
                "mutation_rate" => config.mutation_rate = parse_param(key, raw)?,
                "tournament_size" => config.tournament_size = parse_param(key, raw)?,
                "max_population" => config.max_population = parse_param(key, raw)?,
                "seed" => config.seed = Some(parse_param(key, raw)?),
                "timeout_secs" => {
                    let secs: f64 = parse_param(key, raw)?;
                    config.timeout = Some(Duration::try_from_secs_f64(secs).map_err(|e| {
                        OptimizerError::Configuration(format!("invalid timeout_secs: {}", e))
                    })?);
                }
                "enable_gpu" => config.enable_gpu = parse_param(key, raw)?,
                _ => {}
            }
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_param<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| OptimizerError::Configuration(format!("invalid value for {}: {}", key, e)))
}

/// Builder for `QapConfig`.
#[derive(Debug, Clone, Default)]
pub struct QapConfigBuilder {
    algorithm: Option<Algorithm>,
    max_iterations: Option<usize>,
    temperature_init: Option<f64>,
    cooling_rate: Option<f64>,
    min_temperature: Option<f64>,
    mutation_rate: Option<f64>,
    tournament_size: Option<usize>,
    max_population: Option<usize>,
    seed: Option<u64>,
    timeout: Option<Duration>,
    enable_gpu: Option<bool>,
}

impl QapConfigBuilder {
    pub fn algorithm(mut self, value: Algorithm) -> Self {
        self.algorithm = Some(value);
        self
    }

    pub fn max_iterations(mut self, value: usize) -> Self {
        self.max_iterations = Some(value);
        self
    }

    pub fn temperature_init(mut self, value: f64) -> Self {
        self.temperature_init = Some(value);
        self
    }

    pub fn cooling_rate(mut self, value: f64) -> Self {
        self.cooling_rate = Some(value);
        self
    }

    pub fn min_temperature(mut self, value: f64) -> Self {
        self.min_temperature = Some(value);
        self
    }

    pub fn mutation_rate(mut self, value: f64) -> Self {
        self.mutation_rate = Some(value);
        self
    }

    pub fn tournament_size(mut self, value: usize) -> Self {
        self.tournament_size = Some(value);
        self
    }

    pub fn max_population(mut self, value: usize) -> Self {
        self.max_population = Some(value);
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = Some(value);
        self
    }

    pub fn enable_gpu(mut self, value: bool) -> Self {
        self.enable_gpu = Some(value);
        self
    }

    /// Builds the `QapConfig` instance. Unset fields take their defaults.
    pub fn build(self) -> QapConfig {
        let default = QapConfig::default();
        QapConfig {
            algorithm: self.algorithm.unwrap_or(default.algorithm),
            max_iterations: self.max_iterations.unwrap_or(default.max_iterations),
            temperature_init: self.temperature_init.unwrap_or(default.temperature_init),
            cooling_rate: self.cooling_rate.unwrap_or(default.cooling_rate),
            min_temperature: self.min_temperature.unwrap_or(default.min_temperature),
            mutation_rate: self.mutation_rate.unwrap_or(default.mutation_rate),
            tournament_size: self.tournament_size.unwrap_or(default.tournament_size),
            max_population: self.max_population.unwrap_or(default.max_population),
            seed: self.seed.or(default.seed),
            timeout: self.timeout.or(default.timeout),
            enable_gpu: self.enable_gpu.unwrap_or(default.enable_gpu),
        }
    }
}
