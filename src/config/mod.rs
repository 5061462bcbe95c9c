use crate::algorithms::initializer::FeatureInit;
use crate::error::{FactorError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub training: TrainingConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub regularization: f64,
    pub num_features: usize,
    pub feature_init: FeatureInit,
    pub min_improvement: f64,
    pub min_iterations: usize,
    /// Hard cap on sweeps per feature. `None` keeps sweeping until RMSE
    /// stops improving, which may never happen if it oscillates.
    pub max_iterations: Option<usize>,
    pub shrinkage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub ratings_path: String,
    pub delimiter: Option<char>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            regularization: 0.02,
            num_features: 5,
            feature_init: FeatureInit::Constant { value: 0.1 },
            min_improvement: 0.0001,
            min_iterations: 120,
            max_iterations: Some(10_000),
            shrinkage: 25.0,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            ratings_path: "data/u.data".to_string(),
            delimiter: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            training: TrainingConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("FUNKREC").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.training.validate()?;
        Ok(config)
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(FactorError::InvalidConfig(
                "learning_rate must be a positive number".to_string(),
            ));
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(FactorError::InvalidConfig(
                "regularization must be non-negative".to_string(),
            ));
        }
        if self.num_features == 0 {
            return Err(FactorError::InvalidConfig(
                "num_features must be at least 1".to_string(),
            ));
        }
        if !(self.min_improvement.is_finite() && self.min_improvement >= 0.0) {
            return Err(FactorError::InvalidConfig(
                "min_improvement must be non-negative".to_string(),
            ));
        }
        if !(self.shrinkage.is_finite() && self.shrinkage > 0.0) {
            return Err(FactorError::InvalidConfig(
                "shrinkage must be a positive number".to_string(),
            ));
        }
        if let Some(max) = self.max_iterations {
            if max < self.min_iterations.max(1) {
                return Err(FactorError::InvalidConfig(format!(
                    "max_iterations ({}) must be at least min_iterations ({})",
                    max, self.min_iterations
                )));
            }
        }
        self.feature_init.validate()
    }
}
