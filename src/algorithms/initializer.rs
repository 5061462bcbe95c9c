use crate::error::{FactorError, Result};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub fn constant(rows: usize, cols: usize, value: f64) -> DMatrix<f64> {
    DMatrix::from_element(rows, cols, value)
}

pub fn seeded_uniform(rows: usize, cols: usize, low: f64, high: f64, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    DMatrix::from_fn(rows, cols, |_, _| rng.gen_range(low..high))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FeatureInit {
    Constant { value: f64 },
    Uniform { low: f64, high: f64, seed: u64 },
}

impl FeatureInit {
    pub fn validate(&self) -> Result<()> {
        match self {
            FeatureInit::Constant { value } if !value.is_finite() => Err(
                FactorError::InvalidConfig("feature init value must be finite".to_string()),
            ),
            FeatureInit::Uniform { low, high, .. }
                if !(low.is_finite() && high.is_finite() && low < high) =>
            {
                Err(FactorError::InvalidConfig(
                    "uniform feature init needs finite low < high".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn initialize_matrix(&self, rows: usize, cols: usize, stream: u64) -> DMatrix<f64> {
        match self {
            FeatureInit::Constant { value } => constant(rows, cols, *value),
            FeatureInit::Uniform { low, high, seed } => {
                seeded_uniform(rows, cols, *low, *high, seed.wrapping_add(stream))
            }
        }
    }
}

impl Default for FeatureInit {
    fn default() -> Self {
        FeatureInit::Constant { value: 0.1 }
    }
}
