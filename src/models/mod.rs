use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: usize,
    pub item_id: usize,
    pub rating: f64,
}

impl Rating {
    pub fn new(user_id: usize, item_id: usize, rating: f64) -> Self {
        Self {
            user_id,
            item_id,
            rating,
        }
    }

    pub fn in_domain(value: f64) -> bool {
        value.is_finite() && (MIN_RATING..=MAX_RATING).contains(&value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureReport {
    pub feature: usize,
    pub epochs: usize,
    pub rmse: f64,
    pub converged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub observed_pairs: usize,
    pub features: Vec<FeatureReport>,
    pub elapsed_secs: f64,
}

impl TrainingReport {
    pub fn total_epochs(&self) -> usize {
        self.features.iter().map(|f| f.epochs).sum()
    }

    pub fn final_rmse(&self) -> Option<f64> {
        self.features.last().map(|f| f.rmse)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub version: String,
    pub num_features: usize,
    pub global_average: f64,
    pub user_offsets: Vec<f64>,
    pub item_offsets: Vec<f64>,
    pub user_features: Vec<Vec<f64>>,
    pub item_features: Vec<Vec<f64>>,
    pub trained_at: DateTime<Utc>,
}
