use super::baseline::BaselineStatistics;
use super::features::FeatureStore;
use super::RatingPredictor;
use crate::error::{FactorError, Result};
use crate::models::{MAX_RATING, MIN_RATING};

/// NaN passes through unchanged so training can detect divergence.
pub fn clamp_rating(score: f64) -> f64 {
    if score > MAX_RATING {
        MAX_RATING
    } else if score < MIN_RATING {
        MIN_RATING
    } else {
        score
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PredictionEngine<'a> {
    features: &'a FeatureStore,
    baseline: &'a BaselineStatistics,
}

impl<'a> PredictionEngine<'a> {
    pub fn new(features: &'a FeatureStore, baseline: &'a BaselineStatistics) -> Self {
        Self { features, baseline }
    }

    /// Latent-only prediction: the user/item dot product clamped to `[1, 5]`.
    /// Infinite scores clamp to a bound; a NaN score is an error.
    pub fn predict(&self, user_id: usize, item_id: usize) -> Result<f64> {
        let score = self.features.dot(user_id, item_id)?;
        if score.is_nan() {
            return Err(FactorError::NonFinitePrediction {
                user: user_id,
                item: item_id,
            });
        }
        Ok(clamp_rating(score))
    }

    pub fn predict_baseline(&self, user_id: usize, item_id: usize) -> Result<f64> {
        self.baseline.baseline_rating(user_id, item_id)
    }
}

impl RatingPredictor for PredictionEngine<'_> {
    fn predict_rating(&self, user_id: usize, item_id: usize) -> Result<f64> {
        self.predict(user_id, item_id)
    }
}
