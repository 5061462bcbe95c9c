pub mod baseline;
pub mod features;
pub mod initializer;
pub mod matrix;
pub mod predictor;
pub mod trainer;

pub use baseline::{BaselineEstimator, BaselineStatistics};
pub use features::FeatureStore;
pub use initializer::FeatureInit;
pub use matrix::SparseRatingMatrix;
pub use predictor::PredictionEngine;
pub use trainer::Trainer;

use crate::error::Result;

pub trait RatingPredictor {
    fn predict_rating(&self, user_id: usize, item_id: usize) -> Result<f64>;
}
