use crate::algorithms::{BaselineStatistics, FeatureStore, PredictionEngine, SparseRatingMatrix, Trainer};
use crate::config::TrainingConfig;
use crate::models::*;
use crate::utils::validation::validate_ratings;
use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub features: FeatureStore,
    pub baseline: BaselineStatistics,
    pub report: TrainingReport,
}

impl TrainedModel {
    pub fn engine(&self) -> PredictionEngine<'_> {
        PredictionEngine::new(&self.features, &self.baseline)
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        let trained_at = Utc::now();
        ModelSnapshot {
            version: format!("v{}", trained_at.timestamp()),
            num_features: self.features.num_features(),
            global_average: self.baseline.global_average(),
            user_offsets: self.baseline.user_offsets(),
            item_offsets: self.baseline.item_offsets(),
            user_features: self.features.user_rows(),
            item_features: self.features.item_rows(),
            trained_at,
        }
    }
}

pub struct TrainingService {
    config: TrainingConfig,
}

impl TrainingService {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate().context("Invalid training configuration")?;
        Ok(Self { config })
    }

    pub fn train_ratings(&self, ratings: &[Rating]) -> Result<TrainedModel> {
        let (num_users, num_items) = validate_ratings(ratings)?;
        self.train_with_shape(num_users, num_items, ratings)
    }

    pub fn train_with_shape(
        &self,
        num_users: usize,
        num_items: usize,
        ratings: &[Rating],
    ) -> Result<TrainedModel> {
        info!(
            "Building rating matrix: {} users, {} items, {} ratings",
            num_users,
            num_items,
            ratings.len()
        );
        let matrix = SparseRatingMatrix::from_ratings(num_users, num_items, ratings)
            .context("Failed to build rating matrix")?;
        self.train_matrix(&matrix)
    }

    pub fn train_matrix(&self, matrix: &SparseRatingMatrix) -> Result<TrainedModel> {
        let trainer = Trainer::new(matrix, self.config.clone())
            .context("Failed to prepare trainer")?;
        let mut features = trainer.new_feature_store();
        let report = trainer.train(&mut features).context("Training failed")?;

        info!(
            "Trained {} features in {:.2}s, final rmse {:?}",
            report.features.len(),
            report.elapsed_secs,
            report.final_rmse()
        );

        Ok(TrainedModel {
            features,
            baseline: trainer.baseline().clone(),
            report,
        })
    }
}
