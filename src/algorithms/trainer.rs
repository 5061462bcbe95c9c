use super::baseline::{BaselineEstimator, BaselineStatistics};
use super::features::FeatureStore;
use super::matrix::SparseRatingMatrix;
use super::predictor::clamp_rating;
use crate::config::TrainingConfig;
use crate::error::{FactorError, Result};
use crate::models::{FeatureReport, Rating, TrainingReport};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct TrainingState {
    squared_error_sum: f64,
    last_rmse: f64,
    rmse: f64,
    epoch: usize,
}

impl TrainingState {
    fn finish_epoch(&mut self, observed: usize) {
        self.last_rmse = self.rmse;
        self.rmse = (self.squared_error_sum / observed as f64).sqrt();
        self.squared_error_sum = 0.0;
        self.epoch += 1;
    }

    fn is_settled(&self, min_iterations: usize, min_improvement: f64) -> bool {
        self.epoch >= min_iterations && !(self.rmse < self.last_rmse - min_improvement)
    }
}

/// Incremental SVD trainer.
///
/// Features are fitted one at a time. Each sweep visits every observed pair
/// and nudges only the current feature, but the residual it descends on uses
/// the full clamped dot product, so later features absorb what earlier ones
/// left behind. Features must be trained in order for that reason.
#[derive(Debug, Clone)]
pub struct Trainer<'a> {
    matrix: &'a SparseRatingMatrix,
    baseline: BaselineStatistics,
    config: TrainingConfig,
}

impl<'a> Trainer<'a> {
    pub fn new(matrix: &'a SparseRatingMatrix, config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        if matrix.is_empty() {
            return Err(FactorError::EmptyMatrix);
        }
        let baseline = BaselineEstimator::with_shrinkage(matrix, config.shrinkage)?.statistics();

        Ok(Self {
            matrix,
            baseline,
            config,
        })
    }

    pub fn baseline(&self) -> &BaselineStatistics {
        &self.baseline
    }

    pub fn new_feature_store(&self) -> FeatureStore {
        FeatureStore::with_init(
            self.matrix.num_users(),
            self.matrix.num_items(),
            self.config.num_features,
            &self.config.feature_init,
        )
    }

    /// Rating minus baseline minus the current clamped latent prediction.
    pub fn error(&self, features: &FeatureStore, user_id: usize, item_id: usize) -> Result<f64> {
        let actual = self.matrix.rating(user_id, item_id)?;
        self.check_shape(features)?;
        Ok(self.residual(features, Rating::new(user_id, item_id, actual)))
    }

    /// One gradient step on `feature` for an observed pair. Returns the
    /// squared residual measured before the step.
    pub fn train_pair(
        &self,
        features: &mut FeatureStore,
        feature: usize,
        user_id: usize,
        item_id: usize,
    ) -> Result<f64> {
        self.check_shape(features)?;
        self.check_feature(features, feature)?;
        let actual = self.matrix.rating(user_id, item_id)?;
        Ok(self.gradient_step(features, feature, Rating::new(user_id, item_id, actual)))
    }

    pub fn train_feature(&self, features: &mut FeatureStore, feature: usize) -> Result<FeatureReport> {
        self.check_shape(features)?;
        self.check_feature(features, feature)?;

        let observed = self.matrix.num_observed();
        let mut state = TrainingState::default();
        let mut converged = true;

        loop {
            for rating in self.matrix.observed() {
                state.squared_error_sum += self.gradient_step(features, feature, rating);
            }
            state.finish_epoch(observed);
            debug!(feature, epoch = state.epoch, rmse = state.rmse, "epoch finished");

            if !state.rmse.is_finite() {
                return Err(FactorError::Diverged {
                    feature,
                    epoch: state.epoch,
                });
            }
            if state.is_settled(self.config.min_iterations, self.config.min_improvement) {
                break;
            }
            if let Some(max) = self.config.max_iterations {
                if state.epoch >= max {
                    warn!(
                        feature,
                        epochs = state.epoch,
                        rmse = state.rmse,
                        "epoch cap reached before rmse settled"
                    );
                    converged = false;
                    break;
                }
            }
        }

        Ok(FeatureReport {
            feature,
            epochs: state.epoch,
            rmse: state.rmse,
            converged,
        })
    }

    pub fn train(&self, features: &mut FeatureStore) -> Result<TrainingReport> {
        self.check_shape(features)?;
        let started = Instant::now();

        info!(
            users = self.matrix.num_users(),
            items = self.matrix.num_items(),
            observed = self.matrix.num_observed(),
            num_features = features.num_features(),
            global_average = self.baseline.global_average(),
            "Starting factor training"
        );

        let mut reports = Vec::with_capacity(features.num_features());
        for feature in 0..features.num_features() {
            let report = self.train_feature(features, feature)?;
            info!(
                feature,
                epochs = report.epochs,
                rmse = report.rmse,
                "Feature trained"
            );
            reports.push(report);
        }

        if !features.is_finite() {
            return Err(FactorError::Diverged {
                feature: features.num_features().saturating_sub(1),
                epoch: reports.last().map(|r| r.epochs).unwrap_or(0),
            });
        }

        let report = TrainingReport {
            observed_pairs: self.matrix.num_observed(),
            features: reports,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        info!(
            total_epochs = report.total_epochs(),
            elapsed_secs = report.elapsed_secs,
            "Completed factor training"
        );
        Ok(report)
    }

    fn residual(&self, features: &FeatureStore, rating: Rating) -> f64 {
        let prediction = clamp_rating(features.dot_unchecked(rating.user_id, rating.item_id));
        rating.rating - self.baseline.residual_base(rating.user_id, rating.item_id) - prediction
    }

    fn gradient_step(&self, features: &mut FeatureStore, feature: usize, rating: Rating) -> f64 {
        let error = self.residual(features, rating);
        let lr = self.config.learning_rate;
        let reg = self.config.regularization;

        let (user_old, item_old) = features.feature(rating.user_id, rating.item_id, feature);
        features.set_feature(
            rating.user_id,
            rating.item_id,
            feature,
            (
                user_old + lr * (error * item_old - reg * user_old),
                item_old + lr * (error * user_old - reg * item_old),
            ),
        );

        error * error
    }

    fn check_shape(&self, features: &FeatureStore) -> Result<()> {
        if features.num_users() != self.matrix.num_users()
            || features.num_items() != self.matrix.num_items()
        {
            return Err(FactorError::DimensionMismatch {
                expected_users: self.matrix.num_users(),
                expected_items: self.matrix.num_items(),
                users: features.num_users(),
                items: features.num_items(),
            });
        }
        if features.num_features() != self.config.num_features {
            return Err(FactorError::InvalidConfig(format!(
                "feature store has {} features, config expects {}",
                features.num_features(),
                self.config.num_features
            )));
        }
        Ok(())
    }

    fn check_feature(&self, features: &FeatureStore, feature: usize) -> Result<()> {
        if feature >= features.num_features() {
            return Err(FactorError::InvalidConfig(format!(
                "feature {} out of range for {} features",
                feature,
                features.num_features()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::initializer::FeatureInit;
    use crate::algorithms::predictor::PredictionEngine;

    fn two_by_two() -> SparseRatingMatrix {
        SparseRatingMatrix::from_ratings(
            2,
            2,
            &[
                Rating::new(0, 0, 5.0),
                Rating::new(0, 1, 3.0),
                Rating::new(1, 0, 4.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let m = SparseRatingMatrix::from_ratings(3, 3, &[]).unwrap();
        assert_eq!(
            Trainer::new(&m, TrainingConfig::default()).unwrap_err(),
            FactorError::EmptyMatrix
        );
    }

    #[test]
    fn test_error_uses_full_residual() {
        let m = two_by_two();
        let trainer = Trainer::new(&m, TrainingConfig::default()).unwrap();
        let store = trainer.new_feature_store();

        let base = trainer.baseline();
        let expected = 4.0
            - base.global_average()
            - base.offset_for_user(1).unwrap()
            - base.offset_for_item(0).unwrap()
            - 1.0; // clamped 0.05
        assert!((trainer.error(&store, 1, 0).unwrap() - expected).abs() < 1e-12);
        assert_eq!(
            trainer.error(&store, 1, 1),
            Err(FactorError::NotRated { user: 1, item: 1 })
        );
    }

    #[test]
    fn test_gradient_step_uses_pre_update_values() {
        let m = two_by_two();
        let trainer = Trainer::new(&m, TrainingConfig::default()).unwrap();
        let mut store = trainer.new_feature_store();
        store.user_vector_mut(0).unwrap()[2] = 0.4;
        store.item_vector_mut(1).unwrap()[2] = 0.2;

        let error = trainer.error(&store, 0, 1).unwrap();
        let squared = trainer.train_pair(&mut store, 2, 0, 1).unwrap();
        assert!((squared - error * error).abs() < 1e-12);

        let expected_user = 0.4 + 0.001 * (error * 0.2 - 0.02 * 0.4);
        let expected_item = 0.2 + 0.001 * (error * 0.4 - 0.02 * 0.2);
        assert!((store.user_vector(0).unwrap()[2] - expected_user).abs() < 1e-15);
        assert!((store.item_vector(1).unwrap()[2] - expected_item).abs() < 1e-15);
        // other features untouched
        assert_eq!(store.user_vector(0).unwrap()[0], 0.1);
        assert_eq!(store.item_vector(1).unwrap()[4], 0.1);
    }

    #[test]
    fn test_single_rating_runs_min_iterations() {
        let m = SparseRatingMatrix::from_ratings(1, 1, &[Rating::new(0, 0, 5.0)]).unwrap();
        let config = TrainingConfig::default();
        let trainer = Trainer::new(&m, config.clone()).unwrap();
        let mut store = trainer.new_feature_store();
        let report = trainer.train(&mut store).unwrap();

        assert_eq!(report.features.len(), config.num_features);
        for feature in &report.features {
            assert_eq!(feature.epochs, config.min_iterations);
            assert!(feature.converged);
        }
    }

    #[test]
    fn test_unobserved_entities_are_untouched() {
        // user 2 and item 2 have no ratings
        let m = SparseRatingMatrix::from_ratings(
            3,
            3,
            &[
                Rating::new(0, 0, 5.0),
                Rating::new(0, 1, 2.0),
                Rating::new(1, 0, 4.0),
                Rating::new(1, 1, 1.0),
            ],
        )
        .unwrap();
        let mut config = TrainingConfig::default();
        config.min_iterations = 5;
        let trainer = Trainer::new(&m, config).unwrap();
        let mut store = trainer.new_feature_store();
        trainer.train_feature(&mut store, 0).unwrap();

        assert!(store.user_vector(2).unwrap().iter().all(|&v| v == 0.1));
        assert!(store.item_vector(2).unwrap().iter().all(|&v| v == 0.1));
        assert_ne!(store.user_vector(0).unwrap()[0], 0.1);
        assert_eq!(store.user_vector(0).unwrap()[1], 0.1);
    }

    fn oversized_init_config() -> TrainingConfig {
        // dot starts at 5; feature 0 shrinks toward zero, pulling it to 4
        TrainingConfig {
            min_iterations: 2,
            feature_init: FeatureInit::Constant { value: 1.0 },
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_keeps_sweeping_while_rmse_improves() {
        let m = two_by_two();
        let config = oversized_init_config();
        let trainer = Trainer::new(&m, config.clone()).unwrap();
        let mut store = trainer.new_feature_store();
        let report = trainer.train_feature(&mut store, 0).unwrap();

        assert!(report.epochs > config.min_iterations);
        assert!(report.converged);
        assert!(report.rmse.is_finite());
    }

    #[test]
    fn test_epoch_cap_stops_training() {
        let m = two_by_two();
        let config = TrainingConfig {
            max_iterations: Some(5),
            ..oversized_init_config()
        };
        let trainer = Trainer::new(&m, config).unwrap();
        let mut store = trainer.new_feature_store();
        let report = trainer.train_feature(&mut store, 0).unwrap();

        assert_eq!(report.epochs, 5);
        assert!(!report.converged);
    }

    #[test]
    fn test_divergence_is_reported() {
        let m = two_by_two();
        let mut config = TrainingConfig::default();
        config.learning_rate = 1.0e3;
        let trainer = Trainer::new(&m, config).unwrap();
        let mut store = trainer.new_feature_store();
        assert!(matches!(
            trainer.train(&mut store),
            Err(FactorError::Diverged { .. })
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let m = two_by_two();
        let trainer = Trainer::new(&m, TrainingConfig::default()).unwrap();
        let mut store = FeatureStore::new(3, 2, 5, 0.1);
        assert!(matches!(
            trainer.train(&mut store),
            Err(FactorError::DimensionMismatch { .. })
        ));
        let mut store = FeatureStore::new(2, 2, 4, 0.1);
        assert!(matches!(trainer.train(&mut store), Err(FactorError::InvalidConfig(_))));
    }

    #[test]
    fn test_end_to_end_prediction_in_range() {
        let m = two_by_two();
        let trainer = Trainer::new(&m, TrainingConfig::default()).unwrap();
        let mut store = trainer.new_feature_store();
        let report = trainer.train(&mut store).unwrap();
        assert_eq!(report.observed_pairs, 3);

        let engine = PredictionEngine::new(&store, trainer.baseline());
        let p = engine.predict(1, 1).unwrap();
        assert!((1.0..=5.0).contains(&p));
    }
}
