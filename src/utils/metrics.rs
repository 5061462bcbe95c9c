use crate::algorithms::RatingPredictor;
use crate::models::Rating;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingMetrics {
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
    pub coverage: f64,
    pub evaluated: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RatingEvaluator;

impl RatingEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn predict_rating_list<P: RatingPredictor>(
        &self,
        predictor: &P,
        ratings: &[Rating],
    ) -> (Vec<Option<f64>>, Vec<f64>) {
        let mut predicted = Vec::with_capacity(ratings.len());
        let mut errors = Vec::with_capacity(ratings.len());

        for r in ratings {
            match predictor.predict_rating(r.user_id, r.item_id) {
                Ok(p) if p.is_finite() => {
                    errors.push((p - r.rating).abs());
                    predicted.push(Some(p));
                }
                Ok(_) | Err(_) => predicted.push(None),
            }
        }

        (predicted, errors)
    }

    pub fn evaluate<P: RatingPredictor>(&self, predictor: &P, ratings: &[Rating]) -> RatingMetrics {
        let (_, errors) = self.predict_rating_list(predictor, ratings);
        let evaluated = errors.len();

        let (mae, rmse) = if evaluated == 0 {
            (0.0, 0.0)
        } else {
            let n = evaluated as f64;
            let abs_sum: f64 = errors.iter().sum();
            let sq_sum: f64 = errors.iter().map(|e| e * e).sum();
            (abs_sum / n, (sq_sum / n).sqrt())
        };

        RatingMetrics {
            mean_absolute_error: mae,
            root_mean_squared_error: rmse,
            coverage: if ratings.is_empty() {
                0.0
            } else {
                evaluated as f64 / ratings.len() as f64
            },
            evaluated,
            skipped: ratings.len() - evaluated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Axis, FactorError, Result};

    struct Fixed {
        value: f64,
        num_users: usize,
    }

    impl RatingPredictor for Fixed {
        fn predict_rating(&self, user_id: usize, _item_id: usize) -> Result<f64> {
            if user_id >= self.num_users {
                return Err(FactorError::IndexOutOfRange {
                    axis: Axis::User,
                    index: user_id,
                    bound: self.num_users,
                });
            }
            Ok(self.value)
        }
    }

    #[test]
    fn test_evaluate() {
        let predictor = Fixed { value: 3.0, num_users: 2 };
        let ratings = vec![
            Rating::new(0, 0, 5.0),
            Rating::new(1, 0, 2.0),
            Rating::new(7, 0, 4.0),
        ];
        let metrics = RatingEvaluator::new().evaluate(&predictor, &ratings);

        assert_eq!(metrics.evaluated, 2);
        assert_eq!(metrics.skipped, 1);
        assert!((metrics.mean_absolute_error - 1.5).abs() < 1e-12);
        assert!((metrics.root_mean_squared_error - (2.5f64).sqrt()).abs() < 1e-12);
        assert!((metrics.coverage - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_predict_rating_list_keeps_order() {
        let predictor = Fixed { value: 4.0, num_users: 1 };
        let ratings = vec![Rating::new(3, 0, 1.0), Rating::new(0, 0, 1.0)];
        let (predicted, errors) = RatingEvaluator::new().predict_rating_list(&predictor, &ratings);
        assert_eq!(predicted, vec![None, Some(4.0)]);
        assert_eq!(errors, vec![3.0]);
    }

    #[test]
    fn test_empty_input() {
        let predictor = Fixed { value: 4.0, num_users: 1 };
        let metrics = RatingEvaluator::new().evaluate(&predictor, &[]);
        assert_eq!(metrics.evaluated, 0);
        assert_eq!(metrics.coverage, 0.0);
    }
}
