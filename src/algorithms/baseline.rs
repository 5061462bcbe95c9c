use super::matrix::SparseRatingMatrix;
use super::RatingPredictor;
use crate::error::{Axis, FactorError, Result};
use rayon::prelude::*;

pub const DEFAULT_SHRINKAGE: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct BaselineEstimator<'a> {
    matrix: &'a SparseRatingMatrix,
    global_average: f64,
    shrinkage: f64,
}

impl<'a> BaselineEstimator<'a> {
    pub fn new(matrix: &'a SparseRatingMatrix) -> Result<Self> {
        Self::with_shrinkage(matrix, DEFAULT_SHRINKAGE)
    }

    pub fn with_shrinkage(matrix: &'a SparseRatingMatrix, shrinkage: f64) -> Result<Self> {
        if !(shrinkage.is_finite() && shrinkage > 0.0) {
            return Err(FactorError::InvalidConfig(format!(
                "shrinkage must be positive, got {}",
                shrinkage
            )));
        }
        let global_average = compute_global_average(matrix)?;
        Ok(Self {
            matrix,
            global_average,
            shrinkage,
        })
    }

    pub fn global_average(&self) -> f64 {
        self.global_average
    }

    pub fn shrinkage(&self) -> f64 {
        self.shrinkage
    }

    pub fn pseudo_average_for_item(&self, item_id: usize) -> Result<f64> {
        let ratings = self.matrix.ratings_for_item(item_id)?;
        Ok(self.shrink(ratings))
    }

    pub fn pseudo_average_for_user(&self, user_id: usize) -> Result<f64> {
        let ratings = self.matrix.ratings_for_user(user_id)?;
        Ok(self.shrink(ratings))
    }

    pub fn offset_for_item(&self, item_id: usize) -> Result<f64> {
        Ok(self.pseudo_average_for_item(item_id)? - self.global_average)
    }

    pub fn offset_for_user(&self, user_id: usize) -> Result<f64> {
        Ok(self.pseudo_average_for_user(user_id)? - self.global_average)
    }

    pub fn statistics(&self) -> BaselineStatistics {
        let user_averages = (0..self.matrix.num_users())
            .into_par_iter()
            .map(|u| self.shrink(self.matrix.ratings_for_user(u).unwrap_or(&[])))
            .collect();
        let item_averages = (0..self.matrix.num_items())
            .into_par_iter()
            .map(|i| self.shrink(self.matrix.ratings_for_item(i).unwrap_or(&[])))
            .collect();

        BaselineStatistics {
            global_average: self.global_average,
            user_averages,
            item_averages,
        }
    }

    fn shrink(&self, ratings: &[f64]) -> f64 {
        let sum: f64 = ratings.iter().sum();
        (self.global_average * self.shrinkage + sum) / (self.shrinkage + ratings.len() as f64)
    }
}

fn compute_global_average(matrix: &SparseRatingMatrix) -> Result<f64> {
    let count = matrix.num_observed();
    if count == 0 {
        return Err(FactorError::EmptyMatrix);
    }
    let sum: f64 = matrix.observed().map(|r| r.rating).sum();
    Ok(sum / count as f64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineStatistics {
    global_average: f64,
    user_averages: Vec<f64>,
    item_averages: Vec<f64>,
}

impl BaselineStatistics {
    pub fn global_average(&self) -> f64 {
        self.global_average
    }

    pub fn pseudo_average_for_user(&self, user_id: usize) -> Result<f64> {
        FactorError::check_index(Axis::User, user_id, self.user_averages.len())?;
        Ok(self.user_averages[user_id])
    }

    pub fn pseudo_average_for_item(&self, item_id: usize) -> Result<f64> {
        FactorError::check_index(Axis::Item, item_id, self.item_averages.len())?;
        Ok(self.item_averages[item_id])
    }

    pub fn offset_for_user(&self, user_id: usize) -> Result<f64> {
        Ok(self.pseudo_average_for_user(user_id)? - self.global_average)
    }

    pub fn offset_for_item(&self, item_id: usize) -> Result<f64> {
        Ok(self.pseudo_average_for_item(item_id)? - self.global_average)
    }

    pub fn user_offsets(&self) -> Vec<f64> {
        self.user_averages
            .iter()
            .map(|a| a - self.global_average)
            .collect()
    }

    pub fn item_offsets(&self) -> Vec<f64> {
        self.item_averages
            .iter()
            .map(|a| a - self.global_average)
            .collect()
    }

    pub fn baseline_rating(&self, user_id: usize, item_id: usize) -> Result<f64> {
        Ok(self.pseudo_average_for_item(item_id)? + self.offset_for_user(user_id)?)
    }

    pub(crate) fn residual_base(&self, user_id: usize, item_id: usize) -> f64 {
        self.global_average
            + (self.user_averages[user_id] - self.global_average)
            + (self.item_averages[item_id] - self.global_average)
    }
}

impl RatingPredictor for BaselineStatistics {
    fn predict_rating(&self, user_id: usize, item_id: usize) -> Result<f64> {
        self.baseline_rating(user_id, item_id)
    }
}
