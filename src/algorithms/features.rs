use super::initializer::FeatureInit;
use crate::error::{Axis, FactorError, Result};
use nalgebra::{DMatrix, DVectorView, DVectorViewMut};

// num_features x num_entities, one column per user / item
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStore {
    user_features: DMatrix<f64>,
    item_features: DMatrix<f64>,
}

impl FeatureStore {
    pub fn new(num_users: usize, num_items: usize, num_features: usize, init_value: f64) -> Self {
        Self::with_init(
            num_users,
            num_items,
            num_features,
            &FeatureInit::Constant { value: init_value },
        )
    }

    pub fn with_init(
        num_users: usize,
        num_items: usize,
        num_features: usize,
        init: &FeatureInit,
    ) -> Self {
        Self {
            user_features: init.initialize_matrix(num_features, num_users, 0),
            item_features: init.initialize_matrix(num_features, num_items, 1),
        }
    }

    pub fn num_users(&self) -> usize {
        self.user_features.ncols()
    }

    pub fn num_items(&self) -> usize {
        self.item_features.ncols()
    }

    pub fn num_features(&self) -> usize {
        self.user_features.nrows()
    }

    pub fn user_vector(&self, user_id: usize) -> Result<DVectorView<'_, f64>> {
        FactorError::check_index(Axis::User, user_id, self.num_users())?;
        Ok(self.user_features.column(user_id))
    }

    pub fn item_vector(&self, item_id: usize) -> Result<DVectorView<'_, f64>> {
        FactorError::check_index(Axis::Item, item_id, self.num_items())?;
        Ok(self.item_features.column(item_id))
    }

    pub fn user_vector_mut(&mut self, user_id: usize) -> Result<DVectorViewMut<'_, f64>> {
        FactorError::check_index(Axis::User, user_id, self.num_users())?;
        Ok(self.user_features.column_mut(user_id))
    }

    pub fn item_vector_mut(&mut self, item_id: usize) -> Result<DVectorViewMut<'_, f64>> {
        FactorError::check_index(Axis::Item, item_id, self.num_items())?;
        Ok(self.item_features.column_mut(item_id))
    }

    pub fn dot(&self, user_id: usize, item_id: usize) -> Result<f64> {
        Ok(self.user_vector(user_id)?.dot(&self.item_vector(item_id)?))
    }

    pub(crate) fn dot_unchecked(&self, user_id: usize, item_id: usize) -> f64 {
        self.user_features
            .column(user_id)
            .dot(&self.item_features.column(item_id))
    }

    pub(crate) fn feature(&self, user_id: usize, item_id: usize, feature: usize) -> (f64, f64) {
        (
            self.user_features[(feature, user_id)],
            self.item_features[(feature, item_id)],
        )
    }

    pub(crate) fn set_feature(&mut self, user_id: usize, item_id: usize, feature: usize, values: (f64, f64)) {
        self.user_features[(feature, user_id)] = values.0;
        self.item_features[(feature, item_id)] = values.1;
    }

    pub fn is_finite(&self) -> bool {
        self.user_features.iter().all(|v| v.is_finite())
            && self.item_features.iter().all(|v| v.is_finite())
    }

    pub fn user_rows(&self) -> Vec<Vec<f64>> {
        self.user_features
            .column_iter()
            .map(|c| c.iter().copied().collect())
            .collect()
    }

    pub fn item_rows(&self) -> Vec<Vec<f64>> {
        self.item_features
            .column_iter()
            .map(|c| c.iter().copied().collect())
            .collect()
    }
}
