use crate::error::{Axis, FactorError, Result};
use crate::models::Rating;
use nalgebra_sparse::csc::CscMatrix;
use nalgebra_sparse::csr::CsrMatrix;
use nalgebra_sparse::coo::CooMatrix;
use nalgebra_sparse::SparseEntry;
use std::collections::HashSet;

// Presence is the sparsity pattern; zero is never an absence marker.
#[derive(Debug, Clone)]
pub struct SparseRatingMatrix {
    by_user: CsrMatrix<f64>,
    by_item: CscMatrix<f64>,
}

impl SparseRatingMatrix {
    pub fn from_ratings(num_users: usize, num_items: usize, ratings: &[Rating]) -> Result<Self> {
        let mut coo = CooMatrix::new(num_users, num_items);
        let mut seen = HashSet::with_capacity(ratings.len());

        for r in ratings {
            FactorError::check_index(Axis::User, r.user_id, num_users)?;
            FactorError::check_index(Axis::Item, r.item_id, num_items)?;
            if !Rating::in_domain(r.rating) {
                return Err(FactorError::InvalidRating {
                    user: r.user_id,
                    item: r.item_id,
                    rating: r.rating,
                });
            }
            if !seen.insert((r.user_id, r.item_id)) {
                return Err(FactorError::DuplicateRating {
                    user: r.user_id,
                    item: r.item_id,
                });
            }
            coo.push(r.user_id, r.item_id, r.rating);
        }

        Ok(Self {
            by_user: CsrMatrix::from(&coo),
            by_item: CscMatrix::from(&coo),
        })
    }

    pub fn num_users(&self) -> usize {
        self.by_user.nrows()
    }

    pub fn num_items(&self) -> usize {
        self.by_user.ncols()
    }

    pub fn num_observed(&self) -> usize {
        self.by_user.nnz()
    }

    pub fn is_empty(&self) -> bool {
        self.num_observed() == 0
    }

    pub fn ratings_for_user(&self, user_id: usize) -> Result<&[f64]> {
        FactorError::check_index(Axis::User, user_id, self.num_users())?;
        let offsets = self.by_user.row_offsets();
        Ok(&self.by_user.values()[offsets[user_id]..offsets[user_id + 1]])
    }

    pub fn ratings_for_item(&self, item_id: usize) -> Result<&[f64]> {
        FactorError::check_index(Axis::Item, item_id, self.num_items())?;
        let offsets = self.by_item.col_offsets();
        Ok(&self.by_item.values()[offsets[item_id]..offsets[item_id + 1]])
    }

    pub fn rating(&self, user_id: usize, item_id: usize) -> Result<f64> {
        FactorError::check_index(Axis::User, user_id, self.num_users())?;
        FactorError::check_index(Axis::Item, item_id, self.num_items())?;
        match self.by_user.get_entry(user_id, item_id) {
            Some(SparseEntry::NonZero(value)) => Ok(*value),
            _ => Err(FactorError::NotRated {
                user: user_id,
                item: item_id,
            }),
        }
    }

    pub fn contains(&self, user_id: usize, item_id: usize) -> bool {
        self.rating(user_id, item_id).is_ok()
    }

    /// Every present `(user, item)` coordinate exactly once, in row-major
    /// order. The order is the same on every call.
    pub fn observed_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.by_user.triplet_iter().map(|(u, i, _)| (u, i))
    }

    pub fn observed(&self) -> impl Iterator<Item = Rating> + '_ {
        self.by_user
            .triplet_iter()
            .map(|(u, i, &r)| Rating::new(u, i, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SparseRatingMatrix {
        SparseRatingMatrix::from_ratings(
            2,
            3,
            &[
                Rating::new(0, 0, 5.0),
                Rating::new(0, 2, 3.0),
                Rating::new(1, 0, 4.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_views() {
        let m = small();
        assert_eq!(m.num_users(), 2);
        assert_eq!(m.num_items(), 3);
        assert_eq!(m.num_observed(), 3);

        let mut user0 = m.ratings_for_user(0).unwrap().to_vec();
        user0.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(user0, vec![3.0, 5.0]);

        let mut item0 = m.ratings_for_item(0).unwrap().to_vec();
        item0.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(item0, vec![4.0, 5.0]);

        assert!(m.ratings_for_item(1).unwrap().is_empty());
    }

    #[test]
    fn test_rating_lookup() {
        let m = small();
        assert_eq!(m.rating(0, 2).unwrap(), 3.0);
        assert_eq!(
            m.rating(1, 2),
            Err(FactorError::NotRated { user: 1, item: 2 })
        );
        assert!(matches!(
            m.rating(2, 0),
            Err(FactorError::IndexOutOfRange { axis: Axis::User, .. })
        ));
        assert!(matches!(
            m.ratings_for_item(3),
            Err(FactorError::IndexOutOfRange { axis: Axis::Item, .. })
        ));
    }

    #[test]
    fn test_observed_pairs_stable_and_complete() {
        let m = small();
        let first: Vec<_> = m.observed_pairs().collect();
        let second: Vec<_> = m.observed_pairs().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);

        let set: HashSet<_> = first.into_iter().collect();
        assert!(set.contains(&(0, 0)));
        assert!(set.contains(&(0, 2)));
        assert!(set.contains(&(1, 0)));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            SparseRatingMatrix::from_ratings(1, 1, &[Rating::new(0, 0, 0.0)]),
            Err(FactorError::InvalidRating { .. })
        ));
        assert!(matches!(
            SparseRatingMatrix::from_ratings(1, 1, &[Rating::new(0, 0, 4.0), Rating::new(0, 0, 2.0)]),
            Err(FactorError::DuplicateRating { user: 0, item: 0 })
        ));
        assert!(matches!(
            SparseRatingMatrix::from_ratings(1, 1, &[Rating::new(0, 1, 4.0)]),
            Err(FactorError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_empty_matrix() {
        let m = SparseRatingMatrix::from_ratings(3, 3, &[]).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.observed_pairs().count(), 0);
    }
}
