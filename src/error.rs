use thiserror::Error;

pub type Result<T> = std::result::Result<T, FactorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    User,
    Item,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::User => write!(f, "user"),
            Axis::Item => write!(f, "item"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactorError {
    #[error("{axis} index {index} out of range (bound {bound})")]
    IndexOutOfRange { axis: Axis, index: usize, bound: usize },

    #[error("user {user} has not rated item {item}")]
    NotRated { user: usize, item: usize },

    #[error("rating matrix has no observed ratings")]
    EmptyMatrix,

    #[error("invalid rating {rating} for user {user}, item {item}")]
    InvalidRating { user: usize, item: usize, rating: f64 },

    #[error("duplicate rating for user {user}, item {item}")]
    DuplicateRating { user: usize, item: usize },

    #[error("dimension mismatch: expected {expected_users}x{expected_items}, got {users}x{items}")]
    DimensionMismatch {
        expected_users: usize,
        expected_items: usize,
        users: usize,
        items: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("training diverged on feature {feature} at epoch {epoch}")]
    Diverged { feature: usize, epoch: usize },

    #[error("prediction for user {user}, item {item} is not a number")]
    NonFinitePrediction { user: usize, item: usize },
}

impl FactorError {
    pub(crate) fn check_index(axis: Axis, index: usize, bound: usize) -> Result<()> {
        if index < bound {
            Ok(())
        } else {
            Err(FactorError::IndexOutOfRange { axis, index, bound })
        }
    }
}
