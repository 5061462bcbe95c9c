use crate::models::*;
use anyhow::{anyhow, Result};

pub fn validate_rating(rating: &Rating) -> Result<()> {
    if !rating.rating.is_finite() {
        return Err(anyhow!(
            "Rating for user {} item {} is not a finite number",
            rating.user_id,
            rating.item_id
        ));
    }

    if !Rating::in_domain(rating.rating) {
        return Err(anyhow!(
            "Rating {} for user {} item {} outside [{}, {}]",
            rating.rating,
            rating.user_id,
            rating.item_id,
            MIN_RATING,
            MAX_RATING
        ));
    }

    Ok(())
}

pub fn validate_ratings(ratings: &[Rating]) -> Result<(usize, usize)> {
    if ratings.is_empty() {
        return Err(anyhow!("No ratings provided"));
    }

    let mut num_users = 0;
    let mut num_items = 0;
    for rating in ratings {
        validate_rating(rating)?;
        let users = rating
            .user_id
            .checked_add(1)
            .ok_or_else(|| anyhow!("User id {} is too large", rating.user_id))?;
        let items = rating
            .item_id
            .checked_add(1)
            .ok_or_else(|| anyhow!("Item id {} is too large", rating.item_id))?;
        num_users = num_users.max(users);
        num_items = num_items.max(items);
    }

    Ok((num_users, num_items))
}
