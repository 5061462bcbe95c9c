use crate::models::Rating;
use anyhow::{anyhow, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub mod metrics;
pub mod validation;

/// Parses a `user item rating [timestamp]` record with 1-based ids, as in
/// MovieLens `u.data`. Splits on whitespace when no delimiter is given.
pub fn parse_rating_line(line: &str, delimiter: Option<char>) -> Result<Rating> {
    let fields: Vec<&str> = match delimiter {
        Some(d) => line.split(d).map(str::trim).collect(),
        None => line.split_whitespace().collect(),
    };

    if fields.len() < 3 {
        return Err(anyhow!("Expected at least 3 fields, got {}", fields.len()));
    }

    let user: usize = fields[0]
        .parse()
        .with_context(|| format!("Invalid user id '{}'", fields[0]))?;
    let item: usize = fields[1]
        .parse()
        .with_context(|| format!("Invalid item id '{}'", fields[1]))?;
    let rating: f64 = fields[2]
        .parse()
        .with_context(|| format!("Invalid rating '{}'", fields[2]))?;

    if user == 0 || item == 0 {
        return Err(anyhow!("Ids are 1-based, got user {} item {}", user, item));
    }

    Ok(Rating::new(user - 1, item - 1, rating))
}

pub fn parse_ratings(input: &str, delimiter: Option<char>) -> Result<Vec<Rating>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            parse_rating_line(line, delimiter).with_context(|| format!("Line {}", n + 1))
        })
        .collect()
}

pub fn split_holdout(
    ratings: &[Rating],
    holdout_fraction: f64,
    seed: u64,
) -> (Vec<Rating>, Vec<Rating>) {
    let mut shuffled = ratings.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let fraction = holdout_fraction.clamp(0.0, 1.0);
    let test_len = (shuffled.len() as f64 * fraction).round() as usize;
    let test = shuffled.split_off(shuffled.len() - test_len);
    (shuffled, test)
}
