use std::sync::Arc;

use strum_macros::{Display, EnumString};
use tracing::{debug, instrument, warn};

use crate::game::models::{GameAggregates, GameModel};
use crate::game::repository::{GameRepository, StoreAggregates};
use crate::shared::AppError;

/// Attempts at writing aggregates before leaving it to the next mutation's refresh
pub const MAX_RECOMPUTE_ATTEMPTS: usize = 5;

/// How a game's average rating is derived from its ratings.
/// A deployment uses exactly one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RatingPolicy {
    /// Arithmetic mean of all current scores
    #[default]
    SimpleMean,
    /// Σ(score·minutes) / Σ(minutes), minutes taken from the game-side play facts
    PlaytimeWeighted,
}

/// Rounds to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl RatingPolicy {
    pub fn average(&self, game: &GameModel) -> f64 {
        if game.ratings.is_empty() {
            return 0.0;
        }

        let average = match self {
            RatingPolicy::SimpleMean => {
                let sum: u64 = game.ratings.iter().map(|r| r.rating as u64).sum();
                sum as f64 / game.ratings.len() as f64
            }
            RatingPolicy::PlaytimeWeighted => {
                let (weighted, minutes) =
                    game.ratings
                        .iter()
                        .fold((0u64, 0u64), |(weighted, minutes), rating| {
                            let played = game.play_minutes(&rating.user_id) as u64;
                            (weighted + rating.rating as u64 * played, minutes + played)
                        });
                if minutes == 0 {
                    return 0.0;
                }
                weighted as f64 / minutes as f64
            }
        };

        round2(average)
    }

    /// Recomputes every cached aggregate from the game's fact lists
    pub fn aggregate(&self, game: &GameModel) -> GameAggregates {
        GameAggregates {
            average_rating: self.average(game),
            total_play_time: game.sum_minutes(),
        }
    }
}

/// Recomputes and persists a game's cached aggregates after its facts change
#[derive(Clone)]
pub struct RatingAggregator {
    games: Arc<dyn GameRepository>,
    policy: RatingPolicy,
}

impl RatingAggregator {
    pub fn new(games: Arc<dyn GameRepository>, policy: RatingPolicy) -> Self {
        Self { games, policy }
    }

    /// Returns `None` when the game no longer exists.
    ///
    /// The write is a compare-and-set on the game's revision. When it loses a
    /// race the game is re-read and recomputed; if every attempt loses, the
    /// mutation that won will run its own refresh.
    #[instrument(skip(self))]
    pub async fn refresh(&self, game_id: &str) -> Result<Option<GameAggregates>, AppError> {
        let mut latest = None;

        for attempt in 1..=MAX_RECOMPUTE_ATTEMPTS {
            let Some(game) = self.games.get_game(game_id).await? else {
                return Ok(None);
            };

            let aggregates = self.policy.aggregate(&game);
            latest = Some(aggregates);

            match self
                .games
                .store_aggregates(game_id, aggregates, game.revision)
                .await?
            {
                StoreAggregates::Stored => {
                    debug!(
                        game_id = %game_id,
                        average_rating = aggregates.average_rating,
                        total_play_time = aggregates.total_play_time,
                        "Aggregates stored"
                    );
                    return Ok(Some(aggregates));
                }
                StoreAggregates::Stale { current_revision } => {
                    debug!(
                        game_id = %game_id,
                        attempt,
                        expected = game.revision,
                        current_revision,
                        "Aggregates stale, recomputing"
                    );
                }
                StoreAggregates::GameNotFound => return Ok(None),
            }
        }

        warn!(game_id = %game_id, "Gave up storing aggregates after repeated races");
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::repository::InMemoryGameRepository;
    use rstest::rstest;
    use std::str::FromStr;

    fn game_with(ratings: &[(&str, u8, u32)]) -> GameModel {
        let mut game = GameModel::new("Portal".into(), "Puzzle".into(), true);
        for (user, score, minutes) in ratings {
            game.merge_play(user, *minutes);
            game.upsert_rating(user, *score);
        }
        game
    }

    #[rstest]
    #[case(&[], 0.0)]
    #[case(&[("a", 3, 60), ("b", 5, 60)], 4.0)]
    #[case(&[("a", 5, 60)], 5.0)]
    #[case(&[("a", 1, 60), ("b", 2, 60), ("c", 2, 60)], 1.67)]
    fn test_simple_mean(#[case] ratings: &[(&str, u8, u32)], #[case] expected: f64) {
        let game = game_with(ratings);

        assert_eq!(RatingPolicy::SimpleMean.average(&game), expected);
    }

    #[rstest]
    #[case(&[], 0.0)]
    #[case(&[("a", 3, 60), ("b", 5, 60)], 4.0)]
    #[case(&[("a", 2, 90), ("b", 5, 30)], 2.75)] // (2*90 + 5*30) / 120
    #[case(&[("a", 4, 0)], 0.0)] // No playtime to weight by
    fn test_playtime_weighted_mean(#[case] ratings: &[(&str, u8, u32)], #[case] expected: f64) {
        let game = game_with(ratings);

        assert_eq!(RatingPolicy::PlaytimeWeighted.average(&game), expected);
    }

    #[test]
    fn test_aggregate_sums_minutes() {
        let game = game_with(&[("a", 3, 90), ("b", 5, 30)]);

        let aggregates = RatingPolicy::SimpleMean.aggregate(&game);

        assert_eq!(aggregates.total_play_time, 120);
        assert_eq!(aggregates.average_rating, 4.0);
    }

    #[test]
    fn test_policy_parses_from_config_value() {
        assert_eq!(
            RatingPolicy::from_str("simple_mean").unwrap(),
            RatingPolicy::SimpleMean
        );
        assert_eq!(
            RatingPolicy::from_str("playtime_weighted").unwrap(),
            RatingPolicy::PlaytimeWeighted
        );
        assert!(RatingPolicy::from_str("median").is_err());
        assert_eq!(RatingPolicy::PlaytimeWeighted.to_string(), "playtime_weighted");
    }

    #[tokio::test]
    async fn test_refresh_persists_aggregates() {
        let game = game_with(&[("a", 3, 60), ("b", 5, 60)]);
        let game_id = game.id.clone();
        let repo = Arc::new(InMemoryGameRepository::with_games(vec![game]));
        let aggregator = RatingAggregator::new(repo.clone(), RatingPolicy::SimpleMean);

        let aggregates = aggregator.refresh(&game_id).await.unwrap().unwrap();

        let stored = repo.get_game(&game_id).await.unwrap().unwrap();
        assert_eq!(aggregates.average_rating, 4.0);
        assert_eq!(stored.average_rating, 4.0);
        assert_eq!(stored.total_play_time, 120);
    }

    #[tokio::test]
    async fn test_refresh_missing_game() {
        let repo = Arc::new(InMemoryGameRepository::new());
        let aggregator = RatingAggregator::new(repo, RatingPolicy::SimpleMean);

        assert!(aggregator.refresh("missing").await.unwrap().is_none());
    }
}
