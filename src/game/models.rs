use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repository::{CommentWrite, PurgeOutcome, StoreAggregates};

/// Stored game document
///
/// `played_users`, `ratings` and `comments` are the fact lists. `average_rating`
/// and `total_play_time` are caches derived from them and are only written
/// through [`GameModel::apply_aggregates`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameModel {
    pub id: String, // UUID v4 as string
    pub name: String,
    pub genre: String,
    pub is_feedback_enabled: bool,
    pub comments: Vec<GameComment>,
    pub ratings: Vec<GameRating>,
    pub played_users: Vec<GamePlay>, // Game-side copy of play facts
    pub average_rating: f64,
    pub total_play_time: u64,
    pub revision: u64, // Bumped on every fact list mutation
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePlay {
    pub user_id: String,
    pub minutes: u32,
    pub play_time_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRating {
    pub user_id: String,
    pub rating: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameComment {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Cached values recomputed from a game's fact lists
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GameAggregates {
    pub average_rating: f64,
    pub total_play_time: u64,
}

impl GameModel {
    /// Creates a new game model with generated ID
    pub fn new(name: String, genre: String, is_feedback_enabled: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            genre,
            is_feedback_enabled,
            comments: Vec::new(),
            ratings: Vec::new(),
            played_users: Vec::new(),
            average_rating: 0.0,
            total_play_time: 0,
            revision: 0,
            created_at: Utc::now(),
        }
    }

    pub fn play_minutes(&self, user_id: &str) -> u32 {
        self.played_users
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.minutes)
            .unwrap_or_default()
    }

    pub fn rating_for(&self, user_id: &str) -> Option<u8> {
        self.ratings
            .iter()
            .find(|r| r.user_id == user_id)
            .map(|r| r.rating)
    }

    pub fn comments_by<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a GameComment> {
        self.comments.iter().filter(move |c| c.user_id == user_id)
    }

    /// Sum of all play fact minutes
    pub fn sum_minutes(&self) -> u64 {
        self.played_users.iter().map(|p| p.minutes as u64).sum()
    }

    /// Raises the user's minutes to `total` if it is greater ("set if greater").
    /// Returns the resulting minutes.
    pub fn merge_play(&mut self, user_id: &str, total: u32) -> u32 {
        match self.played_users.iter_mut().find(|p| p.user_id == user_id) {
            Some(play) if play.minutes >= total => play.minutes,
            Some(play) => {
                play.minutes = total;
                play.play_time_hours = total / 60;
                self.revision += 1;
                total
            }
            None => {
                self.played_users.push(GamePlay {
                    user_id: user_id.to_string(),
                    minutes: total,
                    play_time_hours: total / 60,
                });
                self.revision += 1;
                total
            }
        }
    }

    /// Returns true when an existing rating was replaced
    pub fn upsert_rating(&mut self, user_id: &str, rating: u8) -> bool {
        self.revision += 1;
        match self.ratings.iter_mut().find(|r| r.user_id == user_id) {
            Some(existing) => {
                existing.rating = rating;
                true
            }
            None => {
                self.ratings.push(GameRating {
                    user_id: user_id.to_string(),
                    rating,
                });
                false
            }
        }
    }

    pub fn remove_rating(&mut self, user_id: &str) -> bool {
        let before = self.ratings.len();
        self.ratings.retain(|r| r.user_id != user_id);
        let removed = self.ratings.len() != before;
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// Appends a comment unless its id is already stored. The same id with
    /// the same author and text is a replay; anything else is a collision.
    pub fn push_comment(&mut self, comment: GameComment) -> CommentWrite {
        if let Some(stored) = self.comments.iter().find(|c| c.id == comment.id) {
            if stored.user_id == comment.user_id && stored.content == comment.content {
                return CommentWrite::Replayed(stored.clone());
            }
            return CommentWrite::IdTaken;
        }
        self.comments.push(comment);
        self.revision += 1;
        CommentWrite::Added
    }

    pub fn remove_comment(&mut self, comment_id: &str) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != comment_id);
        let removed = self.comments.len() != before;
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// Removes every comment, rating and play fact attributed to the user
    pub fn purge_user(&mut self, user_id: &str) -> PurgeOutcome {
        let comments = self.comments.len();
        let ratings = self.ratings.len();
        let plays = self.played_users.len();

        self.comments.retain(|c| c.user_id != user_id);
        self.ratings.retain(|r| r.user_id != user_id);
        self.played_users.retain(|p| p.user_id != user_id);

        let removed = PurgeOutcome::Purged {
            comments: comments - self.comments.len(),
            ratings: ratings - self.ratings.len(),
            plays: plays - self.played_users.len(),
        };

        if removed.touched() {
            self.revision += 1;
            removed
        } else {
            PurgeOutcome::Untouched
        }
    }

    /// Writes cached aggregates if no fact list changed since `expected_revision`
    pub fn apply_aggregates(
        &mut self,
        aggregates: GameAggregates,
        expected_revision: u64,
    ) -> StoreAggregates {
        if self.revision != expected_revision {
            return StoreAggregates::Stale {
                current_revision: self.revision,
            };
        }
        self.average_rating = aggregates.average_rating;
        self.total_play_time = aggregates.total_play_time;
        StoreAggregates::Stored
    }
}

impl GameComment {
    pub fn new(id: String, user_id: String, content: String) -> Self {
        Self {
            id,
            user_id,
            content,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn game() -> GameModel {
        GameModel::new("Celeste".to_string(), "Platformer".to_string(), true)
    }

    #[rstest]
    #[case(vec![30], 30)]
    #[case(vec![30, 90], 90)]
    #[case(vec![90, 30], 90)] // Out of order delivery keeps the larger total
    #[case(vec![60, 60, 60], 60)] // Replays do not add
    fn test_merge_play_is_monotonic(#[case] totals: Vec<u32>, #[case] expected: u32) {
        let mut game = game();

        for total in totals {
            game.merge_play("user-1", total);
        }

        assert_eq!(game.play_minutes("user-1"), expected);
        assert_eq!(game.played_users.len(), 1);
        assert_eq!(game.played_users[0].play_time_hours, expected / 60);
    }

    #[test]
    fn test_merge_play_only_bumps_revision_on_change() {
        let mut game = game();

        game.merge_play("user-1", 30);
        let revision = game.revision;
        game.merge_play("user-1", 20);

        assert_eq!(game.revision, revision);
    }

    #[test]
    fn test_upsert_rating_overwrites_existing() {
        let mut game = game();

        assert!(!game.upsert_rating("user-1", 2));
        assert!(game.upsert_rating("user-1", 4));

        assert_eq!(game.ratings.len(), 1);
        assert_eq!(game.rating_for("user-1"), Some(4));
    }

    #[test]
    fn test_push_comment_ignores_replayed_id() {
        let mut game = game();
        let comment = GameComment::new("c-1".into(), "user-1".into(), "Great".into());

        assert_eq!(game.push_comment(comment.clone()), CommentWrite::Added);
        let revision = game.revision;
        assert_eq!(
            game.push_comment(comment.clone()),
            CommentWrite::Replayed(comment)
        );
        assert_eq!(game.comments.len(), 1);
        assert_eq!(game.revision, revision);
    }

    #[rstest]
    #[case("user-2", "Great")]
    #[case("user-1", "Edited")]
    fn test_push_comment_rejects_reused_id(#[case] user_id: &str, #[case] content: &str) {
        let mut game = game();
        game.push_comment(GameComment::new("c-1".into(), "user-1".into(), "Great".into()));

        let write = game.push_comment(GameComment::new(
            "c-1".into(),
            user_id.to_string(),
            content.to_string(),
        ));

        assert_eq!(write, CommentWrite::IdTaken);
        assert_eq!(game.comments.len(), 1);
        assert_eq!(game.comments[0].user_id, "user-1");
    }

    #[test]
    fn test_purge_user_removes_only_that_user() {
        let mut game = game();
        game.merge_play("user-1", 90);
        game.merge_play("user-2", 30);
        game.upsert_rating("user-1", 5);
        game.upsert_rating("user-2", 1);
        game.push_comment(GameComment::new("c-1".into(), "user-1".into(), "a".into()));
        game.push_comment(GameComment::new("c-2".into(), "user-1".into(), "b".into()));
        game.push_comment(GameComment::new("c-3".into(), "user-2".into(), "c".into()));

        let outcome = game.purge_user("user-1");

        assert_eq!(
            outcome,
            PurgeOutcome::Purged {
                comments: 2,
                ratings: 1,
                plays: 1
            }
        );
        assert_eq!(game.comments.len(), 1);
        assert_eq!(game.rating_for("user-2"), Some(1));
        assert_eq!(game.sum_minutes(), 30);
        assert_eq!(game.purge_user("user-1"), PurgeOutcome::Untouched);
    }

    #[test]
    fn test_apply_aggregates_rejects_stale_revision() {
        let mut game = game();
        let revision = game.revision;
        game.upsert_rating("user-1", 5);

        let aggregates = GameAggregates {
            average_rating: 3.0,
            total_play_time: 10,
        };
        let outcome = game.apply_aggregates(aggregates, revision);

        assert_eq!(
            outcome,
            StoreAggregates::Stale {
                current_revision: revision + 1
            }
        );
        assert_eq!(game.average_rating, 0.0);

        let outcome = game.apply_aggregates(aggregates, game.revision);
        assert_eq!(outcome, StoreAggregates::Stored);
        assert_eq!(game.average_rating, 3.0);
        assert_eq!(game.total_play_time, 10);
    }
}
