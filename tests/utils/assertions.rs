//! Test assertion helpers - fluent API for verifying store state
#![allow(dead_code)] // Test utilities may not all be used in every test

use game_delivery::GameModel;

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Checks both copies of one (user, game) play fact
pub struct PlayAssertion<'a> {
    setup: &'a TestSetup,
    user: &'a str,
    game: &'a str,
}

impl<'a> PlayAssertion<'a> {
    pub fn for_pair(setup: &'a TestSetup, user: &'a str, game: &'a str) -> Self {
        Self { setup, user, game }
    }

    /// Assert that the user-side and game-side copies both hold `minutes`
    pub async fn has_minutes(self, minutes: u32) -> Self {
        let user_id = self.setup.user_id(self.user);
        let game_id = self.setup.game_id(self.game);

        let user = self
            .setup
            .state
            .user_repository
            .get_user(user_id)
            .await
            .unwrap()
            .expect("user should exist");
        let game = self
            .setup
            .state
            .game_repository
            .get_game(game_id)
            .await
            .unwrap()
            .expect("game should exist");

        assert_eq!(
            user.play_minutes(game_id),
            minutes,
            "user-side copy for {}/{}",
            self.user,
            self.game
        );
        assert_eq!(
            game.play_minutes(user_id),
            minutes,
            "game-side copy for {}/{}",
            self.user,
            self.game
        );
        self
    }
}

/// Checks a game's cached aggregates and fact lists
pub struct GameAssertion {
    game: GameModel,
}

impl GameAssertion {
    pub async fn load(setup: &TestSetup, name: &str) -> Self {
        let game = setup
            .state
            .game_repository
            .get_game(setup.game_id(name))
            .await
            .unwrap()
            .expect("game should exist");
        Self { game }
    }

    pub fn has_average(self, expected: f64) -> Self {
        assert_eq!(self.game.average_rating, expected, "average rating");
        self
    }

    pub fn has_total_play_time(self, expected: u64) -> Self {
        assert_eq!(self.game.total_play_time, expected, "total play time");
        self
    }

    pub fn has_comment_count(self, expected: usize) -> Self {
        assert_eq!(self.game.comments.len(), expected, "comment count");
        self
    }

    /// Assert that no comment, rating or play fact belongs to the user
    pub fn has_no_trace_of(self, user_id: &str) -> Self {
        assert!(self.game.comments.iter().all(|c| c.user_id != user_id));
        assert!(self.game.ratings.iter().all(|r| r.user_id != user_id));
        assert!(self.game.played_users.iter().all(|p| p.user_id != user_id));
        self
    }
}
