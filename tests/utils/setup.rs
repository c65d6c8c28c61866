use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;

use game_delivery::{
    build_router, AppState, GameModel, GameRepository, InMemoryGameRepository,
    InMemoryUserRepository, RatingPolicy, UserModel, UserRepository,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub app: Router,
    pub users: HashMap<String, String>, // username -> id
    pub games: HashMap<String, String>, // name -> id
}

impl TestSetup {
    pub fn user_id(&self, username: &str) -> &str {
        self.users
            .get(username)
            .unwrap_or_else(|| panic!("{} was not seeded", username))
    }

    pub fn game_id(&self, name: &str) -> &str {
        self.games
            .get(name)
            .unwrap_or_else(|| panic!("{} was not seeded", name))
    }
}

pub struct TestSetupBuilder {
    users: Vec<String>,
    games: Vec<(String, bool)>,
    rating_policy: RatingPolicy,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            games: vec![],
            rating_policy: RatingPolicy::SimpleMean,
        }
    }

    pub fn with_users(mut self, users: Vec<&str>) -> Self {
        self.users = users.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_users(self) -> Self {
        self.with_users(vec!["ada", "bob"])
    }

    /// Adds a game with feedback enabled
    pub fn with_game(mut self, name: &str) -> Self {
        self.games.push((name.to_string(), true));
        self
    }

    pub fn with_closed_game(mut self, name: &str) -> Self {
        self.games.push((name.to_string(), false));
        self
    }

    pub fn with_rating_policy(mut self, policy: RatingPolicy) -> Self {
        self.rating_policy = policy;
        self
    }

    pub async fn build(self) -> TestSetup {
        let user_repository = Arc::new(InMemoryUserRepository::new());
        let game_repository = Arc::new(InMemoryGameRepository::new());

        let mut users = HashMap::new();
        for username in &self.users {
            let user = UserModel::new(username.clone(), format!("{}@example.com", username));
            user_repository.create_user(&user).await.unwrap();
            users.insert(username.clone(), user.id);
        }

        let mut games = HashMap::new();
        for (name, enabled) in &self.games {
            let game = GameModel::new(name.clone(), "Indie".to_string(), *enabled);
            game_repository.create_game(&game).await.unwrap();
            games.insert(name.clone(), game.id);
        }

        let state = AppState::new(user_repository, game_repository, self.rating_policy);
        let app = build_router(state.clone());

        TestSetup {
            state,
            app,
            users,
            games,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
