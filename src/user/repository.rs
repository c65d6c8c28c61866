use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;
use crate::store::PgDocuments;

/// Result of applying a playtime increment to the user-side play fact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayWrite {
    /// Minutes were added, returns the new cumulative total
    Applied { total_minutes: u32 },
    /// The request id was already applied, nothing was added
    Duplicate { total_minutes: u32 },
    /// Adding the minutes would overflow the total, nothing was added
    Overflow { total_minutes: u32 },
    /// User does not exist
    UserNotFound,
}

/// Trait for user repository operations
///
/// Each method is atomic with respect to a single user document.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError>;
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError>;
    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError>;

    /// Idempotently adds minutes to the user's play fact for a game
    async fn record_play(
        &self,
        user_id: &str,
        game_id: &str,
        request_id: &str,
        minutes: u32,
    ) -> Result<PlayWrite, AppError>;

    /// Returns `None` if the user does not exist, otherwise whether an
    /// existing rating was replaced
    async fn upsert_rating(
        &self,
        user_id: &str,
        game_id: &str,
        rating: u8,
    ) -> Result<Option<bool>, AppError>;

    async fn remove_rating(&self, user_id: &str, game_id: &str) -> Result<bool, AppError>;

    async fn set_comments_enabled(
        &self,
        user_id: &str,
        enabled: bool,
    ) -> Result<Option<UserModel>, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated users
    pub fn with_users(users: Vec<UserModel>) -> Self {
        let user_map = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self {
            users: RwLock::new(user_map),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, username = %user.username, "Creating user in memory");

        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            warn!(user_id = %user.id, "User already exists in memory");
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        if users.values().any(|u| u.username == user.username) {
            warn!(username = %user.username, "Username already taken in memory");
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        users.insert(user.id.clone(), user.clone());

        debug!(user_id = %user.id, "User created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = %user_id, "Fetching user from memory");

        let users = self.users.read().await;
        let user = users.get(user_id).cloned();

        match &user {
            Some(u) => debug!(user_id = %user_id, username = %u.username, "User found in memory"),
            None => debug!(user_id = %user_id, "User not found in memory"),
        }

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        debug!("Listing all users in memory");

        let users = self.users.read().await;
        let mut user_list: Vec<UserModel> = users.values().cloned().collect();
        user_list.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(user_list)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        debug!(user_id = %user_id, "Deleting user from memory");

        let mut users = self.users.write().await;
        let removed = users.remove(user_id).is_some();
        if !removed {
            debug!(user_id = %user_id, "User not found for deletion in memory");
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn record_play(
        &self,
        user_id: &str,
        game_id: &str,
        request_id: &str,
        minutes: u32,
    ) -> Result<PlayWrite, AppError> {
        let mut users = self.users.write().await;

        let user = match users.get_mut(user_id) {
            Some(user) => user,
            None => {
                debug!(user_id = %user_id, "User not found");
                return Ok(PlayWrite::UserNotFound);
            }
        };

        let write = user.record_play(game_id, request_id, minutes);

        info!(
            user_id = %user_id,
            game_id = %game_id,
            outcome = ?write,
            "Recorded user-side play fact (atomic)"
        );

        Ok(write)
    }

    #[instrument(skip(self))]
    async fn upsert_rating(
        &self,
        user_id: &str,
        game_id: &str,
        rating: u8,
    ) -> Result<Option<bool>, AppError> {
        let mut users = self.users.write().await;
        Ok(users
            .get_mut(user_id)
            .map(|user| user.upsert_rating(game_id, rating)))
    }

    #[instrument(skip(self))]
    async fn remove_rating(&self, user_id: &str, game_id: &str) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        Ok(users
            .get_mut(user_id)
            .map(|user| user.remove_rating(game_id))
            .unwrap_or(false))
    }

    #[instrument(skip(self))]
    async fn set_comments_enabled(
        &self,
        user_id: &str,
        enabled: bool,
    ) -> Result<Option<UserModel>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(user_id).map(|user| {
            user.comments_enabled = enabled;
            user.clone()
        }))
    }
}

/// PostgreSQL implementation storing each user as a JSONB document
pub struct PostgresUserRepository {
    documents: PgDocuments,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            documents: PgDocuments::new(pool, "users"),
        }
    }

    /// Creates the users table and the unique username index
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        self.documents.ensure_schema().await?;
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS users_username_idx ON users ((doc->>'username'))",
        )
        .execute(self.documents.pool())
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, username = %user.username, "Creating user in database");

        if !self.documents.insert(&user.id, user).await? {
            warn!(user_id = %user.id, "User already exists in database");
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        self.documents.fetch(user_id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        self.documents.find_by_field("username", username).await
    }

    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        self.documents.fetch_all().await
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        self.documents.delete(user_id).await
    }

    #[instrument(skip(self))]
    async fn record_play(
        &self,
        user_id: &str,
        game_id: &str,
        request_id: &str,
        minutes: u32,
    ) -> Result<PlayWrite, AppError> {
        let write = self
            .documents
            .update(user_id, |user: &mut UserModel| {
                user.record_play(game_id, request_id, minutes)
            })
            .await?;

        Ok(write.unwrap_or(PlayWrite::UserNotFound))
    }

    async fn upsert_rating(
        &self,
        user_id: &str,
        game_id: &str,
        rating: u8,
    ) -> Result<Option<bool>, AppError> {
        self.documents
            .update(user_id, |user: &mut UserModel| {
                user.upsert_rating(game_id, rating)
            })
            .await
    }

    async fn remove_rating(&self, user_id: &str, game_id: &str) -> Result<bool, AppError> {
        let removed = self
            .documents
            .update(user_id, |user: &mut UserModel| user.remove_rating(game_id))
            .await?;
        Ok(removed.unwrap_or(false))
    }

    async fn set_comments_enabled(
        &self,
        user_id: &str,
        enabled: bool,
    ) -> Result<Option<UserModel>, AppError> {
        self.documents
            .update(user_id, |user: &mut UserModel| {
                user.comments_enabled = enabled;
                user.clone()
            })
            .await
    }
}
