use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{models::UserModel, repository::UserRepository};
use crate::shared::AppError;

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Registers a user. Usernames are unique.
    #[instrument(skip(self, email))]
    pub async fn create_user(&self, username: &str, email: &str) -> Result<UserModel, AppError> {
        let username = username.trim();
        let email = email.trim();

        if username.is_empty() {
            return Err(AppError::InvalidInput(
                "Username cannot be empty".to_string(),
            ));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::InvalidInput("Email is invalid".to_string()));
        }

        let user = UserModel::new(username.to_string(), email.to_string());
        self.users.create_user(&user).await?;

        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserModel, AppError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<UserModel, AppError> {
        self.users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
    }

    pub async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        let users = self.users.list_users().await?;
        debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn set_comments_enabled(
        &self,
        user_id: &str,
        enabled: bool,
    ) -> Result<UserModel, AppError> {
        let user = self
            .users
            .set_comments_enabled(user_id, enabled)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        info!(enabled, "Comment permission updated");
        Ok(user)
    }
}
