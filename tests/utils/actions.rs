#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestSetup {
    /// Send a request through the full router
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        idempotency_key: Option<&str>,
        body: Option<Value>,
    ) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = idempotency_key {
            builder = builder.header("idempotency-key", key);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        ApiResponse { status, body }
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn play(&self, user: &str, game: &str, minutes: i64, key: &str) -> ApiResponse {
        let uri = format!(
            "/api/users/{}/play/{}?minutes={}",
            self.user_id(user),
            self.game_id(game),
            minutes
        );
        self.send("POST", &uri, Some(key), None).await
    }

    pub async fn rate(&self, user: &str, game: &str, rating: i64) -> ApiResponse {
        let uri = format!(
            "/api/users/{}/rate/{}?rating={}",
            self.user_id(user),
            self.game_id(game),
            rating
        );
        self.send("POST", &uri, None, None).await
    }

    pub async fn comment(&self, user: &str, game: &str, content: &str, key: &str) -> ApiResponse {
        let uri = format!("/api/games/{}/comments", self.game_id(game));
        let body = serde_json::json!({ "user_id": self.user_id(user), "content": content });
        self.send("POST", &uri, Some(key), Some(body)).await
    }

    pub async fn remove_rating(&self, user: &str, game: &str) -> ApiResponse {
        let uri = format!(
            "/api/games/{}/ratings/{}",
            self.game_id(game),
            self.user_id(user)
        );
        self.send("DELETE", &uri, None, None).await
    }

    pub async fn delete_user(&self, user: &str) -> ApiResponse {
        let uri = format!("/api/users/{}", self.user_id(user));
        self.send("DELETE", &uri, None, None).await
    }

    pub async fn summary(&self, user: &str) -> ApiResponse {
        let uri = format!("/api/users/{}/summary", self.user_id(user));
        self.send("GET", &uri, None, None).await
    }

    pub async fn game(&self, game: &str) -> ApiResponse {
        let uri = format!("/api/games/{}", self.game_id(game));
        self.send("GET", &uri, None, None).await
    }
}
