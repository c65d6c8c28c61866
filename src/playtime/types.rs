use serde::{Deserialize, Serialize};

/// Query string for `POST /api/users/:user_id/play/:game_id`
#[derive(Debug, Deserialize)]
pub struct PlayQuery {
    pub minutes: i64,
}

/// Response for an accepted playtime report
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaytimeResponse {
    pub user_id: String,
    pub game_id: String,
    pub total_minutes: u32,
    pub total_hours: u32,
    pub duplicate: bool,
}

/// Response for a play fact reconciliation
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ReconcileResponse {
    pub user_id: String,
    pub game_id: String,
    pub minutes: u32,
}
