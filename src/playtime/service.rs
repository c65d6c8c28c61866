use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::feedback::RatingAggregator;
use crate::game::models::GameModel;
use crate::game::repository::GameRepository;
use crate::shared::AppError;
use crate::user::models::UserModel;
use crate::user::repository::{PlayWrite, UserRepository};

/// One "add minutes" report. `request_id` identifies the logical request so
/// redelivery does not add the minutes twice.
#[derive(Debug, Clone)]
pub struct RecordPlaytime {
    pub user_id: String,
    pub game_id: String,
    pub minutes: i64,
    pub request_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaytimeOutcome {
    Recorded { total_minutes: u32, duplicate: bool },
    InvalidMinutes(i64),
    /// The increment would overflow the cumulative total, nothing was added
    TotalOverflow { total_minutes: u32 },
    UserNotFound,
    GameNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Converged { minutes: u32 },
    UserNotFound,
    GameNotFound,
}

/// Raises the game-side copy of the user's play fact to the user-side total
/// when it lags, then refreshes the game's aggregates. Returns the current
/// game, or `None` if it disappeared.
pub async fn converge_play(
    games: &dyn GameRepository,
    aggregator: &RatingAggregator,
    user: &UserModel,
    game: GameModel,
) -> Result<Option<GameModel>, AppError> {
    let user_minutes = user.play_minutes(&game.id);
    if user_minutes <= game.play_minutes(&user.id) {
        return Ok(Some(game));
    }

    debug!(
        user_id = %user.id,
        game_id = %game.id,
        user_minutes,
        game_minutes = game.play_minutes(&user.id),
        "Game-side play fact lagging, merging"
    );

    if games
        .merge_play(&game.id, &user.id, user_minutes)
        .await?
        .is_none()
    {
        return Ok(None);
    }
    aggregator.refresh(&game.id).await?;

    games.get_game(&game.id).await
}

/// Service for the dual-written play facts
///
/// The user document holds the authoritative copy and deduplicates by request
/// id. The game copy is only ever raised to the user-side total, so repeated
/// or reordered merges converge on the same value.
pub struct PlaytimeService {
    users: Arc<dyn UserRepository>,
    games: Arc<dyn GameRepository>,
    aggregator: RatingAggregator,
}

impl PlaytimeService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        games: Arc<dyn GameRepository>,
        aggregator: RatingAggregator,
    ) -> Self {
        Self {
            users,
            games,
            aggregator,
        }
    }

    #[instrument(skip(self, request), fields(
        user_id = %request.user_id,
        game_id = %request.game_id,
        request_id = %request.request_id
    ))]
    pub async fn record_playtime(
        &self,
        request: RecordPlaytime,
    ) -> Result<PlaytimeOutcome, AppError> {
        let minutes = match u32::try_from(request.minutes) {
            Ok(minutes) if minutes > 0 => minutes,
            _ => {
                debug!(minutes = request.minutes, "Rejected non-positive minutes");
                return Ok(PlaytimeOutcome::InvalidMinutes(request.minutes));
            }
        };

        if self.users.get_user(&request.user_id).await?.is_none() {
            return Ok(PlaytimeOutcome::UserNotFound);
        }
        if self.games.get_game(&request.game_id).await?.is_none() {
            return Ok(PlaytimeOutcome::GameNotFound);
        }

        let write = self
            .users
            .record_play(
                &request.user_id,
                &request.game_id,
                &request.request_id,
                minutes,
            )
            .await?;

        let (total_minutes, duplicate) = match write {
            PlayWrite::Applied { total_minutes } => (total_minutes, false),
            PlayWrite::Duplicate { total_minutes } => (total_minutes, true),
            PlayWrite::Overflow { total_minutes } => {
                warn!(total_minutes, minutes, "Rejected increment overflowing the total");
                return Ok(PlaytimeOutcome::TotalOverflow { total_minutes });
            }
            PlayWrite::UserNotFound => return Ok(PlaytimeOutcome::UserNotFound),
        };

        // A replay still merges: the earlier attempt may have failed here.
        if self
            .games
            .merge_play(&request.game_id, &request.user_id, total_minutes)
            .await?
            .is_none()
        {
            warn!("Game disappeared after user-side play fact was written");
            return Ok(PlaytimeOutcome::GameNotFound);
        }

        self.aggregator.refresh(&request.game_id).await?;

        info!(total_minutes, duplicate, "Playtime recorded");

        Ok(PlaytimeOutcome::Recorded {
            total_minutes,
            duplicate,
        })
    }

    /// Brings the game-side play fact up to the user-side total
    #[instrument(skip(self))]
    pub async fn reconcile_play(
        &self,
        user_id: &str,
        game_id: &str,
    ) -> Result<ReconcileOutcome, AppError> {
        let Some(user) = self.users.get_user(user_id).await? else {
            return Ok(ReconcileOutcome::UserNotFound);
        };
        let Some(game) = self.games.get_game(game_id).await? else {
            return Ok(ReconcileOutcome::GameNotFound);
        };

        match converge_play(self.games.as_ref(), &self.aggregator, &user, game).await? {
            Some(game) => Ok(ReconcileOutcome::Converged {
                minutes: game.play_minutes(user_id),
            }),
            None => Ok(ReconcileOutcome::GameNotFound),
        }
    }
}
