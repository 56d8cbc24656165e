use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{commands::Keyword, models::Category};

#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid user ID: {0:?}")]
    InvalidOwner(String),

    #[error("invalid title: {0:?}")]
    InvalidTitle(String),

    #[error("invalid category option: {0}")]
    InvalidCategory(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("rating {rating} is outside the allowed range")]
    RatingOutOfRange { rating: i32, min: Option<i32>, max: Option<i32> },
}

#[derive(Debug, thiserror::Error)]
pub enum WatchlistError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no entry titled {title:?} found")]
    NotFound { title: String, category: Option<Category> },

    #[error("{title:?} ({category}) is already on the watchlist")]
    DuplicateKey { title: String, category: Category },

    #[error("{title:?} matches more than one category")]
    AmbiguousMatch { title: String, categories: Vec<Category> },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

pub type WatchlistResult<T> = Result<T, WatchlistError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("not enough arguments: {keyword}")]
    NotEnoughArguments { keyword: Keyword },

    #[error("invalid rating: {0:?}")]
    InvalidRating(String),

    #[error("rating out of range: {0}")]
    RatingOverflow(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no unwatched entries to choose from")]
    NothingToChoose { watchlist_empty: bool },

    #[error(transparent)]
    Watchlist(#[from] WatchlistError),
}

impl CommandError {
    /// Failures caused by the backing store rather than by the user's input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CommandError::Watchlist(WatchlistError::Database(_) | WatchlistError::Timeout(_))
        )
    }
}
