use crate::user::UserId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("gallery persistence failed: {message}")]
    Persistence { message: String },

    #[error("user {caller} cannot clear the gallery of user {owner}")]
    NotOwner { caller: UserId, owner: UserId },

    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
}

impl Error {
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
