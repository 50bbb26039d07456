use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid catalog entry `{key}`: {message}")]
    InvalidEntry { key: String, message: String },

    #[error("catalog contains no channels")]
    Empty,
}

impl Error {
    #[must_use]
    pub fn invalid_entry(key: &str, message: impl std::fmt::Display) -> Self {
        Self::InvalidEntry {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
