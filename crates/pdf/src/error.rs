use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("gallery is empty")]
    EmptyGallery,

    #[error("failed to render pdf: {message}")]
    Render { message: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
