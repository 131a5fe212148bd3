pub mod client;
pub mod studio;

pub use client::HeartClient;
pub use studio::Studio;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error(transparent)]
    Canvas(#[from] heartdraw_canvas::CanvasError),
}

impl ClientError {
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            Self::Canvas(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
