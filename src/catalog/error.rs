use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to read feed file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid feed #{index}: {reason}")]
    InvalidFeed { index: usize, reason: String },
}
