use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Probe service returned status {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
