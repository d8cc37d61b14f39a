#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("Init error: {0}")]
    Init(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed responded with status {0}")]
    Status(u16),

    #[error("Deserialize error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

pub type FeedResult<T> = Result<T, FeedError>;
