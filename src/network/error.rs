use thiserror::Error;

/// Errors that can occur while talking to a peer
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Peer {peer} rejected the {item}")]
    Rejected { peer: String, item: String },

    #[error("Invalid peer URL: {0}")]
    InvalidUrl(String),
}
