use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("decision function failed: {0}")]
    Decider(String),

    #[error(transparent)]
    Mcp(#[from] mcp::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
