use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocvecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("{0}")]
    Other(String),
}
