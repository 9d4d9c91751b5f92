use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid convention file: {0}")]
    Convention(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
