use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus unreadable: {0}")]
    Read(#[from] std::io::Error),

    #[error("corpus malformed: {0}")]
    Format(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index not ready: {0}")]
    NotReady(String),

    #[error("persisted index unreadable: {0}")]
    Load(String),

    #[error("embedding provider failed: {0}")]
    Embedding(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid application data: {0}")]
    InvalidRecord(String),
}

pub type Result<T, E = IndexError> = std::result::Result<T, E>;
