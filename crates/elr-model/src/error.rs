use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElrError {
    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ElrError>;
