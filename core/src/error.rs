use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no documents available to answer from")]
    NoDocuments,

    #[error("malformed {kind} record: {reason}")]
    Record { kind: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
