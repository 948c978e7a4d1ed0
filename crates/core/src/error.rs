use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid definition {id}: {reason}")]
    InvalidDefinition { id: uuid::Uuid, reason: String },
}
