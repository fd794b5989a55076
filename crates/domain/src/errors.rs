use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid ListId: {0}")]
    InvalidListId(String),

    #[error("Invalid TaskId: {0}")]
    InvalidTaskId(String),

    #[error("Invalid list name: {0}")]
    InvalidListName(String),

    #[error("Invalid task description: {0}")]
    InvalidTaskDescription(String),
}
