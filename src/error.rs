use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Custom category name collides with a fixed or existing custom one.
    #[error("Category already exists: {0}")]
    DuplicateCategory(String),

    #[error("Category name must not be empty")]
    EmptyCategoryName,

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Re-parenting would make a folder its own ancestor.
    #[error("Moving folder {folder_id} under {parent_id} would create a cycle")]
    CycleDetected { folder_id: String, parent_id: String },

    /// Versioned save found a newer row than the one the analyst edited.
    #[error("Analysis record ({entity_id}, {category}) was modified by another save")]
    ConflictDetected { entity_id: String, category: String },

    /// Persistence collaborator failure, passed through untouched.
    #[error("Store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Store(Box::new(err))
    }
}
