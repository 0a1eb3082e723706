use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Db(#[from] crate::db::DbError),
    #[error("clipboard error: {0}")]
    Clipboard(#[from] crate::clipboard::ClipboardError),
}

pub type AppResult<T> = Result<T, AppError>;
