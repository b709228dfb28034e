//! Error type shared by the library and its binaries.
//!
//! Link extraction never produces one of these: malformed tags, bad
//! frontmatter and unreadable bodies degrade to partial links instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotegraphError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad configuration or an unusable vault root.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Frontmatter that is not valid YAML.
    #[error("malformed frontmatter: {0}")]
    Parse(String),

    #[error("unknown document: {0}")]
    DocumentNotFound(String),

    /// Request parameters outside their valid range.
    #[error("invalid request: {0}")]
    InvalidInput(String),

    #[error("file watcher error: {0}")]
    Watch(String),

    /// A spawned or blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, NotegraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_document_message() {
        let err = NotegraphError::DocumentNotFound("notes/a".to_string());
        assert_eq!(err.to_string(), "unknown document: notes/a");
    }

    #[test]
    fn test_io_errors_convert() {
        let err: NotegraphError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked").into();
        assert!(matches!(err, NotegraphError::Io(_)));
        assert!(err.to_string().contains("locked"));
    }

    #[tokio::test]
    async fn test_panicked_task_converts() {
        let join_err = tokio::spawn(async { panic!("boom") }).await.unwrap_err();
        let err: NotegraphError = join_err.into();
        assert!(matches!(err, NotegraphError::Task(_)));
    }
}
