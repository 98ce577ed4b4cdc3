use thiserror::Error;

/// Errors that can occur during repository operations.
///
/// `NotFound` and `Conflict` are expected, recoverable outcomes; callers map
/// them to their own signals and nothing in this core retries them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
    #[error("{resource} already exists: {id}")]
    Conflict { resource: &'static str, id: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store operation failed: {0}")]
    Store(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn conflict(resource: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            resource,
            id: id.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// True for the expected, recoverable outcomes.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RepositoryError::NotFound { .. } | RepositoryError::Conflict { .. }
        )
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = RepositoryError::not_found("Recipe", "abc-123");
        assert_eq!(error.to_string(), "Recipe not found: abc-123");
    }

    #[test]
    fn test_conflict_display() {
        let error = RepositoryError::conflict("ShareRequest", "share-1");
        assert_eq!(error.to_string(), "ShareRequest already exists: share-1");
    }

    #[test]
    fn test_invalid_input_display() {
        let error = RepositoryError::invalid_input("name is required");
        assert_eq!(error.to_string(), "invalid input: name is required");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(RepositoryError::not_found("Recipe", "x").is_recoverable());
        assert!(RepositoryError::conflict("Recipe", "x").is_recoverable());
        assert!(!RepositoryError::Store("timeout".to_string()).is_recoverable());
    }
}
