use mongodb::{bson::ser::Error as BsonError, error::Error as DbError};
use thiserror::Error;

use crate::model::mongodb::is_duplicate_key_error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(DbError),
    #[error(transparent)]
    Bson(#[from] BsonError),
    /// Every rule a question or response broke, reported together.
    #[error("Invalid parameters: {}", .0.join(" "))]
    Validation(Vec<String>),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Conflict(String),
    /// Responses that could not be moved to their new key because another
    /// response already occupies it. The rest of the batch was still processed.
    #[error("Failed to recreate {} response(s) as the new key was already in use: {}", .0.len(), .0.join(", "))]
    RecreateConflicts(Vec<String>),
    /// Data-integrity defect, never a user mistake.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Turn a list of violations into a result, succeeding iff the list is empty.
    pub fn check_violations(violations: Vec<String>) -> Result<()> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self::Validation(violations))
        }
    }
}

impl From<DbError> for Error {
    fn from(err: DbError) -> Self {
        if is_duplicate_key_error(&err) {
            Self::Conflict(err.to_string())
        } else {
            Self::Db(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_are_aggregated() {
        assert!(Error::check_violations(Vec::new()).is_ok());

        let err = Error::check_violations(vec!["First.".to_string(), "Second.".to_string()])
            .unwrap_err();
        match err {
            Error::Validation(violations) => assert_eq!(violations.len(), 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn conflicts_are_listed() {
        let err = Error::RecreateConflicts(vec!["q1%a%b".to_string(), "q1%a%c".to_string()]);
        assert_eq!(
            err.to_string(),
            "Failed to recreate 2 response(s) as the new key was already in use: q1%a%b, q1%a%c"
        );
    }
}
