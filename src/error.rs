//! Error type shared by the services and surfaced by the HTTP layer.

use crate::sqlite_persistence::is_constraint_violation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(anyhow::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn unauthorized() -> Self {
        ServiceError::Unauthorized("Unauthorized".to_string())
    }

    pub fn forbidden() -> Self {
        ServiceError::Forbidden("Forbidden".to_string())
    }

    pub fn not_found<T: AsRef<str>>(what: T) -> Self {
        ServiceError::NotFound(format!("{} not found", what.as_ref()))
    }

    /// HTTP status code carried by this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::BadRequest(_) => 400,
            ServiceError::Conflict(_) => 409,
            ServiceError::Internal(_) => 500,
        }
    }
}

/// Store errors become `Internal`, unless SQLite rejected the write on a
/// unique or foreign key constraint, which the caller can act upon.
impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        if is_constraint_violation(&err) {
            ServiceError::Conflict("Resource already exists or is still referenced".to_string())
        } else {
            ServiceError::Internal(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violation_becomes_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (v TEXT UNIQUE)", []).unwrap();
        conn.execute("INSERT INTO t (v) VALUES ('x')", []).unwrap();
        let err = conn
            .execute("INSERT INTO t (v) VALUES ('x')", [])
            .map_err(anyhow::Error::from)
            .unwrap_err();

        let service_error: ServiceError = err.into();
        assert_eq!(service_error.status_code(), 409);
    }

    #[test]
    fn other_store_errors_are_internal() {
        let service_error: ServiceError = anyhow::anyhow!("disk on fire").into();
        assert!(matches!(service_error, ServiceError::Internal(_)));
        assert_eq!(service_error.status_code(), 500);
    }
}
