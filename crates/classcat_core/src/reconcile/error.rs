//! Terminal error of a reconciliation run.

use crate::db::DbError;
use crate::model::entity::EntityKey;
use crate::repo::catalog_repo::CatalogRepoError;
use crate::spec::SpecValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Every failure aborts the whole run; there is no partial success.
#[derive(Debug)]
pub enum ReconcileError {
    /// Spec, owner id or options are malformed. Raised before any store call.
    Validation(SpecValidationError),
    /// Store unreachable, busy, or failed outside a constraint check.
    Connection(DbError),
    /// A write broke referential integrity; the run was rolled back.
    ConstraintViolation { key: EntityKey, source: DbError },
    /// A planned keep/remove target disappeared before execution.
    NotFound(EntityKey),
    /// Persisted rows or schema could not be interpreted.
    InvalidData(String),
}

impl ReconcileError {
    /// Entity that triggered the failure, when one is known.
    pub fn entity_key(&self) -> Option<&EntityKey> {
        match self {
            Self::ConstraintViolation { key, .. } | Self::NotFound(key) => Some(key),
            _ => None,
        }
    }

    /// Stable short code for logs and exit reporting.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Connection(_) => "connection",
            Self::ConstraintViolation { .. } => "constraint_violation",
            Self::NotFound(_) => "not_found",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid reconcile request: {err}"),
            Self::Connection(err) => write!(f, "catalog store failure: {err}"),
            Self::ConstraintViolation { key, source } => {
                write!(f, "constraint violation on {key}: {source}")
            }
            Self::NotFound(key) => write!(f, "planned row no longer exists: {key}"),
            Self::InvalidData(message) => write!(f, "invalid catalog data: {message}"),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Connection(err) => Some(err),
            Self::ConstraintViolation { source, .. } => Some(source),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<SpecValidationError> for ReconcileError {
    fn from(value: SpecValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for ReconcileError {
    fn from(value: DbError) -> Self {
        Self::Connection(value)
    }
}

impl From<rusqlite::Error> for ReconcileError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Connection(DbError::Sqlite(value))
    }
}

impl From<CatalogRepoError> for ReconcileError {
    fn from(value: CatalogRepoError) -> Self {
        match value {
            CatalogRepoError::Db(err) => Self::Connection(err),
            CatalogRepoError::ConstraintViolation { key, source } => {
                Self::ConstraintViolation { key, source }
            }
            CatalogRepoError::NotFound(key) => Self::NotFound(key),
            CatalogRepoError::InvalidData(message) => Self::InvalidData(message),
            other @ (CatalogRepoError::MissingRequiredTable(_)
            | CatalogRepoError::MissingRequiredColumn { .. }) => {
                Self::InvalidData(other.to_string())
            }
        }
    }
}
