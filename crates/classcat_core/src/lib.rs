//! Core domain logic for classcat.
//! Reconciles an owner's fitness class types and exercises to a canonical
//! catalog inside one SQLite transaction.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod spec;

pub use config::{ClasscatConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LogSettings};
pub use model::class_type::ClassType;
pub use model::entity::{EntityKey, EntityKind};
pub use model::exercise::{DifficultyLevel, Exercise, ExerciseAttributes};
pub use reconcile::{
    preview, read_snapshot, reconcile, CatalogSnapshot, EntityCounts, ReconcileError,
    ReconcileOptions, ReconcileResult, ReconcileRun, ReconciliationPlan, ReconciliationReport,
    RunPhase,
};
pub use repo::catalog_repo::{
    CatalogRepoError, CatalogRepoResult, CatalogRepository, SqliteCatalogRepository,
};
pub use spec::{
    default_catalog, CanonicalSpec, ClassTypeSpec, ExerciseSpec, SpecError, SpecValidationError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
