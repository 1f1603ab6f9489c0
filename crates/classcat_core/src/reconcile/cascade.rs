//! Ordered dependent-row deletion.
//!
//! # Responsibility
//! - Remove one class type or exercise together with every row referencing it.
//!
//! # Invariants
//! - Children are deleted before parents; the store never sees a dangling
//!   reference, so foreign-key checks only fire on a schema the executor does
//!   not know about.
//! - Zero-row dependent deletes are fine; a zero-row target delete is
//!   `NotFound`.

use crate::model::entity::{EntityKey, EntityKind};
use crate::reconcile::report::ReconciliationReport;
use crate::repo::catalog_repo::{CatalogRepoError, CatalogRepoResult, CatalogRepository};
use log::debug;

/// Dependent tables of a class type, leaf first.
pub const CLASS_TYPE_DEPENDENT_ORDER: [EntityKind; 5] = [
    EntityKind::RoutineExercise,
    EntityKind::Exercise,
    EntityKind::Routine,
    EntityKind::CalendarEvent,
    EntityKind::Program,
];

/// Rows deleted per entity kind by one cascade, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub deleted: Vec<(EntityKind, usize)>,
}

impl CascadeOutcome {
    pub fn count(&self, kind: EntityKind) -> usize {
        self.deleted
            .iter()
            .filter(|(current, _)| *current == kind)
            .map(|(_, count)| count)
            .sum()
    }

    /// Adds every deleted count to the report's `removed` columns.
    pub fn apply_to(&self, report: &mut ReconciliationReport) {
        for &(kind, count) in &self.deleted {
            report.counts_mut(kind).removed += count;
        }
    }

    fn record(&mut self, kind: EntityKind, count: usize) {
        self.deleted.push((kind, count));
    }
}

/// Runs cascades against one repository (normally bound to a transaction).
pub struct CascadeExecutor<'repo, R: CatalogRepository> {
    repo: &'repo R,
}

impl<'repo, R: CatalogRepository> CascadeExecutor<'repo, R> {
    pub fn new(repo: &'repo R) -> Self {
        Self { repo }
    }

    /// Removes one class type and all of its dependents.
    pub fn remove_class_type(&self, class_type_id: &str) -> CatalogRepoResult<CascadeOutcome> {
        let mut outcome = CascadeOutcome::default();
        for kind in CLASS_TYPE_DEPENDENT_ORDER {
            let count = self.repo.delete_class_type_dependents(kind, class_type_id)?;
            log_delete(kind, class_type_id, count);
            outcome.record(kind, count);
        }

        let count = self.repo.delete_class_type(class_type_id)?;
        log_delete(EntityKind::ClassType, class_type_id, count);
        if count == 0 {
            return Err(CatalogRepoError::NotFound(EntityKey::class_type(
                class_type_id,
            )));
        }
        outcome.record(EntityKind::ClassType, count);
        Ok(outcome)
    }

    /// Removes one exercise and the routine links pointing at it.
    pub fn remove_exercise(&self, exercise_id: &str) -> CatalogRepoResult<CascadeOutcome> {
        let mut outcome = CascadeOutcome::default();
        let count = self.repo.delete_routine_exercises_for_exercise(exercise_id)?;
        log_delete(EntityKind::RoutineExercise, exercise_id, count);
        outcome.record(EntityKind::RoutineExercise, count);

        let count = self.repo.delete_exercise(exercise_id)?;
        log_delete(EntityKind::Exercise, exercise_id, count);
        if count == 0 {
            return Err(CatalogRepoError::NotFound(EntityKey::exercise(exercise_id)));
        }
        outcome.record(EntityKind::Exercise, count);
        Ok(outcome)
    }
}

fn log_delete(kind: EntityKind, parent_id: &str, count: usize) {
    debug!(
        "event=cascade_delete module=reconcile status=ok table={} parent={} rows={}",
        kind.table(),
        parent_id,
        count
    );
}
