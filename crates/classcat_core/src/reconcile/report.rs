//! Per-entity outcome counts of a reconciliation run.

use crate::model::entity::EntityKind;
use serde::Serialize;

/// Rows created, kept and removed for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub created: usize,
    pub kept: usize,
    pub removed: usize,
}

/// Result of a committed run (or the projection of a plan).
///
/// Dependent kinds (routines, calendar events, programs, routine exercises)
/// only ever accumulate `removed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub owner_id: String,
    pub class_types: EntityCounts,
    pub exercises: EntityCounts,
    pub routines: EntityCounts,
    pub calendar_events: EntityCounts,
    pub programs: EntityCounts,
    pub routine_exercises: EntityCounts,
}

impl ReconciliationReport {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            ..Self::default()
        }
    }

    pub fn counts(&self, kind: EntityKind) -> EntityCounts {
        match kind {
            EntityKind::ClassType => self.class_types,
            EntityKind::Exercise => self.exercises,
            EntityKind::Routine => self.routines,
            EntityKind::CalendarEvent => self.calendar_events,
            EntityKind::Program => self.programs,
            EntityKind::RoutineExercise => self.routine_exercises,
        }
    }

    pub(crate) fn counts_mut(&mut self, kind: EntityKind) -> &mut EntityCounts {
        match kind {
            EntityKind::ClassType => &mut self.class_types,
            EntityKind::Exercise => &mut self.exercises,
            EntityKind::Routine => &mut self.routines,
            EntityKind::CalendarEvent => &mut self.calendar_events,
            EntityKind::Program => &mut self.programs,
            EntityKind::RoutineExercise => &mut self.routine_exercises,
        }
    }

    pub fn total_created(&self) -> usize {
        self.all_counts().map(|counts| counts.created).sum()
    }

    pub fn total_removed(&self) -> usize {
        self.all_counts().map(|counts| counts.removed).sum()
    }

    /// True when the run neither created nor removed anything.
    pub fn is_noop(&self) -> bool {
        self.total_created() == 0 && self.total_removed() == 0
    }

    fn all_counts(&self) -> impl Iterator<Item = EntityCounts> + '_ {
        [
            EntityKind::ClassType,
            EntityKind::Exercise,
            EntityKind::Routine,
            EntityKind::CalendarEvent,
            EntityKind::Program,
            EntityKind::RoutineExercise,
        ]
        .into_iter()
        .map(|kind| self.counts(kind))
    }
}
