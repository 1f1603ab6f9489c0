//! Entity kinds of the reconciled graph and keys that identify one row.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Tables touched by reconciliation, parents first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ClassType,
    Exercise,
    Routine,
    CalendarEvent,
    Program,
    RoutineExercise,
}

impl EntityKind {
    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::ClassType => "class_types",
            Self::Exercise => "exercises",
            Self::Routine => "routines",
            Self::CalendarEvent => "calendar_events",
            Self::Program => "programs",
            Self::RoutineExercise => "routine_exercises",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ClassType => "class_type",
            Self::Exercise => "exercise",
            Self::Routine => "routine",
            Self::CalendarEvent => "calendar_event",
            Self::Program => "program",
            Self::RoutineExercise => "routine_exercise",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies the row (by id) or canonical entry (by name) an action targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub key: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    pub fn class_type(key: impl Into<String>) -> Self {
        Self::new(EntityKind::ClassType, key)
    }

    pub fn exercise(key: impl Into<String>) -> Self {
        Self::new(EntityKind::Exercise, key)
    }
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}
