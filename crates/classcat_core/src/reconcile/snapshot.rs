//! Read-only view of one owner's catalog.

use crate::model::class_type::ClassType;
use crate::model::exercise::Exercise;
use crate::repo::catalog_repo::{CatalogRepoResult, CatalogRepository};
use log::debug;
use serde::Serialize;

/// One class type with its exercises in creation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassTypeSnapshot {
    pub class_type: ClassType,
    pub exercises: Vec<Exercise>,
}

/// Class types of one owner in creation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSnapshot {
    pub owner_id: String,
    pub class_types: Vec<ClassTypeSnapshot>,
}

impl CatalogSnapshot {
    pub fn exercise_count(&self) -> usize {
        self.class_types
            .iter()
            .map(|entry| entry.exercises.len())
            .sum()
    }
}

/// Reads the current catalog of `owner_id`.
pub fn read_snapshot<R: CatalogRepository>(
    repo: &R,
    owner_id: &str,
) -> CatalogRepoResult<CatalogSnapshot> {
    let mut class_types = Vec::new();
    for class_type in repo.list_class_types(owner_id)? {
        let exercises = repo.list_exercises(&class_type.id)?;
        class_types.push(ClassTypeSnapshot {
            class_type,
            exercises,
        });
    }

    let snapshot = CatalogSnapshot {
        owner_id: owner_id.to_string(),
        class_types,
    };
    debug!(
        "event=snapshot_read module=reconcile status=ok class_types={} exercises={}",
        snapshot.class_types.len(),
        snapshot.exercise_count()
    );
    Ok(snapshot)
}
