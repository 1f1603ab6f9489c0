//! Create-if-absent for canonical rows.
//!
//! # Invariants
//! - Existence is re-checked by name key right before every insert.
//! - Inserted names are trimmed canonical names; ids are fresh UUID v4.

use crate::model::class_type::ClassType;
use crate::model::exercise::Exercise;
use crate::model::{new_row_id, now_epoch_ms};
use crate::reconcile::planner::ClassTypeCreate;
use crate::repo::catalog_repo::{CatalogRepoResult, CatalogRepository};
use crate::spec::ExerciseSpec;
use log::debug;

/// Result of one create action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(String),
    /// A matching row already existed; nothing was inserted.
    Existing(String),
}

impl CreateOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Created(id) | Self::Existing(id) => id,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

pub struct IdempotentCreator<'repo, R: CatalogRepository> {
    repo: &'repo R,
    owner_id: &'repo str,
}

impl<'repo, R: CatalogRepository> IdempotentCreator<'repo, R> {
    pub fn new(repo: &'repo R, owner_id: &'repo str) -> Self {
        Self { repo, owner_id }
    }

    pub fn create_class_type(&self, action: &ClassTypeCreate) -> CatalogRepoResult<CreateOutcome> {
        if let Some(existing) = self
            .repo
            .find_class_type_by_name(self.owner_id, &action.name)?
        {
            log_create("class_types", &existing.id, "skipped");
            return Ok(CreateOutcome::Existing(existing.id));
        }

        let class_type = ClassType {
            id: new_row_id(),
            name: action.name.trim().to_string(),
            description: action.description.clone(),
            is_default: action.is_default,
            user_id: self.owner_id.to_string(),
            created_at: now_epoch_ms(),
        };
        self.repo.insert_class_type(&class_type)?;
        log_create("class_types", &class_type.id, "ok");
        Ok(CreateOutcome::Created(class_type.id))
    }

    pub fn create_exercise(
        &self,
        class_type_id: &str,
        spec: &ExerciseSpec,
    ) -> CatalogRepoResult<CreateOutcome> {
        if let Some(existing) = self.repo.find_exercise_by_name(class_type_id, &spec.name)? {
            log_create("exercises", &existing.id, "skipped");
            return Ok(CreateOutcome::Existing(existing.id));
        }

        let exercise = Exercise {
            id: new_row_id(),
            name: spec.name.trim().to_string(),
            class_type_id: Some(class_type_id.to_string()),
            user_id: self.owner_id.to_string(),
            created_at: now_epoch_ms(),
            attributes: spec.attributes.clone(),
        };
        self.repo.insert_exercise(&exercise)?;
        log_create("exercises", &exercise.id, "ok");
        Ok(CreateOutcome::Created(exercise.id))
    }
}

fn log_create(table: &str, id: &str, status: &str) {
    debug!("event=create_row module=reconcile status={status} table={table} id={id}");
}
