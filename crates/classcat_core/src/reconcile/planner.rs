//! Pure planning: canonical spec + snapshot -> explicit action lists.
//!
//! # Responsibility
//! - Decide which class types and exercises are kept, removed or created.
//! - Resolve duplicate and drifted rows deterministically by creation order.
//!
//! # Invariants
//! - Planning never touches the store; it only reads the snapshot.
//! - Per canonical class type, `kept + created == canonical exercise count`.
//! - An existing row appears in at most one action list.

use crate::model::class_type::ClassTypeId;
use crate::model::entity::EntityKind;
use crate::model::exercise::ExerciseId;
use crate::model::naming::name_key;
use crate::reconcile::report::ReconciliationReport;
use crate::reconcile::snapshot::{CatalogSnapshot, ClassTypeSnapshot};
use crate::spec::{CanonicalSpec, ClassTypeSpec, ExerciseSpec, SpecValidationError};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Caller-supplied knobs for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Class type names to retain. When set, every other class type of the
    /// owner is removed with its dependents. When `None`, no class type is
    /// removed except duplicates of canonical names.
    pub keep_list: Option<Vec<String>>,
}

impl ReconcileOptions {
    pub fn with_keep_list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keep_list: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Rejects blank keep-list entries and keep lists that would drop a
    /// canonical class type.
    pub fn validate(&self, spec: &CanonicalSpec) -> Result<(), SpecValidationError> {
        let Some(keep_list) = self.keep_list.as_ref() else {
            return Ok(());
        };
        if let Some(position) = keep_list.iter().position(|name| name_key(name).is_empty()) {
            return Err(SpecValidationError::BlankKeepListName { position });
        }

        let keep_keys = self.keep_keys().unwrap_or_default();
        for class_type in &spec.class_types {
            if !keep_keys.contains(&name_key(&class_type.name)) {
                return Err(SpecValidationError::CanonicalNotRetained(
                    class_type.name.trim().to_string(),
                ));
            }
        }
        Ok(())
    }

    fn keep_keys(&self) -> Option<HashSet<String>> {
        self.keep_list
            .as_ref()
            .map(|names| names.iter().map(|name| name_key(name)).collect())
    }
}

/// Why an existing row is scheduled for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// A later-created row sharing the name key of a kept row.
    Duplicate,
    /// Class type absent from the supplied keep list.
    NotRetained,
    /// Exercise beyond the canonical count for its class type.
    Excess,
}

/// Class type an exercise create targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassTypeRef {
    Existing(ClassTypeId),
    /// Created earlier in the same run; resolved by canonical name.
    Planned(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassTypeCreate {
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassTypeKeep {
    pub id: ClassTypeId,
    pub name: String,
    /// `false` for rows retained only through the keep list.
    pub canonical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassTypeRemoval {
    pub id: ClassTypeId,
    pub name: String,
    pub reason: RemovalReason,
    /// Exercises the snapshot holds under this class type.
    pub exercise_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseKeep {
    pub id: ExerciseId,
    pub name: String,
    pub class_type_id: ClassTypeId,
    /// Canonical entry this row stands for.
    pub canonical_name: String,
    /// Kept by promotion rather than by name match.
    pub promoted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseRemoval {
    pub id: ExerciseId,
    pub name: String,
    pub class_type_id: ClassTypeId,
    pub reason: RemovalReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseCreate {
    pub class_type: ClassTypeRef,
    pub class_type_name: String,
    pub spec: ExerciseSpec,
}

/// Explicit action lists for one owner, computed before any mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationPlan {
    pub owner_id: String,
    pub class_type_creates: Vec<ClassTypeCreate>,
    pub class_type_keeps: Vec<ClassTypeKeep>,
    pub class_type_removals: Vec<ClassTypeRemoval>,
    pub exercise_keeps: Vec<ExerciseKeep>,
    pub exercise_removals: Vec<ExerciseRemoval>,
    pub exercise_creates: Vec<ExerciseCreate>,
}

impl ReconciliationPlan {
    fn empty(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            class_type_creates: Vec::new(),
            class_type_keeps: Vec::new(),
            class_type_removals: Vec::new(),
            exercise_keeps: Vec::new(),
            exercise_removals: Vec::new(),
            exercise_creates: Vec::new(),
        }
    }

    /// True when executing the plan would change nothing.
    pub fn is_noop(&self) -> bool {
        self.class_type_creates.is_empty()
            && self.class_type_removals.is_empty()
            && self.exercise_removals.is_empty()
            && self.exercise_creates.is_empty()
    }

    /// Report the plan would produce for class types and exercises.
    ///
    /// Dependent tables are not part of the snapshot, so their counts stay zero.
    pub fn projected_report(&self) -> ReconciliationReport {
        let mut report = ReconciliationReport::new(self.owner_id.as_str());

        let class_types = report.counts_mut(EntityKind::ClassType);
        class_types.created = self.class_type_creates.len();
        class_types.kept = self.class_type_keeps.len();
        class_types.removed = self.class_type_removals.len();

        let cascaded: usize = self
            .class_type_removals
            .iter()
            .map(|removal| removal.exercise_count)
            .sum();
        let exercises = report.counts_mut(EntityKind::Exercise);
        exercises.created = self.exercise_creates.len();
        exercises.kept = self.exercise_keeps.len();
        exercises.removed = self.exercise_removals.len() + cascaded;

        report
    }
}

/// One existing exercise paired with the canonical entry it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeptSlot {
    /// Index into the existing rows.
    pub existing: usize,
    /// Index into the canonical names.
    pub canonical: usize,
    pub promoted: bool,
}

/// Keep/remove/create partition of one class type's exercises.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExercisePartition {
    /// Sorted by existing index.
    pub keep: Vec<KeptSlot>,
    /// Existing indexes, creation order.
    pub remove: Vec<usize>,
    /// Canonical indexes, canonical order.
    pub create: Vec<usize>,
}

/// Partitions existing exercises (creation order) against canonical names.
///
/// Name matches are claimed first, each canonical name at most once. When
/// fewer than `canonical.len()` rows matched, the earliest unmatched rows are
/// promoted and paired with the unclaimed canonical names in order; whatever
/// is left over becomes creates (canonical side) or removes (existing side).
pub fn partition_exercises<C, E>(canonical: &[C], existing: &[E]) -> ExercisePartition
where
    C: AsRef<str>,
    E: AsRef<str>,
{
    let canonical_keys: Vec<String> = canonical
        .iter()
        .map(|name| name_key(name.as_ref()))
        .collect();
    let mut claimed = vec![false; canonical_keys.len()];
    let mut keep = Vec::new();
    let mut provisional = Vec::new();

    for (index, name) in existing.iter().enumerate() {
        let key = name_key(name.as_ref());
        let slot = (0..canonical_keys.len()).find(|&c| !claimed[c] && canonical_keys[c] == key);
        match slot {
            Some(canonical) => {
                claimed[canonical] = true;
                keep.push(KeptSlot {
                    existing: index,
                    canonical,
                    promoted: false,
                });
            }
            None => provisional.push(index),
        }
    }

    let unclaimed: Vec<usize> = (0..canonical_keys.len()).filter(|&c| !claimed[c]).collect();
    let promotions = unclaimed.len().min(provisional.len());
    for (&canonical, &existing) in unclaimed.iter().zip(provisional.iter()) {
        keep.push(KeptSlot {
            existing,
            canonical,
            promoted: true,
        });
    }
    keep.sort_by_key(|slot| slot.existing);

    ExercisePartition {
        keep,
        remove: provisional[promotions..].to_vec(),
        create: unclaimed[promotions..].to_vec(),
    }
}

/// Computes the full plan for one owner.
///
/// Expects `spec` and `options` to be validated already.
pub fn plan_reconciliation(
    spec: &CanonicalSpec,
    snapshot: &CatalogSnapshot,
    options: &ReconcileOptions,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::empty(&snapshot.owner_id);

    let mut groups: HashMap<String, Vec<&ClassTypeSnapshot>> = HashMap::new();
    for entry in &snapshot.class_types {
        groups
            .entry(name_key(&entry.class_type.name))
            .or_default()
            .push(entry);
    }

    let mut handled: HashSet<&str> = HashSet::new();
    for class_spec in &spec.class_types {
        let rows = groups
            .get(&name_key(&class_spec.name))
            .map(Vec::as_slice)
            .unwrap_or_default();
        match rows.split_first() {
            Some((first, duplicates)) => {
                plan.class_type_keeps.push(ClassTypeKeep {
                    id: first.class_type.id.clone(),
                    name: first.class_type.name.clone(),
                    canonical: true,
                });
                plan_exercises(&mut plan, class_spec, first);
                handled.insert(first.class_type.id.as_str());

                for duplicate in duplicates {
                    plan.class_type_removals
                        .push(removal_of(duplicate, RemovalReason::Duplicate));
                    handled.insert(duplicate.class_type.id.as_str());
                }
            }
            None => {
                plan.class_type_creates.push(ClassTypeCreate {
                    name: class_spec.name.trim().to_string(),
                    description: class_spec.description.clone(),
                    is_default: class_spec.is_default,
                });
                let target = ClassTypeRef::Planned(class_spec.name.trim().to_string());
                for exercise in &class_spec.exercises {
                    plan.exercise_creates.push(ExerciseCreate {
                        class_type: target.clone(),
                        class_type_name: class_spec.name.trim().to_string(),
                        spec: exercise.clone(),
                    });
                }
            }
        }
    }

    if let Some(keep_keys) = options.keep_keys() {
        for entry in &snapshot.class_types {
            if handled.contains(entry.class_type.id.as_str()) {
                continue;
            }
            let key = name_key(&entry.class_type.name);
            let earliest_of_group = groups
                .get(&key)
                .and_then(|rows| rows.first())
                .is_some_and(|first| first.class_type.id == entry.class_type.id);

            if !keep_keys.contains(&key) {
                plan.class_type_removals
                    .push(removal_of(entry, RemovalReason::NotRetained));
            } else if earliest_of_group {
                plan.class_type_keeps.push(ClassTypeKeep {
                    id: entry.class_type.id.clone(),
                    name: entry.class_type.name.clone(),
                    canonical: false,
                });
            } else {
                plan.class_type_removals
                    .push(removal_of(entry, RemovalReason::Duplicate));
            }
        }
    }

    plan
}

fn plan_exercises(
    plan: &mut ReconciliationPlan,
    class_spec: &ClassTypeSpec,
    existing: &ClassTypeSnapshot,
) {
    let canonical_names: Vec<&str> = class_spec
        .exercises
        .iter()
        .map(|exercise| exercise.name.as_str())
        .collect();
    let existing_names: Vec<&str> = existing
        .exercises
        .iter()
        .map(|exercise| exercise.name.as_str())
        .collect();
    let partition = partition_exercises(&canonical_names, &existing_names);
    let class_type_id = &existing.class_type.id;

    for slot in &partition.keep {
        let row = &existing.exercises[slot.existing];
        plan.exercise_keeps.push(ExerciseKeep {
            id: row.id.clone(),
            name: row.name.clone(),
            class_type_id: class_type_id.clone(),
            canonical_name: class_spec.exercises[slot.canonical].name.clone(),
            promoted: slot.promoted,
        });
    }

    for &index in &partition.remove {
        let row = &existing.exercises[index];
        plan.exercise_removals.push(ExerciseRemoval {
            id: row.id.clone(),
            name: row.name.clone(),
            class_type_id: class_type_id.clone(),
            reason: RemovalReason::Excess,
        });
    }

    for &index in &partition.create {
        plan.exercise_creates.push(ExerciseCreate {
            class_type: ClassTypeRef::Existing(class_type_id.clone()),
            class_type_name: class_spec.name.trim().to_string(),
            spec: class_spec.exercises[index].clone(),
        });
    }
}

fn removal_of(entry: &ClassTypeSnapshot, reason: RemovalReason) -> ClassTypeRemoval {
    ClassTypeRemoval {
        id: entry.class_type.id.clone(),
        name: entry.class_type.name.clone(),
        reason,
        exercise_count: entry.exercises.len(),
    }
}
