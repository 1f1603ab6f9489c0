//! Transaction boundary of a reconciliation run.
//!
//! # Responsibility
//! - Validate the request before touching the store.
//! - Run snapshot, plan and execution inside one IMMEDIATE transaction.
//! - Commit on success; roll back on any error.
//!
//! # Invariants
//! - Phases only move forward: `Idle -> Planning -> Executing -> Committed | RolledBack`.
//! - No partial state is ever committed.

use crate::model::entity::{EntityKey, EntityKind};
use crate::model::naming::name_key;
use crate::reconcile::cascade::CascadeExecutor;
use crate::reconcile::creator::{CreateOutcome, IdempotentCreator};
use crate::reconcile::error::{ReconcileError, ReconcileResult};
use crate::reconcile::planner::{
    plan_reconciliation, ClassTypeRef, ReconcileOptions, ReconciliationPlan,
};
use crate::reconcile::report::ReconciliationReport;
use crate::reconcile::snapshot::read_snapshot;
use crate::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use crate::spec::{CanonicalSpec, SpecValidationError};
use log::{debug, error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Not started, or rejected before the transaction opened.
    Idle,
    Planning,
    Executing,
    Committed,
    RolledBack,
}

impl RunPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::Executing => "executing",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

impl Display for RunPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reconciliation run over an exclusively borrowed connection.
pub struct ReconcileRun<'conn> {
    conn: &'conn mut Connection,
    phase: RunPhase,
}

impl<'conn> ReconcileRun<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self {
            conn,
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Reconciles `owner_id`'s catalog to `spec`.
    ///
    /// # Side effects
    /// - Emits `reconcile` start/ok/error events with duration.
    pub fn execute(
        &mut self,
        owner_id: &str,
        spec: &CanonicalSpec,
        options: &ReconcileOptions,
    ) -> ReconcileResult<ReconciliationReport> {
        let started_at = Instant::now();
        self.phase = RunPhase::Idle;
        info!("event=reconcile module=reconcile status=start owner={owner_id}");

        let result = self.run(owner_id, spec, options);
        match &result {
            Ok(report) => info!(
                "event=reconcile module=reconcile status=ok owner={owner_id} duration_ms={} created={} removed={}",
                started_at.elapsed().as_millis(),
                report.total_created(),
                report.total_removed()
            ),
            Err(err) => error!(
                "event=reconcile module=reconcile status=error owner={owner_id} duration_ms={} phase={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                self.phase,
                err.code(),
                err
            ),
        }
        result
    }

    fn run(
        &mut self,
        owner_id: &str,
        spec: &CanonicalSpec,
        options: &ReconcileOptions,
    ) -> ReconcileResult<ReconciliationReport> {
        validate_request(owner_id, spec, options)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        match plan_and_execute(&tx, &mut self.phase, owner_id, spec, options) {
            Ok(report) => match tx.commit() {
                Ok(()) => {
                    set_phase(&mut self.phase, RunPhase::Committed);
                    Ok(report)
                }
                Err(err) => {
                    set_phase(&mut self.phase, RunPhase::RolledBack);
                    Err(err.into())
                }
            },
            Err(err) => {
                // Dropping an uncommitted transaction rolls it back.
                drop(tx);
                set_phase(&mut self.phase, RunPhase::RolledBack);
                Err(err)
            }
        }
    }
}

/// Reconciles `owner_id`'s catalog to `spec` in one atomic run.
pub fn reconcile(
    conn: &mut Connection,
    owner_id: &str,
    spec: &CanonicalSpec,
    options: &ReconcileOptions,
) -> ReconcileResult<ReconciliationReport> {
    ReconcileRun::new(conn).execute(owner_id, spec, options)
}

/// Computes the plan a run would execute, without changing the store.
pub fn preview(
    conn: &Connection,
    owner_id: &str,
    spec: &CanonicalSpec,
    options: &ReconcileOptions,
) -> ReconcileResult<ReconciliationPlan> {
    validate_request(owner_id, spec, options)?;

    // Deferred read transaction keeps the snapshot consistent; dropped unused.
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let repo = SqliteCatalogRepository::try_new(&tx)?;
    let snapshot = read_snapshot(&repo, owner_id)?;
    let plan = plan_reconciliation(spec, &snapshot, options);
    info!(
        "event=reconcile_preview module=reconcile status=ok owner={owner_id} noop={}",
        plan.is_noop()
    );
    Ok(plan)
}

fn validate_request(
    owner_id: &str,
    spec: &CanonicalSpec,
    options: &ReconcileOptions,
) -> Result<(), SpecValidationError> {
    if owner_id.trim().is_empty() {
        return Err(SpecValidationError::BlankOwnerId);
    }
    spec.validate()?;
    options.validate(spec)
}

fn plan_and_execute(
    conn: &Connection,
    phase: &mut RunPhase,
    owner_id: &str,
    spec: &CanonicalSpec,
    options: &ReconcileOptions,
) -> ReconcileResult<ReconciliationReport> {
    set_phase(phase, RunPhase::Planning);
    let repo = SqliteCatalogRepository::try_new(conn)?;
    let snapshot = read_snapshot(&repo, owner_id)?;
    let plan = plan_reconciliation(spec, &snapshot, options);

    set_phase(phase, RunPhase::Executing);
    execute_plan(&repo, &plan)
}

/// Applies `plan` in dependency-safe order and tallies the report.
pub fn execute_plan<R: CatalogRepository>(
    repo: &R,
    plan: &ReconciliationPlan,
) -> ReconcileResult<ReconciliationReport> {
    let mut report = ReconciliationReport::new(plan.owner_id.as_str());
    let cascade = CascadeExecutor::new(repo);
    let creator = IdempotentCreator::new(repo, plan.owner_id.as_str());

    for keep in &plan.class_type_keeps {
        if !repo.class_type_exists(&keep.id)? {
            return Err(ReconcileError::NotFound(EntityKey::class_type(
                keep.id.as_str(),
            )));
        }
        report.class_types.kept += 1;
    }
    for keep in &plan.exercise_keeps {
        if !repo.exercise_exists(&keep.id)? {
            return Err(ReconcileError::NotFound(EntityKey::exercise(
                keep.id.as_str(),
            )));
        }
        report.exercises.kept += 1;
    }

    let mut planned_class_types: HashMap<String, String> = HashMap::new();
    for create in &plan.class_type_creates {
        let outcome = creator.create_class_type(create)?;
        tally(&mut report, EntityKind::ClassType, &outcome);
        planned_class_types.insert(name_key(&create.name), outcome.id().to_string());
    }

    for removal in &plan.exercise_removals {
        cascade.remove_exercise(&removal.id)?.apply_to(&mut report);
    }
    for removal in &plan.class_type_removals {
        cascade.remove_class_type(&removal.id)?.apply_to(&mut report);
    }

    for create in &plan.exercise_creates {
        let class_type_id = match &create.class_type {
            ClassTypeRef::Existing(id) => id.as_str(),
            ClassTypeRef::Planned(name) => planned_class_types
                .get(&name_key(name))
                .map(String::as_str)
                .ok_or_else(|| {
                    ReconcileError::InvalidData(format!(
                        "exercise `{}` targets class type `{name}` which the plan never created",
                        create.spec.name
                    ))
                })?,
        };
        let outcome = creator.create_exercise(class_type_id, &create.spec)?;
        tally(&mut report, EntityKind::Exercise, &outcome);
    }

    Ok(report)
}

fn tally(report: &mut ReconciliationReport, kind: EntityKind, outcome: &CreateOutcome) {
    let counts = report.counts_mut(kind);
    if outcome.was_created() {
        counts.created += 1;
    } else {
        counts.kept += 1;
    }
}

fn set_phase(phase: &mut RunPhase, next: RunPhase) {
    debug!(
        "event=reconcile_phase module=reconcile from={} phase={}",
        phase, next
    );
    *phase = next;
}
