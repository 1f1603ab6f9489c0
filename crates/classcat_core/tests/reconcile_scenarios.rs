mod common;

use classcat_core::reconcile::coordinator::execute_plan;
use classcat_core::{
    default_catalog, open_db_in_memory, preview, reconcile, CanonicalSpec, ClassTypeSpec,
    EntityKind, ReconcileError, ReconcileOptions, ReconcileRun, RunPhase, SpecValidationError,
    SqliteCatalogRepository,
};
use common::*;
use rusqlite::Connection;

const YOGA_POSES: [&str; 5] = [
    "Downward Facing Dog",
    "Child's Pose",
    "Warrior I",
    "Warrior II",
    "Tree Pose",
];

fn keep_all_defaults() -> ReconcileOptions {
    ReconcileOptions::with_keep_list(
        default_catalog()
            .class_types
            .iter()
            .map(|class_type| class_type.name.clone()),
    )
}

#[test]
fn empty_catalog_gets_class_type_and_all_exercises() {
    let mut conn = open_db_in_memory().unwrap();
    let spec = canonical_subset(&["Yoga"]);

    let report = reconcile(&mut conn, OWNER, &spec, &ReconcileOptions::default()).unwrap();

    assert_eq!(report.class_types.created, 1);
    assert_eq!(report.exercises.created, 5);
    assert_eq!(report.total_removed(), 0);

    let ids = class_type_ids_named(&conn, "Yoga");
    assert_eq!(ids.len(), 1);
    assert_eq!(exercise_names(&conn, &ids[0]), YOGA_POSES);

    let owner: String = conn
        .query_row("SELECT user_id FROM class_types WHERE id = ?1;", [&ids[0]], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(owner, OWNER);
}

#[test]
fn second_run_is_a_noop() {
    let mut conn = open_db_in_memory().unwrap();
    seed_class_type(&conn, "ct-box", "Boxing", 1);
    seed_exercise(&conn, "ex-jab", "ct-box", "Jab", 2);

    let first = reconcile(&mut conn, OWNER, default_catalog(), &keep_all_defaults()).unwrap();
    assert_eq!(first.class_types.removed, 1);
    let after_first = dump(&conn);

    let second = reconcile(&mut conn, OWNER, default_catalog(), &keep_all_defaults()).unwrap();
    assert!(second.is_noop(), "second run changed state: {second:?}");
    assert_eq!(second.class_types.kept, 5);
    assert_eq!(second.exercises.kept, 25);
    assert_eq!(dump(&conn), after_first);
}

#[test]
fn case_variant_duplicate_class_type_is_removed_with_dependents() {
    let mut conn = open_db_in_memory().unwrap();
    seed_class_type(&conn, "ct-spin", "Spinning", 10);
    seed_exercise(&conn, "ex-climb", "ct-spin", "Seated Climb", 11);
    seed_dependents(&conn, "ct-spin", "ex-climb");
    seed_class_type(&conn, "ct-spin-dup", "spinning", 20);
    seed_exercise(&conn, "ex-dup", "ct-spin-dup", "Jumps", 21);
    seed_dependents(&conn, "ct-spin-dup", "ex-dup");

    let spec = canonical_subset(&["Spinning"]);
    let report = reconcile(&mut conn, OWNER, &spec, &ReconcileOptions::default()).unwrap();

    assert_eq!(class_type_ids_named(&conn, "spinning"), vec!["ct-spin"]);
    assert_eq!(report.class_types.kept, 1);
    assert_eq!(report.class_types.removed, 1);
    assert_eq!(report.routines.removed, 1);
    assert_eq!(report.calendar_events.removed, 1);
    assert_eq!(report.programs.removed, 1);
    assert_eq!(report.routine_exercises.removed, 1);
    assert_eq!(report.exercises.removed, 1);
    assert_eq!(report.exercises.created, 4);

    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM routines WHERE class_type_id = 'ct-spin-dup';"),
        0
    );
    assert_eq!(table_count(&conn, "routines"), 1);
    assert_eq!(table_count(&conn, "routine_exercises"), 1);
    assert_eq!(foreign_key_violations(&conn), 0);
}

#[test]
fn keep_list_removes_unlisted_class_types_and_their_dependents() {
    let mut conn = open_db_in_memory().unwrap();
    for (index, name) in ["Yoga", "Spinning", "Pilates", "HIIT", "Strength Training"]
        .iter()
        .enumerate()
    {
        seed_class_type(&conn, &format!("ct-{index}"), name, index as i64);
    }
    for (index, name) in ["Boxing", "Rowing", "Zumba"].iter().enumerate() {
        let id = format!("ct-extra-{index}");
        seed_class_type(&conn, &id, name, 100 + index as i64);
        seed_exercise(&conn, &format!("{id}-a"), &id, "Warm Up", 200);
        seed_exercise(&conn, &format!("{id}-b"), &id, "Cool Down", 201);
        seed_dependents(&conn, &id, &format!("{id}-a"));
    }

    let report = reconcile(&mut conn, OWNER, default_catalog(), &keep_all_defaults()).unwrap();

    assert_eq!(report.class_types.removed, 3);
    assert_eq!(report.class_types.kept, 5);
    assert_eq!(report.class_types.created, 0);
    assert_eq!(report.exercises.removed, 6);
    assert_eq!(report.exercises.created, 25);
    assert_eq!(report.routines.removed, 3);
    assert_eq!(report.routine_exercises.removed, 3);
    assert_eq!(report.calendar_events.removed, 3);
    assert_eq!(report.programs.removed, 3);

    assert_eq!(table_count(&conn, "class_types"), 5);
    assert_eq!(table_count(&conn, "routines"), 0);
    assert_eq!(table_count(&conn, "programs"), 0);
    assert_eq!(foreign_key_violations(&conn), 0);
}

#[test]
fn every_canonical_class_type_converges_to_its_exercise_list() {
    let mut conn = open_db_in_memory().unwrap();
    seed_class_type(&conn, "ct-yoga", "  YOGA ", 1);
    for index in 0..8 {
        seed_exercise(&conn, &format!("ex-{index}"), "ct-yoga", "Tree Pose", 10 + index);
    }
    seed_class_type(&conn, "ct-hiit", "HIIT", 2);

    reconcile(&mut conn, OWNER, default_catalog(), &ReconcileOptions::default()).unwrap();

    for class_type in &default_catalog().class_types {
        let ids = class_type_ids_named(&conn, &class_type.name);
        assert_eq!(ids.len(), 1, "class type {} not unique", class_type.name);
        let names = exercise_names(&conn, &ids[0]);
        assert_eq!(names.len(), class_type.exercises.len());
    }
    // Surplus "Tree Pose" copies were promoted or removed, not kept twice.
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM exercises WHERE class_type_id = 'ct-yoga' AND name = 'Tree Pose';"
        ),
        5
    );
}

#[test]
fn ten_existing_with_five_matches_keeps_matches_and_removes_the_rest() {
    let mut conn = open_db_in_memory().unwrap();
    seed_class_type(&conn, "ct-yoga", "Yoga", 1);
    for (index, pose) in YOGA_POSES.iter().enumerate() {
        let at = 10 + 2 * index as i64;
        seed_exercise(&conn, &format!("stale-{index}"), "ct-yoga", &format!("Legacy {index}"), at);
        seed_exercise(&conn, &format!("match-{index}"), "ct-yoga", pose, at + 1);
    }
    seed_routine(&conn, "r-yoga", "ct-yoga");
    seed_routine_exercise(&conn, "link-stale", "r-yoga", "stale-2");
    seed_routine_exercise(&conn, "link-match", "r-yoga", "match-2");

    let spec = canonical_subset(&["Yoga"]);
    let report = reconcile(&mut conn, OWNER, &spec, &ReconcileOptions::default()).unwrap();

    assert_eq!(report.exercises.kept, 5);
    assert_eq!(report.exercises.removed, 5);
    assert_eq!(report.exercises.created, 0);
    assert_eq!(report.routine_exercises.removed, 1);
    assert_eq!(report.routines.removed, 0);

    assert_eq!(exercise_names(&conn, "ct-yoga"), YOGA_POSES);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM exercises WHERE id LIKE 'match-%';"),
        5
    );
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM routine_exercises WHERE id = 'link-match';"),
        1
    );
}

#[test]
fn drifted_exercise_names_are_promoted_and_stay_stable() {
    let mut conn = open_db_in_memory().unwrap();
    seed_class_type(&conn, "ct-yoga", "Yoga", 1);
    seed_exercise(&conn, "old-a", "ct-yoga", "Down Dog", 10);
    seed_exercise(&conn, "old-b", "ct-yoga", "Tree Pose", 11);
    seed_exercise(&conn, "old-c", "ct-yoga", "Childs Pose", 12);

    let spec = canonical_subset(&["Yoga"]);
    let plan = preview(&conn, OWNER, &spec, &ReconcileOptions::default()).unwrap();
    let promoted: Vec<&str> = plan
        .exercise_keeps
        .iter()
        .filter(|keep| keep.promoted)
        .map(|keep| keep.id.as_str())
        .collect();
    assert_eq!(promoted, vec!["old-a", "old-c"]);

    let report = reconcile(&mut conn, OWNER, &spec, &ReconcileOptions::default()).unwrap();
    assert_eq!(report.exercises.kept, 3);
    assert_eq!(report.exercises.created, 2);
    assert_eq!(report.exercises.removed, 0);
    assert_eq!(exercise_names(&conn, "ct-yoga").len(), 5);

    let rerun = reconcile(&mut conn, OWNER, &spec, &ReconcileOptions::default()).unwrap();
    assert!(rerun.is_noop());
}

#[test]
fn failure_during_execution_rolls_back_everything() {
    let mut conn = open_db_in_memory().unwrap();
    seed_class_type(&conn, "ct-yoga", "Yoga", 1);
    seed_exercise(&conn, "ex-legacy", "ct-yoga", "Legacy", 2);
    seed_class_type(&conn, "ct-box", "Boxing", 3);
    seed_exercise(&conn, "ex-jab", "ct-box", "Jab", 4);
    seed_dependents(&conn, "ct-box", "ex-jab");
    conn.execute_batch(
        "CREATE TRIGGER reject_program_delete BEFORE DELETE ON programs
         BEGIN
             SELECT RAISE(ABORT, 'injected failure');
         END;",
    )
    .unwrap();
    let before = dump(&conn);

    let spec = canonical_subset(&["Yoga"]);
    let options = ReconcileOptions::with_keep_list(["Yoga"]);
    let mut run = ReconcileRun::new(&mut conn);
    let err = run.execute(OWNER, &spec, &options).unwrap_err();

    assert_eq!(run.phase(), RunPhase::RolledBack);
    match &err {
        ReconcileError::ConstraintViolation { key, .. } => {
            assert_eq!(key.kind, EntityKind::ClassType);
            assert_eq!(key.key, "ct-box");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(dump(&conn), before);
}

#[test]
fn committed_run_reports_committed_phase() {
    let mut conn = open_db_in_memory().unwrap();
    let spec = canonical_subset(&["HIIT"]);
    let mut run = ReconcileRun::new(&mut conn);
    assert_eq!(run.phase(), RunPhase::Idle);

    run.execute(OWNER, &spec, &ReconcileOptions::default()).unwrap();
    assert_eq!(run.phase(), RunPhase::Committed);
}

#[test]
fn vanished_keep_target_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    seed_class_type(&conn, "ct-yoga", "Yoga", 1);
    for (index, pose) in YOGA_POSES.iter().enumerate() {
        seed_exercise(&conn, &format!("ex-{index}"), "ct-yoga", pose, 10 + index as i64);
    }
    let spec = canonical_subset(&["Yoga"]);
    let plan = preview(&conn, OWNER, &spec, &ReconcileOptions::default()).unwrap();
    assert!(plan.is_noop());

    conn.execute("DELETE FROM exercises WHERE id = 'ex-3';", [])
        .unwrap();

    let tx = conn.transaction().unwrap();
    let repo = SqliteCatalogRepository::try_new(&tx).unwrap();
    let err = execute_plan(&repo, &plan).unwrap_err();
    match err {
        ReconcileError::NotFound(key) => {
            assert_eq!(key.kind, EntityKind::Exercise);
            assert_eq!(key.key, "ex-3");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_requests_fail_before_touching_the_store() {
    // No schema at all: any store access would surface as a different error.
    let mut conn = Connection::open_in_memory().unwrap();
    let spec = canonical_subset(&["Yoga"]);

    let err = reconcile(&mut conn, "  ", &spec, &ReconcileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Validation(SpecValidationError::BlankOwnerId)
    ));

    let empty = CanonicalSpec::new(vec![ClassTypeSpec::with_exercise_names(
        "Yoga",
        Vec::<String>::new(),
    )]);
    let err = reconcile(&mut conn, OWNER, &empty, &ReconcileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Validation(SpecValidationError::EmptyExerciseList { .. })
    ));

    let options = ReconcileOptions::with_keep_list(["Boxing"]);
    let err = reconcile(&mut conn, OWNER, &spec, &options).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Validation(SpecValidationError::CanonicalNotRetained(_))
    ));
}

#[test]
fn other_owners_are_never_touched() {
    let mut conn = open_db_in_memory().unwrap();
    seed_class_type_for(&conn, "owner-2", "ct-other", "Boxing", 1);
    let before = count(&conn, "SELECT COUNT(*) FROM class_types WHERE user_id = 'owner-2';");

    reconcile(&mut conn, OWNER, default_catalog(), &keep_all_defaults()).unwrap();

    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM class_types WHERE user_id = 'owner-2';"),
        before
    );
}

#[test]
fn preview_matches_committed_report_and_changes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    seed_class_type(&conn, "ct-spin", "Spinning", 1);
    seed_exercise(&conn, "ex-a", "ct-spin", "Jumps", 2);
    seed_class_type(&conn, "ct-spin-2", "SPINNING", 3);
    seed_exercise(&conn, "ex-b", "ct-spin-2", "Sprint Intervals", 4);
    let before = dump(&conn);

    let spec = canonical_subset(&["Spinning", "Pilates"]);
    let plan = preview(&conn, OWNER, &spec, &ReconcileOptions::default()).unwrap();
    assert_eq!(dump(&conn), before);

    let projected = plan.projected_report();
    let report = reconcile(&mut conn, OWNER, &spec, &ReconcileOptions::default()).unwrap();
    assert_eq!(projected.class_types, report.class_types);
    assert_eq!(projected.exercises, report.exercises);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["class_types"]["created"], 1);
    assert_eq!(json["owner_id"], OWNER);
}

#[test]
fn rows_inserted_after_planning_are_reused_instead_of_duplicated() {
    let mut conn = open_db_in_memory().unwrap();
    let spec = canonical_subset(&["Yoga"]);
    let plan = preview(&conn, OWNER, &spec, &ReconcileOptions::default()).unwrap();
    assert_eq!(plan.class_type_creates.len(), 1);
    assert_eq!(plan.exercise_creates.len(), 5);

    seed_class_type(&conn, "ct-race", " yoga", 1);
    seed_exercise(&conn, "ex-race", "ct-race", "tree  pose", 2);

    let tx = conn.transaction().unwrap();
    let report = {
        let repo = SqliteCatalogRepository::try_new(&tx).unwrap();
        execute_plan(&repo, &plan).unwrap()
    };
    tx.commit().unwrap();

    assert_eq!(report.class_types.created, 0);
    assert_eq!(report.class_types.kept, 1);
    assert_eq!(report.exercises.created, 4);
    assert_eq!(report.exercises.kept, 1);

    assert_eq!(class_type_ids_named(&conn, "Yoga"), vec!["ct-race"]);
    assert_eq!(exercise_names(&conn, "ct-race").len(), 5);
    assert_eq!(table_count(&conn, "exercises"), 5);
}
