#![allow(dead_code)]

use classcat_core::{default_catalog, CanonicalSpec};
use rusqlite::types::Value;
use rusqlite::{params, Connection};

pub const OWNER: &str = "owner-1";

pub const TABLES: [&str; 6] = [
    "class_types",
    "exercises",
    "routines",
    "routine_exercises",
    "calendar_events",
    "programs",
];

pub fn seed_class_type(conn: &Connection, id: &str, name: &str, created_at: i64) {
    seed_class_type_for(conn, OWNER, id, name, created_at);
}

pub fn seed_class_type_for(conn: &Connection, owner: &str, id: &str, name: &str, created_at: i64) {
    conn.execute(
        "INSERT INTO class_types (id, name, is_default, user_id, created_at)
         VALUES (?1, ?2, 0, ?3, ?4);",
        params![id, name, owner, created_at],
    )
    .unwrap();
}

pub fn seed_exercise(conn: &Connection, id: &str, class_type_id: &str, name: &str, created_at: i64) {
    conn.execute(
        "INSERT INTO exercises (id, name, class_type_id, user_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![id, name, class_type_id, OWNER, created_at],
    )
    .unwrap();
}

pub fn seed_routine(conn: &Connection, id: &str, class_type_id: &str) {
    conn.execute(
        "INSERT INTO routines (id, name, class_type_id, user_id, created_at)
         VALUES (?1, ?1, ?2, ?3, 0);",
        params![id, class_type_id, OWNER],
    )
    .unwrap();
}

pub fn seed_routine_exercise(conn: &Connection, id: &str, routine_id: &str, exercise_id: &str) {
    conn.execute(
        "INSERT INTO routine_exercises (id, routine_id, exercise_id, position)
         VALUES (?1, ?2, ?3, 0);",
        params![id, routine_id, exercise_id],
    )
    .unwrap();
}

pub fn seed_calendar_event(conn: &Connection, id: &str, class_type_id: &str) {
    conn.execute(
        "INSERT INTO calendar_events (id, title, class_type_id, user_id, starts_at)
         VALUES (?1, ?1, ?2, ?3, 0);",
        params![id, class_type_id, OWNER],
    )
    .unwrap();
}

pub fn seed_program(conn: &Connection, id: &str, class_type_id: &str) {
    conn.execute(
        "INSERT INTO programs (id, name, class_type_id, user_id)
         VALUES (?1, ?1, ?2, ?3);",
        params![id, class_type_id, OWNER],
    )
    .unwrap();
}

/// Seeds one routine, link, calendar event and program hanging off a class
/// type; the link points at `exercise_id`.
pub fn seed_dependents(conn: &Connection, class_type_id: &str, exercise_id: &str) {
    let routine_id = format!("{class_type_id}-routine");
    seed_routine(conn, &routine_id, class_type_id);
    seed_routine_exercise(
        conn,
        &format!("{class_type_id}-link"),
        &routine_id,
        exercise_id,
    );
    seed_calendar_event(conn, &format!("{class_type_id}-event"), class_type_id);
    seed_program(conn, &format!("{class_type_id}-program"), class_type_id);
}

pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

pub fn table_count(conn: &Connection, table: &str) -> i64 {
    count(conn, &format!("SELECT COUNT(*) FROM {table};"))
}

pub fn exercise_names(conn: &Connection, class_type_id: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM exercises
             WHERE class_type_id = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )
        .unwrap();
    stmt.query_map([class_type_id], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

pub fn class_type_ids_named(conn: &Connection, name: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM class_types
             WHERE lower(trim(name)) = lower(trim(?1))
             ORDER BY created_at ASC, rowid ASC;",
        )
        .unwrap();
    stmt.query_map([name], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

/// Every row of every catalog table, deterministically ordered.
pub fn dump(conn: &Connection) -> Vec<String> {
    let mut lines = Vec::new();
    for table in TABLES {
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM {table} ORDER BY id;"))
            .unwrap();
        let columns = stmt.column_count();
        let mut rows = stmt.query([]).unwrap();
        while let Some(row) = rows.next().unwrap() {
            let values: Vec<String> = (0..columns)
                .map(|index| format!("{:?}", row.get::<_, Value>(index).unwrap()))
                .collect();
            lines.push(format!("{table}|{}", values.join("|")));
        }
    }
    lines
}

pub fn foreign_key_violations(conn: &Connection) -> i64 {
    let mut stmt = conn.prepare("PRAGMA foreign_key_check;").unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut violations = 0;
    while rows.next().unwrap().is_some() {
        violations += 1;
    }
    violations
}

pub fn canonical_subset(names: &[&str]) -> CanonicalSpec {
    CanonicalSpec::new(
        names
            .iter()
            .map(|name| {
                default_catalog()
                    .class_type(name)
                    .cloned()
                    .unwrap_or_else(|| panic!("default catalog lacks {name}"))
            })
            .collect(),
    )
}
