//! Catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read class types and exercises in creation order.
//! - Insert canonical rows and delete rows together with their dependents.
//!
//! # Invariants
//! - Listing order is `created_at ASC, rowid ASC`.
//! - Name lookups compare [`name_key`]s, never raw SQL collation.
//! - Deletes touch exactly one table per call; ordering is the caller's job.

use crate::db::DbError;
use crate::model::class_type::ClassType;
use crate::model::entity::{EntityKey, EntityKind};
use crate::model::exercise::{DifficultyLevel, Exercise, ExerciseAttributes};
use crate::model::naming::name_key;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CLASS_TYPE_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    is_default,
    user_id,
    created_at
FROM class_types";

const EXERCISE_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    difficulty_level,
    equipment,
    primary_muscles,
    secondary_muscles,
    category,
    calories_per_minute,
    modifications,
    safety_notes,
    class_type_id,
    user_id,
    is_public,
    created_at
FROM exercises";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "class_types",
        &["id", "name", "description", "is_default", "user_id", "created_at"],
    ),
    (
        "exercises",
        &[
            "id",
            "name",
            "description",
            "difficulty_level",
            "equipment",
            "primary_muscles",
            "secondary_muscles",
            "category",
            "calories_per_minute",
            "modifications",
            "safety_notes",
            "class_type_id",
            "user_id",
            "is_public",
            "created_at",
        ],
    ),
    ("routines", &["id", "class_type_id"]),
    ("calendar_events", &["id", "class_type_id"]),
    ("programs", &["id", "class_type_id"]),
    ("routine_exercises", &["id", "routine_id", "exercise_id"]),
];

pub type CatalogRepoResult<T> = Result<T, CatalogRepoError>;

/// Errors from catalog persistence operations.
#[derive(Debug)]
pub enum CatalogRepoError {
    /// Transport or bootstrap failure.
    Db(DbError),
    /// A write broke referential integrity (or another SQLite constraint).
    ConstraintViolation { key: EntityKey, source: DbError },
    /// Target row is gone.
    NotFound(EntityKey),
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be decoded into a typed row.
    InvalidData(String),
}

impl Display for CatalogRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ConstraintViolation { key, source } => {
                write!(f, "constraint violation on {key}: {source}")
            }
            Self::NotFound(key) => write!(f, "catalog row not found: {key}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "catalog repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid catalog data: {message}"),
        }
    }
}

impl Error for CatalogRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ConstraintViolation { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DbError> for CatalogRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CatalogRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface over the class type / exercise graph.
pub trait CatalogRepository {
    /// Lists one owner's class types in creation order.
    fn list_class_types(&self, owner_id: &str) -> CatalogRepoResult<Vec<ClassType>>;
    /// Lists exercises attached to one class type in creation order.
    fn list_exercises(&self, class_type_id: &str) -> CatalogRepoResult<Vec<Exercise>>;
    /// Earliest class type of `owner_id` whose name key matches `name`.
    fn find_class_type_by_name(
        &self,
        owner_id: &str,
        name: &str,
    ) -> CatalogRepoResult<Option<ClassType>>;
    /// Earliest exercise under `class_type_id` whose name key matches `name`.
    fn find_exercise_by_name(
        &self,
        class_type_id: &str,
        name: &str,
    ) -> CatalogRepoResult<Option<Exercise>>;
    fn class_type_exists(&self, id: &str) -> CatalogRepoResult<bool>;
    fn exercise_exists(&self, id: &str) -> CatalogRepoResult<bool>;
    fn insert_class_type(&self, class_type: &ClassType) -> CatalogRepoResult<()>;
    fn insert_exercise(&self, exercise: &Exercise) -> CatalogRepoResult<()>;
    /// Deletes link rows pointing at one exercise.
    fn delete_routine_exercises_for_exercise(&self, exercise_id: &str) -> CatalogRepoResult<usize>;
    /// Deletes rows of a dependent table (`kind`) referencing one class type.
    fn delete_class_type_dependents(
        &self,
        kind: EntityKind,
        class_type_id: &str,
    ) -> CatalogRepoResult<usize>;
    fn delete_class_type(&self, id: &str) -> CatalogRepoResult<usize>;
    fn delete_exercise(&self, id: &str) -> CatalogRepoResult<usize>;
}

/// SQLite-backed catalog repository.
///
/// Accepts a plain connection or a `rusqlite::Transaction` (through deref).
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Creates a repository after checking the catalog tables are present.
    pub fn try_new(conn: &'conn Connection) -> CatalogRepoResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn execute_write(
        &self,
        key: EntityKey,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> CatalogRepoResult<usize> {
        self.conn
            .execute(sql, params)
            .map_err(|err| classify_write_error(err, key))
    }

    /// Deletes link rows pointing at any exercise or routine of one class type.
    fn delete_routine_exercises_for_class_type(
        &self,
        class_type_id: &str,
    ) -> CatalogRepoResult<usize> {
        self.execute_write(
            EntityKey::class_type(class_type_id),
            "DELETE FROM routine_exercises
             WHERE exercise_id IN (SELECT id FROM exercises WHERE class_type_id = ?1)
                OR routine_id IN (SELECT id FROM routines WHERE class_type_id = ?1);",
            [class_type_id],
        )
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn list_class_types(&self, owner_id: &str) -> CatalogRepoResult<Vec<ClassType>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLASS_TYPE_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([owner_id])?;
        let mut class_types = Vec::new();
        while let Some(row) = rows.next()? {
            class_types.push(parse_class_type_row(row)?);
        }
        Ok(class_types)
    }

    fn list_exercises(&self, class_type_id: &str) -> CatalogRepoResult<Vec<Exercise>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EXERCISE_SELECT_SQL}
             WHERE class_type_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([class_type_id])?;
        let mut exercises = Vec::new();
        while let Some(row) = rows.next()? {
            exercises.push(parse_exercise_row(row)?);
        }
        Ok(exercises)
    }

    fn find_class_type_by_name(
        &self,
        owner_id: &str,
        name: &str,
    ) -> CatalogRepoResult<Option<ClassType>> {
        let key = name_key(name);
        Ok(self
            .list_class_types(owner_id)?
            .into_iter()
            .find(|class_type| name_key(&class_type.name) == key))
    }

    fn find_exercise_by_name(
        &self,
        class_type_id: &str,
        name: &str,
    ) -> CatalogRepoResult<Option<Exercise>> {
        let key = name_key(name);
        Ok(self
            .list_exercises(class_type_id)?
            .into_iter()
            .find(|exercise| name_key(&exercise.name) == key))
    }

    fn class_type_exists(&self, id: &str) -> CatalogRepoResult<bool> {
        row_exists(self.conn, "class_types", id)
    }

    fn exercise_exists(&self, id: &str) -> CatalogRepoResult<bool> {
        row_exists(self.conn, "exercises", id)
    }

    fn insert_class_type(&self, class_type: &ClassType) -> CatalogRepoResult<()> {
        self.execute_write(
            EntityKey::class_type(class_type.id.as_str()),
            "INSERT INTO class_types (
                id,
                name,
                description,
                is_default,
                user_id,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                class_type.id.as_str(),
                class_type.name.as_str(),
                class_type.description.as_deref(),
                bool_to_int(class_type.is_default),
                class_type.user_id.as_str(),
                class_type.created_at,
            ],
        )?;
        Ok(())
    }

    fn insert_exercise(&self, exercise: &Exercise) -> CatalogRepoResult<()> {
        let attributes = &exercise.attributes;
        self.execute_write(
            EntityKey::exercise(exercise.id.as_str()),
            "INSERT INTO exercises (
                id,
                name,
                description,
                difficulty_level,
                equipment,
                primary_muscles,
                secondary_muscles,
                category,
                calories_per_minute,
                modifications,
                safety_notes,
                class_type_id,
                user_id,
                is_public,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
            params![
                exercise.id.as_str(),
                exercise.name.as_str(),
                attributes.description.as_deref(),
                attributes.difficulty_level.map(DifficultyLevel::as_db),
                encode_list(&attributes.equipment)?,
                encode_list(&attributes.primary_muscles)?,
                encode_list(&attributes.secondary_muscles)?,
                attributes.category.as_deref(),
                attributes.calories_per_minute,
                attributes.modifications.as_deref(),
                attributes.safety_notes.as_deref(),
                exercise.class_type_id.as_deref(),
                exercise.user_id.as_str(),
                bool_to_int(attributes.is_public),
                exercise.created_at,
            ],
        )?;
        Ok(())
    }

    fn delete_routine_exercises_for_exercise(&self, exercise_id: &str) -> CatalogRepoResult<usize> {
        self.execute_write(
            EntityKey::exercise(exercise_id),
            "DELETE FROM routine_exercises WHERE exercise_id = ?1;",
            [exercise_id],
        )
    }

    fn delete_class_type_dependents(
        &self,
        kind: EntityKind,
        class_type_id: &str,
    ) -> CatalogRepoResult<usize> {
        let table = match kind {
            EntityKind::Exercise
            | EntityKind::Routine
            | EntityKind::CalendarEvent
            | EntityKind::Program => kind.table(),
            EntityKind::RoutineExercise => {
                return self.delete_routine_exercises_for_class_type(class_type_id)
            }
            EntityKind::ClassType => {
                return Err(CatalogRepoError::InvalidData(
                    "class types are not dependents of class types".to_string(),
                ))
            }
        };
        self.execute_write(
            EntityKey::class_type(class_type_id),
            &format!("DELETE FROM {table} WHERE class_type_id = ?1;"),
            [class_type_id],
        )
    }

    fn delete_class_type(&self, id: &str) -> CatalogRepoResult<usize> {
        self.execute_write(
            EntityKey::class_type(id),
            "DELETE FROM class_types WHERE id = ?1;",
            [id],
        )
    }

    fn delete_exercise(&self, id: &str) -> CatalogRepoResult<usize> {
        self.execute_write(
            EntityKey::exercise(id),
            "DELETE FROM exercises WHERE id = ?1;",
            [id],
        )
    }
}

fn classify_write_error(err: rusqlite::Error, key: EntityKey) -> CatalogRepoError {
    let err = DbError::Sqlite(err);
    if err.is_constraint_violation() {
        CatalogRepoError::ConstraintViolation { key, source: err }
    } else {
        CatalogRepoError::Db(err)
    }
}

fn parse_class_type_row(row: &Row<'_>) -> CatalogRepoResult<ClassType> {
    Ok(ClassType {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        is_default: parse_flag(row.get("is_default")?, "class_types.is_default")?,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_exercise_row(row: &Row<'_>) -> CatalogRepoResult<Exercise> {
    let difficulty_level = match row.get::<_, Option<String>>("difficulty_level")? {
        Some(value) => Some(DifficultyLevel::parse_db(&value).ok_or_else(|| {
            CatalogRepoError::InvalidData(format!(
                "invalid difficulty level `{value}` in exercises.difficulty_level"
            ))
        })?),
        None => None,
    };

    let attributes = ExerciseAttributes {
        description: row.get("description")?,
        difficulty_level,
        equipment: decode_list(row.get("equipment")?, "exercises.equipment")?,
        primary_muscles: decode_list(row.get("primary_muscles")?, "exercises.primary_muscles")?,
        secondary_muscles: decode_list(
            row.get("secondary_muscles")?,
            "exercises.secondary_muscles",
        )?,
        category: row.get("category")?,
        calories_per_minute: row.get("calories_per_minute")?,
        modifications: row.get("modifications")?,
        safety_notes: row.get("safety_notes")?,
        is_public: parse_flag(row.get("is_public")?, "exercises.is_public")?,
    };

    Ok(Exercise {
        id: row.get("id")?,
        name: row.get("name")?,
        class_type_id: row.get("class_type_id")?,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
        attributes,
    })
}

fn encode_list(values: &[String]) -> CatalogRepoResult<String> {
    serde_json::to_string(values)
        .map_err(|err| CatalogRepoError::InvalidData(format!("cannot encode list: {err}")))
}

fn decode_list(value: Option<String>, column: &'static str) -> CatalogRepoResult<Vec<String>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(|_| {
            CatalogRepoError::InvalidData(format!("invalid JSON list `{text}` in {column}"))
        }),
    }
}

fn parse_flag(value: i64, column: &'static str) -> CatalogRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(CatalogRepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn row_exists(conn: &Connection, table: &'static str, id: &str) -> CatalogRepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_catalog_connection_ready(conn: &Connection) -> CatalogRepoResult<()> {
    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(CatalogRepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(CatalogRepoError::MissingRequiredColumn { table, column });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> CatalogRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> CatalogRepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
