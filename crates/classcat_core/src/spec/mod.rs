//! Canonical catalog description: the desired state reconciliation converges to.
//!
//! # Responsibility
//! - Parse canonical class types and exercises from JSON documents.
//! - Provide the built-in default catalog.
//! - Reject malformed descriptions before any store access.
//!
//! # Invariants
//! - Class type order and exercise order are preserved exactly as written.
//! - A loaded spec has already passed [`CanonicalSpec::validate`].

mod defaults;

pub use defaults::default_catalog;

use crate::model::exercise::{DifficultyLevel, ExerciseAttributes};
use crate::model::naming::name_key;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type SpecResult<T> = Result<T, SpecError>;

/// Structural problems in a canonical spec or in reconcile options.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecValidationError {
    BlankOwnerId,
    BlankClassTypeName {
        position: usize,
    },
    EmptyExerciseList {
        class_type: String,
    },
    BlankExerciseName {
        class_type: String,
        position: usize,
    },
    DuplicateClassType(String),
    DuplicateExercise {
        class_type: String,
        name: String,
    },
    InvalidCalories {
        class_type: String,
        exercise: String,
        value: f64,
    },
    BlankKeepListName {
        position: usize,
    },
    /// A canonical class type would be removed by the supplied keep list.
    CanonicalNotRetained(String),
}

impl Display for SpecValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankOwnerId => write!(f, "owner id must not be blank"),
            Self::BlankClassTypeName { position } => {
                write!(f, "class type #{position} has a blank name")
            }
            Self::EmptyExerciseList { class_type } => {
                write!(f, "class type `{class_type}` has no exercises")
            }
            Self::BlankExerciseName {
                class_type,
                position,
            } => write!(
                f,
                "exercise #{position} of class type `{class_type}` has a blank name"
            ),
            Self::DuplicateClassType(name) => {
                write!(f, "class type `{name}` is listed more than once")
            }
            Self::DuplicateExercise { class_type, name } => write!(
                f,
                "exercise `{name}` is listed more than once in class type `{class_type}`"
            ),
            Self::InvalidCalories {
                class_type,
                exercise,
                value,
            } => write!(
                f,
                "exercise `{exercise}` in class type `{class_type}` has invalid calories_per_minute {value}"
            ),
            Self::BlankKeepListName { position } => {
                write!(f, "keep list entry #{position} is blank")
            }
            Self::CanonicalNotRetained(name) => write!(
                f,
                "canonical class type `{name}` is missing from the keep list"
            ),
        }
    }
}

impl Error for SpecValidationError {}

/// Failure to obtain a usable canonical spec.
#[derive(Debug)]
pub enum SpecError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Validation(SpecValidationError),
}

impl Display for SpecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read spec `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid spec document: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SpecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SpecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<SpecValidationError> for SpecError {
    fn from(value: SpecValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Desired exercise: name plus the full attribute set to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExerciseDocument")]
pub struct ExerciseSpec {
    pub name: String,
    #[serde(flatten)]
    pub attributes: ExerciseAttributes,
}

/// On-disk shape of one exercise; flattened fields cannot reject unknown
/// keys, so every attribute is spelled out here.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ExerciseDocument {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    difficulty_level: Option<DifficultyLevel>,
    #[serde(default)]
    equipment: Vec<String>,
    #[serde(default)]
    primary_muscles: Vec<String>,
    #[serde(default)]
    secondary_muscles: Vec<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    calories_per_minute: Option<f64>,
    #[serde(default)]
    modifications: Option<String>,
    #[serde(default)]
    safety_notes: Option<String>,
    #[serde(default)]
    is_public: bool,
}

impl From<ExerciseDocument> for ExerciseSpec {
    fn from(value: ExerciseDocument) -> Self {
        Self {
            name: value.name,
            attributes: ExerciseAttributes {
                description: value.description,
                difficulty_level: value.difficulty_level,
                equipment: value.equipment,
                primary_muscles: value.primary_muscles,
                secondary_muscles: value.secondary_muscles,
                category: value.category,
                calories_per_minute: value.calories_per_minute,
                modifications: value.modifications,
                safety_notes: value.safety_notes,
                is_public: value.is_public,
            },
        }
    }
}

impl ExerciseSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: ExerciseAttributes::default(),
        }
    }
}

/// Desired class type with its ordered exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassTypeSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    pub exercises: Vec<ExerciseSpec>,
}

impl ClassTypeSpec {
    /// Builds a class type spec with bare exercise names.
    pub fn with_exercise_names<I, S>(name: impl Into<String>, exercises: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: None,
            is_default: false,
            exercises: exercises.into_iter().map(ExerciseSpec::named).collect(),
        }
    }
}

/// Ordered canonical catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalSpec {
    pub class_types: Vec<ClassTypeSpec>,
}

impl CanonicalSpec {
    pub fn new(class_types: Vec<ClassTypeSpec>) -> Self {
        Self { class_types }
    }

    /// Parses and validates a JSON spec document.
    pub fn from_json_str(source: &str) -> SpecResult<Self> {
        let spec: Self = serde_json::from_str(source)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Reads, parses and validates a JSON spec file.
    pub fn load(path: impl AsRef<Path>) -> SpecResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    /// Looks up a canonical class type by name key.
    pub fn class_type(&self, name: &str) -> Option<&ClassTypeSpec> {
        let key = name_key(name);
        self.class_types
            .iter()
            .find(|class_type| name_key(&class_type.name) == key)
    }

    /// Total number of canonical exercises across all class types.
    pub fn exercise_count(&self) -> usize {
        self.class_types
            .iter()
            .map(|class_type| class_type.exercises.len())
            .sum()
    }

    /// Checks names, exercise lists and attribute ranges.
    pub fn validate(&self) -> Result<(), SpecValidationError> {
        let mut class_keys = HashSet::new();
        for (position, class_type) in self.class_types.iter().enumerate() {
            let class_key = name_key(&class_type.name);
            if class_key.is_empty() {
                return Err(SpecValidationError::BlankClassTypeName { position });
            }
            if !class_keys.insert(class_key) {
                return Err(SpecValidationError::DuplicateClassType(
                    class_type.name.trim().to_string(),
                ));
            }
            validate_exercises(class_type)?;
        }
        Ok(())
    }
}

fn validate_exercises(class_type: &ClassTypeSpec) -> Result<(), SpecValidationError> {
    let class_name = class_type.name.trim().to_string();
    if class_type.exercises.is_empty() {
        return Err(SpecValidationError::EmptyExerciseList {
            class_type: class_name,
        });
    }

    let mut exercise_keys = HashSet::new();
    for (position, exercise) in class_type.exercises.iter().enumerate() {
        let key = name_key(&exercise.name);
        if key.is_empty() {
            return Err(SpecValidationError::BlankExerciseName {
                class_type: class_name,
                position,
            });
        }
        if !exercise_keys.insert(key) {
            return Err(SpecValidationError::DuplicateExercise {
                class_type: class_name,
                name: exercise.name.trim().to_string(),
            });
        }
        if let Some(value) = exercise.attributes.calories_per_minute {
            if !value.is_finite() || value < 0.0 {
                return Err(SpecValidationError::InvalidCalories {
                    class_type: class_name,
                    exercise: exercise.name.trim().to_string(),
                    value,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CanonicalSpec, ClassTypeSpec, SpecError, SpecValidationError};

    fn spec_of(class_types: Vec<ClassTypeSpec>) -> CanonicalSpec {
        CanonicalSpec::new(class_types)
    }

    #[test]
    fn validate_rejects_blank_class_type_name() {
        let spec = spec_of(vec![ClassTypeSpec::with_exercise_names("  ", ["Plank"])]);
        assert_eq!(
            spec.validate(),
            Err(SpecValidationError::BlankClassTypeName { position: 0 })
        );
    }

    #[test]
    fn validate_rejects_empty_exercise_list() {
        let spec = spec_of(vec![ClassTypeSpec::with_exercise_names(
            "Boxing",
            Vec::<String>::new(),
        )]);
        assert!(matches!(
            spec.validate(),
            Err(SpecValidationError::EmptyExerciseList { class_type }) if class_type == "Boxing"
        ));
    }

    #[test]
    fn validate_rejects_case_variant_duplicates() {
        let spec = spec_of(vec![
            ClassTypeSpec::with_exercise_names("Yoga", ["Tree Pose"]),
            ClassTypeSpec::with_exercise_names("YOGA ", ["Tree Pose"]),
        ]);
        assert_eq!(
            spec.validate(),
            Err(SpecValidationError::DuplicateClassType("YOGA".to_string()))
        );

        let spec = spec_of(vec![ClassTypeSpec::with_exercise_names(
            "Yoga",
            ["Tree Pose", "tree  pose"],
        )]);
        assert!(matches!(
            spec.validate(),
            Err(SpecValidationError::DuplicateExercise { name, .. }) if name == "tree  pose"
        ));
    }

    #[test]
    fn from_json_str_parses_attributes_and_rejects_unknown_fields() {
        let spec = CanonicalSpec::from_json_str(
            r#"{
                "class_types": [{
                    "name": "Boxing",
                    "is_default": true,
                    "exercises": [{
                        "name": "Jab",
                        "difficulty_level": "beginner",
                        "equipment": ["gloves"],
                        "calories_per_minute": 9.5
                    }]
                }]
            }"#,
        )
        .unwrap();
        let boxing = spec.class_type("boxing").unwrap();
        assert!(boxing.is_default);
        assert_eq!(boxing.exercises[0].attributes.equipment, vec!["gloves"]);
        assert_eq!(boxing.exercises[0].attributes.calories_per_minute, Some(9.5));

        let err = CanonicalSpec::from_json_str(
            r#"{"class_types": [{"name": "Boxing", "exercises": [], "colour": "red"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::Parse(_)));

        let err = CanonicalSpec::from_json_str(
            r#"{"class_types": [{"name": "Boxing", "exercises": [{"name": "Jab", "calories_per_min": 9.5}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::Parse(_)));
    }

    #[test]
    fn from_json_str_validates_after_parsing() {
        let err = CanonicalSpec::from_json_str(
            r#"{"class_types": [{"name": "Boxing", "exercises": [{"name": "Jab", "calories_per_minute": -1.0}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SpecError::Validation(SpecValidationError::InvalidCalories { .. })
        ));
    }
}
