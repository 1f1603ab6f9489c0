//! Exercise row and its typed attributes.

use crate::model::class_type::ClassTypeId;
use serde::{Deserialize, Serialize};

pub type ExerciseId = String;

/// Difficulty rating stored in `exercises.difficulty_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// Descriptive attributes shared by canonical exercise specs and stored rows.
///
/// Kept separate from identity columns so the creator can copy a canonical
/// attribute set onto a fresh row unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseAttributes {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<DifficultyLevel>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub primary_muscles: Vec<String>,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub calories_per_minute: Option<f64>,
    #[serde(default)]
    pub modifications: Option<String>,
    #[serde(default)]
    pub safety_notes: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// One `exercises` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    /// `None` for exercises detached from any class type.
    pub class_type_id: Option<ClassTypeId>,
    pub user_id: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(flatten)]
    pub attributes: ExerciseAttributes,
}
