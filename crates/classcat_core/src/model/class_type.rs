//! Class type row.

use serde::Serialize;

pub type ClassTypeId = String;

/// One `class_types` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassType {
    pub id: ClassTypeId,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    /// Owning user.
    pub user_id: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}
