//! Strongly typed catalog records.
//!
//! # Responsibility
//! - Define the class type / exercise rows reconciliation reads and writes.
//! - Define entity keys used to attribute errors and report counts.
//!
//! # Invariants
//! - Identifiers are opaque text; new rows use UUID v4 strings.
//! - Name matching always goes through [`naming::name_key`].

pub mod class_type;
pub mod entity;
pub mod exercise;
pub mod naming;

use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generates an identifier for a newly inserted catalog row.
pub fn new_row_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
