//! Catalog persistence contracts and their SQLite implementation.
//!
//! # Responsibility
//! - Keep SQL for the class type / exercise graph behind one trait.
//! - Report per-statement affected-row counts so callers can build reports.
//!
//! # Invariants
//! - Repositories borrow an explicit connection or transaction; they never
//!   open, commit or roll back on their own.
//! - Constraint failures are surfaced with the entity key that caused them.

pub mod catalog_repo;
