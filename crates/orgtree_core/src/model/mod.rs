//! Domain model for the department hierarchy.
//!
//! # Responsibility
//! - Define the department and employee records shared by store and engine.
//! - Own field normalization rules (trim + length bounds).
//!
//! # Invariants
//! - Departments form a forest through `parent_id`.
//! - Every employee belongs to exactly one existing department.

pub mod department;
pub mod employee;
pub mod field;
