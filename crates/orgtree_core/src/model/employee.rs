//! Employee domain model.
//!
//! # Invariants
//! - `department_id` always references an existing department.
//! - Ownership moves only through explicit reassignment.

use crate::model::department::DepartmentId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable employee identifier assigned by the store.
pub type EmployeeId = i64;

/// Persisted employee row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub department_id: DepartmentId,
    pub full_name: String,
    pub position: String,
    /// Calendar hire date, serialized as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hired_at: Option<NaiveDate>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}
