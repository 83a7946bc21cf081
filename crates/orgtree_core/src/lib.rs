//! Core domain logic for the org tree service.
//! This crate is the single source of truth for hierarchy invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::department::{Department, DepartmentId, DepartmentTree};
pub use model::employee::{Employee, EmployeeId};
pub use model::field::{FieldError, MAX_FIELD_CHARS};
pub use repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
pub use repo::employee_repo::{EmployeeRepository, NewEmployee, SqliteEmployeeRepository};
pub use repo::{StoreError, StoreResult};
pub use service::department_service::{
    clamp_tree_depth, CreateDepartment, DeleteMode, DeleteOutcome, HierarchyError,
    HierarchyService, ParentUpdate, UnknownDeleteMode, UpdateDepartment, MAX_TREE_DEPTH,
    MIN_TREE_DEPTH,
};
pub use service::employee_service::{CreateEmployee, EmployeeService, EmployeeServiceError};
pub use service::ErrorKind;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
