//! Employee attachment service.
//!
//! # Responsibility
//! - Validate employee input and attach employees to existing departments.
//! - Provide employee lookups by id and by department.
//!
//! # Invariants
//! - An employee is only created under a department that exists when the
//!   creating transaction runs.
//! - `hired_at` input must be a real calendar date written `YYYY-MM-DD`.

use crate::model::department::DepartmentId;
use crate::model::employee::{Employee, EmployeeId};
use crate::model::field::{normalize_field, FieldError};
use crate::repo::employee_repo::{EmployeeRepository, NewEmployee};
use crate::repo::StoreError;
use crate::service::ErrorKind;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static HIRE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid hire date regex"));

/// Errors from employee service operations.
#[derive(Debug)]
pub enum EmployeeServiceError {
    /// Full name or position is blank or too long after trimming.
    InvalidField(FieldError),
    /// Hire date is not a `YYYY-MM-DD` calendar date.
    InvalidHireDate(String),
    /// Owning department does not exist.
    DepartmentNotFound(DepartmentId),
    /// Employee does not exist.
    EmployeeNotFound(EmployeeId),
    /// Repository-level failure.
    Store(StoreError),
}

impl EmployeeServiceError {
    /// Returns the transport-facing classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidField(_) | Self::InvalidHireDate(_) => ErrorKind::InvalidInput,
            Self::DepartmentNotFound(_) | Self::EmployeeNotFound(_) => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::Internal,
        }
    }
}

impl Display for EmployeeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidField(err) => write!(f, "{err}"),
            Self::InvalidHireDate(value) => {
                write!(f, "invalid hired_at `{value}`; expected YYYY-MM-DD")
            }
            Self::DepartmentNotFound(id) => write!(f, "department not found: {id}"),
            Self::EmployeeNotFound(id) => write!(f, "employee not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EmployeeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidField(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for EmployeeServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<FieldError> for EmployeeServiceError {
    fn from(value: FieldError) -> Self {
        Self::InvalidField(value)
    }
}

/// Command to attach one new employee to a department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEmployee {
    pub full_name: String,
    pub position: String,
    /// Raw `YYYY-MM-DD` text, parsed by the service.
    pub hired_at: Option<String>,
}

/// Employee use-case service facade.
pub struct EmployeeService<R: EmployeeRepository> {
    repo: R,
}

impl<R: EmployeeRepository> EmployeeService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one employee owned by `department_id`.
    pub fn create_employee(
        &self,
        department_id: DepartmentId,
        command: CreateEmployee,
    ) -> Result<Employee, EmployeeServiceError> {
        self.repo.with_transaction(|| {
            self.require_department(department_id)?;

            let employee = NewEmployee {
                department_id,
                full_name: normalize_field("full_name", &command.full_name)?,
                position: normalize_field("position", &command.position)?,
                hired_at: command.hired_at.as_deref().map(parse_hire_date).transpose()?,
            };
            Ok(self.repo.create_employee(&employee)?)
        })
    }

    /// Loads one employee by id.
    pub fn get_employee(&self, id: EmployeeId) -> Result<Employee, EmployeeServiceError> {
        self.repo
            .get_employee(id)?
            .ok_or(EmployeeServiceError::EmployeeNotFound(id))
    }

    /// Lists direct employees of one department by creation order.
    pub fn list_employees(
        &self,
        department_id: DepartmentId,
    ) -> Result<Vec<Employee>, EmployeeServiceError> {
        self.require_department(department_id)?;
        Ok(self.repo.list_by_department(department_id)?)
    }

    fn require_department(&self, department_id: DepartmentId) -> Result<(), EmployeeServiceError> {
        if self.repo.department_exists(department_id)? {
            Ok(())
        } else {
            Err(EmployeeServiceError::DepartmentNotFound(department_id))
        }
    }
}

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_hire_date(value: &str) -> Result<NaiveDate, EmployeeServiceError> {
    if !HIRE_DATE_RE.is_match(value) {
        return Err(EmployeeServiceError::InvalidHireDate(value.to_string()));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| EmployeeServiceError::InvalidHireDate(value.to_string()))
}
