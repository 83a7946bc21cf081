//! Employee repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist and read employee rows attached to departments.
//!
//! # Invariants
//! - Employee listing is deterministic: `created_at ASC, id ASC`.
//! - `hired_at` is stored as `YYYY-MM-DD` text and rejected on read when
//!   it does not parse back into a calendar date.

use crate::model::department::DepartmentId;
use crate::model::employee::{Employee, EmployeeId};
use crate::repo::{ensure_schema_ready, now_epoch_ms, run_in_transaction, StoreError, StoreResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

const HIRED_AT_FORMAT: &str = "%Y-%m-%d";

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    department_id,
    full_name,
    position,
    hired_at,
    created_at
FROM employees";

/// Validated employee input ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub department_id: DepartmentId,
    pub full_name: String,
    pub position: String,
    pub hired_at: Option<NaiveDate>,
}

/// Repository interface for employee records.
pub trait EmployeeRepository {
    /// Inserts one employee and returns the stored row.
    fn create_employee(&self, employee: &NewEmployee) -> StoreResult<Employee>;
    /// Loads one employee by id.
    fn get_employee(&self, id: EmployeeId) -> StoreResult<Option<Employee>>;
    /// Lists direct employees of one department by creation order.
    fn list_by_department(&self, department_id: DepartmentId) -> StoreResult<Vec<Employee>>;
    /// Returns whether a department row with `id` exists.
    fn department_exists(&self, id: DepartmentId) -> StoreResult<bool>;
    /// Runs `f` in one store transaction, rolling back on error.
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>;
}

/// SQLite-backed employee repository.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_ready(
            conn,
            "employees",
            &[
                "id",
                "department_id",
                "full_name",
                "position",
                "hired_at",
                "created_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn create_employee(&self, employee: &NewEmployee) -> StoreResult<Employee> {
        self.conn.execute(
            "INSERT INTO employees (
                department_id,
                full_name,
                position,
                hired_at,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                employee.department_id,
                employee.full_name,
                employee.position,
                employee
                    .hired_at
                    .map(|date| date.format(HIRED_AT_FORMAT).to_string()),
                now_epoch_ms(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_employee(id)?.ok_or_else(|| {
            StoreError::InvalidData(format!("employee {id} missing right after insert"))
        })
    }

    fn get_employee(&self, id: EmployeeId) -> StoreResult<Option<Employee>> {
        self.conn
            .query_row(
                &format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                RawEmployee::from_row,
            )
            .optional()?
            .map(RawEmployee::into_employee)
            .transpose()
    }

    fn list_by_department(&self, department_id: DepartmentId) -> StoreResult<Vec<Employee>> {
        select_employees_by_department(self.conn, department_id)
    }

    fn department_exists(&self, id: DepartmentId) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM departments WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        run_in_transaction(self.conn, f)
    }
}

/// Shared by the department repository for tree assembly.
pub(crate) fn select_employees_by_department(
    conn: &Connection,
    department_id: DepartmentId,
) -> StoreResult<Vec<Employee>> {
    let mut stmt = conn.prepare(&format!(
        "{EMPLOYEE_SELECT_SQL}
         WHERE department_id = ?1
         ORDER BY created_at ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([department_id])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(RawEmployee::from_row(row)?.into_employee()?);
    }
    Ok(items)
}

/// Row image before `hired_at` text is parsed.
struct RawEmployee {
    id: EmployeeId,
    department_id: DepartmentId,
    full_name: String,
    position: String,
    hired_at: Option<String>,
    created_at: i64,
}

impl RawEmployee {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            department_id: row.get("department_id")?,
            full_name: row.get("full_name")?,
            position: row.get("position")?,
            hired_at: row.get("hired_at")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_employee(self) -> StoreResult<Employee> {
        let hired_at = self
            .hired_at
            .map(|text| {
                NaiveDate::parse_from_str(&text, HIRED_AT_FORMAT).map_err(|_| {
                    StoreError::InvalidData(format!("invalid date `{text}` in employees.hired_at"))
                })
            })
            .transpose()?;

        Ok(Employee {
            id: self.id,
            department_id: self.department_id,
            full_name: self.full_name,
            position: self.position,
            hired_at,
            created_at: self.created_at,
        })
    }
}
