//! Department repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and parent/child queries over department rows.
//! - Keep SQL details and ordering behavior inside repository boundary.
//! - Expose the employee moves the delete path needs, since they must run
//!   in the same transaction as the department writes.
//!
//! # Invariants
//! - Child listing is deterministic: `created_at ASC, id ASC`.
//! - Parent references are checked by SQLite at commit time, so a
//!   multi-statement delete may remove a parent before its children.

use crate::model::department::{Department, DepartmentId};
use crate::model::employee::Employee;
use crate::repo::employee_repo::select_employees_by_department;
use crate::repo::{ensure_schema_ready, now_epoch_ms, run_in_transaction, StoreError, StoreResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

/// Upper bound of ids bound into one `IN (...)` delete statement.
const DELETE_CHUNK_SIZE: usize = 500;

const DEPARTMENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    parent_id,
    created_at
FROM departments";

/// Repository interface for department hierarchy storage.
pub trait DepartmentRepository {
    /// Inserts one department and returns the stored row.
    fn create_department(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> StoreResult<Department>;
    /// Loads one department by id.
    fn get_department(&self, id: DepartmentId) -> StoreResult<Option<Department>>;
    /// Lists direct children of `parent_id`, or roots when `None`.
    fn list_children(&self, parent_id: Option<DepartmentId>) -> StoreResult<Vec<Department>>;
    /// Lists ids of direct children of one department.
    fn list_child_ids(&self, parent_id: DepartmentId) -> StoreResult<Vec<DepartmentId>>;
    /// Returns whether `name` is used by a sibling under `parent_id`,
    /// ignoring the department `exclude_id`.
    fn name_taken(
        &self,
        parent_id: Option<DepartmentId>,
        name: &str,
        exclude_id: Option<DepartmentId>,
    ) -> StoreResult<bool>;
    /// Overwrites name and parent of one department.
    ///
    /// Returns `None` when the row no longer exists.
    fn update_department(
        &self,
        id: DepartmentId,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> StoreResult<Option<Department>>;
    /// Deletes all listed departments; their employees go with them.
    fn delete_departments(&self, ids: &[DepartmentId]) -> StoreResult<usize>;
    /// Lists direct employees of one department by creation order.
    fn list_employees(&self, department_id: DepartmentId) -> StoreResult<Vec<Employee>>;
    /// Moves every direct employee of `from` to `to`.
    fn reassign_employees(&self, from: DepartmentId, to: DepartmentId) -> StoreResult<usize>;
    /// Runs `f` in one store transaction, rolling back on error.
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>;
}

/// SQLite-backed department repository.
pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_ready(
            conn,
            "departments",
            &["id", "name", "parent_id", "created_at"],
        )?;
        Ok(Self { conn })
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn create_department(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> StoreResult<Department> {
        self.conn.execute(
            "INSERT INTO departments (name, parent_id, created_at)
             VALUES (?1, ?2, ?3);",
            params![name, parent_id, now_epoch_ms()],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_department(id)?.ok_or_else(|| {
            StoreError::InvalidData(format!("department {id} missing right after insert"))
        })
    }

    fn get_department(&self, id: DepartmentId) -> StoreResult<Option<Department>> {
        let department = self
            .conn
            .query_row(
                &format!("{DEPARTMENT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_department_row,
            )
            .optional()?;
        Ok(department)
    }

    fn list_children(&self, parent_id: Option<DepartmentId>) -> StoreResult<Vec<Department>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DEPARTMENT_SELECT_SQL}
             WHERE parent_id IS ?1
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let rows = stmt.query_map([parent_id], parse_department_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    fn list_child_ids(&self, parent_id: DepartmentId) -> StoreResult<Vec<DepartmentId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id
             FROM departments
             WHERE parent_id = ?1
             ORDER BY created_at ASC, id ASC;",
        )?;
        let rows = stmt.query_map([parent_id], |row| row.get::<_, DepartmentId>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn name_taken(
        &self,
        parent_id: Option<DepartmentId>,
        name: &str,
        exclude_id: Option<DepartmentId>,
    ) -> StoreResult<bool> {
        let taken: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM departments
                WHERE parent_id IS ?1
                  AND name = ?2
                  AND (?3 IS NULL OR id != ?3)
            );",
            params![parent_id, name, exclude_id],
            |row| row.get(0),
        )?;
        Ok(taken == 1)
    }

    fn update_department(
        &self,
        id: DepartmentId,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> StoreResult<Option<Department>> {
        let changed = self.conn.execute(
            "UPDATE departments
             SET name = ?2,
                 parent_id = ?3
             WHERE id = ?1;",
            params![id, name, parent_id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_department(id)
    }

    fn delete_departments(&self, ids: &[DepartmentId]) -> StoreResult<usize> {
        let mut deleted = 0;
        for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            deleted += self.conn.execute(
                &format!("DELETE FROM departments WHERE id IN ({placeholders});"),
                params_from_iter(chunk.iter()),
            )?;
        }
        Ok(deleted)
    }

    fn list_employees(&self, department_id: DepartmentId) -> StoreResult<Vec<Employee>> {
        select_employees_by_department(self.conn, department_id)
    }

    fn reassign_employees(&self, from: DepartmentId, to: DepartmentId) -> StoreResult<usize> {
        let moved = self.conn.execute(
            "UPDATE employees
             SET department_id = ?2
             WHERE department_id = ?1;",
            params![from, to],
        )?;
        Ok(moved)
    }

    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        run_in_transaction(self.conn, f)
    }
}

fn parse_department_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get("id")?,
        name: row.get("name")?,
        parent_id: row.get("parent_id")?,
        created_at: row.get("created_at")?,
    })
}
