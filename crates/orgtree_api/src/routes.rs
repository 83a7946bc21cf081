//! Department and employee HTTP handlers.
//!
//! # Responsibility
//! - Translate path, query and JSON input into engine commands.
//! - Run every store interaction on the blocking pool with its own
//!   connection.
//!
//! # Invariants
//! - `parent_id: 0` in a request body means "no parent". The engine never
//!   sees the sentinel.
//! - Handlers hold no state beyond the database path.

use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::routing::get;
use axum::{middleware, Json, Router};
use orgtree_core::db::{connect_db, open_db};
use orgtree_core::{
    CreateDepartment, CreateEmployee, DeleteMode, Department, DepartmentId, DepartmentTree,
    Employee, EmployeeService, HierarchyService, ParentUpdate, SqliteDepartmentRepository,
    SqliteEmployeeRepository, UpdateDepartment,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_TREE_DEPTH: i64 = 1;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
}

impl AppState {
    /// Creates state for the database at `db_path`.
    ///
    /// The store is opened once here so that migrations run before the
    /// first request; handlers then only connect to it.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let db_path = db_path.into();
        open_db(&db_path)?;
        Ok(Self {
            db_path: Arc::new(db_path),
        })
    }

    pub fn db_path(&self) -> &std::path::Path {
        self.db_path.as_path()
    }

    async fn run<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
    {
        let db_path = Arc::clone(&self.db_path);
        tokio::task::spawn_blocking(move || {
            let conn = connect_db(db_path.as_path())?;
            work(&conn)
        })
        .await?
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    #[serde(default)]
    pub name: String,
    pub parent_id: Option<DepartmentId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    pub parent_id: Option<DepartmentId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub position: String,
    pub hired_at: Option<String>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route(
            "/departments",
            get(list_root_departments)
                .post(create_department)
                .fallback(method_not_allowed),
        )
        .route(
            "/departments/:id",
            get(get_department)
                .patch(update_department)
                .delete(delete_department)
                .fallback(method_not_allowed),
        )
        .route(
            "/departments/:id/employees",
            get(list_employees)
                .post(create_employee)
                .fallback(method_not_allowed),
        )
        .route(
            "/employees/:id",
            get(get_employee).fallback(method_not_allowed),
        )
        .fallback(unknown_route)
        .layer(middleware::from_fn(crate::request_log::log_requests))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("method {method} not allowed"),
    )
}

async fn unknown_route(uri: Uri) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, format!("no route for {}", uri.path()))
}

fn hierarchy(
    conn: &Connection,
) -> Result<HierarchyService<SqliteDepartmentRepository<'_>>, ApiError> {
    Ok(HierarchyService::new(SqliteDepartmentRepository::try_new(conn)?))
}

fn employees(
    conn: &Connection,
) -> Result<EmployeeService<SqliteEmployeeRepository<'_>>, ApiError> {
    Ok(EmployeeService::new(SqliteEmployeeRepository::try_new(conn)?))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("invalid id `{raw}`")))
}

/// Translates a wire `parent_id` into an optional parent, `0` meaning none.
fn parent_from_wire(parent_id: Option<DepartmentId>) -> Option<DepartmentId> {
    parent_id.filter(|id| *id != 0)
}

async fn create_department(
    State(state): State<AppState>,
    payload: Result<Json<CreateDepartmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    let Json(request) = payload?;
    let command = CreateDepartment {
        name: request.name,
        parent_id: parent_from_wire(request.parent_id),
    };
    let department = state
        .run(move |conn| Ok(hierarchy(conn)?.create_department(command)?))
        .await?;
    Ok((StatusCode::CREATED, Json(department)))
}

async fn list_root_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Department>>, ApiError> {
    let roots = state
        .run(|conn| Ok(hierarchy(conn)?.list_root_departments()?))
        .await?;
    Ok(Json(roots))
}

async fn get_department(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DepartmentTree>, ApiError> {
    let id = parse_id(&raw_id)?;
    let depth = params
        .get("depth")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_TREE_DEPTH);
    let include_employees = params
        .get("include_employees")
        .map_or(true, |raw| raw != "false");

    let tree = state
        .run(move |conn| {
            Ok(hierarchy(conn)?.get_department_tree(id, depth, include_employees)?)
        })
        .await?;
    Ok(Json(tree))
}

async fn update_department(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateDepartmentRequest>, JsonRejection>,
) -> Result<Json<Department>, ApiError> {
    let id = parse_id(&raw_id)?;
    let Json(request) = payload?;
    let parent = match request.parent_id {
        None => ParentUpdate::Unchanged,
        Some(0) => ParentUpdate::DetachToRoot,
        Some(parent_id) => ParentUpdate::MoveUnder(parent_id),
    };
    let command = UpdateDepartment {
        name: request.name,
        parent,
    };

    let department = state
        .run(move |conn| Ok(hierarchy(conn)?.update_department(id, command)?))
        .await?;
    Ok(Json(department))
}

async fn delete_department(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let mode = match params.get("mode").map(|raw| raw.trim()) {
        None | Some("") => DeleteMode::default(),
        Some(raw) => raw.parse::<DeleteMode>()?,
    };
    let reassign_to = match mode {
        DeleteMode::Cascade => None,
        DeleteMode::Reassign => params
            .get("reassign_to_department_id")
            .map(|raw| raw.trim())
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<DepartmentId>().map_err(|_| {
                    ApiError::bad_request(format!("invalid reassign_to_department_id `{raw}`"))
                })
            })
            .transpose()?,
    };

    let outcome = state
        .run(move |conn| Ok(hierarchy(conn)?.delete_department(id, mode, reassign_to)?))
        .await?;
    log::debug!(
        "event=department_delete module=api status=ok id={id} mode={} departments_removed={} employees_reassigned={}",
        mode.as_str(),
        outcome.departments_removed,
        outcome.employees_reassigned
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn create_employee(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    let department_id = parse_id(&raw_id)?;
    let Json(request) = payload?;
    let command = CreateEmployee {
        full_name: request.full_name,
        position: request.position,
        hired_at: request.hired_at,
    };

    let employee = state
        .run(move |conn| Ok(employees(conn)?.create_employee(department_id, command)?))
        .await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn list_employees(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let department_id = parse_id(&raw_id)?;
    let listed = state
        .run(move |conn| Ok(employees(conn)?.list_employees(department_id)?))
        .await?;
    Ok(Json(listed))
}

async fn get_employee(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    let id = parse_id(&raw_id)?;
    let employee = state
        .run(move |conn| Ok(employees(conn)?.get_employee(id)?))
        .await?;
    Ok(Json(employee))
}

#[cfg(test)]
mod tests {
    use super::{parent_from_wire, parse_id};
    use axum::http::StatusCode;

    #[test]
    fn parse_id_rejects_non_numeric_values() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("abc").unwrap_err().status, StatusCode::BAD_REQUEST);
        assert_eq!(parse_id("4.2").unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn zero_parent_means_root() {
        assert_eq!(parent_from_wire(Some(0)), None);
        assert_eq!(parent_from_wire(Some(3)), Some(3));
        assert_eq!(parent_from_wire(None), None);
    }
}
