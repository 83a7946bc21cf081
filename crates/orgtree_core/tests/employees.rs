use orgtree_core::db::open_db_in_memory;
use orgtree_core::{
    CreateDepartment, CreateEmployee, Department, EmployeeService, EmployeeServiceError,
    ErrorKind, FieldError, HierarchyService, SqliteDepartmentRepository,
    SqliteEmployeeRepository,
};
use chrono::NaiveDate;
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> EmployeeService<SqliteEmployeeRepository<'_>> {
    EmployeeService::new(SqliteEmployeeRepository::try_new(conn).unwrap())
}

fn department(conn: &Connection, name: &str) -> Department {
    HierarchyService::new(SqliteDepartmentRepository::try_new(conn).unwrap())
        .create_department(CreateDepartment {
            name: name.to_string(),
            parent_id: None,
        })
        .unwrap()
}

fn command(full_name: &str, position: &str, hired_at: Option<&str>) -> CreateEmployee {
    CreateEmployee {
        full_name: full_name.to_string(),
        position: position.to_string(),
        hired_at: hired_at.map(str::to_string),
    }
}

#[test]
fn create_employee_trims_fields_and_parses_date() {
    let conn = setup();
    let dept = department(&conn, "Engineering");

    let employee = service(&conn)
        .create_employee(
            dept.id,
            command("  Ada Lovelace ", " Engineer ", Some("2023-12-01")),
        )
        .unwrap();
    assert_eq!(employee.department_id, dept.id);
    assert_eq!(employee.full_name, "Ada Lovelace");
    assert_eq!(employee.position, "Engineer");
    assert_eq!(employee.hired_at, NaiveDate::from_ymd_opt(2023, 12, 1));
    assert!(employee.created_at > 0);

    assert_eq!(service(&conn).get_employee(employee.id).unwrap(), employee);
}

#[test]
fn create_employee_without_hire_date() {
    let conn = setup();
    let dept = department(&conn, "Engineering");

    let employee = service(&conn)
        .create_employee(dept.id, command("Bob", "Tester", None))
        .unwrap();
    assert_eq!(employee.hired_at, None);
}

#[test]
fn create_employee_requires_existing_department() {
    let conn = setup();

    let err = service(&conn)
        .create_employee(5, command("Bob", "Tester", None))
        .unwrap_err();
    assert!(matches!(err, EmployeeServiceError::DepartmentNotFound(5)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn department_check_precedes_field_validation() {
    let conn = setup();

    let err = service(&conn)
        .create_employee(5, command("", "", Some("garbage")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn create_employee_rejects_invalid_fields() {
    let conn = setup();
    let dept = department(&conn, "Engineering");
    let service = service(&conn);

    let err = service
        .create_employee(dept.id, command("   ", "Engineer", None))
        .unwrap_err();
    assert!(matches!(
        err,
        EmployeeServiceError::InvalidField(FieldError::Blank { field: "full_name" })
    ));

    let err = service
        .create_employee(dept.id, command("Ann", &"p".repeat(201), None))
        .unwrap_err();
    assert!(matches!(
        err,
        EmployeeServiceError::InvalidField(FieldError::TooLong { field: "position", .. })
    ));

    let err = service
        .create_employee(dept.id, command("Ann", "Engineer", Some("2024-13-01")))
        .unwrap_err();
    assert!(matches!(err, EmployeeServiceError::InvalidHireDate(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    assert!(service.list_employees(dept.id).unwrap().is_empty());
}

#[test]
fn list_employees_orders_by_creation() {
    let conn = setup();
    let dept = department(&conn, "Engineering");
    let other = department(&conn, "Sales");
    let service = service(&conn);

    let ids: Vec<_> = ["Zed", "Amy", "Max"]
        .into_iter()
        .map(|name| {
            service
                .create_employee(dept.id, command(name, "Engineer", None))
                .unwrap()
                .id
        })
        .collect();
    service
        .create_employee(other.id, command("Elsewhere", "Rep", None))
        .unwrap();

    let listed: Vec<_> = service
        .list_employees(dept.id)
        .unwrap()
        .into_iter()
        .map(|employee| employee.id)
        .collect();
    assert_eq!(listed, ids);

    let err = service.list_employees(404).unwrap_err();
    assert!(matches!(err, EmployeeServiceError::DepartmentNotFound(404)));
}

#[test]
fn get_unknown_employee_is_not_found() {
    let conn = setup();
    let err = service(&conn).get_employee(12).unwrap_err();
    assert!(matches!(err, EmployeeServiceError::EmployeeNotFound(12)));
}

#[test]
fn employee_serializes_hire_date_as_calendar_text() {
    let conn = setup();
    let dept = department(&conn, "Engineering");
    let employee = service(&conn)
        .create_employee(dept.id, command("Ann", "Engineer", Some("2020-01-31")))
        .unwrap();

    let value = serde_json::to_value(&employee).unwrap();
    assert_eq!(value["hired_at"], "2020-01-31");
    assert_eq!(value["department_id"], dept.id);
}
