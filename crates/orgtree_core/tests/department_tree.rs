use orgtree_core::db::open_db_in_memory;
use orgtree_core::{
    CreateDepartment, CreateEmployee, Department, DepartmentId, DepartmentRepository,
    DepartmentTree, Employee, EmployeeService, HierarchyError, HierarchyService,
    SqliteDepartmentRepository, SqliteEmployeeRepository, StoreError, StoreResult,
    MAX_TREE_DEPTH,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn hierarchy(conn: &Connection) -> HierarchyService<SqliteDepartmentRepository<'_>> {
    HierarchyService::new(SqliteDepartmentRepository::try_new(conn).unwrap())
}

fn create(conn: &Connection, name: &str, parent_id: Option<i64>) -> Department {
    hierarchy(conn)
        .create_department(CreateDepartment {
            name: name.to_string(),
            parent_id,
        })
        .unwrap()
}

fn hire(conn: &Connection, department_id: i64, full_name: &str) -> Employee {
    EmployeeService::new(SqliteEmployeeRepository::try_new(conn).unwrap())
        .create_employee(
            department_id,
            CreateEmployee {
                full_name: full_name.to_string(),
                position: "Analyst".to_string(),
                hired_at: Some("2024-03-01".to_string()),
            },
        )
        .unwrap()
}

/// Builds a chain of `levels` departments and returns them top-down.
fn chain(conn: &Connection, levels: usize) -> Vec<Department> {
    let mut departments: Vec<Department> = Vec::new();
    for level in 0..levels {
        let parent = departments.last().map(|dept| dept.id);
        departments.push(create(conn, &format!("Level {level}"), parent));
    }
    departments
}

/// Number of levels in `tree`, counting its root as 1.
fn tree_depth(tree: &DepartmentTree) -> usize {
    1 + tree.children.iter().map(tree_depth).max().unwrap_or(0)
}

fn names(tree: &DepartmentTree) -> Vec<&str> {
    tree.children
        .iter()
        .map(|child| child.department.name.as_str())
        .collect()
}

#[test]
fn depth_one_returns_only_the_department() {
    let conn = setup();
    let levels = chain(&conn, 3);

    let tree = hierarchy(&conn)
        .get_department_tree(levels[0].id, 1, false)
        .unwrap();
    assert_eq!(tree.department, levels[0]);
    assert!(tree.children.is_empty());
    assert!(tree.employees.is_none());
    assert_eq!(tree_depth(&tree), 1);
}

#[test]
fn depth_below_one_behaves_as_one() {
    let conn = setup();
    let levels = chain(&conn, 3);
    let service = hierarchy(&conn);

    let clamped = service.get_department_tree(levels[0].id, 0, true).unwrap();
    let explicit = service.get_department_tree(levels[0].id, 1, true).unwrap();
    assert_eq!(clamped, explicit);
    assert_eq!(
        service.get_department_tree(levels[0].id, -3, true).unwrap(),
        explicit
    );
}

#[test]
fn depth_above_five_behaves_as_five() {
    let conn = setup();
    let levels = chain(&conn, 8);
    let service = hierarchy(&conn);

    let clamped = service.get_department_tree(levels[0].id, 10, false).unwrap();
    let explicit = service.get_department_tree(levels[0].id, 5, false).unwrap();
    assert_eq!(clamped, explicit);
    assert_eq!(tree_depth(&clamped), MAX_TREE_DEPTH);
}

#[test]
fn children_are_nested_in_creation_order() {
    let conn = setup();
    let root = create(&conn, "Root", None);
    let b = create(&conn, "B", Some(root.id));
    let a = create(&conn, "A", Some(root.id));
    create(&conn, "B1", Some(b.id));
    create(&conn, "B2", Some(b.id));
    create(&conn, "A1", Some(a.id));

    let tree = hierarchy(&conn)
        .get_department_tree(root.id, 3, false)
        .unwrap();
    assert_eq!(names(&tree), vec!["B", "A"]);
    assert_eq!(names(&tree.children[0]), vec!["B1", "B2"]);
    assert_eq!(names(&tree.children[1]), vec!["A1"]);

    let shallow = hierarchy(&conn)
        .get_department_tree(root.id, 2, false)
        .unwrap();
    assert_eq!(names(&shallow), vec!["B", "A"]);
    assert!(shallow.children.iter().all(|child| child.children.is_empty()));
}

#[test]
fn employees_are_attached_at_every_included_level() {
    let conn = setup();
    let root = create(&conn, "Root", None);
    let child = create(&conn, "Child", Some(root.id));
    let grandchild = create(&conn, "Grandchild", Some(child.id));
    let first = hire(&conn, root.id, "First");
    let second = hire(&conn, root.id, "Second");
    let nested = hire(&conn, child.id, "Nested");
    hire(&conn, grandchild.id, "Too deep");

    let tree = hierarchy(&conn)
        .get_department_tree(root.id, 2, true)
        .unwrap();
    assert_eq!(tree.employees, Some(vec![first, second]));
    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.children[0].employees, Some(vec![nested]));
    assert!(tree.children[0].children.is_empty());
}

#[test]
fn include_employees_false_leaves_employees_out() {
    let conn = setup();
    let root = create(&conn, "Root", None);
    let child = create(&conn, "Child", Some(root.id));
    hire(&conn, root.id, "Ann");
    hire(&conn, child.id, "Bob");

    let tree = hierarchy(&conn)
        .get_department_tree(root.id, 5, false)
        .unwrap();
    assert!(tree.employees.is_none());
    assert!(tree.children[0].employees.is_none());
}

#[test]
fn repeated_reads_are_identical() {
    let conn = setup();
    let levels = chain(&conn, 4);
    for dept in &levels {
        hire(&conn, dept.id, &format!("Member of {}", dept.name));
    }
    let service = hierarchy(&conn);

    let first = service.get_department_tree(levels[0].id, 4, true).unwrap();
    let second = service.get_department_tree(levels[0].id, 4, true).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn tree_of_unknown_department_is_not_found() {
    let conn = setup();
    let err = hierarchy(&conn)
        .get_department_tree(88, 3, true)
        .unwrap_err();
    assert!(matches!(err, HierarchyError::DepartmentNotFound(88)));
}

#[test]
fn tree_can_start_mid_hierarchy() {
    let conn = setup();
    let levels = chain(&conn, 4);

    let tree = hierarchy(&conn)
        .get_department_tree(levels[1].id, 5, false)
        .unwrap();
    assert_eq!(tree.department.parent_id, Some(levels[0].id));
    assert_eq!(tree_depth(&tree), 3);
}

/// Delegates to SQLite but fails child or employee reads for chosen ids.
struct FlakyReadRepository<'conn> {
    inner: SqliteDepartmentRepository<'conn>,
    broken_children: Option<DepartmentId>,
    broken_employees: Option<DepartmentId>,
}

impl<'conn> FlakyReadRepository<'conn> {
    fn new(
        conn: &'conn Connection,
        broken_children: Option<DepartmentId>,
        broken_employees: Option<DepartmentId>,
    ) -> Self {
        Self {
            inner: SqliteDepartmentRepository::try_new(conn).unwrap(),
            broken_children,
            broken_employees,
        }
    }
}

impl DepartmentRepository for FlakyReadRepository<'_> {
    fn create_department(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> StoreResult<Department> {
        self.inner.create_department(name, parent_id)
    }

    fn get_department(&self, id: DepartmentId) -> StoreResult<Option<Department>> {
        self.inner.get_department(id)
    }

    fn list_children(&self, parent_id: Option<DepartmentId>) -> StoreResult<Vec<Department>> {
        if parent_id.is_some() && parent_id == self.broken_children {
            return Err(StoreError::InvalidData("injected children failure".to_string()));
        }
        self.inner.list_children(parent_id)
    }

    fn list_child_ids(&self, parent_id: DepartmentId) -> StoreResult<Vec<DepartmentId>> {
        self.inner.list_child_ids(parent_id)
    }

    fn name_taken(
        &self,
        parent_id: Option<DepartmentId>,
        name: &str,
        exclude_id: Option<DepartmentId>,
    ) -> StoreResult<bool> {
        self.inner.name_taken(parent_id, name, exclude_id)
    }

    fn update_department(
        &self,
        id: DepartmentId,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> StoreResult<Option<Department>> {
        self.inner.update_department(id, name, parent_id)
    }

    fn delete_departments(&self, ids: &[DepartmentId]) -> StoreResult<usize> {
        self.inner.delete_departments(ids)
    }

    fn list_employees(&self, department_id: DepartmentId) -> StoreResult<Vec<Employee>> {
        if Some(department_id) == self.broken_employees {
            return Err(StoreError::InvalidData("injected employee failure".to_string()));
        }
        self.inner.list_employees(department_id)
    }

    fn reassign_employees(&self, from: DepartmentId, to: DepartmentId) -> StoreResult<usize> {
        self.inner.reassign_employees(from, to)
    }

    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        self.inner.with_transaction(f)
    }
}

#[test]
fn unreadable_descendants_are_left_out_of_the_tree() {
    let conn = setup();
    let root = create(&conn, "Root", None);
    let a = create(&conn, "A", Some(root.id));
    let b = create(&conn, "B", Some(root.id));
    let c = create(&conn, "C", Some(root.id));
    let d = create(&conn, "D", Some(root.id));
    create(&conn, "A1", Some(a.id));
    create(&conn, "B1", Some(b.id));
    hire(&conn, c.id, "Cara");
    let dana = hire(&conn, d.id, "Dana");

    let service = HierarchyService::new(FlakyReadRepository::new(&conn, Some(b.id), Some(c.id)));
    let tree = service.get_department_tree(root.id, 5, true).unwrap();

    assert_eq!(names(&tree), vec!["A", "D"]);
    assert_eq!(names(&tree.children[0]), vec!["A1"]);
    assert_eq!(tree.children[1].employees, Some(vec![dana]));

    let without_employees = service.get_department_tree(root.id, 5, false).unwrap();
    assert_eq!(names(&without_employees), vec!["A", "C", "D"]);
}

#[test]
fn unreadable_root_fails_the_tree_read() {
    let conn = setup();
    let root = create(&conn, "Root", None);
    create(&conn, "Child", Some(root.id));

    let broken_children =
        HierarchyService::new(FlakyReadRepository::new(&conn, Some(root.id), None));
    let err = broken_children
        .get_department_tree(root.id, 3, false)
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Store(_)));

    let broken_employees =
        HierarchyService::new(FlakyReadRepository::new(&conn, None, Some(root.id)));
    let err = broken_employees
        .get_department_tree(root.id, 3, true)
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Store(_)));

    assert!(broken_employees
        .get_department_tree(root.id, 3, false)
        .is_ok());
}
