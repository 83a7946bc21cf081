//! Department hierarchy engine.
//!
//! # Responsibility
//! - Validate hierarchy invariants above the repository layer.
//! - Provide create, update (rename/reparent), delete (cascade/reassign)
//!   and bounded tree assembly.
//!
//! # Invariants
//! - Parent references always form a forest: reparenting under a
//!   descendant or under itself is rejected.
//! - Names are unique among siblings sharing a parent (or among roots).
//! - Every mutation runs in one store transaction; a failure leaves the
//!   tree untouched.
//! - Reassign-mode delete only applies to departments without children.
//!   Child departments must be moved or deleted first (`HasChildren`).

use crate::model::department::{Department, DepartmentId, DepartmentTree};
use crate::model::field::{normalize_field, FieldError};
use crate::repo::department_repo::DepartmentRepository;
use crate::repo::StoreError;
use crate::service::ErrorKind;
use std::collections::{HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Smallest tree depth returned; the requested department alone.
pub const MIN_TREE_DEPTH: usize = 1;
/// Largest tree depth returned, bounding fan-out of one read.
pub const MAX_TREE_DEPTH: usize = 5;

/// Errors from hierarchy engine operations.
#[derive(Debug)]
pub enum HierarchyError {
    /// Name is blank or too long after trimming.
    InvalidField(FieldError),
    /// Reassign-mode delete without a target department.
    MissingReassignTarget,
    /// Reassign-mode delete targeting the department being deleted.
    ReassignToSelf(DepartmentId),
    /// Subject department does not exist.
    DepartmentNotFound(DepartmentId),
    /// Requested parent department does not exist.
    ParentNotFound(DepartmentId),
    /// Reassignment target department does not exist.
    ReassignTargetNotFound(DepartmentId),
    /// A sibling under the same parent already uses the name.
    DuplicateName {
        name: String,
        parent_id: Option<DepartmentId>,
    },
    /// Department proposed as its own parent.
    SelfParent(DepartmentId),
    /// Proposed parent is a descendant of the department.
    CycleDetected {
        department_id: DepartmentId,
        parent_id: DepartmentId,
    },
    /// Reassign delete of a department that still has child departments.
    HasChildren(DepartmentId),
    /// Repository-level failure.
    Store(StoreError),
}

impl HierarchyError {
    /// Returns the transport-facing classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidField(_) | Self::MissingReassignTarget | Self::ReassignToSelf(_) => {
                ErrorKind::InvalidInput
            }
            Self::DepartmentNotFound(_)
            | Self::ParentNotFound(_)
            | Self::ReassignTargetNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateName { .. } => ErrorKind::DuplicateName,
            Self::SelfParent(_) => ErrorKind::SelfParent,
            Self::CycleDetected { .. } => ErrorKind::CycleDetected,
            Self::HasChildren(_) => ErrorKind::HasChildren,
            Self::Store(_) => ErrorKind::Internal,
        }
    }
}

impl Display for HierarchyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidField(err) => write!(f, "{err}"),
            Self::MissingReassignTarget => {
                write!(f, "reassign_to_department_id is required in reassign mode")
            }
            Self::ReassignToSelf(id) => {
                write!(f, "department {id} cannot be reassigned to itself")
            }
            Self::DepartmentNotFound(id) => write!(f, "department not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent department not found: {id}"),
            Self::ReassignTargetNotFound(id) => {
                write!(f, "reassignment target department not found: {id}")
            }
            Self::DuplicateName {
                name,
                parent_id: Some(parent_id),
            } => write!(
                f,
                "department `{name}` already exists under parent {parent_id}"
            ),
            Self::DuplicateName {
                name,
                parent_id: None,
            } => write!(f, "root department `{name}` already exists"),
            Self::SelfParent(id) => write!(f, "department {id} cannot be its own parent"),
            Self::CycleDetected {
                department_id,
                parent_id,
            } => write!(
                f,
                "moving department {department_id} under {parent_id} would create a cycle"
            ),
            Self::HasChildren(id) => write!(
                f,
                "department {id} has child departments; move or delete them before reassigning"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HierarchyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidField(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for HierarchyError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<FieldError> for HierarchyError {
    fn from(value: FieldError) -> Self {
        Self::InvalidField(value)
    }
}

/// Command to create one department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDepartment {
    /// Raw name; trimmed before validation.
    pub name: String,
    /// `None` creates a root department.
    pub parent_id: Option<DepartmentId>,
}

/// Requested change of a department's parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentUpdate {
    /// Keep the current parent.
    #[default]
    Unchanged,
    /// Turn the department into a root.
    DetachToRoot,
    /// Move the department under another one.
    MoveUnder(DepartmentId),
}

/// Command to rename and/or reparent one department.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateDepartment {
    /// New raw name; `None` or empty keeps the current name.
    pub name: Option<String>,
    pub parent: ParentUpdate,
}

/// How a department delete treats what hangs off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Delete the whole subtree together with all employees in it.
    #[default]
    Cascade,
    /// Move direct employees to another department, then delete.
    Reassign,
}

impl DeleteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::Reassign => "reassign",
        }
    }
}

/// Unrecognized delete mode text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDeleteMode(pub String);

impl Display for UnknownDeleteMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown delete mode `{}`; expected cascade|reassign",
            self.0
        )
    }
}

impl Error for UnknownDeleteMode {}

impl FromStr for DeleteMode {
    type Err = UnknownDeleteMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cascade" => Ok(Self::Cascade),
            "reassign" => Ok(Self::Reassign),
            other => Err(UnknownDeleteMode(other.to_string())),
        }
    }
}

/// Summary of one successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Departments removed, the subject included.
    pub departments_removed: usize,
    /// Employees moved to the reassignment target.
    pub employees_reassigned: usize,
}

/// Clamps a requested tree depth into `[MIN_TREE_DEPTH, MAX_TREE_DEPTH]`.
pub fn clamp_tree_depth(depth: i64) -> usize {
    depth.clamp(MIN_TREE_DEPTH as i64, MAX_TREE_DEPTH as i64) as usize
}

/// Department hierarchy engine facade.
pub struct HierarchyService<R: DepartmentRepository> {
    repo: R,
}

impl<R: DepartmentRepository> HierarchyService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one department under an optional parent.
    pub fn create_department(
        &self,
        command: CreateDepartment,
    ) -> Result<Department, HierarchyError> {
        let name = normalize_field("name", &command.name)?;
        let parent_id = command.parent_id;

        self.repo.with_transaction(|| {
            if let Some(parent_id) = parent_id {
                self.require_department(parent_id, HierarchyError::ParentNotFound)?;
            }
            if self.repo.name_taken(parent_id, &name, None)? {
                return Err(HierarchyError::DuplicateName { name, parent_id });
            }
            Ok(self.repo.create_department(&name, parent_id)?)
        })
    }

    /// Renames and/or reparents one department.
    pub fn update_department(
        &self,
        id: DepartmentId,
        command: UpdateDepartment,
    ) -> Result<Department, HierarchyError> {
        self.repo.with_transaction(|| {
            let current = self.require_department(id, HierarchyError::DepartmentNotFound)?;

            let name = match command.name.as_deref() {
                Some(raw) if !raw.is_empty() => normalize_field("name", raw)?,
                _ => current.name.clone(),
            };

            let parent_id = match command.parent {
                ParentUpdate::Unchanged => current.parent_id,
                ParentUpdate::DetachToRoot => None,
                ParentUpdate::MoveUnder(parent_id) => {
                    self.validate_reparent(id, parent_id)?;
                    Some(parent_id)
                }
            };

            let changed = name != current.name || parent_id != current.parent_id;
            if changed && self.repo.name_taken(parent_id, &name, Some(id))? {
                return Err(HierarchyError::DuplicateName { name, parent_id });
            }

            self.repo
                .update_department(id, &name, parent_id)?
                .ok_or(HierarchyError::DepartmentNotFound(id))
        })
    }

    /// Deletes one department by mode.
    ///
    /// - `Cascade` removes the department, every descendant department and
    ///   all their employees.
    /// - `Reassign` requires `reassign_to`, moves the direct employees there
    ///   and removes the department. Fails with `HasChildren` when child
    ///   departments still reference it.
    pub fn delete_department(
        &self,
        id: DepartmentId,
        mode: DeleteMode,
        reassign_to: Option<DepartmentId>,
    ) -> Result<DeleteOutcome, HierarchyError> {
        self.require_department(id, HierarchyError::DepartmentNotFound)?;

        match mode {
            DeleteMode::Cascade => self.repo.with_transaction(|| {
                let doomed = self.collect_subtree_ids(id)?;
                let departments_removed = self.repo.delete_departments(&doomed)?;
                Ok(DeleteOutcome {
                    departments_removed,
                    employees_reassigned: 0,
                })
            }),
            DeleteMode::Reassign => {
                let target = reassign_to.ok_or(HierarchyError::MissingReassignTarget)?;
                if target == id {
                    return Err(HierarchyError::ReassignToSelf(id));
                }

                self.repo.with_transaction(|| {
                    self.require_department(id, HierarchyError::DepartmentNotFound)?;
                    self.require_department(target, HierarchyError::ReassignTargetNotFound)?;
                    if !self.repo.list_child_ids(id)?.is_empty() {
                        return Err(HierarchyError::HasChildren(id));
                    }

                    let employees_reassigned = self.repo.reassign_employees(id, target)?;
                    let departments_removed = self.repo.delete_departments(&[id])?;
                    Ok(DeleteOutcome {
                        departments_removed,
                        employees_reassigned,
                    })
                })
            }
        }
    }

    /// Loads one department without children or employees.
    pub fn get_department(&self, id: DepartmentId) -> Result<Department, HierarchyError> {
        self.require_department(id, HierarchyError::DepartmentNotFound)
    }

    /// Lists root departments by creation order.
    pub fn list_root_departments(&self) -> Result<Vec<Department>, HierarchyError> {
        Ok(self.repo.list_children(None)?)
    }

    /// Assembles a department with up to `depth` levels of its subtree.
    ///
    /// `depth` is clamped into `[MIN_TREE_DEPTH, MAX_TREE_DEPTH]`. Reads are
    /// not transactional: a descendant whose children or employees fail to
    /// load is left out instead of failing the whole read. Failures on the
    /// requested department itself are returned.
    pub fn get_department_tree(
        &self,
        id: DepartmentId,
        depth: i64,
        include_employees: bool,
    ) -> Result<DepartmentTree, HierarchyError> {
        let depth = clamp_tree_depth(depth);
        let root = self.require_department(id, HierarchyError::DepartmentNotFound)?;

        let mut root_node = DepartmentTree::leaf(root);
        if include_employees {
            root_node.employees = Some(self.repo.list_employees(id)?);
        }

        let mut slots = vec![Some(TreeSlot {
            node: root_node,
            parent: None,
            skipped: false,
        })];
        let mut worklist = VecDeque::from([(0usize, depth)]);

        while let Some((index, remaining)) = worklist.pop_front() {
            if remaining <= MIN_TREE_DEPTH {
                continue;
            }
            let Some(department_id) = slots[index]
                .as_ref()
                .map(|slot| slot.node.department.id)
            else {
                continue;
            };

            let children = match self.repo.list_children(Some(department_id)) {
                Ok(children) => children,
                Err(err) if index == 0 => return Err(err.into()),
                Err(_) => {
                    if let Some(slot) = slots[index].as_mut() {
                        slot.skipped = true;
                    }
                    continue;
                }
            };

            for child in children {
                let child_id = child.id;
                let mut node = DepartmentTree::leaf(child);
                if include_employees {
                    match self.repo.list_employees(child_id) {
                        Ok(employees) => node.employees = Some(employees),
                        Err(_) => continue,
                    }
                }
                slots.push(Some(TreeSlot {
                    node,
                    parent: Some(index),
                    skipped: false,
                }));
                worklist.push_back((slots.len() - 1, remaining - 1));
            }
        }

        // Children always sit at higher indices than their parent, so a
        // reverse sweep completes every node before attaching it.
        for index in (1..slots.len()).rev() {
            let Some(slot) = slots[index].take() else {
                continue;
            };
            if slot.skipped {
                continue;
            }
            let mut node = slot.node;
            node.children.reverse();
            if let Some(parent) = slot.parent {
                if let Some(parent_slot) = slots[parent].as_mut() {
                    parent_slot.node.children.push(node);
                }
            }
        }

        let mut root = slots
            .swap_remove(0)
            .map(|slot| slot.node)
            .ok_or(HierarchyError::DepartmentNotFound(id))?;
        root.children.reverse();
        Ok(root)
    }

    /// Returns the ancestor ids of `id`, nearest parent first.
    ///
    /// The walk stops at a root, at a parent reference whose row no longer
    /// exists (that dangling id is still reported), or at the first id seen
    /// twice in a corrupted store. A missing `id` yields an empty chain.
    pub fn ancestor_chain(&self, id: DepartmentId) -> Result<Vec<DepartmentId>, HierarchyError> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut cursor = id;

        while let Some(department) = self.repo.get_department(cursor)? {
            let Some(parent_id) = department.parent_id else {
                break;
            };
            if !visited.insert(parent_id) {
                break;
            }
            chain.push(parent_id);
            cursor = parent_id;
        }
        Ok(chain)
    }

    fn validate_reparent(
        &self,
        id: DepartmentId,
        parent_id: DepartmentId,
    ) -> Result<(), HierarchyError> {
        if parent_id == id {
            return Err(HierarchyError::SelfParent(id));
        }
        if self.ancestor_chain(parent_id)?.contains(&id) {
            return Err(HierarchyError::CycleDetected {
                department_id: id,
                parent_id,
            });
        }
        self.require_department(parent_id, HierarchyError::ParentNotFound)?;
        Ok(())
    }

    fn collect_subtree_ids(&self, id: DepartmentId) -> Result<Vec<DepartmentId>, HierarchyError> {
        let mut collected = vec![id];
        let mut seen = HashSet::from([id]);
        let mut worklist = VecDeque::from([id]);

        while let Some(current) = worklist.pop_front() {
            for child_id in self.repo.list_child_ids(current)? {
                if seen.insert(child_id) {
                    collected.push(child_id);
                    worklist.push_back(child_id);
                }
            }
        }
        Ok(collected)
    }

    fn require_department(
        &self,
        id: DepartmentId,
        not_found: fn(DepartmentId) -> HierarchyError,
    ) -> Result<Department, HierarchyError> {
        self.repo.get_department(id)?.ok_or_else(|| not_found(id))
    }
}

struct TreeSlot {
    node: DepartmentTree,
    parent: Option<usize>,
    skipped: bool,
}
