//! Department domain model.
//!
//! # Responsibility
//! - Define the persisted department record and the assembled tree view.
//!
//! # Invariants
//! - `id` is stable and assigned by the store.
//! - `parent_id` is a reference, never ownership: deleting a child never
//!   touches its parent.
//! - `name` is stored already trimmed.

use crate::model::employee::Employee;
use serde::{Deserialize, Serialize};

/// Stable department identifier assigned by the store.
pub type DepartmentId = i64;

/// Persisted department row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    /// `None` means root-level department.
    pub parent_id: Option<DepartmentId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// Department with a bounded slice of its subtree attached.
///
/// Serializes flat: the department fields sit next to `employees` and
/// `children`, matching the shape HTTP callers consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentTree {
    #[serde(flatten)]
    pub department: Department,
    /// Direct employees by creation order; `None` when not requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<Vec<Employee>>,
    /// Included child subtrees by creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DepartmentTree>,
}

impl DepartmentTree {
    /// Wraps one department without employees or children.
    pub fn leaf(department: Department) -> Self {
        Self {
            department,
            employees: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Department, DepartmentTree};

    fn department(id: i64, parent_id: Option<i64>) -> Department {
        Department {
            id,
            name: format!("D{id}"),
            parent_id,
            created_at: 0,
        }
    }

    #[test]
    fn tree_serializes_flat_and_omits_empty_sections() {
        let tree = DepartmentTree::leaf(department(7, None));
        let value = serde_json::to_value(&tree).unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["name"], "D7");
        assert!(value["parent_id"].is_null());
        assert!(value.get("employees").is_none());
        assert!(value.get("children").is_none());
    }

}
