//! Core use-case services.
//!
//! # Responsibility
//! - Resolve validated commands against the current tree inside one store
//!   transaction per mutation.
//! - Keep transport layers decoupled from storage details.
//!
//! # Invariants
//! - Services are stateless between calls and never log; callers decide
//!   what to report.

pub mod department_service;
pub mod employee_service;

/// Coarse classification of service failures for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range field.
    InvalidInput,
    /// Referenced entity absent.
    NotFound,
    /// Sibling-scope name collision.
    DuplicateName,
    /// Department proposed as its own parent.
    SelfParent,
    /// Proposed parent is a descendant of the subject.
    CycleDetected,
    /// Reassign delete requested on a department that still has children.
    HasChildren,
    /// Storage failure not attributable to the request.
    Internal,
}
