use thiserror::Error;

use crate::environment::Role;

/// Violations of the [`crate::environment::Environment`] contract or of the
/// search tree invariants.
///
/// None of these are recoverable at runtime: a correct environment never
/// triggers them. They are reported instead of panicking so that the caller
/// decides how to fail.
#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    /// A non-terminal state reported no legal actions.
    #[error("non-terminal state has no legal actions")]
    NoLegalActions,

    /// The environment reported an active role outside of `0..roles`.
    #[error("active role {role} is out of range, expected < {roles}")]
    RoleOutOfRange {
        /// Reported role.
        role: Role,
        /// Number of roles the search was instantiated with.
        roles: usize,
    },

    /// The node has already been expanded.
    #[error("node is already expanded")]
    AlreadyExpanded,

    /// Terminal nodes have no children.
    #[error("terminal node can not be expanded")]
    TerminalExpansion,

    /// A visited child was scored before its parent received any visits.
    #[error("exploration term is undefined for a parent with zero visits")]
    UnvisitedParent,

    /// No child to select from.
    #[error("node has no children to select from")]
    NoChildren,

    /// The action does not lead to any child of the node.
    #[error("action {0} does not lead to a child of the node")]
    UnknownAction(String),

    /// Neither an iteration nor a time budget was given.
    #[error("search needs an iteration or a time budget")]
    Unbounded,

    /// Exploration constant must be finite and non-negative.
    #[error("exploration constant must be finite and non-negative, got {0}")]
    InvalidExploration(f64),
}
