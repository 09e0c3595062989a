//! Interface between the search and the rules of a sequential decision process
//! (e.g. a board game). The search only ever talks to the process through
//! [`Environment`], so any turn-based, perfect-information game with a fixed
//! number of roles can be plugged in.

use std::fmt::Debug;

/// Index of a decision-making party (e.g. a player). Roles are numbered
/// `0..ROLES`.
pub type Role = usize;

/// Outcome of a playout: one value per role.
pub type Rewards<const ROLES: usize> = [f64; ROLES];

/// Rules of a decision process with `ROLES` participants.
///
/// All methods are pure queries: the same state always produces the same
/// answer. States are immutable snapshots, [`Environment::apply`] produces a
/// new state instead of mutating the old one.
pub trait Environment<const ROLES: usize> {
    /// Complete snapshot of the process at one point in time.
    type State;
    /// Distinguishes one legal transition from another at a given state.
    type Action: Clone + Eq + Debug;

    /// Returns `true` if no further actions are possible.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Outcome of the terminal `state` for every role.
    ///
    /// Only called when [`Environment::is_terminal`] holds.
    fn evaluate_terminal(&self, state: &Self::State) -> Rewards<ROLES>;

    /// The role that chooses the next action at `state`. Must be less than
    /// `ROLES`.
    fn active_role(&self, state: &Self::State) -> Role;

    /// All actions available at `state`. Must be non-empty for non-terminal
    /// states and must enumerate the same actions in the same order every time
    /// it is queried on an identical state.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Produces the state that follows `state` after taking `action`.
    ///
    /// `action` is always one of [`Environment::legal_actions`] for `state`.
    fn apply(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Human-readable representation of the state for diagnostics.
    fn describe_state(&self, state: &Self::State) -> String;

    /// Human-readable representation of the action for diagnostics.
    fn describe_action(&self, action: &Self::Action) -> String {
        format!("{action:?}")
    }
}
