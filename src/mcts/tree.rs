//! Search tree vertices and the [UCT] selection rule.
//!
//! The tree is strictly owned: every [`Node`] owns its children, the root is
//! owned by the [`super::Searcher`]. Nodes never share children and do not
//! keep references to their parents; the path from the root is tracked by the
//! searcher instead.
//!
//! [UCT]: https://www.chessprogramming.org/UCT

use tracing::debug;

use super::error::SearchError;
use crate::environment::{Environment, Rewards, Role};

/// One position in the search tree.
///
/// `active_role` and the terminal status are computed once when the node is
/// created and never change. Children are created in a single
/// [`Node::expand`] call and are never added or removed afterwards.
pub struct Node<E: Environment<ROLES>, const ROLES: usize> {
    state: E::State,
    active_role: Role,
    /// `Some` iff the state is terminal.
    terminal_rewards: Option<Rewards<ROLES>>,
    /// Number of completed iterations that went through this node.
    visit_count: u64,
    /// Sum of rewards (per role) of all iterations that went through this
    /// node.
    total_value: Rewards<ROLES>,
    /// Children in the order the environment enumerates legal actions. The
    /// order is what breaks ties between equally scored children.
    children: Vec<(E::Action, Self)>,
    expanded: bool,
}

impl<E: Environment<ROLES>, const ROLES: usize> Node<E, ROLES> {
    /// Creates an unvisited, unexpanded node for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::RoleOutOfRange`] if the environment reports an
    /// active role that is not less than `ROLES`.
    pub fn new(environment: &E, state: E::State) -> Result<Self, SearchError> {
        let active_role = environment.active_role(&state);
        if active_role >= ROLES {
            return Err(SearchError::RoleOutOfRange {
                role: active_role,
                roles: ROLES,
            });
        }
        let terminal_rewards = environment
            .is_terminal(&state)
            .then(|| environment.evaluate_terminal(&state));
        Ok(Self {
            state,
            active_role,
            terminal_rewards,
            visit_count: 0,
            total_value: [0.0; ROLES],
            children: Vec::new(),
            expanded: false,
        })
    }

    /// The state this node wraps.
    #[must_use]
    pub const fn state(&self) -> &E::State {
        &self.state
    }

    /// The role choosing the action at this node.
    #[must_use]
    pub const fn active_role(&self) -> Role {
        self.active_role
    }

    /// Returns `true` if the state admits no further actions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.terminal_rewards.is_some()
    }

    /// Outcome of the terminal state, `None` for non-terminal nodes.
    #[must_use]
    pub const fn terminal_rewards(&self) -> Option<&Rewards<ROLES>> {
        self.terminal_rewards.as_ref()
    }

    /// Returns `true` once the children have been created.
    #[must_use]
    pub const fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Number of completed iterations that went through this node.
    #[must_use]
    pub const fn visit_count(&self) -> u64 {
        self.visit_count
    }

    /// Sum of rewards per role over all visits.
    #[must_use]
    pub const fn total_value(&self) -> &Rewards<ROLES> {
        &self.total_value
    }

    /// Average reward of `role` over all visits, `None` if the node was never
    /// visited.
    #[must_use]
    pub fn mean_value(&self, role: Role) -> Option<f64> {
        (self.visit_count > 0).then(|| self.total_value[role] / self.visit_count as f64)
    }

    /// Iterates over `(action, child)` pairs in the order of expansion.
    pub fn children(&self) -> impl Iterator<Item = (&E::Action, &Self)> {
        self.children.iter().map(|(action, child)| (action, child))
    }

    /// Returns the child reached by `action`, if the node is expanded and the
    /// action is one of its legal actions.
    #[must_use]
    pub fn child(&self, action: &E::Action) -> Option<&Self> {
        self.children
            .iter()
            .find_map(|(candidate, child)| (candidate == action).then_some(child))
    }

    /// Creates one child per legal action.
    ///
    /// # Errors
    ///
    /// Expanding a node twice or expanding a terminal node is a logic error.
    /// A non-terminal state without legal actions violates the
    /// [`Environment`] contract.
    pub fn expand(&mut self, environment: &E) -> Result<(), SearchError> {
        if self.expanded {
            return Err(SearchError::AlreadyExpanded);
        }
        if self.is_terminal() {
            return Err(SearchError::TerminalExpansion);
        }
        let actions = environment.legal_actions(&self.state);
        if actions.is_empty() {
            return Err(SearchError::NoLegalActions);
        }
        self.children = actions
            .into_iter()
            .map(|action| {
                let next = environment.apply(&self.state, &action);
                Self::new(environment, next).map(|child| (action, child))
            })
            .collect::<Result<_, _>>()?;
        self.expanded = true;
        debug!(
            role = self.active_role,
            children = self.children.len(),
            "expanded node"
        );
        Ok(())
    }

    /// Accumulates the outcome of one iteration and returns the same rewards
    /// so that they can be passed further up the tree.
    pub fn update(&mut self, rewards: Rewards<ROLES>) -> Rewards<ROLES> {
        self.visit_count += 1;
        for (total, reward) in self.total_value.iter_mut().zip(rewards) {
            *total += reward;
        }
        rewards
    }

    /// Scores the child reached by `action` with UCT from the perspective of
    /// this node's active role. Only meaningful for comparing siblings.
    ///
    /// # Errors
    ///
    /// Fails if `action` does not lead to a child or if a visited child is
    /// scored while this node has no visits.
    pub fn evaluate_child(
        &self,
        action: &E::Action,
        exploration: f64,
    ) -> Result<f64, SearchError> {
        let child = self.existing_child(action)?;
        self.uct(child, exploration)
    }

    /// Average reward of the child reached by `action` for this node's
    /// active role, without the exploration bonus.
    ///
    /// # Errors
    ///
    /// Fails if `action` does not lead to a child.
    pub fn child_value(&self, action: &E::Action) -> Result<f64, SearchError> {
        let child = self.existing_child(action)?;
        Ok(self.exploitation(child))
    }

    /// The action with the highest UCT score. Ties are resolved in favor of
    /// the child that was created first.
    ///
    /// # Errors
    ///
    /// Fails if the node has no children.
    pub fn best_action(&self, exploration: f64) -> Result<&E::Action, SearchError> {
        let index = self.select(exploration)?;
        Ok(&self.children[index].0)
    }

    /// The child with the highest UCT score.
    ///
    /// # Errors
    ///
    /// Fails if the node has no children.
    pub fn best_child(&self, exploration: f64) -> Result<&Self, SearchError> {
        let index = self.select(exploration)?;
        Ok(&self.children[index].1)
    }

    /// The action with the highest average reward. This is what should be
    /// played once the search is over.
    ///
    /// Only children with known outcomes compete: visited or terminal ones.
    /// If there are none, the first child is returned.
    ///
    /// # Errors
    ///
    /// Fails if the node has no children.
    pub fn recommended_action(&self) -> Result<&E::Action, SearchError> {
        let index = argmax(self.children.iter().map(|(_, child)| {
            if child.is_terminal() || child.visit_count > 0 {
                Ok(self.exploitation(child))
            } else {
                Ok(f64::NEG_INFINITY)
            }
        }))?;
        Ok(&self.children[index].0)
    }

    /// Index of the child with the highest UCT score.
    pub(super) fn select(&self, exploration: f64) -> Result<usize, SearchError> {
        argmax(
            self.children
                .iter()
                .map(|(_, child)| self.uct(child, exploration)),
        )
    }

    pub(super) fn child_at(&self, index: usize) -> &Self {
        &self.children[index].1
    }

    pub(super) fn child_at_mut(&mut self, index: usize) -> &mut Self {
        &mut self.children[index].1
    }

    fn existing_child(&self, action: &E::Action) -> Result<&Self, SearchError> {
        self.child(action)
            .ok_or_else(|| SearchError::UnknownAction(format!("{action:?}")))
    }

    fn uct(&self, child: &Self, exploration: f64) -> Result<f64, SearchError> {
        // Terminal outcomes are exact, exploring them further is pointless.
        if let Some(rewards) = child.terminal_rewards {
            return Ok(rewards[self.active_role]);
        }
        if child.visit_count == 0 {
            return Ok(f64::INFINITY);
        }
        if self.visit_count == 0 {
            return Err(SearchError::UnvisitedParent);
        }
        let child_visits = child.visit_count as f64;
        let exploitation = child.total_value[self.active_role] / child_visits;
        let parent_visits = self.visit_count as f64;
        let bonus = 2.0 * exploration * (2.0 * parent_visits.ln() / child_visits).sqrt();
        Ok(exploitation + bonus)
    }

    fn exploitation(&self, child: &Self) -> f64 {
        if let Some(rewards) = child.terminal_rewards {
            return rewards[self.active_role];
        }
        child
            .mean_value(self.active_role)
            .unwrap_or(f64::INFINITY)
    }
}

/// Index of the first maximum.
fn argmax(scores: impl Iterator<Item = Result<f64, SearchError>>) -> Result<usize, SearchError> {
    let mut best: Option<(usize, f64)> = None;
    for (index, score) in scores.enumerate() {
        let score = score?;
        if best.map_or(true, |(_, max)| score > max) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index).ok_or(SearchError::NoChildren)
}
