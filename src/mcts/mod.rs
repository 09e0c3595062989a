//! Implements [Monte Carlo Tree Search] (MCTS) with the UCT selection rule and
//! uniformly random rollouts.
//!
//! Every iteration of [`Searcher::search_once`] performs the four classic
//! phases:
//!
//! 1. Selection: Start from the root and repeatedly descend into the child
//!    with the highest UCT score until a terminal or unexpanded node is
//!    reached.
//! 2. Expansion: If the node is not terminal, create one child per legal
//!    action and pick the best (necessarily unvisited) one.
//! 3. Simulation: Play random actions from the new child until the process
//!    ends.
//! 4. Backpropagation: Add the outcome to every node on the path from the
//!    root, exactly once per node.
//!
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search

use std::io::Write;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::environment::{Environment, Rewards};

mod error;
pub mod policy;
mod tree;

pub use error::SearchError;
pub use tree::Node;

/// Default exploration constant ($C$ in the UCT formula).
pub const EXPLORATION: f64 = 0.5;

/// Parameters of the search.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Maximum number of iterations to perform.
    pub iterations: Option<u64>,
    /// Maximum wall time of [`Searcher::run`]. The iteration in flight is
    /// always completed.
    pub time: Option<Duration>,
    /// Weight of the exploration term: higher values make the search wider,
    /// lower values make it deeper.
    pub exploration: f64,
    /// Seed of the random number generator used by rollouts. Two searches with
    /// the same seed, configuration and root produce identical trees.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            iterations: Some(10_000),
            time: None,
            exploration: EXPLORATION,
            seed: 0,
        }
    }
}

impl Config {
    /// Sets the iteration budget.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Sets the wall time budget.
    #[must_use]
    pub const fn with_time(mut self, time: Duration) -> Self {
        self.time = Some(time);
        self
    }

    /// Sets the exploration constant.
    #[must_use]
    pub const fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    /// Sets the seed of the rollout random number generator.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks that the search terminates and that the exploration term is
    /// well-defined.
    ///
    /// # Errors
    ///
    /// Fails if there is neither an iteration nor a time budget or if the
    /// exploration constant is negative or not finite.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.iterations.is_none() && self.time.is_none() {
            return Err(SearchError::Unbounded);
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(SearchError::InvalidExploration(self.exploration));
        }
        Ok(())
    }
}

/// Tracks the budget of a single [`Searcher::run`].
struct Limiter {
    timer: Instant,
    iterations: Option<u64>,
    time: Option<Duration>,
}

impl Limiter {
    fn new(config: &Config) -> Self {
        Self {
            timer: Instant::now(),
            iterations: config.iterations,
            time: config.time,
        }
    }

    fn exhausted(&self, iterations: u64) -> bool {
        if self.iterations.is_some_and(|limit| iterations >= limit) {
            return true;
        }
        self.time.is_some_and(|limit| self.timer.elapsed() >= limit)
    }
}

/// Summary of a [`Searcher::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchStats {
    /// Number of completed iterations.
    pub iterations: u64,
    /// Wall time spent searching.
    pub elapsed: Duration,
}

/// Owns the search tree, the environment and the random number generator.
///
/// The searcher builds a single tree from a single root; the tree is dropped
/// together with the searcher (or handed off via [`Searcher::into_root`]).
pub struct Searcher<E: Environment<ROLES>, const ROLES: usize> {
    environment: E,
    root: Node<E, ROLES>,
    config: Config,
    rng: ChaCha8Rng,
}

impl<E: Environment<ROLES>, const ROLES: usize> Searcher<E, ROLES> {
    /// Creates a search tree consisting of just the root for `state`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or if the environment reports an
    /// invalid active role for `state`.
    pub fn new(environment: E, state: E::State, config: Config) -> Result<Self, SearchError> {
        config.validate()?;
        let root = Node::new(&environment, state)?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            environment,
            root,
            config,
            rng,
        })
    }

    /// The root of the search tree.
    #[must_use]
    pub const fn root(&self) -> &Node<E, ROLES> {
        &self.root
    }

    /// The rules the tree is built with.
    #[must_use]
    pub const fn environment(&self) -> &E {
        &self.environment
    }

    /// Parameters the searcher was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Releases the tree.
    #[must_use]
    pub fn into_root(self) -> Node<E, ROLES> {
        self.root
    }

    /// Performs a single iteration and returns the outcome that was added to
    /// every node on the path.
    ///
    /// # Errors
    ///
    /// Fails only if the environment violates its contract.
    pub fn search_once(&mut self) -> Result<Rewards<ROLES>, SearchError> {
        let exploration = self.config.exploration;

        // Selection. Only expanded nodes are descended into, and a node is
        // expanded on its first visit, so every parent whose children are
        // compared has been updated at least once before.
        let mut path = Vec::new();
        let mut node = &self.root;
        while node.is_expanded() {
            let index = node.select(exploration)?;
            path.push(index);
            node = node.child_at(index);
        }

        let leaf = descend(&mut self.root, &path);
        let rewards = match leaf.terminal_rewards() {
            Some(rewards) => *rewards,
            None => {
                // Expansion and simulation.
                leaf.expand(&self.environment)?;
                let index = leaf.select(exploration)?;
                let child = leaf.child_at_mut(index);
                child.update(policy::rollout(
                    &self.environment,
                    child.state(),
                    &mut self.rng,
                )?)
            }
        };

        backpropagate(&mut self.root, &path, rewards);
        trace!(depth = path.len(), ?rewards, "iteration complete");
        Ok(rewards)
    }

    /// Runs iterations until the iteration or time budget is exhausted,
    /// whichever comes first.
    ///
    /// # Errors
    ///
    /// Fails only if the environment violates its contract.
    pub fn run(&mut self) -> Result<SearchStats, SearchError> {
        let limiter = Limiter::new(&self.config);
        let mut iterations = 0;
        while !limiter.exhausted(iterations) {
            let _ = self.search_once()?;
            iterations += 1;
        }
        let stats = SearchStats {
            iterations,
            elapsed: limiter.timer.elapsed(),
        };
        debug!(
            iterations = stats.iterations,
            elapsed_ms = stats.elapsed.as_millis(),
            root_visits = self.root.visit_count(),
            "search finished"
        );
        Ok(stats)
    }

    /// The child of the root with the highest UCT score.
    ///
    /// # Errors
    ///
    /// Fails if the root has not been expanded yet (or is terminal).
    pub fn best_action(&self) -> Result<&E::Action, SearchError> {
        self.root.best_action(self.config.exploration)
    }

    /// The child of the root with the highest average reward.
    ///
    /// # Errors
    ///
    /// Fails if the root has not been expanded yet (or is terminal).
    pub fn recommended_action(&self) -> Result<&E::Action, SearchError> {
        self.root.recommended_action()
    }

    /// Writes the statistics of the root and its children in a
    /// human-readable format.
    ///
    /// # Errors
    ///
    /// Fails if writing to `output` fails.
    pub fn report(&self, output: &mut impl Write) -> anyhow::Result<()> {
        let root = &self.root;
        write!(output, "{}", self.environment.describe_state(root.state()))?;
        writeln!(
            output,
            "info role {} visits {} value {:?}",
            root.active_role(),
            root.visit_count(),
            root.total_value()
        )?;
        if let Some(rewards) = root.terminal_rewards() {
            writeln!(output, "info terminal {rewards:?}")?;
            return Ok(());
        }
        for (action, child) in root.children() {
            writeln!(
                output,
                "info action {} visits {} score {:.4} value {:.4}",
                self.environment.describe_action(action),
                child.visit_count(),
                root.evaluate_child(action, self.config.exploration)?,
                root.child_value(action)?,
            )?;
        }
        if root.is_expanded() {
            writeln!(
                output,
                "bestaction {}",
                self.environment.describe_action(root.recommended_action()?)
            )?;
        }
        Ok(())
    }
}

fn descend<'a, E: Environment<ROLES>, const ROLES: usize>(
    mut node: &'a mut Node<E, ROLES>,
    path: &[usize],
) -> &'a mut Node<E, ROLES> {
    for &index in path {
        node = node.child_at_mut(index);
    }
    node
}

fn backpropagate<E: Environment<ROLES>, const ROLES: usize>(
    root: &mut Node<E, ROLES>,
    path: &[usize],
    rewards: Rewards<ROLES>,
) {
    let mut node = root;
    let mut rewards = node.update(rewards);
    for &index in path {
        node = node.child_at_mut(index);
        rewards = node.update(rewards);
    }
}
