//! Default (rollout) policy: plays uniformly random actions until the process
//! reaches a terminal state.

use rand::seq::SliceRandom;
use rand::Rng;

use super::error::SearchError;
use crate::environment::{Environment, Rewards};

/// Plays random actions from `state` until the end and returns the outcome.
///
/// The tree is not involved: the result only depends on `state` and the state
/// of `rng`.
///
/// # Errors
///
/// Returns [`SearchError::NoLegalActions`] if a non-terminal state on the way
/// has no legal actions.
pub fn rollout<E, R, const ROLES: usize>(
    environment: &E,
    state: &E::State,
    rng: &mut R,
) -> Result<Rewards<ROLES>, SearchError>
where
    E: Environment<ROLES>,
    R: Rng + ?Sized,
{
    if environment.is_terminal(state) {
        return Ok(environment.evaluate_terminal(state));
    }
    let mut current = step(environment, state, rng)?;
    while !environment.is_terminal(&current) {
        current = step(environment, &current, rng)?;
    }
    Ok(environment.evaluate_terminal(&current))
}

fn step<E, R, const ROLES: usize>(
    environment: &E,
    state: &E::State,
    rng: &mut R,
) -> Result<E::State, SearchError>
where
    E: Environment<ROLES>,
    R: Rng + ?Sized,
{
    let actions = environment.legal_actions(state);
    let action = actions.choose(rng).ok_or(SearchError::NoLegalActions)?;
    Ok(environment.apply(state, action))
}
