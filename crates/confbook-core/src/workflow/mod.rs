//! Workflow module
//!
//! A workflow is a finite state machine over an entity's marking. Each entity
//! kind names its machine through [`Workflowable::Machine`], so resolving the
//! machine for an entity happens at compile time.
//!
//! # Example
//!
//! ```ignore
//! use confbook_core::workflow::{CommentWorkflow, StateMachine};
//!
//! if CommentWorkflow::can(&comment, "accept_as_ham") {
//!     CommentWorkflow::apply(&mut comment, "accept_as_ham")?;
//! }
//! ```

mod comment;

pub use comment::{select_review_transition, CommentTransition, CommentWorkflow};

use crate::error::{ConfbookError, Result};
use std::fmt;
use std::str::FromStr;

/// A named, directed edge of a state graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge<S, T> {
    pub transition: T,
    pub from: S,
    pub to: S,
}

/// A finite state machine definition
///
/// Implementations only describe the graph; the provided methods are pure
/// except for [`StateMachine::apply`], which is the sole writer of an
/// entity's marking.
pub trait StateMachine: Sized + 'static {
    /// Places of the graph
    type State: Copy + Eq + fmt::Display + 'static;
    /// Edge names of the graph
    type Transition: Copy + Eq + fmt::Display + FromStr<Err = ConfbookError> + 'static;

    /// Machine name, for logs
    const NAME: &'static str;

    /// Marking of newly created entities
    fn initial() -> Self::State;

    /// Every edge of the graph
    fn edges() -> &'static [Edge<Self::State, Self::Transition>];

    /// Target of `transition` from `state`, if that edge exists
    fn next(state: Self::State, transition: Self::Transition) -> Option<Self::State> {
        Self::edges()
            .iter()
            .find(|e| e.from == state && e.transition == transition)
            .map(|e| e.to)
    }

    /// Transitions leaving `state`
    fn enabled(state: Self::State) -> Vec<Self::Transition> {
        Self::edges()
            .iter()
            .filter(|e| e.from == state)
            .map(|e| e.transition)
            .collect()
    }

    /// Check if `state` has no outgoing edge
    fn is_terminal(state: Self::State) -> bool {
        Self::enabled(state).is_empty()
    }

    /// Check if `transition` is enabled for the entity's current marking
    fn can_transition<E>(entity: &E, transition: Self::Transition) -> bool
    where
        E: Workflowable<Machine = Self>,
    {
        Self::next(entity.marking(), transition).is_some()
    }

    /// Check if the named transition is enabled; unknown names are never enabled
    fn can<E>(entity: &E, transition: &str) -> bool
    where
        E: Workflowable<Machine = Self>,
    {
        transition
            .parse::<Self::Transition>()
            .map(|t| Self::can_transition(entity, t))
            .unwrap_or(false)
    }

    /// Apply a transition, returning the new marking
    fn apply_transition<E>(entity: &mut E, transition: Self::Transition) -> Result<Self::State>
    where
        E: Workflowable<Machine = Self>,
    {
        let from = entity.marking();
        let to = Self::next(from, transition).ok_or_else(|| ConfbookError::IllegalTransition {
            state: from.to_string(),
            transition: transition.to_string(),
        })?;

        entity.set_marking(to, sealed::Token(()));
        tracing::info!(
            workflow = Self::NAME,
            %transition,
            %from,
            %to,
            "Applied transition"
        );
        Ok(to)
    }

    /// Apply the named transition, returning the new marking
    ///
    /// Names that are not edges of the graph are illegal from every state.
    fn apply<E>(entity: &mut E, transition: &str) -> Result<Self::State>
    where
        E: Workflowable<Machine = Self>,
    {
        match transition.parse::<Self::Transition>() {
            Ok(transition) => Self::apply_transition(entity, transition),
            Err(_) => Err(ConfbookError::IllegalTransition {
                state: entity.marking().to_string(),
                transition: transition.to_string(),
            }),
        }
    }
}

/// An entity whose marking is governed by a state machine
pub trait Workflowable {
    /// The machine for this entity kind
    type Machine: StateMachine;

    /// Current marking
    fn marking(&self) -> <Self::Machine as StateMachine>::State;

    /// Overwrite the marking; only callable by [`StateMachine::apply_transition`]
    fn set_marking(&mut self, state: <Self::Machine as StateMachine>::State, token: sealed::Token);
}

pub mod sealed {
    /// Proof that a marking write comes from the workflow
    pub struct Token(pub(super) ());
}
