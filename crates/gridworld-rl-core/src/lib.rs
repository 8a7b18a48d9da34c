//! Core reinforcement learning traits and types for the GridWorld environments
//!
//! This crate provides the environment-facing abstractions shared by the
//! registry and the environments it constructs: the [`Environment`] trait,
//! step results, action and observation spaces, and the common error type.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod environment;
pub mod error;
pub mod observation;
pub mod reward;
pub mod state;

// Re-export core traits and types
pub use action::{Action, ActionSpace, DiscreteAction, DiscreteSpace};
pub use environment::{Environment, EnvironmentConfig, Episode, Step, StepInfo, TrackedEnvironment};
pub use error::{RLError, Result};
pub use observation::{BoxObservationSpace, Observation, ObservationSpace, VectorObservation};
pub use reward::Reward;
pub use state::{State, StateSpace, Terminal, VectorState};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, DiscreteAction, Environment, EnvironmentConfig, Observation,
        ObservationSpace, Reward, Result, State, Step, StepInfo, VectorObservation, VectorState,
    };
}
