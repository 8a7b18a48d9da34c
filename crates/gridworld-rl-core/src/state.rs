//! State representations and state spaces

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for states in an RL environment
pub trait State: Clone + Debug + Send + Sync {
    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }

    /// Record that the episode was cut short at this state
    fn mark_truncated(&mut self) {}
}

/// Trait for defining state spaces
pub trait StateSpace: Send + Sync {
    /// The type of states in this space
    type State: State;

    /// Check if a state is valid within this space
    fn contains(&self, state: &Self::State) -> bool;

    /// Get the dimensionality of the state space
    fn dim(&self) -> Option<usize>;
}

/// Terminal state indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminal {
    /// Not a terminal state
    No,
    /// Terminal state (episode ends)
    Yes,
    /// Truncated (time limit reached)
    Truncated,
}

impl Terminal {
    /// Check if the state is terminal (either Yes or Truncated)
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::No)
    }
}

/// A simple vector state implementation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorState {
    /// The state vector
    pub data: Vec<f64>,
    /// Terminal status
    pub terminal: Terminal,
}

impl State for VectorState {
    fn is_terminal(&self) -> bool {
        self.terminal.is_terminal()
    }

    fn mark_truncated(&mut self) {
        if self.terminal == Terminal::No {
            self.terminal = Terminal::Truncated;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_truncated_keeps_termination() {
        let mut state = VectorState {
            data: vec![0.0],
            terminal: Terminal::No,
        };
        assert!(!state.is_terminal());
        state.mark_truncated();
        assert_eq!(state.terminal, Terminal::Truncated);
        assert!(state.is_terminal());

        let mut state = VectorState {
            data: vec![0.0],
            terminal: Terminal::Yes,
        };
        state.mark_truncated();
        assert_eq!(state.terminal, Terminal::Yes);
    }
}
