//! Action representations and action spaces

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for actions in an RL environment
pub trait Action: Clone + Debug + Send + Sync {
    /// Convert action to a vector representation
    fn to_vec(&self) -> Vec<f64>;
}

/// Trait for defining action spaces
pub trait ActionSpace: Send + Sync {
    /// The type of actions in this space
    type Action: Action;

    /// Sample a random action from the space
    fn sample(&self) -> Self::Action;

    /// Check if an action is valid within this space
    fn contains(&self, action: &Self::Action) -> bool;

    /// Get the dimensionality of the action space
    fn dim(&self) -> Option<usize>;
}

/// Discrete action, an index into a [`DiscreteSpace`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscreteAction(pub usize);

impl Action for DiscreteAction {
    #[allow(clippy::cast_precision_loss)]
    fn to_vec(&self) -> Vec<f64> {
        vec![self.0 as f64]
    }
}

impl From<usize> for DiscreteAction {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Discrete action space `{0, 1, ..., n - 1}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteSpace {
    /// Number of discrete actions
    pub n: usize,
}

impl DiscreteSpace {
    /// Create a new discrete action space
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl ActionSpace for DiscreteSpace {
    type Action = DiscreteAction;

    fn sample(&self) -> Self::Action {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        DiscreteAction(rng.gen_range(0..self.n))
    }

    fn contains(&self, action: &Self::Action) -> bool {
        action.0 < self.n
    }

    fn dim(&self) -> Option<usize> {
        Some(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_discrete_space_bounds() {
        let space = DiscreteSpace::new(4);
        assert!(space.contains(&DiscreteAction(0)));
        assert!(space.contains(&DiscreteAction(3)));
        assert!(!space.contains(&DiscreteAction(4)));
        assert_eq!(space.dim(), Some(1));
    }

    proptest! {
        #[test]
        fn prop_samples_are_contained(n in 1usize..64) {
            let space = DiscreteSpace::new(n);
            for _ in 0..16 {
                prop_assert!(space.contains(&space.sample()));
            }
        }
    }
}
