//! Observation representations and observation spaces

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for observations from an environment
pub trait Observation: Clone + Debug + Send + Sync {
    /// Convert observation to a feature vector
    fn to_vec(&self) -> Vec<f64>;

    /// Get the shape of the observation
    fn shape(&self) -> Vec<usize>;
}

/// Trait for defining observation spaces
pub trait ObservationSpace: Send + Sync {
    /// The type of observations in this space
    type Observation: Observation;

    /// Sample a random observation from the space
    fn sample(&self) -> Self::Observation;

    /// Check if an observation is valid within this space
    fn contains(&self, obs: &Self::Observation) -> bool;

    /// Get the shape of observations in this space
    fn shape(&self) -> Vec<usize>;
}

/// Vector observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorObservation {
    /// The observation data
    pub data: Vec<f64>,
}

impl VectorObservation {
    /// Wrap raw observation data
    #[must_use]
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }
}

impl Observation for VectorObservation {
    fn to_vec(&self) -> Vec<f64> {
        self.data.clone()
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.data.len()]
    }
}

/// Box observation space with per-element bounds.
///
/// When `integral` is set, sampled values are whole numbers and
/// `contains` rejects fractional values, mirroring an integer box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxObservationSpace {
    /// Lower bounds
    pub low: Vec<f64>,
    /// Upper bounds
    pub high: Vec<f64>,
    /// Shape of observations
    pub shape: Vec<usize>,
    /// Whether values are restricted to integers
    #[serde(default)]
    pub integral: bool,
}

impl BoxObservationSpace {
    /// Create a new box observation space
    pub fn new(low: Vec<f64>, high: Vec<f64>, shape: Vec<usize>) -> crate::Result<Self> {
        let total_size: usize = shape.iter().product();
        if low.len() != total_size {
            return Err(crate::RLError::DimensionMismatch {
                expected: total_size,
                actual: low.len(),
            });
        }
        if high.len() != total_size {
            return Err(crate::RLError::DimensionMismatch {
                expected: total_size,
                actual: high.len(),
            });
        }
        if low.iter().zip(&high).any(|(l, h)| l > h) {
            return Err(crate::RLError::InvalidConfig(
                "box lower bound exceeds upper bound".to_string(),
            ));
        }
        Ok(Self {
            low,
            high,
            shape,
            integral: false,
        })
    }

    /// Restrict the space to integer values
    ///
    /// Fails if some `[low, high]` interval contains no integer.
    pub fn integral(mut self) -> crate::Result<Self> {
        if let Some((l, h)) = self
            .low
            .iter()
            .zip(&self.high)
            .find(|(l, h)| l.ceil() > h.floor())
        {
            return Err(crate::RLError::InvalidConfig(format!(
                "box interval [{l}, {h}] contains no integer"
            )));
        }
        self.integral = true;
        Ok(self)
    }
}

impl ObservationSpace for BoxObservationSpace {
    type Observation = VectorObservation;

    fn sample(&self) -> Self::Observation {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let data: Vec<f64> = self
            .low
            .iter()
            .zip(&self.high)
            .map(|(l, h)| {
                if self.integral {
                    rng.gen_range(l.ceil()..=h.floor()).round()
                } else {
                    rng.gen_range(*l..=*h)
                }
            })
            .collect();

        VectorObservation { data }
    }

    fn contains(&self, obs: &Self::Observation) -> bool {
        obs.data.len() == self.low.len()
            && obs
                .data
                .iter()
                .zip(&self.low)
                .zip(&self.high)
                .all(|((x, l), h)| x >= l && x <= h && (!self.integral || x.fract() == 0.0))
    }

    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_rejects_mismatched_bounds() {
        let err = BoxObservationSpace::new(vec![0.0; 3], vec![1.0; 4], vec![4]).unwrap_err();
        assert!(matches!(
            err,
            crate::RLError::DimensionMismatch { expected: 4, actual: 3 }
        ));

        assert!(BoxObservationSpace::new(vec![2.0], vec![1.0], vec![1]).is_err());
    }

    #[test]
    fn test_integral_box_contains_and_samples() {
        let space = BoxObservationSpace::new(vec![0.0; 4], vec![4.0; 4], vec![4])
            .unwrap()
            .integral()
            .unwrap();

        assert!(space.contains(&VectorObservation::new(vec![0.0, 1.0, 4.0, 2.0])));
        assert!(!space.contains(&VectorObservation::new(vec![0.5, 1.0, 4.0, 2.0])));
        assert!(!space.contains(&VectorObservation::new(vec![5.0, 1.0, 4.0, 2.0])));
        assert!(!space.contains(&VectorObservation::new(vec![1.0, 1.0])));

        for _ in 0..32 {
            assert!(space.contains(&space.sample()));
        }
    }

    #[test]
    fn test_integral_rejects_intervals_without_integers() {
        let space = BoxObservationSpace::new(vec![0.2], vec![0.8], vec![1]).unwrap();
        assert!(matches!(space.integral(), Err(crate::RLError::InvalidConfig(_))));

        let space = BoxObservationSpace::new(vec![0.2, 0.5], vec![1.0, 0.5], vec![2]).unwrap();
        assert!(space.integral().is_err());

        let space = BoxObservationSpace::new(vec![0.2], vec![1.0], vec![1])
            .unwrap()
            .integral()
            .unwrap();
        for _ in 0..8 {
            assert_eq!(space.sample().data, vec![1.0]);
        }
    }
}
