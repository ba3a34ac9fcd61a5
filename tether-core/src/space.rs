//! Action and observation space descriptors.
use crate::Action;
use serde::{Deserialize, Serialize};

/// A mixed discrete/continuous value space.
///
/// Each discrete dimension is described by its maximum value (values range
/// over `0..=max`), each continuous dimension by its finite extrema. A space
/// may carry both kinds of dimension at once.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Space {
    /// Maximum value of each discrete dimension.
    pub discrete_maxima: Vec<i64>,

    /// `(low, high)` bounds of each continuous dimension.
    pub continuous_extrema: Vec<(f64, f64)>,
}

impl Space {
    /// Appends a discrete dimension with values in `0..=maximum`.
    pub fn discrete(mut self, maximum: i64) -> Self {
        self.discrete_maxima.push(maximum);
        self
    }

    /// Appends a continuous dimension bounded by `low` and `high`.
    ///
    /// Bounds must be finite: the wire encoding has no representation for
    /// infinities.
    pub fn continuous(mut self, low: f64, high: f64) -> Self {
        self.continuous_extrema.push((low, high));
        self
    }

    /// Number of discrete dimensions.
    pub fn num_discrete(&self) -> usize {
        self.discrete_maxima.len()
    }

    /// Number of continuous dimensions.
    pub fn num_continuous(&self) -> usize {
        self.continuous_extrema.len()
    }

    /// Whether `act` has exactly the dimensions this space expects.
    ///
    /// Values are not range-checked; only the dimension counts matter for
    /// the positional correspondence the bridge relies on.
    pub fn accepts(&self, act: &Action) -> bool {
        act.discrete.len() == self.num_discrete()
            && act.continuous.len() == self.num_continuous()
    }
}

/// Per-entity description of the decision problem, sent to the remote agent
/// once per episode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvDesc {
    /// The space actions must lie in.
    pub action_space: Space,

    /// The space observations lie in.
    pub observation_space: Space,
}
