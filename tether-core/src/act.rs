//! Actions received from the remote agent.
use serde::{Deserialize, Serialize};

/// One entity's decision for the next control window.
///
/// Discrete and continuous fields are filled positionally against the
/// entity's action [`Space`](crate::Space).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Values of the discrete action dimensions.
    pub discrete: Vec<i64>,

    /// Values of the continuous action dimensions.
    pub continuous: Vec<f64>,

    /// Set when the agent (or the bridge, on a failed exchange) ends the
    /// episode.
    pub done: bool,
}

impl Action {
    /// The empty action that only carries a termination flag.
    ///
    /// Forced uniformly onto every controllable when an exchange fails or
    /// its response cannot be trusted.
    pub fn terminal() -> Self {
        Action {
            done: true,
            ..Default::default()
        }
    }

    /// Whether this action ends the episode.
    pub fn is_done(&self) -> bool {
        self.done
    }
}
