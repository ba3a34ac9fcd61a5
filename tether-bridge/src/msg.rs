//! Wire messages exchanged with the remote agent service.
//!
//! All batches are ordered: slot `i` of every message refers to the `i`-th
//! controllable in discovery order. There are no entity identifiers on the
//! wire; position is the only correspondence key.
use serde::{Deserialize, Serialize};
use tether_core::{Action, EnvDesc, Observation};

/// Environment descriptors for all controllables, sent once per episode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentBatch {
    /// One descriptor per controllable, in discovery order.
    pub envs: Vec<EnvDesc>,
}

/// Acknowledgment of an environment delivery. Carries nothing but the
/// verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ack {
    /// Whether the agent accepted the descriptors.
    pub success: bool,
}

/// One controllable's contribution to an exchange: the reward accumulated
/// since the previous exchange, its local termination flag, and its current
/// observation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    /// Reward summed over the physics ticks since the last exchange.
    pub reward: f64,

    /// Local termination reported by the entity's own reward logic.
    pub done: bool,

    /// The entity's current observation.
    pub observation: Observation,
}

/// Reward/observation report for all controllables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeBatch {
    /// One record per controllable, in discovery order.
    pub records: Vec<ExchangeRecord>,

    /// Whether any entity reported local termination this tick.
    pub done: bool,
}

/// The remote agent's decisions for the next control window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionBatch {
    /// One action per controllable, in discovery order. The bridge refuses
    /// the whole batch when this count disagrees with its own.
    pub actions: Vec<Action>,

    /// Episode termination declared by the agent itself.
    pub done: bool,
}
