//! Traits implemented by the simulation side of the bridge.
use crate::{Action, EnvDesc, Observation};

/// The decision component of an entity steered by a remote agent.
///
/// The bridge calls these four methods and nothing else. How the entity
/// integrates its motion, generates sensor data, or registers itself with
/// the simulation is entirely its own business.
pub trait Controllable {
    /// Describes the entity's action and observation spaces.
    ///
    /// Called once per episode, before the first exchange. The returned
    /// descriptor must not change afterwards.
    fn env_desc(&self) -> EnvDesc;

    /// Computes the reward earned over the step ending at time `t` with
    /// duration `dt`, and whether the entity considers the episode over.
    fn calc_reward(&mut self, t: f64, dt: f64) -> (bool, f64);

    /// Writes the current observation into `obs`.
    ///
    /// The sink is cleared by the caller before this is invoked, so the
    /// implementor only appends values.
    fn observe(&mut self, t: f64, obs: &mut Observation);

    /// Applies an action received from the remote agent.
    ///
    /// An action with `done` set means the episode is over; the entity
    /// should stop producing control outputs.
    fn set_action(&mut self, act: &Action);
}

/// An entity of the simulated world, as seen by the bridge.
///
/// The bridge scans all entities once per episode and keeps, in scan order,
/// those that answer the capability query below.
pub trait Entity {
    /// Returns the remote-control capability if this entity carries one.
    ///
    /// The default implementation returns `None`; entities that are not
    /// remotely steered need not implement anything.
    fn controllable(&mut self) -> Option<&mut dyn Controllable> {
        None
    }
}

/// What the bridge tells the simulation after each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodeSignal {
    /// Keep stepping the episode.
    Continue,
    /// The episode is over; stop stepping.
    Stop,
}

impl EpisodeSignal {
    /// Returns `true` for [`EpisodeSignal::Stop`].
    pub fn is_stop(&self) -> bool {
        matches!(self, EpisodeSignal::Stop)
    }
}
