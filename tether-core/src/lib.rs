#![warn(missing_docs)]
//! Core abstractions for steering simulated entities from remote decision agents.
//!
//! A simulation that wants some of its entities driven by an externally
//! hosted agent (a reinforcement-learning policy, typically) implements the
//! traits in this crate: [`Entity`] for anything living in the simulated
//! world and [`Controllable`] for the decision component of an entity that
//! accepts remote actions. The bridge crate (`tether-bridge`) consumes these
//! traits; it never needs to know anything else about the simulation.
pub mod error;

mod act;
mod base;
mod obs;
mod space;

pub use act::Action;
pub use base::{Controllable, Entity, EpisodeSignal};
pub use obs::Observation;
pub use space::{EnvDesc, Space};
