//! Bridges a stepped simulation to remotely hosted decision agents.
//!
//! The simulation advances in fixed physics ticks; the remote agent decides
//! at its own, usually much coarser, cadence, and each decision costs a
//! network round trip. This crate reconciles the two: [`ControlBridge`] is
//! called once per tick, accumulates each controllable entity's reward
//! locally, and only when the configured decision interval elapses does it
//! ship one batched report through [`AgentClient`] and wait (bounded by the
//! configured timeout) for the batched actions coming back.
//!
//! Positional correspondence is the contract everywhere: the entity order
//! fixed at discovery is the order of environment descriptors, of exchange
//! records, and of returned actions. Because no identifiers travel with the
//! payloads, a response whose action count disagrees with the entity count
//! cannot be trusted at all; the bridge then forces a terminal action onto
//! every entity rather than guessing at a partial assignment. A timeout, a
//! transport error, and an explicit remote error all look identical one
//! layer up, which keeps the termination logic in one place.
//!
//! The simulation side implements the traits of [`tether_core`]; see the
//! crate example for a minimal end-to-end episode against a stub agent.
mod bridge;
mod client;
mod config;
mod msg;
mod schedule;

pub use bridge::ControlBridge;
pub use client::{AgentClient, DEFAULT_TIMEOUT};
pub use config::BridgeConfig;
pub use msg::{Ack, ActionBatch, EnvironmentBatch, ExchangeBatch, ExchangeRecord};
pub use schedule::DecisionSchedule;
