//! Synchronizes controllable entities with a remote decision agent.
use crate::{
    client::AgentClient,
    msg::{EnvironmentBatch, ExchangeBatch, ExchangeRecord},
    schedule::DecisionSchedule,
    BridgeConfig,
};
use anyhow::Result;
use log::{info, trace, warn};
use std::time::Duration;
use tether_core::{error::TetherError, Action, Controllable, Entity, EpisodeSignal};

/// Where the bridge stands in the episode lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// No discovery performed yet.
    Uninit,
    /// Discovery found nothing controllable; the bridge stays out of the way.
    Inert,
    /// Environment descriptors delivered; exchanging each decision window.
    Exchanging,
    /// Episode over, no further exchanges.
    Terminated,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Drives the exchange cycle between a stepped simulation and the remote
/// agent.
///
/// One instance serves exactly one episode. The simulation calls
/// [`ControlBridge::step`] once per physics tick with its full entity list;
/// the bridge discovers the controllable entities on the first call, delivers
/// their environment descriptors once, accumulates rewards between decision
/// windows, and exchanges a batched report for a batched action set whenever
/// the decision schedule fires:
///
/// ```mermaid
/// graph LR
///     S[Simulation]-->|"step(t, dt)"|B[ControlBridge]
///     B -->|ExchangeBatch|C[AgentClient]
///     C -->|ActionBatch|B
///     B -->|Action|E[Controllable entities]
/// ```
///
/// Any of the termination sources (an entity's own reward logic, a missing
/// or mismatched response, a termination declared by the agent) collapses
/// into the same terminal transition: a final observation flush with a
/// best-effort notification to the agent, after which [`ControlBridge::step`]
/// returns [`EpisodeSignal::Stop`] forever.
pub struct ControlBridge {
    client: AgentClient,

    schedule: DecisionSchedule,

    phase: Phase,

    /// Indices of the controllable entities within the simulation's entity
    /// slice, in discovery order. Fixed for the episode.
    controlled: Vec<usize>,

    /// The outgoing report, one record per controllable. Rewards accrue in
    /// place between exchanges; the episode-level `done` flag carries the
    /// OR of the current tick's local terminations.
    batch: ExchangeBatch,
}

impl ControlBridge {
    /// Builds a bridge for one episode.
    pub fn build(config: &BridgeConfig) -> Result<Self> {
        if !(config.decision_interval > 0.0) {
            return Err(TetherError::InvalidConfig(format!(
                "decision_interval must be positive, got {}",
                config.decision_interval
            ))
            .into());
        }
        if !(config.timeout > 0.0) {
            return Err(TetherError::InvalidConfig(format!(
                "timeout must be positive, got {}",
                config.timeout
            ))
            .into());
        }

        let mut client = AgentClient::new(&config.server_address);
        client.set_timeout(Duration::from_secs_f64(config.timeout));

        Ok(Self {
            client,
            schedule: DecisionSchedule::new(config.decision_interval),
            phase: Phase::Uninit,
            controlled: Vec::new(),
            batch: ExchangeBatch::default(),
        })
    }

    /// Advances the bridge by one physics tick ending at time `t`.
    ///
    /// `entities` must be the same list, in the same order, on every call of
    /// the episode; the bridge caches positions into it at discovery.
    ///
    /// Returns [`EpisodeSignal::Stop`] once the episode is over, and an
    /// error only when the initial environment delivery is rejected, which
    /// aborts the episode before any exchange.
    pub fn step(
        &mut self,
        entities: &mut [Box<dyn Entity>],
        t: f64,
        dt: f64,
    ) -> Result<EpisodeSignal> {
        match self.phase {
            Phase::Terminated => return Ok(EpisodeSignal::Stop),
            Phase::Inert => return Ok(EpisodeSignal::Continue),
            Phase::Uninit => {
                if entities.is_empty() {
                    return Ok(EpisodeSignal::Continue);
                }
                self.discover(entities);
                if self.controlled.is_empty() {
                    self.phase = Phase::Inert;
                    return Ok(EpisodeSignal::Continue);
                }
                self.deliver_environments(entities)?;
            }
            Phase::Exchanging => {}
        }

        self.accrue_rewards(entities, t, dt);

        if !self.schedule.advance(dt) {
            if self.batch.done {
                // an entity ended the episode between decision windows;
                // flush the partial reward without waiting for the schedule
                self.terminate(entities, t);
                return Ok(EpisodeSignal::Stop);
            }
            return Ok(EpisodeSignal::Continue);
        }

        self.collect_observations(entities, t);
        trace!("exchange at t={} with {} records", t, self.batch.records.len());
        let response = self.client.send_action_results(&self.batch);

        let mut done = match &response {
            Some(resp) if resp.actions.len() == self.controlled.len() => {
                for slot in 0..self.controlled.len() {
                    let ix = self.controlled[slot];
                    self.controllable(entities, ix)
                        .set_action(&resp.actions[slot]);
                }
                resp.done
            }
            _ => {
                // either no response at all or a batch whose positional
                // correspondence cannot be trusted; never apply it partially
                match &response {
                    Some(resp) => warn!(
                        "action count mismatch: got {}, expected {}",
                        resp.actions.len(),
                        self.controlled.len()
                    ),
                    None => warn!("no response from remote agent"),
                }
                let terminal = Action::terminal();
                for slot in 0..self.controlled.len() {
                    let ix = self.controlled[slot];
                    self.controllable(entities, ix).set_action(&terminal);
                }
                true
            }
        };
        done |= self.batch.done;

        self.reset_rewards();

        if done {
            self.terminate(entities, t);
            return Ok(EpisodeSignal::Stop);
        }
        Ok(EpisodeSignal::Continue)
    }

    /// Ends the episode from the simulation side.
    ///
    /// Flushes a final observation and tells the agent the episode is over,
    /// tolerating failure. Does nothing if the bridge never exchanged or has
    /// already terminated.
    pub fn close(&mut self, entities: &mut [Box<dyn Entity>], t: f64) {
        if self.phase != Phase::Exchanging {
            return;
        }
        self.terminate(entities, t);
    }

    /// Whether the episode is over.
    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    /// Number of controllable entities found at discovery.
    pub fn num_controlled(&self) -> usize {
        self.controlled.len()
    }

    /// Scans the entity list once and fixes the episode's slot order.
    fn discover(&mut self, entities: &mut [Box<dyn Entity>]) {
        for (ix, ent) in entities.iter_mut().enumerate() {
            if ent.controllable().is_some() {
                self.controlled.push(ix);
                self.batch.records.push(ExchangeRecord::default());
            }
        }
        info!(
            "discovered {} controllable entities among {}",
            self.controlled.len(),
            entities.len()
        );
    }

    /// One-shot environment delivery; rejection is fatal for the episode.
    fn deliver_environments(&mut self, entities: &mut [Box<dyn Entity>]) -> Result<()> {
        let mut envs = Vec::with_capacity(self.controlled.len());
        for slot in 0..self.controlled.len() {
            let ix = self.controlled[slot];
            envs.push(self.controllable(entities, ix).env_desc());
        }

        if !self.client.send_environments(&EnvironmentBatch { envs }) {
            self.phase = Phase::Terminated;
            return Err(TetherError::EnvironmentRejected.into());
        }
        self.phase = Phase::Exchanging;
        info!(
            "environment descriptors delivered for {} controllables",
            self.controlled.len()
        );
        Ok(())
    }

    fn accrue_rewards(&mut self, entities: &mut [Box<dyn Entity>], t: f64, dt: f64) {
        let mut done = false;
        for slot in 0..self.controlled.len() {
            let ix = self.controlled[slot];
            let (ent_done, reward) = self.controllable(entities, ix).calc_reward(t, dt);
            done |= ent_done;
            let rec = &mut self.batch.records[slot];
            rec.done = ent_done;
            rec.reward += reward;
        }
        self.batch.done = done;
    }

    fn collect_observations(&mut self, entities: &mut [Box<dyn Entity>], t: f64) {
        for slot in 0..self.controlled.len() {
            let ix = self.controlled[slot];
            let mut obs = std::mem::take(&mut self.batch.records[slot].observation);
            obs.clear();
            self.controllable(entities, ix).observe(t, &mut obs);
            self.batch.records[slot].observation = obs;
        }
    }

    fn reset_rewards(&mut self) {
        for rec in &mut self.batch.records {
            rec.reward = 0.0;
        }
    }

    /// Terminal transition, shared by every termination source: flush a last
    /// observation, notify the agent best-effort, and stop exchanging.
    fn terminate(&mut self, entities: &mut [Box<dyn Entity>], t: f64) {
        self.collect_observations(entities, t);
        self.batch.done = true;
        if self.client.send_action_results(&self.batch).is_none() {
            info!("terminal notification not acknowledged by remote agent");
        }
        self.reset_rewards();
        self.phase = Phase::Terminated;
        info!("episode terminated at t={}", t);
    }

    fn controllable<'a>(
        &self,
        entities: &'a mut [Box<dyn Entity>],
        ix: usize,
    ) -> &'a mut dyn Controllable {
        entities[ix]
            .controllable()
            .expect("controllable capability must persist for the episode")
    }
}
