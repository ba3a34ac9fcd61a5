//! Full-episode scenarios against a mock agent server.
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use std::{cell::RefCell, rc::Rc};
use tether_bridge::{BridgeConfig, ControlBridge};
use tether_core::{
    error::TetherError, Action, Controllable, Entity, EnvDesc, EpisodeSignal, Observation, Space,
};

/// What happened to one entity, shared with the test body.
#[derive(Default)]
struct Log {
    applied: Vec<Action>,
}

/// A steered vehicle with a fixed per-tick reward and a constant
/// observation, optionally ending the episode from its own reward logic.
struct Rover {
    per_tick_reward: f64,
    obs_value: f64,
    done_on_call: Option<usize>,
    calls: usize,
    log: Rc<RefCell<Log>>,
}

impl Rover {
    fn new(per_tick_reward: f64, obs_value: f64) -> (Self, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let rover = Self {
            per_tick_reward,
            obs_value,
            done_on_call: None,
            calls: 0,
            log: log.clone(),
        };
        (rover, log)
    }

    fn done_on_call(mut self, n: usize) -> Self {
        self.done_on_call = Some(n);
        self
    }
}

impl Controllable for Rover {
    fn env_desc(&self) -> EnvDesc {
        EnvDesc {
            action_space: Space::default().discrete(1),
            observation_space: Space::default().continuous(-100.0, 100.0),
        }
    }

    fn calc_reward(&mut self, _t: f64, _dt: f64) -> (bool, f64) {
        self.calls += 1;
        let done = self.done_on_call.map_or(false, |n| self.calls >= n);
        (done, self.per_tick_reward)
    }

    fn observe(&mut self, _t: f64, obs: &mut Observation) {
        obs.push(self.obs_value);
    }

    fn set_action(&mut self, act: &Action) {
        self.log.borrow_mut().applied.push(act.clone());
    }
}

impl Entity for Rover {
    fn controllable(&mut self) -> Option<&mut dyn Controllable> {
        Some(self)
    }
}

fn bridge_to(server: &ServerGuard, decision_interval: f64) -> ControlBridge {
    let config = BridgeConfig::default()
        .server_address(server.url())
        .timeout(5.0)
        .decision_interval(decision_interval);
    ControlBridge::build(&config).unwrap()
}

fn accept_environments(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/v1/agent/environments")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true}"#)
        .expect(1)
        .create()
}

fn action_body(actions: Vec<serde_json::Value>, done: bool) -> String {
    json!({ "actions": actions, "done": done }).to_string()
}

fn discrete_action(v: i64) -> serde_json::Value {
    json!({ "discrete": [v], "continuous": [], "done": false })
}

#[test]
fn reward_accumulates_across_ticks_into_one_exchange() {
    let mut server = Server::new();
    let envs = accept_environments(&mut server);

    // both exchanges must carry exactly two ticks' worth of reward, which
    // also proves the accumulator restarts from zero after the first one
    let expected = json!({
        "records": [
            { "reward": 2.0, "done": false, "observation": { "values": [7.0] } }
        ],
        "done": false
    });
    let actions = server
        .mock("POST", "/v1/agent/action-results")
        .match_body(Matcher::Json(expected))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(action_body(vec![discrete_action(1)], false))
        .expect(2)
        .create();

    let (rover, log) = Rover::new(1.0, 7.0);
    let mut world: Vec<Box<dyn Entity>> = vec![Box::new(rover)];
    let mut bridge = bridge_to(&server, 0.2);

    assert_eq!(
        bridge.step(&mut world, 0.1, 0.1).unwrap(),
        EpisodeSignal::Continue
    );
    assert!(log.borrow().applied.is_empty());

    assert_eq!(
        bridge.step(&mut world, 0.2, 0.1).unwrap(),
        EpisodeSignal::Continue
    );
    assert_eq!(log.borrow().applied.len(), 1);
    assert_eq!(log.borrow().applied[0].discrete, vec![1]);

    assert_eq!(
        bridge.step(&mut world, 0.3, 0.1).unwrap(),
        EpisodeSignal::Continue
    );
    assert_eq!(
        bridge.step(&mut world, 0.4, 0.1).unwrap(),
        EpisodeSignal::Continue
    );

    envs.assert();
    actions.assert();
}

#[test]
fn actions_apply_positionally() {
    let mut server = Server::new();
    let _envs = accept_environments(&mut server);

    // record order must equal discovery order
    let expected = json!({
        "records": [
            { "reward": 0.5, "done": false, "observation": { "values": [1.0] } },
            { "reward": 0.25, "done": false, "observation": { "values": [2.0] } }
        ],
        "done": false
    });
    let actions = server
        .mock("POST", "/v1/agent/action-results")
        .match_body(Matcher::Json(expected))
        .with_status(200)
        .with_body(action_body(vec![discrete_action(1), discrete_action(0)], false))
        .expect(1)
        .create();

    let (first, first_log) = Rover::new(0.5, 1.0);
    let (second, second_log) = Rover::new(0.25, 2.0);
    let mut world: Vec<Box<dyn Entity>> = vec![Box::new(first), Box::new(second)];
    let mut bridge = bridge_to(&server, 0.1);
    assert_eq!(bridge.num_controlled(), 0);

    assert_eq!(
        bridge.step(&mut world, 0.1, 0.1).unwrap(),
        EpisodeSignal::Continue
    );

    assert_eq!(bridge.num_controlled(), 2);
    assert_eq!(first_log.borrow().applied, vec![Action {
        discrete: vec![1],
        continuous: vec![],
        done: false
    }]);
    assert_eq!(second_log.borrow().applied, vec![Action {
        discrete: vec![0],
        continuous: vec![],
        done: false
    }]);
    actions.assert();
}

#[test]
fn mismatched_response_forces_done_on_all() {
    // 0, 1 and N+1 actions against N = 2 entities
    for count in [0usize, 1, 3].iter().copied() {
        let mut server = Server::new();
        let _envs = accept_environments(&mut server);

        let response: Vec<_> = (0..count as i64).map(discrete_action).collect();
        // the failed exchange plus the terminal flush
        let actions = server
            .mock("POST", "/v1/agent/action-results")
            .with_status(200)
            .with_body(action_body(response, false))
            .expect(2)
            .create();

        let (first, first_log) = Rover::new(1.0, 1.0);
        let (second, second_log) = Rover::new(1.0, 2.0);
        let mut world: Vec<Box<dyn Entity>> = vec![Box::new(first), Box::new(second)];
        let mut bridge = bridge_to(&server, 0.1);

        assert_eq!(
            bridge.step(&mut world, 0.1, 0.1).unwrap(),
            EpisodeSignal::Stop,
            "count = {}",
            count
        );
        assert!(bridge.is_terminated());
        assert_eq!(first_log.borrow().applied, vec![Action::terminal()]);
        assert_eq!(second_log.borrow().applied, vec![Action::terminal()]);

        // terminal state is absorbing: no further traffic
        assert_eq!(
            bridge.step(&mut world, 0.2, 0.1).unwrap(),
            EpisodeSignal::Stop
        );
        actions.assert();
    }
}

#[test]
fn error_response_terminates_like_a_missing_one() {
    let mut server = Server::new();
    let _envs = accept_environments(&mut server);
    let actions = server
        .mock("POST", "/v1/agent/action-results")
        .with_status(500)
        .expect(2)
        .create();

    let (rover, log) = Rover::new(1.0, 7.0);
    let mut world: Vec<Box<dyn Entity>> = vec![Box::new(rover)];
    let mut bridge = bridge_to(&server, 0.1);

    assert_eq!(
        bridge.step(&mut world, 0.1, 0.1).unwrap(),
        EpisodeSignal::Stop
    );
    assert!(bridge.is_terminated());
    assert_eq!(log.borrow().applied, vec![Action::terminal()]);
    // the terminal flush also failed; that is tolerated
    actions.assert();
}

#[test]
fn local_done_flushes_partial_reward_immediately() {
    let mut server = Server::new();
    let _envs = accept_environments(&mut server);

    // three ticks of reward, flushed well before the 10 s decision interval
    let expected = json!({
        "records": [
            { "reward": 3.0, "done": true, "observation": { "values": [7.0] } }
        ],
        "done": true
    });
    let actions = server
        .mock("POST", "/v1/agent/action-results")
        .match_body(Matcher::Json(expected))
        .with_status(200)
        .with_body(action_body(vec![discrete_action(1)], false))
        .expect(1)
        .create();

    let (rover, log) = Rover::new(1.0, 7.0);
    let rover = rover.done_on_call(3);
    let mut world: Vec<Box<dyn Entity>> = vec![Box::new(rover)];
    let mut bridge = bridge_to(&server, 10.0);

    assert_eq!(
        bridge.step(&mut world, 0.1, 0.1).unwrap(),
        EpisodeSignal::Continue
    );
    assert_eq!(
        bridge.step(&mut world, 0.2, 0.1).unwrap(),
        EpisodeSignal::Continue
    );
    assert_eq!(
        bridge.step(&mut world, 0.3, 0.1).unwrap(),
        EpisodeSignal::Stop
    );

    assert!(bridge.is_terminated());
    // the flush notifies; it does not apply the agent's response
    assert!(log.borrow().applied.is_empty());
    actions.assert();
}

#[test]
fn rejected_environment_aborts_initialization() {
    let mut server = Server::new();
    let envs = server
        .mock("POST", "/v1/agent/environments")
        .with_status(200)
        .with_body(r#"{"success":false}"#)
        .expect(1)
        .create();
    let actions = server
        .mock("POST", "/v1/agent/action-results")
        .expect(0)
        .create();

    let (rover, log) = Rover::new(1.0, 7.0);
    let mut world: Vec<Box<dyn Entity>> = vec![Box::new(rover)];
    let mut bridge = bridge_to(&server, 0.1);

    let err = bridge.step(&mut world, 0.1, 0.1).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TetherError>(),
        Some(TetherError::EnvironmentRejected)
    ));
    assert!(bridge.is_terminated());
    assert!(log.borrow().applied.is_empty());

    assert_eq!(
        bridge.step(&mut world, 0.2, 0.1).unwrap(),
        EpisodeSignal::Stop
    );
    envs.assert();
    actions.assert();
}

#[test]
fn remote_done_applies_last_actions_then_stops() {
    let mut server = Server::new();
    let _envs = accept_environments(&mut server);
    let actions = server
        .mock("POST", "/v1/agent/action-results")
        .with_status(200)
        .with_body(action_body(vec![discrete_action(1)], true))
        .expect(2)
        .create();

    let (rover, log) = Rover::new(1.0, 7.0);
    let mut world: Vec<Box<dyn Entity>> = vec![Box::new(rover)];
    let mut bridge = bridge_to(&server, 0.1);

    assert_eq!(
        bridge.step(&mut world, 0.1, 0.1).unwrap(),
        EpisodeSignal::Stop
    );
    assert!(bridge.is_terminated());
    // the agent's final action is applied before the episode ends
    assert_eq!(log.borrow().applied.len(), 1);
    assert_eq!(log.borrow().applied[0].discrete, vec![1]);
    assert!(!log.borrow().applied[0].done);
    actions.assert();
}

#[test]
fn close_notifies_agent_exactly_once() {
    let mut server = Server::new();
    let _envs = accept_environments(&mut server);

    let expected = json!({
        "records": [
            { "reward": 2.0, "done": false, "observation": { "values": [7.0] } }
        ],
        "done": true
    });
    let actions = server
        .mock("POST", "/v1/agent/action-results")
        .match_body(Matcher::Json(expected))
        .with_status(200)
        .with_body(action_body(vec![], true))
        .expect(1)
        .create();

    let (rover, _log) = Rover::new(1.0, 7.0);
    let mut world: Vec<Box<dyn Entity>> = vec![Box::new(rover)];
    let mut bridge = bridge_to(&server, 10.0);

    assert_eq!(
        bridge.step(&mut world, 0.1, 0.1).unwrap(),
        EpisodeSignal::Continue
    );
    assert_eq!(
        bridge.step(&mut world, 0.2, 0.1).unwrap(),
        EpisodeSignal::Continue
    );

    // episode ended from the simulation side, e.g. a scenario time limit
    bridge.close(&mut world, 0.2);
    assert!(bridge.is_terminated());

    // idempotent: nothing further goes out
    bridge.close(&mut world, 0.2);
    actions.assert();
}
