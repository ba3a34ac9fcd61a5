//! A self-contained episode against a stub agent answering with random
//! steering actions.
//!
//! One point-mass rover is steered left/right by a single discrete action
//! dimension and earns reward while it stays inside a radius around the
//! origin. The "remote agent" is a local mock server that rolls a coin for
//! every exchange.
use anyhow::Result;
use log::info;
use std::{cell::RefCell, rc::Rc};
use tether_bridge::{BridgeConfig, ControlBridge};
use tether_core::{Action, Controllable, Entity, EnvDesc, Observation, Space};

struct PointMass {
    pos: f64,
    vel: f64,
    radius: f64,
    total_reward: Rc<RefCell<f64>>,
}

impl PointMass {
    fn new(radius: f64, total_reward: Rc<RefCell<f64>>) -> Self {
        Self {
            pos: 0.0,
            vel: 0.0,
            radius,
            total_reward,
        }
    }
}

impl Controllable for PointMass {
    fn env_desc(&self) -> EnvDesc {
        EnvDesc {
            action_space: Space::default().discrete(1),
            observation_space: Space::default().continuous(-100.0, 100.0),
        }
    }

    fn calc_reward(&mut self, _t: f64, dt: f64) -> (bool, f64) {
        // the demo folds kinematics into the per-tick callback; a real
        // simulation owns its motion models elsewhere
        self.pos += self.vel * dt;

        let reward = if self.pos.abs().round() < self.radius {
            1.0
        } else {
            0.0
        };
        *self.total_reward.borrow_mut() += reward;
        (false, reward)
    }

    fn observe(&mut self, _t: f64, obs: &mut Observation) {
        obs.push(self.pos);
    }

    fn set_action(&mut self, act: &Action) {
        if act.done {
            self.vel = 0.0;
            return;
        }
        if !self.env_desc().action_space.accepts(act) {
            return;
        }
        self.vel = if act.discrete[0] == 1 { 1.0 } else { -1.0 };
    }
}

impl Entity for PointMass {
    fn controllable(&mut self) -> Option<&mut dyn Controllable> {
        Some(self)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut server = mockito::Server::new();
    let _envs = server
        .mock("POST", "/v1/agent/environments")
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .create();
    let _actions = server
        .mock("POST", "/v1/agent/action-results")
        .with_status(200)
        .with_body_from_request(|_| {
            let v = if fastrand::bool() { 1 } else { 0 };
            format!(
                r#"{{"actions":[{{"discrete":[{}],"continuous":[],"done":false}}],"done":false}}"#,
                v
            )
            .into_bytes()
        })
        .expect_at_least(1)
        .create();

    let config = BridgeConfig::default()
        .server_address(server.url())
        .timeout(1.0)
        .decision_interval(0.5);
    let mut bridge = ControlBridge::build(&config)?;

    let total_reward = Rc::new(RefCell::new(0.0));
    let mut world: Vec<Box<dyn Entity>> =
        vec![Box::new(PointMass::new(2.0, total_reward.clone()))];

    let dt = 0.1;
    let mut t = 0.0;
    for _ in 0..100 {
        t += dt;
        if bridge.step(&mut world, t, dt)?.is_stop() {
            break;
        }
    }
    bridge.close(&mut world, t);

    info!(
        "episode over at t={:.1}, total reward {}",
        t,
        total_reward.borrow()
    );
    Ok(())
}
