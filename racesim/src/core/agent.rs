use crate::core::state_handler::{AgentStatus, StateHandler};
use crate::core::tireset::{TireCompound, Tireset};
use crate::core::track::Point;
use serde::{Deserialize, Serialize};

/// Speed factor never drops below this fraction of the base speed factor due to tire wear.
const MIN_SPEED_FRACTION: f64 = 0.5;

/// * `id` - Stable identifier of the agent
/// * `name` - Display label
/// * `color` - CSS color string used by renderers, e.g. #ff0000
/// * `base_speed_factor` - (1/tick) Fraction of the path length covered per tick under ideal
/// conditions
/// * `compound` - Tire compound mounted at the start
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentPars {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub base_speed_factor: f64,
    pub compound: TireCompound,
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub base_speed_factor: f64,
    pub heart_rate_jitter: i32,
    pub render_point: Option<Point>,
    pub sh: StateHandler,
    pub tireset: Tireset,
}

impl Agent {
    pub fn new(agent_pars: &AgentPars) -> Agent {
        Agent {
            id: agent_pars.id,
            name: agent_pars.name.to_owned(),
            color: agent_pars.color.to_owned(),
            base_speed_factor: agent_pars.base_speed_factor,
            heart_rate_jitter: 0,
            render_point: None,
            sh: StateHandler::default(),
            tireset: Tireset::new(agent_pars.compound),
        }
    }

    pub fn status(&self) -> AgentStatus {
        self.sh.get_status()
    }

    /// calc_speed_factor returns the speed factor after tire wear. Wear cannot cut the speed below
    /// half of the base speed factor.
    pub fn calc_speed_factor(&self) -> f64 {
        let speed_factor = self.base_speed_factor - self.tireset.calc_wear();
        (self.base_speed_factor * MIN_SPEED_FRACTION).max(speed_factor)
    }

    /// calc_step_distance returns the distance the agent covers in the current tick. A non-finite
    /// result is clamped to zero.
    pub fn calc_step_distance(&self, path_length: f64, chaos_factor: f64) -> f64 {
        let step_distance = self.calc_speed_factor() * path_length * chaos_factor;

        if step_distance.is_finite() {
            step_distance
        } else {
            0.0
        }
    }

    /// Method completes a lap: distance is reset and the tireset ages by one lap.
    pub fn complete_lap(&mut self) {
        self.sh.complete_lap();
        self.tireset.drive_lap();
    }

    /// Method sends a racing agent into the pits.
    pub fn enter_pits(&mut self) {
        self.sh.act_pit();
    }

    /// Method finishes a pit stop: the agent returns to the track on a fresh tireset.
    pub fn leave_pits(&mut self, compound: TireCompound) {
        self.sh.deact_pit();
        self.tireset.fit(compound);
    }

    /// Method retires the agent. A crashed agent additionally loses its speed permanently.
    pub fn retire(&mut self, crashed: bool) {
        self.sh.retire();
        if crashed {
            self.base_speed_factor = 0.0;
        }
    }

    /// label returns the display label used in the leaderboard, e.g. "Agent 2 (White)".
    pub fn label(&self) -> String {
        format!("Agent {} ({})", self.id, self.name)
    }
}
