use helpers::general::wrap_to_length;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgentStatus {
    Racing,
    Pitting,
    DNF,
}

/// StateHandler tracks the progress of an agent along the closed path and its status machine:
///
/// * Racing -> Pitting -> Racing (pit stop, e.g. because of rain)
/// * Racing -> DNF (terminal)
///
/// Invalid transitions are programming errors and cause a panic.
#[derive(Debug, Clone)]
pub struct StateHandler {
    // parameters
    track_length: f64,

    // variables related to the progress on the track
    distance: f64,
    compl_lap: u32,

    // state machine
    status: AgentStatus,
}

impl StateHandler {
    pub fn initialize_state_handler(&mut self, track_length: f64) {
        self.track_length = track_length;
        self.distance = 0.0;
        self.compl_lap = 0;
        self.status = AgentStatus::Racing;
    }

    pub fn get_status(&self) -> AgentStatus {
        self.status
    }

    pub fn is_racing(&self) -> bool {
        self.status == AgentStatus::Racing
    }

    /// get_distance returns the logical distance along the path, always in [0.0, track_length[.
    pub fn get_distance(&self) -> f64 {
        self.distance
    }

    /// get_compl_lap returns the number of completed laps.
    pub fn get_compl_lap(&self) -> u32 {
        self.compl_lap
    }

    /// advance moves the agent forward by step_distance, wrapping around the closed path.
    pub fn advance(&mut self, step_distance: f64) {
        if !self.is_racing() {
            panic!("Tried to move an agent that is not racing!")
        }
        self.distance = wrap_to_length(self.distance + step_distance, self.track_length);
    }

    /// complete_lap resets the distance and counts the lap.
    pub fn complete_lap(&mut self) {
        if !self.is_racing() {
            panic!("Tried to complete a lap with an agent that is not racing!")
        }
        self.distance = 0.0;
        self.compl_lap += 1;
    }

    /// set_distance overwrites the logical distance, e.g. to place an agent for a test scenario.
    pub fn set_distance(&mut self, distance: f64) {
        if !(0.0 <= distance && distance < self.track_length) {
            panic!(
                "Distance must be in [0.0, track_length[, but is {:.3}!",
                distance
            )
        }
        self.distance = distance;
    }

    /// set_compl_lap overwrites the number of completed laps (setup only, never decreases).
    pub fn set_compl_lap(&mut self, compl_lap: u32) {
        if compl_lap < self.compl_lap {
            panic!("Number of completed laps must not decrease!")
        }
        self.compl_lap = compl_lap;
    }

    /// act_pit activates the pit state.
    pub fn act_pit(&mut self) {
        if !self.is_racing() {
            panic!("Tried to enter the pits without racing!")
        }
        self.status = AgentStatus::Pitting;
    }

    /// deact_pit returns a pitting agent to the track.
    pub fn deact_pit(&mut self) {
        if !matches!(self.status, AgentStatus::Pitting) {
            panic!("Tried to leave the pits without being in the pits!")
        }
        self.status = AgentStatus::Racing;
    }

    /// retire moves a racing agent into the terminal DNF state.
    pub fn retire(&mut self) {
        if !self.is_racing() {
            panic!("Tried to retire an agent that is not racing!")
        }
        self.status = AgentStatus::DNF;
    }
}

impl Default for StateHandler {
    fn default() -> Self {
        StateHandler {
            track_length: 0.0,
            distance: 0.0,
            compl_lap: 0,
            status: AgentStatus::Racing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_handler() -> StateHandler {
        let mut sh = StateHandler::default();
        sh.initialize_state_handler(100.0);
        sh
    }

    #[test]
    fn advance_wraps_around_the_path() {
        let mut sh = state_handler();
        sh.set_distance(99.9);
        sh.advance(0.5);
        assert!((sh.get_distance() - 0.4).abs() < 1e-9);
        assert_eq!(sh.get_compl_lap(), 0);
    }

    #[test]
    fn complete_lap_resets_distance() {
        let mut sh = state_handler();
        sh.set_distance(98.0);
        sh.complete_lap();
        assert_eq!(sh.get_distance(), 0.0);
        assert_eq!(sh.get_compl_lap(), 1);
    }

    #[test]
    fn pit_cycle_returns_to_racing() {
        let mut sh = state_handler();
        sh.act_pit();
        assert_eq!(sh.get_status(), AgentStatus::Pitting);
        sh.deact_pit();
        assert!(sh.is_racing());
    }

    #[test]
    #[should_panic(expected = "not racing")]
    fn retired_agent_cannot_move() {
        let mut sh = state_handler();
        sh.retire();
        sh.advance(1.0);
    }

    #[test]
    #[should_panic(expected = "without racing")]
    fn retired_agent_cannot_pit() {
        let mut sh = state_handler();
        sh.retire();
        sh.act_pit();
    }
}
