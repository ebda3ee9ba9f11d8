use crate::core::agent::AgentPars;
use crate::core::errors::SimError;
use crate::core::tireset::TireCompound;
use crate::core::track::{Point, FINISH_X, FINISH_Y};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::Path;

/// * `tot_no_laps` - Total number of laps
/// * `rookie_id` - Agent that may make an unforced error in every tick
/// * `rookie_error_prob` - Probability of the unforced error per tick
/// * `crash_pair` - Agents between which the crash control strikes
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RacePars {
    pub tot_no_laps: u32,
    pub rookie_id: Option<u32>,
    pub rookie_error_prob: f64,
    pub crash_pair: Option<[u32; 2]>,
}

impl Default for RacePars {
    fn default() -> Self {
        RacePars {
            tot_no_laps: 50,
            rookie_id: Some(4),
            rookie_error_prob: 0.0002,
            crash_pair: Some([2, 4]),
        }
    }
}

/// Engine constants. All of them have defaults, a parameter file only has to contain the values
/// that should be changed.
///
/// * `finish_line` - Coordinates used for lap detection
/// * `reset_threshold_squared` - Squared distance to the finish line below which a lap counts
/// * `draw_epsilon` - Draw distances are clamped to [0.0, path_length - draw_epsilon]
/// * `rain_chaos_factor` - Global speed multiplier while it is raining
/// * `pit_time_ms` - Range of the randomized pit stop duration
/// * `rain_spawn_interval_ms` - Interval of the raindrop generator
/// * `frame_period_us` - Virtual time per frame (60 Hz display refresh)
/// * `heart_rate_refresh_prob` - Probability per tick that the heart rate jitter is redrawn
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SimConstants {
    pub finish_line: Point,
    pub reset_threshold_squared: f64,
    pub draw_epsilon: f64,
    pub rain_chaos_factor: f64,
    pub pit_time_ms: [f64; 2],
    pub rain_spawn_interval_ms: u64,
    pub frame_period_us: u64,
    pub heart_rate_refresh_prob: f64,
}

impl Default for SimConstants {
    fn default() -> Self {
        SimConstants {
            finish_line: Point::new(FINISH_X, FINISH_Y),
            reset_threshold_squared: 25.0,
            draw_epsilon: 0.1,
            rain_chaos_factor: 0.3,
            pit_time_ms: [3000.0, 5000.0],
            rain_spawn_interval_ms: 50,
            frame_period_us: 16_667,
            heart_rate_refresh_prob: 0.1,
        }
    }
}

/// SimPars is used to store all other parameter structs.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SimPars {
    #[serde(default)]
    pub race_pars: RacePars,
    pub agent_pars_all: Vec<AgentPars>,
    #[serde(default)]
    pub sim_consts: SimConstants,
}

impl SimPars {
    /// default_scenario returns the scripted four-agent field.
    pub fn default_scenario() -> SimPars {
        let agent = |id: u32, name: &str, color: &str, base_speed_factor: f64, compound| {
            AgentPars {
                id,
                name: name.to_owned(),
                color: color.to_owned(),
                base_speed_factor,
                compound,
            }
        };

        SimPars {
            race_pars: RacePars::default(),
            agent_pars_all: vec![
                // good overall pace, low wear
                agent(1, "You (Red)", "#ff0000", 0.00063, TireCompound::Hard),
                agent(2, "White", "#ffffff", 0.00060, TireCompound::Medium),
                // starts fastest, highest wear
                agent(3, "Cyan", "#00ffff", 0.00064, TireCompound::Soft),
                // slowest
                agent(4, "Yellow", "#ffff00", 0.00045, TireCompound::Hard),
            ],
            sim_consts: SimConstants::default(),
        }
    }

    /// validate checks the roster. Unknown rookie or crash pair ids are not fatal, the race
    /// disables the corresponding rule instead.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.agent_pars_all.is_empty() {
            return Err(SimError::EmptyRoster);
        }

        let mut ids = HashSet::with_capacity(self.agent_pars_all.len());

        for agent_pars in self.agent_pars_all.iter() {
            if !ids.insert(agent_pars.id) {
                return Err(SimError::DuplicateAgent(agent_pars.id));
            }
            if !agent_pars.base_speed_factor.is_finite() || agent_pars.base_speed_factor < 0.0 {
                return Err(SimError::InvalidSpeedFactor(
                    agent_pars.id,
                    agent_pars.base_speed_factor,
                ));
            }
        }
        Ok(())
    }
}

/// read_sim_pars reads the JSON file and decodes the JSON string into the simulation parameters
/// struct.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.to_string_lossy()
        ))?;
    let pars: SimPars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.to_string_lossy()
    ))?;
    pars.validate()?;
    Ok(pars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_is_valid() {
        let pars = SimPars::default_scenario();
        pars.validate().unwrap();
        assert_eq!(pars.agent_pars_all.len(), 4);
        assert_eq!(pars.race_pars.tot_no_laps, 50);
        assert_eq!(pars.race_pars.crash_pair, Some([2, 4]));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r##"{
            "race_pars": { "tot_no_laps": 3 },
            "agent_pars_all": [
                { "id": 7, "name": "Solo", "color": "#123456", "base_speed_factor": 0.001, "compound": "Soft" }
            ],
            "sim_consts": { "rain_chaos_factor": 0.5 }
        }"##;
        let pars: SimPars = serde_json::from_str(json).unwrap();
        pars.validate().unwrap();

        assert_eq!(pars.race_pars.tot_no_laps, 3);
        assert_eq!(pars.race_pars.rookie_id, Some(4));
        assert_eq!(pars.sim_consts.rain_chaos_factor, 0.5);
        assert_eq!(pars.sim_consts.reset_threshold_squared, 25.0);
        assert_eq!(pars.agent_pars_all[0].compound, TireCompound::Soft);
    }

    #[test]
    fn duplicate_and_empty_rosters_are_rejected() {
        let mut pars = SimPars::default_scenario();
        pars.agent_pars_all[1].id = 1;
        assert!(matches!(pars.validate(), Err(SimError::DuplicateAgent(1))));

        pars.agent_pars_all.clear();
        assert!(matches!(pars.validate(), Err(SimError::EmptyRoster)));
    }

    #[test]
    fn missing_parameter_file_reports_path() {
        let err = read_sim_pars(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
