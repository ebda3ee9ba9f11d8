use crate::core::state_handler::AgentStatus;
use crate::core::track::Point;

/// Maximum snapshot rate in Hz of virtual race time.
pub const MAX_RENDER_UPDATE_FREQUENCY: f64 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// One leaderboard row.
#[derive(Debug, Clone)]
pub struct AgentRow {
    pub rank: usize,
    pub agent_id: u32,
    pub label: String,
    pub color: RgbColor,
    pub status: AgentStatus,
    pub lap: u32,
    pub tire: String,
    pub strategy: String,
    pub win_probability: String,
    pub heart_rate: String,
    pub position: Option<Point>,
}

/// Snapshot of the race as consumed by leaderboard / track renderers.
#[derive(Debug, Clone, Default)]
pub struct RaceState {
    pub frame: u64,
    pub rows: Vec<AgentRow>,
    pub lap_counter: String,

    // weather effects
    pub weather_is_rain: bool,
    pub safety_car_message: bool,
    pub raindrops_spawned: u64,

    pub paused: bool,

    // banner shown once the race is finished
    pub finish_banner: Option<String>,
}
