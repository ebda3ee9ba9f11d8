use crate::core::agent::Agent;
use crate::core::errors::SimError;
use crate::core::state_handler::AgentStatus;
use crate::core::timer_queue::TimerQueue;
use crate::core::track::PathSampler;
use crate::interfaces::controls::ControlEvent;
use crate::post::race_result::{ClassificationEntry, RaceEvent, RaceEventKind, RaceResult};
use crate::pre::read_sim_pars::{SimConstants, SimPars};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

/// Upper bound of the heart rate jitter is exclusive: jitter is drawn from [-4, 3].
const HEART_RATE_JITTER_RANGE: std::ops::Range<i32> = -4..4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherState {
    Dry,
    Rain,
}

impl Default for WeatherState {
    fn default() -> Self {
        WeatherState::Dry
    }
}

/// Reason why a tick did not change the race state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Finished,
    InvalidTrack,
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Advanced,
    /// Returned exactly once, in the tick in which the leader completes the final lap. Contains
    /// the finish summary.
    Finished(String),
}

#[derive(Debug)]
pub struct Race {
    pub tot_no_laps: u32,
    pub path_length: f64,
    pub finished: bool,
    pub chaos_factor: f64,
    pub paused: bool,
    pub weather_state: WeatherState,
    pub cur_time_us: u64,
    pub cur_frame: u64,
    pub sim_consts: SimConstants,
    pub rookie_id: Option<u32>,
    pub rookie_error_prob: f64,
    pub crash_pair: Option<[u32; 2]>,
    pub raindrops_spawned: u64,
    pub events: Vec<RaceEvent>,
    /// Agents in ranked order (leader first), re-sorted at the end of every tick.
    pub agents: Vec<Agent>,
    pub(crate) timers: TimerQueue,
    pub(crate) rng: StdRng,
}

/// status_order puts racing agents in front of pitting agents and retired agents last.
fn status_order(status: AgentStatus) -> u8 {
    match status {
        AgentStatus::Racing => 0,
        AgentStatus::Pitting => 1,
        AgentStatus::DNF => 2,
    }
}

/// rank_cmp is the leaderboard comparator. Racing agents are ordered by completed laps and then
/// by distance (both descending). Pitting and retired agents compare equal among themselves, the
/// stable sort then keeps their previous order.
pub fn rank_cmp(a: &Agent, b: &Agent) -> Ordering {
    let (status_a, status_b) = (a.status(), b.status());

    status_order(status_a)
        .cmp(&status_order(status_b))
        .then_with(|| {
            if status_a == AgentStatus::Racing {
                b.sh.get_compl_lap()
                    .cmp(&a.sh.get_compl_lap())
                    .then_with(|| b.sh.get_distance().total_cmp(&a.sh.get_distance()))
            } else {
                Ordering::Equal
            }
        })
}

impl Race {
    pub fn new(sim_pars: &SimPars, path: &dyn PathSampler, seed: u64) -> Result<Race, SimError> {
        sim_pars.validate()?;

        // track length is fixed for the whole race
        let path_length = path.total_length();

        if !(path_length > 0.0) || !path_length.is_finite() {
            return Err(SimError::InvalidPathLength(path_length));
        }

        // laps are only counted if the end of the path reaches the finish line
        let sim_consts = &sim_pars.sim_consts;
        let finish_line = sim_consts.finish_line;
        let path_end = path.point_at_length((path_length - sim_consts.draw_epsilon).max(0.0));

        match path_end {
            Ok(p) if p.dist_squared(&finish_line) < sim_consts.reset_threshold_squared => {}
            _ => {
                return Err(SimError::FinishLineOffPath {
                    x: finish_line.x,
                    y: finish_line.y,
                })
            }
        }

        // create agents
        let mut agents: Vec<Agent> = Vec::with_capacity(sim_pars.agent_pars_all.len());

        for agent_pars in sim_pars.agent_pars_all.iter() {
            let mut agent = Agent::new(agent_pars);
            agent.sh.initialize_state_handler(path_length);
            agents.push(agent);
        }

        let race_pars = &sim_pars.race_pars;
        let is_listed = |id: u32| agents.iter().any(|a| a.id == id);

        let rookie_id = match race_pars.rookie_id {
            Some(id) if !is_listed(id) => {
                warn!("Rookie agent {} is not in the roster, unforced errors are disabled", id);
                None
            }
            other => other,
        };

        let crash_pair = match race_pars.crash_pair {
            Some(pair) if !pair.iter().all(|&id| is_listed(id)) => {
                warn!(
                    "Crash pair {:?} is not in the roster, crash control is disabled",
                    pair
                );
                None
            }
            other => other,
        };

        info!(
            "Race set up with {} agents, {} laps, track length {:.1}",
            agents.len(),
            race_pars.tot_no_laps,
            path_length
        );

        Ok(Race {
            tot_no_laps: race_pars.tot_no_laps,
            path_length,
            finished: false,
            chaos_factor: 1.0,
            paused: false,
            weather_state: WeatherState::Dry,
            cur_time_us: 0,
            cur_frame: 0,
            sim_consts: sim_pars.sim_consts.to_owned(),
            rookie_id,
            rookie_error_prob: race_pars.rookie_error_prob,
            crash_pair,
            raindrops_spawned: 0,
            events: Vec::new(),
            agents,
            timers: TimerQueue::new(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHODS --------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// step_frame advances the virtual clock by one frame, fires the timers that fell due and
    /// simulates one tick.
    pub fn step_frame(&mut self, path: &dyn PathSampler) -> TickOutcome {
        self.step_frame_with(std::iter::empty(), path)
    }

    /// step_frame_with works like step_frame but applies the given controls at the start of the
    /// frame, i.e. their events are logged with the number of this frame.
    pub fn step_frame_with<I>(&mut self, controls: I, path: &dyn PathSampler) -> TickOutcome
    where
        I: IntoIterator<Item = ControlEvent>,
    {
        self.cur_frame += 1;
        self.cur_time_us += self.sim_consts.frame_period_us;

        for event in controls {
            self.apply_control(event);
        }

        self.fire_due_timers();
        self.simulate_tick(path)
    }

    /// simulate_tick advances all racing agents once, re-ranks the field and checks if the race
    /// is finished.
    pub fn simulate_tick(&mut self, path: &dyn PathSampler) -> TickOutcome {
        if self.finished {
            return TickOutcome::Skipped(SkipReason::Finished);
        }
        if !(self.path_length > 0.0) {
            return TickOutcome::Skipped(SkipReason::InvalidTrack);
        }
        if self.paused {
            return TickOutcome::Skipped(SkipReason::Paused);
        }

        // pitting and retired agents are frozen
        for idx in 0..self.agents.len() {
            if self.agents[idx].sh.is_racing() {
                self.move_agent(idx, path);
            }
        }

        self.rank_agents();
        self.refresh_heart_rates();
        self.check_finish()
    }

    // ---------------------------------------------------------------------------------------------
    // RACE SIMULATOR PARTS ------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn move_agent(&mut self, idx: usize, path: &dyn PathSampler) {
        let path_length = self.path_length;
        let step_distance = self.agents[idx].calc_step_distance(path_length, self.chaos_factor);

        // unforced error of the rookie
        if Some(self.agents[idx].id) == self.rookie_id
            && self.rng.gen::<f64>() < self.rookie_error_prob
        {
            let agent = &mut self.agents[idx];
            warn!("UNFORCED ERROR! {} has spun out", agent.label());
            agent.retire(false);
            let id = agent.id;
            self.log_event(RaceEventKind::UnforcedError, vec![id]);
            return;
        }

        let max_draw_distance = (path_length - self.sim_consts.draw_epsilon).max(0.0);
        let finish_line = self.sim_consts.finish_line;
        let reset_threshold_squared = self.sim_consts.reset_threshold_squared;
        let agent = &mut self.agents[idx];
        let distance = agent.sh.get_distance();

        // point at the position before the step, used for lap detection
        let cur_point = match path.point_at_length(distance.min(max_draw_distance).max(0.0)) {
            Ok(p) => p,
            Err(e) => {
                error!("Could not get current point of {}: {}", agent.label(), e);
                return;
            }
        };

        if cur_point.dist_squared(&finish_line) < reset_threshold_squared
            && step_distance > 0.0
            && distance > path_length / 2.0
        {
            agent.complete_lap();
            debug!(
                "{} completed lap {} ({} laps on {})",
                agent.label(),
                agent.sh.get_compl_lap(),
                agent.tireset.laps_on_tire(),
                agent.tireset.compound()
            );
        } else {
            agent.sh.advance(step_distance);
        }

        // visual position of this frame, decoupled from the lap reset above
        let potential_distance = distance + step_distance;
        let draw_distance = if potential_distance >= path_length {
            max_draw_distance
        } else {
            potential_distance.min(max_draw_distance).max(0.0)
        };

        match path.point_at_length(draw_distance) {
            Ok(p) => agent.render_point = Some(p),
            Err(e) => error!("Could not get point to draw for {}: {}", agent.label(), e),
        }
    }

    /// rank_agents sorts the agents for the leaderboard (stable sort).
    pub fn rank_agents(&mut self) {
        self.agents.sort_by(rank_cmp);
    }

    fn refresh_heart_rates(&mut self) {
        let refresh_prob = self.sim_consts.heart_rate_refresh_prob;

        for agent in self.agents.iter_mut().filter(|a| a.sh.is_racing()) {
            if self.rng.gen::<f64>() < refresh_prob {
                agent.heart_rate_jitter = self.rng.gen_range(HEART_RATE_JITTER_RANGE);
            }
        }
    }

    fn check_finish(&mut self) -> TickOutcome {
        let (leader_id, leader_done) = match self.agents.first() {
            Some(leader) => (
                leader.id,
                leader.sh.is_racing() && leader.sh.get_compl_lap() >= self.tot_no_laps,
            ),
            None => return TickOutcome::Advanced,
        };

        if !leader_done {
            return TickOutcome::Advanced;
        }

        self.finished = true;
        info!(
            "Race finished! Leader (agent {}) reached {} laps after {} frames",
            leader_id, self.tot_no_laps, self.cur_frame
        );
        self.log_event(RaceEventKind::Finished, vec![leader_id]);

        TickOutcome::Finished(self.get_finish_summary())
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn get_agent(&self, id: u32) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn get_agent_mut(&mut self, id: u32) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    pub fn get_all_retired(&self) -> bool {
        self.agents
            .iter()
            .all(|a| a.status() == AgentStatus::DNF)
    }

    /// get_display_lap returns the lap shown in the lap counter: the leader's lap if the leader
    /// is racing, otherwise the lap of the first racing agent (0 if there is none).
    pub fn get_display_lap(&self) -> u32 {
        if self.finished {
            return self.tot_no_laps;
        }

        let display_lap = match self.agents.first() {
            Some(leader) if leader.sh.is_racing() => leader.sh.get_compl_lap(),
            _ => self
                .agents
                .iter()
                .find(|a| a.sh.is_racing())
                .map(|a| a.sh.get_compl_lap())
                .unwrap_or(0),
        };

        display_lap.min(self.tot_no_laps)
    }

    /// get_lap_counter returns the lap counter readout, e.g. "12/50".
    pub fn get_lap_counter(&self) -> String {
        format!("{}/{}", self.get_display_lap(), self.tot_no_laps)
    }

    /// get_winner returns the first racing agent in ranked order.
    pub fn get_winner(&self) -> Option<&Agent> {
        self.agents.iter().find(|a| a.sh.is_racing())
    }

    pub fn get_finish_summary(&self) -> String {
        match self.get_winner() {
            Some(winner) => format!("RACE FINISHED! Winner: {}", winner.label()),
            None => "RACE FINISHED! (All DNF)".to_owned(),
        }
    }

    pub(crate) fn log_event(&mut self, kind: RaceEventKind, agents: Vec<u32>) {
        self.events.push(RaceEvent {
            kind,
            frame: self.cur_frame,
            time_ms: self.cur_time_us as f64 / 1000.0,
            lap: self.get_display_lap(),
            agents,
        });
    }

    pub fn get_race_result(&self) -> RaceResult {
        let summary = if self.finished || self.get_all_retired() {
            self.get_finish_summary()
        } else {
            format!("RACE ABORTED after {} frames", self.cur_frame)
        };

        RaceResult {
            tot_no_laps: self.tot_no_laps,
            finished: self.finished,
            summary,
            winner_id: if self.finished {
                self.get_winner().map(|a| a.id)
            } else {
                None
            },
            classification: self
                .agents
                .iter()
                .enumerate()
                .map(|(i, agent)| ClassificationEntry {
                    position: i + 1,
                    agent_id: agent.id,
                    name: agent.name.to_owned(),
                    status: agent.status(),
                    laps: agent.sh.get_compl_lap(),
                    compound: agent.tireset.compound(),
                })
                .collect(),
            events: self.events.to_owned(),
            frames: self.cur_frame,
        }
    }
}
