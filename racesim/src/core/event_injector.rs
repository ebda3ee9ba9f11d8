use crate::core::race::{rank_cmp, Race, WeatherState};
use crate::core::state_handler::AgentStatus;
use crate::core::timer_queue::TimerEvent;
use crate::core::tireset::TireCompound;
use crate::interfaces::controls::ControlEvent;
use crate::post::race_result::RaceEventKind;
use helpers::general::argsort_by;
use log::{debug, info, warn};
use rand_distr::{Distribution, Uniform};

impl Race {
    /// apply_control dispatches a user control to the corresponding event.
    pub fn apply_control(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::ToggleRain => self.toggle_rain(),
            ControlEvent::Crash => self.trigger_crash(),
            ControlEvent::TogglePause => self.toggle_pause(),
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;

        if self.paused {
            info!("Simulation paused at frame {}", self.cur_frame);
        } else {
            info!("Simulation resumed at frame {}", self.cur_frame);
        }
    }

    /// toggle_rain starts the rain if it is dry and stops it otherwise.
    pub fn toggle_rain(&mut self) {
        if self.finished {
            debug!("Rain toggle ignored, race is finished");
            return;
        }

        match self.weather_state {
            WeatherState::Dry => self.start_rain(),
            WeatherState::Rain => self.stop_rain(),
        }
    }

    /// start_rain slows the field down and sends every racing agent into the pits. Each pit stop
    /// lasts a randomized time, after which the agent returns on intermediates.
    fn start_rain(&mut self) {
        info!("Heavy rain triggered! Forcing pit stops");

        self.weather_state = WeatherState::Rain;
        self.chaos_factor = self.sim_consts.rain_chaos_factor;

        let spawn_interval_us = self.rain_spawn_interval_us();
        if !self.timers.is_pending(&TimerEvent::RainSpawn) {
            self.timers
                .schedule(self.cur_time_us + spawn_interval_us, TimerEvent::RainSpawn);
        }

        let [t_min_ms, t_max_ms] = self.sim_consts.pit_time_ms;
        let pit_time_ms = Uniform::new_inclusive(t_min_ms, t_max_ms.max(t_min_ms));
        let mut pitting = Vec::new();

        for agent in self.agents.iter_mut().filter(|a| a.sh.is_racing()) {
            agent.enter_pits();

            let t_pit_us = (pit_time_ms.sample(&mut self.rng) * 1000.0).round() as u64;
            self.timers.schedule(
                self.cur_time_us + t_pit_us,
                TimerEvent::PitExit { agent_id: agent.id },
            );

            debug!("{} pits for {:.0}ms", agent.label(), t_pit_us as f64 / 1000.0);
            pitting.push(agent.id);
        }

        self.log_event(RaceEventKind::RainStart, pitting);
    }

    /// stop_rain restores the dry conditions. Agents that are still in the pits are released
    /// immediately on intermediates. Already scheduled pit exits stay pending.
    fn stop_rain(&mut self) {
        let was_raining = self.weather_state == WeatherState::Rain;

        self.timers
            .cancel_where(|ev| matches!(ev, TimerEvent::RainSpawn));
        self.weather_state = WeatherState::Dry;
        self.chaos_factor = 1.0;

        let mut released = Vec::new();

        for agent in self
            .agents
            .iter_mut()
            .filter(|a| a.status() == AgentStatus::Pitting)
        {
            agent.leave_pits(TireCompound::Inter);
            released.push(agent.id);
        }

        if was_raining || !released.is_empty() {
            info!("Rain stopped, {} agents released from the pits", released.len());
            self.log_event(RaceEventKind::RainStop, released);
        }
    }

    /// trigger_crash stops the rain and retires every racing agent that is ranked strictly
    /// between the two agents of the crash pair. If nobody is caught in between, the crash pair
    /// itself retires.
    pub fn trigger_crash(&mut self) {
        if self.finished {
            debug!("Crash ignored, race is finished");
            return;
        }

        self.stop_rain();

        let crash_pair = match self.crash_pair {
            Some(crash_pair) => crash_pair,
            None => {
                warn!("Crash control is disabled, only the rain was stopped");
                return;
            }
        };

        let ranking = argsort_by(&self.agents, rank_cmp);

        // retired (or unknown) agents of the pair count as ranked at infinity
        let ranked_idx = |id: u32| {
            ranking
                .iter()
                .position(|&i| self.agents[i].id == id && self.agents[i].status() != AgentStatus::DNF)
                .unwrap_or(usize::MAX)
        };
        let rank_a = ranked_idx(crash_pair[0]);
        let rank_b = ranked_idx(crash_pair[1]);
        let (rank_lower, rank_upper) = (rank_a.min(rank_b), rank_a.max(rank_b));

        let caught: Vec<usize> = ranking
            .iter()
            .enumerate()
            .filter(|&(rank, &i)| {
                rank > rank_lower && rank < rank_upper && self.agents[i].sh.is_racing()
            })
            .map(|(_, &i)| i)
            .collect();

        let mut crashed = Vec::with_capacity(caught.len());

        for &i in caught.iter() {
            let agent = &mut self.agents[i];
            warn!("{} caught in crash!", agent.label());
            agent.retire(true);
            crashed.push(agent.id);
        }

        if crashed.is_empty() && rank_a != usize::MAX && rank_b != usize::MAX {
            info!(
                "Nobody between agents {} and {}, crashing both",
                crash_pair[0], crash_pair[1]
            );

            for agent in self
                .agents
                .iter_mut()
                .filter(|a| crash_pair.contains(&a.id) && a.sh.is_racing())
            {
                warn!("{} caught in crash!", agent.label());
                agent.retire(true);
                crashed.push(agent.id);
            }
        }

        self.log_event(RaceEventKind::Crash, crashed);
    }

    /// fire_due_timers processes all timers that are due at the current virtual time.
    pub fn fire_due_timers(&mut self) {
        while let Some((at_us, event)) = self.timers.pop_due(self.cur_time_us) {
            match event {
                TimerEvent::PitExit { agent_id } => self.handle_pit_exit(agent_id),
                TimerEvent::RainSpawn => {
                    self.raindrops_spawned += 1;

                    if self.weather_state == WeatherState::Rain {
                        let next_us = at_us + self.rain_spawn_interval_us();
                        self.timers.schedule(next_us, TimerEvent::RainSpawn);
                    }
                }
            }
        }
    }

    /// handle_pit_exit completes the pit stop of an agent. The timer fires even if the rain has
    /// stopped in the meantime; retired agents are never revived.
    fn handle_pit_exit(&mut self, agent_id: u32) {
        let agent = match self.get_agent_mut(agent_id) {
            Some(agent) => agent,
            None => return,
        };

        match agent.status() {
            AgentStatus::Pitting => {
                agent.leave_pits(TireCompound::Inter);
                info!("{} exits the pits on Inters", agent.label());
                self.log_event(RaceEventKind::PitExit, vec![agent_id]);
            }
            AgentStatus::Racing => {
                // already released when the rain stopped
                debug!("Late pit exit of {} ignored", agent.label());
            }
            AgentStatus::DNF => {
                debug!("Pit exit of retired {} ignored", agent.label());
            }
        }
    }

    fn rain_spawn_interval_us(&self) -> u64 {
        (self.sim_consts.rain_spawn_interval_ms * 1000).max(1)
    }
}
