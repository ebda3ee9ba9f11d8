use crate::core::race::{Race, TickOutcome, WeatherState};
use crate::core::state_handler::AgentStatus;
use crate::core::tireset::TireCompound;
use crate::core::track::PathSampler;
use crate::interfaces::controls::{ControlEvent, ControlScript};
use crate::interfaces::render_interface::{
    AgentRow, RaceState, RgbColor, MAX_RENDER_UPDATE_FREQUENCY,
};
use crate::post::race_result::RaceResult;
use crate::pre::read_sim_pars::SimPars;
use anyhow::Context;
use flume::{Receiver, Sender};
use log::{info, warn};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// handle_race creates and simulates a race on the basis of the inserted parameters, and returns
/// the results for post-processing. It plays the role of the display refresh scheduler: every
/// loop iteration is one frame.
///
/// * `script` - Control events triggered at fixed frames
/// * `rx` - Optional channel of live control events, drained once per frame
/// * `tx` - Optional channel receiving race state snapshots for rendering
/// * `realtime_factor` - 0.0 simulates as fast as possible, otherwise frames are paced in real
/// time divided by this factor
/// * `max_frames` - The race is aborted after this number of frames
#[allow(clippy::too_many_arguments)]
pub fn handle_race(
    sim_pars: &SimPars,
    track: &dyn PathSampler,
    seed: u64,
    script: &ControlScript,
    rx: Option<&Receiver<ControlEvent>>,
    tx: Option<&Sender<RaceState>>,
    realtime_factor: f64,
    max_frames: u64,
) -> anyhow::Result<RaceResult> {
    let mut race = Race::new(sim_pars, track, seed).context("Failed to set up the race!")?;

    info!(
        "Race started (seed {}), track length {:.1}",
        seed, race.path_length
    );

    // initial leaderboard
    if let Some(tx) = tx {
        send_race_state(tx, &race)?;
    }

    let t_render_period_ms = 1000.0 / MAX_RENDER_UPDATE_FREQUENCY;
    let mut t_race_update_render = 0.0;

    loop {
        let t_start = Instant::now();

        // scripted controls first, then the live ones in arrival order
        let mut controls: Vec<ControlEvent> = script.events_at(race.cur_frame + 1).collect();
        if let Some(rx) = rx {
            controls.extend(rx.try_iter());
        }

        let outcome = race.step_frame_with(controls, track);
        let race_time_ms = race.cur_time_us as f64 / 1000.0;

        if let Some(tx) = tx {
            if race_time_ms > t_race_update_render + t_render_period_ms - 0.001 {
                send_race_state(tx, &race)?;
                t_race_update_render = race_time_ms;
            }
        }

        if let TickOutcome::Finished(summary) = outcome {
            info!("{}", summary);
            break;
        }

        if race.get_all_retired() {
            warn!("All agents retired after {} frames, stopping", race.cur_frame);
            break;
        }

        if race.cur_frame >= max_frames {
            warn!("Race aborted after reaching the frame limit of {}", max_frames);
            break;
        }

        if realtime_factor > 0.0 {
            // sleep until the frame is finished in real-time as well
            let t_frame = Duration::from_micros(race.sim_consts.frame_period_us)
                .div_f64(realtime_factor);

            if let Some(t_sleep) = t_frame.checked_sub(t_start.elapsed()) {
                sleep(t_sleep);
            } else {
                warn!("Could not keep up with real-time!")
            }
        }
    }

    // final state including the finish banner
    if let Some(tx) = tx {
        send_race_state(tx, &race)?;
    }

    Ok(race.get_race_result())
}

fn send_race_state(tx: &Sender<RaceState>, race: &Race) -> anyhow::Result<()> {
    tx.send(build_race_state(race)?)
        .context("Failed to send race state to the renderer!")
}

/// build_race_state assembles the leaderboard snapshot of the current race.
pub fn build_race_state(race: &Race) -> anyhow::Result<RaceState> {
    let raining = matches!(race.weather_state, WeatherState::Rain);
    let mut rows = Vec::with_capacity(race.agents.len());

    for (i, agent) in race.agents.iter().enumerate() {
        let rank = i + 1;
        let tmp_color = agent
            .color
            .parse::<css_color_parser::Color>()
            .context("Could not parse hex color!")?;

        let (tire, strategy, heart_rate) = match agent.status() {
            AgentStatus::DNF => ("-".to_owned(), "DNF".to_owned(), "-".to_owned()),
            AgentStatus::Pitting => (
                "Inters".to_owned(),
                "PITTING".to_owned(),
                "160 bpm".to_owned(),
            ),
            AgentStatus::Racing => {
                let compound = agent.tireset.compound();
                let strategy = if compound == TireCompound::Hard {
                    "1-Stop"
                } else {
                    "2-Stop"
                };
                (
                    format!("{} ({} Laps)", compound, agent.tireset.laps_on_tire()),
                    strategy.to_owned(),
                    format!(
                        "{} bpm",
                        calc_heart_rate(rank, raining) + agent.heart_rate_jitter
                    ),
                )
            }
        };

        let win_probability = if agent.status() == AgentStatus::DNF {
            "-"
        } else {
            match rank {
                1 => "80%",
                2 => "15%",
                3 => "4%",
                _ => "1%",
            }
        };

        rows.push(AgentRow {
            rank,
            agent_id: agent.id,
            label: agent.label(),
            color: RgbColor {
                r: tmp_color.r,
                g: tmp_color.g,
                b: tmp_color.b,
            },
            status: agent.status(),
            lap: agent.sh.get_compl_lap(),
            tire,
            strategy,
            win_probability: win_probability.to_owned(),
            heart_rate,
            position: agent.render_point,
        });
    }

    Ok(RaceState {
        frame: race.cur_frame,
        rows,
        lap_counter: race.get_lap_counter(),
        weather_is_rain: raining,
        safety_car_message: raining,
        raindrops_spawned: race.raindrops_spawned,
        paused: race.paused,
        finish_banner: if race.finished {
            Some(race.get_finish_summary())
        } else {
            None
        },
    })
}

/// calc_heart_rate returns the base heart rate of a racing agent depending on its rank.
fn calc_heart_rate(rank: usize, raining: bool) -> i32 {
    match (rank, raining) {
        (1, false) => 130,
        (1, true) => 135,
        (2..=3, false) => 145,
        (2..=3, true) => 150,
        (_, false) => 150,
        (_, true) => 155,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track::Track;
    use crate::post::race_result::RaceEventKind;

    fn short_race_pars(tot_no_laps: u32) -> SimPars {
        let mut sim_pars = SimPars::default_scenario();
        sim_pars.race_pars.tot_no_laps = tot_no_laps;
        sim_pars.race_pars.rookie_error_prob = 0.0;
        sim_pars
    }

    #[test]
    fn race_runs_to_the_finish_and_streams_snapshots() {
        let track = Track::builtin_circuit();
        let (tx, rx) = flume::unbounded();

        let result = handle_race(
            &short_race_pars(2),
            &track,
            7,
            &ControlScript::default(),
            None,
            Some(&tx),
            0.0,
            100_000,
        )
        .unwrap();

        assert!(result.finished);
        assert_eq!(result.winner_id, Some(3));
        assert_eq!(result.classification[0].laps, 2);

        let states: Vec<RaceState> = rx.try_iter().collect();
        assert!(states.len() > 2);
        assert_eq!(states[0].lap_counter, "0/2");

        let last = states.last().unwrap();
        assert_eq!(last.lap_counter, "2/2");
        assert_eq!(
            last.finish_banner.as_deref(),
            Some("RACE FINISHED! Winner: Agent 3 (Cyan)")
        );
        assert_eq!(last.rows[0].color, RgbColor { r: 0, g: 255, b: 255 });
    }

    #[test]
    fn scripted_controls_are_applied_in_their_frame() {
        let track = Track::builtin_circuit();
        let script: ControlScript = "rain@10,pause@20,pause@30".parse().unwrap();

        let result = handle_race(
            &short_race_pars(50),
            &track,
            1,
            &script,
            None,
            None,
            0.0,
            40,
        )
        .unwrap();

        assert!(!result.finished);
        assert_eq!(result.frames, 40);
        assert_eq!(result.summary, "RACE ABORTED after 40 frames");
        assert_eq!(result.events[0].kind, RaceEventKind::RainStart);
        assert_eq!(result.events[0].frame, 10);
        assert!((result.events[0].time_ms - 166.67).abs() < 1e-6);
        assert_eq!(result.events[0].agents.len(), 4);
    }

    #[test]
    fn live_controls_are_drained_every_frame() {
        let track = Track::builtin_circuit();
        let (tx_ctrl, rx_ctrl) = flume::unbounded();
        tx_ctrl.send(ControlEvent::Crash).unwrap();

        let result = handle_race(
            &short_race_pars(50),
            &track,
            1,
            &ControlScript::default(),
            Some(&rx_ctrl),
            None,
            0.0,
            5,
        )
        .unwrap();

        // the crash in frame 1 hits the agent between agents 2 and 4 in the starting order
        let crash = result
            .events
            .iter()
            .find(|e| e.kind == RaceEventKind::Crash)
            .unwrap();
        assert_eq!(crash.agents, vec![3]);
    }

    #[test]
    fn leaderboard_columns_follow_status_and_rank() {
        let track = Track::builtin_circuit();
        let mut race = Race::new(&short_race_pars(50), &track, 3).unwrap();
        race.sim_consts.heart_rate_refresh_prob = 0.0;
        race.step_frame(&track);
        race.toggle_rain();
        race.get_agent_mut(4).unwrap().sh.deact_pit();

        let state = build_race_state(&race).unwrap();
        assert!(state.weather_is_rain && state.safety_car_message);

        let pitting = &state.rows[0];
        assert_eq!(pitting.strategy, "PITTING");
        assert_eq!(pitting.tire, "Inters");
        assert_eq!(pitting.heart_rate, "160 bpm");

        let yellow = state.rows.iter().find(|r| r.agent_id == 4).unwrap();
        assert_eq!(yellow.tire, "Hard (0 Laps)");
        assert_eq!(yellow.strategy, "1-Stop");
        assert_eq!(
            yellow.heart_rate,
            format!("{} bpm", calc_heart_rate(yellow.rank, true))
        );
    }

    #[test]
    fn heart_rate_base_depends_on_rank_and_weather() {
        assert_eq!(calc_heart_rate(1, false), 130);
        assert_eq!(calc_heart_rate(3, true), 150);
        assert_eq!(calc_heart_rate(4, false), 150);
        assert_eq!(calc_heart_rate(4, true), 155);
    }
}
