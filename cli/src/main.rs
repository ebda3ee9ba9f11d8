mod leaderboard;

use anyhow::Context;
use clap::Parser;
use env_logger::Builder;
use helpers::general::InputValueError;
use leaderboard::render_leaderboard;
use log::{info, warn, LevelFilter};
use racesim::core::handle_race::handle_race;
use racesim::core::track::Track;
use racesim::interfaces::controls::{ControlEvent, ControlScript};
use racesim::interfaces::render_interface::RaceState;
use racesim::post::race_result::RaceResult;
use racesim::pre::read_sim_pars::{read_sim_pars, SimPars};
use racesim::pre::sim_opts::SimOpts;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::thread;
use std::time::Instant;

/// spawn_renderer prints the leaderboard whenever the lap counter, the weather or the pause state
/// changes, and every snapshot in debug mode.
fn spawn_renderer(rx: flume::Receiver<RaceState>, print_all: bool) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut prev_key: Option<(String, bool, bool)> = None;

        for race_state in rx.iter() {
            let key = (
                race_state.lap_counter.to_owned(),
                race_state.weather_is_rain,
                race_state.paused,
            );

            let changed = prev_key.as_ref() != Some(&key);

            if print_all || changed || race_state.finish_banner.is_some() {
                println!("{}", render_leaderboard(&race_state));
            }
            prev_key = Some(key);
        }
    })
}

/// spawn_control_reader forwards control events typed on stdin (one per line).
fn spawn_control_reader(tx: flume::Sender<ControlEvent>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();

        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<ControlEvent>() {
                Ok(event) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{} (use r, c or p)", e),
            }
        }
    });
}

fn run_batch(
    sim_opts: &SimOpts,
    sim_pars: &SimPars,
    track: &Track,
    script: &ControlScript,
) -> anyhow::Result<()> {
    info!("Simulating {} races in parallel...", sim_opts.no_sim_runs);
    let t_start = Instant::now();

    let results: Vec<RaceResult> = (0..sim_opts.no_sim_runs as u64)
        .into_par_iter()
        .map(|i| {
            handle_race(
                sim_pars,
                track,
                sim_opts.seed + i,
                script,
                None,
                None,
                0.0,
                sim_opts.max_frames,
            )
        })
        .collect::<anyhow::Result<_>>()?;

    info!("Execution time: {}ms", t_start.elapsed().as_millis());

    // win tally per agent
    let mut tally: BTreeMap<String, u32> = BTreeMap::new();

    for result in results.iter() {
        let key = match result.winner_id {
            Some(id) => result
                .classification
                .iter()
                .find(|c| c.agent_id == id)
                .map(|c| format!("Agent {} ({})", c.agent_id, c.name))
                .unwrap_or_else(|| format!("Agent {}", id)),
            None => "no winner".to_owned(),
        };
        *tally.entry(key).or_insert(0) += 1;
    }

    println!("RESULT: Wins over {} runs", results.len());
    for (name, wins) in tally.iter() {
        println!(
            "{:<24} {:5} ({:5.1}%)",
            name,
            wins,
            100.0 * *wins as f64 / results.len() as f64
        );
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let mut sim_opts: SimOpts = SimOpts::parse();

    Builder::new()
        .filter_level(if sim_opts.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    if !(sim_opts.realtime_factor >= 0.0) || sim_opts.no_sim_runs == 0 {
        return Err(InputValueError).context(
            "Real-time factor must be non-negative and the number of runs must be positive!",
        );
    }

    // get simulation parameters
    let mut sim_pars = if let Some(parfile_path) = &sim_opts.parfile_path {
        info!("Reading simulation parameters from {:?}", parfile_path);
        read_sim_pars(parfile_path)?
    } else {
        info!("No parameter file given, using the built-in four-agent field");
        SimPars::default_scenario()
    };

    let track = if let Some(trackfile_path) = &sim_opts.trackfile_path {
        info!("Loading track from {:?}", trackfile_path);
        let track = Track::from_csv(trackfile_path)?;

        // laps of a loaded circuit are counted at its last point
        sim_pars.sim_consts.finish_line = track.end();
        track
    } else {
        Track::builtin_circuit()
    };

    let script: ControlScript = sim_opts
        .script
        .parse()
        .context("Failed to parse control script!")?;

    if !script.is_empty() {
        info!("Control script: {}", sim_opts.script);
    }

    info!(
        "Simulating {} laps on {} with {} agents",
        sim_pars.race_pars.tot_no_laps,
        track.name,
        sim_pars.agent_pars_all.len()
    );

    // EXECUTION -----------------------------------------------------------------------------------
    if sim_opts.no_sim_runs > 1 {
        return run_batch(&sim_opts, &sim_pars, &track, &script);
    }

    let rx_ctrl = if sim_opts.interactive {
        if sim_opts.realtime_factor == 0.0 {
            info!("Interactive mode runs in real-time");
            sim_opts.realtime_factor = 1.0;
        }
        println!("Controls: r + Enter = rain toggle, c + Enter = crash, p + Enter = pause toggle");

        let (tx_ctrl, rx_ctrl) = flume::unbounded();
        spawn_control_reader(tx_ctrl);
        Some(rx_ctrl)
    } else {
        None
    };

    let (tx, rx) = flume::unbounded();
    let renderer = spawn_renderer(rx, sim_opts.debug);
    let t_start = Instant::now();

    let race_result = handle_race(
        &sim_pars,
        &track,
        sim_opts.seed,
        &script,
        rx_ctrl.as_ref(),
        Some(&tx),
        sim_opts.realtime_factor,
        sim_opts.max_frames,
    );

    // closing the channel ends the renderer
    drop(tx);
    if renderer.join().is_err() {
        warn!("Leaderboard renderer panicked");
    }
    let race_result = race_result?;

    info!("Execution time: {}ms", t_start.elapsed().as_millis());

    // POST-PROCESSING -----------------------------------------------------------------------------
    race_result.print_classification()?;

    let out_path = race_result.write_to_file(sim_opts.output.as_deref())?;
    info!("Result written to {}", out_path);

    if let Some(json_path) = &sim_opts.result_json {
        race_result
            .write_json(json_path)
            .context(format!("Failed to write {:?}!", json_path))?;
        info!("JSON result written to {:?}", json_path);
    }

    Ok(())
}
