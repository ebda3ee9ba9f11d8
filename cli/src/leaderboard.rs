use racesim::interfaces::render_interface::RaceState;
use std::fmt::Write;

/// render_leaderboard formats a race state snapshot as a text table.
pub fn render_leaderboard(race_state: &RaceState) -> String {
    let mut out = String::new();

    let mut flags = Vec::new();
    if race_state.weather_is_rain {
        flags.push(format!("RAIN ({} drops)", race_state.raindrops_spawned));
    }
    if race_state.safety_car_message {
        flags.push("SAFETY CAR".to_owned());
    }
    if race_state.paused {
        flags.push("PAUSED".to_owned());
    }

    let _ = writeln!(
        out,
        "Lap {} | frame {} {}",
        race_state.lap_counter,
        race_state.frame,
        flags.join(" | ")
    );
    let _ = writeln!(
        out,
        "{:>4}  {:<22} {:<16} {:<8} {:>5}  {:>8}",
        "Pos", "Agent", "Tire", "Strategy", "Win", "HR"
    );

    for row in race_state.rows.iter() {
        let _ = writeln!(
            out,
            "{:>4}  {:<22} {:<16} {:<8} {:>5}  {:>8}",
            row.rank, row.label, row.tire, row.strategy, row.win_probability, row.heart_rate
        );
    }

    if let Some(banner) = &race_state.finish_banner {
        let _ = writeln!(out, "{}", banner);
    }

    out
}
