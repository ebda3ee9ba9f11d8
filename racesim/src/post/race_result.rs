use crate::core::state_handler::AgentStatus;
use crate::core::tireset::TireCompound;
use serde::Serialize;
use std::fmt::Write;
use std::io::Write as IoWrite;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RaceEventKind {
    RainStart,
    RainStop,
    PitExit,
    Crash,
    UnforcedError,
    Finished,
}

/// * `kind` - Type of the event
/// * `frame` - Frame in which the event happened
/// * `time_ms` - Virtual race time of the event
/// * `lap` - Lap counter at the time of the event
/// * `agents` - Affected agents (e.g. retired agents in case of a crash)
#[derive(Debug, Clone, Serialize)]
pub struct RaceEvent {
    pub kind: RaceEventKind,
    pub frame: u64,
    pub time_ms: f64,
    pub lap: u32,
    pub agents: Vec<u32>,
}

/// One line of the final classification.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationEntry {
    pub position: usize,
    pub agent_id: u32,
    pub name: String,
    pub status: AgentStatus,
    pub laps: u32,
    pub compound: TireCompound,
}

/// RaceResult contains all race information that is required for post-processing the results.
#[derive(Debug, Clone, Serialize)]
pub struct RaceResult {
    pub tot_no_laps: u32,
    pub finished: bool,
    pub summary: String,
    pub winner_id: Option<u32>,
    pub classification: Vec<ClassificationEntry>,
    pub events: Vec<RaceEvent>,
    pub frames: u64,
}

impl RaceResult {
    /// format_classification returns the classification and the event log as text.
    pub fn format_classification(&self) -> anyhow::Result<String> {
        let mut content = String::new();

        writeln!(&mut content, "RESULT: {}", self.summary)?;
        writeln!(
            &mut content,
            "RESULT: Classification after {} frames ({} laps)",
            self.frames, self.tot_no_laps
        )?;
        writeln!(&mut content, "pos, agent, laps, status, tire")?;

        for entry in self.classification.iter() {
            writeln!(
                &mut content,
                "{:3}, {:3} ({}), {:3}, {:?}, {}",
                entry.position, entry.agent_id, entry.name, entry.laps, entry.status, entry.compound
            )?;
        }

        if !self.events.is_empty() {
            writeln!(&mut content, "RESULT: Events")?;
            for event in self.events.iter() {
                writeln!(
                    &mut content,
                    "{:8} ({:10.1}ms, lap {:2}): {:?} {:?}",
                    event.frame, event.time_ms, event.lap, event.kind, event.agents
                )?;
            }
        }

        Ok(content)
    }

    /// print_classification prints the classification to the console output.
    pub fn print_classification(&self) -> anyhow::Result<()> {
        print!("{}", self.format_classification()?);
        Ok(())
    }

    /// write_to_file writes the classification to a text file (output/last_run.txt if no path is
    /// given). Returns the path to the written file.
    pub fn write_to_file(&self, path: Option<&Path>) -> anyhow::Result<String> {
        let content = self.format_classification()?;

        let out_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let out_dir = Path::new("output");
                std::fs::create_dir_all(out_dir)?;
                out_dir.join("last_run.txt")
            }
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(out_path.to_string_lossy().into_owned())
    }

    /// write_json serializes the result to a JSON file.
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> RaceResult {
        RaceResult {
            tot_no_laps: 50,
            finished: true,
            summary: "RACE FINISHED! Winner: Agent 3 (Cyan)".to_owned(),
            winner_id: Some(3),
            classification: vec![
                ClassificationEntry {
                    position: 1,
                    agent_id: 3,
                    name: "Cyan".to_owned(),
                    status: AgentStatus::Racing,
                    laps: 50,
                    compound: TireCompound::Soft,
                },
                ClassificationEntry {
                    position: 2,
                    agent_id: 4,
                    name: "Yellow".to_owned(),
                    status: AgentStatus::DNF,
                    laps: 12,
                    compound: TireCompound::Hard,
                },
            ],
            events: vec![RaceEvent {
                kind: RaceEventKind::UnforcedError,
                frame: 20000,
                time_ms: 333340.0,
                lap: 12,
                agents: vec![4],
            }],
            frames: 90000,
        }
    }

    #[test]
    fn classification_lists_every_agent_and_event() {
        let text = result().format_classification().unwrap();
        assert!(text.contains("Winner: Agent 3 (Cyan)"));
        assert!(text.contains("  4 (Yellow),  12, DNF, Hard"));
        assert!(text.contains("UnforcedError [4]"));
    }

    #[test]
    fn result_serializes_to_json() {
        let json = serde_json::to_value(result()).unwrap();
        assert_eq!(json["winner_id"], 3);
        assert_eq!(json["classification"][1]["status"], "DNF");
        assert_eq!(json["events"][0]["kind"], "UnforcedError");
    }
}
