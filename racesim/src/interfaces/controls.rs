use anyhow::Context;
use std::str::FromStr;

/// Edge-triggered user controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    ToggleRain,
    Crash,
    TogglePause,
}

impl FromStr for ControlEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "r" | "rain" => Ok(ControlEvent::ToggleRain),
            "c" | "crash" => Ok(ControlEvent::Crash),
            "p" | "pause" => Ok(ControlEvent::TogglePause),
            other => anyhow::bail!("Unknown control event '{}'!", other),
        }
    }
}

/// ControlScript holds control events that are triggered at fixed frame numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlScript {
    entries: Vec<(u64, ControlEvent)>,
}

impl ControlScript {
    pub fn new(mut entries: Vec<(u64, ControlEvent)>) -> ControlScript {
        // stable -> events of the same frame keep their order
        entries.sort_by_key(|&(frame, _)| frame);
        ControlScript { entries }
    }

    /// events_at returns the events scheduled for the given frame in script order.
    pub fn events_at(&self, frame: u64) -> impl Iterator<Item = ControlEvent> + '_ {
        self.entries
            .iter()
            .filter(move |&&(f, _)| f == frame)
            .map(|&(_, event)| event)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for ControlScript {
    type Err = anyhow::Error;

    /// Parses comma separated entries of the form `<event>@<frame>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut entries = Vec::new();

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (event, frame) = entry.split_once('@').with_context(|| {
                format!("Script entry '{}' must look like <event>@<frame>!", entry)
            })?;

            let frame: u64 = frame
                .trim()
                .parse()
                .with_context(|| format!("Invalid frame number in script entry '{}'!", entry))?;

            entries.push((frame, event.parse()?));
        }

        Ok(ControlScript::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_parses_and_orders_by_frame() {
        let script: ControlScript = "crash@20, rain@10,pause@20".parse().unwrap();

        assert_eq!(
            script.events_at(10).collect::<Vec<_>>(),
            vec![ControlEvent::ToggleRain]
        );
        assert_eq!(
            script.events_at(20).collect::<Vec<_>>(),
            vec![ControlEvent::Crash, ControlEvent::TogglePause]
        );
        assert_eq!(script.events_at(11).count(), 0);
    }

    #[test]
    fn empty_script_is_allowed() {
        let script: ControlScript = "".parse().unwrap();
        assert!(script.is_empty());
    }

    #[test]
    fn malformed_entries_are_rejected() {
        assert!("rain".parse::<ControlScript>().is_err());
        assert!("rain@soon".parse::<ControlScript>().is_err());
        assert!("hail@10".parse::<ControlScript>().is_err());
    }
}
