use serde::{Deserialize, Serialize};
use std::fmt;

/// (1/lap) Loss of speed factor per lap driven on the current tireset.
const WEAR_RATE_SOFT: f64 = 0.0000020;
const WEAR_RATE_MEDIUM: f64 = 0.0000015;
const WEAR_RATE_HARD: f64 = 0.0000010;
const WEAR_RATE_INTER: f64 = 0.0000012;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TireCompound {
    Soft,
    Medium,
    Hard,
    Inter,
}

impl TireCompound {
    /// wear_rate returns the speed factor lost per lap on a tireset of this compound.
    pub fn wear_rate(&self) -> f64 {
        match self {
            TireCompound::Soft => WEAR_RATE_SOFT,
            TireCompound::Medium => WEAR_RATE_MEDIUM,
            TireCompound::Hard => WEAR_RATE_HARD,
            TireCompound::Inter => WEAR_RATE_INTER,
        }
    }
}

impl fmt::Display for TireCompound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TireCompound::Soft => "Soft",
            TireCompound::Medium => "Medium",
            TireCompound::Hard => "Hard",
            TireCompound::Inter => "Inter",
        };
        write!(f, "{}", name)
    }
}

/// Tireset mounted on an agent. Fields are private such that the lap counter can only be reset by
/// fitting a new set.
#[derive(Debug, Clone)]
pub struct Tireset {
    compound: TireCompound,
    laps_on_tire: u32,
}

impl Tireset {
    pub fn new(compound: TireCompound) -> Tireset {
        Tireset {
            compound,
            laps_on_tire: 0,
        }
    }

    pub fn compound(&self) -> TireCompound {
        self.compound
    }

    pub fn laps_on_tire(&self) -> u32 {
        self.laps_on_tire
    }

    /// fit mounts a fresh tireset of the given compound.
    pub fn fit(&mut self, compound: TireCompound) {
        self.compound = compound;
        self.laps_on_tire = 0;
    }

    /// drive_lap increases the age of the tireset by one lap.
    pub fn drive_lap(&mut self) {
        self.laps_on_tire += 1;
    }

    /// calc_wear returns the current loss of speed factor due to tire degradation.
    ///
    /// * `linear model`: wear = laps_on_tire * wear_rate
    pub fn calc_wear(&self) -> f64 {
        self.laps_on_tire as f64 * self.compound.wear_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wear_grows_linearly_with_laps_on_tire() {
        let mut tireset = Tireset::new(TireCompound::Hard);
        assert_eq!(tireset.calc_wear(), 0.0);

        for _ in 0..10 {
            tireset.drive_lap();
        }
        assert_eq!(tireset.laps_on_tire(), 10);
        assert_relative_eq!(tireset.calc_wear(), 0.0000100, max_relative = 1e-12);
    }

    #[test]
    fn fitting_a_new_set_resets_the_lap_counter() {
        let mut tireset = Tireset::new(TireCompound::Soft);
        tireset.drive_lap();
        tireset.drive_lap();

        tireset.fit(TireCompound::Inter);
        assert_eq!(tireset.compound(), TireCompound::Inter);
        assert_eq!(tireset.laps_on_tire(), 0);
    }

    #[test]
    fn compound_parses_from_json() {
        let compound: TireCompound = serde_json::from_str("\"Inter\"").unwrap();
        assert_eq!(compound, TireCompound::Inter);
        assert_eq!(compound.to_string(), "Inter");
    }
}
