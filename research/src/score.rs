use std::str::FromStr;

use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};
use sieglinde::{Observation, Outcome};
use thiserror::Error;

#[serde_as]
#[derive(Deserialize, Debug)]
pub struct RawScore {
    pub user: String,
    pub chart: String,
    #[serde_as(as = "DisplayFromStr")]
    pub lamp: Lamp,
}

/// Clear lamp as reported by LR2-style internet rankings.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Lamp {
    NoPlay,
    Failed,
    EasyClear,
    NormalClear,
    HardClear,
    FullCombo,
}

#[derive(Debug, Error)]
#[error("invalid clear lamp")]
pub struct InvalidLamp;

impl FromStr for Lamp {
    type Err = InvalidLamp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "0" => Lamp::NoPlay,
            "1" => Lamp::Failed,
            "2" => Lamp::EasyClear,
            "3" => Lamp::NormalClear,
            "4" => Lamp::HardClear,
            "5" => Lamp::FullCombo,
            _ => return Err(InvalidLamp),
        })
    }
}

/// Minimum lamp that counts as a pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Threshold {
    EasyClear,
    HardClear,
}

impl Threshold {
    pub const ALL: [Threshold; 2] = [Threshold::EasyClear, Threshold::HardClear];

    pub fn outcome(self, lamp: Lamp) -> Outcome {
        Outcome::from(match self {
            Threshold::EasyClear => lamp >= Lamp::EasyClear,
            Threshold::HardClear => lamp >= Lamp::HardClear,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ByThreshold<T> {
    pub easy_clear: T,
    pub hard_clear: T,
}

impl<T> ByThreshold<T> {
    pub fn get(&self, threshold: Threshold) -> &T {
        match threshold {
            Threshold::EasyClear => &self.easy_clear,
            Threshold::HardClear => &self.hard_clear,
        }
    }

    pub fn get_mut(&mut self, threshold: Threshold) -> &mut T {
        match threshold {
            Threshold::EasyClear => &mut self.easy_clear,
            Threshold::HardClear => &mut self.hard_clear,
        }
    }
}

impl RawScore {
    /// Observations of this score under each threshold, or `None` if the
    /// chart was never actually played.
    pub fn observations(&self) -> Option<ByThreshold<Observation>> {
        if self.lamp == Lamp::NoPlay {
            return None;
        }
        let observation = |threshold: Threshold| {
            Observation::new(
                self.user.as_str(),
                self.chart.as_str(),
                threshold.outcome(self.lamp),
            )
        };
        Some(ByThreshold {
            easy_clear: observation(Threshold::EasyClear),
            hard_clear: observation(Threshold::HardClear),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(Threshold::EasyClear.outcome(Lamp::Failed), Outcome::Fail);
        assert_eq!(Threshold::EasyClear.outcome(Lamp::EasyClear), Outcome::Pass);
        assert_eq!(Threshold::HardClear.outcome(Lamp::NormalClear), Outcome::Fail);
        assert_eq!(Threshold::HardClear.outcome(Lamp::HardClear), Outcome::Pass);
        assert_eq!(Threshold::HardClear.outcome(Lamp::FullCombo), Outcome::Pass);
    }

    #[test]
    fn test_parse_csv() {
        let data = "user,chart,lamp\nalice,abc,4\nbob,abc,0\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let scores: Vec<RawScore> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].lamp, Lamp::HardClear);

        let observations = scores[0].observations().unwrap();
        assert_eq!(observations.get(Threshold::EasyClear).outcome, Outcome::Pass);
        assert_eq!(observations.get(Threshold::HardClear).outcome, Outcome::Pass);
        assert!(scores[1].observations().is_none());

        assert!("6".parse::<Lamp>().is_err());
    }
}
