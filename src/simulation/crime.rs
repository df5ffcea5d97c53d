use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::simulation::city::LocationId;

/// Ordered wanted ladder. The integer representation is used for the
/// arithmetic escalation/decay steps, always clamped to the ladder ends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum WantedLevel {
    #[default]
    None,
    Suspicious,
    Minor,
    Moderate,
    Serious,
    Dangerous,
    MostWanted,
}

impl WantedLevel {
    pub const MAX_INDEX: i32 = 6;

    pub fn index(self) -> i32 {
        match self {
            WantedLevel::None => 0,
            WantedLevel::Suspicious => 1,
            WantedLevel::Minor => 2,
            WantedLevel::Moderate => 3,
            WantedLevel::Serious => 4,
            WantedLevel::Dangerous => 5,
            WantedLevel::MostWanted => 6,
        }
    }

    /// Clamping constructor: any out-of-range index maps to the nearest end.
    pub fn from_index(index: i32) -> Self {
        match index.clamp(0, Self::MAX_INDEX) {
            0 => WantedLevel::None,
            1 => WantedLevel::Suspicious,
            2 => WantedLevel::Minor,
            3 => WantedLevel::Moderate,
            4 => WantedLevel::Serious,
            5 => WantedLevel::Dangerous,
            _ => WantedLevel::MostWanted,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WantedLevel::None => "Clean",
            WantedLevel::Suspicious => "Suspicious",
            WantedLevel::Minor => "Minor",
            WantedLevel::Moderate => "Moderate",
            WantedLevel::Serious => "Serious",
            WantedLevel::Dangerous => "Dangerous",
            WantedLevel::MostWanted => "Most Wanted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrimeType {
    Vandalism,
    Theft,
    Fighting,
    Pickpocketing,
    DrugDealing,
    Robbery,
    Smuggling,
    Fraud,
    WeaponsDealing,
    ResistingArrest,
    BriberyAttempt,
}

/// Append-only record of a reported crime. Never mutated after creation
/// except for the resolution annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrimeRecord {
    pub crime: CrimeType,
    /// Absolute game-clock timestamp of the report.
    pub timestamp: f64,
    pub location: LocationId,
    pub severity: f32,
    pub resolved: bool,
}

/// The wanted-level state machine's mutable state. Only the functions in
/// `systems::wanted` touch it.
#[derive(Resource, Debug, Clone, Serialize, Deserialize, Default)]
pub struct WantedState {
    pub level: WantedLevel,
    /// Seconds remaining until the level drops one step.
    pub decay_timer: f64,
    pub last_crime_time: f64,
    pub is_under_arrest: bool,
    pub police_called: bool,
    /// Scheduled completion: police arrive and force an encounter.
    pub police_arrival_at: Option<f64>,
    /// Scheduled completion: jail term ends and the wanted level clears.
    pub jail_release_at: Option<f64>,
    pub crime_history: Vec<CrimeRecord>,
}

impl WantedState {
    pub fn most_recent_crime(&self) -> Option<&CrimeRecord> {
        self.crime_history.last()
    }

    pub fn is_wanted(&self) -> bool {
        self.level > WantedLevel::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_index_clamps_to_ladder_ends() {
        assert_eq!(WantedLevel::from_index(-3), WantedLevel::None);
        assert_eq!(WantedLevel::from_index(99), WantedLevel::MostWanted);
        assert_eq!(WantedLevel::from_index(4), WantedLevel::Serious);
    }

    #[test]
    fn ladder_order_matches_indices() {
        for i in 0..WantedLevel::MAX_INDEX {
            assert!(WantedLevel::from_index(i) < WantedLevel::from_index(i + 1));
        }
    }
}
