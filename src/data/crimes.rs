use std::collections::HashMap;
use std::path::Path;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{load_json, DataError};
use crate::simulation::crime::{CrimeType, WantedLevel};
use crate::simulation::economy::Money;

pub const DEFAULT_CRIMES_PATH: &str = "./assets/data/crimes.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CrimeProfile {
    /// Multiplied by report severity to get the wanted-level increase.
    pub wanted_weight: f32,
    pub base_fine_dollars: i64,
}

/// Catalog of crime weights, fines, and per-level decay durations.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct CrimeCatalog {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub profiles: HashMap<CrimeType, CrimeProfile>,
    /// Seconds until a one-step decay, indexed Suspicious..MostWanted.
    /// Strictly increasing: higher levels cool off slower.
    pub decay_durations: Vec<f64>,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for CrimeCatalog {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        let entries = [
            (CrimeType::Vandalism, 1.0, 50),
            (CrimeType::Theft, 2.0, 150),
            (CrimeType::Fighting, 1.0, 100),
            (CrimeType::Pickpocketing, 1.0, 80),
            (CrimeType::DrugDealing, 2.0, 400),
            (CrimeType::Robbery, 3.0, 600),
            (CrimeType::Smuggling, 2.0, 500),
            (CrimeType::Fraud, 2.0, 450),
            (CrimeType::WeaponsDealing, 3.0, 800),
            (CrimeType::ResistingArrest, 2.0, 300),
            (CrimeType::BriberyAttempt, 1.0, 250),
        ];
        for (crime, weight, fine) in entries {
            profiles.insert(
                crime,
                CrimeProfile {
                    wanted_weight: weight,
                    base_fine_dollars: fine,
                },
            );
        }

        Self {
            schema_version: default_schema_version(),
            profiles,
            decay_durations: vec![120.0, 240.0, 480.0, 900.0, 1800.0, 3600.0],
        }
    }
}

impl CrimeCatalog {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        load_json(path)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load_from_path(&path) {
            Ok(catalog) => catalog,
            Err(err) => {
                eprintln!("Failed to load crime catalog: {}", err);
                Self::default()
            }
        }
    }

    pub fn wanted_weight(&self, crime: CrimeType) -> f32 {
        self.profiles.get(&crime).map(|p| p.wanted_weight).unwrap_or(1.0)
    }

    pub fn base_fine(&self, crime: CrimeType) -> Money {
        Money::from_dollars(
            self.profiles
                .get(&crime)
                .map(|p| p.base_fine_dollars)
                .unwrap_or(100),
        )
    }

    /// Decay duration for a level; zero once the ladder reaches `None`.
    pub fn decay_duration(&self, level: WantedLevel) -> f64 {
        let index = level.index();
        if index == 0 {
            return 0.0;
        }
        self.decay_durations
            .get((index - 1) as usize)
            .copied()
            .unwrap_or_else(|| 600.0 * index as f64)
    }
}

/// Per-level weights for the police action chosen on a triggered encounter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActionWeights {
    pub warning: u32,
    pub fine: u32,
    pub arrest: u32,
    pub chase: u32,
}

/// Tuning for the police encounter resolver, bribery, and negotiation.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct PoliceConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Encounter probability per second per wanted-level index.
    pub base_encounter_rate: f64,
    pub night_multiplier: f64,
    /// Indexed by level index - 1 (Suspicious..MostWanted). Weights
    /// escalate toward arrest/chase as the level rises.
    pub action_weights: Vec<ActionWeights>,
    /// Seconds shaved off the decay timer by a warning.
    pub warning_timer_reduction: f64,
    /// Fine scaling: amount = base_fine * (1 + index * (multiplier - 1)).
    pub fine_multiplier: f64,
    pub base_jail_seconds: f64,
    pub jail_seconds_per_level: f64,
    /// Fraction of liquid money confiscated on arrest.
    pub arrest_confiscation: f64,
    /// Delay between a crime report and the police-called arrival.
    pub police_call_delay: f64,
    pub bribe_base_chance: f64,
    pub bribe_amount_weight: f64,
    pub bribe_skill_bonus: f64,
    pub bribe_level_penalty: f64,
    /// Hard ceiling so bribe-spam never guarantees success.
    pub bribe_max_chance: f64,
    pub negotiation_base_chance: f64,
    pub negotiation_skill_bonus: f64,
    pub negotiation_level_penalty: f64,
    pub negotiation_timer_reduction: f64,
}

impl Default for PoliceConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            base_encounter_rate: 0.0005,
            night_multiplier: 0.5,
            action_weights: vec![
                // Suspicious
                ActionWeights { warning: 70, fine: 30, arrest: 0, chase: 0 },
                // Minor
                ActionWeights { warning: 40, fine: 45, arrest: 10, chase: 5 },
                // Moderate
                ActionWeights { warning: 20, fine: 45, arrest: 25, chase: 10 },
                // Serious
                ActionWeights { warning: 10, fine: 35, arrest: 40, chase: 15 },
                // Dangerous
                ActionWeights { warning: 5, fine: 20, arrest: 50, chase: 25 },
                // Most Wanted
                ActionWeights { warning: 0, fine: 10, arrest: 55, chase: 35 },
            ],
            warning_timer_reduction: 60.0,
            fine_multiplier: 1.5,
            base_jail_seconds: 120.0,
            jail_seconds_per_level: 120.0,
            arrest_confiscation: 0.1,
            police_call_delay: 45.0,
            bribe_base_chance: 0.25,
            bribe_amount_weight: 0.45,
            bribe_skill_bonus: 0.02,
            bribe_level_penalty: 0.05,
            bribe_max_chance: 0.95,
            negotiation_base_chance: 0.3,
            negotiation_skill_bonus: 0.04,
            negotiation_level_penalty: 0.05,
            negotiation_timer_reduction: 120.0,
        }
    }
}

pub const DEFAULT_POLICE_PATH: &str = "./assets/data/police.json";

impl PoliceConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        load_json(path)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load_from_path(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Failed to load police config: {}", err);
                Self::default()
            }
        }
    }

    pub fn weights_for_level(&self, level: WantedLevel) -> ActionWeights {
        let index = level.index().max(1) as usize - 1;
        self.action_weights
            .get(index)
            .copied()
            .unwrap_or(ActionWeights { warning: 0, fine: 10, arrest: 55, chase: 35 })
    }

    /// The bribe amount that saturates the amount term of the success roll.
    pub fn recommended_bribe(&self, base_fine: Money, level: WantedLevel) -> Money {
        base_fine.scale(1.0 + level.index() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_durations_strictly_increase() {
        let catalog = CrimeCatalog::default();
        for i in 1..WantedLevel::MAX_INDEX {
            let lower = catalog.decay_duration(WantedLevel::from_index(i));
            let upper = catalog.decay_duration(WantedLevel::from_index(i + 1));
            assert!(upper > lower, "level {} should decay slower", i + 1);
        }
        assert_eq!(catalog.decay_duration(WantedLevel::None), 0.0);
    }

    #[test]
    fn action_weights_escalate_toward_arrest() {
        let config = PoliceConfig::default();
        let mut last = 0;
        for i in 1..=WantedLevel::MAX_INDEX {
            let weights = config.weights_for_level(WantedLevel::from_index(i));
            let severe = weights.arrest + weights.chase;
            assert!(severe >= last);
            last = severe;
        }
    }

    #[test]
    fn every_crime_has_a_profile() {
        let catalog = CrimeCatalog::default();
        for crime in [
            CrimeType::Vandalism,
            CrimeType::Theft,
            CrimeType::Fighting,
            CrimeType::Pickpocketing,
            CrimeType::DrugDealing,
            CrimeType::Robbery,
            CrimeType::Smuggling,
            CrimeType::Fraud,
            CrimeType::WeaponsDealing,
            CrimeType::ResistingArrest,
            CrimeType::BriberyAttempt,
        ] {
            assert!(catalog.profiles.contains_key(&crime), "{:?}", crime);
        }
    }
}
