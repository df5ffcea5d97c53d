use std::collections::HashMap;
use std::path::Path;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{load_json, DataError};
use crate::simulation::market::DealType;
use crate::simulation::underworld::Faction;

pub const DEFAULT_UNDERWORLD_PATH: &str = "./assets/data/underworld.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrustRequirement {
    pub faction: Faction,
    pub min_trust: f32,
}

/// Explicit unlock conditions for a faction. Access is never granted by
/// trust alone drifting over a threshold; one of these rules must pass.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccessRule {
    #[serde(default)]
    pub granted_at_start: bool,
    #[serde(default)]
    pub min_notoriety: f32,
    #[serde(default)]
    pub required_trust: Option<TrustRequirement>,
    #[serde(default)]
    pub min_streetwise: f32,
    /// Trust floor applied when access is granted.
    #[serde(default)]
    pub initial_trust: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactionProfile {
    pub deal_types: Vec<DealType>,
    pub deals_per_cycle: u32,
    pub risk_multiplier: f32,
    /// Trust level the faction considers you established at; access is
    /// revoked when trust falls under half of this.
    pub access_threshold: f32,
    /// Trust gained per successful deal is build_rate * 3.
    pub trust_build_rate: f32,
    /// Trust lost per second with no recent completed deal.
    pub trust_decay_rate: f32,
    /// Seconds after a completed deal during which trust does not decay.
    pub recency_window: f64,
    pub access: AccessRule,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DealTypeProfile {
    pub base_investment_dollars: i64,
    pub profit_multiplier: f64,
    pub base_risk: f32,
    pub duration_seconds: f64,
    pub notoriety_weight: f32,
    pub min_streetwise: f32,
    pub min_notoriety: f32,
}

/// Tuning for deal generation and resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub generation_interval: f64,
    /// Seconds an available deal stays on offer.
    pub deal_lifetime: f64,
    pub max_active_deals: usize,
    /// +/- fraction of jitter applied to each deal's investment.
    pub investment_jitter: f64,
    pub success_base: f64,
    pub success_risk_weight: f64,
    pub success_trust_weight: f64,
    pub success_skill_weight: f64,
    pub success_min_chance: f64,
    pub success_max_chance: f64,
    pub trust_loss_on_failure: f32,
    /// Chance of a single extra consequence on failure is risk * this.
    pub consequence_risk_weight: f64,
    /// Consequence fine is this fraction of the deal investment.
    pub consequence_fine_fraction: f64,
    pub consequence_injury_seconds: f64,
    pub reputation_gain_on_success: f32,
    pub reputation_loss_consequence: f32,
    pub experience_per_deal: f32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            generation_interval: 300.0,
            deal_lifetime: 600.0,
            max_active_deals: 3,
            investment_jitter: 0.3,
            success_base: 0.7,
            success_risk_weight: 0.3,
            success_trust_weight: 0.003,
            success_skill_weight: 0.01,
            success_min_chance: 0.05,
            success_max_chance: 0.95,
            trust_loss_on_failure: 5.0,
            consequence_risk_weight: 0.5,
            consequence_fine_fraction: 0.3,
            consequence_injury_seconds: 1200.0,
            reputation_gain_on_success: 2.0,
            reputation_loss_consequence: 4.0,
            experience_per_deal: 25.0,
        }
    }
}

/// Catalog of faction profiles, deal-type profiles, and market tuning.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct UnderworldCatalog {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub factions: HashMap<Faction, FactionProfile>,
    pub deal_types: HashMap<DealType, DealTypeProfile>,
    #[serde(default)]
    pub market: MarketConfig,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for UnderworldCatalog {
    fn default() -> Self {
        let mut factions = HashMap::new();

        factions.insert(
            Faction::StreetThugs,
            FactionProfile {
                deal_types: vec![DealType::StolenGoods, DealType::CounterfeitCash],
                deals_per_cycle: 2,
                risk_multiplier: 0.8,
                access_threshold: 30.0,
                trust_build_rate: 2.5,
                trust_decay_rate: 0.002,
                recency_window: 600.0,
                access: AccessRule {
                    granted_at_start: true,
                    // Once burned, the street tier must be re-earned.
                    min_notoriety: 2.0,
                    initial_trust: 20.0,
                    ..AccessRule::default()
                },
            },
        );

        factions.insert(
            Faction::Smugglers,
            FactionProfile {
                deal_types: vec![DealType::ContrabandRun, DealType::StolenGoods],
                deals_per_cycle: 2,
                risk_multiplier: 1.0,
                access_threshold: 40.0,
                trust_build_rate: 2.0,
                trust_decay_rate: 0.002,
                recency_window: 600.0,
                access: AccessRule {
                    min_notoriety: 5.0,
                    required_trust: Some(TrustRequirement {
                        faction: Faction::StreetThugs,
                        min_trust: 40.0,
                    }),
                    initial_trust: 15.0,
                    ..AccessRule::default()
                },
            },
        );

        factions.insert(
            Faction::Syndicate,
            FactionProfile {
                deal_types: vec![
                    DealType::MoneyLaundering,
                    DealType::CounterfeitCash,
                    DealType::WeaponsCrate,
                ],
                deals_per_cycle: 2,
                risk_multiplier: 1.2,
                access_threshold: 50.0,
                trust_build_rate: 1.8,
                trust_decay_rate: 0.0025,
                recency_window: 900.0,
                access: AccessRule {
                    min_notoriety: 15.0,
                    required_trust: Some(TrustRequirement {
                        faction: Faction::Smugglers,
                        min_trust: 50.0,
                    }),
                    min_streetwise: 3.0,
                    initial_trust: 15.0,
                    ..AccessRule::default()
                },
            },
        );

        factions.insert(
            Faction::Cartel,
            FactionProfile {
                deal_types: vec![
                    DealType::WeaponsCrate,
                    DealType::Heist,
                    DealType::ContrabandRun,
                ],
                deals_per_cycle: 1,
                risk_multiplier: 1.5,
                access_threshold: 60.0,
                trust_build_rate: 1.5,
                trust_decay_rate: 0.003,
                recency_window: 900.0,
                access: AccessRule {
                    min_notoriety: 30.0,
                    required_trust: Some(TrustRequirement {
                        faction: Faction::Syndicate,
                        min_trust: 60.0,
                    }),
                    min_streetwise: 5.0,
                    initial_trust: 10.0,
                    ..AccessRule::default()
                },
            },
        );

        let mut deal_types = HashMap::new();
        let entries = [
            (DealType::StolenGoods, 200, 0.8, 0.25, 300.0, 4.0, 0.0, 0.0),
            (DealType::CounterfeitCash, 350, 1.0, 0.35, 450.0, 5.0, 1.0, 0.0),
            (DealType::ContrabandRun, 500, 1.2, 0.45, 600.0, 7.0, 2.0, 5.0),
            (DealType::MoneyLaundering, 1_500, 0.6, 0.3, 900.0, 6.0, 3.0, 10.0),
            (DealType::WeaponsCrate, 2_000, 1.5, 0.6, 900.0, 10.0, 4.0, 15.0),
            (DealType::Heist, 5_000, 2.5, 0.8, 1_800.0, 16.0, 6.0, 30.0),
        ];
        for (deal, invest, profit, risk, duration, weight, skill, notoriety) in entries {
            deal_types.insert(
                deal,
                DealTypeProfile {
                    base_investment_dollars: invest,
                    profit_multiplier: profit,
                    base_risk: risk,
                    duration_seconds: duration,
                    notoriety_weight: weight,
                    min_streetwise: skill,
                    min_notoriety: notoriety,
                },
            );
        }

        Self {
            schema_version: default_schema_version(),
            factions,
            deal_types,
            market: MarketConfig::default(),
        }
    }
}

impl UnderworldCatalog {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        load_json(path)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load_from_path(&path) {
            Ok(catalog) => catalog,
            Err(err) => {
                eprintln!("Failed to load underworld catalog: {}", err);
                Self::default()
            }
        }
    }

    pub fn faction(&self, faction: Faction) -> Option<&FactionProfile> {
        self.factions.get(&faction)
    }

    pub fn deal_type(&self, deal: DealType) -> Option<&DealTypeProfile> {
        self.deal_types.get(&deal)
    }

    pub fn notoriety_weight(&self, deal: DealType) -> f32 {
        self.deal_types
            .get(&deal)
            .map(|p| p.notoriety_weight)
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_faction_has_a_profile_and_deal_types() {
        let catalog = UnderworldCatalog::default();
        for faction in Faction::ALL {
            let profile = catalog.faction(faction).expect("profile");
            assert!(!profile.deal_types.is_empty());
            for deal in &profile.deal_types {
                assert!(catalog.deal_type(*deal).is_some(), "{:?}", deal);
            }
        }
    }

    #[test]
    fn only_street_thugs_start_open() {
        let catalog = UnderworldCatalog::default();
        for faction in Faction::ALL {
            let open = catalog.faction(faction).unwrap().access.granted_at_start;
            assert_eq!(open, faction == Faction::StreetThugs);
        }
    }
}
