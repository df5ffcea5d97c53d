use std::collections::HashMap;

use bevy_ecs::prelude::*;
use bevy_utils::tracing::debug;
use serde::{Deserialize, Serialize};

/// Criminal factions the player can work for. Each holds its own trust and
/// access state and its own deal catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    StreetThugs,
    Smugglers,
    Syndicate,
    Cartel,
}

impl Faction {
    pub const ALL: [Faction; 4] = [
        Faction::StreetThugs,
        Faction::Smugglers,
        Faction::Syndicate,
        Faction::Cartel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Faction::StreetThugs => "Street Thugs",
            Faction::Smugglers => "Smugglers",
            Faction::Syndicate => "The Syndicate",
            Faction::Cartel => "The Cartel",
        }
    }
}

/// Per-faction trust/access pair. Trust is clamped to [0, 100]; access is
/// granted only through explicit unlock rules and revoked when trust falls
/// under half the faction's access threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct FactionStanding {
    pub trust: f32,
    pub has_access: bool,
    /// Absolute timestamp of the last completed deal with this faction,
    /// used for the trust-decay recency window.
    pub last_deal_at: Option<f64>,
}

/// Resource mapping each faction to its standing.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct TrustLedger {
    pub standings: HashMap<Faction, FactionStanding>,
}

impl Default for TrustLedger {
    fn default() -> Self {
        let mut standings = HashMap::new();
        for faction in Faction::ALL {
            standings.insert(faction, FactionStanding::default());
        }
        // The street tier is open from the start of the game.
        standings.insert(
            Faction::StreetThugs,
            FactionStanding {
                trust: 20.0,
                has_access: true,
                last_deal_at: None,
            },
        );
        Self { standings }
    }
}

impl TrustLedger {
    pub fn standing(&self, faction: Faction) -> FactionStanding {
        self.standings.get(&faction).copied().unwrap_or_default()
    }

    pub fn trust(&self, faction: Faction) -> f32 {
        self.standing(faction).trust
    }

    pub fn has_access(&self, faction: Faction) -> bool {
        self.standing(faction).has_access
    }

    /// Adjust trust, clamped to [0, 100]. The reason is observability only.
    pub fn change_trust(&mut self, faction: Faction, delta: f32, reason: &str) {
        let standing = self.standings.entry(faction).or_default();
        standing.trust = (standing.trust + delta).clamp(0.0, 100.0);
        debug!(?faction, delta, trust = standing.trust, reason, "trust change");
    }

    pub fn note_completed_deal(&mut self, faction: Faction, at_seconds: f64) {
        let standing = self.standings.entry(faction).or_default();
        standing.last_deal_at = Some(at_seconds);
    }

    /// Re-initialize any faction missing from a loaded save to safe
    /// defaults (zero trust, no access), and force every standing's
    /// trust back into [0, 100]. Loaded data must satisfy the same
    /// invariant `change_trust` maintains.
    pub fn repair_missing(&mut self) {
        for faction in Faction::ALL {
            self.standings.entry(faction).or_default();
        }
        for standing in self.standings.values_mut() {
            if !standing.trust.is_finite() {
                standing.trust = 0.0;
            }
            standing.trust = standing.trust.clamp(0.0, 100.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_is_clamped() {
        let mut ledger = TrustLedger::default();
        ledger.change_trust(Faction::StreetThugs, 500.0, "test");
        assert_eq!(ledger.trust(Faction::StreetThugs), 100.0);
        ledger.change_trust(Faction::StreetThugs, -500.0, "test");
        assert_eq!(ledger.trust(Faction::StreetThugs), 0.0);
    }

    #[test]
    fn repair_restores_missing_factions() {
        let mut ledger = TrustLedger::default();
        ledger.standings.remove(&Faction::Cartel);
        ledger.repair_missing();
        let standing = ledger.standing(Faction::Cartel);
        assert_eq!(standing.trust, 0.0);
        assert!(!standing.has_access);
    }

    #[test]
    fn repair_clamps_out_of_range_trust() {
        let mut ledger = TrustLedger::default();
        ledger
            .standings
            .insert(
                Faction::StreetThugs,
                FactionStanding {
                    trust: 500.0,
                    has_access: true,
                    last_deal_at: Some(0.0),
                },
            );
        ledger
            .standings
            .insert(
                Faction::Smugglers,
                FactionStanding {
                    trust: -40.0,
                    has_access: false,
                    last_deal_at: None,
                },
            );
        ledger.repair_missing();
        assert_eq!(ledger.trust(Faction::StreetThugs), 100.0);
        assert_eq!(ledger.trust(Faction::Smugglers), 0.0);
    }

    #[test]
    fn street_thugs_start_open() {
        let ledger = TrustLedger::default();
        assert!(ledger.has_access(Faction::StreetThugs));
        assert_eq!(ledger.trust(Faction::StreetThugs), 20.0);
    }
}
