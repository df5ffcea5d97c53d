use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::simulation::economy::Money;
use crate::simulation::underworld::Faction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealType {
    StolenGoods,
    CounterfeitCash,
    ContrabandRun,
    MoneyLaundering,
    WeaponsCrate,
    Heist,
}

impl DealType {
    pub fn label(self) -> &'static str {
        match self {
            DealType::StolenGoods => "Fencing stolen goods",
            DealType::CounterfeitCash => "Moving counterfeit cash",
            DealType::ContrabandRun => "Contraband run",
            DealType::MoneyLaundering => "Laundering money",
            DealType::WeaponsCrate => "Weapons crate",
            DealType::Heist => "Heist",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealPhase {
    Available,
    Active,
    Completed,
    Failed,
}

/// A timed investment-for-profit transaction with a faction.
///
/// Immutable once `Active` except for the terminal-phase fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: u64,
    pub deal_type: DealType,
    pub faction: Faction,
    pub investment: Money,
    pub potential_profit: Money,
    pub risk_level: f32,
    /// Seconds from start to maturation.
    pub duration: f64,
    pub min_streetwise: f32,
    pub min_notoriety: f32,
    /// Absolute timestamp after which an `Available` deal is withdrawn.
    pub available_until: f64,
    pub phase: DealPhase,
    /// Absolute timestamp of `start_deal`, used to compute maturation.
    pub started_at: Option<f64>,
    pub completed_at: Option<f64>,
}

impl Deal {
    pub fn matures_at(&self) -> Option<f64> {
        self.started_at.map(|start| start + self.duration)
    }
}

/// Resource owning the deal lists. `completed` is an append-only archive;
/// notoriety is always recomputed from it, never incrementally drifted.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct MarketState {
    pub available: Vec<Deal>,
    pub active: Vec<Deal>,
    pub completed: Vec<Deal>,
    pub next_deal_id: u64,
    /// None until the first generation pass has run.
    pub last_generated_at: Option<f64>,
    pub notoriety: f32,
}

impl Default for MarketState {
    fn default() -> Self {
        Self {
            available: Vec::new(),
            active: Vec::new(),
            completed: Vec::new(),
            next_deal_id: 1,
            last_generated_at: None,
            notoriety: 0.0,
        }
    }
}

impl MarketState {
    pub fn allocate_deal_id(&mut self) -> u64 {
        let id = self.next_deal_id;
        self.next_deal_id += 1;
        id
    }

    /// Pure fold over the completed archive: successes weigh their full
    /// risk, failures half (the player was still seen doing the work).
    pub fn recompute_notoriety(&mut self, weight_for_type: impl Fn(DealType) -> f32) {
        self.notoriety = self
            .completed
            .iter()
            .map(|deal| {
                let base = deal.risk_level * weight_for_type(deal.deal_type);
                match deal.phase {
                    DealPhase::Completed => base,
                    DealPhase::Failed => base * 0.5,
                    _ => 0.0,
                }
            })
            .sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archived(phase: DealPhase, risk: f32) -> Deal {
        Deal {
            id: 0,
            deal_type: DealType::StolenGoods,
            faction: Faction::StreetThugs,
            investment: Money::from_dollars(100),
            potential_profit: Money::from_dollars(80),
            risk_level: risk,
            duration: 60.0,
            min_streetwise: 0.0,
            min_notoriety: 0.0,
            available_until: 0.0,
            phase,
            started_at: Some(0.0),
            completed_at: Some(60.0),
        }
    }

    #[test]
    fn notoriety_is_pure_over_the_archive() {
        let mut market = MarketState::default();
        market.completed.push(archived(DealPhase::Completed, 0.4));
        market.completed.push(archived(DealPhase::Failed, 0.4));
        market.recompute_notoriety(|_| 10.0);
        let expected = 0.4 * 10.0 + 0.4 * 10.0 * 0.5;
        assert!((market.notoriety - expected).abs() < 1e-5);

        // Recomputing again does not drift.
        market.recompute_notoriety(|_| 10.0);
        assert!((market.notoriety - expected).abs() < 1e-5);
    }
}
