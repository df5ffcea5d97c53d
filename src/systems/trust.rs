use bevy_ecs::prelude::*;

use crate::data::factions::{AccessRule, UnderworldCatalog};
use crate::simulation::market::MarketState;
use crate::simulation::profile::{PlayerProfile, SkillId};
use crate::simulation::time::GameTime;
use crate::simulation::underworld::{Faction, TrustLedger};
use crate::systems::notify::{NotificationLog, Severity};

#[derive(Resource, Debug, Default)]
pub struct TrustEventLog(pub Vec<TrustEvent>);

#[derive(Debug, Clone)]
pub enum TrustEvent {
    AccessGranted(Faction),
    AccessRevoked(Faction),
}

/// Runtime unlock check. `granted_at_start` only seeds the initial ledger;
/// re-earning access always goes through the stat conditions.
fn rule_passes(rule: &AccessRule, notoriety: f32, ledger: &TrustLedger, profile: &PlayerProfile) -> bool {
    if notoriety < rule.min_notoriety {
        return false;
    }
    if let Some(requirement) = &rule.required_trust {
        if ledger.trust(requirement.faction) < requirement.min_trust {
            return false;
        }
    }
    profile.skill_level(SkillId::Streetwise) >= rule.min_streetwise
}

/// Per-tick trust pass: decay outside the recency window, revoke access
/// under half the threshold, and evaluate unlock rules for closed doors.
///
/// Revocation is idempotent (guarded by the current access flag) and a
/// grant never fires twice while access is held.
pub fn tick_trust(
    ledger: &mut TrustLedger,
    catalog: &UnderworldCatalog,
    notoriety: f32,
    profile: &PlayerProfile,
    now_seconds: f64,
    delta_seconds: f64,
    notices: &mut NotificationLog,
    events: &mut TrustEventLog,
) {
    for faction in Faction::ALL {
        let Some(config) = catalog.faction(faction) else {
            continue;
        };

        let standing = ledger.standing(faction);
        let recent_deal = standing
            .last_deal_at
            .map(|at| now_seconds - at < config.recency_window)
            .unwrap_or(false);
        if !recent_deal && standing.trust > 0.0 {
            ledger.change_trust(
                faction,
                -(config.trust_decay_rate * delta_seconds as f32),
                "idle decay",
            );
        }

        let standing = ledger.standing(faction);
        if standing.has_access && standing.trust < 0.5 * config.access_threshold {
            if let Some(entry) = ledger.standings.get_mut(&faction) {
                entry.has_access = false;
            }
            events.0.push(TrustEvent::AccessRevoked(faction));
            notices.push(
                "Doors closed",
                format!("{} no longer deal with you.", faction.label()),
                Severity::Warning,
            );
            continue;
        }

        if !standing.has_access && rule_passes(&config.access, notoriety, ledger, profile) {
            if let Some(entry) = ledger.standings.get_mut(&faction) {
                entry.has_access = true;
                entry.trust = entry.trust.max(config.access.initial_trust);
            }
            events.0.push(TrustEvent::AccessGranted(faction));
            notices.push(
                "New connections",
                format!("{} are willing to work with you.", faction.label()),
                Severity::Info,
            );
        }
    }
}

/// System: trust decay and access gating.
pub fn trust_system(
    mut ledger: ResMut<TrustLedger>,
    catalog: Res<UnderworldCatalog>,
    market: Res<MarketState>,
    profile: Res<PlayerProfile>,
    time: Res<GameTime>,
    mut notices: ResMut<NotificationLog>,
    mut events: ResMut<TrustEventLog>,
) {
    tick_trust(
        &mut ledger,
        &catalog,
        market.notoriety,
        &profile,
        time.seconds,
        time.delta_seconds,
        &mut notices,
        &mut events,
    );
}
