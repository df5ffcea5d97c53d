use bevy_ecs::prelude::*;

use crate::core::rng::RiskDice;
use crate::data::crimes::{CrimeCatalog, PoliceConfig};
use crate::data::factions::UnderworldCatalog;
use crate::simulation::city::CityState;
use crate::simulation::crime::{CrimeType, WantedState};
use crate::simulation::economy::{Money, Wallet};
use crate::simulation::market::{Deal, DealPhase, DealType, MarketState};
use crate::simulation::profile::{PlayerProfile, SkillId};
use crate::simulation::time::GameTime;
use crate::simulation::underworld::{Faction, TrustLedger};
use crate::systems::notify::{NotificationLog, Severity};
use crate::systems::wanted::{report_crime, WantedEventLog};

#[derive(Resource, Debug, Default)]
pub struct MarketEventLog(pub Vec<MarketEvent>);

#[derive(Debug, Clone)]
pub enum MarketEvent {
    DealsGenerated { count: usize },
    DealExpired { id: u64 },
    DealStarted { id: u64 },
    DealCompleted { id: u64, payout: Money },
    DealFailed { id: u64, consequence: Option<FailureConsequence> },
}

/// At most one of these is applied per failed deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureConsequence {
    Fine,
    ArrestRisk,
    ReputationLoss,
    Injury,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealStartError {
    UnknownDeal,
    TooManyActiveDeals,
    RequirementsNotMet,
    InsufficientFunds,
}

impl std::fmt::Display for DealStartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            DealStartError::UnknownDeal => "no such deal on offer",
            DealStartError::TooManyActiveDeals => "too many deals already running",
            DealStartError::RequirementsNotMet => "you do not meet the requirements",
            DealStartError::InsufficientFunds => "you cannot cover the investment",
        };
        write!(f, "{}", message)
    }
}

impl std::error::Error for DealStartError {}

fn crime_for_deal(deal_type: DealType) -> CrimeType {
    match deal_type {
        DealType::StolenGoods => CrimeType::Theft,
        DealType::CounterfeitCash => CrimeType::Fraud,
        DealType::ContrabandRun => CrimeType::Smuggling,
        DealType::MoneyLaundering => CrimeType::Fraud,
        DealType::WeaponsCrate => CrimeType::WeaponsDealing,
        DealType::Heist => CrimeType::Robbery,
    }
}

fn player_meets_requirements(
    min_streetwise: f32,
    min_notoriety: f32,
    profile: &PlayerProfile,
    notoriety: f32,
) -> bool {
    profile.skill_level(SkillId::Streetwise) >= min_streetwise && notoriety >= min_notoriety
}

/// Periodic generation pass: expire stale offers, then roll fresh deals for
/// every faction currently holding access. Deal economics come from the
/// per-type and per-faction tables, never ad hoc; `crime_pressure` is the
/// active district's scaling on generated risk.
#[allow(clippy::too_many_arguments)]
pub fn generate_deals(
    market: &mut MarketState,
    ledger: &TrustLedger,
    catalog: &UnderworldCatalog,
    profile: &PlayerProfile,
    dice: &mut RiskDice,
    crime_pressure: f32,
    now_seconds: f64,
    notices: &mut NotificationLog,
    events: &mut MarketEventLog,
) {
    let config = &catalog.market;

    let mut expired = Vec::new();
    market.available.retain(|deal| {
        if now_seconds >= deal.available_until {
            expired.push(deal.id);
            false
        } else {
            true
        }
    });
    for id in expired {
        events.0.push(MarketEvent::DealExpired { id });
    }

    let due = match market.last_generated_at {
        None => true,
        Some(last) => now_seconds - last >= config.generation_interval,
    };
    if !due {
        return;
    }
    market.last_generated_at = Some(now_seconds);

    let notoriety = market.notoriety;
    let mut generated = 0usize;
    for faction in Faction::ALL {
        if !ledger.has_access(faction) {
            continue;
        }
        let Some(faction_config) = catalog.faction(faction) else {
            continue;
        };

        let candidates: Vec<DealType> = faction_config
            .deal_types
            .iter()
            .copied()
            .filter(|deal_type| {
                catalog
                    .deal_type(*deal_type)
                    .map(|p| {
                        player_meets_requirements(
                            p.min_streetwise,
                            p.min_notoriety,
                            profile,
                            notoriety,
                        )
                    })
                    .unwrap_or(false)
            })
            .collect();
        if candidates.is_empty() {
            continue;
        }

        for _ in 0..faction_config.deals_per_cycle {
            let deal_type = candidates[dice.pick_index(candidates.len())];
            let type_config = match catalog.deal_type(deal_type) {
                Some(config) => *config,
                None => continue,
            };

            let jitter = dice.range(-config.investment_jitter, config.investment_jitter);
            let investment =
                Money::from_dollars(type_config.base_investment_dollars).scale(1.0 + jitter);
            let potential_profit = investment.scale(type_config.profit_multiplier);
            let reputation_discount =
                1.0 - (profile.criminal_reputation * 0.005).min(0.3);
            let risk = (type_config.base_risk
                * faction_config.risk_multiplier
                * crime_pressure
                * reputation_discount)
                .clamp(0.05, 0.95);

            let id = market.allocate_deal_id();
            market.available.push(Deal {
                id,
                deal_type,
                faction,
                investment,
                potential_profit,
                risk_level: risk,
                duration: type_config.duration_seconds,
                min_streetwise: type_config.min_streetwise,
                min_notoriety: type_config.min_notoriety,
                available_until: now_seconds + config.deal_lifetime,
                phase: DealPhase::Available,
                started_at: None,
                completed_at: None,
            });
            generated += 1;
        }
    }

    if generated > 0 {
        events.0.push(MarketEvent::DealsGenerated { count: generated });
        notices.push(
            "Word on the street",
            format!("{} new deals are on offer.", generated),
            Severity::Info,
        );
    }
}

/// Start an available deal: checks the active cap and the requirement
/// predicates before any funds move, then debits the investment and moves
/// the deal to the active list.
pub fn start_deal(
    market: &mut MarketState,
    ledger: &TrustLedger,
    wallet: &mut Wallet,
    profile: &PlayerProfile,
    catalog: &UnderworldCatalog,
    id: u64,
    now_seconds: f64,
    notices: &mut NotificationLog,
    events: &mut MarketEventLog,
) -> Result<(), DealStartError> {
    let index = market
        .available
        .iter()
        .position(|deal| deal.id == id)
        .ok_or(DealStartError::UnknownDeal)?;

    if market.active.len() >= catalog.market.max_active_deals {
        return Err(DealStartError::TooManyActiveDeals);
    }

    let deal = &market.available[index];
    let requirements_ok = ledger.has_access(deal.faction)
        && player_meets_requirements(
            deal.min_streetwise,
            deal.min_notoriety,
            profile,
            market.notoriety,
        );
    if !requirements_ok {
        return Err(DealStartError::RequirementsNotMet);
    }
    if !wallet.can_afford(deal.investment) {
        return Err(DealStartError::InsufficientFunds);
    }

    let mut deal = market.available.remove(index);
    wallet.spend(deal.investment, "deal investment");
    deal.phase = DealPhase::Active;
    deal.started_at = Some(now_seconds);
    events.0.push(MarketEvent::DealStarted { id: deal.id });
    notices.push(
        "Deal started",
        format!(
            "{} with {}. {} invested, matures in {:.0}s.",
            deal.deal_type.label(),
            deal.faction.label(),
            deal.investment,
            deal.duration,
        ),
        Severity::Info,
    );
    market.active.push(deal);
    Ok(())
}

/// Maturation sweep: resolves every active deal whose duration elapsed,
/// applies the outcome, archives it, and recomputes notoriety from the
/// archive. A failed deal applies at most one extra consequence.
#[allow(clippy::too_many_arguments)]
pub fn resolve_deals(
    market: &mut MarketState,
    ledger: &mut TrustLedger,
    wallet: &mut Wallet,
    profile: &mut PlayerProfile,
    wanted: &mut WantedState,
    crimes: &CrimeCatalog,
    police: &PoliceConfig,
    catalog: &UnderworldCatalog,
    dice: &mut RiskDice,
    now_seconds: f64,
    notices: &mut NotificationLog,
    events: &mut MarketEventLog,
    wanted_events: &mut WantedEventLog,
) {
    let config = &catalog.market;
    let mut resolved_any = false;

    let mut index = 0;
    while index < market.active.len() {
        let matured = market.active[index]
            .matures_at()
            .map(|at| now_seconds >= at)
            .unwrap_or(false);
        if !matured {
            index += 1;
            continue;
        }

        let mut deal = market.active.remove(index);
        resolved_any = true;

        let trust = ledger.trust(deal.faction);
        let skill = profile.skill_level(SkillId::Streetwise);
        let chance = (config.success_base
            - deal.risk_level as f64 * config.success_risk_weight
            + trust as f64 * config.success_trust_weight
            + skill as f64 * config.success_skill_weight)
            .clamp(config.success_min_chance, config.success_max_chance);

        let build_rate = catalog
            .faction(deal.faction)
            .map(|f| f.trust_build_rate)
            .unwrap_or(1.0);

        if dice.chance(chance) {
            deal.phase = DealPhase::Completed;
            deal.completed_at = Some(now_seconds);
            let payout = deal.investment.add(deal.potential_profit);
            wallet.add(payout, "deal payout");
            ledger.change_trust(deal.faction, build_rate * 3.0, "successful deal");
            profile.adjust_reputation(config.reputation_gain_on_success);
            profile.grant_experience(SkillId::Streetwise, config.experience_per_deal);
            events.0.push(MarketEvent::DealCompleted { id: deal.id, payout });
            notices.push(
                "Deal paid off",
                format!(
                    "{} cleared {} ({} profit).",
                    deal.deal_type.label(),
                    payout,
                    deal.potential_profit,
                ),
                Severity::Info,
            );
        } else {
            deal.phase = DealPhase::Failed;
            deal.completed_at = Some(now_seconds);
            ledger.change_trust(deal.faction, -config.trust_loss_on_failure, "failed deal");

            // The investment is already sunk; roll for one extra consequence.
            let consequence = if dice
                .chance(deal.risk_level as f64 * config.consequence_risk_weight)
            {
                let picked = match dice.pick_index(4) {
                    0 => FailureConsequence::Fine,
                    1 => FailureConsequence::ArrestRisk,
                    2 => FailureConsequence::ReputationLoss,
                    _ => FailureConsequence::Injury,
                };
                apply_consequence(
                    picked, &deal, wallet, profile, wanted, crimes, police, config, now_seconds,
                    notices, wanted_events,
                );
                Some(picked)
            } else {
                None
            };

            events.0.push(MarketEvent::DealFailed { id: deal.id, consequence });
            notices.push(
                "Deal went bad",
                format!(
                    "{} fell through. {} is gone.",
                    deal.deal_type.label(),
                    deal.investment,
                ),
                Severity::Warning,
            );
        }

        ledger.note_completed_deal(deal.faction, now_seconds);
        market.completed.push(deal);
    }

    if resolved_any {
        market.recompute_notoriety(|deal_type| catalog.notoriety_weight(deal_type));
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_consequence(
    consequence: FailureConsequence,
    deal: &Deal,
    wallet: &mut Wallet,
    profile: &mut PlayerProfile,
    wanted: &mut WantedState,
    crimes: &CrimeCatalog,
    police: &PoliceConfig,
    config: &crate::data::factions::MarketConfig,
    now_seconds: f64,
    notices: &mut NotificationLog,
    wanted_events: &mut WantedEventLog,
) {
    match consequence {
        FailureConsequence::Fine => {
            let amount = deal
                .investment
                .scale(config.consequence_fine_fraction)
                .min(wallet.balance);
            if amount.is_positive() {
                wallet.spend(amount, "deal fallout fine");
            }
            notices.push(
                "Shakedown",
                format!("The fallout cost you another {}.", amount),
                Severity::Warning,
            );
        }
        FailureConsequence::ArrestRisk => {
            report_crime(
                wanted,
                crimes,
                police,
                crime_for_deal(deal.deal_type),
                deal.risk_level.clamp(0.0, 1.0),
                wanted
                    .most_recent_crime()
                    .map(|c| c.location)
                    .unwrap_or(crate::simulation::city::LocationId(1)),
                now_seconds,
                notices,
                wanted_events,
            );
        }
        FailureConsequence::ReputationLoss => {
            profile.adjust_reputation(-config.reputation_loss_consequence);
            notices.push(
                "Reputation hit",
                "Word spreads that you botched the job.",
                Severity::Warning,
            );
        }
        FailureConsequence::Injury => {
            profile.injure(config.consequence_injury_seconds);
            notices.push(
                "Roughed up",
                "You took a beating on the way out.",
                Severity::Critical,
            );
        }
    }
}

/// System: periodic deal generation, scaled by the active district.
#[allow(clippy::too_many_arguments)]
pub fn market_generation_system(
    mut market: ResMut<MarketState>,
    ledger: Res<TrustLedger>,
    catalog: Res<UnderworldCatalog>,
    profile: Res<PlayerProfile>,
    city: Res<CityState>,
    time: Res<GameTime>,
    mut dice: ResMut<RiskDice>,
    mut notices: ResMut<NotificationLog>,
    mut events: ResMut<MarketEventLog>,
) {
    generate_deals(
        &mut market,
        &ledger,
        &catalog,
        &profile,
        &mut dice,
        city.crime_pressure(city.active_location),
        time.seconds,
        &mut notices,
        &mut events,
    );
}

/// System: maturation sweep for active deals.
#[allow(clippy::too_many_arguments)]
pub fn deal_resolution_system(
    mut market: ResMut<MarketState>,
    mut ledger: ResMut<TrustLedger>,
    mut wallet: ResMut<Wallet>,
    mut profile: ResMut<PlayerProfile>,
    mut wanted: ResMut<WantedState>,
    crimes: Res<CrimeCatalog>,
    police: Res<PoliceConfig>,
    catalog: Res<UnderworldCatalog>,
    time: Res<GameTime>,
    mut dice: ResMut<RiskDice>,
    mut notices: ResMut<NotificationLog>,
    mut events: ResMut<MarketEventLog>,
    mut wanted_events: ResMut<WantedEventLog>,
) {
    resolve_deals(
        &mut market,
        &mut ledger,
        &mut wallet,
        &mut profile,
        &mut wanted,
        &crimes,
        &police,
        &catalog,
        &mut dice,
        time.seconds,
        &mut notices,
        &mut events,
        &mut wanted_events,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rig {
        market: MarketState,
        ledger: TrustLedger,
        wallet: Wallet,
        profile: PlayerProfile,
        wanted: WantedState,
        crimes: CrimeCatalog,
        police: PoliceConfig,
        catalog: UnderworldCatalog,
        dice: RiskDice,
        notices: NotificationLog,
        events: MarketEventLog,
        wanted_events: WantedEventLog,
    }

    impl Rig {
        fn new(seed: u64) -> Self {
            Self {
                market: MarketState::default(),
                ledger: TrustLedger::default(),
                wallet: Wallet {
                    balance: Money::from_dollars(10_000),
                },
                profile: PlayerProfile::default(),
                wanted: WantedState::default(),
                crimes: CrimeCatalog::default(),
                police: PoliceConfig::default(),
                catalog: UnderworldCatalog::default(),
                dice: RiskDice::new(seed),
                notices: NotificationLog::default(),
                events: MarketEventLog::default(),
                wanted_events: WantedEventLog::default(),
            }
        }

        fn generate(&mut self, now: f64) {
            self.generate_under_pressure(1.0, now);
        }

        fn generate_under_pressure(&mut self, pressure: f32, now: f64) {
            generate_deals(
                &mut self.market,
                &self.ledger,
                &self.catalog,
                &self.profile,
                &mut self.dice,
                pressure,
                now,
                &mut self.notices,
                &mut self.events,
            );
        }

        fn start(&mut self, id: u64, now: f64) -> Result<(), DealStartError> {
            start_deal(
                &mut self.market,
                &self.ledger,
                &mut self.wallet,
                &self.profile,
                &self.catalog,
                id,
                now,
                &mut self.notices,
                &mut self.events,
            )
        }

        fn resolve(&mut self, now: f64) {
            resolve_deals(
                &mut self.market,
                &mut self.ledger,
                &mut self.wallet,
                &mut self.profile,
                &mut self.wanted,
                &self.crimes,
                &self.police,
                &self.catalog,
                &mut self.dice,
                now,
                &mut self.notices,
                &mut self.events,
                &mut self.wanted_events,
            );
        }
    }

    #[test]
    fn generation_only_serves_accessible_factions() {
        let mut rig = Rig::new(1);
        rig.generate(0.0);
        assert!(!rig.market.available.is_empty());
        assert!(rig
            .market
            .available
            .iter()
            .all(|deal| deal.faction == Faction::StreetThugs));
    }

    #[test]
    fn district_pressure_scales_generated_risk() {
        // Same seed, so both rigs roll the identical deal sequence and
        // only the pressure term differs.
        let mut calm = Rig::new(1);
        calm.generate_under_pressure(1.0, 0.0);
        let mut rough = Rig::new(1);
        rough.generate_under_pressure(1.3, 0.0);

        assert_eq!(calm.market.available.len(), rough.market.available.len());
        for (a, b) in calm
            .market
            .available
            .iter()
            .zip(rough.market.available.iter())
        {
            assert_eq!(a.deal_type, b.deal_type);
            assert!(b.risk_level > a.risk_level);
            assert!(b.risk_level <= 0.95);
        }
    }

    #[test]
    fn generation_respects_the_interval() {
        let mut rig = Rig::new(2);
        rig.generate(0.0);
        let count = rig.market.available.len();
        rig.generate(10.0);
        assert_eq!(rig.market.available.len(), count);

        let interval = rig.catalog.market.generation_interval;
        rig.generate(interval + 1.0);
        assert!(rig.market.available.len() > count);
    }

    #[test]
    fn stale_offers_expire() {
        let mut rig = Rig::new(3);
        rig.generate(0.0);
        assert!(!rig.market.available.is_empty());
        let lifetime = rig.catalog.market.deal_lifetime;
        // Old offers vanish even between generation cycles.
        rig.market.last_generated_at = Some(lifetime + 1.0);
        rig.generate(lifetime + 1.0);
        assert!(rig
            .events
            .0
            .iter()
            .any(|e| matches!(e, MarketEvent::DealExpired { .. })));
    }

    #[test]
    fn start_deal_debits_exactly_the_investment() {
        let mut rig = Rig::new(4);
        rig.generate(0.0);
        let deal = rig.market.available[0].clone();
        let before = rig.wallet.balance;

        rig.start(deal.id, 1.0).expect("start");
        assert_eq!(rig.wallet.balance, before.sub(deal.investment));
        assert_eq!(rig.market.active.len(), 1);
        assert_eq!(rig.market.active[0].phase, DealPhase::Active);
        assert_eq!(rig.market.active[0].started_at, Some(1.0));
    }

    #[test]
    fn start_deal_rejections_move_no_money() {
        let mut rig = Rig::new(5);
        rig.generate(0.0);
        let deal_id = rig.market.available[0].id;

        assert_eq!(rig.start(999, 1.0), Err(DealStartError::UnknownDeal));

        rig.wallet.balance = Money::zero();
        assert_eq!(rig.start(deal_id, 1.0), Err(DealStartError::InsufficientFunds));
        assert_eq!(rig.market.available.iter().filter(|d| d.id == deal_id).count(), 1);
        assert!(rig.market.active.is_empty());

        // Losing access blocks the start before funds are checked.
        rig.wallet.balance = Money::from_dollars(10_000);
        rig.ledger
            .standings
            .get_mut(&Faction::StreetThugs)
            .unwrap()
            .has_access = false;
        assert_eq!(rig.start(deal_id, 1.0), Err(DealStartError::RequirementsNotMet));
        assert_eq!(rig.wallet.balance, Money::from_dollars(10_000));
    }

    #[test]
    fn active_deal_cap_is_enforced() {
        let mut rig = Rig::new(6);
        rig.generate(0.0);
        let interval = rig.catalog.market.generation_interval;
        rig.generate(interval + 1.0);

        let cap = rig.catalog.market.max_active_deals;
        let ids: Vec<u64> = rig.market.available.iter().map(|d| d.id).collect();
        let mut started = 0;
        for id in &ids {
            match rig.start(*id, 1.0) {
                Ok(()) => started += 1,
                Err(DealStartError::TooManyActiveDeals) => break,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert_eq!(started, cap.min(ids.len()));
    }

    #[test]
    fn successful_deal_nets_the_potential_profit() {
        let mut rig = Rig::new(7);
        rig.generate(0.0);
        let deal = rig.market.available[0].clone();
        let before = rig.wallet.balance;

        rig.start(deal.id, 1.0).expect("start");

        // Guarantee success.
        rig.catalog.market.success_base = 1.0;
        rig.catalog.market.success_max_chance = 1.0;
        let trust_before = rig.ledger.trust(deal.faction);
        rig.resolve(1.0 + deal.duration);

        assert_eq!(rig.wallet.balance, before.add(deal.potential_profit));
        assert_eq!(rig.market.active.len(), 0);
        assert_eq!(rig.market.completed.len(), 1);
        assert!(rig.ledger.trust(deal.faction) > trust_before);
        assert!(rig.market.notoriety > 0.0);
        assert!(rig.profile.criminal_reputation > 0.0);
    }

    #[test]
    fn failed_deal_costs_exactly_the_investment_when_no_consequence() {
        let mut rig = Rig::new(8);
        rig.generate(0.0);
        let deal = rig.market.available[0].clone();
        let before = rig.wallet.balance;

        rig.start(deal.id, 1.0).expect("start");

        // Guarantee failure and suppress the consequence roll.
        rig.catalog.market.success_base = 0.0;
        rig.catalog.market.success_min_chance = 0.0;
        rig.catalog.market.consequence_risk_weight = 0.0;
        let trust_before = rig.ledger.trust(deal.faction);
        rig.resolve(1.0 + deal.duration);

        assert_eq!(rig.wallet.balance, before.sub(deal.investment));
        assert_eq!(rig.market.completed.len(), 1);
        assert_eq!(rig.market.completed[0].phase, DealPhase::Failed);
        assert!(rig.ledger.trust(deal.faction) < trust_before);
    }

    #[test]
    fn failed_deal_applies_at_most_one_consequence() {
        for seed in 0..24 {
            let mut rig = Rig::new(seed);
            rig.generate(0.0);
            let deal = rig.market.available[0].clone();
            rig.start(deal.id, 1.0).expect("start");

            rig.catalog.market.success_base = 0.0;
            rig.catalog.market.success_min_chance = 0.0;
            rig.resolve(1.0 + deal.duration);

            let failures: Vec<_> = rig
                .events
                .0
                .iter()
                .filter_map(|e| match e {
                    MarketEvent::DealFailed { consequence, .. } => Some(consequence),
                    _ => None,
                })
                .collect();
            assert_eq!(failures.len(), 1);
            // Zero or one consequence, never more: the event carries an
            // Option, and only one apply path runs per failure.
        }
    }

    #[test]
    fn arrest_risk_consequence_reports_a_crime() {
        let mut rig = Rig::new(9);
        rig.generate(0.0);
        let deal = rig.market.available[0].clone();
        rig.start(deal.id, 1.0).expect("start");

        rig.catalog.market.success_base = 0.0;
        rig.catalog.market.success_min_chance = 0.0;
        rig.catalog.market.consequence_risk_weight = 10.0; // always roll a consequence

        // Scan seeds until the consequence picked is the crime report.
        let mut hit = false;
        for seed in 0..64 {
            let mut inner = Rig::new(seed);
            inner.generate(0.0);
            let deal = inner.market.available[0].clone();
            inner.start(deal.id, 1.0).expect("start");
            inner.catalog.market.success_base = 0.0;
            inner.catalog.market.success_min_chance = 0.0;
            inner.catalog.market.consequence_risk_weight = 10.0;
            inner.resolve(1.0 + deal.duration);
            let arrested_risk = inner.events.0.iter().any(|e| {
                matches!(
                    e,
                    MarketEvent::DealFailed {
                        consequence: Some(FailureConsequence::ArrestRisk),
                        ..
                    }
                )
            });
            if arrested_risk {
                assert!(!inner.wanted.crime_history.is_empty());
                assert!(inner.wanted.is_wanted());
                hit = true;
                break;
            }
        }
        assert!(hit, "no seed produced the arrest-risk consequence");
    }
}
