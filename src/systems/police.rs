use bevy_ecs::prelude::*;

use crate::core::rng::RiskDice;
use crate::data::crimes::{CrimeCatalog, PoliceConfig};
use crate::simulation::city::CityState;
use crate::simulation::crime::{CrimeType, WantedLevel, WantedState};
use crate::simulation::economy::{Money, Wallet};
use crate::simulation::profile::{PlayerProfile, SkillId};
use crate::simulation::time::{GameTime, TimePeriod};
use crate::systems::notify::{NotificationLog, Severity};
use crate::systems::wanted::{arrest_player, clear_wanted_level, report_crime, WantedEventLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoliceAction {
    Warning,
    Fine,
    Arrest,
    Chase,
}

#[derive(Resource, Debug, Default)]
pub struct PoliceEventLog(pub Vec<PoliceEvent>);

#[derive(Debug, Clone)]
pub enum PoliceEvent {
    EncounterTriggered { forced: bool },
    ActionTaken(PoliceAction),
    FinePaid { amount: Money },
    FineEscalatedToArrest { amount: Money },
    MoneyConfiscated { amount: Money },
    BribeAccepted { amount: Money },
    BribeRefused { amount: Money },
    NegotiationSucceeded,
    NegotiationFailed,
}

/// Encounter probability per tick: base rate scaled linearly by the level
/// index, by the district's police presence, and reduced in the dark
/// periods of the day.
pub fn encounter_probability(
    config: &PoliceConfig,
    level: WantedLevel,
    location_multiplier: f32,
    period: TimePeriod,
    delta_seconds: f64,
) -> f64 {
    if level == WantedLevel::None {
        return 0.0;
    }
    let day_night = if period.is_dark() {
        config.night_multiplier
    } else {
        1.0
    };
    config.base_encounter_rate * level.index() as f64 * location_multiplier as f64
        * day_night
        * delta_seconds
}

fn last_crime_type(wanted: &WantedState) -> CrimeType {
    wanted
        .most_recent_crime()
        .map(|record| record.crime)
        .unwrap_or(CrimeType::Vandalism)
}

fn fine_amount(crimes: &CrimeCatalog, config: &PoliceConfig, wanted: &WantedState) -> Money {
    let base = crimes.base_fine(last_crime_type(wanted));
    base.scale(1.0 + wanted.level.index() as f64 * (config.fine_multiplier - 1.0))
}

fn jail_seconds(config: &PoliceConfig, level: WantedLevel) -> f64 {
    config.base_jail_seconds + level.index() as f64 * config.jail_seconds_per_level
}

fn apply_arrest(
    wanted: &mut WantedState,
    config: &PoliceConfig,
    wallet: &mut Wallet,
    now_seconds: f64,
    notices: &mut NotificationLog,
    wanted_events: &mut WantedEventLog,
    police_events: &mut PoliceEventLog,
) {
    if wallet.balance.is_positive() {
        let seized = wallet.balance.scale(config.arrest_confiscation);
        if wallet.spend(seized, "arrest confiscation") {
            police_events
                .0
                .push(PoliceEvent::MoneyConfiscated { amount: seized });
            notices.push(
                "Money confiscated",
                format!("The police seized {} during booking.", seized),
                Severity::Warning,
            );
        }
    }
    arrest_player(
        wanted,
        jail_seconds(config, wanted.level),
        now_seconds,
        notices,
        wanted_events,
    );
}

/// Resolve one triggered encounter: pick an action from the level's weight
/// table and apply it. Never re-entered within a tick; a chase escalates
/// through the crime-report contract and terminates because the ladder is
/// clamped at the top.
pub fn resolve_encounter(
    wanted: &mut WantedState,
    crimes: &CrimeCatalog,
    config: &PoliceConfig,
    wallet: &mut Wallet,
    dice: &mut RiskDice,
    now_seconds: f64,
    notices: &mut NotificationLog,
    wanted_events: &mut WantedEventLog,
    police_events: &mut PoliceEventLog,
) {
    if wanted.is_under_arrest || !wanted.is_wanted() {
        return;
    }

    let weights = config.weights_for_level(wanted.level);
    let action = match dice.pick_weighted(&[
        weights.warning,
        weights.fine,
        weights.arrest,
        weights.chase,
    ]) {
        0 => PoliceAction::Warning,
        1 => PoliceAction::Fine,
        2 => PoliceAction::Arrest,
        _ => PoliceAction::Chase,
    };
    police_events.0.push(PoliceEvent::ActionTaken(action));

    match action {
        PoliceAction::Warning => {
            wanted.decay_timer = (wanted.decay_timer - config.warning_timer_reduction).max(0.0);
            notices.push(
                "Police warning",
                "An officer lets you off with a warning. Keep your head down.",
                Severity::Info,
            );
        }
        PoliceAction::Fine => {
            let amount = fine_amount(crimes, config, wanted);
            if !wallet.can_afford(amount) {
                // Documented fallback: an unpayable fine becomes an arrest,
                // superseding the fine's level reduction entirely.
                police_events
                    .0
                    .push(PoliceEvent::FineEscalatedToArrest { amount });
                notices.push(
                    "Fine unpayable",
                    format!("You cannot pay the {} fine. You are being booked.", amount),
                    Severity::Critical,
                );
                apply_arrest(
                    wanted, config, wallet, now_seconds, notices, wanted_events, police_events,
                );
                return;
            }
            wallet.spend(amount, "police fine");
            police_events.0.push(PoliceEvent::FinePaid { amount });
            if let Some(record) = wanted.crime_history.iter_mut().rev().find(|c| !c.resolved) {
                record.resolved = true;
            }
            let reduced = WantedLevel::from_index(wanted.level.index() - 1);
            wanted.level = reduced;
            wanted.decay_timer = crimes.decay_duration(reduced);
            notices.push(
                "Fined",
                format!("You paid a {} fine on the spot.", amount),
                Severity::Warning,
            );
            if reduced == WantedLevel::None {
                clear_wanted_level(wanted, notices, wanted_events);
            }
        }
        PoliceAction::Arrest => {
            apply_arrest(
                wanted, config, wallet, now_seconds, notices, wanted_events, police_events,
            );
        }
        PoliceAction::Chase => {
            notices.push(
                "Police chase",
                "You bolt. Resisting arrest will not make things better.",
                Severity::Critical,
            );
            report_crime(
                wanted,
                crimes,
                config,
                CrimeType::ResistingArrest,
                1.0,
                wanted
                    .most_recent_crime()
                    .map(|c| c.location)
                    .unwrap_or(crate::simulation::city::LocationId(1)),
                now_seconds,
                notices,
                wanted_events,
            );
        }
    }
}

/// Offer the officer money. Chance saturates below certainty, so no amount
/// guarantees success; a refused bribe is itself a crime.
#[allow(clippy::too_many_arguments)]
pub fn attempt_bribe(
    wanted: &mut WantedState,
    crimes: &CrimeCatalog,
    config: &PoliceConfig,
    wallet: &mut Wallet,
    profile: &PlayerProfile,
    dice: &mut RiskDice,
    amount: Money,
    now_seconds: f64,
    notices: &mut NotificationLog,
    wanted_events: &mut WantedEventLog,
    police_events: &mut PoliceEventLog,
) -> bool {
    if wanted.is_under_arrest || !wanted.is_wanted() {
        return false;
    }
    if !wallet.can_afford(amount) {
        notices.push(
            "Not enough cash",
            "You cannot offer money you do not have.",
            Severity::Info,
        );
        return false;
    }

    let recommended = config.recommended_bribe(crimes.base_fine(last_crime_type(wanted)), wanted.level);
    let amount_ratio = if recommended.is_positive() {
        (amount.as_cents() as f64 / recommended.as_cents() as f64).min(1.0)
    } else {
        1.0
    };
    let chance = (config.bribe_base_chance
        + amount_ratio * config.bribe_amount_weight
        + profile.skill_level(SkillId::Negotiation) as f64 * config.bribe_skill_bonus
        - wanted.level.index() as f64 * config.bribe_level_penalty)
        .clamp(0.0, config.bribe_max_chance);

    if dice.chance(chance) {
        wallet.spend(amount, "bribe");
        police_events.0.push(PoliceEvent::BribeAccepted { amount });
        let reduced = WantedLevel::from_index(wanted.level.index() - 2);
        wanted.level = reduced;
        if reduced == WantedLevel::None {
            clear_wanted_level(wanted, notices, wanted_events);
        } else {
            wanted.decay_timer = crimes.decay_duration(reduced);
        }
        notices.push(
            "Bribe accepted",
            format!("The officer pockets {} and looks the other way.", amount),
            Severity::Info,
        );
        true
    } else {
        police_events.0.push(PoliceEvent::BribeRefused { amount });
        notices.push(
            "Bribe refused",
            "The officer is not for sale. That attempt goes on your record.",
            Severity::Critical,
        );
        report_crime(
            wanted,
            crimes,
            config,
            CrimeType::BriberyAttempt,
            1.0,
            wanted
                .most_recent_crime()
                .map(|c| c.location)
                .unwrap_or(crate::simulation::city::LocationId(1)),
            now_seconds,
            notices,
            wanted_events,
        );
        false
    }
}

/// Talk your way down. Success only shortens the decay timer; the level
/// itself never moves.
pub fn attempt_negotiation(
    wanted: &mut WantedState,
    config: &PoliceConfig,
    profile: &PlayerProfile,
    dice: &mut RiskDice,
    notices: &mut NotificationLog,
    police_events: &mut PoliceEventLog,
) -> bool {
    if wanted.is_under_arrest || !wanted.is_wanted() {
        return false;
    }
    let chance = (config.negotiation_base_chance
        + profile.skill_level(SkillId::Negotiation) as f64 * config.negotiation_skill_bonus
        - wanted.level.index() as f64 * config.negotiation_level_penalty)
        .clamp(0.0, 1.0);

    if dice.chance(chance) {
        wanted.decay_timer = (wanted.decay_timer - config.negotiation_timer_reduction).max(0.0);
        police_events.0.push(PoliceEvent::NegotiationSucceeded);
        notices.push(
            "Smooth talking",
            "You talk the situation down. The heat fades a little faster.",
            Severity::Info,
        );
        true
    } else {
        police_events.0.push(PoliceEvent::NegotiationFailed);
        notices.push(
            "Negotiation failed",
            "The officer is unmoved.",
            Severity::Info,
        );
        false
    }
}

/// System: per-tick encounter roll plus the forced police-arrival schedule.
pub fn police_encounter_system(
    mut wanted: ResMut<WantedState>,
    crimes: Res<CrimeCatalog>,
    config: Res<PoliceConfig>,
    city: Res<CityState>,
    time: Res<GameTime>,
    mut wallet: ResMut<Wallet>,
    mut dice: ResMut<RiskDice>,
    mut notices: ResMut<NotificationLog>,
    mut wanted_events: ResMut<WantedEventLog>,
    mut police_events: ResMut<PoliceEventLog>,
) {
    if wanted.is_under_arrest || !wanted.is_wanted() {
        return;
    }

    let forced = match wanted.police_arrival_at {
        Some(arrival_at) if time.seconds >= arrival_at => {
            wanted.police_arrival_at = None;
            true
        }
        _ => false,
    };

    let triggered = forced || {
        let probability = encounter_probability(
            &config,
            wanted.level,
            city.police_multiplier(city.active_location),
            time.period(),
            time.delta_seconds,
        );
        dice.chance(probability)
    };

    if !triggered {
        return;
    }

    police_events.0.push(PoliceEvent::EncounterTriggered { forced });
    resolve_encounter(
        &mut wanted,
        &crimes,
        &config,
        &mut wallet,
        &mut dice,
        time.seconds,
        &mut notices,
        &mut wanted_events,
        &mut police_events,
    );
}
