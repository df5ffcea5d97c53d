use bevy_ecs::prelude::*;
use bevy_ecs::schedule::SystemSet;

use crate::core::rng::RiskDice;
use crate::core::world::ActionQueue;
use crate::data::crimes::{CrimeCatalog, PoliceConfig, DEFAULT_CRIMES_PATH, DEFAULT_POLICE_PATH};
use crate::data::factions::{UnderworldCatalog, DEFAULT_UNDERWORLD_PATH};
use crate::simulation::city::CityState;
use crate::simulation::crime::WantedState;
use crate::simulation::economy::Wallet;
use crate::simulation::market::MarketState;
use crate::simulation::profile::{injury_recovery_system, PlayerProfile};
use crate::simulation::time::{advance_time_system, GameTime};
use crate::simulation::underworld::TrustLedger;
use crate::systems::intake::intake_system;
use crate::systems::market::{deal_resolution_system, market_generation_system, MarketEventLog};
use crate::systems::notify::{begin_tick_system, NotificationLog};
use crate::systems::police::{police_encounter_system, PoliceEventLog};
use crate::systems::trust::{trust_system, TrustEventLog};
use crate::systems::wanted::{wanted_decay_system, WantedEventLog};

/// Canonical tick ordering for the simulation.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TickSet {
    Intake,
    Simulation,
    Time,
}

/// Build the ECS world with baseline resources. Catalogs fall back to
/// their compiled-in tables when the JSON assets are absent.
pub fn create_world(seed: u64) -> World {
    let mut world = World::new();
    world.insert_resource(GameTime::default());
    world.insert_resource(ActionQueue::default());
    world.insert_resource(RiskDice::new(seed));
    world.insert_resource(CityState::default());
    world.insert_resource(Wallet::default());
    world.insert_resource(PlayerProfile::default());
    world.insert_resource(WantedState::default());
    world.insert_resource(TrustLedger::default());
    world.insert_resource(MarketState::default());
    world.insert_resource(CrimeCatalog::load_or_default(DEFAULT_CRIMES_PATH));
    world.insert_resource(PoliceConfig::load_or_default(DEFAULT_POLICE_PATH));
    world.insert_resource(UnderworldCatalog::load_or_default(DEFAULT_UNDERWORLD_PATH));
    world.insert_resource(NotificationLog::default());
    world.insert_resource(WantedEventLog::default());
    world.insert_resource(PoliceEventLog::default());
    world.insert_resource(TrustEventLog::default());
    world.insert_resource(MarketEventLog::default());
    world
}

/// Build the system schedule in the canonical order.
///
/// The simulation systems are chained so each subsystem runs exactly one
/// pass per tick in a fixed order, keeping seeded runs reproducible.
pub fn create_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.configure_sets((TickSet::Intake, TickSet::Simulation, TickSet::Time).chain());

    schedule.add_systems((
        (begin_tick_system, intake_system).chain().in_set(TickSet::Intake),
        (
            wanted_decay_system,
            police_encounter_system,
            deal_resolution_system,
            trust_system,
            market_generation_system,
            injury_recovery_system,
        )
            .chain()
            .in_set(TickSet::Simulation),
        advance_time_system.in_set(TickSet::Time),
    ));

    schedule
}
