use std::path::Path;

use bevy_ecs::prelude::*;

use crate::core::ecs::{create_schedule, create_world};
use crate::core::serialization::{
    apply_state_to_world, extract_state_from_world, load_state_from_path, save_state_to_path,
    SaveState,
};
use crate::simulation::city::{CityState, LocationId};
use crate::simulation::crime::{CrimeType, WantedLevel, WantedState};
use crate::simulation::economy::{Money, Wallet};
use crate::simulation::market::{Deal, MarketState};
use crate::simulation::profile::PlayerProfile;
use crate::simulation::time::GameTime;
use crate::simulation::underworld::{Faction, TrustLedger};
use crate::systems::notify::{Notification, NotificationLog};

/// Intent-driven commands fed into the simulation each tick.
#[derive(Debug, Clone)]
pub enum PlayerAction {
    CommitCrime { crime: CrimeType, severity: f32 },
    TravelTo(LocationId),
    AttemptBribe { amount: Money },
    Negotiate,
    StartDeal { id: u64 },
    Wait,
}

/// Resource storing the intents for the next tick.
#[derive(Resource, Default, Debug)]
pub struct ActionQueue(pub Vec<PlayerAction>);

#[derive(Debug, Clone)]
pub struct DealSummary {
    pub id: u64,
    pub label: String,
    pub faction: String,
    pub investment: Money,
    pub potential_profit: Money,
    pub risk_level: f32,
    /// Seconds until maturation for active deals, offer window otherwise.
    pub seconds_remaining: f64,
}

#[derive(Debug, Clone)]
pub struct FactionSummary {
    pub faction: Faction,
    pub trust: f32,
    pub has_access: bool,
}

/// Data snapshot returned to the UI layer after each tick.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub time_label: String,
    pub seconds: f64,
    pub district: String,
    pub balance: Money,
    pub wanted_level: WantedLevel,
    pub decay_timer: f64,
    pub is_under_arrest: bool,
    pub notoriety: f32,
    pub criminal_reputation: f32,
    pub is_injured: bool,
    pub factions: Vec<FactionSummary>,
    pub available_deals: Vec<DealSummary>,
    pub active_deals: Vec<DealSummary>,
    pub notifications: Vec<Notification>,
}

/// Wrapper around the ECS world and schedule.
pub struct Game {
    world: World,
    schedule: Schedule,
    seed: u64,
}

impl Game {
    /// Create a new game world using the provided seed.
    pub fn new(seed: u64) -> Self {
        let world = create_world(seed);
        let schedule = create_schedule();
        Self {
            world,
            schedule,
            seed,
        }
    }

    /// Run one simulation tick with the provided intents and frame delta,
    /// returning a snapshot for rendering.
    pub fn tick(&mut self, actions: Vec<PlayerAction>, delta_seconds: f64) -> Snapshot {
        {
            let mut queue = self.world.resource_mut::<ActionQueue>();
            queue.0 = actions;
        }
        {
            // Stage the delta so the simulation systems see this tick's dt
            // before the clock advances at the end of the schedule.
            let mut time = self.world.resource_mut::<GameTime>();
            time.delta_seconds = delta_seconds;
        }

        self.schedule.run(&mut self.world);
        Snapshot::capture(&self.world)
    }

    /// Consume a skip-time signal: one large-delta tick, then a settle
    /// tick so schedules that came due during the skip fire immediately.
    pub fn skip_time(&mut self, seconds: f64) -> Snapshot {
        let first = self.tick(Vec::new(), seconds.max(0.0));
        let mut settled = self.tick(Vec::new(), 0.0);
        let mut notifications = first.notifications;
        notifications.extend(settled.notifications.drain(..));
        settled.notifications = notifications;
        settled
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Extract a serializable save state from the current world.
    pub fn save_state(&self) -> SaveState {
        extract_state_from_world(&self.world, self.seed)
    }

    /// Apply a saved state back into the live world.
    pub fn load_state(&mut self, state: SaveState) {
        self.seed = state.seed;
        apply_state_to_world(state, &mut self.world);
    }

    /// Save state directly to a file path.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        save_state_to_path(&self.save_state(), path)
    }

    /// Load state directly from a file path.
    pub fn load_from_path<P: AsRef<Path>>(&mut self, path: P) -> std::io::Result<()> {
        let state = load_state_from_path(path)?;
        self.load_state(state);
        Ok(())
    }
}

fn summarize(deal: &Deal, now_seconds: f64) -> DealSummary {
    let seconds_remaining = match deal.matures_at() {
        Some(at) => (at - now_seconds).max(0.0),
        None => (deal.available_until - now_seconds).max(0.0),
    };
    DealSummary {
        id: deal.id,
        label: deal.deal_type.label().to_string(),
        faction: deal.faction.label().to_string(),
        investment: deal.investment,
        potential_profit: deal.potential_profit,
        risk_level: deal.risk_level,
        seconds_remaining,
    }
}

impl Snapshot {
    fn capture(world: &World) -> Self {
        let time = world.resource::<GameTime>();
        let city = world.resource::<CityState>();
        let wallet = world.resource::<Wallet>();
        let wanted = world.resource::<WantedState>();
        let profile = world.resource::<PlayerProfile>();
        let ledger = world.resource::<TrustLedger>();
        let market = world.resource::<MarketState>();

        let factions = Faction::ALL
            .iter()
            .map(|faction| {
                let standing = ledger.standing(*faction);
                FactionSummary {
                    faction: *faction,
                    trust: standing.trust,
                    has_access: standing.has_access,
                }
            })
            .collect();

        let available_deals = market
            .available
            .iter()
            .map(|deal| summarize(deal, time.seconds))
            .collect();
        let active_deals = market
            .active
            .iter()
            .map(|deal| summarize(deal, time.seconds))
            .collect();

        let notifications = world
            .get_resource::<NotificationLog>()
            .map(|log| log.0.clone())
            .unwrap_or_default();

        Snapshot {
            time_label: time.clock_label(),
            seconds: time.seconds,
            district: city.district_name(city.active_location).to_string(),
            balance: wallet.balance,
            wanted_level: wanted.level,
            decay_timer: wanted.decay_timer,
            is_under_arrest: wanted.is_under_arrest,
            notoriety: market.notoriety,
            criminal_reputation: profile.criminal_reputation,
            is_injured: profile.is_injured(),
            factions,
            available_deals,
            active_deals,
            notifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crime_intent_raises_the_wanted_level() {
        let mut game = Game::new(42);
        let snapshot = game.tick(
            vec![PlayerAction::CommitCrime {
                crime: CrimeType::Theft,
                severity: 1.0,
            }],
            60.0,
        );
        assert_eq!(snapshot.wanted_level, WantedLevel::Minor);
        assert!(!snapshot.notifications.is_empty());
    }

    #[test]
    fn first_tick_offers_street_deals() {
        let mut game = Game::new(42);
        let snapshot = game.tick(Vec::new(), 60.0);
        assert!(!snapshot.available_deals.is_empty());
        assert!(snapshot
            .available_deals
            .iter()
            .all(|deal| deal.faction == Faction::StreetThugs.label()));
    }

    #[test]
    fn skip_time_decays_the_wanted_level() {
        let mut game = Game::new(7);
        game.tick(
            vec![PlayerAction::CommitCrime {
                crime: CrimeType::Theft,
                severity: 1.0,
            }],
            1.0,
        );
        // Long enough for Minor and Suspicious to both cool off, plus the
        // police-arrival window having long expired.
        let snapshot = game.skip_time(4.0 * 3600.0);
        assert!(!snapshot.is_under_arrest || snapshot.wanted_level == WantedLevel::None);
    }

    #[test]
    fn travel_changes_the_district() {
        let mut game = Game::new(9);
        let snapshot = game.tick(vec![PlayerAction::TravelTo(LocationId(2))], 1.0);
        assert_eq!(snapshot.district, "Docklands");
    }
}
