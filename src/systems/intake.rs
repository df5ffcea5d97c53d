use bevy_ecs::prelude::*;

use crate::core::rng::RiskDice;
use crate::core::world::{ActionQueue, PlayerAction};
use crate::data::crimes::{CrimeCatalog, PoliceConfig};
use crate::data::factions::UnderworldCatalog;
use crate::simulation::city::CityState;
use crate::simulation::crime::WantedState;
use crate::simulation::economy::Wallet;
use crate::simulation::market::MarketState;
use crate::simulation::profile::PlayerProfile;
use crate::simulation::time::GameTime;
use crate::simulation::underworld::TrustLedger;
use crate::systems::market::start_deal;
use crate::systems::notify::{NotificationLog, Severity};
use crate::systems::police::{attempt_bribe, attempt_negotiation, PoliceEventLog};
use crate::systems::wanted::{report_crime, WantedEventLog};

/// System: drains the queued player actions for this tick and dispatches
/// them into the subsystems. While under arrest everything except waiting
/// is rejected without mutation.
#[allow(clippy::too_many_arguments)]
pub fn intake_system(
    mut queue: ResMut<ActionQueue>,
    mut wanted: ResMut<WantedState>,
    mut market: ResMut<MarketState>,
    ledger: Res<TrustLedger>,
    mut wallet: ResMut<Wallet>,
    profile: Res<PlayerProfile>,
    mut city: ResMut<CityState>,
    crimes: Res<CrimeCatalog>,
    police: Res<PoliceConfig>,
    catalog: Res<UnderworldCatalog>,
    time: Res<GameTime>,
    mut dice: ResMut<RiskDice>,
    mut notices: ResMut<NotificationLog>,
    mut wanted_events: ResMut<WantedEventLog>,
    mut police_events: ResMut<PoliceEventLog>,
    mut market_events: ResMut<crate::systems::market::MarketEventLog>,
) {
    let actions = std::mem::take(&mut queue.0);
    for action in actions {
        if wanted.is_under_arrest && !matches!(action, PlayerAction::Wait) {
            notices.push(
                "In custody",
                "You cannot do that from a cell.",
                Severity::Info,
            );
            continue;
        }

        match action {
            PlayerAction::CommitCrime { crime, severity } => {
                let location = city.active_location;
                report_crime(
                    &mut wanted,
                    &crimes,
                    &police,
                    crime,
                    severity,
                    location,
                    time.seconds,
                    &mut notices,
                    &mut wanted_events,
                );
            }
            PlayerAction::TravelTo(location) => {
                if city.districts.contains_key(&location) {
                    city.active_location = location;
                    notices.push(
                        "On the move",
                        format!("You head to {}.", city.district_name(location)),
                        Severity::Info,
                    );
                } else {
                    notices.push("Lost", "No such district.", Severity::Info);
                }
            }
            PlayerAction::AttemptBribe { amount } => {
                attempt_bribe(
                    &mut wanted,
                    &crimes,
                    &police,
                    &mut wallet,
                    &profile,
                    &mut dice,
                    amount,
                    time.seconds,
                    &mut notices,
                    &mut wanted_events,
                    &mut police_events,
                );
            }
            PlayerAction::Negotiate => {
                attempt_negotiation(
                    &mut wanted,
                    &police,
                    &profile,
                    &mut dice,
                    &mut notices,
                    &mut police_events,
                );
            }
            PlayerAction::StartDeal { id } => {
                if let Err(err) = start_deal(
                    &mut market,
                    &ledger,
                    &mut wallet,
                    &profile,
                    &catalog,
                    id,
                    time.seconds,
                    &mut notices,
                    &mut market_events,
                ) {
                    notices.push("Deal refused", err.to_string(), Severity::Info);
                }
            }
            PlayerAction::Wait => {}
        }
    }
}
