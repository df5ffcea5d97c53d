use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use street_fortune::core::world::{DealSummary, Snapshot};
use street_fortune::simulation::city::LocationId;
use street_fortune::simulation::crime::CrimeType;
use street_fortune::simulation::economy::Money;
use street_fortune::world::SaveDb;
use street_fortune::{Game, PlayerAction};

const TICK_SECONDS: f64 = 60.0;

const HELP: &str = "Commands: status | deals | crime <type> [severity] | travel <1-4> | \
start <deal_id> | bribe <dollars> | negotiate | wait [n] | skip <hours> | \
save <slot> | load <slot> | slots | delete <slot> | help | quit";

fn main() {
    let (seed, db_path) = parse_args(env::args().collect());
    println!("Street Fortune (seed {})", seed);

    let mut save_db = match SaveDb::open(&db_path) {
        Ok(db) => Some(db),
        Err(err) => {
            eprintln!("Failed to open save DB at {}: {}", db_path.display(), err);
            None
        }
    };

    let mut game = Game::new(seed);
    let snapshot = game.tick(Vec::new(), TICK_SECONDS);
    print_snapshot(&snapshot);
    println!("{}", HELP);

    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            break;
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "status" => {
                let snapshot = game.tick(Vec::new(), 0.0);
                print_snapshot(&snapshot);
            }
            "deals" => {
                let snapshot = game.tick(Vec::new(), 0.0);
                print_deals(&snapshot);
            }
            "crime" => {
                let Some(crime) = parts.next().and_then(parse_crime) else {
                    println!("Usage: crime <vandalism|theft|fighting|pickpocket|drugs|robbery|smuggling|fraud|weapons> [severity]");
                    continue;
                };
                let severity = parts
                    .next()
                    .and_then(|v| v.parse::<f32>().ok())
                    .unwrap_or(1.0);
                let snapshot = game.tick(
                    vec![PlayerAction::CommitCrime { crime, severity }],
                    TICK_SECONDS,
                );
                print_notifications(&snapshot);
                print_wanted_line(&snapshot);
            }
            "travel" => {
                let Some(id) = parts.next().and_then(|v| v.parse::<u32>().ok()) else {
                    println!("Usage: travel <district_id>");
                    continue;
                };
                let snapshot =
                    game.tick(vec![PlayerAction::TravelTo(LocationId(id))], TICK_SECONDS);
                print_notifications(&snapshot);
            }
            "start" => {
                let Some(id) = parts.next().and_then(|v| v.parse::<u64>().ok()) else {
                    println!("Usage: start <deal_id>");
                    continue;
                };
                let snapshot = game.tick(vec![PlayerAction::StartDeal { id }], TICK_SECONDS);
                print_notifications(&snapshot);
            }
            "bribe" => {
                let Some(dollars) = parts.next().and_then(|v| v.parse::<i64>().ok()) else {
                    println!("Usage: bribe <dollars>");
                    continue;
                };
                let amount = Money::from_dollars(dollars);
                let snapshot = game.tick(vec![PlayerAction::AttemptBribe { amount }], TICK_SECONDS);
                print_notifications(&snapshot);
                print_wanted_line(&snapshot);
            }
            "negotiate" => {
                let snapshot = game.tick(vec![PlayerAction::Negotiate], TICK_SECONDS);
                print_notifications(&snapshot);
                print_wanted_line(&snapshot);
            }
            "wait" => {
                let count = parts
                    .next()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(1);
                let mut last = None;
                for _ in 0..count {
                    let snapshot = game.tick(vec![PlayerAction::Wait], TICK_SECONDS);
                    print_notifications(&snapshot);
                    last = Some(snapshot);
                }
                if let Some(snapshot) = last {
                    print_snapshot(&snapshot);
                }
            }
            "skip" => {
                let Some(hours) = parts.next().and_then(|v| v.parse::<f64>().ok()) else {
                    println!("Usage: skip <hours>");
                    continue;
                };
                let snapshot = game.skip_time(hours * 3600.0);
                print_notifications(&snapshot);
                print_snapshot(&snapshot);
            }
            "save" => {
                let Some(slot) = parts.next() else {
                    println!("Usage: save <slot>");
                    continue;
                };
                let Some(db) = save_db.as_mut() else {
                    println!("Save DB unavailable.");
                    continue;
                };
                match db.store_slot(slot, &game.save_state()) {
                    Ok(()) => println!("Saved to slot '{}'.", slot),
                    Err(err) => println!("Save failed: {}", err),
                }
            }
            "load" => {
                let Some(slot) = parts.next() else {
                    println!("Usage: load <slot>");
                    continue;
                };
                let Some(db) = save_db.as_ref() else {
                    println!("Save DB unavailable.");
                    continue;
                };
                match db.load_slot(slot) {
                    Ok(Some(state)) => {
                        game.load_state(state);
                        let snapshot = game.tick(Vec::new(), 0.0);
                        println!("Loaded slot '{}'.", slot);
                        print_snapshot(&snapshot);
                    }
                    Ok(None) => println!("No slot named '{}'.", slot),
                    Err(err) => println!("Load failed: {}", err),
                }
            }
            "slots" => {
                let Some(db) = save_db.as_ref() else {
                    println!("Save DB unavailable.");
                    continue;
                };
                match db.list_slots() {
                    Ok(slots) if slots.is_empty() => println!("No saves yet."),
                    Ok(slots) => {
                        for slot in slots {
                            println!(
                                "  {} | day {} | tick {}",
                                slot.name, slot.game_day, slot.game_tick
                            );
                        }
                    }
                    Err(err) => println!("Listing failed: {}", err),
                }
            }
            "delete" => {
                let Some(slot) = parts.next() else {
                    println!("Usage: delete <slot>");
                    continue;
                };
                let Some(db) = save_db.as_mut() else {
                    println!("Save DB unavailable.");
                    continue;
                };
                match db.delete_slot(slot) {
                    Ok(true) => println!("Deleted slot '{}'.", slot),
                    Ok(false) => println!("No slot named '{}'.", slot),
                    Err(err) => println!("Delete failed: {}", err),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}

fn parse_args(args: Vec<String>) -> (u64, PathBuf) {
    let mut iter = args.iter();
    let mut seed = 0x5eed;
    let mut db_path = PathBuf::from("./assets/db/saves.db");
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                if let Some(value) = iter.next() {
                    if let Ok(parsed) = value.parse::<u64>() {
                        seed = parsed;
                    }
                }
            }
            "--saves" => {
                if let Some(value) = iter.next() {
                    db_path = PathBuf::from(value);
                }
            }
            _ => {}
        }
    }
    (seed, db_path)
}

fn parse_crime(raw: &str) -> Option<CrimeType> {
    match raw.to_lowercase().as_str() {
        "vandalism" => Some(CrimeType::Vandalism),
        "theft" => Some(CrimeType::Theft),
        "fighting" | "fight" => Some(CrimeType::Fighting),
        "pickpocket" | "pickpocketing" => Some(CrimeType::Pickpocketing),
        "drugs" | "dealing" => Some(CrimeType::DrugDealing),
        "robbery" => Some(CrimeType::Robbery),
        "smuggling" => Some(CrimeType::Smuggling),
        "fraud" => Some(CrimeType::Fraud),
        "weapons" => Some(CrimeType::WeaponsDealing),
        _ => None,
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("{} | {}", snapshot.time_label, snapshot.district);
    println!(
        "Cash: {} | Wanted: {} | Notoriety: {:.1} | Reputation: {:.1}",
        snapshot.balance,
        snapshot.wanted_level.label(),
        snapshot.notoriety,
        snapshot.criminal_reputation
    );
    if snapshot.is_under_arrest {
        println!("You are in custody.");
    }
    if snapshot.is_injured {
        println!("You are injured and recovering.");
    }
    for faction in &snapshot.factions {
        println!(
            "  {} | trust {:.0} | {}",
            faction.faction.label(),
            faction.trust,
            if faction.has_access { "open" } else { "closed" }
        );
    }
    if !snapshot.active_deals.is_empty() {
        println!("Active deals:");
        for deal in &snapshot.active_deals {
            print_deal_line(deal);
        }
    }
}

fn print_deals(snapshot: &Snapshot) {
    if snapshot.available_deals.is_empty() {
        println!("No deals on offer right now.");
        return;
    }
    println!("Deals on offer:");
    for deal in &snapshot.available_deals {
        print_deal_line(deal);
    }
}

fn print_deal_line(deal: &DealSummary) {
    println!(
        "  [{}] {} ({}) | in {} -> out {} | risk {:.0}% | {:.0}m left",
        deal.id,
        deal.label,
        deal.faction,
        deal.investment,
        deal.potential_profit,
        deal.risk_level * 100.0,
        deal.seconds_remaining / 60.0
    );
}

fn print_wanted_line(snapshot: &Snapshot) {
    println!(
        "Wanted: {} | decay in {:.0}s | cash {}",
        snapshot.wanted_level.label(),
        snapshot.decay_timer,
        snapshot.balance
    );
}

fn print_notifications(snapshot: &Snapshot) {
    for note in &snapshot.notifications {
        println!("[{}] {}: {}", note.severity.label(), note.title, note.body);
    }
}
