use bevy_ecs::prelude::*;

use crate::data::crimes::{CrimeCatalog, PoliceConfig};
use crate::simulation::city::LocationId;
use crate::simulation::crime::{CrimeRecord, CrimeType, WantedLevel, WantedState};
use crate::simulation::time::GameTime;
use crate::systems::notify::{NotificationLog, Severity};

#[derive(Resource, Debug, Default)]
pub struct WantedEventLog(pub Vec<WantedEvent>);

#[derive(Debug, Clone)]
pub enum WantedEvent {
    CrimeReported { crime: CrimeType, severity: f32 },
    LevelChanged { from: WantedLevel, to: WantedLevel },
    PoliceCalled { arrival_at: f64 },
    Arrested { release_at: f64 },
    Released,
    Cleared,
}

/// Append a crime record and escalate the wanted level by
/// `ceil(weight * severity)` steps, clamped to the top of the ladder.
///
/// Every noticed crime resets the decay timer; the first crime of an
/// unresolved wanted period also schedules the police-called arrival.
pub fn report_crime(
    wanted: &mut WantedState,
    crimes: &CrimeCatalog,
    police: &PoliceConfig,
    crime: CrimeType,
    severity: f32,
    location: LocationId,
    now_seconds: f64,
    notices: &mut NotificationLog,
    events: &mut WantedEventLog,
) {
    let severity = severity.clamp(0.0, 1.0);
    wanted.crime_history.push(CrimeRecord {
        crime,
        timestamp: now_seconds,
        location,
        severity,
        resolved: false,
    });
    wanted.last_crime_time = now_seconds;
    events.0.push(WantedEvent::CrimeReported { crime, severity });

    let increase = crimes.wanted_weight(crime) * severity;
    let steps = increase.ceil() as i32;

    let from = wanted.level;
    let to = if steps > 0 {
        WantedLevel::from_index(from.index() + steps)
    } else {
        from
    };
    wanted.level = to;
    // Even a report too small to escalate restarts the countdown.
    wanted.decay_timer = crimes.decay_duration(to);

    if to > from {
        events.0.push(WantedEvent::LevelChanged { from, to });
        notices.push(
            "Wanted level rising",
            format!("The police now consider you: {}", to.label()),
            Severity::Warning,
        );
    }

    if !wanted.police_called && wanted.is_wanted() {
        wanted.police_called = true;
        let arrival_at = now_seconds + police.police_call_delay;
        wanted.police_arrival_at = Some(arrival_at);
        events.0.push(WantedEvent::PoliceCalled { arrival_at });
        notices.push(
            "Someone called the police",
            "A patrol is on its way to your location.",
            Severity::Warning,
        );
    }
}

/// Reset to a clean slate and cancel every pending schedule. Unresolved
/// crime records are annotated as resolved.
pub fn clear_wanted_level(
    wanted: &mut WantedState,
    notices: &mut NotificationLog,
    events: &mut WantedEventLog,
) {
    let was_wanted = wanted.is_wanted() || wanted.is_under_arrest;
    wanted.level = WantedLevel::None;
    wanted.decay_timer = 0.0;
    wanted.police_called = false;
    wanted.police_arrival_at = None;
    wanted.jail_release_at = None;
    wanted.is_under_arrest = false;
    for record in wanted.crime_history.iter_mut() {
        record.resolved = true;
    }
    events.0.push(WantedEvent::Cleared);
    if was_wanted {
        notices.push(
            "Heat is off",
            "The police are no longer looking for you.",
            Severity::Info,
        );
    }
}

/// Put the player in jail until `now + jail_seconds`. While under arrest no
/// encounters resolve and the decay timer is frozen.
pub fn arrest_player(
    wanted: &mut WantedState,
    jail_seconds: f64,
    now_seconds: f64,
    notices: &mut NotificationLog,
    events: &mut WantedEventLog,
) {
    let release_at = now_seconds + jail_seconds;
    wanted.is_under_arrest = true;
    wanted.jail_release_at = Some(release_at);
    wanted.police_arrival_at = None;
    events.0.push(WantedEvent::Arrested { release_at });
    notices.push(
        "Arrested",
        format!("You are in custody for {:.0} seconds.", jail_seconds),
        Severity::Critical,
    );
}

/// Per-tick update: serve out jail time, or run the decay countdown.
///
/// The countdown loops with carry so a large time skip steps the level
/// down once per accumulated decay duration, exactly as if ticked live.
pub fn tick_wanted(
    wanted: &mut WantedState,
    crimes: &CrimeCatalog,
    now_seconds: f64,
    delta_seconds: f64,
    notices: &mut NotificationLog,
    events: &mut WantedEventLog,
) {
    if wanted.is_under_arrest {
        // Checking an already-fired or missing schedule is a no-op.
        if let Some(release_at) = wanted.jail_release_at {
            if now_seconds >= release_at {
                events.0.push(WantedEvent::Released);
                notices.push(
                    "Released from jail",
                    "You have served your time.",
                    Severity::Info,
                );
                clear_wanted_level(wanted, notices, events);
            }
        }
        return;
    }

    if !wanted.is_wanted() {
        return;
    }

    wanted.decay_timer -= delta_seconds;
    while wanted.decay_timer <= 0.0 && wanted.is_wanted() {
        let leftover = -wanted.decay_timer;
        let from = wanted.level;
        let to = WantedLevel::from_index(from.index() - 1);
        wanted.level = to;
        events.0.push(WantedEvent::LevelChanged { from, to });
        if to == WantedLevel::None {
            wanted.decay_timer = 0.0;
            wanted.police_called = false;
            wanted.police_arrival_at = None;
            notices.push(
                "Heat is off",
                "The police have lost interest in you.",
                Severity::Info,
            );
        } else {
            wanted.decay_timer = crimes.decay_duration(to) - leftover;
            notices.push(
                "Wanted level dropping",
                format!("The police now consider you: {}", to.label()),
                Severity::Info,
            );
        }
    }
}

/// System: wanted decay and jail-release bookkeeping.
pub fn wanted_decay_system(
    mut wanted: ResMut<WantedState>,
    crimes: Res<CrimeCatalog>,
    time: Res<GameTime>,
    mut notices: ResMut<NotificationLog>,
    mut events: ResMut<WantedEventLog>,
) {
    tick_wanted(
        &mut wanted,
        &crimes,
        time.seconds,
        time.delta_seconds,
        &mut notices,
        &mut events,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (WantedState, CrimeCatalog, PoliceConfig, NotificationLog, WantedEventLog) {
        (
            WantedState::default(),
            CrimeCatalog::default(),
            PoliceConfig::default(),
            NotificationLog::default(),
            WantedEventLog::default(),
        )
    }

    #[test]
    fn level_never_leaves_the_ladder() {
        let (mut wanted, crimes, police, mut notices, mut events) = fixtures();
        for _ in 0..50 {
            report_crime(
                &mut wanted, &crimes, &police, CrimeType::Robbery, 1.0,
                LocationId(1), 0.0, &mut notices, &mut events,
            );
        }
        assert_eq!(wanted.level, WantedLevel::MostWanted);
        assert_eq!(wanted.crime_history.len(), 50);
    }

    #[test]
    fn theft_then_fighting_scenario() {
        // Theft weight 2.0 at severity 1.0 jumps two steps; Fighting
        // weight 1.0 at severity 0.5 rounds up to one more.
        let (mut wanted, crimes, police, mut notices, mut events) = fixtures();
        report_crime(
            &mut wanted, &crimes, &police, CrimeType::Theft, 1.0,
            LocationId(1), 0.0, &mut notices, &mut events,
        );
        assert_eq!(wanted.level, WantedLevel::Minor);
        report_crime(
            &mut wanted, &crimes, &police, CrimeType::Fighting, 0.5,
            LocationId(1), 1.0, &mut notices, &mut events,
        );
        assert_eq!(wanted.level, WantedLevel::Moderate);

        // Waiting out the Moderate decay duration drops exactly one step.
        let duration = crimes.decay_duration(WantedLevel::Moderate);
        tick_wanted(&mut wanted, &crimes, 1.0 + duration, duration, &mut notices, &mut events);
        assert_eq!(wanted.level, WantedLevel::Minor);
    }

    #[test]
    fn zero_step_report_still_resets_the_decay_timer() {
        let (mut wanted, crimes, police, mut notices, mut events) = fixtures();
        report_crime(
            &mut wanted, &crimes, &police, CrimeType::Theft, 1.0,
            LocationId(1), 0.0, &mut notices, &mut events,
        );
        assert_eq!(wanted.level, WantedLevel::Minor);

        tick_wanted(&mut wanted, &crimes, 50.0, 50.0, &mut notices, &mut events);
        let full = crimes.decay_duration(WantedLevel::Minor);
        assert!(wanted.decay_timer < full);

        // Severity 0.0 rounds to zero steps but is still a noticed crime.
        report_crime(
            &mut wanted, &crimes, &police, CrimeType::Vandalism, 0.0,
            LocationId(1), 50.0, &mut notices, &mut events,
        );
        assert_eq!(wanted.level, WantedLevel::Minor);
        assert_eq!(wanted.decay_timer, full);
        assert_eq!(wanted.crime_history.len(), 2);
    }

    #[test]
    fn decay_steps_down_to_none() {
        let (mut wanted, crimes, police, mut notices, mut events) = fixtures();
        report_crime(
            &mut wanted, &crimes, &police, CrimeType::Theft, 1.0,
            LocationId(1), 0.0, &mut notices, &mut events,
        );
        assert_eq!(wanted.level, WantedLevel::Minor);

        let mut now = 0.0;
        for _ in 0..200 {
            tick_wanted(&mut wanted, &crimes, now, 60.0, &mut notices, &mut events);
            now += 60.0;
            if !wanted.is_wanted() {
                break;
            }
        }
        assert_eq!(wanted.level, WantedLevel::None);
        assert_eq!(wanted.decay_timer, 0.0);
        assert!(!wanted.police_called);
    }

    #[test]
    fn large_skip_decays_multiple_steps_with_carry() {
        let (mut wanted, crimes, police, mut notices, mut events) = fixtures();
        report_crime(
            &mut wanted, &crimes, &police, CrimeType::Robbery, 1.0,
            LocationId(1), 0.0, &mut notices, &mut events,
        );
        assert_eq!(wanted.level, WantedLevel::Moderate);

        let total = crimes.decay_duration(WantedLevel::Moderate)
            + crimes.decay_duration(WantedLevel::Minor);
        tick_wanted(&mut wanted, &crimes, total, total, &mut notices, &mut events);
        assert_eq!(wanted.level, WantedLevel::Suspicious);
    }

    #[test]
    fn decay_is_frozen_while_under_arrest() {
        let (mut wanted, crimes, police, mut notices, mut events) = fixtures();
        report_crime(
            &mut wanted, &crimes, &police, CrimeType::Theft, 1.0,
            LocationId(1), 0.0, &mut notices, &mut events,
        );
        arrest_player(&mut wanted, 300.0, 0.0, &mut notices, &mut events);

        tick_wanted(&mut wanted, &crimes, 100.0, 100.0, &mut notices, &mut events);
        assert_eq!(wanted.level, WantedLevel::Minor);
        assert!(wanted.is_under_arrest);

        // Release fires once the schedule elapses and clears everything.
        tick_wanted(&mut wanted, &crimes, 301.0, 201.0, &mut notices, &mut events);
        assert!(!wanted.is_under_arrest);
        assert_eq!(wanted.level, WantedLevel::None);
        assert!(wanted.jail_release_at.is_none());
        assert!(wanted.crime_history.iter().all(|c| c.resolved));
    }

    #[test]
    fn police_called_once_per_wanted_period() {
        let (mut wanted, crimes, police, mut notices, mut events) = fixtures();
        report_crime(
            &mut wanted, &crimes, &police, CrimeType::Theft, 1.0,
            LocationId(1), 0.0, &mut notices, &mut events,
        );
        let first_arrival = wanted.police_arrival_at;
        assert!(first_arrival.is_some());

        report_crime(
            &mut wanted, &crimes, &police, CrimeType::Theft, 1.0,
            LocationId(1), 5.0, &mut notices, &mut events,
        );
        assert_eq!(wanted.police_arrival_at, first_arrival);

        clear_wanted_level(&mut wanted, &mut notices, &mut events);
        assert!(wanted.police_arrival_at.is_none());
        assert!(!wanted.police_called);
    }
}
