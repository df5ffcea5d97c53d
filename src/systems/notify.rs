use bevy_ecs::prelude::*;

use crate::systems::market::MarketEventLog;
use crate::systems::police::PoliceEventLog;
use crate::systems::trust::TrustEventLog;
use crate::systems::wanted::WantedEventLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warn",
            Severity::Critical => "crit",
        }
    }
}

/// A UI-facing notification. Every state transition in the simulation
/// pushes one of these; the caller drains them from the tick snapshot.
#[derive(Debug, Clone)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub severity: Severity,
}

#[derive(Resource, Debug, Default)]
pub struct NotificationLog(pub Vec<Notification>);

impl NotificationLog {
    pub fn push(&mut self, title: impl Into<String>, body: impl Into<String>, severity: Severity) {
        self.0.push(Notification {
            title: title.into(),
            body: body.into(),
            severity,
        });
    }
}

/// System: clears all per-tick logs before the simulation sets run.
/// Several systems push notifications, so the clear lives here rather
/// than in any one producer.
pub fn begin_tick_system(
    mut notifications: ResMut<NotificationLog>,
    mut wanted_events: ResMut<WantedEventLog>,
    mut police_events: ResMut<PoliceEventLog>,
    mut trust_events: ResMut<TrustEventLog>,
    mut market_events: ResMut<MarketEventLog>,
) {
    notifications.0.clear();
    wanted_events.0.clear();
    police_events.0.clear();
    trust_events.0.clear();
    market_events.0.clear();
}
