use std::fmt;

use bevy_ecs::prelude::*;
use bevy_utils::tracing::debug;
use serde::{Deserialize, Serialize};

/// Cents-backed money value. All arithmetic saturates so balances never wrap.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Money {
    cents: i64,
}

impl Money {
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    pub fn from_dollars(dollars: i64) -> Self {
        Self {
            cents: dollars.saturating_mul(100),
        }
    }

    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn as_cents(self) -> i64 {
        self.cents
    }

    pub fn add(self, other: Money) -> Self {
        Self {
            cents: self.cents.saturating_add(other.cents),
        }
    }

    pub fn sub(self, other: Money) -> Self {
        Self {
            cents: self.cents.saturating_sub(other.cents),
        }
    }

    pub fn scale(self, factor: f64) -> Self {
        let scaled = (self.cents as f64 * factor).round() as i64;
        Self { cents: scaled }
    }

    pub fn is_positive(self) -> bool {
        self.cents > 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.cents / 100;
        let cents = (self.cents.abs() % 100) as i64;
        let sign = if self.cents < 0 { "-" } else { "" };
        let formatted = format_dollars(dollars.abs());
        write!(f, "{}${}.{:02}", sign, formatted, cents)
    }
}

/// Resource implementing the economy contract for the player.
///
/// Reasons are observability only; they never change behavior.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Money,
}

impl Default for Wallet {
    fn default() -> Self {
        Self {
            balance: Money::from_dollars(250),
        }
    }
}

impl Wallet {
    pub fn can_afford(&self, amount: Money) -> bool {
        self.balance >= amount
    }

    /// Debit the wallet. Returns false (and moves no money) on insufficient funds.
    pub fn spend(&mut self, amount: Money, reason: &str) -> bool {
        if !self.can_afford(amount) {
            debug!(%amount, reason, "spend rejected: insufficient funds");
            return false;
        }
        self.balance = self.balance.sub(amount);
        debug!(%amount, reason, balance = %self.balance, "spend");
        true
    }

    pub fn add(&mut self, amount: Money, reason: &str) {
        self.balance = self.balance.add(amount);
        debug!(%amount, reason, balance = %self.balance, "credit");
    }
}

fn format_dollars(mut value: i64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut parts = Vec::new();
    while value > 0 {
        parts.push(format!("{:03}", value % 1000));
        value /= 1000;
    }
    if let Some(last) = parts.last_mut() {
        *last = last.trim_start_matches('0').to_string();
        if last.is_empty() {
            *last = "0".to_string();
        }
    }
    parts.reverse();
    parts.join(",")
}
