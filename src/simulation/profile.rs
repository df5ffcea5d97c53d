use std::collections::HashMap;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillId {
    Streetwise,
    Negotiation,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SkillTrack {
    pub level: f32,
    pub experience: f32,
}

/// Resource holding the player's skills, criminal reputation, and injuries.
///
/// Implements the skill contract consumed by the police and market systems
/// and receives the side effects of resolved deals.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub skills: HashMap<SkillId, SkillTrack>,
    /// Criminal reputation track, grows with successful deals.
    pub criminal_reputation: f32,
    /// Remaining injury recovery time in seconds; zero when healthy.
    pub injury_seconds: f64,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        let mut skills = HashMap::new();
        skills.insert(SkillId::Streetwise, SkillTrack::default());
        skills.insert(SkillId::Negotiation, SkillTrack::default());
        Self {
            skills,
            criminal_reputation: 0.0,
            injury_seconds: 0.0,
        }
    }
}

impl PlayerProfile {
    pub fn skill_level(&self, skill: SkillId) -> f32 {
        self.skills.get(&skill).map(|t| t.level).unwrap_or(0.0)
    }

    /// Grant experience; every 100 points raises the level by one.
    pub fn grant_experience(&mut self, skill: SkillId, amount: f32) {
        let track = self.skills.entry(skill).or_default();
        track.experience += amount.max(0.0);
        while track.experience >= 100.0 {
            track.experience -= 100.0;
            track.level += 1.0;
        }
    }

    pub fn adjust_reputation(&mut self, delta: f32) {
        self.criminal_reputation = (self.criminal_reputation + delta).max(0.0);
    }

    pub fn injure(&mut self, seconds: f64) {
        self.injury_seconds = self.injury_seconds.max(seconds);
    }

    pub fn is_injured(&self) -> bool {
        self.injury_seconds > 0.0
    }

    pub fn tick_recovery(&mut self, delta_seconds: f64) {
        if self.injury_seconds > 0.0 {
            self.injury_seconds = (self.injury_seconds - delta_seconds).max(0.0);
        }
    }
}

/// System: injuries heal with time.
pub fn injury_recovery_system(
    mut profile: ResMut<PlayerProfile>,
    time: Res<crate::simulation::time::GameTime>,
) {
    profile.tick_recovery(time.delta_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_rolls_into_levels() {
        let mut profile = PlayerProfile::default();
        profile.grant_experience(SkillId::Streetwise, 250.0);
        assert_eq!(profile.skill_level(SkillId::Streetwise), 2.0);
        let track = profile.skills[&SkillId::Streetwise];
        assert!((track.experience - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn injury_recovers_to_zero() {
        let mut profile = PlayerProfile::default();
        profile.injure(100.0);
        profile.tick_recovery(40.0);
        assert!(profile.is_injured());
        profile.tick_recovery(100.0);
        assert!(!profile.is_injured());
        assert_eq!(profile.injury_seconds, 0.0);
    }
}
