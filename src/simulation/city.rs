use std::collections::HashMap;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictState {
    pub id: LocationId,
    pub name: String,
    /// Scales the police encounter rate for crimes committed here.
    pub police_multiplier: f32,
    /// Scales the risk level of deals generated while here.
    pub crime_pressure: f32,
}

/// Resource holding the district map and the player's current district.
#[derive(Resource, Debug, Clone)]
pub struct CityState {
    pub districts: HashMap<LocationId, DistrictState>,
    pub active_location: LocationId,
}

impl CityState {
    pub fn police_multiplier(&self, id: LocationId) -> f32 {
        self.districts
            .get(&id)
            .map(|d| d.police_multiplier)
            .unwrap_or(1.0)
    }

    pub fn crime_pressure(&self, id: LocationId) -> f32 {
        self.districts
            .get(&id)
            .map(|d| d.crime_pressure)
            .unwrap_or(1.0)
    }

    pub fn district_name(&self, id: LocationId) -> &str {
        self.districts
            .get(&id)
            .map(|d| d.name.as_str())
            .unwrap_or("Unknown")
    }
}

impl Default for CityState {
    fn default() -> Self {
        let mut districts = HashMap::new();

        districts.insert(
            LocationId(1),
            DistrictState {
                id: LocationId(1),
                name: "Old Town".to_string(),
                police_multiplier: 1.0,
                crime_pressure: 1.0,
            },
        );

        districts.insert(
            LocationId(2),
            DistrictState {
                id: LocationId(2),
                name: "Docklands".to_string(),
                police_multiplier: 0.6,
                crime_pressure: 1.3,
            },
        );

        districts.insert(
            LocationId(3),
            DistrictState {
                id: LocationId(3),
                name: "Financial District".to_string(),
                police_multiplier: 1.8,
                crime_pressure: 0.8,
            },
        );

        districts.insert(
            LocationId(4),
            DistrictState {
                id: LocationId(4),
                name: "The Sprawl".to_string(),
                police_multiplier: 0.8,
                crime_pressure: 1.1,
            },
        );

        CityState {
            districts,
            active_location: LocationId(1),
        }
    }
}
