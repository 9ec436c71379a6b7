//! User parking preferences
//!
//! Carried in every snapshot. They do not filter fixture results.

use crate::{ParkbotError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const MAX_COST_RANGE: RangeInclusive<u32> = 0..=50;
pub const MAX_WALKING_RANGE: RangeInclusive<u32> = 1..=30;
pub const MIN_AVAILABILITY_RANGE: RangeInclusive<u32> = 1..=50;
pub const MAX_WAIT_RANGE: RangeInclusive<u32> = 0..=30;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTolerance {
    /// Stick to budget strictly
    Low,
    /// Some flexibility
    #[default]
    Medium,
    /// Cost is not a major factor
    High,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingPreferences {
    // Cost
    pub max_cost: u32,
    pub prefer_free: bool,
    pub cost_tolerance: CostTolerance,

    // Distance, in minutes of walking
    pub max_walking_minutes: u32,
    pub prefer_closer: bool,

    // Coverage
    pub prefer_covered: bool,
    pub require_covered: bool,

    // Availability
    pub min_availability: u32,
    pub avoid_full: bool,
    pub max_wait_minutes: u32,
    pub prefer_quick_exit: bool,

    // Safety
    pub prefer_well_lit: bool,
    pub prefer_security: bool,

    // Accessibility
    pub require_accessible: bool,
    pub require_ev_charging: bool,

    // Events
    pub avoid_event_traffic: bool,
    pub prefer_event_parking: bool,

    // Advanced
    pub prioritize_score: bool,
    pub avoid_construction: bool,
    pub prefer_reserved: bool,
}

impl Default for ParkingPreferences {
    fn default() -> Self {
        Self {
            max_cost: 15,
            prefer_free: false,
            cost_tolerance: CostTolerance::Medium,
            max_walking_minutes: 10,
            prefer_closer: true,
            prefer_covered: false,
            require_covered: false,
            min_availability: 5,
            avoid_full: true,
            max_wait_minutes: 5,
            prefer_quick_exit: false,
            prefer_well_lit: false,
            prefer_security: false,
            require_accessible: false,
            require_ev_charging: false,
            avoid_event_traffic: true,
            prefer_event_parking: false,
            prioritize_score: true,
            avoid_construction: true,
            prefer_reserved: false,
        }
    }
}

impl ParkingPreferences {
    /// Check every numeric preference against its slider range
    pub fn validate(&self) -> Result<()> {
        check_range("max_cost", self.max_cost, &MAX_COST_RANGE)?;
        check_range("max_walking_minutes", self.max_walking_minutes, &MAX_WALKING_RANGE)?;
        check_range("min_availability", self.min_availability, &MIN_AVAILABILITY_RANGE)?;
        check_range("max_wait_minutes", self.max_wait_minutes, &MAX_WAIT_RANGE)?;
        Ok(())
    }
}

fn check_range(name: &str, value: u32, range: &RangeInclusive<u32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ParkbotError::ConfigError(format!(
            "{} = {} is outside {}..={}",
            name,
            value,
            range.start(),
            range.end()
        )))
    }
}
