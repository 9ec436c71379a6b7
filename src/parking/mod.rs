//! Parking domain records and the fixture source that supplies them

pub mod fixtures;
pub mod model;

pub use fixtures::{FixtureSource, StaticFixtures};
pub use model::{DirectionStep, NavigationPlan, OptionId, ParkingOption, ScoreBand, TurnKind};
