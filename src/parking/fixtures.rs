//! Fixture data source for the results screen
//!
//! There is no backend: the results screen is always populated from a
//! pre-authored, validated set of records.

use super::model::{DirectionStep, NavigationPlan, OptionId, ParkingOption, TurnKind};
use crate::{ParkbotError, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// Supplies the ordered result set consumed when entering the results screen
pub trait FixtureSource: Send + Sync {
    /// The result set, in display order
    fn options(&self) -> Arc<Vec<ParkingOption>>;
}

/// Validated, in-memory fixture records
#[derive(Clone, Debug)]
pub struct StaticFixtures {
    options: Arc<Vec<ParkingOption>>,
}

impl StaticFixtures {
    /// Validate and wrap a set of records
    ///
    /// Fails if any record breaks its invariants or two records share an id.
    pub fn new(options: Vec<ParkingOption>) -> Result<Self> {
        let mut seen: HashSet<OptionId> = HashSet::new();
        for option in &options {
            option.validate()?;
            if !seen.insert(option.id) {
                return Err(ParkbotError::FixtureError(format!(
                    "duplicate option id {}",
                    option.id
                )));
            }
        }

        Ok(Self {
            options: Arc::new(options),
        })
    }

    /// The built-in Midtown Atlanta result set
    pub fn midtown() -> Self {
        Self {
            options: Arc::new(midtown_options()),
        }
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl Default for StaticFixtures {
    fn default() -> Self {
        Self::midtown()
    }
}

impl FixtureSource for StaticFixtures {
    fn options(&self) -> Arc<Vec<ParkingOption>> {
        Arc::clone(&self.options)
    }
}

fn step(instruction: &str, distance: &str, turn: TurnKind) -> DirectionStep {
    DirectionStep::new(instruction, distance, turn)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn midtown_options() -> Vec<ParkingOption> {
    vec![
        ParkingOption {
            id: 1,
            name: "Technology Square Deck".into(),
            address: "75 5th St NW, Atlanta, GA 30308".into(),
            walk_time: "3 min walk".into(),
            cost: "$12 flat".into(),
            available_spots: 42,
            total_spots: 320,
            score: 95,
            recommended: true,
            insights: strings(&["Closest to ATDC", "Covered parking", "Easy exit to Spring St"]),
            warning: None,
            navigation: NavigationPlan {
                distance: "0.8 mi".into(),
                eta: "4 min".into(),
                directions: vec![
                    step("Head north on Spring St NW", "0.3 mi", TurnKind::Straight),
                    step("Turn left onto 5th St NW", "0.2 mi", TurnKind::Left),
                    step("Turn right onto W Peachtree St NW", "0.2 mi", TurnKind::Right),
                    step("Arrive at Technology Square Deck", "Entrance on right", TurnKind::Destination),
                ],
            },
        },
        ParkingOption {
            id: 2,
            name: "Centergy One Garage".into(),
            address: "75 5th St NW Rear, Atlanta, GA 30308".into(),
            walk_time: "5 min walk".into(),
            cost: "$8/hr".into(),
            available_spots: 18,
            total_spots: 200,
            score: 88,
            recommended: false,
            insights: strings(&["Well lit", "Security on site"]),
            warning: None,
            navigation: NavigationPlan {
                distance: "1.0 mi".into(),
                eta: "5 min".into(),
                directions: vec![
                    step("Head north on Spring St NW", "0.5 mi", TurnKind::Straight),
                    step("Turn left onto 6th St NW", "0.4 mi", TurnKind::Left),
                    step("Arrive at Centergy One Garage", "Entrance on left", TurnKind::Destination),
                ],
            },
        },
        ParkingOption {
            id: 3,
            name: "North Avenue Visitor Deck".into(),
            address: "120 North Ave NW, Atlanta, GA 30313".into(),
            walk_time: "12 min walk".into(),
            cost: "$20 event rate".into(),
            available_spots: 120,
            total_spots: 800,
            score: 81,
            recommended: false,
            insights: strings(&["Plenty of spots", "EV charging"]),
            warning: Some("Heavy game traffic after 6pm".into()),
            navigation: NavigationPlan {
                distance: "1.4 mi".into(),
                eta: "8 min".into(),
                directions: vec![
                    step("Head south on Spring St NW", "0.6 mi", TurnKind::Straight),
                    step("Turn right onto North Ave NW", "0.5 mi", TurnKind::Right),
                    step("Continue past Bobby Dodd Way", "0.2 mi", TurnKind::Straight),
                    step("Turn left into the visitor entrance", "0.1 mi", TurnKind::Left),
                    step("Arrive at North Avenue Visitor Deck", "Level 2 visitor parking", TurnKind::Destination),
                ],
            },
        },
        ParkingOption {
            id: 4,
            name: "West Peachtree Street Meters".into(),
            address: "W Peachtree St NW & 5th St NW, Atlanta, GA 30308".into(),
            walk_time: "4 min walk".into(),
            cost: "$2.50/hr".into(),
            available_spots: 6,
            total_spots: 24,
            score: 74,
            recommended: false,
            insights: strings(&["Cheapest option"]),
            warning: Some("2-hour limit".into()),
            navigation: NavigationPlan {
                distance: "0.6 mi".into(),
                eta: "3 min".into(),
                directions: vec![
                    step("Head north on W Peachtree St NW", "0.5 mi", TurnKind::Straight),
                    step("Arrive at the metered block", "Both sides of street", TurnKind::Destination),
                ],
            },
        },
        ParkingOption {
            id: 5,
            name: "Biltmore Surface Lot".into(),
            address: "817 W Peachtree St NW, Atlanta, GA 30308".into(),
            walk_time: "7 min walk".into(),
            cost: "$15 flat".into(),
            available_spots: 0,
            total_spots: 60,
            score: 62,
            recommended: false,
            insights: strings(&["Open late"]),
            warning: Some("Fills early on game days".into()),
            navigation: NavigationPlan {
                distance: "0.9 mi".into(),
                eta: "5 min".into(),
                directions: vec![
                    step("Head north on W Peachtree St NW", "0.7 mi", TurnKind::Straight),
                    step("Turn right onto 6th St NE", "0.1 mi", TurnKind::Right),
                    step("Arrive at Biltmore Surface Lot", "Lot entrance on left", TurnKind::Destination),
                ],
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midtown_fixtures_are_valid() {
        let options = midtown_options();
        assert!(StaticFixtures::new(options).is_ok());
    }

    #[test]
    fn test_midtown_has_five_options_in_order() {
        let fixtures = StaticFixtures::midtown();
        let options = fixtures.options();
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].id, 1);
        assert_eq!(options[0].name, "Technology Square Deck");
        assert_eq!(options[0].navigation.len(), 4);
        assert!(options.iter().filter(|o| o.recommended).count() == 1);
    }

    #[test]
    fn test_every_plan_ends_at_destination() {
        for option in StaticFixtures::midtown().options().iter() {
            let last = option.navigation.destination().unwrap();
            assert_eq!(last.turn, TurnKind::Destination, "option {}", option.id);
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut options = midtown_options();
        options[1].id = options[0].id;
        let err = StaticFixtures::new(options).unwrap_err();
        assert!(matches!(err, ParkbotError::FixtureError(_)));
    }

    #[test]
    fn test_options_share_allocation() {
        let fixtures = StaticFixtures::midtown();
        let a = fixtures.options();
        let b = fixtures.options();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
