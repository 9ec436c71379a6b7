//! Parking option records
//!
//! These are immutable fixture records. Everything here is read-only once
//! loaded; the session only ever holds them behind an `Arc`.

use crate::{ParkbotError, Result};
use serde::{Deserialize, Serialize};

/// Identifier of a parking option within a result set
pub type OptionId = u32;

/// Kind of manoeuvre for a direction step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Straight,
    Left,
    Right,
    /// Final step of every navigation plan
    Destination,
}

impl TurnKind {
    /// Symbol shown next to the instruction in the turn list
    pub fn symbol(&self) -> &'static str {
        match self {
            TurnKind::Straight => "⬆️",
            TurnKind::Left => "⬅️",
            TurnKind::Right => "➡️",
            TurnKind::Destination => "🅿️",
        }
    }

    pub fn is_destination(&self) -> bool {
        matches!(self, TurnKind::Destination)
    }
}

impl std::fmt::Display for TurnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnKind::Straight => write!(f, "straight"),
            TurnKind::Left => write!(f, "left"),
            TurnKind::Right => write!(f, "right"),
            TurnKind::Destination => write!(f, "destination"),
        }
    }
}

/// One instruction in a turn-by-turn plan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionStep {
    pub instruction: String,
    pub distance: String,
    pub turn: TurnKind,
}

impl DirectionStep {
    pub fn new(instruction: impl Into<String>, distance: impl Into<String>, turn: TurnKind) -> Self {
        Self {
            instruction: instruction.into(),
            distance: distance.into(),
            turn,
        }
    }
}

/// Route to a parking facility
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationPlan {
    /// Total distance label, e.g. "0.8 mi"
    pub distance: String,
    /// ETA label, e.g. "4 min"
    pub eta: String,
    /// Ordered steps; never empty, last step is always a destination
    pub directions: Vec<DirectionStep>,
}

impl NavigationPlan {
    /// Number of steps in the plan
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    /// Step at the given cursor position
    pub fn step(&self, index: usize) -> Option<&DirectionStep> {
        self.directions.get(index)
    }

    /// The final (destination) step
    pub fn destination(&self) -> Option<&DirectionStep> {
        self.directions.last()
    }

    /// Check the plan invariants
    pub fn validate(&self) -> Result<()> {
        let last = self
            .directions
            .last()
            .ok_or_else(|| ParkbotError::FixtureError("navigation plan has no steps".into()))?;

        if !last.turn.is_destination() {
            return Err(ParkbotError::FixtureError(format!(
                "last navigation step must be a destination, found '{}'",
                last.turn
            )));
        }

        Ok(())
    }
}

/// Coarse rating used to colour the score badge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// 90 and above
    Excellent,
    /// 70 to 89
    Good,
    /// Below 70
    Poor,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        if score >= 90 {
            ScoreBand::Excellent
        } else if score >= 70 {
            ScoreBand::Good
        } else {
            ScoreBand::Poor
        }
    }
}

/// A parking facility offered on the results screen
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingOption {
    pub id: OptionId,
    pub name: String,
    pub address: String,
    pub walk_time: String,
    pub cost: String,
    pub available_spots: u32,
    pub total_spots: u32,
    /// 0-100
    pub score: u8,
    pub recommended: bool,
    pub insights: Vec<String>,
    pub warning: Option<String>,
    pub navigation: NavigationPlan,
}

impl ParkingOption {
    pub fn is_sold_out(&self) -> bool {
        self.available_spots == 0
    }

    /// Availability text shown on the card
    pub fn availability_label(&self) -> String {
        if self.is_sold_out() {
            "SOLD OUT".to_string()
        } else {
            format!("{} spots", self.available_spots)
        }
    }

    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::for_score(self.score)
    }

    /// Check the record invariants
    pub fn validate(&self) -> Result<()> {
        if self.score > 100 {
            return Err(ParkbotError::FixtureError(format!(
                "option {} has score {} outside 0..=100",
                self.id, self.score
            )));
        }

        if self.available_spots > self.total_spots {
            return Err(ParkbotError::FixtureError(format!(
                "option {} has {} available of {} total spots",
                self.id, self.available_spots, self.total_spots
            )));
        }

        self.navigation
            .validate()
            .map_err(|e| ParkbotError::FixtureError(format!("option {}: {}", self.id, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(turns: &[TurnKind]) -> NavigationPlan {
        NavigationPlan {
            distance: "0.5 mi".into(),
            eta: "3 min".into(),
            directions: turns
                .iter()
                .map(|turn| DirectionStep::new("Go", "0.1 mi", *turn))
                .collect(),
        }
    }

    fn option(available: u32, total: u32, score: u8) -> ParkingOption {
        ParkingOption {
            id: 7,
            name: "Test Deck".into(),
            address: "1 Test St".into(),
            walk_time: "2 min walk".into(),
            cost: "$5/hr".into(),
            available_spots: available,
            total_spots: total,
            score,
            recommended: false,
            insights: vec![],
            warning: None,
            navigation: plan(&[TurnKind::Straight, TurnKind::Destination]),
        }
    }

    #[test]
    fn test_plan_requires_destination_last() {
        assert!(plan(&[TurnKind::Left, TurnKind::Destination]).validate().is_ok());
        assert!(plan(&[TurnKind::Destination, TurnKind::Left]).validate().is_err());
        assert!(plan(&[]).validate().is_err());
    }

    #[test]
    fn test_turn_symbols() {
        assert_eq!(TurnKind::Straight.symbol(), "⬆️");
        assert_eq!(TurnKind::Left.symbol(), "⬅️");
        assert_eq!(TurnKind::Right.symbol(), "➡️");
        assert_eq!(TurnKind::Destination.symbol(), "🅿️");
    }

    #[test]
    fn test_plan_step_lookup() {
        let plan = plan(&[TurnKind::Right, TurnKind::Destination]);
        assert_eq!(plan.step(0).map(|s| s.turn), Some(TurnKind::Right));
        assert_eq!(plan.step(1).map(|s| s.turn), Some(TurnKind::Destination));
        assert!(plan.step(2).is_none());
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::for_score(100), ScoreBand::Excellent);
        assert_eq!(ScoreBand::for_score(90), ScoreBand::Excellent);
        assert_eq!(ScoreBand::for_score(89), ScoreBand::Good);
        assert_eq!(ScoreBand::for_score(70), ScoreBand::Good);
        assert_eq!(ScoreBand::for_score(69), ScoreBand::Poor);
        assert_eq!(ScoreBand::for_score(0), ScoreBand::Poor);
    }

    #[test]
    fn test_availability_label() {
        assert_eq!(option(0, 60, 50).availability_label(), "SOLD OUT");
        assert!(option(0, 60, 50).is_sold_out());
        assert_eq!(option(12, 60, 50).availability_label(), "12 spots");
    }

    #[test]
    fn test_option_validation() {
        assert!(option(10, 20, 80).validate().is_ok());
        assert!(option(30, 20, 80).validate().is_err());
        assert!(option(10, 20, 101).validate().is_err());
    }

    #[test]
    fn test_turn_kind_serde_names() {
        let json = serde_json::to_string(&TurnKind::Destination).unwrap();
        assert_eq!(json, "\"destination\"");
        let parsed: TurnKind = serde_json::from_str("\"left\"").unwrap();
        assert_eq!(parsed, TurnKind::Left);
    }
}
