//! Session aggregate and its screen state machine
//!
//! Every mutation goes through a named transition method that either
//! applies completely or leaves the session untouched. A call whose guard
//! fails returns [`Transition::Ignored`] with the reason; it never panics
//! and never surfaces as an error.
//!
//! ```text
//! Landing --submit_request--> Processing --complete_processing--> Results
//!    ^                                                            |   ^
//!    +------------------------------back--------------------------+   |
//!                                       select_option |               | close_navigation
//!                                                     v               |
//!                                                  Navigation --------+
//! ```

use super::conversation::Conversation;
use super::cursor::DirectionCursor;
use super::preferences::ParkingPreferences;
use crate::assistant::{respond, STATUS_STAGES};
use crate::parking::{OptionId, ParkingOption};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Screen tag, without payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKind {
    Landing,
    Processing,
    Results,
    Navigation,
}

impl std::fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenKind::Landing => write!(f, "Landing"),
            ScreenKind::Processing => write!(f, "Processing"),
            ScreenKind::Results => write!(f, "Results"),
            ScreenKind::Navigation => write!(f, "Navigation"),
        }
    }
}

/// Current screen with the data only that screen owns
#[derive(Clone, Debug)]
pub enum Screen {
    Landing,
    Processing {
        /// Trimmed request text
        request: String,
        /// Identifies the timers allowed to act on this entry
        ticket: u64,
        /// Index into `STATUS_STAGES`; equal to its length once all have run
        stage: usize,
    },
    Results {
        results: Arc<Vec<ParkingOption>>,
    },
    Navigation {
        results: Arc<Vec<ParkingOption>>,
        /// Index of the selected option in `results`
        selected: usize,
        cursor: DirectionCursor,
    },
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::Landing => ScreenKind::Landing,
            Screen::Processing { .. } => ScreenKind::Processing,
            Screen::Results { .. } => ScreenKind::Results,
            Screen::Navigation { .. } => ScreenKind::Navigation,
        }
    }
}

/// Why a transition was not applied
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Guard {
    /// Operation is not valid on the current screen
    WrongScreen {
        expected: ScreenKind,
        actual: ScreenKind,
    },
    /// Request text was empty after trimming
    EmptyRequest,
    /// No option with this id in the current results
    UnknownOption(OptionId),
    /// Option has no turn-by-turn steps to show
    EmptyPlan(OptionId),
    /// Timer ticket does not belong to the current processing entry,
    /// or its event was overtaken
    StaleTicket(u64),
    /// Cursor already at the first or last step
    AtBoundary,
    /// The other speech direction is active
    SpeechBusy,
    /// Platform capability is missing
    Unavailable,
    /// Nothing to stop
    NotActive,
    /// Provider refused to start
    ProviderFailed(String),
    /// Preferences outside their allowed ranges
    InvalidPreferences(String),
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guard::WrongScreen { expected, actual } => {
                write!(f, "expected {} screen, on {}", expected, actual)
            }
            Guard::EmptyRequest => write!(f, "empty request"),
            Guard::UnknownOption(id) => write!(f, "unknown option {}", id),
            Guard::EmptyPlan(id) => write!(f, "option {} has no directions", id),
            Guard::StaleTicket(ticket) => write!(f, "stale timer ticket {}", ticket),
            Guard::AtBoundary => write!(f, "cursor at boundary"),
            Guard::SpeechBusy => write!(f, "speech resource busy"),
            Guard::Unavailable => write!(f, "capability unavailable"),
            Guard::NotActive => write!(f, "not active"),
            Guard::ProviderFailed(reason) => write!(f, "provider failed: {}", reason),
            Guard::InvalidPreferences(reason) => write!(f, "invalid preferences: {}", reason),
        }
    }
}

/// Outcome of a transition method
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored(Guard),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }

    fn wrong_screen(expected: ScreenKind, actual: &Screen) -> Self {
        Transition::Ignored(Guard::WrongScreen {
            expected,
            actual: actual.kind(),
        })
    }
}

/// The single session aggregate
///
/// Owned by the session controller; nothing else mutates it.
#[derive(Clone, Debug)]
pub struct Session {
    screen: Screen,
    conversation: Conversation,
    preferences: ParkingPreferences,
    default_preferences: ParkingPreferences,
    next_ticket: u64,
}

impl Session {
    /// Fresh session on the landing screen
    pub fn new(preferences: ParkingPreferences) -> Self {
        Self {
            screen: Screen::Landing,
            conversation: Conversation::new(),
            default_preferences: preferences.clone(),
            preferences,
            next_ticket: 1,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_kind(&self) -> ScreenKind {
        self.screen.kind()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn preferences(&self) -> &ParkingPreferences {
        &self.preferences
    }

    /// Request text, present only while processing
    pub fn pending_request(&self) -> Option<&str> {
        match &self.screen {
            Screen::Processing { request, .. } => Some(request),
            _ => None,
        }
    }

    /// Ticket of the timers that may act on the current processing entry
    pub fn pending_ticket(&self) -> Option<u64> {
        match &self.screen {
            Screen::Processing { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }

    /// Status stage index, present only while processing
    pub fn status_stage(&self) -> Option<usize> {
        match &self.screen {
            Screen::Processing { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Result set, present on results and navigation screens
    pub fn results(&self) -> Option<&Arc<Vec<ParkingOption>>> {
        match &self.screen {
            Screen::Results { results } | Screen::Navigation { results, .. } => Some(results),
            _ => None,
        }
    }

    /// Selected option, present only while navigating
    pub fn selected_option(&self) -> Option<&ParkingOption> {
        match &self.screen {
            Screen::Navigation {
                results, selected, ..
            } => results.get(*selected),
            _ => None,
        }
    }

    pub fn cursor(&self) -> Option<&DirectionCursor> {
        match &self.screen {
            Screen::Navigation { cursor, .. } => Some(cursor),
            _ => None,
        }
    }

    // === Screen transitions ===

    /// Landing -> Processing
    pub fn submit_request(&mut self, text: &str) -> Transition {
        if !matches!(self.screen, Screen::Landing) {
            return Transition::wrong_screen(ScreenKind::Landing, &self.screen);
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Transition::Ignored(Guard::EmptyRequest);
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        self.conversation.push_user(trimmed);
        self.screen = Screen::Processing {
            request: trimmed.to_string(),
            ticket,
            stage: 0,
        };
        Transition::Applied
    }

    /// Move the processing status forward to `stage`
    ///
    /// Stages only move forward; `STATUS_STAGES.len()` marks every stage
    /// as shown.
    pub fn advance_status(&mut self, ticket: u64, stage: usize) -> Transition {
        match &mut self.screen {
            Screen::Processing {
                ticket: current,
                stage: shown,
                ..
            } if *current == ticket => {
                if stage <= *shown || stage > STATUS_STAGES.len() {
                    return Transition::Ignored(Guard::StaleTicket(ticket));
                }
                *shown = stage;
                Transition::Applied
            }
            _ => Transition::Ignored(Guard::StaleTicket(ticket)),
        }
    }

    /// Processing -> Results, when the matching latency timer fires
    ///
    /// Appends the canned reply for the request to the conversation.
    pub fn complete_processing(
        &mut self,
        ticket: u64,
        results: Arc<Vec<ParkingOption>>,
    ) -> Transition {
        let reply = match &self.screen {
            Screen::Processing {
                request,
                ticket: current,
                ..
            } => {
                if *current != ticket {
                    return Transition::Ignored(Guard::StaleTicket(ticket));
                }
                respond(request)
            }
            // Already completed, or never started: a late or duplicate tick
            _ => return Transition::Ignored(Guard::StaleTicket(ticket)),
        };

        self.conversation.push_assistant(reply);
        self.screen = Screen::Results { results };
        Transition::Applied
    }

    /// Results -> Navigation
    pub fn select_option(&mut self, id: OptionId) -> Transition {
        let results = match &self.screen {
            Screen::Results { results } => Arc::clone(results),
            other => return Transition::wrong_screen(ScreenKind::Results, other),
        };

        let Some(selected) = results.iter().position(|o| o.id == id) else {
            return Transition::Ignored(Guard::UnknownOption(id));
        };

        let steps = results[selected].navigation.len();
        if steps == 0 {
            return Transition::Ignored(Guard::EmptyPlan(id));
        }

        let cursor = DirectionCursor::new(steps);
        self.screen = Screen::Navigation {
            results,
            selected,
            cursor,
        };
        Transition::Applied
    }

    /// Navigation -> Results
    pub fn close_navigation(&mut self) -> Transition {
        let results = match &self.screen {
            Screen::Navigation { results, .. } => Arc::clone(results),
            other => return Transition::wrong_screen(ScreenKind::Navigation, other),
        };

        self.screen = Screen::Results { results };
        Transition::Applied
    }

    /// Results -> Landing
    pub fn back(&mut self) -> Transition {
        if !matches!(self.screen, Screen::Results { .. }) {
            return Transition::wrong_screen(ScreenKind::Results, &self.screen);
        }

        self.screen = Screen::Landing;
        Transition::Applied
    }

    // === Turn-by-turn cursor ===

    pub fn next_step(&mut self) -> Transition {
        match &mut self.screen {
            Screen::Navigation { cursor, .. } => {
                if cursor.next() {
                    Transition::Applied
                } else {
                    Transition::Ignored(Guard::AtBoundary)
                }
            }
            other => Transition::wrong_screen(ScreenKind::Navigation, other),
        }
    }

    pub fn previous_step(&mut self) -> Transition {
        match &mut self.screen {
            Screen::Navigation { cursor, .. } => {
                if cursor.previous() {
                    Transition::Applied
                } else {
                    Transition::Ignored(Guard::AtBoundary)
                }
            }
            other => Transition::wrong_screen(ScreenKind::Navigation, other),
        }
    }

    // === Conversation & preferences ===

    pub fn clear_conversation(&mut self) -> Transition {
        self.conversation.clear();
        Transition::Applied
    }

    pub fn save_preferences(&mut self, preferences: ParkingPreferences) -> Transition {
        if let Err(e) = preferences.validate() {
            return Transition::Ignored(Guard::InvalidPreferences(e.to_string()));
        }
        self.preferences = preferences;
        Transition::Applied
    }

    /// Restore the preferences the session was created with
    pub fn reset_preferences(&mut self) -> Transition {
        self.preferences = self.default_preferences.clone();
        Transition::Applied
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ParkingPreferences::default())
    }
}
