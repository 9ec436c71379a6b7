//! Render snapshots
//!
//! After every applied mutation the controller publishes one of these.
//! A snapshot carries exactly what its screen needs and nothing tied to
//! the live session, so it can be handed to another thread freely.

use super::conversation::{ChatMessage, Speaker};
use super::preferences::ParkingPreferences;
use super::state::{ScreenKind, Screen, Session};
use crate::assistant::{StatusStage, EXAMPLE_PROMPTS, STATUS_STAGES};
use crate::parking::{DirectionStep, ParkingOption};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Per-screen render payload
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenView {
    Landing {
        examples: &'static [&'static str],
    },
    Processing {
        request: String,
        /// Current status message, `None` once every stage has been shown
        status: Option<&'static str>,
        stage: usize,
        stage_count: usize,
        /// Full message sequence with display durations
        stages: &'static [StatusStage],
    },
    Results {
        results: Arc<Vec<ParkingOption>>,
    },
    Navigation {
        results: Arc<Vec<ParkingOption>>,
        selected: ParkingOption,
        current_step: usize,
        /// Step under the cursor; `None` only for a plan with no steps
        step: Option<DirectionStep>,
        can_previous: bool,
        can_next: bool,
    },
}

impl ScreenView {
    pub fn kind(&self) -> ScreenKind {
        match self {
            ScreenView::Landing { .. } => ScreenKind::Landing,
            ScreenView::Processing { .. } => ScreenKind::Processing,
            ScreenView::Results { .. } => ScreenKind::Results,
            ScreenView::Navigation { .. } => ScreenKind::Navigation,
        }
    }
}

/// Whether each speech affordance should be offered at all
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SpeechStatus {
    pub input_available: bool,
    pub output_available: bool,
    pub listening: bool,
    pub speaking: bool,
}

/// Immutable view of the session
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    /// Increments with every published snapshot
    pub revision: u64,
    pub view: ScreenView,
    pub speech: SpeechStatus,
    pub conversation: Vec<ChatMessage>,
    pub preferences: ParkingPreferences,
}

impl SessionSnapshot {
    /// Capture the session as it is now
    pub fn capture(session: &Session, speech: SpeechStatus, revision: u64) -> Self {
        Self {
            revision,
            view: view_of(session.screen()),
            speech,
            conversation: session.conversation().messages().to_vec(),
            preferences: session.preferences().clone(),
        }
    }

    pub fn screen(&self) -> ScreenKind {
        self.view.kind()
    }

    pub fn is_listening(&self) -> bool {
        self.speech.listening
    }

    pub fn is_speaking(&self) -> bool {
        self.speech.speaking
    }

    pub fn results(&self) -> Option<&[ParkingOption]> {
        match &self.view {
            ScreenView::Results { results } | ScreenView::Navigation { results, .. } => {
                Some(results.as_slice())
            }
            _ => None,
        }
    }

    /// Processing stage index, present only while processing
    pub fn status_stage(&self) -> Option<usize> {
        match &self.view {
            ScreenView::Processing { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn selected(&self) -> Option<&ParkingOption> {
        match &self.view {
            ScreenView::Navigation { selected, .. } => Some(selected),
            _ => None,
        }
    }

    pub fn current_step(&self) -> Option<usize> {
        match &self.view {
            ScreenView::Navigation { current_step, .. } => Some(*current_step),
            _ => None,
        }
    }

    pub fn last_reply(&self) -> Option<&str> {
        self.conversation
            .iter()
            .rev()
            .find(|m| m.speaker == Speaker::Assistant)
            .map(|m| m.text.as_str())
    }
}

fn view_of(screen: &Screen) -> ScreenView {
    match screen {
        Screen::Landing => ScreenView::Landing {
            examples: EXAMPLE_PROMPTS,
        },
        Screen::Processing { request, stage, .. } => ScreenView::Processing {
            request: request.clone(),
            status: STATUS_STAGES.get(*stage).map(|s| s.text),
            stage: *stage,
            stage_count: STATUS_STAGES.len(),
            stages: STATUS_STAGES,
        },
        Screen::Results { results } => ScreenView::Results {
            results: Arc::clone(results),
        },
        Screen::Navigation {
            results,
            selected,
            cursor,
        } => match results.get(*selected) {
            Some(option) => ScreenView::Navigation {
                results: Arc::clone(results),
                selected: option.clone(),
                current_step: cursor.index(),
                step: option.navigation.step(cursor.index()).cloned(),
                can_previous: cursor.can_retreat(),
                can_next: cursor.can_advance(),
            },
            None => ScreenView::Results {
                results: Arc::clone(results),
            },
        },
    }
}

/// Latest published snapshot, readable from any thread
#[derive(Clone)]
pub struct SharedSnapshot {
    inner: Arc<RwLock<SessionSnapshot>>,
}

impl SharedSnapshot {
    pub fn new(initial: SessionSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Replace the stored snapshot
    pub fn publish(&self, snapshot: SessionSnapshot) {
        *self.inner.write() = snapshot;
    }

    /// Clone of the latest snapshot (no lock held after return)
    pub fn get(&self) -> SessionSnapshot {
        self.inner.read().clone()
    }

    pub fn screen(&self) -> ScreenKind {
        self.inner.read().screen()
    }

    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    pub fn is_listening(&self) -> bool {
        self.inner.read().speech.listening
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.read().speech.speaking
    }
}
