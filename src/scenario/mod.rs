//! Scripted scenarios
//!
//! A scenario is a TOML file of timed actions, each optionally followed by
//! an assertion on the session snapshot. The runner schedules them and the
//! driver plays them against a live controller with scripted speech.

mod driver;
mod runner;

pub use driver::{run_scenario, ScenarioReport};
pub use runner::{AssertionResult, ScenarioRunner};

use crate::parking::OptionId;
use crate::session::ScreenKind;
use crate::{ParkbotError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEMO_SCENARIO: &str = include_str!("../../scenarios/demo.toml");

/// A scenario loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub scenario: ScenarioMetadata,
    pub actions: Vec<ScenarioAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A single action with its timing
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioAction {
    /// Milliseconds after scenario start
    pub time_ms: u64,
    pub action: ActionType,
    #[serde(default)]
    pub assert: Option<Assertion>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionType {
    Submit { text: String },
    Select { id: OptionId },
    CloseNavigation,
    Back,
    NextStep,
    PreviousStep,
    StartListening,
    StopListening,
    /// Recognizer delivers a transcript for the active session
    Transcript { text: String },
    /// Recognizer fails the active session
    SpeechError {
        #[serde(default = "default_speech_error")]
        reason: String,
    },
    Speak { text: String },
    StopSpeaking,
    /// Synthesizer finishes the current utterance
    FinishSpeaking,
    ClearConversation,
    /// Nothing to do; used to hang an assertion on a point in time
    Wait,
    Log { message: String },
    Exit {
        #[serde(default)]
        code: i32,
    },
}

fn default_speech_error() -> String {
    "no-speech".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    Screen { screen: ScreenKind },
    ResultsCount { count: usize },
    SelectedName { name: String },
    DirectionCount { count: usize },
    Cursor { index: usize },
    Listening { expected: bool },
    Speaking { expected: bool },
    /// Case-insensitive substring of the latest assistant reply
    LastReplyContains { text: String },
}

impl Scenario {
    /// Load and validate a scenario file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ParkbotError::IOError(format!("Failed to read scenario '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ParkbotError::ScenarioError(msg) => {
                ParkbotError::ScenarioError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario =
            toml::from_str(content).map_err(|e| ParkbotError::ScenarioError(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Built-in walk through search, navigation and voice input
    ///
    /// Timings assume the default latency and reply delay.
    pub fn demo() -> Result<Self> {
        Self::from_toml_str(DEMO_SCENARIO)
    }

    fn validate(&self) -> Result<()> {
        if self.actions.is_empty() {
            return Err(ParkbotError::ScenarioError(
                "Scenario must have at least one action".to_string(),
            ));
        }

        let mut last_time = 0;
        for action in &self.actions {
            if action.time_ms < last_time {
                return Err(ParkbotError::ScenarioError(format!(
                    "Actions must be ordered by time. Found action at {}ms after action at {}ms",
                    action.time_ms, last_time
                )));
            }
            last_time = action.time_ms;
        }

        let has_exit = self
            .actions
            .iter()
            .any(|a| matches!(a.action, ActionType::Exit { .. }));
        if !has_exit {
            return Err(ParkbotError::ScenarioError(
                "Scenario must have an exit action".to_string(),
            ));
        }

        Ok(())
    }
}

impl ScenarioAction {
    /// Offset from scenario start
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }
}
