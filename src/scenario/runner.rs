//! Scenario scheduling and assertion checks

use super::{ActionType, Assertion, Scenario};
use crate::session::{ScreenView, SessionSnapshot};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Result of an assertion check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionResult {
    Passed,
    Failed(String),
}

/// Hands out scenario actions as their time comes
pub struct ScenarioRunner {
    scenario: Scenario,
    start_time: Option<Instant>,
    current_action_index: usize,
    completed: bool,
    passed: bool,
    failures: Vec<String>,
}

impl ScenarioRunner {
    pub fn new(scenario: Scenario) -> Self {
        info!("[SCENARIO] Loaded: {}", scenario.scenario.name);
        if !scenario.scenario.description.is_empty() {
            info!("[SCENARIO] Description: {}", scenario.scenario.description);
        }
        info!("[SCENARIO] Total actions: {}", scenario.actions.len());

        Self {
            scenario,
            start_time: None,
            current_action_index: 0,
            completed: false,
            passed: true,
            failures: Vec::new(),
        }
    }

    /// Start the clock; later calls are no-ops
    pub fn start(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
            info!("[SCENARIO] Started: {}", self.scenario.scenario.name);
        }
    }

    pub fn name(&self) -> &str {
        &self.scenario.scenario.name
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Whether every assertion so far passed
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Time until the next action is due, `None` when finished or not started
    pub fn time_until_next(&self) -> Option<Duration> {
        let start = self.start_time?;
        let action = self.scenario.actions.get(self.current_action_index)?;
        Some(action.delay().saturating_sub(start.elapsed()))
    }

    /// Next due action, if any
    pub fn poll(&mut self) -> Option<(ActionType, Option<Assertion>)> {
        if self.completed {
            return None;
        }

        let start_time = self.start_time?;

        let Some(action) = self.scenario.actions.get(self.current_action_index) else {
            self.completed = true;
            return None;
        };

        if start_time.elapsed() < action.delay() {
            return None;
        }

        debug!(
            "[SCENARIO] Executing action at {}ms: {:?}",
            action.time_ms, action.action
        );
        let due = (action.action.clone(), action.assert.clone());

        self.current_action_index += 1;
        if self.current_action_index >= self.scenario.actions.len() {
            self.completed = true;
        }

        Some(due)
    }

    /// Stop handing out actions, e.g. after an exit
    pub fn finish(&mut self) {
        self.completed = true;
    }

    /// Check an assertion against a snapshot
    pub fn check_assertion(
        &mut self,
        assertion: &Assertion,
        snapshot: &SessionSnapshot,
    ) -> AssertionResult {
        let result = evaluate(assertion, snapshot);

        match &result {
            AssertionResult::Passed => {
                info!("[SCENARIO] PASS: {:?}", assertion);
            }
            AssertionResult::Failed(reason) => {
                error!("[SCENARIO] FAIL: {:?} - {}", assertion, reason);
                self.passed = false;
                self.failures.push(format!("{:?}: {}", assertion, reason));
            }
        }

        result
    }

    pub fn summary(&self) -> String {
        let status = if self.passed { "PASSED" } else { "FAILED" };
        format!(
            "[SCENARIO] '{}' {}: executed {} actions in {:?}",
            self.scenario.scenario.name,
            status,
            self.current_action_index,
            self.elapsed()
        )
    }
}

fn expect_eq<T: PartialEq + std::fmt::Debug>(what: &str, expected: T, actual: T) -> AssertionResult {
    if expected == actual {
        AssertionResult::Passed
    } else {
        AssertionResult::Failed(format!("Expected {} {:?}, got {:?}", what, expected, actual))
    }
}

fn evaluate(assertion: &Assertion, snapshot: &SessionSnapshot) -> AssertionResult {
    match assertion {
        Assertion::Screen { screen } => expect_eq("screen", *screen, snapshot.screen()),
        Assertion::ResultsCount { count } => expect_eq(
            "results count",
            Some(*count),
            snapshot.results().map(|r| r.len()),
        ),
        Assertion::SelectedName { name } => expect_eq(
            "selected option",
            Some(name.as_str()),
            snapshot.selected().map(|o| o.name.as_str()),
        ),
        Assertion::DirectionCount { count } => expect_eq(
            "direction count",
            Some(*count),
            snapshot.selected().map(|o| o.navigation.len()),
        ),
        Assertion::Cursor { index } => match &snapshot.view {
            ScreenView::Navigation { current_step, .. } => {
                expect_eq("cursor", *index, *current_step)
            }
            other => AssertionResult::Failed(format!(
                "Expected navigation screen for cursor check, on {}",
                other.kind()
            )),
        },
        Assertion::Listening { expected } => {
            expect_eq("listening", *expected, snapshot.is_listening())
        }
        Assertion::Speaking { expected } => expect_eq("speaking", *expected, snapshot.is_speaking()),
        Assertion::LastReplyContains { text } => match snapshot.last_reply() {
            Some(reply) if reply.to_lowercase().contains(&text.to_lowercase()) => {
                AssertionResult::Passed
            }
            Some(reply) => {
                AssertionResult::Failed(format!("Last reply {:?} does not contain {:?}", reply, text))
            }
            None => AssertionResult::Failed("No assistant reply yet".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parking::{FixtureSource, StaticFixtures};
    use crate::session::{ScreenKind, Session, SpeechStatus};

    fn scenario() -> Scenario {
        Scenario::from_toml_str(
            r#"
            [scenario]
            name = "Timing"

            [[actions]]
            time_ms = 0
            action = { type = "wait" }
            assert = { type = "screen", screen = "landing" }

            [[actions]]
            time_ms = 10000
            action = { type = "exit" }
            "#,
        )
        .unwrap()
    }

    fn navigating_snapshot() -> SessionSnapshot {
        let mut session = Session::default();
        session.submit_request("parking");
        let ticket = session.pending_ticket().unwrap();
        session.complete_processing(ticket, StaticFixtures::midtown().options());
        session.select_option(3);
        session.next_step();
        SessionSnapshot::capture(&session, SpeechStatus::default(), 4)
    }

    #[test]
    fn test_poll_waits_for_start_and_time() {
        let mut runner = ScenarioRunner::new(scenario());
        assert!(runner.poll().is_none());

        runner.start();
        let (action, assertion) = runner.poll().unwrap();
        assert_eq!(action, ActionType::Wait);
        assert!(assertion.is_some());

        // exit is ten seconds out
        assert!(runner.poll().is_none());
        assert!(!runner.is_completed());
        assert!(runner.time_until_next().unwrap() > Duration::from_secs(9));
    }

    #[test]
    fn test_assertions_against_snapshot() {
        let mut runner = ScenarioRunner::new(scenario());
        let snapshot = navigating_snapshot();

        let passing = [
            Assertion::Screen {
                screen: ScreenKind::Navigation,
            },
            Assertion::ResultsCount { count: 5 },
            Assertion::SelectedName {
                name: "North Avenue Visitor Deck".into(),
            },
            Assertion::DirectionCount { count: 5 },
            Assertion::Cursor { index: 1 },
            Assertion::Listening { expected: false },
            Assertion::Speaking { expected: false },
            Assertion::LastReplyContains {
                text: "PARKING SPOTS".into(),
            },
        ];
        for assertion in &passing {
            assert_eq!(
                runner.check_assertion(assertion, &snapshot),
                AssertionResult::Passed,
                "{assertion:?}"
            );
        }
        assert!(runner.passed());

        let result = runner.check_assertion(&Assertion::Cursor { index: 4 }, &snapshot);
        assert!(matches!(result, AssertionResult::Failed(_)));
        assert!(!runner.passed());
        assert_eq!(runner.failures().len(), 1);
        assert!(runner.summary().contains("FAILED"));
    }

    #[test]
    fn test_cursor_assertion_off_navigation_fails() {
        let mut runner = ScenarioRunner::new(scenario());
        let snapshot = SessionSnapshot::capture(&Session::default(), SpeechStatus::default(), 0);
        assert!(matches!(
            runner.check_assertion(&Assertion::Cursor { index: 0 }, &snapshot),
            AssertionResult::Failed(_)
        ));
        assert!(matches!(
            runner.check_assertion(&Assertion::LastReplyContains { text: "x".into() }, &snapshot),
            AssertionResult::Failed(_)
        ));
    }
}
