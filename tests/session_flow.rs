//! End-to-end session flows on the synchronous controller
//!
//! Timers are fired by hand and provider callbacks are pumped explicitly,
//! so every interleaving here is deterministic.

use crossbeam_channel::{unbounded, Receiver};
use parkbot::assistant::ReplyTopic;
use parkbot::controller::{
    ControllerCommand, ControllerMessage, LatencyTimer, ManualTimer, SessionController,
    TimerEvent,
};
use parkbot::parking::{FixtureSource, ParkingOption, StaticFixtures, TurnKind};
use parkbot::session::{ParkingPreferences, ScreenKind, ScreenView, SessionSnapshot};
use parkbot::speech::{
    ScriptedInputRemote, ScriptedOutputRemote, ScriptedSpeechInput, ScriptedSpeechOutput,
    SpeechAdapter, SpeechEventSink,
};
use parkbot::AppConfig;
use std::sync::Arc;
use std::time::Duration;

/// Controller wired to scripted speech and a manual timer
struct TestSession {
    controller: SessionController,
    timer: ManualTimer,
    input: ScriptedInputRemote,
    output: ScriptedOutputRemote,
    callbacks: Receiver<ControllerMessage>,
}

impl TestSession {
    fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    fn with_config(config: AppConfig) -> Self {
        Self::with_fixtures(config, Arc::new(StaticFixtures::midtown()))
    }

    fn with_fixtures(config: AppConfig, fixtures: Arc<dyn FixtureSource>) -> Self {
        let (tx, callbacks) = unbounded();
        let sink = SpeechEventSink::new(tx);
        let (input_provider, input) = ScriptedSpeechInput::new(sink.clone());
        let (output_provider, output) = ScriptedSpeechOutput::new(sink);
        let timer = ManualTimer::new();
        let speech = SpeechAdapter::new(
            Box::new(input_provider),
            Box::new(output_provider),
            config.speech.voice(),
        );
        let controller = SessionController::new(&config, fixtures, speech, Box::new(timer.clone()));
        Self {
            controller,
            timer,
            input,
            output,
            callbacks,
        }
    }

    fn send(&mut self, cmd: ControllerCommand) -> Option<SessionSnapshot> {
        self.controller.dispatch(cmd)
    }

    fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    /// Fire the oldest pending latency timer, leaving reply timers queued
    fn elapse_latency(&mut self) -> Option<SessionSnapshot> {
        let mut fired = None;
        for event in self.timer.drain() {
            match event {
                TimerEvent::LatencyElapsed(_) if fired.is_none() => fired = Some(event),
                other => self.timer.schedule(other, Duration::ZERO),
            }
        }
        let event = fired.expect("no latency timer pending");
        self.controller.handle(ControllerMessage::Timer(event))
    }

    fn pump_callbacks(&mut self) {
        while let Ok(message) = self.callbacks.try_recv() {
            self.controller.handle(message);
        }
    }

    fn to_results(&mut self, request: &str) {
        self.send(ControllerCommand::SubmitRequest(request.into()));
        self.elapse_latency();
    }
}

#[test]
fn test_end_to_end_search_and_navigation() {
    let mut app = TestSession::new();

    let snapshot = app
        .send(ControllerCommand::SubmitRequest(
            "I need parking at ATDC around 2pm on Saturday".into(),
        ))
        .unwrap();
    assert_eq!(snapshot.screen(), ScreenKind::Processing);

    let snapshot = app.elapse_latency().unwrap();
    assert_eq!(snapshot.screen(), ScreenKind::Results);
    assert_eq!(snapshot.results().unwrap().len(), 5);

    let snapshot = app.send(ControllerCommand::SelectOption(1)).unwrap();
    assert_eq!(snapshot.screen(), ScreenKind::Navigation);
    let selected = snapshot.selected().unwrap();
    assert_eq!(selected.name, "Technology Square Deck");
    assert_eq!(selected.navigation.directions.len(), 4);
    assert_eq!(
        selected.navigation.directions.last().unwrap().turn,
        TurnKind::Destination
    );
}

#[test]
fn test_completion_is_idempotent() {
    let mut app = TestSession::with_config(AppConfig::default().without_spoken_replies());
    app.send(ControllerCommand::SubmitRequest("parking".into()));
    let ticket = match app.timer.pending()[0].0 {
        TimerEvent::LatencyElapsed(ticket) => ticket,
        other => panic!("unexpected timer: {other:?}"),
    };

    let mut transitions = 0;
    for _ in 0..5 {
        if app
            .controller
            .handle(ControllerMessage::Timer(TimerEvent::LatencyElapsed(ticket)))
            .is_some()
        {
            transitions += 1;
        }
    }

    assert_eq!(transitions, 1);
    let snapshot = app.snapshot();
    assert_eq!(snapshot.screen(), ScreenKind::Results);
    // welcome, request, one reply
    assert_eq!(snapshot.conversation.len(), 3);
}

#[test]
fn test_select_close_round_trip_keeps_results() {
    let mut app = TestSession::new();
    app.to_results("parking near Tech Square");
    let before = app.snapshot();

    app.send(ControllerCommand::SelectOption(4));
    app.send(ControllerCommand::NextStep);
    let after = app.send(ControllerCommand::CloseNavigation).unwrap();

    assert_eq!(after.screen(), ScreenKind::Results);
    assert!(after.selected().is_none());
    let ids = |s: &SessionSnapshot| s.results().unwrap().iter().map(|o| o.id).collect::<Vec<_>>();
    assert_eq!(ids(&before), ids(&after));
}

#[test]
fn test_cursor_clamps_at_both_ends() {
    let mut app = TestSession::new();
    app.to_results("parking");

    for option in StaticFixtures::midtown().options().iter() {
        let n = option.navigation.len();
        app.send(ControllerCommand::SelectOption(option.id));

        for _ in 0..n - 1 {
            assert!(app.send(ControllerCommand::NextStep).is_some());
        }
        assert!(app.send(ControllerCommand::NextStep).is_none());
        assert_eq!(app.snapshot().current_step(), Some(n - 1));
        match app.snapshot().view {
            ScreenView::Navigation { step, can_next, .. } => {
                assert_eq!(step.map(|s| s.turn), Some(TurnKind::Destination));
                assert!(!can_next);
            }
            other => panic!("unexpected view: {other:?}"),
        }

        for _ in 0..n - 1 {
            app.send(ControllerCommand::PreviousStep);
        }
        assert!(app.send(ControllerCommand::PreviousStep).is_none());
        assert_eq!(app.snapshot().current_step(), Some(0));

        app.send(ControllerCommand::CloseNavigation);
    }
}

#[test]
fn test_back_returns_to_landing_and_allows_new_search() {
    let mut app = TestSession::with_config(AppConfig::default().without_spoken_replies());
    app.to_results("parking");
    let snapshot = app.send(ControllerCommand::Back).unwrap();
    assert_eq!(snapshot.screen(), ScreenKind::Landing);
    assert!(snapshot.results().is_none());

    app.send(ControllerCommand::SubmitRequest("how do I book a spot?".into()));
    let snapshot = app.elapse_latency().unwrap();
    assert_eq!(snapshot.screen(), ScreenKind::Results);
    // "spot" is in the parking group, which outranks reservation
    assert_eq!(snapshot.last_reply(), Some(ReplyTopic::Parking.reply()));
}

#[test]
fn test_parking_rate_question_gets_price_reply() {
    let mut app = TestSession::new();
    app.to_results("What's the parking rate?");
    assert_eq!(app.snapshot().last_reply(), Some(ReplyTopic::Pricing.reply()));
}

#[test]
fn test_voice_search_flow() {
    let mut app = TestSession::new();

    assert!(app.send(ControllerCommand::StartListening).unwrap().is_listening());
    // speaking is refused while the microphone is open
    assert!(app.send(ControllerCommand::Speak("hello".into())).is_none());

    app.input.transcript("  Find me a spot near ATDC ").unwrap();
    app.pump_callbacks();
    let snapshot = app.snapshot();
    assert!(!snapshot.is_listening());
    assert_eq!(snapshot.screen(), ScreenKind::Processing);

    app.elapse_latency();
    let reply_due = app
        .timer
        .take_where(|event| matches!(event, TimerEvent::ReplyDue(_)))
        .unwrap();
    assert!(matches!(reply_due, TimerEvent::ReplyDue(_)));
    let snapshot = app.controller.handle(ControllerMessage::Timer(reply_due)).unwrap();
    assert!(snapshot.is_speaking());

    // listening is refused while a reply is playing
    assert!(app.send(ControllerCommand::StartListening).is_none());

    app.output.started().unwrap();
    app.output.finish().unwrap();
    app.pump_callbacks();
    assert!(!app.snapshot().is_speaking());
    assert!(app.send(ControllerCommand::StartListening).is_some());
}

#[test]
fn test_blank_transcript_only_stops_listening() {
    let mut app = TestSession::new();
    app.send(ControllerCommand::StartListening);
    app.input.transcript("   ").unwrap();
    app.pump_callbacks();

    let snapshot = app.snapshot();
    assert!(!snapshot.is_listening());
    assert_eq!(snapshot.screen(), ScreenKind::Landing);
    assert!(app.timer.pending().is_empty());
}

#[test]
fn test_recognition_error_resets_flag() {
    let mut app = TestSession::new();
    app.send(ControllerCommand::StartListening);
    app.input.fail("not-allowed").unwrap();
    app.pump_callbacks();

    let snapshot = app.snapshot();
    assert!(!snapshot.is_listening());
    assert_eq!(snapshot.screen(), ScreenKind::Landing);
}

#[test]
fn test_stop_listening_drops_late_transcript() {
    let mut app = TestSession::new();
    app.send(ControllerCommand::StartListening);
    // provider already queued a result when the user pressed stop
    app.input.transcript("parking").unwrap();
    app.send(ControllerCommand::StopListening);
    app.pump_callbacks();

    let snapshot = app.snapshot();
    assert!(!snapshot.is_listening());
    assert_eq!(snapshot.screen(), ScreenKind::Landing);
}

#[test]
fn test_speak_replaces_and_stop_is_idempotent() {
    let mut app = TestSession::new();
    app.send(ControllerCommand::Speak("first".into()));
    app.send(ControllerCommand::Speak("second".into()));
    assert_eq!(app.output.cancel_count(), 1);
    assert_eq!(app.output.current_text().as_deref(), Some("second"));

    assert!(app.send(ControllerCommand::StopSpeaking).is_some());
    assert!(app.send(ControllerCommand::StopSpeaking).is_none());
    assert!(!app.snapshot().is_speaking());
}

#[test]
fn test_preferences_round_trip() {
    let mut app = TestSession::new();
    let mut preferences = app.snapshot().preferences;
    preferences.max_walking_minutes = 20;
    preferences.require_ev_charging = true;

    let snapshot = app
        .send(ControllerCommand::SavePreferences(preferences.clone()))
        .unwrap();
    assert_eq!(snapshot.preferences, preferences);

    let mut invalid = preferences.clone();
    invalid.max_cost = 80;
    assert!(app.send(ControllerCommand::SavePreferences(invalid)).is_none());

    let snapshot = app.send(ControllerCommand::ResetPreferences).unwrap();
    assert_eq!(snapshot.preferences.max_walking_minutes, 10);
}

#[test]
fn test_revision_counts_applied_mutations() {
    let mut app = TestSession::with_config(AppConfig::default().without_spoken_replies());
    app.send(ControllerCommand::SubmitRequest("parking".into()));
    app.send(ControllerCommand::Back); // wrong screen
    app.elapse_latency();
    app.send(ControllerCommand::SelectOption(42)); // unknown id
    app.send(ControllerCommand::SelectOption(2));
    assert_eq!(app.snapshot().revision, 3);
}

/// Fixture source that hands out records the static set would reject
struct RawFixtures(Arc<Vec<ParkingOption>>);

impl FixtureSource for RawFixtures {
    fn options(&self) -> Arc<Vec<ParkingOption>> {
        Arc::clone(&self.0)
    }
}

#[test]
fn test_option_without_directions_cannot_be_selected() {
    let mut options = (*StaticFixtures::midtown().options()).clone();
    options[0].navigation.directions.clear();
    let mut app = TestSession::with_fixtures(
        AppConfig::default().without_spoken_replies(),
        Arc::new(RawFixtures(Arc::new(options))),
    );
    app.to_results("parking");

    assert!(app.send(ControllerCommand::SelectOption(1)).is_none());
    let snapshot = app.snapshot();
    assert_eq!(snapshot.screen(), ScreenKind::Results);
    assert_eq!(snapshot.revision, 2);

    // the rest of the result set still navigates
    let snapshot = app.send(ControllerCommand::SelectOption(2)).unwrap();
    assert_eq!(snapshot.selected().unwrap().id, 2);
}

#[test]
fn test_status_stages_advance_while_processing() {
    let mut app = TestSession::with_config(AppConfig::default().without_spoken_replies());
    app.send(ControllerCommand::SubmitRequest("parking".into()));

    let mut stages = vec![app.snapshot().status_stage().unwrap()];
    while let Some(event) = app
        .timer
        .take_where(|event| matches!(event, TimerEvent::StatusAdvance { .. }))
    {
        let snapshot = app.controller.handle(ControllerMessage::Timer(event)).unwrap();
        stages.push(snapshot.status_stage().unwrap());
    }
    assert_eq!(stages, vec![0, 1, 2, 3, 4, 5, 6]);

    let snapshot = app.elapse_latency().unwrap();
    assert_eq!(snapshot.screen(), ScreenKind::Results);
    assert!(snapshot.status_stage().is_none());
}

#[test]
fn test_unavailable_speech_is_refused() {
    let config = AppConfig::default();
    let (tx, _callbacks) = unbounded();
    let sink = SpeechEventSink::new(tx);
    let (input_provider, input) = ScriptedSpeechInput::new(sink.clone());
    let (output_provider, output) = ScriptedSpeechOutput::new(sink);
    let timer = ManualTimer::new();
    let speech = SpeechAdapter::new(
        Box::new(input_provider.unavailable()),
        Box::new(output_provider.unavailable()),
        config.speech.voice(),
    );
    let mut controller = SessionController::new(
        &config,
        Arc::new(StaticFixtures::midtown()),
        speech,
        Box::new(timer.clone()),
    );

    let snapshot = controller.snapshot();
    assert!(!snapshot.speech.input_available);
    assert!(!snapshot.speech.output_available);

    assert!(controller.dispatch(ControllerCommand::StartListening).is_none());
    assert!(controller.dispatch(ControllerCommand::Speak("hello".into())).is_none());
    assert_eq!(input.start_count(), 0);
    assert!(output.spoken().is_empty());

    // searches still work, the reply just is not read out
    controller.dispatch(ControllerCommand::SubmitRequest("parking".into()));
    let latency = timer.take_next().unwrap();
    let snapshot = controller.handle(ControllerMessage::Timer(latency)).unwrap();
    assert_eq!(snapshot.screen(), ScreenKind::Results);
    assert!(!timer
        .pending()
        .iter()
        .any(|(event, _)| matches!(event, TimerEvent::ReplyDue(_))));
}

#[test]
fn test_configured_preferences_are_the_reset_target() {
    let configured = ParkingPreferences {
        max_walking_minutes: 15,
        ..Default::default()
    };
    let mut app = TestSession::with_config(AppConfig::default().with_preferences(configured.clone()));
    assert_eq!(app.snapshot().preferences, configured);

    let custom = ParkingPreferences {
        max_walking_minutes: 25,
        ..configured.clone()
    };
    app.send(ControllerCommand::SavePreferences(custom));
    let snapshot = app.send(ControllerCommand::ResetPreferences).unwrap();
    assert_eq!(snapshot.preferences, configured);
}
