//! Session controller
//!
//! Single owner of the session and the speech adapter. Every message is
//! processed to completion before the next one; a message that changed
//! anything yields a fresh snapshot.

use super::message::{ControllerCommand, ControllerMessage, TimerEvent};
use super::timer::LatencyTimer;
use crate::assistant::stage_starts;
use crate::config::{AppConfig, LatencyConfig, SpeechConfig};
use crate::parking::FixtureSource;
use crate::session::{Guard, Session, SessionSnapshot, Transition};
use crate::speech::{InputOutcome, SpeechAdapter, SpeechEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reply waiting for its delay before being spoken
#[derive(Debug, Clone)]
struct PendingReply {
    id: u64,
    text: String,
}

pub struct SessionController {
    session: Session,
    speech: SpeechAdapter,
    fixtures: Arc<dyn FixtureSource>,
    timer: Box<dyn LatencyTimer>,
    latency: LatencyConfig,
    speech_config: SpeechConfig,
    pending_reply: Option<PendingReply>,
    next_reply_id: u64,
    revision: u64,
}

impl SessionController {
    pub fn new(
        config: &AppConfig,
        fixtures: Arc<dyn FixtureSource>,
        speech: SpeechAdapter,
        timer: Box<dyn LatencyTimer>,
    ) -> Self {
        Self {
            session: Session::new(config.preferences.clone()),
            speech,
            fixtures,
            timer,
            latency: config.latency.clone(),
            speech_config: config.speech.clone(),
            pending_reply: None,
            next_reply_id: 1,
            revision: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn speech(&self) -> &SpeechAdapter {
        &self.speech
    }

    /// Snapshot at the current revision
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.session, self.speech.status(), self.revision)
    }

    /// Process one message
    ///
    /// Returns the new snapshot when the message mutated the session or
    /// the speech flags.
    pub fn handle(&mut self, message: ControllerMessage) -> Option<SessionSnapshot> {
        let changed = match message {
            ControllerMessage::Command(cmd) => self.handle_command(cmd),
            ControllerMessage::Timer(event) => self.handle_timer(event),
            ControllerMessage::Speech(event) => self.handle_speech(event),
        };

        if changed {
            self.revision += 1;
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// Convenience for callers holding a bare command
    pub fn dispatch(&mut self, cmd: ControllerCommand) -> Option<SessionSnapshot> {
        self.handle(ControllerMessage::Command(cmd))
    }

    /// Silence speech before the controller goes away
    pub fn shutdown(&mut self) {
        self.pending_reply = None;
        self.speech.shutdown();
        info!("Session controller shut down at revision {}", self.revision);
    }

    fn handle_command(&mut self, cmd: ControllerCommand) -> bool {
        match cmd {
            ControllerCommand::SubmitRequest(text) => self.submit(&text),
            ControllerCommand::SelectOption(id) => {
                let result = self.session.select_option(id);
                record("select_option", result)
            }
            ControllerCommand::CloseNavigation => {
                let result = self.session.close_navigation();
                record("close_navigation", result)
            }
            ControllerCommand::Back => {
                let result = self.session.back();
                record("back", result)
            }
            ControllerCommand::NextStep => {
                let result = self.session.next_step();
                record("next_step", result)
            }
            ControllerCommand::PreviousStep => {
                let result = self.session.previous_step();
                record("previous_step", result)
            }
            ControllerCommand::StartListening => {
                let result = self.speech.start_listening();
                record("start_listening", result)
            }
            ControllerCommand::StopListening => {
                let result = self.speech.stop_listening();
                record("stop_listening", result)
            }
            ControllerCommand::Speak(text) => {
                let result = self.speech.speak(&text);
                record("speak", result)
            }
            ControllerCommand::StopSpeaking => {
                let result = self.speech.stop_speaking();
                record("stop_speaking", result)
            }
            ControllerCommand::SavePreferences(preferences) => {
                let result = self.session.save_preferences(preferences);
                record("save_preferences", result)
            }
            ControllerCommand::ResetPreferences => {
                let result = self.session.reset_preferences();
                record("reset_preferences", result)
            }
            ControllerCommand::ClearConversation => {
                // a reply that is no longer in the log should not be read out
                self.pending_reply = None;
                let result = self.session.clear_conversation();
                record("clear_conversation", result)
            }
            ControllerCommand::Snapshot(reply) => {
                if reply.send(self.snapshot()).is_err() {
                    debug!("Snapshot requester went away");
                }
                false
            }
            ControllerCommand::Shutdown => {
                self.shutdown();
                false
            }
        }
    }

    fn submit(&mut self, text: &str) -> bool {
        let result = self.session.submit_request(text);
        if !record("submit_request", result) {
            return false;
        }

        if let Some(ticket) = self.session.pending_ticket() {
            let delay = self.latency.sample_delay();
            debug!("Search ticket {} resolves in {:?}", ticket, delay);
            self.timer.schedule(TimerEvent::LatencyElapsed(ticket), delay);
            // stages still due when the search completes are dropped as stale
            for (stage, start) in stage_starts() {
                self.timer
                    .schedule(TimerEvent::StatusAdvance { ticket, stage }, start);
            }
        }
        true
    }

    fn handle_timer(&mut self, event: TimerEvent) -> bool {
        match event {
            TimerEvent::LatencyElapsed(ticket) => {
                let result = self.session.complete_processing(ticket, self.fixtures.options());
                if !record("complete_processing", result) {
                    return false;
                }
                self.schedule_reply();
                true
            }
            TimerEvent::StatusAdvance { ticket, stage } => {
                let result = self.session.advance_status(ticket, stage);
                record("advance_status", result)
            }
            TimerEvent::ReplyDue(id) => {
                let text = match self.pending_reply.take() {
                    Some(reply) if reply.id == id => reply.text,
                    other => {
                        self.pending_reply = other;
                        debug!("Reply {} no longer pending", id);
                        return false;
                    }
                };
                let result = self.speech.speak(&text);
                record("speak_reply", result)
            }
        }
    }

    fn schedule_reply(&mut self) {
        if !self.speech_config.speak_replies || !self.speech.output_available() {
            return;
        }
        let Some(reply) = self.session.conversation().last_reply() else {
            return;
        };

        let id = self.next_reply_id;
        self.next_reply_id += 1;
        self.pending_reply = Some(PendingReply {
            id,
            text: reply.text.clone(),
        });
        self.timer
            .schedule(TimerEvent::ReplyDue(id), self.speech_config.reply_delay());
    }

    fn handle_speech(&mut self, event: SpeechEvent) -> bool {
        match event {
            SpeechEvent::Input { session, event } => match self.speech.on_input_event(session, event) {
                InputOutcome::Transcript(text) => {
                    // listening stopped either way
                    self.submit(&text);
                    true
                }
                InputOutcome::Stopped => true,
                InputOutcome::Ignored => false,
            },
            SpeechEvent::Output { utterance, event } => {
                self.speech.on_output_event(utterance, event)
            }
        }
    }
}

/// Log a transition outcome and report whether it applied
fn record(operation: &str, result: Transition) -> bool {
    match result {
        Transition::Applied => {
            debug!("{} applied", operation);
            true
        }
        Transition::Ignored(Guard::StaleTicket(ticket)) => {
            debug!("{} ignored: stale ticket {}", operation, ticket);
            false
        }
        Transition::Ignored(guard) => {
            warn!("{} ignored: {}", operation, guard);
            false
        }
    }
}
