//! Threaded controller runtime
//!
//! Runs a [`SessionController`] on its own thread. Commands and provider
//! callbacks share one FIFO channel, timers arrive on a second one, and the
//! loop `select!`s over both. After every applied mutation the new snapshot
//! is published to a [`SharedSnapshot`] and offered on the event channel.

use super::handler::SessionController;
use super::message::{ControllerCommand, ControllerMessage, SessionEvent, TimerEvent};
use super::timer::ThreadTimer;
use crate::config::AppConfig;
use crate::parking::{FixtureSource, OptionId};
use crate::session::{ParkingPreferences, SessionSnapshot, SharedSnapshot};
use crate::speech::{SpeechAdapter, SpeechEventSink, SpeechInputProvider, SpeechOutputProvider};
use crate::{ParkbotError, Result};
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Channels are created up front so providers can be wired to the
/// controller before it starts
pub struct ControllerRuntime {
    config: AppConfig,
    message_tx: Sender<ControllerMessage>,
    message_rx: Receiver<ControllerMessage>,
}

impl ControllerRuntime {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let (message_tx, message_rx) = bounded(config.runtime.channel_buffer_size);
        Ok(Self {
            config,
            message_tx,
            message_rx,
        })
    }

    /// Sink for provider callbacks
    pub fn speech_sink(&self) -> SpeechEventSink {
        SpeechEventSink::new(self.message_tx.clone())
    }

    /// Start the controller thread
    pub fn spawn(
        self,
        fixtures: Arc<dyn FixtureSource>,
        input: Box<dyn SpeechInputProvider>,
        output: Box<dyn SpeechOutputProvider>,
    ) -> Result<ControllerHandle> {
        let buffer_size = self.config.runtime.channel_buffer_size;
        let (timer_tx, timer_rx) = bounded(buffer_size);
        let (event_tx, event_rx) = bounded(buffer_size);

        let speech = SpeechAdapter::new(input, output, self.config.speech.voice());
        let controller = SessionController::new(
            &self.config,
            fixtures,
            speech,
            Box::new(ThreadTimer::new(timer_tx)),
        );

        let state = SharedSnapshot::new(controller.snapshot());
        let loop_state = state.clone();
        let message_rx = self.message_rx;

        let join = thread::Builder::new()
            .name("parkbot-controller".into())
            .spawn(move || run_loop(controller, message_rx, timer_rx, event_tx, loop_state))?;
        info!("Session controller started");

        Ok(ControllerHandle {
            message_tx: self.message_tx,
            event_rx,
            state,
            join: Some(join),
            shutdown_timeout: self.config.runtime.shutdown_timeout(),
        })
    }
}

fn run_loop(
    mut controller: SessionController,
    message_rx: Receiver<ControllerMessage>,
    timer_rx: Receiver<TimerEvent>,
    event_tx: Sender<SessionEvent>,
    state: SharedSnapshot,
) {
    info!("Controller loop starting");

    loop {
        let message = select! {
            recv(message_rx) -> msg => match msg {
                Ok(msg) => msg,
                Err(_) => {
                    warn!("Message channel disconnected");
                    break;
                }
            },
            recv(timer_rx) -> event => match event {
                Ok(event) => ControllerMessage::Timer(event),
                // the controller holds a timer sender, so this cannot close first
                Err(_) => continue,
            },
        };

        if matches!(message, ControllerMessage::Command(ControllerCommand::Shutdown)) {
            info!("Shutdown requested");
            controller.shutdown();
            let final_snapshot = controller.snapshot();
            state.publish(final_snapshot);
            offer(&event_tx, SessionEvent::Shutdown);
            info!("Controller shutdown complete");
            return;
        }

        if let Some(snapshot) = controller.handle(message) {
            state.publish(snapshot.clone());
            offer(&event_tx, SessionEvent::Snapshot(snapshot));
        }
    }

    controller.shutdown();
    offer(&event_tx, SessionEvent::Shutdown);
    info!("Controller loop exiting");
}

/// Events are advisory; a slow consumer reads the shared snapshot instead
fn offer(event_tx: &Sender<SessionEvent>, event: SessionEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => debug!("Event channel full, dropping event"),
        Err(TrySendError::Disconnected(_)) => {}
    }
}

/// Handle for driving the controller from a UI, a scenario or tests
pub struct ControllerHandle {
    message_tx: Sender<ControllerMessage>,
    event_rx: Receiver<SessionEvent>,
    state: SharedSnapshot,
    join: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl ControllerHandle {
    /// Send a command to the controller
    pub fn send_command(&self, cmd: ControllerCommand) -> Result<()> {
        self.message_tx
            .send(ControllerMessage::Command(cmd))
            .map_err(|e| ParkbotError::ChannelError(format!("Failed to send command: {}", e)))
    }

    pub fn submit_request(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(ControllerCommand::SubmitRequest(text.into()))
    }

    pub fn select_option(&self, id: OptionId) -> Result<()> {
        self.send_command(ControllerCommand::SelectOption(id))
    }

    pub fn close_navigation(&self) -> Result<()> {
        self.send_command(ControllerCommand::CloseNavigation)
    }

    pub fn back(&self) -> Result<()> {
        self.send_command(ControllerCommand::Back)
    }

    pub fn next_step(&self) -> Result<()> {
        self.send_command(ControllerCommand::NextStep)
    }

    pub fn previous_step(&self) -> Result<()> {
        self.send_command(ControllerCommand::PreviousStep)
    }

    pub fn start_listening(&self) -> Result<()> {
        self.send_command(ControllerCommand::StartListening)
    }

    pub fn stop_listening(&self) -> Result<()> {
        self.send_command(ControllerCommand::StopListening)
    }

    pub fn speak(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(ControllerCommand::Speak(text.into()))
    }

    pub fn stop_speaking(&self) -> Result<()> {
        self.send_command(ControllerCommand::StopSpeaking)
    }

    pub fn save_preferences(&self, preferences: ParkingPreferences) -> Result<()> {
        self.send_command(ControllerCommand::SavePreferences(preferences))
    }

    pub fn reset_preferences(&self) -> Result<()> {
        self.send_command(ControllerCommand::ResetPreferences)
    }

    pub fn clear_conversation(&self) -> Result<()> {
        self.send_command(ControllerCommand::ClearConversation)
    }

    /// Snapshot taken after every message sent so far has been handled
    pub fn request_snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = bounded(1);
        self.send_command(ControllerCommand::Snapshot(tx))?;
        rx.recv_timeout(self.shutdown_timeout)
            .map_err(|e| ParkbotError::ChannelError(format!("Failed to receive snapshot: {}", e)))
    }

    /// Sink for provider callbacks
    pub fn speech_sink(&self) -> SpeechEventSink {
        SpeechEventSink::new(self.message_tx.clone())
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event, waiting at most `timeout`
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Latest published snapshot
    pub fn state(&self) -> &SharedSnapshot {
        &self.state
    }

    /// Poll the shared snapshot until `predicate` holds or `timeout` passes
    pub fn wait_for<F>(&self, timeout: Duration, predicate: F) -> Option<SessionSnapshot>
    where
        F: Fn(&SessionSnapshot) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let snapshot = self.state.get();
            if predicate(&snapshot) {
                return Some(snapshot);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }

    /// Stop the controller and wait for its thread
    pub fn shutdown(&mut self) -> Result<()> {
        let Some(join) = self.join.take() else {
            return Ok(());
        };

        if self.send_command(ControllerCommand::Shutdown).is_err() {
            debug!("Controller already stopped");
        }

        let deadline = Instant::now() + self.shutdown_timeout;
        while !join.is_finished() {
            if Instant::now() > deadline {
                warn!("Shutdown timeout reached, detaching controller thread");
                return Err(ParkbotError::ChannelError(
                    "Controller did not shut down in time".into(),
                ));
            }
            thread::sleep(Duration::from_millis(5));
        }

        join.join()
            .map_err(|_| ParkbotError::ChannelError("Controller thread panicked".into()))
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            let _ = self.shutdown();
        }
    }
}
