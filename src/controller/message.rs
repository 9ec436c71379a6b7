//! Messages into and out of the session controller

use crate::parking::OptionId;
use crate::session::{ParkingPreferences, SessionSnapshot};
use crate::speech::SpeechEvent;
use crossbeam_channel::Sender;

/// User intents
#[derive(Debug, Clone)]
pub enum ControllerCommand {
    SubmitRequest(String),
    SelectOption(OptionId),
    CloseNavigation,
    Back,
    NextStep,
    PreviousStep,
    StartListening,
    StopListening,
    Speak(String),
    StopSpeaking,
    SavePreferences(ParkingPreferences),
    ResetPreferences,
    ClearConversation,
    /// Reply with the current snapshot once every earlier message is handled
    Snapshot(Sender<SessionSnapshot>),
    Shutdown,
}

/// Timer expiries, tagged with the id they were scheduled for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Simulated search finished for this processing ticket
    LatencyElapsed(u64),
    /// Next status message is due for this processing ticket
    StatusAdvance { ticket: u64, stage: usize },
    /// Pending reply may now be spoken
    ReplyDue(u64),
}

/// Everything the controller reacts to
#[derive(Debug, Clone)]
pub enum ControllerMessage {
    Command(ControllerCommand),
    Timer(TimerEvent),
    Speech(SpeechEvent),
}

impl From<ControllerCommand> for ControllerMessage {
    fn from(cmd: ControllerCommand) -> Self {
        ControllerMessage::Command(cmd)
    }
}

impl From<TimerEvent> for ControllerMessage {
    fn from(event: TimerEvent) -> Self {
        ControllerMessage::Timer(event)
    }
}

impl From<SpeechEvent> for ControllerMessage {
    fn from(event: SpeechEvent) -> Self {
        ControllerMessage::Speech(event)
    }
}

/// Notifications for the rendering layer
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Published after every applied mutation
    Snapshot(SessionSnapshot),
    /// Controller loop has exited
    Shutdown,
}
