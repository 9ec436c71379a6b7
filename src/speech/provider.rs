//! Speech provider contracts
//!
//! Recognition and synthesis engines are external capabilities. They are
//! driven through these traits and report back asynchronously through a
//! [`SpeechEventSink`], tagging every event with the session or utterance
//! id it belongs to so late callbacks can be told apart from current ones.

use crate::controller::ControllerMessage;
use crate::{ParkbotError, Result};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// Prosody applied to every utterance
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            volume: 0.8,
        }
    }
}

/// Text handed to the output provider
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub voice: VoiceSettings,
}

/// Callbacks from a listening session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechInputEvent {
    Transcript(String),
    Error(String),
    /// Session ended without a transcript
    End,
}

/// Callbacks from an utterance
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechOutputEvent {
    Started,
    Finished,
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechEvent {
    Input { session: u64, event: SpeechInputEvent },
    Output { utterance: u64, event: SpeechOutputEvent },
}

/// Speech-to-text capability
pub trait SpeechInputProvider: Send {
    fn available(&self) -> bool;

    /// Begin listening; exactly one input event for `session` follows
    fn start(&mut self, session: u64) -> Result<()>;

    /// Abort the active session, if any
    fn stop(&mut self);
}

/// Text-to-speech capability
pub trait SpeechOutputProvider: Send {
    fn available(&self) -> bool;

    /// Begin vocalizing; a finished or error event for `utterance.id` follows
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;

    /// Silence the active utterance immediately
    fn cancel(&mut self);
}

/// Where providers deliver their callbacks
///
/// Feeds the controller's message channel. Must not be used from the
/// controller thread itself.
#[derive(Clone, Debug)]
pub struct SpeechEventSink {
    tx: Sender<ControllerMessage>,
}

impl SpeechEventSink {
    pub fn new(tx: Sender<ControllerMessage>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, event: SpeechEvent) -> Result<()> {
        self.tx
            .send(ControllerMessage::Speech(event))
            .map_err(|e| ParkbotError::ChannelError(format!("Failed to deliver speech event: {}", e)))
    }

    pub fn input(&self, session: u64, event: SpeechInputEvent) -> Result<()> {
        self.emit(SpeechEvent::Input { session, event })
    }

    pub fn output(&self, utterance: u64, event: SpeechOutputEvent) -> Result<()> {
        self.emit(SpeechEvent::Output { utterance, event })
    }
}

/// Platform without speech recognition
#[derive(Debug, Default)]
pub struct NoSpeechInput;

impl SpeechInputProvider for NoSpeechInput {
    fn available(&self) -> bool {
        false
    }

    fn start(&mut self, _session: u64) -> Result<()> {
        Err(ParkbotError::SpeechInputError("speech recognition not supported".into()))
    }

    fn stop(&mut self) {}
}

/// Platform without speech synthesis
#[derive(Debug, Default)]
pub struct NoSpeechOutput;

impl SpeechOutputProvider for NoSpeechOutput {
    fn available(&self) -> bool {
        false
    }

    fn speak(&mut self, _utterance: &Utterance) -> Result<()> {
        Err(ParkbotError::SpeechOutputError("speech synthesis not supported".into()))
    }

    fn cancel(&mut self) {}
}
