//! Scripted speech providers
//!
//! Stand-ins for platform engines. The provider half is handed to the
//! controller; the remote half is kept by whoever plays the platform
//! (scenario runner, tests) and decides when recognition or playback
//! resolves.

use super::provider::{
    SpeechEventSink, SpeechInputEvent, SpeechInputProvider, SpeechOutputEvent,
    SpeechOutputProvider, Utterance,
};
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct InputState {
    active_session: Option<u64>,
    starts: usize,
    stops: usize,
}

/// Recognition provider resolved by a [`ScriptedInputRemote`]
pub struct ScriptedSpeechInput {
    state: Arc<Mutex<InputState>>,
    available: bool,
}

impl ScriptedSpeechInput {
    /// Create a provider and the remote that resolves its sessions
    pub fn new(sink: SpeechEventSink) -> (Self, ScriptedInputRemote) {
        let state = Arc::new(Mutex::new(InputState::default()));
        let provider = Self {
            state: Arc::clone(&state),
            available: true,
        };
        let remote = ScriptedInputRemote { state, sink };
        (provider, remote)
    }

    /// Report the capability as missing
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl SpeechInputProvider for ScriptedSpeechInput {
    fn available(&self) -> bool {
        self.available
    }

    fn start(&mut self, session: u64) -> Result<()> {
        let mut state = self.state.lock();
        state.active_session = Some(session);
        state.starts += 1;
        debug!("Scripted recognition session {} started", session);
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.active_session = None;
        state.stops += 1;
    }
}

/// Plays the platform side of a [`ScriptedSpeechInput`]
#[derive(Clone)]
pub struct ScriptedInputRemote {
    state: Arc<Mutex<InputState>>,
    sink: SpeechEventSink,
}

impl ScriptedInputRemote {
    /// Resolve the active session with a transcript
    ///
    /// Returns `false` when no session is active.
    pub fn transcript(&self, text: impl Into<String>) -> Result<bool> {
        self.resolve(SpeechInputEvent::Transcript(text.into()))
    }

    /// Resolve the active session with a recognition error
    pub fn fail(&self, reason: impl Into<String>) -> Result<bool> {
        self.resolve(SpeechInputEvent::Error(reason.into()))
    }

    /// End the active session without a transcript
    pub fn end(&self) -> Result<bool> {
        self.resolve(SpeechInputEvent::End)
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active_session.is_some()
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().starts
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().stops
    }

    fn resolve(&self, event: SpeechInputEvent) -> Result<bool> {
        let session = self.state.lock().active_session.take();
        match session {
            Some(session) => {
                self.sink.input(session, event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Debug, Default)]
struct OutputState {
    current: Option<Utterance>,
    spoken: Vec<String>,
    cancels: usize,
}

/// Synthesis provider resolved by a [`ScriptedOutputRemote`]
pub struct ScriptedSpeechOutput {
    state: Arc<Mutex<OutputState>>,
    available: bool,
}

impl ScriptedSpeechOutput {
    /// Create a provider and the remote that resolves its utterances
    pub fn new(sink: SpeechEventSink) -> (Self, ScriptedOutputRemote) {
        let state = Arc::new(Mutex::new(OutputState::default()));
        let provider = Self {
            state: Arc::clone(&state),
            available: true,
        };
        let remote = ScriptedOutputRemote { state, sink };
        (provider, remote)
    }

    /// Report the capability as missing
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl SpeechOutputProvider for ScriptedSpeechOutput {
    fn available(&self) -> bool {
        self.available
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        let mut state = self.state.lock();
        state.spoken.push(utterance.text.clone());
        state.current = Some(utterance.clone());
        debug!("Scripted utterance {} queued", utterance.id);
        Ok(())
    }

    fn cancel(&mut self) {
        let mut state = self.state.lock();
        if state.current.take().is_some() {
            state.cancels += 1;
        }
    }
}

/// Plays the platform side of a [`ScriptedSpeechOutput`]
#[derive(Clone)]
pub struct ScriptedOutputRemote {
    state: Arc<Mutex<OutputState>>,
    sink: SpeechEventSink,
}

impl ScriptedOutputRemote {
    /// Report that the current utterance began playing
    pub fn started(&self) -> Result<bool> {
        let current = self.state.lock().current.as_ref().map(|u| u.id);
        match current {
            Some(id) => {
                self.sink.output(id, SpeechOutputEvent::Started)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Finish the current utterance naturally
    pub fn finish(&self) -> Result<bool> {
        self.resolve(SpeechOutputEvent::Finished)
    }

    /// Fail the current utterance
    pub fn fail(&self, reason: impl Into<String>) -> Result<bool> {
        self.resolve(SpeechOutputEvent::Error(reason.into()))
    }

    /// Text of the utterance currently playing
    pub fn current_text(&self) -> Option<String> {
        self.state.lock().current.as_ref().map(|u| u.text.clone())
    }

    /// Everything handed to the provider, in order
    pub fn spoken(&self) -> Vec<String> {
        self.state.lock().spoken.clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.state.lock().cancels
    }

    fn resolve(&self, event: SpeechOutputEvent) -> Result<bool> {
        let current = self.state.lock().current.take();
        match current {
            Some(utterance) => {
                self.sink.output(utterance.id, event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
