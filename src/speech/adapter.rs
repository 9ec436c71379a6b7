//! Speech adapter
//!
//! Owns the two providers and the listening/speaking flags. The flags are
//! held as the id of the active session or utterance, so at most one of
//! each can exist and callbacks carrying any other id are dropped.

use super::provider::{
    SpeechInputEvent, SpeechInputProvider, SpeechOutputEvent, SpeechOutputProvider, Utterance,
    VoiceSettings,
};
use crate::session::{Guard, SpeechStatus, Transition};
use tracing::{debug, info, warn};

/// What an input callback means for the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// Final transcript of the active session; listening has stopped
    Transcript(String),
    /// Session ended with an error or without a transcript
    Stopped,
    /// Callback for a session that is no longer active
    Ignored,
}

pub struct SpeechAdapter {
    input: Box<dyn SpeechInputProvider>,
    output: Box<dyn SpeechOutputProvider>,
    voice: VoiceSettings,
    listening: Option<u64>,
    speaking: Option<u64>,
    next_id: u64,
}

impl SpeechAdapter {
    pub fn new(
        input: Box<dyn SpeechInputProvider>,
        output: Box<dyn SpeechOutputProvider>,
        voice: VoiceSettings,
    ) -> Self {
        Self {
            input,
            output,
            voice,
            listening: None,
            speaking: None,
            next_id: 1,
        }
    }

    pub fn status(&self) -> SpeechStatus {
        SpeechStatus {
            input_available: self.input.available(),
            output_available: self.output.available(),
            listening: self.is_listening(),
            speaking: self.is_speaking(),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.is_some()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.is_some()
    }

    pub fn output_available(&self) -> bool {
        self.output.available()
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // === Input ===

    /// Open a recognition session
    ///
    /// Refused while either direction is active.
    pub fn start_listening(&mut self) -> Transition {
        if self.listening.is_some() || self.speaking.is_some() {
            return Transition::Ignored(Guard::SpeechBusy);
        }
        if !self.input.available() {
            return Transition::Ignored(Guard::Unavailable);
        }

        let session = self.allocate_id();
        match self.input.start(session) {
            Ok(()) => {
                info!("🎤 Listening (session {})", session);
                self.listening = Some(session);
                Transition::Applied
            }
            Err(e) => {
                warn!("Speech recognition failed to start: {}", e);
                Transition::Ignored(Guard::ProviderFailed(e.to_string()))
            }
        }
    }

    pub fn stop_listening(&mut self) -> Transition {
        match self.listening.take() {
            Some(session) => {
                self.input.stop();
                info!("🛑 Stopped listening (session {})", session);
                Transition::Applied
            }
            None => Transition::Ignored(Guard::NotActive),
        }
    }

    pub fn on_input_event(&mut self, session: u64, event: SpeechInputEvent) -> InputOutcome {
        if self.listening != Some(session) {
            debug!("Dropping input event for inactive session {}", session);
            return InputOutcome::Ignored;
        }
        self.listening = None;

        match event {
            SpeechInputEvent::Transcript(text) => {
                info!("📝 Transcript: {}", text);
                InputOutcome::Transcript(text)
            }
            SpeechInputEvent::Error(reason) => {
                warn!("Speech recognition error: {}", reason);
                InputOutcome::Stopped
            }
            SpeechInputEvent::End => {
                debug!("Recognition session {} ended without transcript", session);
                InputOutcome::Stopped
            }
        }
    }

    // === Output ===

    /// Vocalize `text`, replacing any utterance in progress
    ///
    /// Refused while listening.
    pub fn speak(&mut self, text: &str) -> Transition {
        if self.listening.is_some() {
            return Transition::Ignored(Guard::SpeechBusy);
        }
        if !self.output.available() {
            return Transition::Ignored(Guard::Unavailable);
        }

        if self.speaking.take().is_some() {
            self.output.cancel();
        }

        let utterance = Utterance {
            id: self.allocate_id(),
            text: text.to_string(),
            voice: self.voice,
        };
        match self.output.speak(&utterance) {
            Ok(()) => {
                info!("🔊 Speaking (utterance {})", utterance.id);
                self.speaking = Some(utterance.id);
                Transition::Applied
            }
            Err(e) => {
                warn!("Speech synthesis failed to start: {}", e);
                Transition::Ignored(Guard::ProviderFailed(e.to_string()))
            }
        }
    }

    pub fn stop_speaking(&mut self) -> Transition {
        match self.speaking.take() {
            Some(utterance) => {
                self.output.cancel();
                info!("🔇 Stopped speaking (utterance {})", utterance);
                Transition::Applied
            }
            None => Transition::Ignored(Guard::NotActive),
        }
    }

    /// Returns whether the speaking flag changed
    pub fn on_output_event(&mut self, utterance: u64, event: SpeechOutputEvent) -> bool {
        if self.speaking != Some(utterance) {
            debug!("Dropping output event for inactive utterance {}", utterance);
            return false;
        }

        match event {
            SpeechOutputEvent::Started => false,
            SpeechOutputEvent::Finished => {
                debug!("Utterance {} finished", utterance);
                self.speaking = None;
                true
            }
            SpeechOutputEvent::Error(reason) => {
                warn!("Speech synthesis error: {}", reason);
                self.speaking = None;
                true
            }
        }
    }

    /// Silence both directions
    pub fn shutdown(&mut self) {
        if self.listening.take().is_some() {
            self.input.stop();
        }
        if self.speaking.take().is_some() {
            self.output.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerMessage;
    use crate::speech::provider::{NoSpeechInput, NoSpeechOutput, SpeechEvent, SpeechEventSink};
    use crate::speech::scripted::{
        ScriptedInputRemote, ScriptedOutputRemote, ScriptedSpeechInput, ScriptedSpeechOutput,
    };
    use crossbeam_channel::{unbounded, Receiver};

    struct Rig {
        adapter: SpeechAdapter,
        input: ScriptedInputRemote,
        output: ScriptedOutputRemote,
        rx: Receiver<ControllerMessage>,
    }

    fn rig() -> Rig {
        let (tx, rx) = unbounded();
        let sink = SpeechEventSink::new(tx);
        let (input_provider, input) = ScriptedSpeechInput::new(sink.clone());
        let (output_provider, output) = ScriptedSpeechOutput::new(sink);
        Rig {
            adapter: SpeechAdapter::new(
                Box::new(input_provider),
                Box::new(output_provider),
                VoiceSettings::default(),
            ),
            input,
            output,
            rx,
        }
    }

    fn next_speech(rx: &Receiver<ControllerMessage>) -> SpeechEvent {
        match rx.try_recv().unwrap() {
            ControllerMessage::Speech(event) => event,
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_listen_then_transcript() {
        let mut rig = rig();
        assert!(rig.adapter.start_listening().is_applied());
        assert!(rig.adapter.is_listening());

        rig.input.transcript("parking please").unwrap();
        let SpeechEvent::Input { session, event } = next_speech(&rig.rx) else {
            panic!("expected input event");
        };
        assert_eq!(
            rig.adapter.on_input_event(session, event),
            InputOutcome::Transcript("parking please".into())
        );
        assert!(!rig.adapter.is_listening());
    }

    #[test]
    fn test_listen_refused_while_speaking() {
        let mut rig = rig();
        assert!(rig.adapter.speak("hello").is_applied());
        assert_eq!(
            rig.adapter.start_listening(),
            Transition::Ignored(Guard::SpeechBusy)
        );
        assert_eq!(rig.input.start_count(), 0);
    }

    #[test]
    fn test_speak_refused_while_listening() {
        let mut rig = rig();
        rig.adapter.start_listening();
        assert_eq!(rig.adapter.speak("hello"), Transition::Ignored(Guard::SpeechBusy));
        assert!(rig.output.spoken().is_empty());
    }

    #[test]
    fn test_speak_replaces_current_utterance() {
        let mut rig = rig();
        rig.adapter.speak("first");
        rig.adapter.speak("second");
        assert_eq!(rig.output.cancel_count(), 1);
        assert_eq!(rig.output.current_text().as_deref(), Some("second"));
        assert!(rig.adapter.is_speaking());
    }

    #[test]
    fn test_stale_output_event_ignored() {
        let mut rig = rig();
        rig.adapter.speak("first");
        // utterance 1 was cancelled by the second speak
        rig.adapter.speak("second");
        assert!(!rig.adapter.on_output_event(1, SpeechOutputEvent::Finished));
        assert!(rig.adapter.is_speaking());

        rig.output.finish().unwrap();
        let SpeechEvent::Output { utterance, event } = next_speech(&rig.rx) else {
            panic!("expected output event");
        };
        assert!(rig.adapter.on_output_event(utterance, event));
        assert!(!rig.adapter.is_speaking());
    }

    #[test]
    fn test_output_error_clears_speaking() {
        let mut rig = rig();
        rig.adapter.speak("hello");
        rig.output.fail("device lost").unwrap();
        let SpeechEvent::Output { utterance, event } = next_speech(&rig.rx) else {
            panic!("expected output event");
        };
        assert!(rig.adapter.on_output_event(utterance, event));
        assert!(!rig.adapter.is_speaking());
    }

    #[test]
    fn test_input_error_clears_listening() {
        let mut rig = rig();
        rig.adapter.start_listening();
        assert_eq!(
            rig.adapter.on_input_event(1, SpeechInputEvent::Error("no-speech".into())),
            InputOutcome::Stopped
        );
        assert!(!rig.adapter.is_listening());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut rig = rig();
        assert_eq!(rig.adapter.stop_listening(), Transition::Ignored(Guard::NotActive));
        assert_eq!(rig.adapter.stop_speaking(), Transition::Ignored(Guard::NotActive));

        rig.adapter.start_listening();
        assert!(rig.adapter.stop_listening().is_applied());
        assert!(!rig.adapter.stop_listening().is_applied());
        // late transcript after stop is dropped
        assert_eq!(
            rig.adapter.on_input_event(1, SpeechInputEvent::Transcript("late".into())),
            InputOutcome::Ignored
        );
    }

    #[test]
    fn test_unavailable_providers() {
        let mut adapter = SpeechAdapter::new(
            Box::new(NoSpeechInput),
            Box::new(NoSpeechOutput),
            VoiceSettings::default(),
        );
        assert_eq!(adapter.start_listening(), Transition::Ignored(Guard::Unavailable));
        assert_eq!(adapter.speak("hi"), Transition::Ignored(Guard::Unavailable));
        let status = adapter.status();
        assert!(!status.input_available);
        assert!(!status.output_available);
        assert!(!status.listening);
        assert!(!status.speaking);
    }

    #[test]
    fn test_shutdown_silences_both() {
        let mut rig = rig();
        rig.adapter.speak("hello");
        rig.adapter.shutdown();
        assert!(!rig.adapter.is_speaking());
        assert_eq!(rig.output.cancel_count(), 1);
    }
}
