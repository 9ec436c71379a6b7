//! Speech input and output
//!
//! Provider traits for the platform engines, the adapter that keeps the
//! listening and speaking flags mutually exclusive, and scripted providers
//! for tests and scenarios.

pub mod adapter;
pub mod provider;
pub mod scripted;

pub use adapter::{InputOutcome, SpeechAdapter};
pub use provider::{
    NoSpeechInput, NoSpeechOutput, SpeechEvent, SpeechEventSink, SpeechInputEvent,
    SpeechInputProvider, SpeechOutputEvent, SpeechOutputProvider, Utterance, VoiceSettings,
};
pub use scripted::{
    ScriptedInputRemote, ScriptedOutputRemote, ScriptedSpeechInput, ScriptedSpeechOutput,
};
