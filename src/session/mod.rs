//! Session state: screens, conversation, preferences and render snapshots

pub mod conversation;
pub mod cursor;
pub mod preferences;
pub mod snapshot;
pub mod state;

pub use conversation::{ChatMessage, Conversation, Speaker};
pub use cursor::DirectionCursor;
pub use preferences::{CostTolerance, ParkingPreferences};
pub use snapshot::{ScreenView, SessionSnapshot, SharedSnapshot, SpeechStatus};
pub use state::{Guard, Screen, ScreenKind, Session, Transition};
