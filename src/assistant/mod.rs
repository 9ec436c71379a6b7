//! Canned assistant behaviour: keyword replies and processing status text

pub mod responder;
pub mod status;

pub use responder::{classify, respond, ReplyTopic, EXAMPLE_PROMPTS, WELCOME_MESSAGE};
pub use status::{stage_starts, status_at, StatusStage, STATUS_STAGES};
