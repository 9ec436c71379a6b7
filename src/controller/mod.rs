//! Session controller and its threaded runtime
//!
//! - `handler`: the synchronous [`SessionController`] that applies messages
//! - `timer`: latency and reply-delay scheduling
//! - `runtime`: the controller thread and the [`ControllerHandle`] used to drive it

pub mod handler;
pub mod message;
pub mod runtime;
pub mod timer;

pub use handler::SessionController;
pub use message::{ControllerCommand, ControllerMessage, SessionEvent, TimerEvent};
pub use runtime::{ControllerHandle, ControllerRuntime};
pub use timer::{LatencyTimer, ManualTimer, ThreadTimer};
