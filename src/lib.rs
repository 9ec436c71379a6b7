pub mod assistant;
pub mod config;
pub mod controller;
pub mod error;
pub mod parking;
pub mod scenario;
pub mod session;
pub mod speech;
pub mod telemetry;

pub use config::AppConfig;
pub use controller::{ControllerHandle, ControllerRuntime, SessionController};
pub use error::{ParkbotError, Result};
pub use session::{ScreenKind, SessionSnapshot};
