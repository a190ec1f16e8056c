// Library surface for headless/integration tests and reuse.
// The terminal host (CLI, rendering) lives in main.rs and ui.rs.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod history;
pub mod input;
pub mod loader;
pub mod problem;
pub mod runtime;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod shuffle;
pub mod surface;

pub use error::{LoadError, SequencerError, SessionError};
pub use session::{Phase, Session, SessionConfig, SessionResult};
