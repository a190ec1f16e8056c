//! Error types shared by the sequencer and the session controller.
//!
//! None of these escape as panics: state violations are logged and returned
//! so the caller can ignore them and keep going.

use thiserror::Error;

use crate::session::Phase;

/// A single frame identifier could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to load frame '{id}': {reason}")]
pub struct LoadError {
    pub id: String,
    pub reason: String,
}

impl LoadError {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Errors and warnings from the frame sequencer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    /// `load` was given an empty list of frames.
    #[error("No animation frames loaded")]
    NoFrames,

    /// One of the frames failed to resolve; nothing was kept.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// `start` was called before a successful `load`.
    #[error("Sequencer not loaded")]
    NotLoaded,

    /// `start` was called while a playback was already running.
    #[error("Sequencer already playing")]
    AlreadyPlaying,
}

/// State violations reported by the session controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The operation is not valid in the current phase.
    #[error("Cannot {op} while session is {phase}")]
    WrongPhase { op: &'static str, phase: Phase },

    /// Input arrived while the session was not accepting it.
    #[error("Session is not accepting input")]
    InputClosed,
}
