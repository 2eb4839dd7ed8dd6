//! Error types for bpmn-layout operations.
//!
//! Broken process data never produces an error: the validator reports it and
//! the recovery strategy repairs it. [`LayoutError`] covers the edges of the
//! pipeline that can genuinely fail, such as reading files or running an
//! external layout engine.

use std::io;

use thiserror::Error;

/// The main error type for bpmn-layout operations.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input model: {0}")]
    Input(String),

    #[error("Layout engine error: {0}")]
    Engine(String),
}
