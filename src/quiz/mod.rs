// src/quiz/mod.rs

//! Session state machine and question selection.
//!
//! Everything here is synchronous and transport-free; the HTTP handlers in
//! `crate::handlers` call into [`QuizEngine`] on a blocking thread.

pub mod bank;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod selector;
pub mod session;
pub mod store;

pub use engine::QuizEngine;
pub use error::{QuizError, QuizResult, StoreError};
