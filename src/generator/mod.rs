//! AI workout plan generation: prompt, chat-completion client and reply parser.

pub mod client;
pub mod error;
pub mod parser;
pub mod prompt;

pub use client::{ChatCompletion, CompletionClient, OpenAiClient};
pub use error::{GenerationError, PlanParseError};
