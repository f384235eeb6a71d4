//! Answer extraction through an OpenAI-compatible chat-completions API.

pub mod answer;
pub mod client;
pub mod types;

pub use answer::{Answer, ask};
pub use client::{ChatClient, ChatCompletion};
