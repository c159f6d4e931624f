pub mod classifier;
pub mod client;
pub mod decoder;
pub mod engine;
mod inference;
pub mod prompt;

pub use classifier::{Classifier, ClassifyError};
pub use client::AnthropicClient;
pub use decoder::DecodeError;
pub use engine::{ContentBlock, EngineResponse, ReasoningEngine};
