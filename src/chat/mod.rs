pub mod pipeline;
pub mod prompt;
pub mod provider;

#[cfg(test)]
mod pipeline_tests;

pub use pipeline::{ChatPipeline, ChatRequest, ChatSink, StreamEvent};
pub use provider::{ChatProvider, MistralProvider};
