//! Prompt templates for planning and reflection.

pub mod agent;

pub use agent::AgentPromptTemplate;
