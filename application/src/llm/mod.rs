//! Language-model access for the agent.

pub mod fallback;

pub use fallback::FallbackGateway;
