pub mod classify;
pub mod generation_agent;
pub mod rest_backend;

pub use classify::{classify, FailureKind};
pub use generation_agent::{DiagramGenerator, FailureBody, GenerationApiAgent, GenerationApiError};
pub use rest_backend::{RestAccountBackend, WriteStrategy, WRITE_STRATEGIES};
