pub mod generator;
pub mod orchestrator;
mod state;

pub use generator::{AnswerGenerator, GenerationError, CHANNEL_MESSAGE_LIMIT};
pub use orchestrator::{
    QueryOrchestrator, DOCUMENTS_UNAVAILABLE_MESSAGE, GENERATION_FAILED_MESSAGE,
    GENERIC_FAILURE_MESSAGE,
};
