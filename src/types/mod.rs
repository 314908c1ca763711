pub mod openai;
pub mod relay;

pub use openai::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Role};
pub use relay::{ErrorResponse, RelayResult};
