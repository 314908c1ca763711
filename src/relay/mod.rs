pub mod error;
pub mod handler;
pub mod prompt;
pub mod splitter;
pub mod upstream;

pub use error::{RelayError, RelayOutcome, UpstreamError};
pub use handler::{ChatRelay, RelayRequest, RelayResponse};
pub use splitter::{split_response, SplitResponse};
pub use upstream::{ChatCompletion, UpstreamChatClient};
