//! Entity transport abstractions and implementations.

mod http;
mod mock;
mod provider;
mod retry;

pub use http::{DEFAULT_TIMEOUT, HttpTransport};
pub use mock::{Call, MockTransport};
pub use provider::EntityTransport;
pub use retry::RetryTransport;
