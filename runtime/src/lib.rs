mod dispatcher;
mod error;
mod signature;

pub use dispatcher::Dispatcher;
pub use error::{Result, SignatureError};
pub use signature::{SignatureRequest, SignatureResponse};
