mod aggregate;
mod error;
mod store;

pub use aggregate::merge;
pub use error::{CheckpointError, Result};
pub use store::{load_all, manifest, restore, save};
