mod commands;
mod store;
mod value;

pub mod error;

pub use commands::Command;
pub use error::CommandError;
pub use store::Store;
pub use value::{Entry, Value, ValueKind};
