pub mod config;
pub mod datum;
pub mod time;

pub use config::{Config, ConfigError, KvPoolConfig, SqlPoolConfig};
pub use datum::Datum;
pub use time::monotonic_ns;
