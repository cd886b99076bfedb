use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fallback applied when `lockLifeTime` is missing or unparseable.
const DEFAULT_LOCK_LIFE_TIME: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Connection-pool settings for the SQL backend. The pool itself lives in an
/// external client; the gateway only carries the knobs through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlPoolConfig {
    pub addr: String,
    #[serde(rename = "dbName")]
    pub db_name: String,
    pub user: String,
    pub pwd: String,
    pub pool: u32,
    pub life: String,
    pub encoding: String,
}

/// Connection-pool settings for the remote key-value backend. Ignored when
/// `localRedisInstance` selects the in-process engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KvPoolConfig {
    pub addr: String,
    pub pwd: String,
    #[serde(rename = "maxIdle")]
    pub max_idle: u32,
    #[serde(rename = "maxActive")]
    pub max_active: u32,
    pub idle: String,
    pub life: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "tcpAddr")]
    pub tcp_addr: String,
    #[serde(rename = "unixAddr")]
    pub unix_addr: String,
    pub mysql: SqlPoolConfig,
    pub redis: KvPoolConfig,
    /// Documented lock lifetime. Parsed and surfaced, but the lock engine is
    /// timeout-free; see `KeyLockRegistry`.
    #[serde(rename = "lockLifeTime")]
    pub lock_life_time: String,
    /// Serve the key-value message family from the in-process engine instead
    /// of a remote client.
    #[serde(rename = "localRedisInstance")]
    pub local_redis_instance: bool,
    #[serde(rename = "pidFile")]
    pub pid_file: String,
    #[serde(rename = "logLevel")]
    pub log_level: String,
    #[serde(rename = "logDir")]
    pub log_dir: String,
    pub pprof: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tcp_addr: String::new(),
            unix_addr: String::new(),
            mysql: SqlPoolConfig::default(),
            redis: KvPoolConfig::default(),
            lock_life_time: String::new(),
            local_redis_instance: false,
            pid_file: String::new(),
            log_level: "info".to_owned(),
            log_dir: String::new(),
            pprof: String::new(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// `lockLifeTime` as a duration, falling back to ten minutes when the
    /// field is absent or malformed.
    pub fn lock_life_time(&self) -> Duration {
        if self.lock_life_time.is_empty() {
            return DEFAULT_LOCK_LIFE_TIME;
        }
        match humantime::parse_duration(&self.lock_life_time) {
            Ok(d) => d,
            Err(err) => {
                warn!(value = %self.lock_life_time, %err, "unparseable lockLifeTime, using default");
                DEFAULT_LOCK_LIFE_TIME
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_schema() {
        let raw = r#"{
            "tcpAddr": "0.0.0.0:10088",
            "unixAddr": "/tmp/storage.sock",
            "mysql": {"addr": "127.0.0.1:3306", "dbName": "game", "user": "rw", "pwd": "s3cret", "pool": 16, "life": "1h", "encoding": "utf8"},
            "redis": {"addr": "127.0.0.1:6379", "maxIdle": 8, "maxActive": 64, "idle": "5m", "life": "30m"},
            "lockLifeTime": "10m",
            "localRedisInstance": true,
            "logLevel": "debug"
        }"#;
        let cfg: Config = serde_json::from_str(raw).expect("config should parse");
        assert_eq!(cfg.tcp_addr, "0.0.0.0:10088");
        assert_eq!(cfg.unix_addr, "/tmp/storage.sock");
        assert_eq!(cfg.mysql.db_name, "game");
        assert_eq!(cfg.mysql.pool, 16);
        assert_eq!(cfg.redis.max_active, 64);
        assert!(cfg.local_redis_instance);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.lock_life_time(), Duration::from_secs(600));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: Config = serde_json::from_str("{}").expect("empty config should parse");
        assert!(!cfg.local_redis_instance);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.lock_life_time(), DEFAULT_LOCK_LIFE_TIME);
    }

    #[test]
    fn bad_lock_life_time_falls_back() {
        let cfg = Config {
            lock_life_time: "not-a-duration".to_owned(),
            ..Config::default()
        };
        assert_eq!(cfg.lock_life_time(), DEFAULT_LOCK_LIFE_TIME);
    }
}
