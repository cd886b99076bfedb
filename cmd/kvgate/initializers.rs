use std::sync::Arc;

use kvgate_common::Config;
use kvgate_dispatch::handlers::storage_routes;
use kvgate_dispatch::{Dispatcher, DispatcherBuilder, KvBackend};
use kvgate_engine::Store;
use kvgate_lock::KeyLockRegistry;
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{fmt, prelude::*};

pub fn init_tracing(config: &Config) {
    let default_level: LevelFilter = config.log_level.parse().unwrap_or(LevelFilter::INFO);
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .init();
}

/// Builds the engine, the lock registry and the dispatcher with the full
/// storage routing table, and starts the worker pool. Transport frontends
/// (external collaborators) feed the returned dispatcher's queue.
pub fn init_gateway(config: &Config) -> Dispatcher {
    let lock_life_time = config.lock_life_time();
    let locks = Arc::new(KeyLockRegistry::new(lock_life_time));

    let kv: Option<Arc<dyn KvBackend>> = if config.local_redis_instance {
        Some(Arc::new(Store::new()))
    } else {
        // The remote key-value client is an external collaborator; without
        // one linked in, the redis message family stays unrouted.
        warn!("localRedisInstance is false and no remote client is linked; redis routes disabled");
        None
    };
    if !config.mysql.addr.is_empty() {
        // Same for the SQL client.
        warn!(addr = %config.mysql.addr, "mysql configured but no SQL client is linked; sql routes disabled");
    }

    let dispatcher = storage_routes(DispatcherBuilder::new(), None, kv, locks).start();

    for (field, value) in [
        ("pidFile", &config.pid_file),
        ("logDir", &config.log_dir),
        ("pprof", &config.pprof),
    ] {
        if !value.is_empty() {
            warn!(field, value = %value, "option is handled by the process supervisor, ignoring");
        }
    }

    info!(
        tcp_addr = %config.tcp_addr,
        unix_addr = %config.unix_addr,
        local_kv = config.local_redis_instance,
        lock_life_time = ?lock_life_time,
        "gateway initialised; transport frontends feed the dispatcher queue"
    );

    dispatcher
}
