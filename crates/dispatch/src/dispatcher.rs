use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::transport::{DatagramSender, ReplyPath};

/// Routing key: (scheme, tag, type).
pub type RouteKey = (i64, i64, i64);

/// A registered message handler. Handlers are synchronous with respect to
/// the dispatcher: they run on the worker that drained the envelope and must
/// ship their reply before returning.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, envelope: Envelope, reply: &ReplyPath) -> Result<(), DispatchError>;
}

/// Builds the routing table before the workers start; the table is
/// read-only afterwards.
pub struct DispatcherBuilder {
    routes: HashMap<RouteKey, Arc<dyn MessageHandler>>,
    unix: Option<Arc<dyn DatagramSender>>,
    workers: usize,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        DispatcherBuilder {
            routes: HashMap::new(),
            unix: None,
            workers: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(4),
        }
    }
}

impl DispatcherBuilder {
    pub fn new() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Registers the handler for one (scheme, tag, type) triple.
    pub fn route(
        mut self,
        scheme: i64,
        tag: i64,
        kind: i64,
        handler: Arc<dyn MessageHandler>,
    ) -> DispatcherBuilder {
        self.routes.insert((scheme, tag, kind), handler);
        self
    }

    /// Sender half of the unix datagram transport, used for datagram
    /// replies. Without it only stream envelopes can be answered.
    pub fn unix_sender(mut self, unix: Arc<dyn DatagramSender>) -> DispatcherBuilder {
        self.unix = Some(unix);
        self
    }

    pub fn workers(mut self, workers: usize) -> DispatcherBuilder {
        self.workers = workers.max(1);
        self
    }

    /// Spawns the worker pool and hands back the running dispatcher.
    pub fn start(self) -> Dispatcher {
        let (tx, rx) = unbounded::<Envelope>();
        let routes = Arc::new(self.routes);
        let reply = ReplyPath::new(self.unix);
        info!(workers = self.workers, routes = routes.len(), "dispatcher starting");

        let workers = (0..self.workers)
            .map(|i| {
                let rx: Receiver<Envelope> = rx.clone();
                let routes = Arc::clone(&routes);
                let reply = reply.clone();
                std::thread::Builder::new()
                    .name(format!("dispatch-{i}"))
                    .spawn(move || worker_loop(rx, routes, reply))
                    .unwrap_or_else(|e| panic!("failed to spawn dispatch worker: {e}"))
            })
            .collect();

        Dispatcher { tx: Some(tx), workers }
    }
}

fn worker_loop(
    rx: Receiver<Envelope>,
    routes: Arc<HashMap<RouteKey, Arc<dyn MessageHandler>>>,
    reply: ReplyPath,
) {
    for envelope in rx.iter() {
        let key = (envelope.scheme(), envelope.tag(), envelope.kind());
        let Some(handler) = routes.get(&key) else {
            warn!(scheme = key.0, tag = key.1, kind = key.2, "no handler for message");
            continue;
        };
        if let Err(err) = handler.handle(envelope, &reply) {
            warn!(scheme = key.0, tag = key.1, kind = key.2, %err, "handler failed");
        }
    }
    debug!("dispatch worker draining done");
}

/// The running worker pool. Transports push decoded envelopes into the
/// queue; closing the queue (via `shutdown`) lets in-flight handlers finish
/// naturally.
pub struct Dispatcher {
    tx: Option<Sender<Envelope>>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// A producer handle for a transport to push decoded envelopes.
    pub fn queue(&self) -> Sender<Envelope> {
        self.tx
            .as_ref()
            .cloned()
            .unwrap_or_else(|| unbounded().0)
    }

    /// Closes the queue and joins the workers.
    pub fn shutdown(mut self) {
        self.tx.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("dispatch worker panicked");
            }
        }
        info!("dispatcher stopped");
    }
}
