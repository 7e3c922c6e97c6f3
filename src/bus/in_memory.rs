use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::BusConfig;
use crate::context::Context;
use crate::driver::{Reader, Writer};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::reader::ReaderTask;

/// In-process bus implementing both driver contracts.
///
/// Features:
/// - Cheap to clone; clones share the same queue and listeners
/// - Several listeners per stream, each receiving every message (fan-out)
/// - Bounded queue and bounded handler parallelism (see [`BusConfig`])
/// - Handler contexts derive from the start context, so cancelling it
///   reaches in-flight handlers; the bus reports stopped once every
///   dispatched handler has returned
/// - Writes honor their context while waiting for queue space
///
/// ## Example
///
/// ```ignore
/// let bus = InMemoryBus::new(BusConfig::default());
/// let mut hub = Hub::builder()
///     .writer(Arc::new(bus.clone()))
///     .reader(Arc::new(bus.clone()))
///     .build();
///
/// // register streams and readers ...
///
/// let ctx = Context::new();
/// bus.start(&ctx)?;
/// hub.start(&ctx).await?;
///
/// ctx.cancel();
/// bus.wait_stopped().await;
/// ```
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

struct Inner {
    config: BusConfig,
    sender: Mutex<Option<mpsc::Sender<Message>>>,
    receiver: Mutex<Option<mpsc::Receiver<Message>>>,
    listeners: RwLock<HashMap<String, Vec<ReaderTask>>>,
    permits: Arc<Semaphore>,
    started: AtomicBool,
    stopped: CancellationToken,
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl InMemoryBus {
    pub fn new(config: BusConfig) -> Self {
        let config = BusConfig {
            queue_capacity: config.queue_capacity.max(1),
            max_in_flight: config.max_in_flight.max(1),
        };
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        Self {
            inner: Arc::new(Inner {
                config,
                sender: Mutex::new(Some(tx)),
                receiver: Mutex::new(Some(rx)),
                listeners: RwLock::new(HashMap::new()),
                permits: Arc::new(Semaphore::new(config.max_in_flight as usize)),
                started: AtomicBool::new(false),
                stopped: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> BusConfig {
        self.inner.config
    }

    /// Spawn the dispatch loop and the shutdown watcher.
    ///
    /// Only the first call has any effect. Cancelling `ctx` (or reaching its
    /// deadline) begins shutdown. Must be called from within a tokio runtime.
    pub fn start(&self, ctx: &Context) -> Result<()> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let receiver = self
            .inner
            .receiver
            .lock()
            .map_err(|_| Error::LockPoisoned("bus receiver"))?
            .take();
        let Some(receiver) = receiver else {
            return Ok(());
        };

        let dispatcher = tokio::spawn(dispatch(Arc::clone(&self.inner), ctx.clone(), receiver));
        tokio::spawn(watch_shutdown(
            Arc::clone(&self.inner),
            ctx.clone(),
            dispatcher,
        ));

        debug!(
            queue_capacity = self.inner.config.queue_capacity,
            max_in_flight = self.inner.config.max_in_flight,
            "in-memory bus started"
        );
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.is_cancelled()
    }

    /// Resolves once shutdown has closed the queue and every handler has returned.
    pub async fn wait_stopped(&self) {
        self.inner.stopped.cancelled().await;
    }

    /// Number of tasks registered on `stream`.
    pub fn listener_count(&self, stream: &str) -> usize {
        self.inner
            .listeners
            .read()
            .map(|l| l.get(stream).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn sender(&self) -> Result<mpsc::Sender<Message>> {
        if !self.is_started() {
            return Err(Error::BusNotStarted);
        }
        self.inner
            .sender
            .lock()
            .map_err(|_| Error::LockPoisoned("bus sender"))?
            .clone()
            .ok_or(Error::BusClosed)
    }
}

impl Inner {
    fn listeners_for(&self, stream: &str) -> Vec<ReaderTask> {
        let listeners = match self.listeners.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        listeners.get(stream).cloned().unwrap_or_default()
    }

    fn close(&self) {
        match self.sender.lock() {
            Ok(mut sender) => {
                sender.take();
            }
            Err(poisoned) => {
                poisoned.into_inner().take();
            }
        }
    }
}

async fn dispatch(inner: Arc<Inner>, root: Context, mut receiver: mpsc::Receiver<Message>) {
    while let Some(message) = receiver.recv().await {
        let tasks = inner.listeners_for(&message.stream);
        if tasks.is_empty() {
            warn!(stream = %message.stream, id = %message.id, "no listener, message dropped");
            continue;
        }

        for task in tasks {
            let Ok(permit) = Arc::clone(&inner.permits).acquire_owned().await else {
                return;
            };
            let message = message.clone();
            let ctx = if task.timeout.is_zero() {
                root.child()
            } else {
                root.with_timeout(task.timeout)
            };
            tokio::spawn(async move {
                let stream = message.stream.clone();
                let id = message.id.clone();

                let res = ctx.run(task.handler.handle(ctx.clone(), message)).await;
                match res {
                    Ok(()) => {}
                    Err(err) if err.is_context_error() => {
                        warn!(%stream, %id, group = %task.group, error = %err, "message handler interrupted");
                    }
                    Err(err) => {
                        error!(%stream, %id, group = %task.group, error = %err, "message handler failed");
                    }
                }
                drop(permit);
            });
        }
    }
}

async fn watch_shutdown(inner: Arc<Inner>, ctx: Context, dispatcher: JoinHandle<()>) {
    ctx.done().await;
    debug!("in-memory bus shutting down");

    inner.close();
    if let Err(err) = dispatcher.await {
        error!(error = %err, "bus dispatch loop aborted");
    }
    match inner.permits.acquire_many(inner.config.max_in_flight).await {
        Ok(all) => drop(all),
        Err(err) => error!(error = %err, "bus drain barrier failed"),
    }

    inner.stopped.cancel();
    debug!("in-memory bus stopped");
}

#[async_trait]
impl Writer for InMemoryBus {
    async fn write(&self, ctx: &Context, message: Message) -> Result<()> {
        let sender = self.sender()?;
        ctx.run(async { sender.send(message).await.map_err(|_| Error::BusClosed) })
            .await
    }

    async fn write_batch(&self, ctx: &Context, messages: Vec<Message>) -> Result<u32> {
        let sender = self.sender()?;
        let mut written = 0;
        for message in messages {
            ctx.run(async { sender.send(message).await.map_err(|_| Error::BusClosed) })
                .await?;
            written += 1;
        }
        Ok(written)
    }
}

#[async_trait]
impl Reader for InMemoryBus {
    async fn execute_task(&self, _ctx: &Context, task: ReaderTask) -> Result<()> {
        debug!(stream = %task.stream, group = %task.group, "bus listener registered");
        self.inner
            .listeners
            .write()
            .map_err(|_| Error::LockPoisoned("bus listeners"))?
            .entry(task.stream.clone())
            .or_default()
            .push(task);
        Ok(())
    }
}
