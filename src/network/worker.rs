//! The worker pool: a fixed number of single-threaded event loops, each
//! owning a bounded set of sessions.
//!
//! Each worker is an OS thread running a current-thread tokio runtime with a
//! `LocalSet`. Accepted sockets arrive over the worker's intake channel as
//! std sockets and are re-registered with the worker's own reactor, so every
//! read and write for a session happens on the loop that owns it. The only
//! way another thread reaches a session is its outbound queue.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::connection;
use crate::state::{AdmissionPermit, ServerState, SessionId, WorkerSlot};

/// How long shutdown waits for a worker's sessions to finish before the
/// remaining tasks are cancelled.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// An accepted connection on its way to the worker that will own it.
pub struct Handoff {
    pub stream: std::net::TcpStream,
    pub addr: SocketAddr,
    pub session: SessionId,
    pub permit: AdmissionPermit,
}

struct WorkerHandle {
    intake: mpsc::UnboundedSender<Handoff>,
    load: Arc<AtomicUsize>,
    capacity: usize,
}

/// The fixed pool of worker event loops.
pub struct WorkerPool {
    handles: Vec<WorkerHandle>,
    loads: Vec<Arc<AtomicUsize>>,
    threads: Vec<std::thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn the configured number of worker threads.
    pub fn spawn(
        state: &Arc<ServerState>,
        shutdown: watch::Receiver<bool>,
    ) -> std::io::Result<Self> {
        let limits = &state.config.limits;
        let mut handles = Vec::with_capacity(limits.workers);
        let mut loads = Vec::with_capacity(limits.workers);
        let mut threads = Vec::with_capacity(limits.workers);

        for index in 0..limits.workers {
            let (intake_tx, intake_rx) = mpsc::unbounded_channel();
            let load = Arc::new(AtomicUsize::new(0));

            let thread = std::thread::Builder::new()
                .name(format!("parlord-worker-{index}"))
                .spawn({
                    let state = Arc::clone(state);
                    let shutdown = shutdown.clone();
                    let load = Arc::clone(&load);
                    move || worker_main(index, intake_rx, load, state, shutdown)
                })?;

            handles.push(WorkerHandle {
                intake: intake_tx,
                load: Arc::clone(&load),
                capacity: limits.worker_capacity,
            });
            loads.push(load);
            threads.push(thread);
        }

        info!(workers = limits.workers, capacity = limits.worker_capacity, "Worker pool started");
        Ok(Self {
            handles,
            loads,
            threads,
        })
    }

    /// Admission-controller view of each worker: shared load gauge plus
    /// capacity.
    pub fn slots(&self) -> Vec<WorkerSlot> {
        self.handles
            .iter()
            .map(|h| WorkerSlot {
                load: Arc::clone(&h.load),
                capacity: h.capacity,
            })
            .collect()
    }

    /// Hand an accepted connection to its assigned worker. On failure (the
    /// worker's intake is closed during shutdown) the handoff is returned so
    /// the caller can report the error and roll the admission back.
    pub fn dispatch(&self, worker: usize, handoff: Handoff) -> Result<(), Handoff> {
        self.handles[worker].intake.send(handoff).map_err(|e| e.0)
    }

    /// Close intake, wait for workers to drain their sessions (bounded by
    /// [`DRAIN_TIMEOUT`]), and join the threads.
    pub async fn shutdown(self) {
        let WorkerPool {
            handles,
            loads,
            threads,
        } = self;
        drop(handles);

        let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
        loop {
            let active: usize = loads.iter().map(|l| l.load(Ordering::Acquire)).sum();
            if active == 0 {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                warn!(active, "Worker drain timeout - remaining sessions will be cancelled");
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        for thread in threads {
            let _ = tokio::task::spawn_blocking(move || thread.join()).await;
        }
        info!("Worker pool stopped");
    }
}

/// Body of one worker thread: accept handoffs, run each session as a local
/// task, drain on shutdown.
fn worker_main(
    index: usize,
    mut intake: mpsc::UnboundedReceiver<Handoff>,
    load: Arc<AtomicUsize>,
    state: Arc<ServerState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(worker = index, error = %e, "Failed to build worker runtime");
            return;
        }
    };

    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, async move {
        info!(worker = index, "Worker started");

        loop {
            tokio::select! {
                maybe = intake.recv() => match maybe {
                    Some(handoff) => {
                        debug!(worker = index, session = %handoff.session, addr = %handoff.addr,
                            "session assigned");
                        let state = Arc::clone(&state);
                        let shutdown = shutdown.clone();
                        tokio::task::spawn_local(async move {
                            let session = handoff.session;
                            let addr = handoff.addr;
                            if let Err(e) = connection::run(handoff, state, shutdown).await {
                                warn!(%session, %addr, error = %e, "session error");
                            }
                        });
                    }
                    None => break,
                },
                _ = shutdown.changed() => break,
            }
        }

        // Queued handoffs that never became sessions still hold admission
        // permits; dropping the intake releases them now.
        drop(intake);

        // Sessions observe the shutdown signal themselves; wait for the load
        // gauge to drain, then let anything still alive be cancelled with
        // the LocalSet.
        let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
        while load.load(Ordering::Acquire) > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        let leftover = load.load(Ordering::Acquire);
        if leftover > 0 {
            warn!(worker = index, leftover, "Drain timeout - forcing session close");
        }
        info!(worker = index, "Worker stopped");
    });
}
