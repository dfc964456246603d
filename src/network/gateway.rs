//! Gateway - TCP listener and admission control.
//!
//! The gateway accepts raw connections, asks the admission controller for a
//! seat, and hands admitted sockets to their assigned worker. Rejected
//! connections get exactly one error frame before the socket closes.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use super::worker::{Handoff, WorkerPool};
use crate::config::Config;
use crate::error::CommandError;
use crate::state::{AdmissionController, ServerState};

/// The gateway: listener, admission controller, worker pool, and the
/// shutdown signal they all share.
pub struct Gateway {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: Arc<ServerState>,
    admission: AdmissionController,
    pool: WorkerPool,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

/// Cheap handle for triggering shutdown from outside the accept loop
/// (signal handler, tests).
#[derive(Clone)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<watch::Sender<bool>>,
}

impl ServerHandle {
    /// Address the gateway is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal shutdown: stop accepting, drain workers, close sessions.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Gateway {
    /// Bind the listener and start the worker pool.
    pub async fn bind(config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let listener = TcpListener::bind(config.server.listen).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "Chat listener bound");

        let state = Arc::new(ServerState::new(Arc::clone(&config)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let pool = WorkerPool::spawn(&state, shutdown_rx.clone())?;
        let admission = AdmissionController::new(config.limits.max_sessions, pool.slots());

        Ok(Self {
            listener,
            local_addr,
            state,
            admission,
            pool,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        })
    }

    /// Address the gateway is listening on (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for triggering shutdown.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            local_addr: self.local_addr,
            shutdown: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Accept connections until shutdown is signalled, then drain the
    /// worker pool.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.admit(stream, addr).await,
                    Err(e) => error!(error = %e, "Failed to accept connection"),
                },
                _ = self.shutdown_rx.changed() => {
                    info!("Shutdown signal received - draining workers");
                    break;
                }
            }
        }

        let Gateway { listener, pool, .. } = self;
        drop(listener);
        pool.shutdown().await;
        info!("Gateway stopped");
        Ok(())
    }

    /// Admission check and worker handoff for one accepted connection.
    async fn admit(&self, stream: TcpStream, addr: SocketAddr) {
        let permit = match self.admission.try_admit() {
            Some(permit) => permit,
            None => {
                crate::metrics::session_rejected();
                info!(%addr, active = self.admission.active_sessions(),
                    "connection rejected - server full");
                reject(stream, addr, &CommandError::ServerFull).await;
                return;
            }
        };

        let session = self.state.ids.next();
        let worker = permit.worker();
        debug!(%addr, %session, worker, "connection admitted");

        // Detach from this runtime's reactor; the owning worker re-registers
        // the socket with its own.
        let stream = match stream.into_std() {
            Ok(stream) => stream,
            Err(e) => {
                // Permit drops here, rolling the admission back.
                warn!(%addr, error = %e, "failed to detach accepted socket");
                return;
            }
        };

        let handoff = Handoff {
            stream,
            addr,
            session,
            permit,
        };
        if let Err(handoff) = self.pool.dispatch(worker, handoff) {
            // Worker intake closed (shutdown race). Report, then roll back
            // by dropping the returned permit.
            warn!(%addr, worker, "worker unavailable - rejecting connection");
            let Handoff { stream, permit, .. } = handoff;
            drop(permit);
            if let Ok(stream) = TcpStream::from_std(stream) {
                reject(stream, addr, &CommandError::WorkerUnavailable).await;
            }
        }
    }
}

/// Send a rejection frame and close the socket.
async fn reject(mut stream: TcpStream, addr: SocketAddr, error: &CommandError) {
    let wire = error.to_frame().to_wire_string();
    if let Err(e) = stream.write_all(wire.as_bytes()).await {
        debug!(%addr, error = %e, "failed to send rejection frame");
    }
    let _ = stream.shutdown().await;
}
