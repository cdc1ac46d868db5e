//! Shared transport engine.
//!
//! # Responsibilities
//! - Own the fixed-size runtime every transport runs on
//! - Share connection pools between clients built from it
//! - Bridge blocking callers onto the runtime
//! - Explicit shutdown
//!
//! # Design Decisions
//! - Constructed once by the top-level wiring, passed around as `Arc<Engine>`
//! - Network pools keyed by connect timeout, socket pools by (path, timeout)
//! - Dropping the engine shuts the runtime down in the background
//! - Network pools never follow redirects; a 3xx is the caller's response

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::error::{ClientError, ClientResult, TransportError};

#[cfg(unix)]
use crate::net::unix::UnixClient;

/// The process-wide transport engine shared by many clients.
pub struct Engine {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    shut_down: AtomicBool,
    network_pools: DashMap<Duration, reqwest::Client>,
    #[cfg(unix)]
    socket_pools: DashMap<(PathBuf, Duration), UnixClient>,
}

impl Engine {
    /// Build the engine and start its runtime.
    pub fn new(config: &EngineConfig) -> ClientResult<Arc<Self>> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(config.thread_name.clone());
        if let Some(threads) = config.worker_threads {
            builder.worker_threads(threads);
        }
        let runtime = builder
            .build()
            .map_err(|e| ClientError::Transport(TransportError::Runtime(e)))?;

        tracing::info!(
            worker_threads = ?config.worker_threads,
            thread_name = %config.thread_name,
            "Transport engine started"
        );

        Ok(Arc::new(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            shut_down: AtomicBool::new(false),
            network_pools: DashMap::new(),
            #[cfg(unix)]
            socket_pools: DashMap::new(),
        }))
    }

    /// Build an engine with default settings.
    pub fn with_defaults() -> ClientResult<Arc<Self>> {
        Self::new(&EngineConfig::default())
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> ClientResult<()> {
        if self.is_shut_down() {
            Err(ClientError::EngineShutdown)
        } else {
            Ok(())
        }
    }

    /// Drive `future` to completion on the engine, blocking the caller.
    ///
    /// On a multi-thread runtime worker the worker is handed off with
    /// `block_in_place` first. A current-thread runtime cannot give up its
    /// only worker, so the call fails with [`ClientError::BlockingInAsyncContext`].
    pub fn block_on<F: Future>(&self, future: F) -> ClientResult<F::Output> {
        self.ensure_running()?;
        match Handle::try_current() {
            Err(_) => Ok(self.handle.block_on(future)),
            Ok(current) if current.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Ok(tokio::task::block_in_place(|| self.handle.block_on(future)))
            }
            Ok(_) => Err(ClientError::BlockingInAsyncContext),
        }
    }

    /// Spawn a task on the engine runtime.
    pub fn spawn<F>(&self, future: F) -> ClientResult<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.ensure_running()?;
        Ok(self.handle.spawn(future))
    }

    /// Run blocking work on the engine's blocking pool.
    pub fn spawn_blocking<F, R>(&self, work: F) -> ClientResult<JoinHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.ensure_running()?;
        Ok(self.handle.spawn_blocking(work))
    }

    /// Shared network client for the given connect timeout.
    pub(crate) fn network_client(&self, connect_timeout: Duration) -> ClientResult<reqwest::Client> {
        self.ensure_running()?;
        let entry = self
            .network_pools
            .entry(connect_timeout)
            .or_try_insert_with(|| {
                tracing::debug!(connect_timeout = ?connect_timeout, "Creating network pool");
                reqwest::Client::builder()
                    .connect_timeout(connect_timeout)
                    .redirect(reqwest::redirect::Policy::none())
                    .no_proxy()
                    .build()
                    .map_err(|e| ClientError::Transport(TransportError::Http(e)))
            })?;
        Ok(entry.value().clone())
    }

    /// Shared domain-socket client for the given socket.
    #[cfg(unix)]
    pub(crate) fn socket_client(
        &self,
        socket_path: &Path,
        connect_timeout: Duration,
    ) -> ClientResult<UnixClient> {
        self.ensure_running()?;
        let key = (socket_path.to_path_buf(), connect_timeout);
        let client = self
            .socket_pools
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(socket_path = %socket_path.display(), "Creating socket pool");
                crate::net::unix::build_client(socket_path, connect_timeout)
            })
            .value()
            .clone();
        Ok(client)
    }

    /// Number of distinct pools currently held.
    pub fn pool_count(&self) -> usize {
        #[cfg(unix)]
        let sockets = self.socket_pools.len();
        #[cfg(not(unix))]
        let sockets = 0;
        self.network_pools.len() + sockets
    }

    /// Stop the runtime. In-flight work is abandoned.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.network_pools.clear();
        #[cfg(unix)]
        self.socket_pools.clear();
        let runtime = match self.runtime.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(runtime) = runtime {
            runtime.shutdown_background();
        }
        tracing::info!("Transport engine shut down");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("shut_down", &self.is_shut_down())
            .field("pools", &self.pool_count())
            .finish()
    }
}
