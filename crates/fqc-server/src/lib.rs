//! HTTP surface of the QC viewer.
//!
//! The CLI calls [`run`], which serves in the foreground until ctrl-c.
//! [`ViewerServer::start`] returns a handle with the bound address and a
//! graceful shutdown path, which is what the integration tests use.

mod page;
pub mod routes;

pub use routes::{build_router, AppState, RequestError};

use log::info;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Options controlling the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerOpts {
    /// TCP port to bind on loopback. Use `0` for an ephemeral port.
    pub port: u16,
}

impl Default for ServerOpts {
    fn default() -> Self {
        Self { port: 8050 }
    }
}

/// Errors surfaced by the server runtime.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to initialize tokio runtime: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Handle to a running viewer server.
pub struct ServerHandle {
    runtime: Option<Runtime>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    bound_addr: SocketAddr,
}

impl ServerHandle {
    /// The address the server is listening on.
    pub fn bound_addr(&self) -> SocketAddr {
        self.bound_addr
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let (Some(runtime), Some(task)) = (self.runtime.take(), self.task.take()) {
            let _ = runtime.block_on(async move {
                let _ = task.await;
            });
        }
    }
}

/// Entry points for starting and stopping the viewer server.
pub struct ViewerServer;

impl ViewerServer {
    /// Bind the listener and spawn the server on its own runtime.
    pub fn start(state: AppState, opts: ServerOpts) -> Result<ServerHandle, ServerError> {
        let runtime = RuntimeBuilder::new_multi_thread()
            .worker_threads(2)
            .thread_name("fqc-http")
            .enable_all()
            .build()
            .map_err(ServerError::RuntimeInit)?;
        let addr = loopback(opts.port);
        let listener = runtime
            .block_on(TcpListener::bind(addr))
            .map_err(|source| ServerError::Bind { addr, source })?;
        let bound_addr = listener.local_addr().map_err(ServerError::Serve)?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let app = build_router(state);
        let task = runtime.spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .map_err(ServerError::Serve)
        });
        info!("viewer listening on http://{bound_addr}/");
        Ok(ServerHandle {
            runtime: Some(runtime),
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            bound_addr,
        })
    }

    /// Request a graceful shutdown and wait for the server to finish.
    pub fn stop(mut handle: ServerHandle) -> Result<(), ServerError> {
        if let Some(tx) = handle.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let (Some(runtime), Some(task)) = (handle.runtime.take(), handle.task.take()) {
            match runtime.block_on(task) {
                Ok(result) => result,
                Err(_join_err) => Ok(()),
            }
        } else {
            Ok(())
        }
    }
}

/// Serve in the foreground until ctrl-c.
pub fn run(state: AppState, opts: ServerOpts) -> Result<(), ServerError> {
    let runtime = RuntimeBuilder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ServerError::RuntimeInit)?;
    runtime.block_on(async move {
        let addr = loopback(opts.port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let bound_addr = listener.local_addr().map_err(ServerError::Serve)?;
        info!("viewer listening on http://{bound_addr}/");
        let app = build_router(state);
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .map_err(ServerError::Serve)
    })
}

fn loopback(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}
