use crate::config::Config;
use crate::connection::Connection;
use crate::datagram::run_datagram_server;
use crate::error::DuoResult;
use crate::store::SharedStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Both bound sockets, before any serving starts.
pub struct Listeners {
    pub tcp: TcpListener,
    pub udp: UdpSocket,
}

impl Listeners {
    pub async fn bind(config: &Config) -> DuoResult<Self> {
        let tcp = TcpListener::bind(config.tcp_addr()).await?;
        let udp = UdpSocket::bind(config.udp_addr()).await?;
        Ok(Listeners { tcp, udp })
    }

    pub fn tcp_addr(&self) -> DuoResult<SocketAddr> {
        Ok(self.tcp.local_addr()?)
    }

    pub fn udp_addr(&self) -> DuoResult<SocketAddr> {
        Ok(self.udp.local_addr()?)
    }
}

/// Bind both transports and serve until `exit` or Ctrl-C.
pub async fn run_server(store: SharedStore, config: Config) -> DuoResult<()> {
    let listeners = Listeners::bind(&config).await?;
    let shutdown = CancellationToken::new();

    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("Received Ctrl-C");
                    ctrl_c_token.cancel();
                }
            }
            _ = ctrl_c_token.cancelled() => {}
        }
    });

    serve(listeners, store, &config, shutdown).await
}

/// Serve already-bound sockets until `shutdown` is cancelled.
///
/// On return both sockets are closed. Sessions still open are dropped
/// without draining.
pub async fn serve(
    listeners: Listeners,
    store: SharedStore,
    config: &Config,
    shutdown: CancellationToken,
) -> DuoResult<()> {
    let Listeners { tcp, udp } = listeners;
    info!("TCP server listening on {}", tcp.local_addr()?);
    info!("UDP server listening on {}", udp.local_addr()?);

    let datagram = tokio::spawn(run_datagram_server(
        udp,
        store.clone(),
        config.max_datagram_size,
        shutdown.clone(),
    ));

    let limit = (config.max_connections > 0)
        .then(|| Arc::new(Semaphore::new(config.max_connections)));

    loop {
        let permit = match &limit {
            Some(limit) => tokio::select! {
                permit = limit.clone().acquire_owned() => permit.ok(),
                _ = shutdown.cancelled() => break,
            },
            None => None,
        };

        tokio::select! {
            result = tcp.accept() => match result {
                Ok((stream, peer_addr)) => {
                    debug!("New connection from {peer_addr}");
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("Could not set TCP_NODELAY for {peer_addr}: {e}");
                    }
                    spawn_session(stream, peer_addr, store.clone(), shutdown.clone(), permit);
                }
                Err(e) => warn!("Accept failed: {e}"),
            },
            _ = shutdown.cancelled() => break,
        }
    }

    info!("Shutting down...");
    drop(tcp);
    if let Err(e) = datagram.await {
        warn!("UDP server task failed: {e}");
    }
    Ok(())
}

fn spawn_session(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    store: SharedStore,
    shutdown: CancellationToken,
    permit: Option<OwnedSemaphorePermit>,
) {
    tokio::spawn(async move {
        let _permit = permit;
        if let Err(e) = Connection::new(stream, peer_addr).run(store, shutdown).await {
            if e.is_disconnect() {
                debug!("Connection from {peer_addr} dropped: {e}");
            } else {
                warn!("Connection error from {peer_addr}: {e}");
            }
        }
        debug!("Connection closed: {peer_addr}");
    });
}
