//! UDP front end: one request per packet, one reply packet per request,
//! served strictly one at a time.

use crate::command;
use crate::store::SharedStore;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Serve packets on `socket` until `shutdown` is cancelled or an `exit`
/// packet arrives.
///
/// Receive and send failures only affect the packet at hand; the loop keeps
/// serving. Nothing is retried or reassembled.
pub async fn run_datagram_server(
    socket: UdpSocket,
    store: SharedStore,
    max_datagram_size: usize,
    shutdown: CancellationToken,
) {
    let mut buf = vec![0u8; max_datagram_size];

    loop {
        let (len, peer) = tokio::select! {
            result = socket.recv_from(&mut buf) => match result {
                Ok(received) => received,
                Err(e) => {
                    warn!("UDP receive failed: {e}");
                    continue;
                }
            },
            _ = shutdown.cancelled() => {
                info!("UDP server stopping");
                return;
            }
        };

        let line = decode_request(&buf[..len]);
        debug!("UDP request from {peer}: {line:?}");

        let response = command::process_line(&line, &store).await;
        send_reply(&socket, peer, &response.text).await;

        if response.shutdown {
            info!("Shutdown requested over UDP by {peer}");
            shutdown.cancel();
            return;
        }
    }
}

/// Packet payload as a request line. Invalid UTF-8 is replaced and one
/// trailing line terminator is dropped so `echo cmd | nc -u` works.
pub fn decode_request(payload: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(payload).into_owned();
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

async fn send_reply(socket: &UdpSocket, peer: SocketAddr, text: &str) {
    if let Err(e) = socket.send_to(text.as_bytes(), peer).await {
        warn!("UDP reply of {} bytes to {peer} failed: {e}", text.len());
    }
}
