use crate::command::{self, Response};
use crate::error::DuoResult;
use crate::store::SharedStore;
use bytes::{Buf, BytesMut};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One TCP session: reads request lines and answers each with one line.
pub struct Connection<S> {
    stream: S,
    buf: BytesMut,
    /// Bytes of `buf` already known to hold no `\n`.
    scanned: usize,
    peer_addr: SocketAddr,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer_addr: SocketAddr) -> Self {
        Connection {
            stream,
            buf: BytesMut::with_capacity(4096),
            scanned: 0,
            peer_addr,
        }
    }

    /// Serve requests until the peer closes the stream, an `exit` is
    /// processed, or `shutdown` is cancelled elsewhere.
    pub async fn run(mut self, store: SharedStore, shutdown: CancellationToken) -> DuoResult<()> {
        let peer_addr = self.peer_addr;
        loop {
            let line = tokio::select! {
                line = self.read_line() => line?,
                _ = shutdown.cancelled() => {
                    debug!("Dropping session {peer_addr} on shutdown");
                    return Ok(());
                }
            };

            let Some(line) = line else {
                return Ok(());
            };

            let response = command::process_line(&line, &store).await;
            let written = tokio::select! {
                written = self.write_response(&response) => written,
                _ = shutdown.cancelled() => {
                    debug!("Dropping session {peer_addr} on shutdown");
                    return Ok(());
                }
            };

            // `exit` stops the server even if the reply could not be delivered.
            if response.shutdown {
                info!("Shutdown requested over TCP by {peer_addr}");
                shutdown.cancel();
                return written;
            }
            written?;
        }
    }

    /// Next request line without its terminator, or `None` once the peer has
    /// closed the stream and nothing is buffered.
    async fn read_line(&mut self) -> DuoResult<Option<String>> {
        loop {
            let newline = self.buf[self.scanned..].iter().position(|&b| b == b'\n');
            if let Some(offset) = newline {
                let pos = self.scanned + offset;
                self.scanned = 0;
                let mut line = self.buf.split_to(pos + 1);
                line.truncate(pos);
                if line.last() == Some(&b'\r') {
                    line.truncate(pos - 1);
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            self.scanned = self.buf.len();

            if self.stream.read_buf(&mut self.buf).await? == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                // Unterminated last line.
                let line = String::from_utf8_lossy(self.buf.chunk()).into_owned();
                self.buf.clear();
                self.scanned = 0;
                return Ok(Some(line));
            }
        }
    }

    async fn write_response(&mut self, response: &Response) -> DuoResult<()> {
        let mut out = Vec::with_capacity(response.text.len() + 1);
        out.extend_from_slice(response.text.as_bytes());
        out.push(b'\n');
        self.stream.write_all(&out).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
