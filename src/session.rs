use std::{fmt::Display, net::SocketAddr, sync::Arc};

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{
    error::SessionError,
    incoming, internal, outgoing,
    resolver::Resolver,
    traits::{CountryLookup, Dns},
};

/// A transport map answer.
#[derive(Debug, PartialEq, Eq)]
pub struct Relay<'a>(pub &'a str);

impl Display for Relay<'_> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "200 relay:[{}]", self.0)
    }
}

/// One client connection: a line in, a relay out, until the client goes away.
pub struct Session<Stream, D, G> {
    peer: SocketAddr,
    stream: BufReader<Stream>,
    resolver: Arc<Resolver<D, G>>,
}

impl<Stream, D, G> Session<Stream, D, G>
where
    Stream: AsyncRead + AsyncWrite + Unpin + Send,
    D: Dns,
    G: CountryLookup,
{
    pub fn new(stream: Stream, peer: SocketAddr, resolver: Arc<Resolver<D, G>>) -> Self {
        Self {
            peer,
            stream: BufReader::new(stream),
            resolver,
        }
    }

    ///
    /// Answer requests until end of stream.
    ///
    /// # Errors
    /// If reading a request or writing a response fails. The connection is closed either way.
    ///
    pub async fn run(mut self) -> Result<(), SessionError> {
        internal!(level = INFO, "Connect from {}", self.peer);

        let result = self.serve().await;

        // Best effort, the peer may already be gone
        let _ = self.stream.get_mut().shutdown().await;

        match &result {
            Ok(()) => internal!(level = INFO, "Connection closed from {}", self.peer),
            Err(err) => internal!(level = WARN, "Connection from {} ended: {err}", self.peer),
        }

        result
    }

    async fn serve(&mut self) -> Result<(), SessionError> {
        let mut buffer = Vec::new();

        loop {
            buffer.clear();

            self.stream
                .read_until(b'\n', &mut buffer)
                .await
                .map_err(SessionError::Read)?;

            // Either a clean close, or the stream ended part way through a request
            if buffer.last() != Some(&b'\n') {
                if !buffer.is_empty() {
                    internal!(
                        level = DEBUG,
                        "Discarding unterminated request from {}: {:?}",
                        self.peer,
                        String::from_utf8_lossy(&buffer)
                    );
                }
                return Ok(());
            }
            buffer.pop();

            let line = String::from_utf8_lossy(&buffer);
            incoming!(level = DEBUG, peer = %self.peer, "Received {line:?}");

            let relay = Relay(self.resolver.resolve(&line).await);
            outgoing!(level = DEBUG, peer = %self.peer, "{relay}");

            let response = format!("{relay}\n");
            let stream = self.stream.get_mut();
            stream
                .write_all(response.as_bytes())
                .await
                .map_err(SessionError::Write)?;
            stream.flush().await.map_err(SessionError::Write)?;
        }
    }
}
