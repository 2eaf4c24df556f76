use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;

use crate::{
    internal,
    resolver::Resolver,
    session::Session,
    traits::{CountryLookup, Dns},
};

#[derive(Debug, Clone, Copy)]
pub struct Listener {
    socket: SocketAddr,
}

impl Listener {
    pub const fn new(socket: SocketAddr) -> Self {
        Self { socket }
    }

    ///
    /// Bind the configured socket and serve forever.
    ///
    /// # Errors
    /// If the socket cannot be bound. Once bound this never returns.
    ///
    pub async fn serve<D, G>(&self, resolver: Arc<Resolver<D, G>>) -> std::io::Result<()>
    where
        D: Dns + 'static,
        G: CountryLookup + 'static,
    {
        let listener = TcpListener::bind(self.socket).await?;
        internal!(level = INFO, "Listening on {}", self.socket);

        accept_loop(listener, resolver).await;

        Ok(())
    }
}

/// Accept connections on `listener`, each handled by its own task.
///
/// A failed accept is logged and the loop carries on.
pub async fn accept_loop<D, G>(listener: TcpListener, resolver: Arc<Resolver<D, G>>)
where
    D: Dns + 'static,
    G: CountryLookup + 'static,
{
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                internal!(level = DEBUG, "Connection received from {peer}");

                let session = Session::new(stream, peer, Arc::clone(&resolver));
                tokio::spawn(async move {
                    if let Err(err) = session.run().await {
                        internal!(level = DEBUG, "Session with {peer} failed: {err}");
                    }
                });
            }
            Err(err) => {
                internal!(level = ERROR, "Connection accept error: {err}");
            }
        }
    }
}
