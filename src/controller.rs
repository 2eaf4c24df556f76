use std::sync::Arc;

use crate::{
    config::Settings,
    dns::HickoryDns,
    error::StartupError,
    geoip::GeoIpDb,
    internal,
    listener::Listener,
    resolver::Resolver,
};

/// Everything needed to serve, validated and loaded up front.
#[derive(Debug)]
pub struct Controller {
    listener: Listener,
    resolver: Arc<Resolver<HickoryDns, GeoIpDb>>,
}

impl Controller {
    ///
    /// Validate `settings` and open every collaborator. Nothing is bound yet.
    ///
    /// # Errors
    /// If the mapping is invalid, the GeoIP database cannot be opened, or the system DNS
    /// configuration cannot be loaded.
    ///
    pub fn init(settings: &Settings) -> Result<Self, StartupError> {
        let table = settings.destination_table()?;
        internal!(
            level = INFO,
            "Loaded {} country mapping(s), default {}",
            table.len(),
            table.default_country()
        );

        let geo = GeoIpDb::open(&settings.geoip)?;
        internal!("Opened {geo:?} from {}", settings.geoip.display());

        let dns = HickoryDns::new(settings.dns).map_err(StartupError::Dns)?;

        Ok(Self {
            listener: Listener::new(settings.listen),
            resolver: Arc::new(Resolver::new(Arc::new(table), dns, geo)),
        })
    }

    /// Run this controller until the listener fails or the process is interrupted
    ///
    /// # Errors
    ///
    /// This function will return an error if the listening socket cannot be bound.
    pub async fn run(self) -> anyhow::Result<()> {
        internal!("Controller running");

        tokio::select! {
            served = self.listener.serve(Arc::clone(&self.resolver)) => served?,
            _ = tokio::signal::ctrl_c() => {
                internal!(level = INFO, "Interrupted, shutting down");
            }
        };

        Ok(())
    }
}
