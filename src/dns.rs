//! DNS lookups backed by `hickory-resolver`.
//!
//! MX answers are handed back ordered by preference, the way the resolver expects them.
//! Nothing is cached: every request line queries DNS afresh.

use std::{net::IpAddr, time::Duration};

use hickory_resolver::{TokioResolver, config::ResolverOpts, name_server::TokioConnectionProvider};
use serde::Deserialize;

use crate::{error::LookupError, internal, traits::Dns};

/// Configuration for the DNS resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DnsConfig {
    /// DNS query timeout in seconds (default: 5)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    5
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// System resolver configuration with a bounded per-query timeout.
#[derive(Debug)]
pub struct HickoryDns {
    resolver: TokioResolver,
}

impl HickoryDns {
    ///
    /// Create a resolver from the system DNS configuration.
    ///
    /// # Errors
    /// If the system DNS configuration cannot be loaded.
    ///
    pub fn new(config: DnsConfig) -> Result<Self, hickory_resolver::ResolveError> {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_secs(config.timeout_secs);

        let resolver = TokioResolver::builder(TokioConnectionProvider::default())?
            .with_options(opts)
            .build();

        Ok(Self { resolver })
    }
}

impl Dns for HickoryDns {
    async fn resolve_mx(&self, domain: &str) -> Result<Vec<String>, LookupError> {
        let lookup = self
            .resolver
            .mx_lookup(domain)
            .await
            .map_err(|err| LookupError::dns(domain, err))?;

        let mut exchangers = lookup
            .iter()
            .map(|mx| (mx.preference(), mx.exchange().to_utf8()))
            .collect::<Vec<_>>();

        // Stable, so equal preferences keep the order the server gave them in
        exchangers.sort_by_key(|(preference, _)| *preference);

        internal!(
            level = DEBUG,
            "Resolved {} MX record(s) for {domain}",
            exchangers.len()
        );
        Ok(exchangers.into_iter().map(|(_, host)| host).collect())
    }

    async fn resolve_addresses(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|err| LookupError::dns(host, err))?;

        let addresses = lookup.iter().collect::<Vec<_>>();
        internal!(
            level = DEBUG,
            "Resolved {} address(es) for {host}",
            addresses.len()
        );
        Ok(addresses)
    }
}
