use std::{future::Future, net::IpAddr, sync::Arc};

use crate::error::LookupError;

/// The DNS queries the resolver depends on.
pub trait Dns: Send + Sync {
    ///
    /// Mail exchangers for `domain`, most preferred first.
    ///
    /// # Errors
    /// If the query fails. An empty list is not an error.
    ///
    fn resolve_mx(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<Vec<String>, LookupError>> + Send;

    ///
    /// Every A and AAAA address for `host`.
    ///
    /// # Errors
    /// If the query fails. An empty list is not an error.
    ///
    fn resolve_addresses(
        &self,
        host: &str,
    ) -> impl Future<Output = Result<Vec<IpAddr>, LookupError>> + Send;
}

/// Maps an address to the country it is located in.
pub trait CountryLookup: Send + Sync {
    ///
    /// Upper-case ISO 3166-1 alpha-2 code for `ip`.
    ///
    /// # Errors
    /// If the address is unknown or the database cannot be read.
    ///
    fn country_of(&self, ip: IpAddr) -> Result<String, LookupError>;
}

impl<C: CountryLookup> CountryLookup for Arc<C> {
    fn country_of(&self, ip: IpAddr) -> Result<String, LookupError> {
        (**self).country_of(ip)
    }
}
