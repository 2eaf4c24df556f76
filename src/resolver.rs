//! Turns one email address into one relay target.
//!
//! The pipeline is address → domain → MX hosts → IP address → country → target. Each step
//! that fails falls back to a target of the default country, so a caller always gets an
//! answer. MX hosts are tried in preference order, but only until one of them produces a
//! country: an MX host whose country is not mapped still ends the search.

use std::{net::IpAddr, sync::Arc};

use rand::seq::IndexedRandom;

use crate::{
    destination::DestinationTable,
    internal,
    traits::{CountryLookup, Dns},
};

#[derive(Debug)]
pub struct Resolver<D, G> {
    table: Arc<DestinationTable>,
    dns: D,
    geo: G,
}

impl<D: Dns, G: CountryLookup> Resolver<D, G> {
    pub const fn new(table: Arc<DestinationTable>, dns: D, geo: G) -> Self {
        Self { table, dns, geo }
    }

    /// Choose the relay for the address in `line`. Never fails.
    pub async fn resolve(&self, line: &str) -> &str {
        let fallback = self.table.pick_default();

        let Some(domain) = domain_of(line) else {
            internal!(level = DEBUG, "Email address invalid: {line:?}");
            return fallback;
        };

        let hosts = match self.dns.resolve_mx(domain).await {
            Ok(hosts) if hosts.is_empty() => {
                internal!(level = DEBUG, "No MX hosts for {domain}");
                return fallback;
            }
            Ok(hosts) => hosts,
            Err(err) if err.is_not_found() => {
                internal!(level = DEBUG, "No MX records for {domain}: {err}");
                return fallback;
            }
            Err(err) => {
                internal!(level = WARN, "Get MX error on {domain}: {err}");
                return fallback;
            }
        };

        for host in &hosts {
            let Some(address) = self.address_of(host).await else {
                continue;
            };

            let country = match self.geo.country_of(address) {
                Ok(country) => country,
                Err(err) => {
                    internal!(level = DEBUG, "Get country error on {address} ({host}): {err}");
                    continue;
                }
            };

            internal!(
                level = DEBUG,
                "Got country code {country} for {domain} via {host} ({address})"
            );

            return self.table.pick(&country).unwrap_or_else(|| {
                internal!(level = DEBUG, "{country} is not mapped, using {fallback}");
                fallback
            });
        }

        internal!(level = DEBUG, "No MX host of {domain} resolved, using {fallback}");
        fallback
    }

    /// One address of `host`, picked at random if there are several.
    async fn address_of(&self, host: &str) -> Option<IpAddr> {
        match self.dns.resolve_addresses(host).await {
            Ok(addresses) => {
                let address = addresses.choose(&mut rand::rng()).copied();
                if address.is_none() {
                    internal!(level = DEBUG, "No addresses for MX host {host}");
                }
                address
            }
            Err(err) => {
                internal!(level = DEBUG, "Get IP error on {host}: {err}");
                None
            }
        }
    }
}

/// The domain part of `local@domain`, if the line has exactly that shape.
fn domain_of(line: &str) -> Option<&str> {
    let mut parts = line.split('@');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => {
            Some(domain)
        }
        _ => None,
    }
}
