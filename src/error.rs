//! Error types for the transport map.
//!
//! Startup errors ([`ConfigError`], [`GeoIpError`], [`StartupError`]) are fatal and stop the
//! process before anything listens. [`LookupError`] is only ever seen by the resolver, which
//! recovers from it by falling back to the default destination. [`SessionError`] ends a
//! single client connection.

use std::{io, net::IpAddr, path::PathBuf};

use thiserror::Error;

/// Errors building the destination table from mapping directives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The directive is not of the form `XX:target`.
    #[error("Invalid mapping format: {0}")]
    MalformedMapping(String),

    /// The country part is not a 2 letter code.
    #[error("Invalid country code: {0}")]
    InvalidCountryCode(String),

    /// The target part of the directive is empty.
    #[error("Invalid target on {0}: target is empty")]
    EmptyTarget(String),

    /// No mapping directives were supplied at all.
    #[error("Can't process with empty target mapping")]
    EmptyMapping,

    /// The default country has no mapping directive.
    #[error("Default country \"{0}\" not in target map")]
    DefaultNotMapped(String),
}

/// Errors reported by the DNS and geo-IP collaborators.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The DNS query itself failed (network, NXDOMAIN, timeout, ...).
    #[error("DNS lookup failed for {name}: {source}")]
    Dns {
        name: String,
        #[source]
        source: Box<hickory_resolver::ResolveError>,
    },

    /// The query succeeded but carried no usable records.
    #[error("No records found for {0}")]
    NoRecords(String),

    /// The geo-IP database could not answer for this address.
    #[error("GeoIP lookup failed for {ip}: {source}")]
    GeoIp {
        ip: IpAddr,
        #[source]
        source: maxminddb::MaxMindDBError,
    },

    /// The address is known, but has no country attached.
    #[error("No country recorded for {0}")]
    CountryNotFound(IpAddr),
}

impl LookupError {
    pub(crate) fn dns(name: &str, source: hickory_resolver::ResolveError) -> Self {
        Self::Dns {
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    /// Returns `true` if the lookup failed only because nothing was found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NoRecords(_) | Self::CountryNotFound(_) => true,
            Self::Dns { source, .. } => source.is_no_records_found() || source.is_nx_domain(),
            Self::GeoIp { source, .. } => {
                matches!(source, maxminddb::MaxMindDBError::AddressNotFoundError(_))
            }
        }
    }
}

/// Errors opening the geo-IP dataset.
#[derive(Debug, Error)]
pub enum GeoIpError {
    #[error("Unable to open GeoIP database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: maxminddb::MaxMindDBError,
    },
}

/// Errors that end a single client connection.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Read failed: {0}")]
    Read(#[source] io::Error),

    #[error("Write failed: {0}")]
    Write(#[source] io::Error),
}

/// Everything that can stop the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    GeoIp(#[from] GeoIpError),

    #[error("Unable to initialise DNS resolver: {0}")]
    Dns(#[source] hickory_resolver::ResolveError),

    #[error("Unable to read settings from {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to parse settings from {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
}

#[cfg(test)]
mod tests {
    use std::{
        error::Error as StdError,
        net::{IpAddr, Ipv4Addr},
    };

    use super::*;

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::MalformedMapping("US".to_string()).to_string(),
            "Invalid mapping format: US"
        );
        assert_eq!(
            ConfigError::DefaultNotMapped("FR".to_string()).to_string(),
            "Default country \"FR\" not in target map"
        );
    }

    #[test]
    fn test_lookup_error_not_found() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
        assert!(LookupError::CountryNotFound(ip).is_not_found());
        assert!(LookupError::NoRecords("example.com".to_string()).is_not_found());
    }

    #[test]
    fn test_startup_error_source_chain() {
        let err = StartupError::from(ConfigError::EmptyMapping);
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Can't process with empty target mapping"
        );
    }
}
