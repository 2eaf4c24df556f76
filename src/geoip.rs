//! Country lookups against a MaxMind (`.mmdb`) database.
//!
//! The database is read into memory once at startup. Lookups never touch the file again,
//! so a single [`GeoIpDb`] answers every connection concurrently.

use std::{net::IpAddr, path::Path};

use maxminddb::{Reader, geoip2};

use crate::{
    error::{GeoIpError, LookupError},
    traits::CountryLookup,
};

pub struct GeoIpDb {
    reader: Reader<Vec<u8>>,
}

impl std::fmt::Debug for GeoIpDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoIpDb")
            .field("database_type", &self.reader.metadata.database_type)
            .field("build_epoch", &self.reader.metadata.build_epoch)
            .finish_non_exhaustive()
    }
}

impl GeoIpDb {
    /// Load from a local `.mmdb` file.
    ///
    /// # Errors
    ///
    /// Returns [`GeoIpError::Open`] if the file is missing or is not a MaxMind database.
    pub fn open(path: &Path) -> Result<Self, GeoIpError> {
        let reader = Reader::open_readfile(path).map_err(|source| GeoIpError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self { reader })
    }
}

impl CountryLookup for GeoIpDb {
    fn country_of(&self, ip: IpAddr) -> Result<String, LookupError> {
        let record = self
            .reader
            .lookup::<geoip2::Country>(ip)
            .map_err(|source| LookupError::GeoIp { ip, source })?;

        iso_code(
            record.country.and_then(|country| country.iso_code),
            record.registered_country.and_then(|country| country.iso_code),
        )
        .ok_or(LookupError::CountryNotFound(ip))
    }
}

/// The located country's code, else the registered one, upper-cased.
///
/// Anycast and satellite ranges often only carry the registered country.
fn iso_code(country: Option<&str>, registered_country: Option<&str>) -> Option<String> {
    country
        .or(registered_country)
        .map(str::to_ascii_uppercase)
}
