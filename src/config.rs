//! Startup settings.
//!
//! Settings come from an optional TOML file and the command line. Command line values win,
//! except for mapping directives, which are appended after the file's:
//!
//! ```toml
//! listen = "0.0.0.0:2527"
//! geoip = "/var/lib/geoip/GeoLite2-Country.mmdb"
//! default = "US"
//! targets = ["US:10.0.0.1", "US:10.0.0.2", "DE:10.0.0.3"]
//!
//! [dns]
//! timeout_secs = 5
//! ```

use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use clap::Parser;
use serde::Deserialize;

use crate::{
    destination::DestinationTable,
    dns::DnsConfig,
    error::{ConfigError, StartupError},
};

pub const DEFAULT_PORT: u16 = 2527;
pub const DEFAULT_GEOIP_DATABASE: &str = "GeoLite2-Country.mmdb";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_geoip")]
    pub geoip: PathBuf,

    /// `XX:target` mapping directives
    #[serde(default, alias = "target")]
    pub targets: Vec<String>,

    /// Country whose targets are used when nothing better is known
    #[serde(default)]
    pub default: String,

    #[serde(default)]
    pub dns: DnsConfig,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))
}

fn default_geoip() -> PathBuf {
    PathBuf::from(DEFAULT_GEOIP_DATABASE)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            geoip: default_geoip(),
            targets: Vec::default(),
            default: String::default(),
            dns: DnsConfig::default(),
        }
    }
}

impl Settings {
    ///
    /// Read settings from a TOML file.
    ///
    /// # Errors
    /// If the file cannot be read, or is not valid settings TOML.
    ///
    pub fn from_file(path: &Path) -> Result<Self, StartupError> {
        let content = std::fs::read_to_string(path).map_err(|source| StartupError::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| StartupError::SettingsParse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    ///
    /// Settings for `cli`, layered over its `--config` file if one was given.
    ///
    /// # Errors
    /// If the settings file cannot be loaded.
    ///
    pub fn load(cli: Cli) -> Result<Self, StartupError> {
        let settings = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        Ok(settings.merge(cli))
    }

    #[must_use]
    pub fn merge(mut self, cli: Cli) -> Self {
        self.targets.extend(cli.targets);

        if let Some(default) = cli.default {
            self.default = default;
        }
        if let Some(listen) = cli.listen {
            self.listen = listen;
        }
        if let Some(geoip) = cli.geoip {
            self.geoip = geoip;
        }
        if let Some(timeout) = cli.dns_timeout {
            self.dns.timeout_secs = timeout;
        }

        self
    }

    ///
    /// Validate the mapping directives into a [`DestinationTable`].
    ///
    /// # Errors
    /// See [`DestinationTable::new`].
    ///
    pub fn destination_table(&self) -> Result<DestinationTable, ConfigError> {
        DestinationTable::new(&self.targets, &self.default)
    }
}

/// Route mail to a next-hop relay chosen by the country its MX hosts are in.
#[derive(Debug, Default, Parser)]
#[command(name = "geoip-transport-map", version)]
pub struct Cli {
    /// Target destination mapping, `XX:MTA`. XX is an ISO alpha-2 country code, MTA is the
    /// next-hop MTA IP or hostname. May be repeated
    #[arg(short, long = "target", value_name = "XX:MTA")]
    pub targets: Vec<String>,

    /// Default country. Used when a country is not in the target mapping
    #[arg(short, long, value_name = "XX")]
    pub default: Option<String>,

    /// Address to listen on [default: 0.0.0.0:2527]
    #[arg(short, long, value_name = "ADDR:PORT")]
    pub listen: Option<SocketAddr>,

    /// GeoIP country database [default: GeoLite2-Country.mmdb]
    #[arg(short, long, value_name = "PATH")]
    pub geoip: Option<PathBuf>,

    /// DNS query timeout in seconds [default: 5]
    #[arg(long, value_name = "SECONDS")]
    pub dns_timeout: Option<u64>,

    /// TOML settings file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.listen.to_string(), "0.0.0.0:2527");
        assert_eq!(settings.geoip, PathBuf::from("GeoLite2-Country.mmdb"));
        assert_eq!(settings.dns.timeout_secs, 5);
        assert!(settings.targets.is_empty());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "geoip-transport-map",
            "-t",
            "US:10.0.0.1",
            "--target",
            "de:10.0.0.3",
            "-d",
            "us",
            "--listen",
            "127.0.0.1:2600",
        ])
        .unwrap();

        let settings = Settings::default().merge(cli);
        assert_eq!(settings.targets, ["US:10.0.0.1", "de:10.0.0.3"]);
        assert_eq!(settings.default, "us");
        assert_eq!(settings.listen.to_string(), "127.0.0.1:2600");

        let table = settings.destination_table().unwrap();
        assert_eq!(table.default_country(), "US");
    }

    #[test]
    fn test_file_then_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            listen = "127.0.0.1:2527"
            geoip = "/srv/geo.mmdb"
            default = "DE"
            targets = ["US:10.0.0.1", "DE:10.0.0.3"]

            [dns]
            timeout_secs = 1
            "#
        )
        .unwrap();

        let cli = Cli {
            targets: vec!["US:10.0.0.2".to_string()],
            default: Some("US".to_string()),
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };

        let settings = Settings::load(cli).unwrap();
        assert_eq!(
            settings,
            Settings {
                listen: "127.0.0.1:2527".parse().unwrap(),
                geoip: PathBuf::from("/srv/geo.mmdb"),
                targets: vec![
                    "US:10.0.0.1".to_string(),
                    "DE:10.0.0.3".to_string(),
                    "US:10.0.0.2".to_string(),
                ],
                default: "US".to_string(),
                dns: DnsConfig { timeout_secs: 1 },
            }
        );
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "port = 25").unwrap();

        assert!(matches!(
            Settings::from_file(file.path()),
            Err(StartupError::SettingsParse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Settings::from_file(Path::new("/nonexistent/transport.toml")),
            Err(StartupError::SettingsRead { .. })
        ));
    }

    #[test]
    fn test_unmapped_default_rejected() {
        let settings = Settings {
            targets: vec!["US:10.0.0.1".to_string(), "DE:10.0.0.3".to_string()],
            default: "FR".to_string(),
            ..Default::default()
        };

        assert_eq!(
            settings.destination_table(),
            Err(ConfigError::DefaultNotMapped("FR".to_string()))
        );
    }
}
