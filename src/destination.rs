//! Country to relay mapping.
//!
//! Built once at startup from `XX:target` directives and never mutated afterwards, so it
//! is shared between every connection without any locking.

use std::collections::HashMap;

use rand::seq::IndexedRandom;

use crate::error::ConfigError;

/// Relay targets keyed by upper-case ISO 3166-1 alpha-2 country code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTable {
    entries: HashMap<String, Vec<String>>,
    default_country: String,
}

impl DestinationTable {
    /// Build the table from mapping directives and the default country.
    ///
    /// Each directive is `COUNTRY:TARGET`; a country may be given several times, each
    /// adding another candidate target in input order.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any directive is malformed, if there are no
    /// directives, or if the default country has no targets.
    pub fn new<I, S>(directives: I, default_country: &str) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();

        for directive in directives {
            let (country, target) = parse_directive(directive.as_ref())?;
            entries.entry(country).or_default().push(target.to_string());
        }

        if entries.is_empty() {
            return Err(ConfigError::EmptyMapping);
        }

        let default_country = default_country.to_ascii_uppercase();
        if !entries.contains_key(&default_country) {
            return Err(ConfigError::DefaultNotMapped(default_country));
        }

        Ok(Self {
            entries,
            default_country,
        })
    }

    #[must_use]
    pub fn default_country(&self) -> &str {
        &self.default_country
    }

    /// All targets configured for `country`, if it is mapped.
    #[must_use]
    pub fn targets(&self, country: &str) -> Option<&[String]> {
        self.entries.get(country).map(Vec::as_slice)
    }

    #[must_use]
    pub fn default_targets(&self) -> &[String] {
        self.targets(&self.default_country).unwrap_or_default()
    }

    /// Pick one of the default country's targets, uniformly at random.
    #[must_use]
    pub fn pick_default(&self) -> &str {
        choose(self.default_targets())
    }

    /// Pick one of `country`'s targets uniformly at random, or `None` if it is unmapped.
    #[must_use]
    pub fn pick(&self, country: &str) -> Option<&str> {
        self.targets(country).map(choose)
    }

    /// Number of mapped countries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_directive(directive: &str) -> Result<(String, &str), ConfigError> {
    let (country, target) = directive
        .split_once(':')
        .filter(|(country, _)| !country.is_empty())
        .ok_or_else(|| ConfigError::MalformedMapping(directive.to_string()))?;

    let country = country.to_ascii_uppercase();
    if country.chars().count() != 2 {
        return Err(ConfigError::InvalidCountryCode(country));
    }

    if target.is_empty() {
        return Err(ConfigError::EmptyTarget(country));
    }

    Ok((country, target))
}

// Every list in the table holds at least one target.
fn choose(targets: &[String]) -> &str {
    targets
        .choose(&mut rand::rng())
        .map(String::as_str)
        .unwrap_or_default()
}
