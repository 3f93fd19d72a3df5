//! The target table: `ip-literal -> {tag: value, ...}`, loaded once at
//! startup and immutable for the life of the collector process.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config YAML")]
    Parse(#[from] serde_yaml::Error),
    #[error("config key {0:?} is not a valid IPv4 dotted-quad address")]
    InvalidAddress(String),
}

/// A single probe target: an address and its arbitrary tag set.
///
/// Tags are forwarded verbatim into the TSDB; unknown tag names are
/// permitted and carry no special meaning to LLAMA itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub address: Ipv4Addr,
    pub tags: BTreeMap<String, String>,
}

/// The full, immutable target table loaded from the YAML configuration file.
#[derive(Debug, Clone, Default)]
pub struct TargetTable {
    targets: Vec<Target>,
}

impl TargetTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::parse(&raw)
    }

    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, BTreeMap<String, String>> = serde_yaml::from_str(yaml)?;

        let mut targets = Vec::with_capacity(raw.len());
        for (key, tags) in raw {
            let address = key
                .parse::<Ipv4Addr>()
                .map_err(|_| ConfigError::InvalidAddress(key))?;
            targets.push(Target { address, tags });
        }

        Ok(Self { targets })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets_and_tags() {
        let yaml = "
10.0.0.1:
  metro: iad
  role: edge
10.0.0.2:
  metro: sjc
";
        let table = TargetTable::parse(yaml).unwrap();

        assert_eq!(table.len(), 2);
        let iad = table
            .targets()
            .iter()
            .find(|t| t.address == Ipv4Addr::new(10, 0, 0, 1))
            .unwrap();
        assert_eq!(iad.tags.get("metro"), Some(&"iad".to_string()));
        assert_eq!(iad.tags.get("role"), Some(&"edge".to_string()));
    }

    #[test]
    fn rejects_non_ipv4_keys() {
        let yaml = "not-an-ip:\n  metro: iad\n";

        let err = TargetTable::parse(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress(key) if key == "not-an-ip"));
    }

    #[test]
    fn empty_document_yields_empty_table() {
        let table = TargetTable::parse("{}").unwrap();
        assert!(table.is_empty());
    }
}
