// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::HashSet,
    fs,
    net::IpAddr,
    path::PathBuf,
};

use ipnet::{AddrParseError, IpNet};
use log::debug;

use crate::error::{self, Result};

/// The widest range we'll expand, in host address bits.
const MAX_RANGE_BITS: u8 = 20;

/// Parses a network in CIDR notation, or a single address as a network of
/// one.
pub(crate) fn parse_range(value: &str) -> Result<IpNet, AddrParseError> {
    value
        .parse::<IpNet>()
        .or_else(|e| value.parse::<IpAddr>().map(IpNet::from).map_err(|_| e))
}

/// Where the hosts to scan come from.
#[derive(Clone, Debug)]
pub(crate) enum HostSource {
    Range(IpNet),
    File(PathBuf),
}

impl HostSource {
    /// Lists the hosts to scan, in order, with each host appearing once.
    pub(crate) fn expand(&self) -> Result<Vec<String>> {
        let candidates = match self {
            Self::Range(net) => {
                let bits = net.max_prefix_len() - net.prefix_len();
                if bits > MAX_RANGE_BITS {
                    return Err(error::HostSource::RangeTooLarge(*net, bits).into());
                }
                net.hosts().map(|addr| addr.to_string()).collect::<Vec<_>>()
            }
            Self::File(path) => fs::read_to_string(path)
                .map_err(|source| error::HostSource::File {
                    path: path.clone(),
                    source,
                })?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_owned)
                .collect(),
        };

        let mut seen = HashSet::new();
        let hosts: Vec<_> = candidates
            .into_iter()
            .filter(|host| seen.insert(host.clone()))
            .collect();
        debug!("Expanded host source into {} hosts", hosts.len());
        Ok(hosts)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::error::Error;

    fn range(value: &str) -> HostSource {
        HostSource::Range(parse_range(value).unwrap())
    }

    #[test]
    fn expand_range_skips_network_and_broadcast() {
        assert_eq!(
            range("192.168.10.0/30").expand().unwrap(),
            vec!["192.168.10.1", "192.168.10.2"]
        );
    }

    #[test]
    fn expand_single_address() {
        assert_eq!(range("10.1.2.3").expand().unwrap(), vec!["10.1.2.3"]);
    }

    #[test]
    fn expand_single_ipv6_address() {
        assert_eq!(range("fd00::7").expand().unwrap(), vec!["fd00::7"]);
    }

    #[test]
    fn expand_refuses_huge_ranges() {
        assert!(matches!(
            range("10.0.0.0/8").expand(),
            Err(Error::HostSource(error::HostSource::RangeTooLarge(_, 24)))
        ));
    }

    #[test]
    fn parse_range_rejects_garbage() {
        assert!(parse_range("not-a-network").is_err());
    }

    #[test]
    fn expand_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts");
        fs::write(
            &path,
            "# production\nweb1.example.com\n\n  db1.example.com  \nweb1.example.com\n10.0.0.7",
        )
        .unwrap();

        assert_eq!(
            HostSource::File(path).expand().unwrap(),
            vec!["web1.example.com", "db1.example.com", "10.0.0.7"]
        );
    }

    #[test]
    fn expand_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts");

        assert!(matches!(
            HostSource::File(path).expand(),
            Err(Error::HostSource(error::HostSource::File { .. }))
        ));
    }
}
