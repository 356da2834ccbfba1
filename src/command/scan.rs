// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    num::{NonZeroU64, NonZeroUsize},
    path::PathBuf,
    time::Duration,
};

use async_trait::async_trait;
use clap::{ArgGroup, Parser};
use ipnet::IpNet;
use log::info;

use crate::{
    error::{self, Result},
    fetcher::{SshFetcher, DEFAULT_USER},
    host::{self, HostSource},
    scheduler::Scheduler,
    storage,
};

/// Read the authorized keys of every host in a range or file, and record
/// where each key grants access.
#[derive(Debug, Parser)]
#[command(group(ArgGroup::new("source").required(true).args(["range", "hosts_file"])))]
pub(crate) struct Command {
    /// The network to scan, in CIDR notation (for example, 10.0.0.0/24).
    #[arg(long, short, value_parser = host::parse_range)]
    range: Option<IpNet>,

    /// A file listing one host name or address per line.
    #[arg(long, short = 'H', value_hint = clap::ValueHint::FilePath)]
    hosts_file: Option<PathBuf>,

    /// How many hosts to scan at the same time.
    #[arg(long, short, env = "KEYDB_PARALLEL", default_value = "1")]
    parallel: NonZeroUsize,

    /// The account to log in as. Its authorized keys are the ones we read.
    #[arg(long, short, env = "KEYDB_USER", default_value = DEFAULT_USER)]
    user: String,

    /// How long to wait for the SSH handshake to complete, in milliseconds.
    #[arg(long, short, env = "KEYDB_TIMEOUT", default_value = "20000")]
    timeout: NonZeroU64,

    /// The port the SSH daemon listens on.
    #[arg(long, short = 'P', env = "KEYDB_PORT", default_value = "22")]
    port: u16,
}

impl Command {
    fn source(&self) -> Result<HostSource> {
        match (self.range, &self.hosts_file) {
            (Some(net), _) => Ok(HostSource::Range(net)),
            (None, Some(path)) => Ok(HostSource::File(path.clone())),
            // Unreachable through the command line, which requires a source.
            (None, None) => Err(error::HostSource::Missing.into()),
        }
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, storage: storage::File) -> Result<()> {
        let hosts = self.source()?.expand()?;
        info!(
            "Scanning {} hosts, {} at a time, into {}",
            hosts.len(),
            self.parallel,
            storage.path().display()
        );

        let fetcher = SshFetcher::new(self.user, self.port, Duration::from_millis(self.timeout.get()));
        let summary = Scheduler::new(fetcher, storage, self.parallel)
            .run(hosts, |outcome| println!("{outcome}"))
            .await;

        info!(
            "Finished scanning: {} succeeded, {} failed",
            summary.succeeded, summary.failed
        );
        Ok(())
    }
}
