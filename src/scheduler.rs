// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, num::NonZeroUsize};

use futures_util::{stream, StreamExt as _};
use log::debug;

use crate::{
    aggregator::Aggregator,
    error::{Error, Result},
    fetcher::Fetcher,
    model::{KeyDb, MergeStats},
    parser,
    storage::Storage,
};

/// Column width hosts are padded to in outcome lines.
const HOST_COLUMN_WIDTH: usize = 21;

/// The result of scanning a single host.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) host: String,
    pub(crate) result: Result<MergeStats>,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(_) => write!(f, "{:<HOST_COLUMN_WIDTH$}SUCCESS", self.host),
            Err(e) => write!(f, "{:<HOST_COLUMN_WIDTH$}{}", self.host, e),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) succeeded: usize,
    pub(crate) failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: &Outcome) {
        if outcome.result.is_ok() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Scans hosts in queue order, keeping up to a fixed number of scans in
/// flight at once.
pub(crate) struct Scheduler<F, S> {
    fetcher: F,
    aggregator: Aggregator<S>,
    parallelism: NonZeroUsize,
}

impl<F: Fetcher, S: Storage<KeyDb>> Scheduler<F, S> {
    pub(crate) fn new(fetcher: F, storage: S, parallelism: NonZeroUsize) -> Self {
        Self {
            fetcher,
            aggregator: Aggregator::new(storage),
            parallelism,
        }
    }

    async fn scan_host(&self, host: &str) -> Result<MergeStats> {
        let raw = self.fetcher.fetch(host).await.map_err(|e| {
            debug!("Leaving the key database untouched for {}", e.host());
            Error::from(e)
        })?;
        let entries = parser::parse(&raw);
        debug!("Found {} keys on {}", entries.len(), host);
        self.aggregator.apply(host, entries).await
    }

    async fn scan(&self, host: String) -> Outcome {
        let result = self.scan_host(&host).await;
        Outcome { host, result }
    }

    /// Scans every host, handing each outcome to `report` as soon as it is
    /// known. A failed host never stops the run.
    ///
    /// Returns once no hosts remain queued or in flight.
    pub(crate) async fn run<I, R>(&self, hosts: I, mut report: R) -> Summary
    where
        I: IntoIterator<Item = String>,
        R: FnMut(&Outcome),
    {
        let mut summary = Summary::default();
        let mut outcomes = stream::iter(hosts)
            .map(|host| self.scan(host))
            .buffer_unordered(self.parallelism.get());
        while let Some(outcome) = outcomes.next().await {
            summary.record(&outcome);
            report(&outcome);
        }
        summary
    }

    #[cfg(test)]
    pub(crate) fn into_storage(self) -> S {
        self.aggregator.into_storage()
    }
}
